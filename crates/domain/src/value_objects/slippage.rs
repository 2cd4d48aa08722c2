use crate::error::{GridError, Result};
use crate::math::full_math::mul_div;
use serde::{Deserialize, Serialize};

/// Hard cap on slippage tolerance, in basis points.
pub const MAX_SLIPPAGE_BPS: u32 = 500;

const BPS_DENOMINATOR: u128 = 10_000;

/// Slippage tolerance in basis points, bounded by [`MAX_SLIPPAGE_BPS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slippage(u32);

impl Slippage {
    /// Validates the tolerance against the hard cap.
    pub fn from_bps(bps: u32) -> Result<Self> {
        if bps > MAX_SLIPPAGE_BPS {
            return Err(GridError::SlippageTooHigh {
                bps,
                max: MAX_SLIPPAGE_BPS,
            });
        }
        Ok(Self(bps))
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    /// Smallest acceptable amount for a desired `amount`.
    pub fn min_amount(&self, amount: u128) -> u128 {
        // (10_000 - bps) / 10_000 <= 1, so the result always fits.
        mul_div(amount, BPS_DENOMINATOR - u128::from(self.0), BPS_DENOMINATOR).unwrap_or(0)
    }

    /// Minimum-received bounds for a cell.
    ///
    /// Two-sided cells get `(0, 0)`: slippage protection is waived when both
    /// tokens go to the same cell.
    pub fn min_amounts(&self, amount0: u128, amount1: u128) -> (u128, u128) {
        if amount0 > 0 && amount1 > 0 {
            return (0, 0);
        }
        (self.min_amount(amount0), self.min_amount(amount1))
    }
}
