use serde::{Deserialize, Serialize};

/// Where the grid sits relative to the reference tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridType {
    /// Band straddling the reference tick.
    Neutral,
    /// Band at or below the reference tick (token1 waiting to buy token0).
    Buy,
    /// Band at or above the reference tick (token0 waiting to be sold).
    Sell,
}

impl GridType {
    /// Checks deposited amounts against the side(s) this grid funds.
    pub fn validate_amounts(self, amount0: u128, amount1: u128) -> crate::error::Result<()> {
        use crate::error::GridError;

        match self {
            Self::Neutral if amount0 == 0 || amount1 == 0 => Err(GridError::InvalidAmount(
                "neutral grid requires both token amounts",
            )),
            Self::Buy if amount1 == 0 => Err(GridError::InvalidAmount(
                "buy grid requires a token1 amount",
            )),
            Self::Sell if amount0 == 0 => Err(GridError::InvalidAmount(
                "sell grid requires a token0 amount",
            )),
            _ => Ok(()),
        }
    }
}

/// Weighting function used to spread capital across grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionKind {
    Flat,
    Linear,
    ReverseLinear,
    Fibonacci,
    /// Reserved.
    Sigmoid,
    /// Reserved.
    Logarithmic,
}

/// Treatment of the cell whose span contains the reference tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StraddlePolicy {
    /// Drop the straddling cell before weights are computed.
    #[default]
    SkipStraddling,
    /// Keep the cell in the grid; it still receives no liquidity.
    Keep,
}

/// One of the two venue assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Token0,
    Token1,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;

    #[test]
    fn test_grid_type_amount_rules() {
        assert!(GridType::Neutral.validate_amounts(1, 1).is_ok());
        assert!(matches!(
            GridType::Neutral.validate_amounts(1, 0),
            Err(GridError::InvalidAmount(_))
        ));
        assert!(GridType::Buy.validate_amounts(0, 5).is_ok());
        assert!(GridType::Buy.validate_amounts(5, 0).is_err());
        assert!(GridType::Sell.validate_amounts(5, 0).is_ok());
        assert!(GridType::Sell.validate_amounts(0, 5).is_err());
    }

    #[test]
    fn test_straddle_policy_default() {
        assert_eq!(StraddlePolicy::default(), StraddlePolicy::SkipStraddling);
    }
}
