use crate::enums::Asset;
use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};

/// Assets held by the manager between venue calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub token0: u128,
    pub token1: u128,
    /// Stray native currency that reached the manager without its consent.
    pub native: u128,
}

impl Balances {
    pub fn get(&self, asset: Asset) -> u128 {
        match asset {
            Asset::Token0 => self.token0,
            Asset::Token1 => self.token1,
        }
    }

    pub fn credit(&mut self, amount0: u128, amount1: u128) -> Result<()> {
        let token0 = self
            .token0
            .checked_add(amount0)
            .ok_or(GridError::InvalidAmount("token0 balance overflow"))?;
        let token1 = self
            .token1
            .checked_add(amount1)
            .ok_or(GridError::InvalidAmount("token1 balance overflow"))?;
        self.token0 = token0;
        self.token1 = token1;
        Ok(())
    }

    pub fn debit(&mut self, amount0: u128, amount1: u128) -> Result<()> {
        let token0 = self
            .token0
            .checked_sub(amount0)
            .ok_or(GridError::InsufficientBalance)?;
        let token1 = self
            .token1
            .checked_sub(amount1)
            .ok_or(GridError::InsufficientBalance)?;
        self.token0 = token0;
        self.token1 = token1;
        Ok(())
    }

    pub fn has_tokens(&self) -> bool {
        self.token0 > 0 || self.token1 > 0
    }

    /// Empties the token balances, leaving native untouched.
    pub fn take_tokens(&mut self) -> Payout {
        let payout = Payout {
            token0: self.token0,
            token1: self.token1,
            native: 0,
        };
        self.token0 = 0;
        self.token1 = 0;
        payout
    }

    /// Empties everything, native included.
    pub fn take_all(&mut self) -> Payout {
        let payout = Payout {
            token0: self.token0,
            token1: self.token1,
            native: self.native,
        };
        *self = Self::default();
        payout
    }
}

/// Assets transferred out to a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub token0: u128,
    pub token1: u128,
    pub native: u128,
}
