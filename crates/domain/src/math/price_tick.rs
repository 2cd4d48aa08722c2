//! Conversions between ticks and prices.
//!
//! Prices are token1 per token0 and every tick is a 1 bp price step:
//! `price(tick) = 1.0001^tick`.

use crate::math::tick_grid::{MAX_TICK, MIN_TICK};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

const TICK_BASE: f64 = 1.0001;

fn check_tick(tick: i32) -> Result<(), &'static str> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err("tick outside venue bounds");
    }
    Ok(())
}

/// Price at `tick`.
pub fn tick_to_price(tick: i32) -> Result<Decimal, &'static str> {
    check_tick(tick)?;
    Decimal::from_f64(TICK_BASE.powi(tick)).ok_or("price not representable")
}

/// Square root of the price at `tick`, `1.0001^(tick / 2)`.
pub fn tick_to_sqrt_price(tick: i32) -> Result<Decimal, &'static str> {
    check_tick(tick)?;
    Decimal::from_f64(TICK_BASE.sqrt().powi(tick)).ok_or("sqrt price not representable")
}

/// Nearest tick to `price`.
pub fn price_to_tick(price: Decimal) -> Result<i32, &'static str> {
    if price <= Decimal::ZERO {
        return Err("price must be positive");
    }
    let value = price.to_f64().ok_or("price not representable")?;
    let tick = value.log(TICK_BASE).round();
    if tick < f64::from(MIN_TICK) || tick > f64::from(MAX_TICK) {
        return Err("tick outside venue bounds");
    }
    Ok(tick as i32)
}
