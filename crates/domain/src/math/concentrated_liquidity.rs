//! Liquidity/amount conversions for a single price range.
//!
//! All functions take square-root prices and accept the bounds in either
//! order. Amounts are raw token units.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

fn ordered(sqrt_price_a: Decimal, sqrt_price_b: Decimal) -> (Decimal, Decimal) {
    if sqrt_price_a < sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    }
}

fn to_decimal(value: u128) -> Result<Decimal, &'static str> {
    Decimal::from_u128(value).ok_or("Overflow converting to decimal")
}

fn to_amount(value: Decimal, round_up: bool) -> Result<u128, &'static str> {
    let value = if round_up { value.ceil() } else { value.floor() };
    value.to_u128().ok_or("Overflow converting amount")
}

/// Token0 held by `liquidity` across a sqrt-price interval.
/// delta_x = L * (1/sqrt(P_a) - 1/sqrt(P_b))
pub fn get_amount0_delta(
    liquidity: u128,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
    round_up: bool,
) -> Result<u128, &'static str> {
    if sqrt_price_a <= Decimal::ZERO || sqrt_price_b <= Decimal::ZERO {
        return Err("sqrt price must be positive");
    }
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);

    // delta_x = L * ( (upper - lower) / (lower * upper) )
    let den = lower.checked_mul(upper).ok_or("Overflow in denominator")?;
    if den.is_zero() {
        return Err("empty price interval");
    }
    let factor = (upper - lower).checked_div(den).ok_or("Overflow in factor")?;
    let amount = to_decimal(liquidity)?
        .checked_mul(factor)
        .ok_or("Overflow in amount0")?;
    to_amount(amount, round_up)
}

/// Token1 held by `liquidity` across a sqrt-price interval.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a))
pub fn get_amount1_delta(
    liquidity: u128,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
    round_up: bool,
) -> Result<u128, &'static str> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    let amount = to_decimal(liquidity)?
        .checked_mul(upper - lower)
        .ok_or("Overflow in amount1")?;
    to_amount(amount, round_up)
}

/// Liquidity backed by `amount0` alone.
/// L = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount0(
    amount0: u128,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
) -> Result<u128, &'static str> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    let den = upper - lower;
    if den.is_zero() {
        return Err("empty price interval");
    }
    let num = to_decimal(amount0)?
        .checked_mul(lower)
        .and_then(|v| v.checked_mul(upper))
        .ok_or("Overflow in liquidity")?;
    let liquidity = num.checked_div(den).ok_or("Overflow in liquidity")?;
    to_amount(liquidity, false)
}

/// Liquidity backed by `amount1` alone.
/// L = amount1 / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount1(
    amount1: u128,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
) -> Result<u128, &'static str> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    let den = upper - lower;
    if den.is_zero() {
        return Err("empty price interval");
    }
    let liquidity = to_decimal(amount1)?
        .checked_div(den)
        .ok_or("Overflow in liquidity")?;
    to_amount(liquidity, false)
}

/// Largest liquidity the given amounts can back at the current price.
pub fn get_liquidity_for_amounts(
    sqrt_price_current: Decimal,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
    amount0: u128,
    amount1: u128,
) -> Result<u128, &'static str> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    if sqrt_price_current <= lower {
        get_liquidity_for_amount0(amount0, lower, upper)
    } else if sqrt_price_current < upper {
        let from0 = get_liquidity_for_amount0(amount0, sqrt_price_current, upper)?;
        let from1 = get_liquidity_for_amount1(amount1, lower, sqrt_price_current)?;
        Ok(from0.min(from1))
    } else {
        get_liquidity_for_amount1(amount1, lower, upper)
    }
}

/// Token amounts represented by `liquidity` at the current price.
pub fn get_amounts_for_liquidity(
    sqrt_price_current: Decimal,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
    liquidity: u128,
    round_up: bool,
) -> Result<(u128, u128), &'static str> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    if sqrt_price_current <= lower {
        Ok((get_amount0_delta(liquidity, lower, upper, round_up)?, 0))
    } else if sqrt_price_current < upper {
        Ok((
            get_amount0_delta(liquidity, sqrt_price_current, upper, round_up)?,
            get_amount1_delta(liquidity, lower, sqrt_price_current, round_up)?,
        ))
    } else {
        Ok((0, get_amount1_delta(liquidity, lower, upper, round_up)?))
    }
}
