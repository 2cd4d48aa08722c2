//! Overflow-free `a * b / d` on 128-bit amounts.

use primitive_types::U256;

/// Computes `floor(a * b / denominator)` with a 256-bit intermediate.
///
/// Returns `None` when `denominator` is zero or the quotient exceeds `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    narrow(quotient)
}

/// Computes `ceil(a * b / denominator)` with a 256-bit intermediate.
pub fn mul_div_rounding_up(a: u128, b: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let mut quotient = product / denominator;
    if !(product % denominator).is_zero() {
        quotient = quotient.checked_add(U256::one())?;
    }
    narrow(quotient)
}

fn narrow(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.as_u128())
    }
}
