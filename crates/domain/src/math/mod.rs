pub mod concentrated_liquidity;
pub mod distribution;
pub mod full_math;
pub mod price_tick;
pub mod tick_grid;

#[cfg(test)]
mod proptest_properties;
