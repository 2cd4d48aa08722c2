use grid_lp_domain::math::price_tick::price_to_tick;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Produces a price path of `steps + 1` points, starting price included.
pub trait PricePathGenerator {
    fn generate(&mut self, steps: usize) -> Vec<Decimal>;
}

/// Geometric Brownian motion over token1-per-token0 prices.
pub struct GeometricBrownianMotion {
    pub initial_price: Decimal,
    pub drift: f64,      // annualized drift (mu)
    pub volatility: f64, // annualized volatility (sigma)
    pub time_step: f64,  // time step in years (dt) e.g. 1/8760 for hourly
    rng: StdRng,
}

impl GeometricBrownianMotion {
    pub fn new(initial_price: Decimal, drift: f64, volatility: f64, time_step: f64) -> Self {
        Self {
            initial_price,
            drift,
            volatility,
            time_step,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Reproducible path for a given seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl PricePathGenerator for GeometricBrownianMotion {
    fn generate(&mut self, steps: usize) -> Vec<Decimal> {
        let mut prices = Vec::with_capacity(steps + 1);
        prices.push(self.initial_price);

        // A negative or NaN sigma degenerates to a flat walk.
        let normal = Normal::new(0.0, 1.0).ok();

        let dt = self.time_step;
        let drift_term = (self.drift - 0.5 * self.volatility.powi(2)) * dt;
        let vol_term = self.volatility * dt.sqrt();

        let mut current_price = self.initial_price.to_f64().unwrap_or(0.0);

        for _ in 0..steps {
            let z = normal.map_or(0.0, |n| n.sample(&mut self.rng));
            current_price *= (drift_term + vol_term * z).exp();
            prices.push(Decimal::from_f64(current_price).unwrap_or(Decimal::ZERO));
        }

        prices
    }
}

/// Replays a fixed list of prices.
pub struct DeterministicPricePath {
    pub prices: Vec<Decimal>,
}

impl PricePathGenerator for DeterministicPricePath {
    fn generate(&mut self, steps: usize) -> Vec<Decimal> {
        self.prices.iter().copied().take(steps + 1).collect()
    }
}

/// Converts prices to venue ticks.
///
/// # Errors
///
/// Fails on the first price that has no tick (zero, negative or out of range).
pub fn prices_to_ticks(prices: &[Decimal]) -> Result<Vec<i32>, &'static str> {
    prices.iter().map(|p| price_to_tick(*p)).collect()
}
