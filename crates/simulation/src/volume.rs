use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, LogNormal};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Trait for modeling swap volume, in raw token units per step.
pub trait VolumeModel {
    fn next_volume(&mut self, step: usize) -> Decimal;

    /// Fee paid on the step's volume at `fee_tier` (hundredths of a bip).
    fn next_fee(&mut self, step: usize, fee_tier: u32) -> u128 {
        let fee = self.next_volume(step) * Decimal::from(fee_tier) / Decimal::from(1_000_000u32);
        fee.floor().to_u128().unwrap_or(0)
    }
}

/// Constant volume model.
#[derive(Debug, Clone)]
pub struct ConstantVolume {
    pub volume: Decimal,
}

impl ConstantVolume {
    #[must_use]
    pub fn new(volume: Decimal) -> Self {
        Self { volume }
    }
}

impl VolumeModel for ConstantVolume {
    fn next_volume(&mut self, _step: usize) -> Decimal {
        self.volume
    }
}

/// Volume drawn from a log-normal distribution around a median.
pub struct LogNormalVolume {
    median: Decimal,
    distribution: Option<LogNormal<f64>>,
    rng: StdRng,
}

impl LogNormalVolume {
    /// `sigma` is the standard deviation of the log volume.
    pub fn new(median: Decimal, sigma: f64, seed: u64) -> Self {
        Self {
            median,
            distribution: LogNormal::new(0.0, sigma).ok(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl VolumeModel for LogNormalVolume {
    fn next_volume(&mut self, _step: usize) -> Decimal {
        let factor = self
            .distribution
            .as_ref()
            .map_or(1.0, |d| d.sample(&mut self.rng));
        self.median * Decimal::from_f64(factor).unwrap_or(Decimal::ONE)
    }
}
