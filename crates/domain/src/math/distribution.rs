//! Capital distribution weights.
//!
//! Weights are basis points, one per cell, with index 0 the lowest-price cell.
//!
//! `Flat` uses plain floor division and does not redistribute the remainder,
//! so its total may fall short of 10 000 by at most `cell_count - 1`. Every
//! other implemented kind adds its rounding remainder to the heaviest cell
//! (first one on ties), so the total is exactly 10 000.

use crate::enums::DistributionKind;
use crate::error::{GridError, Result};
use crate::value_objects::grid_cell::TOTAL_WEIGHT_BPS;
use primitive_types::U256;

/// Computes `cell_count` weights for `kind`.
///
/// # Errors
///
/// * [`GridError::NotImplemented`] for `Sigmoid` and `Logarithmic`, whatever the count.
/// * [`GridError::DegenerateGrid`] when `cell_count` is zero.
pub fn distribution_weights(cell_count: usize, kind: DistributionKind) -> Result<Vec<u32>> {
    if matches!(
        kind,
        DistributionKind::Sigmoid | DistributionKind::Logarithmic
    ) {
        return Err(GridError::NotImplemented(kind));
    }
    if cell_count == 0 {
        return Err(GridError::DegenerateGrid { cells: 0 });
    }

    let total = u128::from(TOTAL_WEIGHT_BPS);
    match kind {
        DistributionKind::Flat => {
            let weight = TOTAL_WEIGHT_BPS / cell_count as u32;
            Ok(vec![weight; cell_count])
        }
        DistributionKind::Linear | DistributionKind::ReverseLinear => {
            let n = cell_count as u128;
            let denominator = n * (n + 1) / 2;
            let mut weights: Vec<u32> = (0..n)
                .map(|i| {
                    let rank = if kind == DistributionKind::Linear {
                        i + 1
                    } else {
                        n - i
                    };
                    (rank * total / denominator) as u32
                })
                .collect();
            assign_remainder(&mut weights);
            Ok(weights)
        }
        DistributionKind::Fibonacci => {
            let terms = fibonacci(cell_count);
            let sum = terms
                .iter()
                .try_fold(U256::zero(), |acc, term| acc.checked_add(*term))
                .ok_or(GridError::RangeOverflow("fibonacci sum"))?;
            let mut weights = terms
                .iter()
                .map(|term| {
                    term.checked_mul(U256::from(total))
                        .map(|scaled| (scaled / sum).as_u32())
                        .ok_or(GridError::RangeOverflow("fibonacci weight"))
                })
                .collect::<Result<Vec<u32>>>()?;
            assign_remainder(&mut weights);
            Ok(weights)
        }
        DistributionKind::Sigmoid | DistributionKind::Logarithmic => {
            Err(GridError::NotImplemented(kind))
        }
    }
}

/// Terms are halved together once the newest passes `2^FIBONACCI_CEILING_BITS`;
/// their ratios survive and `term * 10_000` stays within 256 bits.
const FIBONACCI_CEILING_BITS: u32 = 200;

/// First `count` Fibonacci numbers seeded with 1, 1, rescaled as they grow.
fn fibonacci(count: usize) -> Vec<U256> {
    let ceiling = U256::one() << FIBONACCI_CEILING_BITS;
    let mut terms: Vec<U256> = Vec::with_capacity(count);
    for i in 0..count {
        let term = if i < 2 {
            U256::one()
        } else {
            terms[i - 1] + terms[i - 2]
        };
        terms.push(term);
        if term > ceiling {
            for t in terms.iter_mut() {
                *t = *t >> 1u32;
            }
        }
    }
    terms
}

fn assign_remainder(weights: &mut [u32]) {
    let assigned: u32 = weights.iter().sum();
    let remainder = TOTAL_WEIGHT_BPS.saturating_sub(assigned);
    let heaviest = weights
        .iter()
        .enumerate()
        .fold(0, |best, (i, w)| if *w > weights[best] { i } else { best });
    if let Some(weight) = weights.get_mut(heaviest) {
        *weight += remainder;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_even_split() {
        assert_eq!(
            distribution_weights(5, DistributionKind::Flat).unwrap(),
            vec![2000; 5]
        );
    }

    #[test]
    fn test_flat_truncates_without_redistribution() {
        let weights = distribution_weights(3, DistributionKind::Flat).unwrap();
        assert_eq!(weights, vec![3333, 3333, 3333]);
        assert_eq!(weights.iter().sum::<u32>(), 9999);
    }

    #[test]
    fn test_linear_ramp() {
        let weights = distribution_weights(4, DistributionKind::Linear).unwrap();
        assert_eq!(weights, vec![1000, 2000, 3000, 4000]);

        let weights = distribution_weights(3, DistributionKind::Linear).unwrap();
        // 1666, 3333, 5000 + remainder 1 on the heaviest cell
        assert_eq!(weights, vec![1666, 3333, 5001]);
    }

    #[test]
    fn test_reverse_linear_mirrors_linear() {
        let linear = distribution_weights(7, DistributionKind::Linear).unwrap();
        let mut reverse = distribution_weights(7, DistributionKind::ReverseLinear).unwrap();
        reverse.reverse();
        assert_eq!(linear, reverse);
    }

    #[test]
    fn test_fibonacci_example() {
        let weights = distribution_weights(5, DistributionKind::Fibonacci).unwrap();
        // Proportional to [1, 1, 2, 3, 5] / 12; remainder lands on the last cell.
        assert_eq!(weights, vec![833, 833, 1666, 2500, 4168]);
        assert_eq!(weights.iter().sum::<u32>(), 10_000);
    }

    #[test]
    fn test_single_cell_takes_everything() {
        for kind in [
            DistributionKind::Flat,
            DistributionKind::Linear,
            DistributionKind::ReverseLinear,
            DistributionKind::Fibonacci,
        ] {
            assert_eq!(distribution_weights(1, kind).unwrap(), vec![10_000]);
        }
    }

    #[test]
    fn test_reserved_kinds_fail_closed() {
        for count in [0, 1, 10] {
            assert_eq!(
                distribution_weights(count, DistributionKind::Sigmoid),
                Err(GridError::NotImplemented(DistributionKind::Sigmoid))
            );
            assert_eq!(
                distribution_weights(count, DistributionKind::Logarithmic),
                Err(GridError::NotImplemented(DistributionKind::Logarithmic))
            );
        }
    }

    #[test]
    fn test_zero_cells_rejected() {
        assert_eq!(
            distribution_weights(0, DistributionKind::Flat),
            Err(GridError::DegenerateGrid { cells: 0 })
        );
    }

    #[test]
    fn test_fibonacci_large_grids_stay_normalized() {
        for count in [366, 1000] {
            let weights = distribution_weights(count, DistributionKind::Fibonacci).unwrap();
            assert_eq!(weights.len(), count);
            assert_eq!(weights.iter().sum::<u32>(), 10_000);
            assert!(weights.windows(2).all(|w| w[0] <= w[1]));
            // 1/phi^2 of the sum plus the rounding remainder.
            assert_eq!(weights[count - 1], 3830);
            assert_eq!(weights[0], 0);
        }
    }

    #[test]
    fn test_fibonacci_terms_keep_their_ratios_after_rescaling() {
        let terms = fibonacci(600);
        let ceiling = U256::one() << (FIBONACCI_CEILING_BITS + 1);
        assert!(terms.iter().all(|t| *t <= ceiling));
        let (last, previous) = (terms[599], terms[598]);
        // F(n) / F(n-1) approaches phi, 1.6180...
        let ratio = (last * U256::from(10_000u32) / previous).as_u32();
        assert!((16_179..=16_181).contains(&ratio));
    }
}
