//! Running-sum statistic over a ranked list.
//!
//! Walking down a list of `N` entities, the sum increases at every member of
//! the category and decreases by `1 / (N - k)` at every other entity. Hits
//! add `1 / k` in the unweighted form or `|w|^p / Σ|w|^p` in the weighted
//! form, so the walk always ends at zero. The statistic is the deviation of
//! larger magnitude, carrying its sign.

use itertools::Itertools;
use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::Tail;
use crate::error::{
    invalid_input,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningSum {
    /// Largest value reached by the running sum (non-negative).
    pub max_positive: f64,
    /// Largest depth reached below zero, as a non-negative number.
    pub max_negative: f64,
}

impl RunningSum {
    /// Unweighted running sum for the members at `positions` of a list of
    /// length `n`.
    pub fn unweighted(
        n: usize,
        positions: &[usize],
    ) -> Result<Self> {
        let sorted = validate_positions(n, positions)?;
        Ok(Self::walk(n, &sorted, None))
    }

    /// Running sum whose increments are proportional to
    /// `|weights[i]|^exponent`. `weights` covers the whole ranked list.
    pub fn weighted(
        weights: &[f64],
        positions: &[usize],
        exponent: f64,
    ) -> Result<Self> {
        if !exponent.is_finite() || exponent < 0.0 {
            return Err(invalid_input!(
                "running-sum weight exponent must be finite and non-negative, got {}",
                exponent
            ));
        }
        let sorted = validate_positions(weights.len(), positions)?;
        if sorted.iter().any(|&p| !weights[p].is_finite()) {
            return Err(invalid_input!("running-sum weights must be finite"));
        }
        Ok(Self::walk(weights.len(), &sorted, Some((weights, exponent))))
    }

    /// Walks the list visiting only the hits. Between two hits the sum
    /// falls linearly, so its extremes sit right before and right after
    /// each hit.
    ///
    /// `sorted` must be strictly increasing, non-empty and shorter than `n`.
    pub(crate) fn walk(
        n: usize,
        sorted: &[usize],
        weights: Option<(&[f64], f64)>,
    ) -> Self {
        let k = sorted.len();
        let miss = 1.0 / (n - k) as f64;

        let increments: Vec<f64> = match weights {
            Some((weights, exponent)) => {
                let raw = sorted
                    .iter()
                    .map(|&p| weights[p].abs().powf(exponent))
                    .collect_vec();
                let total: f64 = raw.iter().sum();
                if total > 0.0 {
                    raw.into_iter().map(|w| w / total).collect()
                }
                else {
                    vec![1.0 / k as f64; k]
                }
            },
            None => vec![1.0 / k as f64; k],
        };

        let mut hit_sum = 0.0;
        let mut max_positive: f64 = 0.0;
        let mut min_value: f64 = 0.0;
        for (i, (&position, increment)) in sorted.iter().zip(increments).enumerate() {
            let misses = (position - i) as f64 * miss;
            min_value = min_value.min(hit_sum - misses);
            hit_sum += increment;
            max_positive = max_positive.max(hit_sum - misses);
        }

        Self {
            max_positive,
            max_negative: -min_value,
        }
    }

    /// The deviation of larger magnitude, with its sign. Ties favour the
    /// positive side.
    pub fn statistic(&self) -> f64 {
        if self.max_positive >= self.max_negative {
            self.max_positive
        }
        else {
            -self.max_negative
        }
    }

    /// The deviation a permutation test compares: the positive deviation
    /// for the upper tail, the negated negative deviation for the lower
    /// one and the larger magnitude for a two-sided test. Two-sided values
    /// are compared in the upper tail.
    pub(crate) fn tested(
        &self,
        tail: Tail,
    ) -> f64 {
        match tail {
            Tail::Upper => self.max_positive,
            Tail::Lower => -self.max_negative,
            Tail::TwoSided => self.max_positive.max(self.max_negative),
        }
    }
}

fn validate_positions(
    n: usize,
    positions: &[usize],
) -> Result<Vec<usize>> {
    if positions.is_empty() {
        return Err(invalid_input!("running sum needs at least one hit"));
    }
    if positions.len() >= n {
        return Err(invalid_input!(
            "running sum needs at least one non-hit ({} hits in a list of {})",
            positions.len(),
            n
        ));
    }
    let sorted = positions.iter().copied().sorted_unstable().collect_vec();
    if let Some(&last) = sorted.last() {
        if last >= n {
            return Err(invalid_input!(
                "hit position {} outside a list of {}",
                last,
                n
            ));
        }
    }
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(invalid_input!("hit positions must be distinct"));
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::error::EnrichError;

    /// Step-by-step walk over the full list.
    fn brute_force(
        n: usize,
        positions: &[usize],
        weights: Option<(&[f64], f64)>,
    ) -> RunningSum {
        let k = positions.len();
        let norm: f64 = match weights {
            Some((w, p)) => positions.iter().map(|&i| w[i].abs().powf(p)).sum(),
            None => k as f64,
        };
        let mut sum = 0.0;
        let mut max_positive: f64 = 0.0;
        let mut min_value: f64 = 0.0;
        for i in 0..n {
            if positions.contains(&i) {
                sum += match weights {
                    Some((w, p)) => w[i].abs().powf(p) / norm,
                    None => 1.0 / norm,
                };
            }
            else {
                sum -= 1.0 / (n - k) as f64;
            }
            max_positive = max_positive.max(sum);
            min_value = min_value.min(sum);
        }
        RunningSum {
            max_positive,
            max_negative: -min_value,
        }
    }

    #[test]
    fn small_unweighted_example() {
        let rs = RunningSum::unweighted(7, &[1, 2, 6]).unwrap();
        assert_approx_eq!(rs.max_positive, 5.0 / 12.0, 1e-15);
        assert_approx_eq!(rs.max_negative, 1.0 / 3.0, 1e-15);
        assert_approx_eq!(rs.statistic(), 5.0 / 12.0, 1e-15);
    }

    #[test]
    fn ten_element_unweighted_example() {
        let rs = RunningSum::unweighted(10, &[1, 2, 4, 7]).unwrap();
        assert_approx_eq!(rs.max_positive, 5.0 / 12.0, 1e-15);
        assert_approx_eq!(rs.max_negative, 1.0 / 6.0, 1e-15);
        assert_approx_eq!(rs.statistic(), 0.4166666, 1e-5);
    }

    #[test]
    fn leading_members_peak_early() {
        // Hits at the first three of seven positions climb to 3/4 before
        // the misses pull the sum down to -1/4.
        let rs = RunningSum::unweighted(7, &[0, 1, 2, 6]).unwrap();
        assert_approx_eq!(rs.max_positive, 0.75, 1e-15);
        assert_approx_eq!(rs.max_negative, 0.25, 1e-15);
    }

    #[test]
    fn tested_deviation_follows_the_tail() {
        // Seven misses of 1/8, two hits of 1/2, one final miss.
        let rs = RunningSum::unweighted(10, &[7, 8]).unwrap();
        assert_approx_eq!(rs.tested(Tail::Upper), 0.125, 1e-15);
        assert_approx_eq!(rs.tested(Tail::Lower), -0.875, 1e-15);
        assert_approx_eq!(rs.tested(Tail::TwoSided), 0.875, 1e-15);
    }

    #[test]
    fn small_weighted_example() {
        let weights = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        let rs = RunningSum::weighted(&weights, &[1, 2, 4, 7], 1.0).unwrap();
        assert_approx_eq!(rs.statistic(), 43.0 / 78.0, 1e-15);
    }

    #[test]
    fn members_at_the_bottom_give_negative_statistic() {
        let rs = RunningSum::unweighted(10, &[7, 8, 9]).unwrap();
        assert_approx_eq!(rs.statistic(), -1.0, 1e-12);
    }

    #[test]
    fn zero_exponent_matches_unweighted() {
        let weights: Vec<f64> = (0..30).map(|i| (i as f64 - 12.5) * 0.3).collect();
        let positions = [0, 4, 5, 17, 29];
        let weighted = RunningSum::weighted(&weights, &positions, 0.0).unwrap();
        let plain = RunningSum::unweighted(30, &positions).unwrap();
        assert_approx_eq!(weighted.max_positive, plain.max_positive, 1e-12);
        assert_approx_eq!(weighted.max_negative, plain.max_negative, 1e-12);
    }

    #[test]
    fn hit_walk_matches_full_walk() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for round in 0..200 {
            let n = 2 + round % 60;
            let k = 1 + round % (n - 1);
            let mut all: Vec<usize> = (0..n).collect();
            all.shuffle(&mut rng);
            let positions = &all[..k];
            let weights: Vec<f64> = (0..n).map(|i| ((i * 7919) % 13) as f64 - 6.0).collect();

            let fast = RunningSum::unweighted(n, positions).unwrap();
            let slow = brute_force(n, positions, None);
            assert_approx_eq!(fast.max_positive, slow.max_positive, 1e-12);
            assert_approx_eq!(fast.max_negative, slow.max_negative, 1e-12);

            let fast = RunningSum::weighted(&weights, positions, 1.0).unwrap();
            let norm: f64 = positions.iter().map(|&p| weights[p].abs()).sum();
            if norm > 0.0 {
                let slow = brute_force(n, positions, Some((&weights, 1.0)));
                assert_approx_eq!(fast.max_positive, slow.max_positive, 1e-12);
                assert_approx_eq!(fast.max_negative, slow.max_negative, 1e-12);
            }
        }
    }

    #[test]
    fn invalid_positions() {
        assert!(matches!(
            RunningSum::unweighted(5, &[]),
            Err(EnrichError::InvalidInput(_))
        ));
        assert!(matches!(
            RunningSum::unweighted(3, &[0, 1, 2]),
            Err(EnrichError::InvalidInput(_))
        ));
        assert!(matches!(
            RunningSum::unweighted(5, &[1, 1]),
            Err(EnrichError::InvalidInput(_))
        ));
        assert!(matches!(
            RunningSum::unweighted(5, &[7]),
            Err(EnrichError::InvalidInput(_))
        ));
        assert!(matches!(
            RunningSum::weighted(&[1.0, 2.0, 3.0], &[0], -1.0),
            Err(EnrichError::InvalidInput(_))
        ));
    }
}
