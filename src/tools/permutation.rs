//! Empirical p-values by random re-sampling.
//!
//! A statistic is recomputed on random samples drawn without replacement
//! from a pool, and the p-value is the fraction of samples at least as
//! extreme as the observed statistic. Draws come from a ChaCha generator
//! seeded per run, so results are reproducible and independent of thread
//! scheduling.

use log::{
    debug,
    trace,
};
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use serde::{
    Deserialize,
    Serialize,
};
use crate::data_structs::Tail;
use crate::error::{
    invalid_input,
    Result,
};
use crate::utils::partial_shuffle;

/// Relative tolerance for "at least as extreme" comparisons, so that
/// statistics equal up to rounding count as ties.
const COMPARISON_TOLERANCE: f64 = 1e-12;

fn tolerance(reference: f64) -> f64 {
    COMPARISON_TOLERANCE * reference.abs().max(1.0)
}

/// `a >= b` up to rounding.
fn at_least(
    a: f64,
    b: f64,
) -> bool {
    a >= b - tolerance(b)
}

/// Result of a permutation test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PermutationOutcome {
    /// `extreme_count / permutations`.
    pub p_value:       f64,
    /// Permuted statistics at least as extreme as the observed one. For a
    /// two-sided test this is twice the smaller one-sided count, capped at
    /// `permutations`.
    pub extreme_count: usize,
    pub permutations:  usize,
}

impl PermutationOutcome {
    /// Smallest resolvable p-value, `1 / permutations`. A p-value of zero
    /// is reported as is and means "below this floor".
    pub fn floor(&self) -> f64 {
        1.0 / self.permutations as f64
    }

    pub fn is_below_floor(&self) -> bool {
        self.extreme_count == 0
    }
}

/// Permutation count and generator seed for empirical p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationTest {
    permutations: usize,
    seed:         u64,
}

impl PermutationTest {
    pub fn new(
        permutations: usize,
        seed: u64,
    ) -> Result<Self> {
        if permutations == 0 {
            return Err(invalid_input!("permutation count must be positive"));
        }
        Ok(Self { permutations, seed })
    }

    pub fn permutations(&self) -> usize {
        self.permutations
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A fresh generator for this test's seed.
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    /// Runs the test with a generator seeded from [`Self::seed`].
    ///
    /// On every permutation the first `sample_size` elements of `pool` are
    /// replaced with a uniform random sample of the pool and `statistic` is
    /// evaluated on them. `pool` is left in a permuted order.
    pub fn run<T, F>(
        &self,
        pool: &mut [T],
        sample_size: usize,
        observed: f64,
        tail: Tail,
        statistic: F,
    ) -> Result<PermutationOutcome>
    where
        F: FnMut(&[T]) -> f64, {
        let mut rng = self.rng();
        self.run_with_rng(&mut rng, pool, sample_size, observed, tail, statistic)
    }

    /// Same as [`Self::run`] with a caller-supplied generator.
    pub fn run_with_rng<T, F, R>(
        &self,
        rng: &mut R,
        pool: &mut [T],
        sample_size: usize,
        observed: f64,
        tail: Tail,
        mut statistic: F,
    ) -> Result<PermutationOutcome>
    where
        F: FnMut(&[T]) -> f64,
        R: Rng + ?Sized, {
        if sample_size > pool.len() {
            return Err(invalid_input!(
                "permutation sample of {} exceeds a pool of {}",
                sample_size,
                pool.len()
            ));
        }
        if observed.is_nan() {
            return Err(invalid_input!("observed statistic is NaN"));
        }

        let mut draw = |rng: &mut R| {
            partial_shuffle(pool, sample_size, rng);
            statistic(&pool[..sample_size])
        };

        let extreme_count = match tail {
            Tail::Upper => {
                (0..self.permutations)
                    .filter(|_| at_least(draw(&mut *rng), observed))
                    .count()
            },
            // Reversed comparator: "at least as extreme" means "no larger".
            Tail::Lower => {
                (0..self.permutations)
                    .filter(|_| at_least(observed, draw(&mut *rng)))
                    .count()
            },
            // Twice the smaller tail, capped at one.
            Tail::TwoSided => {
                let (mut upper, mut lower) = (0usize, 0usize);
                for _ in 0..self.permutations {
                    let value = draw(&mut *rng);
                    upper += usize::from(at_least(value, observed));
                    lower += usize::from(at_least(observed, value));
                }
                trace!(
                    "Two-sided permutation tails: {} upper, {} lower",
                    upper,
                    lower
                );
                (2 * upper.min(lower)).min(self.permutations)
            },
        };

        let outcome = PermutationOutcome {
            p_value: extreme_count as f64 / self.permutations as f64,
            extreme_count,
            permutations: self.permutations,
        };
        debug!(
            "Permutation test ({}, {} draws of {} out of {}): {} extreme, p = {}",
            tail,
            self.permutations,
            sample_size,
            pool.len(),
            extreme_count,
            outcome.p_value
        );
        Ok(outcome)
    }
}
