//! This module contains various utility functions and helper macros used
//! throughout the enrichkit crate.
//!
//! Key functionalities include:
//!
//! - The shared Rayon thread pool used for batch evaluation of categories.
//!   Its size is read from the `ENRICHKIT_NUM_THREADS` environment variable.
//! - Permutation helpers: stable sort permutations, their inverses and the
//!   prefix Fisher-Yates shuffle used by the permutation test framework.
//! - Statistical helpers (average ranks with tie bookkeeping, the Kolmogorov
//!   distribution) in [`stats`].
//! - Macros for common struct operations (getter functions, builder-style
//!   `with_*` methods).

use std::cmp::Ordering;

use log::warn;
use once_cell::sync::Lazy;
use rand::Rng;
use rayon::{
    ThreadPool,
    ThreadPoolBuilder,
};

use crate::data_structs::Order;

mod stats;
pub use stats::*;

pub static THREAD_POOL: Lazy<ThreadPool> = Lazy::new(|| {
    let num_threads: Option<usize> = std::env::var("ENRICHKIT_NUM_THREADS")
        .ok()
        .and_then(|str| str.parse::<usize>().ok());
    ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .build()
        .expect("Failed to create thread pool")
});

pub fn n_threads() -> usize {
    THREAD_POOL.current_num_threads()
}

#[macro_export]
macro_rules! getter_fn {
    ($field_name: ident, $field_type: ty) => {
        #[cfg_attr(coverage_nightly, coverage(off))]
        pub fn $field_name(&self) -> &$field_type {
            &self.$field_name
        }
    };
}
pub use getter_fn;

#[macro_export]
macro_rules! with_field_fn {
    ($field_name: ident, $field_type: ty) => {
        paste::paste! {
            #[cfg_attr(coverage_nightly, coverage(off))]
            pub fn [<with_$field_name>](mut self, value: $field_type) -> Self {
            self.$field_name = value;
            self
            }
        }
    };
}

/// Compares two scores according to `order`. NaN sorts last in both
/// directions.
pub fn compare_scores(
    a: f64,
    b: f64,
    order: Order,
) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match order {
            Order::Increasing => a.total_cmp(&b),
            Order::Decreasing => b.total_cmp(&a),
        },
    }
}

/// Returns the permutation that sorts `values` in the given order.
///
/// `perm[i]` is the original index of the element that lands at sorted
/// position `i`. The sort is stable: ties keep their original relative
/// order.
pub fn sort_permutation(
    values: &[f64],
    order: Order,
) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    perm.sort_by(|&a, &b| compare_scores(values[a], values[b], order));
    perm
}

/// Inverts a permutation: `inv[perm[i]] == i` for all `i`.
pub fn invert_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; perm.len()];
    for (position, &original) in perm.iter().enumerate() {
        inverse[original] = position;
    }
    inverse
}

/// Gathers `values` into the order described by `perm`.
pub fn apply_permutation<T: Clone>(
    values: &[T],
    perm: &[usize],
) -> Vec<T> {
    perm.iter().map(|&i| values[i].clone()).collect()
}

/// Shuffles a uniformly random selection of `amount` elements into the
/// front of `values`.
///
/// Fisher-Yates restricted to the prefix: position `i` is exchanged with a
/// uniformly chosen position in `i..len`, so the prefix is a uniform random
/// ordered sample and the suffix holds the remaining elements. The multiset
/// of elements is never changed.
pub fn partial_shuffle<T, R>(
    values: &mut [T],
    amount: usize,
    rng: &mut R,
) where
    R: Rng + ?Sized, {
    let len = values.len();
    if amount > len {
        warn!(
            "Partial shuffle asked for {} elements of a slice of {}",
            amount, len
        );
    }
    for i in 0..amount.min(len) {
        let j = rng.gen_range(i..len);
        values.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn sort_permutation_is_stable() {
        let values = vec![2.0, 1.0, 2.0, 3.0, 1.0];
        assert_eq!(
            sort_permutation(&values, Order::Increasing),
            vec![1, 4, 0, 2, 3]
        );
        assert_eq!(
            sort_permutation(&values, Order::Decreasing),
            vec![3, 0, 2, 1, 4]
        );
    }

    #[test]
    fn nan_scores_sort_last() {
        let values = vec![f64::NAN, 1.0, 3.0];
        assert_eq!(sort_permutation(&values, Order::Increasing), vec![1, 2, 0]);
        assert_eq!(sort_permutation(&values, Order::Decreasing), vec![2, 1, 0]);
    }

    #[test]
    fn permutation_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let len = rng.gen_range(0..64);
            let values: Vec<f64> =
                (0..len).map(|_| rng.gen_range(-5..5) as f64).collect();
            let perm = sort_permutation(&values, Order::Decreasing);
            let inv = invert_permutation(&perm);
            for i in 0..len {
                assert_eq!(perm[inv[i]], i);
                assert_eq!(inv[perm[i]], i);
            }
            let sorted = apply_permutation(&values, &perm);
            assert!(sorted.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn partial_shuffle_keeps_multiset() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let len = rng.gen_range(1..50);
            let split = rng.gen_range(0..=len);
            let original: Vec<usize> = (0..len).map(|i| i % 7).collect();
            let mut shuffled = original.clone();
            partial_shuffle(&mut shuffled, split, &mut rng);

            let mut a = original.clone();
            let mut b = shuffled.clone();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn partial_shuffle_is_uniform_on_first_position() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut counts = [0usize; 5];
        let trials = 50_000;
        for _ in 0..trials {
            let mut values = [0usize, 1, 2, 3, 4];
            partial_shuffle(&mut values, 2, &mut rng);
            counts[values[0]] += 1;
        }
        for count in counts {
            let freq = count as f64 / trials as f64;
            assert!((freq - 0.2).abs() < 0.01, "frequency {freq}");
        }
    }
}
