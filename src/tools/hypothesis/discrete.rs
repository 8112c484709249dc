//! Tail sums of unimodal discrete distributions.
//!
//! Summation starts at the largest term of the requested range and walks
//! outward with the ratio `pmf(k + 1) / pmf(k)`, so the dominant terms are
//! accumulated first and the walk stops once further terms can no longer
//! change the sum. The numeric type is chosen per call: native `f64`
//! unless the log-magnitude of the result signals an [`UnderflowRisk`], in
//! which case the log-domain [`LogReal`] is used.

use log::debug;

use crate::data_structs::pvalue::{
    check_underflow,
    UnderflowRisk,
};
use crate::data_structs::{
    LogReal,
    PValue,
    ProbReal,
    Tail,
};

/// Terms smaller than `sum · e^-40` (≈ 4e-18 relative) are dropped.
const LN_NEGLIGIBLE: f64 = -40.0;

/// Relative tolerance when deciding whether a point probability is "no
/// greater" than the observed one in two-sided tests.
const TWO_SIDED_REL_TOLERANCE: f64 = 1e-7;

/// A unimodal distribution on a contiguous integer support.
pub(crate) trait DiscreteSupport {
    /// Inclusive support bounds.
    fn support(&self) -> (u64, u64);

    /// A mode of the distribution (clamped into the support by callers).
    fn mode(&self) -> u64;

    /// Natural log of the point probability; `-inf` outside the support.
    fn ln_pmf(
        &self,
        k: u64,
    ) -> f64;

    /// `pmf(k + 1) / pmf(k)` for `k` in `[lo, hi)`.
    fn ratio(
        &self,
        k: u64,
    ) -> f64;
}

/// Sums the point probabilities over `from..=to`. With `ln_cutoff`, only
/// terms not exceeding `exp(ln_cutoff)` are included.
fn accumulate<R, D>(
    dist: &D,
    from: u64,
    to: u64,
    ln_cutoff: Option<f64>,
) -> R
where
    R: ProbReal,
    D: DiscreteSupport + ?Sized, {
    if from > to {
        return R::zero();
    }
    let cutoff = ln_cutoff.map(R::from_ln);
    let include = |term: R| cutoff.map_or(true, |c| term <= c);
    let negligible = |term: R, sum: R| term.to_ln() < sum.to_ln() + LN_NEGLIGIBLE;

    let anchor = dist.mode().clamp(from, to);
    let anchor_term = R::from_ln(dist.ln_pmf(anchor));
    let mut sum = if include(anchor_term) {
        anchor_term
    }
    else {
        R::zero()
    };

    let mut term = anchor_term;
    for k in anchor..to {
        term = term * R::from_f64(dist.ratio(k));
        if include(term) {
            if negligible(term, sum) {
                break;
            }
            sum = sum + term;
        }
    }

    let mut term = anchor_term;
    for k in (from..anchor).rev() {
        term = term / R::from_f64(dist.ratio(k));
        if include(term) {
            if negligible(term, sum) {
                break;
            }
            sum = sum + term;
        }
    }

    sum
}

/// Sums in `f64` when safe and in log space otherwise.
fn sum_with_precision<D>(
    dist: &D,
    from: u64,
    to: u64,
    ln_cutoff: Option<f64>,
) -> PValue
where
    D: DiscreteSupport + ?Sized, {
    // The sum is at least its largest included term: the anchor for plain
    // tails, the observed point probability for two-sided sums.
    let ln_estimate = ln_cutoff.unwrap_or_else(|| dist.ln_pmf(dist.mode().clamp(from, to)));

    match check_underflow(ln_estimate) {
        Ok(()) => accumulate::<f64, D>(dist, from, to, ln_cutoff).into_pvalue(),
        Err(UnderflowRisk) => {
            debug!(
                "Tail over {}..={} below f64 range (ln ≈ {:.1}), summing in log space",
                from, to, ln_estimate
            );
            accumulate::<LogReal, D>(dist, from, to, ln_cutoff).into_pvalue()
        },
    }
}

/// Log point probability at or below which an outcome is at least as
/// extreme as `k` in a two-sided test.
pub(crate) fn two_sided_ln_cutoff<D>(
    dist: &D,
    k: u64,
) -> f64
where
    D: DiscreteSupport + ?Sized, {
    dist.ln_pmf(k) + TWO_SIDED_REL_TOLERANCE.ln_1p()
}

/// `P(X = k)`.
pub(crate) fn point_probability<D>(
    dist: &D,
    k: u64,
) -> PValue
where
    D: DiscreteSupport + ?Sized, {
    PValue::from_ln(dist.ln_pmf(k))
}

/// Tail probability of observing `k` under `dist`.
///
/// * lower: `P(X <= k)`
/// * upper: `P(X >= k)`
/// * two-sided: sum of all `P(X = i) <= P(X = k)` over the support.
pub(crate) fn tail_probability<D>(
    dist: &D,
    k: u64,
    tail: Tail,
) -> PValue
where
    D: DiscreteSupport + ?Sized, {
    let (lo, hi) = dist.support();
    match tail {
        Tail::Lower => {
            if k < lo {
                PValue::zero()
            }
            else if k >= hi {
                PValue::one()
            }
            else {
                sum_with_precision(dist, lo, k, None)
            }
        },
        Tail::Upper => {
            if k > hi {
                PValue::zero()
            }
            else if k <= lo {
                PValue::one()
            }
            else {
                sum_with_precision(dist, k, hi, None)
            }
        },
        Tail::TwoSided => {
            if k < lo || k > hi {
                return PValue::zero();
            }
            sum_with_precision(dist, lo, hi, Some(two_sided_ln_cutoff(dist, k)))
        },
    }
}
