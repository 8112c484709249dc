//! Hypothesis tests producing [`PValue`]s.
//!
//! Exact tests ([`Hypergeometric`], [`Binomial`], [`fisher_exact`]) sum
//! point probabilities and switch to log-space arithmetic when the result
//! would underflow `f64`. Approximate tests (t-tests, rank-sum,
//! Kolmogorov-Smirnov) evaluate a continuous reference distribution.

mod binomial;
mod discrete;
mod hypergeom;
mod ks;
mod ranksum;
mod ttest;

pub use binomial::Binomial;
pub(crate) use discrete::{
    two_sided_ln_cutoff,
    DiscreteSupport,
};
pub use hypergeom::{
    fisher_exact,
    Hypergeometric,
};
pub use ks::kolmogorov_smirnov_p;
pub use ranksum::{
    rank_sum,
    rank_sum_from_ranks,
};
use serde::{
    Deserialize,
    Serialize,
};
use statrs::function::erf::erfc;
pub(crate) use ttest::{
    one_sample_statistic,
    t_p_value,
    two_sample_statistic,
    Moments,
};
pub use ttest::{
    one_sample_t,
    two_sample_t,
    SampleSummary,
};

use crate::data_structs::{
    PValue,
    Tail,
};

/// Statistic and p-value of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value:   PValue,
    /// Degrees of freedom, for tests that have them.
    pub df:        Option<f64>,
}

/// Beyond this z the upper normal tail is taken from its asymptotic
/// expansion, which stays accurate where `erfc` underflows.
const ASYMPTOTIC_Z: f64 = 36.0;

/// `ln P(Z > z)` for large `z`.
fn ln_normal_sf_asymptotic(z: f64) -> f64 {
    let z2 = z * z;
    let series = 1.0 - 1.0 / z2 + 3.0 / (z2 * z2) - 15.0 / (z2 * z2 * z2);
    -0.5 * z2 - z.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln() + series.ln()
}

/// `P(Z > z)` for a standard normal `Z`.
fn normal_sf(z: f64) -> PValue {
    if z < ASYMPTOTIC_Z {
        PValue::new(0.5 * erfc(z / std::f64::consts::SQRT_2))
    }
    else {
        PValue::from_ln(ln_normal_sf_asymptotic(z))
    }
}

/// Tail probability of a z-score.
pub(crate) fn normal_p_value(
    z: f64,
    tail: Tail,
) -> PValue {
    match tail {
        Tail::Lower => normal_sf(-z),
        Tail::Upper => normal_sf(z),
        Tail::TwoSided => {
            let z = z.abs();
            if z < ASYMPTOTIC_Z {
                PValue::new(erfc(z / std::f64::consts::SQRT_2))
            }
            else {
                PValue::from_ln(std::f64::consts::LN_2 + ln_normal_sf_asymptotic(z))
            }
        },
    }
}
