use log::warn;
use num::Float;

use super::{
    normal_p_value,
    TestOutcome,
};
use crate::data_structs::Tail;
use crate::error::{
    invalid_input,
    Result,
};
use crate::utils::average_ranks;

/// Wilcoxon rank-sum test of `x` against `y`.
///
/// Both groups are ranked together with average ranks for ties; the
/// statistic is the rank sum of `x`. Large values mean `x` tends to be
/// larger than `y`.
pub fn rank_sum<F: Float>(
    x: &[F],
    y: &[F],
    tail: Tail,
) -> Result<TestOutcome> {
    if x.is_empty() || y.is_empty() {
        return Err(invalid_input!(
            "rank-sum test needs two non-empty groups, got {} and {}",
            x.len(),
            y.len()
        ));
    }
    if x.iter().chain(y.iter()).any(|v| v.is_nan()) {
        return Err(invalid_input!("rank-sum test got NaN values"));
    }

    let pooled: Vec<F> = x.iter().chain(y.iter()).copied().collect();
    let ranking = average_ranks(&pooled);
    let rank_sum: f64 = ranking.ranks[..x.len()].iter().sum();

    rank_sum_from_ranks(rank_sum, x.len(), pooled.len(), ranking.tie_term, tail)
}

/// Normal approximation of the rank-sum test from precomputed ranks.
///
/// `rank_sum` is the sum of the ranks of the `n_x` sample members among
/// `n` ranked values, `tie_term` is `Σ (t³ - t)` over tie groups. A
/// continuity correction of 0.5 is applied towards the mean.
pub fn rank_sum_from_ranks(
    rank_sum: f64,
    n_x: usize,
    n: usize,
    tie_term: f64,
    tail: Tail,
) -> Result<TestOutcome> {
    if n_x == 0 || n_x >= n {
        return Err(invalid_input!(
            "rank-sum sample of {} out of {} values leaves an empty group",
            n_x,
            n
        ));
    }
    let (n_x, n_f) = (n_x as f64, n as f64);
    let n_y = n_f - n_x;

    let mean = n_x * (n_f + 1.0) / 2.0;
    let variance = n_x * n_y / 12.0 * ((n_f + 1.0) - tie_term / (n_f * (n_f - 1.0)));

    let diff = rank_sum - mean;
    let correction = match tail {
        Tail::Upper => 0.5,
        Tail::Lower => -0.5,
        Tail::TwoSided => 0.5 * diff.signum(),
    };
    let z = if variance > 0.0 {
        (diff - correction) / variance.sqrt()
    }
    else {
        warn!("Variance is zero in rank-sum test");
        0.0
    };

    Ok(TestOutcome {
        statistic: rank_sum,
        p_value:   normal_p_value(z, tail),
        df:        None,
    })
}
