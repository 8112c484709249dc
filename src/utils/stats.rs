use log::*;
use num::Float;

/// Average ranks of a pooled sample together with the tie bookkeeping the
/// rank-sum variance correction needs.
#[derive(Debug, Clone)]
pub struct Ranking {
    /// 1-based average rank of every input value, in input order.
    pub ranks:    Vec<f64>,
    /// `Σ (t³ - t)` over all groups of `t` tied values.
    pub tie_term: f64,
}

/// Represents an observation while ranking.
#[derive(Debug)]
struct Observation<F: Float> {
    /// The observed value
    value: F,
    /// Position of the observation in the input
    index: usize,
}

/// Assigns 1-based ranks to `values`, averaging the ranks of tied values.
///
/// NaN values are ranked after every other value.
pub fn average_ranks<F: Float>(values: &[F]) -> Ranking {
    let mut observations: Vec<Observation<F>> = values
        .iter()
        .enumerate()
        .map(|(index, &value)| Observation { value, index })
        .collect();

    observations.sort_by(|a, b| {
        match (a.value.is_nan(), b.value.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => a
                .value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal),
        }
    });

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < observations.len() {
        let start = i;
        let mut end = i + 1;

        // Find all tied values
        while end < observations.len()
            && observations[end].value == observations[start].value
        {
            end += 1;
        }

        let count = end - start;
        let avg_rank = (start as f64 + 1.0 + end as f64) / 2.0;
        for obs in &observations[start..end] {
            ranks[obs.index] = avg_rank;
        }

        if count > 1 {
            let t = count as f64;
            tie_term += t * t * t - t;
        }

        i = end;
    }

    trace!(
        "Ranked {} values, tie correction term {}",
        values.len(),
        tie_term
    );
    Ranking { ranks, tie_term }
}

/// Complementary Kolmogorov distribution `Q(λ) = P(K > λ)`.
///
/// Evaluated with the alternating series
/// `2 Σ (-1)^(j-1) exp(-2 j² λ²)` (Numerical Recipes `probks`).
pub fn kolmogorov_q(lambda: f64) -> f64 {
    const MAX_ITER: usize = 100;
    const EPS1: f64 = 1e-6;
    const EPS2: f64 = 1e-16;

    if lambda <= 0.0 {
        return 1.0;
    }

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut term_bf = 0.0;

    for j in 1..=MAX_ITER {
        let term = fac * (a2 * (j * j) as f64).exp();
        sum += term;
        if term.abs() <= EPS1 * term_bf || term.abs() <= EPS2 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        term_bf = term.abs();
    }

    // Series fails to converge only for tiny λ, where Q is 1.
    debug!(
        "Kolmogorov series did not converge for lambda={}, returning 1",
        lambda
    );
    1.0
}
