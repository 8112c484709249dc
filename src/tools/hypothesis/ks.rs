use std::f64::consts::LN_2;

use crate::data_structs::pvalue::LN_NATIVE_FLOOR;
use crate::data_structs::{
    PValue,
    Tail,
};
use crate::error::{
    invalid_input,
    Result,
};
use crate::utils::kolmogorov_q;

/// Asymptotic Kolmogorov-Smirnov p-value for a set of `hits` entities in a
/// ranked list of `total`.
///
/// `d_plus` and `d_minus` are the largest positive and negative deviations
/// of the running sum (both non-negative). With the effective size
/// `ne = k (N - k) / N`, the two-sided p-value is `Q((√ne + 0.12 + 0.11/√ne) D)`
/// for `D = max(d_plus, d_minus)`. One-sided p-values use the Smirnov limit
/// `exp(-2 ne d²)` on `d_plus` (upper) or `d_minus` (lower).
pub fn kolmogorov_smirnov_p(
    d_plus: f64,
    d_minus: f64,
    hits: usize,
    total: usize,
    tail: Tail,
) -> Result<PValue> {
    if hits == 0 || hits >= total {
        return Err(invalid_input!(
            "Kolmogorov-Smirnov test needs 0 < k < N, got k={} and N={}",
            hits,
            total
        ));
    }
    if !(d_plus >= 0.0 && d_minus >= 0.0) {
        return Err(invalid_input!(
            "running-sum deviations must be non-negative, got {} and {}",
            d_plus,
            d_minus
        ));
    }

    let (k, n) = (hits as f64, total as f64);
    let ne = k * (n - k) / n;
    let p_value = match tail {
        Tail::TwoSided => {
            let sqrt_ne = ne.sqrt();
            let lambda = (sqrt_ne + 0.12 + 0.11 / sqrt_ne) * d_plus.max(d_minus);
            // Far in the tail the series is its leading term 2·exp(-2λ²).
            let ln_leading = LN_2 - 2.0 * lambda * lambda;
            if ln_leading < LN_NATIVE_FLOOR {
                PValue::from_ln(ln_leading)
            }
            else {
                PValue::new(kolmogorov_q(lambda))
            }
        },
        Tail::Upper => PValue::from_ln(-2.0 * ne * d_plus * d_plus),
        Tail::Lower => PValue::from_ln(-2.0 * ne * d_minus * d_minus),
    };
    Ok(p_value)
}
