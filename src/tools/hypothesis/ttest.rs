use std::f64::consts::LN_2;

use log::warn;
use serde::{
    Deserialize,
    Serialize,
};
use statrs::distribution::{
    ContinuousCDF,
    StudentsT,
};
use statrs::function::gamma::ln_gamma;
use statrs::statistics::Statistics;

use super::TestOutcome;
use crate::data_structs::pvalue::LN_NATIVE_FLOOR;
use crate::data_structs::{
    PValue,
    Tail,
    Variance,
};
use crate::error::{
    invalid_input,
    Result,
};

/// Size, mean and unbiased variance of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub n:        usize,
    pub mean:     f64,
    pub variance: f64,
}

impl SampleSummary {
    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            n:        values.len(),
            mean:     values.iter().mean(),
            variance: values.iter().variance(),
        }
    }

    fn require(
        &self,
        min_size: usize,
        what: &str,
    ) -> Result<()> {
        if self.n < min_size {
            return Err(invalid_input!(
                "{} needs at least {} values, got {}",
                what,
                min_size,
                self.n
            ));
        }
        if !self.mean.is_finite() || !self.variance.is_finite() {
            return Err(invalid_input!("{} got non-finite values", what));
        }
        Ok(())
    }
}

/// Running sums from which a [`SampleSummary`] can be derived.
///
/// Used where the sample changes many times over a fixed pool of values:
/// the complement of a sample is obtained by subtraction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Moments {
    n:      usize,
    sum:    f64,
    sum_sq: f64,
}

impl Moments {
    pub(crate) fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>, {
        values.into_iter().fold(Self::default(), |mut acc, x| {
            acc.n += 1;
            acc.sum += x;
            acc.sum_sq += x * x;
            acc
        })
    }

    /// Moments of the values in `self` but not in `part`.
    pub(crate) fn without(
        &self,
        part: &Moments,
    ) -> Moments {
        Moments {
            n:      self.n - part.n,
            sum:    self.sum - part.sum,
            sum_sq: self.sum_sq - part.sum_sq,
        }
    }

    pub(crate) fn summary(&self) -> SampleSummary {
        let n = self.n as f64;
        let mean = self.sum / n;
        let variance = if self.n > 1 {
            ((self.sum_sq - self.sum * mean) / (n - 1.0)).max(0.0)
        }
        else {
            f64::NAN
        };
        SampleSummary {
            n: self.n,
            mean,
            variance,
        }
    }
}

/// `diff / se`, with a zero standard error mapped to 0 or ±inf.
fn studentize(
    diff: f64,
    se: f64,
) -> f64 {
    if se > 0.0 {
        diff / se
    }
    else if diff == 0.0 {
        0.0
    }
    else {
        diff.signum() * f64::INFINITY
    }
}

/// One-sample t statistic and degrees of freedom.
pub(crate) fn one_sample_statistic(
    sample: &SampleSummary,
    mu: f64,
) -> (f64, f64) {
    let n = sample.n as f64;
    let se = (sample.variance / n).sqrt();
    (studentize(sample.mean - mu, se), n - 1.0)
}

/// Two-sample t statistic and degrees of freedom.
pub(crate) fn two_sample_statistic(
    x: &SampleSummary,
    y: &SampleSummary,
    variance: Variance,
) -> (f64, f64) {
    let (nx, ny) = (x.n as f64, y.n as f64);
    let diff = x.mean - y.mean;
    match variance {
        Variance::Pooled => {
            let df = nx + ny - 2.0;
            let pooled = ((nx - 1.0) * x.variance + (ny - 1.0) * y.variance) / df;
            let se = (pooled * (1.0 / nx + 1.0 / ny)).sqrt();
            (studentize(diff, se), df)
        },
        Variance::Welch => {
            let vx = x.variance / nx;
            let vy = y.variance / ny;
            let se = (vx + vy).sqrt();
            let denominator = vx * vx / (nx - 1.0) + vy * vy / (ny - 1.0);
            // Welch-Satterthwaite; both variances zero leaves the pooled df.
            let df = if denominator > 0.0 {
                (vx + vy).powi(2) / denominator
            }
            else {
                nx + ny - 2.0
            };
            (studentize(diff, se), df)
        },
    }
}

/// Tail probability of `t` under Student's t with `df` degrees of freedom.
pub(crate) fn t_p_value(
    t: f64,
    df: f64,
    tail: Tail,
) -> Result<PValue> {
    if t.is_nan() {
        return Err(invalid_input!("t statistic is NaN"));
    }
    if t.is_infinite() {
        let upper_extreme = t > 0.0;
        return Ok(match tail {
            Tail::Upper if upper_extreme => PValue::zero(),
            Tail::Lower if !upper_extreme => PValue::zero(),
            Tail::TwoSided => PValue::zero(),
            _ => PValue::one(),
        });
    }
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| invalid_input!("t distribution with df={}: {}", df, e))?;
    let upper = |t: f64| {
        let p = dist.sf(t);
        if t > 0.0 && p.ln() < LN_NATIVE_FLOOR {
            PValue::from_ln(ln_t_sf(t, df))
        }
        else {
            PValue::new(p)
        }
    };
    Ok(match tail {
        Tail::Lower => upper(-t),
        Tail::Upper => upper(t),
        Tail::TwoSided => PValue::from_ln(LN_2 + upper(t.abs()).ln()),
    })
}

/// `ln P(T > t)` for `t > 0`, used where `sf` underflows.
///
/// `P(T > t) = I_x(df/2, 1/2) / 2` with `x = df / (df + t²)`; the
/// regularized incomplete beta is its prefactor times Lentz's continued
/// fraction, all kept in log space.
fn ln_t_sf(
    t: f64,
    df: f64,
) -> f64 {
    let (a, b) = (0.5 * df, 0.5);
    // ln(1 + df/t²), written to survive t² overflowing.
    let ln_ratio = (df / t / t).ln_1p();
    let ln_x = df.ln() - 2.0 * t.ln() - ln_ratio;
    let ln_one_minus_x = -ln_ratio;
    let ln_beta = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);

    -LN_2 + a * ln_x + b * ln_one_minus_x - ln_beta - a.ln()
        + beta_continued_fraction(a, b, ln_x.exp()).ln()
}

/// Continued fraction of the incomplete beta function (modified Lentz).
/// Converges quickly for `x < (a + 1) / (a + b + 2)`.
fn beta_continued_fraction(
    a: f64,
    b: f64,
    x: f64,
) -> f64 {
    const MAX_ITER: usize = 500;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - (a + b) * x / (a + 1.0));
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = m as f64;
        let even = m * (b - m) * x / ((a + 2.0 * m - 1.0) * (a + 2.0 * m));
        d = 1.0 / guard(1.0 + even * d);
        c = guard(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (a + b + m) * x / ((a + 2.0 * m) * (a + 2.0 * m + 1.0));
        d = 1.0 / guard(1.0 + odd * d);
        c = guard(1.0 + odd / c);
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            return h;
        }
    }
    warn!(
        "Incomplete beta continued fraction did not converge (a={}, b={}, x={})",
        a, b, x
    );
    h
}

/// One-sample t-test of `sample` against the hypothesised mean `mu`.
pub fn one_sample_t(
    sample: &[f64],
    mu: f64,
    tail: Tail,
) -> Result<TestOutcome> {
    let summary = SampleSummary::from_slice(sample);
    summary.require(2, "one-sample t-test")?;
    let (statistic, df) = one_sample_statistic(&summary, mu);
    Ok(TestOutcome {
        statistic,
        p_value: t_p_value(statistic, df, tail)?,
        df: Some(df),
    })
}

/// Two-sample t-test of `x` against `y`. A positive statistic means the
/// mean of `x` is larger.
pub fn two_sample_t(
    x: &[f64],
    y: &[f64],
    variance: Variance,
    tail: Tail,
) -> Result<TestOutcome> {
    let x = SampleSummary::from_slice(x);
    let y = SampleSummary::from_slice(y);
    x.require(2, "two-sample t-test (first group)")?;
    y.require(2, "two-sample t-test (second group)")?;
    let (statistic, df) = two_sample_statistic(&x, &y, variance);
    Ok(TestOutcome {
        statistic,
        p_value: t_p_value(statistic, df, tail)?,
        df: Some(df),
    })
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rstest::rstest;

    use super::*;
    use crate::error::EnrichError;

    const X: [f64; 6] = [5.1, 4.9, 5.6, 5.8, 6.0, 5.5];
    const Y: [f64; 5] = [4.2, 4.8, 4.4, 5.0, 4.6];

    #[test]
    fn one_sample_statistic_value() {
        let outcome = one_sample_t(&X, 5.0, Tail::TwoSided).unwrap();
        let mean = X.iter().sum::<f64>() / 6.0;
        let sd = (X.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 5.0).sqrt();
        assert_approx_eq!(outcome.statistic, (mean - 5.0) / (sd / 6f64.sqrt()), 1e-12);
        assert_eq!(outcome.df, Some(5.0));

        let upper = one_sample_t(&X, 5.0, Tail::Upper).unwrap();
        let lower = one_sample_t(&X, 5.0, Tail::Lower).unwrap();
        assert_approx_eq!(
            upper.p_value.to_f64() + lower.p_value.to_f64(),
            1.0,
            1e-10
        );
        assert_approx_eq!(
            outcome.p_value.to_f64(),
            2.0 * upper.p_value.to_f64(),
            1e-12
        );
        assert!(upper.p_value.to_f64() < 0.05);
    }

    #[rstest]
    #[case(Variance::Pooled, 9.0)]
    #[case(Variance::Welch, 8.95)]
    fn two_sample_degrees_of_freedom(
        #[case] variance: Variance,
        #[case] approx_df: f64,
    ) {
        let outcome = two_sample_t(&X, &Y, variance, Tail::TwoSided).unwrap();
        assert!(outcome.statistic > 0.0);
        assert_approx_eq!(outcome.df.unwrap(), approx_df, 0.5);
        assert!(outcome.p_value.to_f64() < 0.01);

        let reversed = two_sample_t(&Y, &X, variance, Tail::TwoSided).unwrap();
        assert_approx_eq!(reversed.statistic, -outcome.statistic, 1e-12);
        assert_approx_eq!(
            reversed.p_value.to_f64(),
            outcome.p_value.to_f64(),
            1e-12
        );
    }

    #[test]
    fn moments_match_slices() {
        let all = Moments::from_values(X.iter().chain(Y.iter()).copied());
        let x = Moments::from_values(X.iter().copied());
        let y = all.without(&x).summary();
        let direct = SampleSummary::from_slice(&Y);
        assert_eq!(y.n, 5);
        assert_approx_eq!(y.mean, direct.mean, 1e-12);
        assert_approx_eq!(y.variance, direct.variance, 1e-10);
    }

    #[test]
    fn constant_samples() {
        let outcome = one_sample_t(&[2.0, 2.0, 2.0], 2.0, Tail::TwoSided).unwrap();
        assert_eq!(outcome.statistic, 0.0);
        assert_approx_eq!(outcome.p_value.to_f64(), 1.0, 1e-12);

        let outcome = one_sample_t(&[3.0, 3.0, 3.0], 2.0, Tail::Upper).unwrap();
        assert_eq!(outcome.statistic, f64::INFINITY);
        assert_eq!(outcome.p_value.to_f64(), 0.0);
    }

    #[rstest]
    #[case(5.0, 50.0)]
    #[case(30.0, 12.0)]
    #[case(3.0, 400.0)]
    fn log_tail_matches_statrs(
        #[case] df: f64,
        #[case] t: f64,
    ) {
        let dist = StudentsT::new(0.0, 1.0, df).unwrap();
        assert_approx_eq!(ln_t_sf(t, df), dist.sf(t).ln(), 1e-8);
    }

    #[test]
    fn huge_t_keeps_its_exponent() {
        // P(T > t) ~ Γ((ν+1)/2) / (√(νπ) Γ(ν/2)) · ν^((ν-1)/2) · t^-ν
        let (df, t) = (10.0f64, 1e40f64);
        let expected = ln_gamma(5.5) - 0.5 * (df * std::f64::consts::PI).ln() - ln_gamma(5.0)
            + 4.5 * df.ln()
            - df * t.ln();

        let upper = t_p_value(t, df, Tail::Upper).unwrap();
        assert!(upper.is_extended());
        assert_approx_eq!(upper.ln(), expected, 1e-6);

        let two_sided = t_p_value(-t, df, Tail::TwoSided).unwrap();
        assert_approx_eq!(two_sided.ln(), expected + LN_2, 1e-6);
        let lower = t_p_value(-t, df, Tail::Lower).unwrap();
        assert_approx_eq!(lower.ln(), expected, 1e-6);
        assert_approx_eq!(t_p_value(-t, df, Tail::Upper).unwrap().to_f64(), 1.0);
    }

    #[test]
    fn too_small_samples() {
        assert!(matches!(
            one_sample_t(&[1.0], 0.0, Tail::TwoSided),
            Err(EnrichError::InvalidInput(_))
        ));
        assert!(matches!(
            two_sample_t(&[1.0, 2.0], &[3.0], Variance::Welch, Tail::TwoSided),
            Err(EnrichError::InvalidInput(_))
        ));
    }
}
