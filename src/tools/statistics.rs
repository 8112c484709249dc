//! Location statistics of a score set.

use serde::{
    Deserialize,
    Serialize,
};
use statrs::statistics::{
    Data,
    Median,
    Statistics,
};

/// Statistic summarising the scores of a category's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetStatistic {
    Mean,
    Median,
    Sum,
    /// Larger of the mean positive part and the mean negative part, signed.
    MaxMean,
}

impl SetStatistic {
    /// Evaluates the statistic. Empty input yields NaN for `Mean`, `Median`
    /// and `MaxMean` and zero for `Sum`.
    pub fn compute(
        &self,
        values: &[f64],
    ) -> f64 {
        match self {
            SetStatistic::Mean => values.iter().mean(),
            SetStatistic::Median => median(values),
            SetStatistic::Sum => values.iter().sum(),
            SetStatistic::MaxMean => max_mean(values),
        }
    }
}

/// Median, averaging the two central values for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    Data::new(values.to_vec()).median()
}

/// Max-mean statistic: with `s+ = Σ max(x, 0) / k` and
/// `s- = Σ max(-x, 0) / k`, returns `s+` when `s+ >= s-` and `-s-`
/// otherwise.
pub fn max_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let k = values.len() as f64;
    let (positive, negative) = values.iter().fold((0.0, 0.0), |(pos, neg), &x| {
        if x > 0.0 {
            (pos + x, neg)
        }
        else {
            (pos, neg - x)
        }
    });
    let (positive, negative) = (positive / k, negative / k);
    if positive >= negative {
        positive
    }
    else {
        -negative
    }
}
