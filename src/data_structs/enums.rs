use std::fmt::Display;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::EnrichError;

/// Direction of the alternative hypothesis.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord, Default)]
pub enum Tail {
    /// Category scores/overlap smaller than expected (depletion).
    Lower,
    /// Category scores/overlap larger than expected (enrichment).
    Upper,
    /// Equally or more extreme in either direction.
    #[default]
    TwoSided,
}

impl Display for Tail {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Tail::Lower => write!(f, "lower-tailed"),
            Tail::Upper => write!(f, "upper-tailed"),
            Tail::TwoSided => write!(f, "two-sided"),
        }
    }
}

impl FromStr for Tail {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lower" | "lower-tailed" | "less" => Ok(Tail::Lower),
            "upper" | "upper-tailed" | "greater" => Ok(Tail::Upper),
            "two-sided" | "two_sided" | "both" => Ok(Tail::TwoSided),
            other => Err(EnrichError::Input(format!("unknown tail '{other}'"))),
        }
    }
}

/// Direction in which scores are ranked before a running-sum walk.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord, Default)]
pub enum Order {
    Increasing,
    #[default]
    Decreasing,
}

impl Display for Order {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Order::Increasing => write!(f, "increasing"),
            Order::Decreasing => write!(f, "decreasing"),
        }
    }
}

impl FromStr for Order {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "increasing" | "ascending" | "asc" => Ok(Order::Increasing),
            "decreasing" | "descending" | "desc" => Ok(Order::Decreasing),
            other => Err(EnrichError::Input(format!("unknown order '{other}'"))),
        }
    }
}

/// Variance model of the two-sample t-test.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, Default)]
pub enum Variance {
    /// Student's t-test with pooled variance.
    Pooled,
    /// Welch's t-test with Welch-Satterthwaite degrees of freedom.
    #[default]
    Welch,
}

impl Display for Variance {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Variance::Pooled => write!(f, "pooled"),
            Variance::Welch => write!(f, "welch"),
        }
    }
}

impl FromStr for Variance {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pooled" | "student" => Ok(Variance::Pooled),
            "welch" => Ok(Variance::Welch),
            other => {
                Err(EnrichError::Input(format!("unknown variance model '{other}'")))
            },
        }
    }
}

macro_rules! serde_via_display {
    ($($enum_type: ty),*) => {
        $(
        impl Serialize for $enum_type {
            fn serialize<S>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer, {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $enum_type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>, {
                let s = String::deserialize(deserializer)?;
                FromStr::from_str(&s).map_err(serde::de::Error::custom)
            }
        }
        )*
    };
}

serde_via_display!(Tail, Order, Variance);

/// How the p-value of a statistic is obtained.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum PValueMode {
    /// Closed-form test.
    #[default]
    Analytic,
    /// Empirical p-value from `permutations` seeded shuffles.
    Permutation { permutations: usize, seed: u64 },
}

impl PValueMode {
    pub fn name(&self) -> &'static str {
        match self {
            PValueMode::Analytic => "analytic",
            PValueMode::Permutation { .. } => "permutation",
        }
    }
}

impl Display for PValueMode {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            PValueMode::Analytic => write!(f, "analytic"),
            PValueMode::Permutation { permutations, seed } => {
                write!(f, "permutation(n={permutations}, seed={seed})")
            },
        }
    }
}

/// Statistic or test evaluated for each category.
#[derive(PartialEq, Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "method")]
pub enum Method {
    Mean,
    Median,
    Sum,
    MaxMean,
    /// Unweighted running sum over the ranked list.
    KolmogorovSmirnov,
    /// GSEA running sum with hits weighted by `|score|^exponent`.
    WeightedKs { exponent: f64 },
    /// Category scores against the mean of all scores.
    OneSampleTTest,
    /// Category scores against the remaining scores.
    TwoSampleTTest { variance: Variance },
    /// Wilcoxon rank-sum of category scores against the remaining scores.
    RankSum,
    /// Over-representation analysis of a test set.
    Ora,
}

impl Method {
    /// Whether a closed-form p-value exists for this statistic.
    pub fn has_analytic_p_value(&self) -> bool {
        !matches!(
            self,
            Method::Mean
                | Method::Median
                | Method::Sum
                | Method::MaxMean
                | Method::WeightedKs { .. }
        )
    }

    /// Whether the statistic walks the ranked list rather than the raw
    /// member scores.
    pub fn is_running_sum(&self) -> bool {
        matches!(self, Method::KolmogorovSmirnov | Method::WeightedKs { .. })
    }
}

impl Display for Method {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Method::Mean => write!(f, "mean"),
            Method::Median => write!(f, "median"),
            Method::Sum => write!(f, "sum"),
            Method::MaxMean => write!(f, "max-mean"),
            Method::KolmogorovSmirnov => write!(f, "kolmogorov-smirnov"),
            Method::WeightedKs { exponent } => {
                write!(f, "weighted-kolmogorov-smirnov(p={exponent})")
            },
            Method::OneSampleTTest => write!(f, "one-sample-t-test"),
            Method::TwoSampleTTest { variance } => {
                write!(f, "two-sample-t-test({variance})")
            },
            Method::RankSum => write!(f, "wilcoxon-rank-sum"),
            Method::Ora => write!(f, "ora"),
        }
    }
}
