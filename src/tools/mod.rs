//! This module provides the statistical tests and enrichment algorithms of
//! the enrichkit crate.
//!
//! Key submodules:
//!
//! - [`hypothesis`]: exact tests (hypergeometric, Fisher, binomial) with an
//!   extended-precision fallback, t-tests, the Wilcoxon rank-sum test and
//!   the asymptotic Kolmogorov-Smirnov p-value.
//! - [`permutation`]: seeded, reproducible permutation tests for arbitrary
//!   statistics.
//! - [`running_sum`] and [`statistics`]: the category statistics evaluated
//!   on a ranked score list.
//! - [`ora`]: over-representation analysis of a test set.
//! - [`algorithm`] and [`config`]: the facade that prepares a method once
//!   and evaluates it for many categories, in parallel if requested.
pub mod algorithm;
pub mod config;
pub mod hypothesis;
pub mod ora;
pub mod permutation;
pub mod running_sum;
pub mod statistics;

pub use algorithm::EnrichmentAlgorithm;
pub use config::EnrichmentConfig;
pub use ora::OverRepresentationAnalysis;
pub use permutation::{
    PermutationOutcome,
    PermutationTest,
};
pub use running_sum::RunningSum;
pub use statistics::SetStatistic;
