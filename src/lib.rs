//! # enrichkit
//!
//! `enrichkit` is a Rust library for gene set enrichment statistics. Given
//! per-entity scores (or a list of interesting entities) and a collection
//! of categories such as pathways or GO terms, it tests every category for
//! a significant shift of its members' scores or an over-representation of
//! its members among the interesting entities.
//!
//! ## Key Features
//!
//! * **Shared Entity Database**: Identifiers are interned once into an
//!   [`EntityDatabase`] shared by all categories and score lists, so set
//!   operations work on integer indices.
//! * **Exact Tests with Extended Precision**: Hypergeometric, Fisher and
//!   binomial tail probabilities are summed in `f64` when possible and in
//!   log space when the result would underflow, so p-values far below
//!   `1e-308` keep their exponent ([`PValue`]).
//! * **Score-based Methods**: mean, median, sum, max-mean, unweighted and
//!   weighted Kolmogorov-Smirnov running sums, one- and two-sample t-tests
//!   and the Wilcoxon rank-sum test.
//! * **Permutation Tests**: any statistic can get an empirical p-value from
//!   seeded, reproducible re-sampling ([`PermutationTest`]).
//! * **Over-representation Analysis**: Fisher's exact test of a test set
//!   against a reference set ([`OverRepresentationAnalysis`]).
//! * **Parallel Processing**: categories are evaluated in parallel on a
//!   shared Rayon pool.
//!
//! Number of threads to be used can be configured with setting
//! `ENRICHKIT_NUM_THREADS` environment variable.
//!
//! ## Structure
//!
//! * [`data_structs`]: entity database, categories, scores, contingency
//!   tables, p-values, results and the enumerations describing a test.
//! * [`tools`]: hypothesis tests, the permutation framework, statistics and
//!   the [`EnrichmentAlgorithm`] facade.
//! * [`utils`]: the shared thread pool, permutation helpers, ranking and
//!   the Kolmogorov distribution.
//! * [`error`]: the [`EnrichError`] type returned by every fallible call.
//!
//! ## Usage
//!
//! ```no_run
//! use enrichkit::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let db = EntityDatabase::new();
//!     let scores = Scores::from_identifiers(&db, [
//!         ("TP53", 3.2),
//!         ("BRCA1", 2.9),
//!         ("EGFR", -0.4),
//!         ("MYC", 0.1),
//!         ("KRAS", -2.2),
//!     ]);
//!     let pathway = Category::from_identifiers("dna-repair", &db, ["TP53", "BRCA1"]);
//!
//!     let config = EnrichmentConfig::default()
//!         .with_tail(Tail::Upper)
//!         .with_mode(PValueMode::Permutation {
//!             permutations: 10_000,
//!             seed:         42,
//!         });
//!     let algorithm = config.try_finish(Method::Mean, &scores)?;
//!     let result = algorithm.compute_result(&pathway)?;
//!     println!("{}: p = {}", result.category(), result.p_value());
//!     Ok(())
//! }
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod data_structs;
pub mod error;
pub mod prelude;
pub mod tools;
pub mod utils;

pub use crate::data_structs::{
    Category,
    EnrichmentResult,
    EntityDatabase,
    PValue,
    Scores,
};
pub use crate::error::EnrichError;
pub use crate::tools::{
    EnrichmentAlgorithm,
    EnrichmentConfig,
    OverRepresentationAnalysis,
    PermutationTest,
};
