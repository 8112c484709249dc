//! This module contains the core data structures used throughout the
//! `enrichkit` crate for representing entities, categories, scores and the
//! results of enrichment tests.
//!
//! Key components of this module include:
//!
//! - [`EntityDatabase`]: an append-only interning table shared (through
//!   [`SharedDatabase`]) by every structure of one analysis, so that set
//!   operations reduce to integer comparisons.
//! - [`Category`]: a named, read-only set of entity indices.
//! - [`Scores`]: an ordered collection of (entity, score) pairs with stable
//!   sorting and non-mutating transforms.
//! - [`ContingencyTable`]: the 2×2 overlap counts used by over-representation
//!   analysis and Fisher's exact test.
//! - [`PValue`]: a probability that keeps full exponent range when it
//!   underflows `f64`, together with the [`ProbReal`] numeric abstraction.
//! - [`EnrichmentResult`] and the enumerations ([`Tail`], [`Order`],
//!   [`Method`], [`PValueMode`], [`Variance`]) describing how it was obtained.

mod category;
mod contingency;
mod entity_db;
mod enums;
pub mod pvalue;
mod result;
mod scores;

#[cfg(test)]
mod tests;

pub use category::Category;
pub use contingency::ContingencyTable;
pub use entity_db::{
    EntityDatabase,
    SharedDatabase,
};
pub use enums::{
    Method,
    Order,
    PValueMode,
    Tail,
    Variance,
};
pub use pvalue::{
    LogReal,
    PValue,
    ProbReal,
};
pub use result::EnrichmentResult;
pub use scores::{
    Score,
    Scores,
};
