use serde::{
    Deserialize,
    Serialize,
};

use super::category::Category;
use crate::error::{
    invalid_input,
    Result,
};

/// 2×2 table of a category against a test set within a reference.
///
/// ```text
///                 in test    not in test
/// in category        a            b
/// not in category    c            d
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    /// category ∩ test
    pub a: u64,
    /// category ∖ test
    pub b: u64,
    /// test ∖ category
    pub c: u64,
    /// neither
    pub d: u64,
}

impl ContingencyTable {
    pub fn new(
        a: u64,
        b: u64,
        c: u64,
        d: u64,
    ) -> Self {
        Self { a, b, c, d }
    }

    /// Derives the table from three categories over one database.
    ///
    /// Fails when the reference is empty or when `test` or `category` is not
    /// a subset of `reference`.
    pub fn from_categories(
        reference: &Category,
        test: &Category,
        category: &Category,
    ) -> Result<Self> {
        if reference.is_empty() {
            return Err(invalid_input!("reference set is empty"));
        }
        if !test.is_subset_of(reference)? {
            return Err(invalid_input!(
                "test set '{}' is not a subset of reference '{}'",
                test.name(),
                reference.name()
            ));
        }
        if !category.is_subset_of(reference)? {
            return Err(invalid_input!(
                "category '{}' is not a subset of reference '{}'",
                category.name(),
                reference.name()
            ));
        }

        let hits = category.intersection_size(test)? as u64;
        let category_size = category.len() as u64;
        let test_size = test.len() as u64;
        let total = reference.len() as u64;

        Ok(Self {
            a: hits,
            b: category_size - hits,
            c: test_size - hits,
            d: total + hits - category_size - test_size,
        })
    }

    /// Reference size `N`.
    pub fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    /// Category size `m`.
    pub fn category_size(&self) -> u64 {
        self.a + self.b
    }

    /// Test set size `n`.
    pub fn test_size(&self) -> u64 {
        self.a + self.c
    }

    /// Observed overlap `k`.
    pub fn hits(&self) -> u64 {
        self.a
    }

    /// Overlap expected under independence, `m · n / N`.
    pub fn expected_hits(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.category_size() as f64 * self.test_size() as f64 / total as f64
    }
}
