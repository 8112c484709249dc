//! Over-representation analysis.
//!
//! Given a reference set and a test set drawn from it, asks whether a
//! category contains more (or fewer) test entities than expected by chance.
//! The exact p-value is Fisher's exact test on the category's contingency
//! table.

use log::debug;

use super::hypothesis::fisher_exact;
use crate::data_structs::{
    Category,
    ContingencyTable,
    EntityDatabase,
    PValue,
    Tail,
};
use crate::error::{
    invalid_input,
    Result,
};

#[derive(Debug, Clone)]
pub struct OverRepresentationAnalysis {
    reference: Category,
    test:      Category,
    tail:      Tail,
}

impl OverRepresentationAnalysis {
    /// Fails when the sets use different databases, the reference is empty
    /// or the test set is not contained in the reference.
    pub fn new(
        reference: Category,
        test: Category,
        tail: Tail,
    ) -> Result<Self> {
        EntityDatabase::ensure_same(reference.database(), test.database(), "test set")?;
        if reference.is_empty() {
            return Err(invalid_input!("reference set '{}' is empty", reference.name()));
        }
        if !test.is_subset_of(&reference)? {
            return Err(invalid_input!(
                "test set '{}' is not a subset of reference '{}'",
                test.name(),
                reference.name()
            ));
        }
        debug!(
            "Prepared over-representation analysis: {} test entities in a reference of {}",
            test.len(),
            reference.len()
        );
        Ok(Self {
            reference,
            test,
            tail,
        })
    }

    pub fn reference(&self) -> &Category {
        &self.reference
    }

    pub fn test(&self) -> &Category {
        &self.test
    }

    pub fn tail(&self) -> Tail {
        self.tail
    }

    fn check_category(
        &self,
        category: &Category,
    ) -> Result<()> {
        if !category.is_subset_of(&self.reference)? {
            return Err(invalid_input!(
                "category '{}' is not a subset of reference '{}'",
                category.name(),
                self.reference.name()
            ));
        }
        Ok(())
    }

    /// Members of `category` that are in the test set.
    pub fn number_of_hits(
        &self,
        category: &Category,
    ) -> Result<usize> {
        self.check_category(category)?;
        category.intersection_size(&self.test)
    }

    /// `|category| · |test| / |reference|`.
    pub fn expected_number_of_hits(
        &self,
        category: &Category,
    ) -> Result<f64> {
        self.check_category(category)?;
        Ok(category.len() as f64 * self.test.len() as f64 / self.reference.len() as f64)
    }

    pub fn contingency_table(
        &self,
        category: &Category,
    ) -> Result<ContingencyTable> {
        ContingencyTable::from_categories(&self.reference, &self.test, category)
    }

    /// Fisher's exact test on the category's contingency table.
    pub fn compute_p_value(
        &self,
        category: &Category,
    ) -> Result<PValue> {
        fisher_exact(&self.contingency_table(category)?, self.tail)
    }

    /// Observed over expected hits. Infinite when nothing is expected.
    pub fn enrichment_ratio(
        &self,
        category: &Category,
    ) -> Result<f64> {
        let hits = self.number_of_hits(category)? as f64;
        let expected = self.expected_number_of_hits(category)?;
        Ok(if expected > 0.0 {
            hits / expected
        }
        else if hits == 0.0 {
            f64::NAN
        }
        else {
            f64::INFINITY
        })
    }
}
