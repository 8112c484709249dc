use serde::{
    Deserialize,
    Serialize,
};

use super::algorithm::EnrichmentAlgorithm;
use crate::data_structs::{
    Category,
    Method,
    Order,
    PValueMode,
    Scores,
    Tail,
};
use crate::error::{
    invalid_input,
    EnrichError,
    Result,
};
use crate::{
    getter_fn,
    with_field_fn,
};

/// Settings shared by every category evaluated in one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub mode:              PValueMode,
    pub tail:              Tail,
    /// Ranking direction for running-sum statistics.
    pub order:             Order,
    /// Rank and test absolute scores.
    pub absolute:          bool,
    /// Categories with fewer usable members are rejected.
    pub min_category_size: usize,
    /// Categories with more usable members are rejected.
    pub max_category_size: usize,
}

impl EnrichmentConfig {
    with_field_fn!(mode, PValueMode);
    with_field_fn!(tail, Tail);
    with_field_fn!(order, Order);
    with_field_fn!(absolute, bool);
    with_field_fn!(min_category_size, usize);
    with_field_fn!(max_category_size, usize);

    getter_fn!(mode, PValueMode);
    getter_fn!(tail, Tail);
    getter_fn!(order, Order);

    pub fn new(
        mode: PValueMode,
        tail: Tail,
        order: Order,
        absolute: bool,
        min_category_size: usize,
        max_category_size: usize,
    ) -> Self {
        Self {
            mode,
            tail,
            order,
            absolute,
            min_category_size,
            max_category_size,
        }
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EnrichError::Input(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EnrichError::Input(format!("cannot serialize configuration: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if let PValueMode::Permutation { permutations, .. } = self.mode {
            if permutations == 0 {
                return Err(invalid_input!("permutation count must be positive"));
            }
        }
        if self.min_category_size > self.max_category_size {
            return Err(invalid_input!(
                "minimum category size {} exceeds the maximum {}",
                self.min_category_size,
                self.max_category_size
            ));
        }
        Ok(())
    }

    /// Whether `size` usable members fall within the configured limits.
    pub fn accepts_size(
        &self,
        size: usize,
    ) -> bool {
        (self.min_category_size..=self.max_category_size).contains(&size)
    }

    /// Prepares a score-based algorithm.
    pub fn try_finish(
        &self,
        method: Method,
        scores: &Scores,
    ) -> Result<EnrichmentAlgorithm> {
        EnrichmentAlgorithm::for_scores(method, self, scores)
    }

    /// Prepares an over-representation analysis.
    pub fn try_finish_ora(
        &self,
        reference: Category,
        test: Category,
    ) -> Result<EnrichmentAlgorithm> {
        EnrichmentAlgorithm::for_ora(self, reference, test)
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            mode:              PValueMode::Analytic,
            tail:              Tail::TwoSided,
            order:             Order::Decreasing,
            absolute:          false,
            min_category_size: 2,
            max_category_size: usize::MAX,
        }
    }
}
