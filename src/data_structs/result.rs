use serde::{
    Deserialize,
    Serialize,
};

use super::enums::{
    Method,
    PValueMode,
    Tail,
};
use super::pvalue::PValue;
use crate::getter_fn;

/// Outcome of evaluating one category with one algorithm.
///
/// Immutable once produced: fields are only exposed through getters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    category:      String,
    reference:     Option<String>,
    method:        Method,
    mode:          PValueMode,
    tail:          Tail,
    statistic:     f64,
    p_value:       PValue,
    hits:          usize,
    expected_hits: Option<f64>,
}

impl EnrichmentResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        category: String,
        reference: Option<String>,
        method: Method,
        mode: PValueMode,
        tail: Tail,
        statistic: f64,
        p_value: PValue,
        hits: usize,
        expected_hits: Option<f64>,
    ) -> Self {
        Self {
            category,
            reference,
            method,
            mode,
            tail,
            statistic,
            p_value,
            hits,
            expected_hits,
        }
    }

    getter_fn!(category, String);
    getter_fn!(method, Method);
    getter_fn!(mode, PValueMode);
    getter_fn!(tail, Tail);
    getter_fn!(p_value, PValue);

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn statistic(&self) -> f64 {
        self.statistic
    }

    /// Category members found in the scores, or the overlap with the test
    /// set for over-representation analysis.
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn expected_hits(&self) -> Option<f64> {
        self.expected_hits
    }

    /// Number of permutations behind an empirical p-value.
    pub fn permutations(&self) -> Option<usize> {
        match self.mode {
            PValueMode::Permutation { permutations, .. } => Some(permutations),
            PValueMode::Analytic => None,
        }
    }

    /// Smallest p-value the permutation count can resolve. A reported
    /// p-value of 0 means "below this floor", not a true zero.
    pub fn p_value_floor(&self) -> Option<f64> {
        self.permutations().map(|n| 1.0 / n as f64)
    }
}
