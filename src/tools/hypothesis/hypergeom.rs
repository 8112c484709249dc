use statrs::function::factorial::ln_binomial;

use super::discrete::{
    point_probability,
    tail_probability,
    DiscreteSupport,
};
use crate::data_structs::{
    ContingencyTable,
    PValue,
    Tail,
};
use crate::error::{
    invalid_input,
    Result,
};

/// Hypergeometric distribution: number of successes among `draws` items
/// drawn without replacement from `population` items of which `successes`
/// are successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hypergeometric {
    population: u64,
    successes:  u64,
    draws:      u64,
}

impl Hypergeometric {
    pub fn new(
        population: u64,
        successes: u64,
        draws: u64,
    ) -> Result<Self> {
        if population == 0 {
            return Err(invalid_input!("hypergeometric population is empty"));
        }
        if successes > population || draws > population {
            return Err(invalid_input!(
                "hypergeometric parameters out of range: N={}, m={}, n={}",
                population,
                successes,
                draws
            ));
        }
        Ok(Self {
            population,
            successes,
            draws,
        })
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Expected number of successes, `m · n / N`.
    pub fn mean(&self) -> f64 {
        self.successes as f64 * self.draws as f64 / self.population as f64
    }

    fn check(
        &self,
        k: u64,
    ) -> Result<()> {
        if k > self.successes.min(self.draws) {
            return Err(invalid_input!(
                "k={} exceeds min(m={}, n={})",
                k,
                self.successes,
                self.draws
            ));
        }
        Ok(())
    }

    /// `P(X = k)`.
    pub fn pmf(
        &self,
        k: u64,
    ) -> Result<PValue> {
        self.check(k)?;
        Ok(point_probability(self, k))
    }

    /// `P(X <= k)`.
    pub fn lower_tail(
        &self,
        k: u64,
    ) -> Result<PValue> {
        self.p_value(k, Tail::Lower)
    }

    /// `P(X >= k)`.
    pub fn upper_tail(
        &self,
        k: u64,
    ) -> Result<PValue> {
        self.p_value(k, Tail::Upper)
    }

    /// Sum of the point probabilities no greater than `P(X = k)`.
    pub fn two_sided(
        &self,
        k: u64,
    ) -> Result<PValue> {
        self.p_value(k, Tail::TwoSided)
    }

    pub fn p_value(
        &self,
        k: u64,
        tail: Tail,
    ) -> Result<PValue> {
        self.check(k)?;
        Ok(tail_probability(self, k, tail))
    }
}

impl DiscreteSupport for Hypergeometric {
    fn support(&self) -> (u64, u64) {
        let lo = (self.successes + self.draws).saturating_sub(self.population);
        let hi = self.successes.min(self.draws);
        (lo, hi)
    }

    fn mode(&self) -> u64 {
        let numerator = (self.draws as u128 + 1) * (self.successes as u128 + 1);
        (numerator / (self.population as u128 + 2)) as u64
    }

    fn ln_pmf(
        &self,
        k: u64,
    ) -> f64 {
        let (lo, hi) = self.support();
        if k < lo || k > hi {
            return f64::NEG_INFINITY;
        }
        ln_binomial(self.successes, k)
            + ln_binomial(self.population - self.successes, self.draws - k)
            - ln_binomial(self.population, self.draws)
    }

    fn ratio(
        &self,
        k: u64,
    ) -> f64 {
        let numerator = (self.successes - k) as f64 * (self.draws - k) as f64;
        let denominator = (k + 1) as f64
            * ((self.population + k + 1) - (self.successes + self.draws)) as f64;
        numerator / denominator
    }
}

/// Fisher's exact test on a 2×2 table.
///
/// The table maps onto the hypergeometric distribution with
/// `N = a + b + c + d`, `m = a + b`, `n = a + c` and `k = a`.
pub fn fisher_exact(
    table: &ContingencyTable,
    tail: Tail,
) -> Result<PValue> {
    let total = table.total();
    if total == 0 {
        return Err(invalid_input!("contingency table is empty"));
    }
    Hypergeometric::new(total, table.category_size(), table.test_size())?
        .p_value(table.hits(), tail)
}
