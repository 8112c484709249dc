use statrs::function::factorial::ln_binomial;

use super::discrete::{
    point_probability,
    tail_probability,
    DiscreteSupport,
};
use crate::data_structs::{
    PValue,
    Tail,
};
use crate::error::{
    invalid_input,
    Result,
};

/// Binomial distribution: successes in `trials` independent draws with
/// success probability `p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binomial {
    trials: u64,
    p:      f64,
}

impl Binomial {
    pub fn new(
        trials: u64,
        p: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(invalid_input!(
                "binomial success probability {} outside [0, 1]",
                p
            ));
        }
        Ok(Self { trials, p })
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn mean(&self) -> f64 {
        self.trials as f64 * self.p
    }

    fn check(
        &self,
        k: u64,
    ) -> Result<()> {
        if k > self.trials {
            return Err(invalid_input!(
                "k={} exceeds the number of trials {}",
                k,
                self.trials
            ));
        }
        Ok(())
    }

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

impl DiscreteSupport for Binomial {
    fn support(&self) -> (u64, u64) {
        // Degenerate cases collapse the support to a single point.
        if self.p == 0.0 {
            (0, 0)
        }
        else if self.p == 1.0 {
            (self.trials, self.trials)
        }
        else {
            (0, self.trials)
        }
    }

    fn mode(&self) -> u64 {
        (((self.trials + 1) as f64 * self.p).floor() as u64).min(self.trials)
    }

    fn ln_pmf(
        &self,
        k: u64,
    ) -> f64 {
        let (lo, hi) = self.support();
        if k < lo || k > hi {
            return f64::NEG_INFINITY;
        }
        if lo == hi {
            return 0.0;
        }
        ln_binomial(self.trials, k)
            + k as f64 * self.p.ln()
            + (self.trials - k) as f64 * (-self.p).ln_1p()
    }

    fn ratio(
        &self,
        k: u64,
    ) -> f64 {
        (self.trials - k) as f64 / (k + 1) as f64 * self.p / (1.0 - self.p)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::{
        Rng,
        SeedableRng,
    };
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::error::EnrichError;

    #[test]
    fn reference_tails() {
        let dist = Binomial::new(1000, 0.01).unwrap();
        assert_approx_eq!(
            dist.lower_tail(12).unwrap().to_f64(),
            0.792511601909725,
            1e-12
        );
        let dist = Binomial::new(1000, 0.005).unwrap();
        assert_approx_eq!(
            dist.upper_tail(12).unwrap().to_f64(),
            0.005330011206256376,
            1e-13
        );
    }

    #[test]
    fn fair_coin_is_symmetric() {
        let dist = Binomial::new(10, 0.5).unwrap();
        assert_approx_eq!(dist.pmf(5).unwrap().to_f64(), 252.0 / 1024.0, 1e-15);
        assert_approx_eq!(dist.upper_tail(8).unwrap().to_f64(), 56.0 / 1024.0, 1e-15);
        assert_approx_eq!(dist.lower_tail(2).unwrap().to_f64(), 56.0 / 1024.0, 1e-15);
        assert_approx_eq!(dist.two_sided(2).unwrap().to_f64(), 112.0 / 1024.0, 1e-15);
    }

    #[test]
    fn tails_overlap_in_one_point() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..300 {
            let trials = rng.gen_range(0..500u64);
            let p = rng.gen_range(0.0..1.0);
            let k = rng.gen_range(0..=trials);
            let dist = Binomial::new(trials, p).unwrap();
            let lower = dist.lower_tail(k).unwrap().to_f64();
            let upper = dist.upper_tail(k).unwrap().to_f64();
            let pmf = dist.pmf(k).unwrap().to_f64();
            assert_approx_eq!(lower + upper - pmf, 1.0, 1e-9);
        }
    }

    #[test]
    fn degenerate_probabilities() {
        let never = Binomial::new(20, 0.0).unwrap();
        assert_eq!(never.pmf(0).unwrap().to_f64(), 1.0);
        assert_eq!(never.upper_tail(1).unwrap().to_f64(), 0.0);
        let always = Binomial::new(20, 1.0).unwrap();
        assert_eq!(always.pmf(20).unwrap().to_f64(), 1.0);
        assert_eq!(always.lower_tail(19).unwrap().to_f64(), 0.0);
    }

    #[test]
    fn extended_precision_tail() {
        let dist = Binomial::new(5_000, 0.01).unwrap();
        let upper = dist.upper_tail(1_000).unwrap();
        assert!(upper.is_extended());
        assert!(upper.log10() < -300.0);
        assert!(upper.log10().is_finite());
    }

    #[test]
    fn invalid_arguments() {
        assert!(matches!(
            Binomial::new(10, 1.5),
            Err(EnrichError::InvalidInput(_))
        ));
        assert!(matches!(
            Binomial::new(10, f64::NAN),
            Err(EnrichError::InvalidInput(_))
        ));
        let dist = Binomial::new(10, 0.3).unwrap();
        assert!(matches!(dist.lower_tail(11), Err(EnrichError::InvalidInput(_))));
    }
}
