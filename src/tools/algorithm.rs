//! Per-category evaluation of an enrichment method.
//!
//! An [`EnrichmentAlgorithm`] is prepared once per analysis (scores ranked,
//! totals and ranks precomputed) and then evaluates any number of
//! categories, one at a time with [`EnrichmentAlgorithm::compute_result`]
//! or in parallel with [`EnrichmentAlgorithm::compute_all`].
//!
//! Score-based statistics are functions of the positions of a category's
//! members in the ranked list. Permutation mode reuses the same function on
//! random position samples of the same size, so the null distribution is
//! built from exactly the statistic that was observed.

use hashbrown::HashMap;
use log::{
    debug,
    info,
};
use rayon::prelude::*;
use statrs::statistics::Statistics;

use super::config::EnrichmentConfig;
use super::hypothesis::{
    fisher_exact,
    kolmogorov_smirnov_p,
    one_sample_statistic,
    rank_sum_from_ranks,
    t_p_value,
    two_sample_statistic,
    two_sided_ln_cutoff,
    DiscreteSupport,
    Hypergeometric,
    Moments,
};
use super::ora::OverRepresentationAnalysis;
use super::permutation::PermutationTest;
use super::running_sum::RunningSum;
use super::statistics::SetStatistic;
use crate::data_structs::{
    Category,
    EnrichmentResult,
    Method,
    PValue,
    PValueMode,
    Scores,
    SharedDatabase,
    Tail,
};
use crate::error::{
    invalid_input,
    EnrichError,
    Result,
};
use crate::utils::{
    average_ranks,
    Ranking,
    THREAD_POOL,
};

/// A prepared enrichment method.
#[derive(Debug, Clone)]
pub struct EnrichmentAlgorithm {
    method: Method,
    config: EnrichmentConfig,
    engine: Engine,
}

#[derive(Debug, Clone)]
enum Engine {
    Scores(RankedScores),
    Ora(OverRepresentationAnalysis),
}

/// Scores in ranking order with everything the statistics need.
#[derive(Debug, Clone)]
struct RankedScores {
    db:        SharedDatabase,
    /// Scores sorted by the configured order, after `absolute`.
    values:    Vec<f64>,
    /// Entity index -> position in `values`.
    positions: HashMap<usize, usize>,
    /// Average ranks of `values`; only built for the rank-sum test.
    ranking:   Option<Ranking>,
    totals:    Moments,
    mean:      f64,
}

impl RankedScores {
    fn new(
        method: Method,
        config: &EnrichmentConfig,
        scores: &Scores,
    ) -> Self {
        let scores = if config.absolute {
            scores.abs()
        }
        else {
            scores.clone()
        };
        let ranked = scores.sorted(config.order);
        let values = ranked.values();
        let ranking = matches!(method, Method::RankSum).then(|| average_ranks(&values));

        Self {
            db: ranked.database().clone(),
            positions: ranked.position_map(),
            ranking,
            totals: Moments::from_values(values.iter().copied()),
            mean: values.iter().mean(),
            values,
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    /// Positions of the category's members, ascending.
    fn member_positions(
        &self,
        category: &Category,
    ) -> Vec<usize> {
        let mut positions: Vec<usize> = category
            .iter()
            .filter_map(|index| self.positions.get(&index).copied())
            .collect();
        positions.sort_unstable();
        positions
    }

    fn sample_values(
        &self,
        sample: &[usize],
    ) -> Vec<f64> {
        sample.iter().map(|&p| self.values[p]).collect()
    }

    fn sample_moments(
        &self,
        sample: &[usize],
    ) -> Moments {
        Moments::from_values(sample.iter().map(|&p| self.values[p]))
    }

    fn rank_sum(
        &self,
        sample: &[usize],
    ) -> f64 {
        self.ranking
            .as_ref()
            .map_or(f64::NAN, |ranking| sample.iter().map(|&p| ranking.ranks[p]).sum())
    }

    fn running_sum(
        &self,
        method: Method,
        sample: &[usize],
    ) -> RunningSum {
        let mut sorted = sample.to_vec();
        sorted.sort_unstable();
        let weights = match method {
            Method::WeightedKs { exponent } => Some((self.values.as_slice(), exponent)),
            _ => None,
        };
        RunningSum::walk(self.len(), &sorted, weights)
    }

    /// Rejects samples the statistic of `method` is undefined for.
    fn check_sample(
        &self,
        method: Method,
        k: usize,
    ) -> Result<()> {
        let n = self.len();
        let rest = n - k;
        let (ok, need) = match method {
            Method::OneSampleTTest => (k >= 2, "at least two members"),
            Method::TwoSampleTTest { .. } => {
                (k >= 2 && rest >= 2, "at least two members and two non-members")
            },
            Method::KolmogorovSmirnov | Method::WeightedKs { .. } | Method::RankSum => {
                (rest >= 1, "at least one non-member")
            },
            _ => (true, ""),
        };
        if ok {
            Ok(())
        }
        else {
            Err(invalid_input!(
                "{} needs {}, got {} of {} scores",
                method,
                need,
                k,
                n
            ))
        }
    }

    /// The statistic reported for the category.
    fn statistic(
        &self,
        method: Method,
        sample: &[usize],
    ) -> f64 {
        match method {
            Method::Mean => SetStatistic::Mean.compute(&self.sample_values(sample)),
            Method::Median => SetStatistic::Median.compute(&self.sample_values(sample)),
            Method::Sum => SetStatistic::Sum.compute(&self.sample_values(sample)),
            Method::MaxMean => SetStatistic::MaxMean.compute(&self.sample_values(sample)),
            Method::KolmogorovSmirnov | Method::WeightedKs { .. } => {
                self.running_sum(method, sample).statistic()
            },
            Method::OneSampleTTest => {
                one_sample_statistic(&self.sample_moments(sample).summary(), self.mean).0
            },
            Method::TwoSampleTTest { variance } => {
                let part = self.sample_moments(sample);
                let rest = self.totals.without(&part);
                two_sample_statistic(&part.summary(), &rest.summary(), variance).0
            },
            Method::RankSum => self.rank_sum(sample),
            Method::Ora => f64::NAN,
        }
    }

    /// The statistic compared against its permutation null. Running sums
    /// are tested on the deviation in the direction of the tail, or on the
    /// larger deviation for a two-sided test.
    fn tested_statistic(
        &self,
        method: Method,
        sample: &[usize],
        tail: Tail,
    ) -> f64 {
        if method.is_running_sum() {
            self.running_sum(method, sample).tested(tail)
        }
        else {
            self.statistic(method, sample)
        }
    }

    fn analytic_p_value(
        &self,
        method: Method,
        sample: &[usize],
        tail: Tail,
    ) -> Result<PValue> {
        let (k, n) = (sample.len(), self.len());
        match method {
            Method::KolmogorovSmirnov => {
                let rs = self.running_sum(method, sample);
                kolmogorov_smirnov_p(rs.max_positive, rs.max_negative, k, n, tail)
            },
            Method::OneSampleTTest => {
                let (t, df) =
                    one_sample_statistic(&self.sample_moments(sample).summary(), self.mean);
                t_p_value(t, df, tail)
            },
            Method::TwoSampleTTest { variance } => {
                let part = self.sample_moments(sample);
                let rest = self.totals.without(&part);
                let (t, df) = two_sample_statistic(&part.summary(), &rest.summary(), variance);
                t_p_value(t, df, tail)
            },
            Method::RankSum => {
                let tie_term = self.ranking.as_ref().map_or(0.0, |r| r.tie_term);
                Ok(rank_sum_from_ranks(self.rank_sum(sample), k, n, tie_term, tail)?.p_value)
            },
            _ => Err(unsupported(method, &PValueMode::Analytic)),
        }
    }
}

fn unsupported(
    method: Method,
    mode: &PValueMode,
) -> EnrichError {
    EnrichError::UnsupportedMode {
        method: method.to_string(),
        mode:   mode.name().to_string(),
    }
}

impl EnrichmentAlgorithm {
    /// Prepares a score-based method.
    ///
    /// Fails with [`EnrichError::UnsupportedMode`] when `config` asks for an
    /// analytic p-value of a statistic that has none, and with
    /// [`EnrichError::InvalidInput`] for [`Method::Ora`], which takes sets
    /// rather than scores (see [`EnrichmentAlgorithm::for_ora`]).
    pub fn for_scores(
        method: Method,
        config: &EnrichmentConfig,
        scores: &Scores,
    ) -> Result<Self> {
        config.validate()?;
        if matches!(method, Method::Ora) {
            return Err(invalid_input!(
                "over-representation analysis takes a reference and a test set, not scores"
            ));
        }
        if config.mode == PValueMode::Analytic && !method.has_analytic_p_value() {
            return Err(unsupported(method, &config.mode));
        }
        if scores.is_empty() {
            return Err(EnrichError::Input("score collection is empty".into()));
        }
        if scores.iter().any(|s| s.score.is_nan()) {
            return Err(EnrichError::Input("score collection contains NaN".into()));
        }

        let ranked = RankedScores::new(method, config, scores);
        info!(
            "Prepared {} over {} scores ({}, {})",
            method,
            ranked.len(),
            config.mode,
            config.tail
        );
        Ok(Self {
            method,
            config: config.clone(),
            engine: Engine::Scores(ranked),
        })
    }

    /// Prepares an over-representation analysis of `test` within
    /// `reference`.
    pub fn for_ora(
        config: &EnrichmentConfig,
        reference: Category,
        test: Category,
    ) -> Result<Self> {
        config.validate()?;
        let ora = OverRepresentationAnalysis::new(reference, test, config.tail)?;
        info!(
            "Prepared {} of {} test entities in {} ({}, {})",
            Method::Ora,
            ora.test().len(),
            ora.reference().len(),
            config.mode,
            config.tail
        );
        Ok(Self {
            method: Method::Ora,
            config: config.clone(),
            engine: Engine::Ora(ora),
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Number of ranked scores, or the reference size for
    /// over-representation analysis.
    pub fn universe_size(&self) -> usize {
        match &self.engine {
            Engine::Scores(ranked) => ranked.len(),
            Engine::Ora(ora) => ora.reference().len(),
        }
    }

    fn check_size(
        &self,
        category: &Category,
        size: usize,
    ) -> Result<()> {
        if self.config.accepts_size(size) {
            Ok(())
        }
        else {
            Err(invalid_input!(
                "category '{}' has {} usable members, outside [{}, {}]",
                category.name(),
                size,
                self.config.min_category_size,
                self.config.max_category_size
            ))
        }
    }

    fn permutation_test(&self) -> Result<Option<PermutationTest>> {
        match self.config.mode {
            PValueMode::Analytic => Ok(None),
            PValueMode::Permutation { permutations, seed } => {
                PermutationTest::new(permutations, seed).map(Some)
            },
        }
    }

    /// Evaluates one category.
    pub fn compute_result(
        &self,
        category: &Category,
    ) -> Result<EnrichmentResult> {
        let result = match &self.engine {
            Engine::Scores(ranked) => self.compute_scores(ranked, category),
            Engine::Ora(ora) => self.compute_ora(ora, category),
        }?;
        debug!(
            "Category '{}': statistic {}, p = {}",
            result.category(),
            result.statistic(),
            result.p_value()
        );
        Ok(result)
    }

    fn compute_scores(
        &self,
        ranked: &RankedScores,
        category: &Category,
    ) -> Result<EnrichmentResult> {
        category.ensure_same_database(&ranked.db)?;
        let sample = ranked.member_positions(category);
        let k = sample.len();
        if k == 0 {
            return Err(invalid_input!(
                "category '{}' has no members in the scores",
                category.name()
            ));
        }
        self.check_size(category, k)?;
        ranked.check_sample(self.method, k)?;

        let (method, tail) = (self.method, self.config.tail);
        let statistic = ranked.statistic(method, &sample);
        let p_value = match self.permutation_test()? {
            None => ranked.analytic_p_value(method, &sample, tail)?,
            Some(test) => {
                let observed = ranked.tested_statistic(method, &sample, tail);
                // The larger running-sum deviation is only extreme upwards.
                let compared = if method.is_running_sum() && tail == Tail::TwoSided {
                    Tail::Upper
                }
                else {
                    tail
                };
                let mut pool: Vec<usize> = (0..ranked.len()).collect();
                let outcome = test.run(&mut pool, k, observed, compared, |draw| {
                    ranked.tested_statistic(method, draw, tail)
                })?;
                PValue::new(outcome.p_value)
            },
        };

        Ok(EnrichmentResult::new(
            category.name().clone(),
            category.reference().map(String::from),
            method,
            self.config.mode,
            tail,
            statistic,
            p_value,
            k,
            None,
        ))
    }

    fn compute_ora(
        &self,
        ora: &OverRepresentationAnalysis,
        category: &Category,
    ) -> Result<EnrichmentResult> {
        let table = ora.contingency_table(category)?;
        self.check_size(category, category.len())?;

        let tail = self.config.tail;
        let hits = table.hits() as usize;
        let p_value = match self.permutation_test()? {
            None => fisher_exact(&table, tail)?,
            Some(test) => {
                let test_set = ora.test();
                let hits_in = |draw: &[usize]| {
                    draw.iter()
                        .filter(|&&index| test_set.contains(index))
                        .count()
                };
                let mut pool = ora.reference().sorted_indices();
                let outcome = match tail {
                    // A draw is as extreme as the observation when its hit
                    // count is no more likely under the hypergeometric null,
                    // the same ordering Fisher's test sums over.
                    Tail::TwoSided => {
                        let null = Hypergeometric::new(
                            table.total(),
                            table.category_size(),
                            table.test_size(),
                        )?;
                        let (_, max_hits) = null.support();
                        let ln_pmf: Vec<f64> = (0..=max_hits).map(|h| null.ln_pmf(h)).collect();
                        let cutoff = two_sided_ln_cutoff(&null, table.hits());
                        test.run(&mut pool, category.len(), cutoff, Tail::Lower, |draw| {
                            ln_pmf[hits_in(draw)]
                        })?
                    },
                    _ => {
                        test.run(&mut pool, category.len(), hits as f64, tail, |draw| {
                            hits_in(draw) as f64
                        })?
                    },
                };
                PValue::new(outcome.p_value)
            },
        };

        Ok(EnrichmentResult::new(
            category.name().clone(),
            category.reference().map(String::from),
            Method::Ora,
            self.config.mode,
            tail,
            hits as f64,
            p_value,
            hits,
            Some(table.expected_hits()),
        ))
    }

    /// Evaluates every category on the shared thread pool. Results keep
    /// the order of `categories`; failures are reported per category.
    ///
    /// Each category draws its permutations from a generator seeded with
    /// the configured seed, so results do not depend on scheduling.
    pub fn compute_all(
        &self,
        categories: &[Category],
    ) -> Vec<Result<EnrichmentResult>> {
        info!(
            "Evaluating {} categories with {} on {} threads",
            categories.len(),
            self.method,
            THREAD_POOL.current_num_threads()
        );
        THREAD_POOL.install(|| {
            categories
                .par_iter()
                .map(|category| self.compute_result(category))
                .collect()
        })
    }
}
