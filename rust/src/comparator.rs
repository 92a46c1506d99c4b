//! Runs several strategies on the same dataset and ranks them.

use pyo3::prelude::*;

use crate::config::OptimizerConfig;
use crate::log_assignments;
use crate::models::{CoverageGroup, Schedule};
use crate::scheduler::SchedulingContext;
use crate::strategies::{Strategy, StrategyError};

/// One strategy's outcome.
#[pyclass]
#[derive(Clone, Debug)]
pub struct ComparisonResult {
    #[pyo3(get)]
    pub score: f64,
    #[pyo3(get)]
    pub strategy: String,
    #[pyo3(get)]
    pub schedule: Schedule,
}

#[pymethods]
impl ComparisonResult {
    fn __repr__(&self) -> String {
        format!(
            "ComparisonResult(strategy={:?}, score={})",
            self.strategy, self.score
        )
    }
}

#[pyclass]
#[derive(Clone, Debug)]
pub struct StrategyReport {
    #[pyo3(get)]
    pub strategy: String,
    #[pyo3(get)]
    pub score: f64,
    #[pyo3(get)]
    pub percent_of_max: f64,
    #[pyo3(get)]
    pub coverage: Vec<CoverageGroup>,
}

/// Ranked results against the theoretical maximum (every appointment covered).
#[pyclass]
#[derive(Clone, Debug)]
pub struct ComparisonReport {
    #[pyo3(get)]
    pub max_impact: f64,
    #[pyo3(get)]
    pub entries: Vec<StrategyReport>,
}

#[derive(Default)]
pub struct Comparator {
    strategies: Vec<Box<dyn Strategy>>,
    results: Vec<ComparisonResult>,
    has_compared: bool,
    verbosity: u8,
}

impl Comparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configured lineup, each strategy bound to its parameters.
    pub fn from_config(config: &OptimizerConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        let mut comparator = Self {
            verbosity: config.verbosity,
            ..Self::default()
        };
        for kind in config.strategy_kinds()? {
            comparator.push(kind.build(config)?);
        }
        Ok(comparator)
    }

    pub fn with_strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.push(Box::new(strategy));
        self
    }

    pub fn push(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run every strategy from a reset copy of `base`, in order. On error the
    /// previous results are discarded and nothing is reported.
    pub fn compare(
        &mut self,
        base: &SchedulingContext,
    ) -> Result<&[ComparisonResult], StrategyError> {
        self.results.clear();
        self.has_compared = false;

        let mut results = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let schedule = strategy.run(base)?;
            let score = schedule.calc_impact();
            log_assignments!(self.verbosity, "{} scored {}", strategy.name(), score);
            results.push(ComparisonResult {
                score,
                strategy: strategy.name().to_string(),
                schedule,
            });
        }
        self.results = results;
        self.has_compared = true;
        Ok(&self.results)
    }

    pub fn has_compared(&self) -> bool {
        self.has_compared
    }

    /// Results in run order.
    pub fn results(&self) -> &[ComparisonResult] {
        &self.results
    }

    /// Results by descending score; equal scores keep run order.
    pub fn ranked(&self) -> Vec<&ComparisonResult> {
        let mut ranked: Vec<&ComparisonResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    pub fn best(&self) -> Option<&ComparisonResult> {
        self.ranked().into_iter().next()
    }

    /// Breakdown of each ranked result, `None` before [`Comparator::compare`].
    pub fn report(&self) -> Option<ComparisonReport> {
        if !self.has_compared {
            return None;
        }
        let max_impact = self
            .results
            .first()
            .map(|r| r.schedule.total_impact)
            .unwrap_or(0.0);
        let entries = self
            .ranked()
            .into_iter()
            .map(|r| StrategyReport {
                strategy: r.strategy.clone(),
                score: r.score,
                percent_of_max: if max_impact > 0.0 {
                    r.score / max_impact * 100.0
                } else {
                    0.0
                },
                coverage: r.schedule.coverage(),
            })
            .collect();
        Some(ComparisonReport {
            max_impact,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{busy_morning, clinic_day, context, t};
    use crate::strategies::{CachedAssignment, ClassicGreedy, GreedyPolicy};

    struct Failing;

    impl Strategy for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(&self, _base: &SchedulingContext) -> Result<Schedule, StrategyError> {
            Err(StrategyError::InvalidConfig("always fails".to_string()))
        }
    }

    #[test]
    fn test_default_lineup_on_clinic_day() {
        let base = context(clinic_day());
        let mut comparator = Comparator::from_config(&OptimizerConfig::default()).unwrap();
        assert_eq!(
            comparator.strategy_names(),
            vec![
                "classic_greedy",
                "balanced_greedy",
                "brute_force",
                "brute_force_assignment",
                "cached_assignment"
            ]
        );
        assert!(!comparator.has_compared());
        assert!(comparator.report().is_none());

        let results = comparator.compare(&base).unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.score == 150.0));
        assert!(comparator.has_compared());

        let report = comparator.report().unwrap();
        assert_eq!(report.max_impact, 150.0);
        assert_eq!(report.entries[0].strategy, "classic_greedy");
        assert!(report.entries.iter().all(|e| e.percent_of_max == 100.0));
        let unassigned = report.entries[0].coverage.last().unwrap();
        assert_eq!(unassigned.interpreter, None);
        assert_eq!(unassigned.count, 0);
    }

    #[test]
    fn test_ranking_orders_by_score() {
        let base = context(busy_morning());
        let mut comparator = Comparator::new()
            .with_strategy(ClassicGreedy::new(GreedyPolicy::Weight, t("6:00")))
            .with_strategy(CachedAssignment::default());
        comparator.compare(&base).unwrap();

        let ranked: Vec<_> = comparator
            .ranked()
            .iter()
            .map(|r| (r.strategy.clone(), r.score))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("cached_assignment".to_string(), 11.0),
                ("classic_greedy".to_string(), 9.0)
            ]
        );
        assert_eq!(comparator.best().unwrap().strategy, "cached_assignment");
        // run order is kept separately
        assert_eq!(comparator.results()[0].strategy, "classic_greedy");

        let report = comparator.report().unwrap();
        assert_eq!(report.max_impact, 36.0);
        assert!((report.entries[1].percent_of_max - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_config_is_rejected() {
        let config = OptimizerConfig {
            strategies: vec!["classic_greedy".to_string(), "tabu".to_string()],
            ..OptimizerConfig::default()
        };
        assert!(matches!(
            Comparator::from_config(&config),
            Err(StrategyError::UnknownStrategy(name)) if name == "tabu"
        ));
    }

    #[test]
    fn test_failed_compare_clears_previous_results() {
        let base = context(clinic_day());
        let mut comparator =
            Comparator::new().with_strategy(ClassicGreedy::new(GreedyPolicy::Weight, t("6:00")));
        comparator.compare(&base).unwrap();
        assert!(comparator.report().is_some());

        comparator.push(Box::new(Failing));
        comparator.push(Box::new(ClassicGreedy::new(GreedyPolicy::Number, t("6:00"))));
        assert!(comparator.compare(&base).is_err());
        assert!(!comparator.has_compared());
        assert!(comparator.results().is_empty());
        assert!(comparator.best().is_none());
        assert!(comparator.report().is_none());
    }
}
