//! Configuration types for the optimizer.

use pyo3::prelude::*;
use std::str::FromStr;

use crate::clock::ClockValue;
use crate::location::Location;
use crate::strategies::{GreedyPolicy, StrategyError, StrategyKind};

/// Map distance units covered per minute of walking.
pub const DEFAULT_WALKING_RATE: f64 = 75.0;

/// Rules deciding whether one appointment can follow another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompatibilityRules {
    /// Distance units per minute.
    pub walking_rate: f64,
    /// How late an interpreter may arrive after the appointment starts.
    pub late_allowance_minutes: i64,
}

impl Default for CompatibilityRules {
    fn default() -> Self {
        Self {
            walking_rate: DEFAULT_WALKING_RATE,
            late_allowance_minutes: 0,
        }
    }
}

impl CompatibilityRules {
    /// Walking minutes between two locations, rounded to the nearest minute.
    pub fn travel_minutes(&self, from: &Location, to: &Location) -> i64 {
        if self.walking_rate <= 0.0 {
            return 0;
        }
        (from.distance_to(to) / self.walking_rate).round() as i64
    }
}

/// Which strategies to compare and how to parameterize them.
#[pyclass]
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    /// Strategy names, run in this order.
    #[pyo3(get, set)]
    pub strategies: Vec<String>,
    /// Greedy selection policy: "weight" or "number"
    #[pyo3(get, set)]
    pub greedy_policy: String,
    /// Appointments starting earlier are ignored by greedy and Monte Carlo
    #[pyo3(get, set)]
    pub earliest_start: ClockValue,
    /// Monte Carlo trial count
    #[pyo3(get, set)]
    pub trials: usize,
    /// Stop Monte Carlo after this many trials without improvement
    /// (None = a quarter of `trials`, at least 1)
    #[pyo3(get, set)]
    pub max_repeated: Option<usize>,
    /// Seed for Monte Carlo (None = fresh entropy each run)
    #[pyo3(get, set)]
    pub seed: Option<u64>,
    #[pyo3(get, set)]
    pub walking_rate: f64,
    #[pyo3(get, set)]
    pub late_allowance_minutes: i64,
    /// 0 = silent, 1 = assignments, 2 = candidates, 3 = debug
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::DEFAULT_LINEUP
                .iter()
                .map(|kind| kind.name().to_string())
                .collect(),
            greedy_policy: "weight".to_string(),
            earliest_start: ClockValue::from_hm(6, 0),
            trials: 100,
            max_repeated: None,
            seed: None,
            walking_rate: DEFAULT_WALKING_RATE,
            late_allowance_minutes: 0,
            verbosity: 0,
        }
    }
}

impl OptimizerConfig {
    pub fn rules(&self) -> CompatibilityRules {
        CompatibilityRules {
            walking_rate: self.walking_rate,
            late_allowance_minutes: self.late_allowance_minutes,
        }
    }

    pub fn max_repeated_trials(&self) -> usize {
        self.max_repeated.unwrap_or((self.trials / 4).max(1))
    }

    pub fn policy(&self) -> Result<GreedyPolicy, StrategyError> {
        GreedyPolicy::from_str(&self.greedy_policy)
    }

    pub fn strategy_kinds(&self) -> Result<Vec<StrategyKind>, StrategyError> {
        self.strategies
            .iter()
            .map(|name| StrategyKind::from_str(name))
            .collect()
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        if !(self.walking_rate > 0.0) {
            return Err(StrategyError::InvalidConfig(format!(
                "walking_rate must be positive, got {}",
                self.walking_rate
            )));
        }
        if self.late_allowance_minutes < 0 {
            return Err(StrategyError::InvalidConfig(
                "late_allowance_minutes cannot be negative".to_string(),
            ));
        }
        if self.max_repeated == Some(0) {
            return Err(StrategyError::InvalidConfig(
                "max_repeated must be at least 1".to_string(),
            ));
        }
        self.policy()?;
        self.strategy_kinds()?;
        Ok(())
    }
}

#[pymethods]
impl OptimizerConfig {
    #[new]
    #[pyo3(signature = (
        strategies=None,
        greedy_policy=None,
        earliest_start=None,
        trials=None,
        max_repeated=None,
        seed=None,
        walking_rate=None,
        late_allowance_minutes=None,
        verbosity=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        strategies: Option<Vec<String>>,
        greedy_policy: Option<String>,
        earliest_start: Option<&str>,
        trials: Option<usize>,
        max_repeated: Option<usize>,
        seed: Option<u64>,
        walking_rate: Option<f64>,
        late_allowance_minutes: Option<i64>,
        verbosity: Option<u8>,
    ) -> PyResult<Self> {
        let defaults = Self::default();
        let earliest_start = match earliest_start {
            Some(text) => ClockValue::parse(text)
                .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?,
            None => defaults.earliest_start,
        };
        Ok(Self {
            strategies: strategies.unwrap_or(defaults.strategies),
            greedy_policy: greedy_policy.unwrap_or(defaults.greedy_policy),
            earliest_start,
            trials: trials.unwrap_or(defaults.trials),
            max_repeated,
            seed,
            walking_rate: walking_rate.unwrap_or(defaults.walking_rate),
            late_allowance_minutes: late_allowance_minutes
                .unwrap_or(defaults.late_allowance_minutes),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        })
    }

    fn __repr__(&self) -> String {
        format!(
            "OptimizerConfig(strategies={:?}, greedy_policy={:?}, earliest_start={}, trials={})",
            self.strategies, self.greedy_policy, self.earliest_start, self.trials
        )
    }
}
