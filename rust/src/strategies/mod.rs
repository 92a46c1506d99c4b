//! Assignment strategies.
//!
//! Every strategy starts from a reset copy of the base context, commits through
//! the ledger and hands back the resulting schedule.

mod brute_force;
mod greedy;
mod monte_carlo;
mod weighted_interval;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::OptimizerConfig;
use crate::models::Schedule;
use crate::scheduler::{LedgerError, SchedulingContext};

pub use brute_force::{all_paths, best_path, BruteForce, ReachabilityGraph, WeightMode};
pub use greedy::{BalancedGreedy, ClassicGreedy, GreedyPolicy, GroupedGreedy};
pub use monte_carlo::MonteCarlo;
pub use weighted_interval::{CachedAssignment, IntervalTable};

/// Errors that can occur while building or running a strategy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("Unknown greedy policy: {0} (expected \"weight\" or \"number\")")]
    UnknownPolicy(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// An interchangeable way of filling the schedule.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Run against a reset copy of `base` and return the filled schedule.
    fn run(&self, base: &SchedulingContext) -> Result<Schedule, StrategyError>;
}

/// Strategies that can be named in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    ClassicGreedy,
    BalancedGreedy,
    MonteCarlo,
    BruteForce,
    BruteForceAssignment,
    CachedAssignment,
}

impl StrategyKind {
    pub const DEFAULT_LINEUP: [StrategyKind; 5] = [
        StrategyKind::ClassicGreedy,
        StrategyKind::BalancedGreedy,
        StrategyKind::BruteForce,
        StrategyKind::BruteForceAssignment,
        StrategyKind::CachedAssignment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::ClassicGreedy => "classic_greedy",
            StrategyKind::BalancedGreedy => "balanced_greedy",
            StrategyKind::MonteCarlo => "monte_carlo",
            StrategyKind::BruteForce => "brute_force",
            StrategyKind::BruteForceAssignment => "brute_force_assignment",
            StrategyKind::CachedAssignment => "cached_assignment",
        }
    }

    /// Bind the strategy to its parameters from `config`.
    pub fn build(&self, config: &OptimizerConfig) -> Result<Box<dyn Strategy>, StrategyError> {
        let policy = config.policy()?;
        let verbosity = config.verbosity;
        Ok(match self {
            StrategyKind::ClassicGreedy => Box::new(
                ClassicGreedy::new(policy, config.earliest_start).with_verbosity(verbosity),
            ),
            StrategyKind::BalancedGreedy => Box::new(
                BalancedGreedy::new(policy, config.earliest_start).with_verbosity(verbosity),
            ),
            StrategyKind::MonteCarlo => Box::new(MonteCarlo {
                earliest_start: config.earliest_start,
                trials: config.trials,
                max_repeated: config.max_repeated_trials(),
                seed: config.seed,
                verbosity,
            }),
            StrategyKind::BruteForce => {
                Box::new(BruteForce::new(WeightMode::Priority).with_verbosity(verbosity))
            }
            StrategyKind::BruteForceAssignment => {
                Box::new(BruteForce::new(WeightMode::Building).with_verbosity(verbosity))
            }
            StrategyKind::CachedAssignment => {
                Box::new(CachedAssignment::default().with_verbosity(verbosity))
            }
        })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic_greedy" => Ok(StrategyKind::ClassicGreedy),
            "balanced_greedy" => Ok(StrategyKind::BalancedGreedy),
            "monte_carlo" => Ok(StrategyKind::MonteCarlo),
            "brute_force" => Ok(StrategyKind::BruteForce),
            "brute_force_assignment" => Ok(StrategyKind::BruteForceAssignment),
            "cached_assignment" => Ok(StrategyKind::CachedAssignment),
            other => Err(StrategyError::UnknownStrategy(other.to_string())),
        }
    }
}
