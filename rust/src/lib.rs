//! Interpreter coverage optimizer.
//!
//! Assigns interpreters to appointments under shift, language and travel
//! constraints, with several interchangeable strategies and a comparator that
//! ranks them on the same dataset.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

mod clock;
pub mod comparator;
mod config;
mod location;
mod logging;
mod models;
pub mod scheduler;
pub mod strategies;

#[cfg(test)]
mod fixtures;

pub use clock::{ClockParseError, ClockValue};
pub use comparator::{Comparator, ComparisonReport, ComparisonResult, StrategyReport};
pub use config::{CompatibilityRules, OptimizerConfig, DEFAULT_WALKING_RATE};
pub use location::{Location, Point};
pub use models::{
    Appointment, AppointmentId, CoverageGroup, Interpreter, InterpreterKey, Patient, Schedule,
    ScheduleError, ANCHOR_ID,
};
pub use scheduler::{Ledger, LedgerError, SchedulingContext, SearchDirection};
pub use strategies::{Strategy, StrategyError, StrategyKind};

fn to_py_err(err: impl std::fmt::Display) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

/// Run the configured strategies on `schedule` and return their results,
/// best first.
///
/// # Raises
/// * ValueError on duplicate appointment ids or an invalid configuration
#[pyfunction]
#[pyo3(signature = (schedule, config=None))]
fn compare_strategies(
    schedule: Schedule,
    config: Option<OptimizerConfig>,
) -> PyResult<Vec<ComparisonResult>> {
    let config = config.unwrap_or_default();
    let base = SchedulingContext::new(schedule, config.rules()).map_err(to_py_err)?;
    let mut comparator = Comparator::from_config(&config).map_err(to_py_err)?;
    comparator.compare(&base).map_err(to_py_err)?;
    Ok(comparator.ranked().into_iter().cloned().collect())
}

/// Full comparison report: ranked scores, percentages and coverage breakdown.
#[pyfunction]
#[pyo3(signature = (schedule, config=None))]
fn comparison_report(
    schedule: Schedule,
    config: Option<OptimizerConfig>,
) -> PyResult<Option<ComparisonReport>> {
    let config = config.unwrap_or_default();
    let base = SchedulingContext::new(schedule, config.rules()).map_err(to_py_err)?;
    let mut comparator = Comparator::from_config(&config).map_err(to_py_err)?;
    comparator.compare(&base).map_err(to_py_err)?;
    Ok(comparator.report())
}

/// Run one strategy by name and return the filled schedule.
#[pyfunction]
#[pyo3(signature = (strategy, schedule, config=None))]
fn run_strategy(
    strategy: &str,
    schedule: Schedule,
    config: Option<OptimizerConfig>,
) -> PyResult<Schedule> {
    let config = config.unwrap_or_default();
    config.validate().map_err(to_py_err)?;
    let kind: StrategyKind = strategy.parse().map_err(to_py_err)?;
    let base = SchedulingContext::new(schedule, config.rules()).map_err(to_py_err)?;
    kind.build(&config)
        .and_then(|s| s.run(&base))
        .map_err(to_py_err)
}

/// Python module definition
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ClockValue>()?;
    m.add_class::<Point>()?;
    m.add_class::<Location>()?;
    m.add_class::<Patient>()?;
    m.add_class::<InterpreterKey>()?;
    m.add_class::<Interpreter>()?;
    m.add_class::<Appointment>()?;
    m.add_class::<CoverageGroup>()?;
    m.add_class::<Schedule>()?;
    m.add_class::<OptimizerConfig>()?;
    m.add_class::<ComparisonResult>()?;
    m.add_class::<StrategyReport>()?;
    m.add_class::<ComparisonReport>()?;
    m.add_function(wrap_pyfunction!(compare_strategies, m)?)?;
    m.add_function(wrap_pyfunction!(comparison_report, m)?)?;
    m.add_function(wrap_pyfunction!(run_strategy, m)?)?;
    Ok(())
}
