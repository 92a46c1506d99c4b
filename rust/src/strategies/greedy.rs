//! Greedy strategies.
//!
//! At each step an interpreter takes the policy's best candidate among its
//! valid choices (appointments it can append after its last job). When it has
//! none, the best remaining candidate is tried in a gap between existing jobs.
//! A tried candidate is dropped from the interpreter's list whether or not it
//! fit.

use std::str::FromStr;

use crate::clock::ClockValue;
use crate::models::{Appointment, AppointmentId, InterpreterKey, Schedule};
use crate::scheduler::{Ledger, LedgerError, SchedulingContext, SearchDirection};
use crate::{log_assignments, log_candidates};

use super::{Strategy, StrategyError};

/// What the greedy step maximizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GreedyPolicy {
    /// Highest priority first.
    #[default]
    Weight,
    /// Earliest finish first, which maximizes the number of appointments.
    Number,
}

impl GreedyPolicy {
    /// Best candidate in `pool`; the first one wins ties.
    pub fn select(
        &self,
        ledger: &Ledger,
        pool: &[AppointmentId],
    ) -> Result<Option<AppointmentId>, LedgerError> {
        let mut best: Option<&Appointment> = None;
        for &id in pool {
            let appt = ledger.appointment(id)?;
            let better = match (self, best) {
                (_, None) => true,
                (GreedyPolicy::Weight, Some(b)) => appt.priority > b.priority,
                (GreedyPolicy::Number, Some(b)) => appt.finish < b.finish,
            };
            if better {
                best = Some(appt);
            }
        }
        Ok(best.map(|a| a.id))
    }
}

impl FromStr for GreedyPolicy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight" => Ok(GreedyPolicy::Weight),
            "number" => Ok(GreedyPolicy::Number),
            other => Err(StrategyError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Try the next candidate for `key`. Returns the tried id and whether it was
/// committed, or `None` once `remaining` is exhausted.
fn try_next(
    ctx: &mut SchedulingContext,
    key: &InterpreterKey,
    remaining: &[AppointmentId],
    earliest: ClockValue,
    policy: GreedyPolicy,
    verbosity: u8,
) -> Result<Option<(AppointmentId, bool)>, StrategyError> {
    ctx.update_valid_choices_for(key, earliest, remaining, SearchDirection::Forward)?;
    let pick = {
        let valid = ctx.valid_choices(key);
        let pool = if valid.is_empty() { remaining } else { valid };
        policy.select(ctx.ledger(), pool)?
    };
    let Some(pick) = pick else {
        return Ok(None);
    };

    let fits = ctx.ledger().can_insert(key, pick)?;
    if fits {
        ctx.ledger_mut().assign(key, pick)?;
        log_assignments!(verbosity, "  {} takes appointment {}", key, pick);
    } else {
        log_candidates!(verbosity, "  {} cannot fit appointment {}", key, pick);
    }
    Ok(Some((pick, fits)))
}

/// Fill each interpreter in turn.
fn classic_pass(
    ctx: &mut SchedulingContext,
    keys: &[InterpreterKey],
    policy: GreedyPolicy,
    earliest: ClockValue,
    verbosity: u8,
) -> Result<(), StrategyError> {
    for key in keys {
        let mut remaining = ctx.ledger().candidates_for(key, earliest)?;
        log_candidates!(verbosity, "{}: {} candidates", key, remaining.len());
        while let Some((tried, _)) = try_next(ctx, key, &remaining, earliest, policy, verbosity)? {
            remaining.retain(|&id| id != tried);
        }
    }
    Ok(())
}

/// Round robin: one attempt per interpreter per pass.
fn balanced_pass(
    ctx: &mut SchedulingContext,
    keys: &[InterpreterKey],
    policy: GreedyPolicy,
    earliest: ClockValue,
    verbosity: u8,
) -> Result<(), StrategyError> {
    let mut lists: Vec<(InterpreterKey, Vec<AppointmentId>)> = Vec::with_capacity(keys.len());
    for key in keys {
        let candidates = ctx.ledger().candidates_for(key, earliest)?;
        if !candidates.is_empty() {
            lists.push((key.clone(), candidates));
        }
    }

    while !lists.is_empty() {
        for i in 0..lists.len() {
            let outcome = try_next(ctx, &lists[i].0, &lists[i].1, earliest, policy, verbosity)?;
            match outcome {
                Some((taken, true)) => {
                    for (_, list) in lists.iter_mut() {
                        list.retain(|&id| id != taken);
                    }
                }
                Some((rejected, false)) => lists[i].1.retain(|&id| id != rejected),
                None => lists[i].1.clear(),
            }
        }
        lists.retain(|(_, list)| !list.is_empty());
    }
    Ok(())
}

/// Each interpreter in shift order takes as much as it can.
#[derive(Clone, Debug)]
pub struct ClassicGreedy {
    pub policy: GreedyPolicy,
    pub earliest_start: ClockValue,
    pub verbosity: u8,
}

impl ClassicGreedy {
    pub fn new(policy: GreedyPolicy, earliest_start: ClockValue) -> Self {
        Self {
            policy,
            earliest_start,
            verbosity: 0,
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

impl Strategy for ClassicGreedy {
    fn name(&self) -> &str {
        "classic_greedy"
    }

    fn run(&self, base: &SchedulingContext) -> Result<Schedule, StrategyError> {
        let mut ctx = base.reset();
        let keys = ctx.ledger().interpreter_keys();
        classic_pass(&mut ctx, &keys, self.policy, self.earliest_start, self.verbosity)?;
        log_assignments!(
            self.verbosity,
            "{}: impact {}, {} left open",
            self.name(),
            ctx.ledger().impact(),
            ctx.ledger().unassigned_count()
        );
        Ok(ctx.into_schedule())
    }
}

/// Interpreters take turns so work spreads across staff.
#[derive(Clone, Debug)]
pub struct BalancedGreedy {
    pub policy: GreedyPolicy,
    pub earliest_start: ClockValue,
    pub verbosity: u8,
}

impl BalancedGreedy {
    pub fn new(policy: GreedyPolicy, earliest_start: ClockValue) -> Self {
        Self {
            policy,
            earliest_start,
            verbosity: 0,
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

impl Strategy for BalancedGreedy {
    fn name(&self) -> &str {
        "balanced_greedy"
    }

    fn run(&self, base: &SchedulingContext) -> Result<Schedule, StrategyError> {
        let mut ctx = base.reset();
        let keys = ctx.ledger().interpreter_keys();
        balanced_pass(&mut ctx, &keys, self.policy, self.earliest_start, self.verbosity)?;
        log_assignments!(
            self.verbosity,
            "{}: impact {}, {} left open",
            self.name(),
            ctx.ledger().impact(),
            ctx.ledger().unassigned_count()
        );
        Ok(ctx.into_schedule())
    }
}

/// Runs classic or balanced greedy over interpreter groups in order, all on
/// one shared context.
#[derive(Clone, Debug)]
pub struct GroupedGreedy {
    pub groups: Vec<Vec<InterpreterKey>>,
    pub policy: GreedyPolicy,
    pub balanced: bool,
    pub earliest_start: ClockValue,
    pub verbosity: u8,
}

impl GroupedGreedy {
    pub fn new(groups: Vec<Vec<InterpreterKey>>, policy: GreedyPolicy, balanced: bool) -> Self {
        Self {
            groups,
            policy,
            balanced,
            earliest_start: ClockValue::MIDNIGHT,
            verbosity: 0,
        }
    }
}

impl Strategy for GroupedGreedy {
    fn name(&self) -> &str {
        "grouped_greedy"
    }

    fn run(&self, base: &SchedulingContext) -> Result<Schedule, StrategyError> {
        let mut ctx = base.reset();
        for group in &self.groups {
            if self.balanced {
                balanced_pass(&mut ctx, group, self.policy, self.earliest_start, self.verbosity)?;
            } else {
                classic_pass(&mut ctx, group, self.policy, self.earliest_start, self.verbosity)?;
            }
        }
        log_assignments!(
            self.verbosity,
            "{}: impact {}, {} left open",
            self.name(),
            ctx.ledger().impact(),
            ctx.ledger().unassigned_count()
        );
        Ok(ctx.into_schedule())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{appt, busy_morning, clinic_day, context, francois, janet, jose, t};
    use crate::models::ANCHOR_ID;

    fn covered_by(schedule: &Schedule, key: &InterpreterKey) -> Vec<AppointmentId> {
        schedule
            .appointments
            .iter()
            .filter(|a| a.interpreter.as_ref() == Some(key))
            .map(|a| a.id)
            .collect()
    }

    #[test]
    fn test_policy_parse_and_ties() {
        assert_eq!("weight".parse::<GreedyPolicy>().unwrap(), GreedyPolicy::Weight);
        assert_eq!("number".parse::<GreedyPolicy>().unwrap(), GreedyPolicy::Number);
        assert!("random".parse::<GreedyPolicy>().is_err());

        let schedule = Schedule::try_new(
            vec![appt(1, "8:00", 30, 5.0), appt(2, "9:00", 30, 5.0)],
            vec![jose()],
        )
        .unwrap();
        let ctx = context(schedule);
        assert_eq!(GreedyPolicy::Weight.select(ctx.ledger(), &[2, 1]).unwrap(), Some(2));
        assert_eq!(GreedyPolicy::Weight.select(ctx.ledger(), &[1, 2]).unwrap(), Some(1));
        assert_eq!(GreedyPolicy::Number.select(ctx.ledger(), &[2, 1]).unwrap(), Some(1));
        assert_eq!(GreedyPolicy::Number.select(ctx.ledger(), &[]).unwrap(), None);
    }

    #[test]
    fn test_weight_and_number_policies_disagree_on_overlap() {
        let schedule = Schedule::try_new(
            vec![appt(1, "8:00", 60, 10.0), appt(2, "8:30", 60, 50.0)],
            vec![jose()],
        )
        .unwrap();
        let base = context(schedule);

        let by_weight = ClassicGreedy::new(GreedyPolicy::Weight, t("6:00"))
            .run(&base)
            .unwrap();
        assert_eq!(covered_by(&by_weight, &jose().key()), vec![2]);

        let by_number = ClassicGreedy::new(GreedyPolicy::Number, t("6:00"))
            .run(&base)
            .unwrap();
        assert_eq!(covered_by(&by_number, &jose().key()), vec![1]);
    }

    #[test]
    fn test_weight_greedy_takes_highest_valid_then_fills_gaps() {
        let base = context(busy_morning());
        let schedule = ClassicGreedy::new(GreedyPolicy::Weight, t("6:00"))
            .run(&base)
            .unwrap();
        // 8:30-11:30 is worth most; only the 8:00 slot still fits before it
        assert_eq!(covered_by(&schedule, &base.ledger().interpreter_keys()[0]), vec![1, 8]);
        assert_eq!(schedule.calc_impact(), 9.0);
        assert_eq!(schedule.impact, 9.0);
    }

    #[test]
    fn test_time_floor_excludes_early_appointments() {
        let base = context(clinic_day());
        let schedule = ClassicGreedy::new(GreedyPolicy::Weight, t("8:20"))
            .run(&base)
            .unwrap();
        assert_eq!(schedule.calc_impact(), 50.0);
        assert!(schedule.appointment(1).unwrap().interpreter.is_none());
    }

    #[test]
    fn test_classic_loads_first_interpreter() {
        let base = context(clinic_day());
        let schedule = ClassicGreedy::new(GreedyPolicy::Weight, t("6:00"))
            .run(&base)
            .unwrap();
        assert_eq!(covered_by(&schedule, &jose().key()), vec![1, 2]);
        assert!(covered_by(&schedule, &janet().key()).is_empty());
        assert_eq!(covered_by(&schedule, &francois().key()), vec![3]);
    }

    #[test]
    fn test_balanced_spreads_work() {
        let base = context(clinic_day());
        let schedule = BalancedGreedy::new(GreedyPolicy::Weight, t("6:00"))
            .run(&base)
            .unwrap();
        assert_eq!(covered_by(&schedule, &jose().key()), vec![1]);
        assert_eq!(covered_by(&schedule, &janet().key()), vec![2]);
        assert_eq!(covered_by(&schedule, &francois().key()), vec![3]);
        assert_eq!(schedule.calc_impact(), 150.0);
    }

    #[test]
    fn test_grouped_runs_groups_in_order() {
        let base = context(clinic_day());
        let strategy = GroupedGreedy::new(
            vec![vec![janet().key()], vec![jose().key(), francois().key()]],
            GreedyPolicy::Weight,
            false,
        );
        let schedule = strategy.run(&base).unwrap();
        assert_eq!(covered_by(&schedule, &janet().key()), vec![1, 2]);
        assert!(covered_by(&schedule, &jose().key()).is_empty());
        assert_eq!(schedule.calc_impact(), 150.0);
        assert_eq!(base.ledger().jobs(&janet().key()).unwrap(), &[ANCHOR_ID]);
    }

    #[test]
    fn test_balanced_rejection_stays_with_the_rejecting_interpreter() {
        let booked = appt(1, "8:00", 60, 10.0).with_interpreter(jose().key());
        let schedule = Schedule::try_new(
            vec![booked, appt(2, "8:30", 60, 50.0)],
            vec![jose(), janet()],
        )
        .unwrap();
        let base = context(schedule);
        assert_eq!(base.ledger().interpreter_keys()[0], jose().key());

        let schedule = BalancedGreedy::new(GreedyPolicy::Weight, t("6:00"))
            .run(&base)
            .unwrap();
        assert_eq!(covered_by(&schedule, &jose().key()), vec![1]);
        assert_eq!(covered_by(&schedule, &janet().key()), vec![2]);
        assert_eq!(schedule.impact, 50.0);
        assert_eq!(schedule.calc_impact(), 60.0);
    }
}
