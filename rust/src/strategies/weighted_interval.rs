//! Weighted interval scheduling, one interpreter at a time.
//!
//! Candidates are sorted by finish and numbered from 1. `p(j)` is the largest
//! `i < j` such that items `1..=i` all finish by the time `j` starts and are
//! reachable from each other's locations in time; any chain the table picks
//! can therefore be committed in order.

use crate::models::{Appointment, AppointmentId, Interpreter, InterpreterKey, Schedule};
use crate::scheduler::{Ledger, LedgerError, SchedulingContext, SearchDirection};
use crate::{log_assignments, log_debug};

use super::{Strategy, StrategyError};

#[derive(Clone, Debug, PartialEq)]
pub struct IntervalTable {
    /// Sorted by finish; item `j` lives at index `j - 1`.
    ids: Vec<AppointmentId>,
    values: Vec<f64>,
    /// Indexed by item number; entry 0 is unused.
    priors: Vec<usize>,
    /// `weights[j]` is the best total over items `1..=j`.
    weights: Vec<f64>,
}

impl IntervalTable {
    pub fn build(
        ledger: &Ledger,
        interpreter: &Interpreter,
        candidates: &[AppointmentId],
    ) -> Result<Self, LedgerError> {
        let mut items: Vec<&Appointment> = ledger.appointments(candidates)?;
        items.sort_by_key(|a| a.finish);
        let n = items.len();

        let mut priors = vec![0; n + 1];
        for j in 1..=n {
            let current = items[j - 1];
            let earlier = &items[..j - 1];
            let finished = earlier.partition_point(|a| a.finish <= current.start);
            priors[j] = earlier[..finished]
                .iter()
                .position(|a| !ledger.are_compatible(a, current))
                .unwrap_or(finished);
        }

        let values: Vec<f64> = items
            .iter()
            .map(|a| interpreter.effective_weight(a))
            .collect();

        let mut weights = vec![0.0; n + 1];
        for j in 1..=n {
            weights[j] = (values[j - 1] + weights[priors[j]]).max(weights[j - 1]);
        }

        Ok(Self {
            ids: items.iter().map(|a| a.id).collect(),
            values,
            priors,
            weights,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Appointment id of item `j` (1-based).
    pub fn id(&self, j: usize) -> Option<AppointmentId> {
        j.checked_sub(1).and_then(|idx| self.ids.get(idx)).copied()
    }

    pub fn prior(&self, j: usize) -> usize {
        self.priors.get(j).copied().unwrap_or(0)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn best_weight(&self) -> f64 {
        self.weights.last().copied().unwrap_or(0.0)
    }

    /// Item numbers of an optimal chain over items `1..=j`, ascending.
    pub fn compute_optimal(&self, j: usize) -> Vec<usize> {
        let mut chosen = Vec::new();
        let mut j = j.min(self.len());
        while j > 0 {
            if self.values[j - 1] + self.weights[self.priors[j]] >= self.weights[j - 1] {
                chosen.push(j);
                j = self.priors[j];
            } else {
                j -= 1;
            }
        }
        chosen.reverse();
        chosen
    }

    /// Appointment ids of the optimal chain, in start order.
    pub fn optimal_ids(&self) -> Vec<AppointmentId> {
        self.compute_optimal(self.len())
            .into_iter()
            .filter_map(|j| self.id(j))
            .collect()
    }
}

/// Solves each interpreter's table and commits its chain before moving on.
#[derive(Clone, Debug, Default)]
pub struct CachedAssignment {
    /// Interpreters to fill, in order. `None` means all of them.
    pub interpreters: Option<Vec<InterpreterKey>>,
    pub verbosity: u8,
}

impl CachedAssignment {
    pub fn with_interpreters(mut self, interpreters: Vec<InterpreterKey>) -> Self {
        self.interpreters = Some(interpreters);
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

impl Strategy for CachedAssignment {
    fn name(&self) -> &str {
        "cached_assignment"
    }

    fn run(&self, base: &SchedulingContext) -> Result<Schedule, StrategyError> {
        let mut ctx = base.reset();
        let keys = match &self.interpreters {
            Some(keys) => keys.clone(),
            None => ctx.ledger().interpreter_keys(),
        };

        for key in &keys {
            let shift_start = ctx.ledger().interpreter(key)?.shift_start;
            let pool = ctx.ledger().unassigned_in_order();
            ctx.update_valid_choices_for(key, shift_start, &pool, SearchDirection::Forward)?;
            let candidates = ctx.valid_choices(key).to_vec();
            if candidates.is_empty() {
                continue;
            }

            let table = IntervalTable::build(ctx.ledger(), ctx.ledger().interpreter(key)?, &candidates)?;
            let chosen = table.optimal_ids();
            log_debug!(self.verbosity, "{}: weights {:?}", key, table.weights());
            log_assignments!(self.verbosity, "{}: takes {:?} worth {}", key, chosen, table.best_weight());
            ctx.ledger_mut().group_assign(key, &chosen)?;
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
    use crate::config::CompatibilityRules;
    use crate::fixtures::{appt, busy_morning, clinic_day, context, francois, jose};

    fn table_for(ctx: &SchedulingContext) -> IntervalTable {
        let ledger = ctx.ledger();
        let interpreter = &ledger.interpreters()[0];
        IntervalTable::build(ledger, interpreter, &ledger.unassigned_in_order()).unwrap()
    }

    #[test]
    fn test_priors_and_weights() {
        let ctx = context(busy_morning());
        let table = table_for(&ctx);
        let ids: Vec<_> = (1..=8).map(|j| table.id(j).unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);

        let priors: Vec<_> = (1..=8).map(|j| table.prior(j)).collect();
        assert_eq!(priors, vec![0, 0, 1, 2, 4, 3, 1, 1]);
        assert_eq!(
            table.weights(),
            &[0.0, 1.0, 2.0, 4.0, 6.0, 11.0, 11.0, 11.0, 11.0]
        );
        assert_eq!(table.compute_optimal(8), vec![2, 4, 5]);
        assert_eq!(table.compute_optimal(3), vec![1, 3]);
        assert_eq!(table.optimal_ids(), vec![2, 4, 5]);
    }

    #[test]
    fn test_travel_limits_the_prior() {
        let mut far = appt(2, "8:10", 10, 1.0);
        far.location.x = 30.0;
        far.location.y = 40.0;
        let schedule = Schedule::try_new(
            vec![appt(1, "8:00", 10, 1.0), far, appt(3, "8:25", 10, 1.0)],
            vec![jose()],
        )
        .unwrap();
        let rules = CompatibilityRules {
            walking_rate: 1.0,
            late_allowance_minutes: 0,
        };
        let base = SchedulingContext::new(schedule, rules).unwrap();

        let table = table_for(&base);
        assert_eq!(table.prior(2), 0);
        assert_eq!(table.prior(3), 1);
        assert_eq!(table.optimal_ids(), vec![1, 3]);

        let schedule = CachedAssignment::default().run(&base).unwrap();
        assert_eq!(schedule.calc_impact(), 2.0);
    }

    #[test]
    fn test_building_multiplier_is_read_not_written() {
        let mut west = appt(1, "8:00", 60, 10.0);
        west.location.building = "West Wing".to_string();
        let schedule = Schedule::try_new(
            vec![west, appt(2, "8:30", 60, 20.0)],
            vec![jose().with_building_weight("West Wing", 3.0)],
        )
        .unwrap();
        let base = context(schedule);

        let table = table_for(&base);
        assert_eq!(table.best_weight(), 30.0);

        let result = CachedAssignment::default().run(&base).unwrap();
        assert!(result.appointment(1).unwrap().is_assigned());
        assert_eq!(result.appointment(1).unwrap().priority, 10.0);
        assert_eq!(result.calc_impact(), 10.0);
    }

    #[test]
    fn test_restricted_interpreter_list() {
        let base = context(clinic_day());
        let result = CachedAssignment::default()
            .with_interpreters(vec![francois().key()])
            .run(&base)
            .unwrap();
        assert_eq!(result.calc_impact(), 20.0);
    }

    #[test]
    fn test_empty_table() {
        let schedule = Schedule::try_new(vec![], vec![jose()]).unwrap();
        let ctx = context(schedule);
        let table = table_for(&ctx);
        assert!(table.is_empty());
        assert!(table.optimal_ids().is_empty());
        assert_eq!(table.best_weight(), 0.0);
        assert_eq!(CachedAssignment::default().run(&ctx).unwrap().calc_impact(), 0.0);
    }
}
