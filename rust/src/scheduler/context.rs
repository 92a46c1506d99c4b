//! Scheduling context: the ledger plus its availability index.

use crate::clock::ClockValue;
use crate::config::CompatibilityRules;
use crate::models::{AppointmentId, InterpreterKey, Schedule};

use super::availability::{AvailabilityIndex, SearchDirection};
use super::ledger::{Ledger, LedgerError};

/// Everything a strategy needs for one run.
///
/// A base context is never mutated by strategies: each run starts from
/// [`SchedulingContext::reset`] and works on its own copy.
#[derive(Clone, Debug)]
pub struct SchedulingContext {
    ledger: Ledger,
    availability: AvailabilityIndex,
}

impl SchedulingContext {
    pub fn new(schedule: Schedule, rules: CompatibilityRules) -> Result<Self, LedgerError> {
        Ok(Self {
            ledger: Ledger::new(schedule, rules)?,
            availability: AvailabilityIndex::default(),
        })
    }

    /// A fresh context in the post-construction state.
    pub fn reset(&self) -> Self {
        Self {
            ledger: self.ledger.reset(),
            availability: AvailabilityIndex::default(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn availability(&self) -> &AvailabilityIndex {
        &self.availability
    }

    /// Recompute valid choices for every interpreter.
    pub fn update_valid_choices(
        &mut self,
        reference: ClockValue,
        pool: &[AppointmentId],
        direction: SearchDirection,
    ) -> Result<(), LedgerError> {
        let keys = self.ledger.interpreter_keys();
        self.availability
            .rebuild(&self.ledger, reference, pool, direction, &keys)
    }

    /// Recompute valid choices for one interpreter only.
    pub fn update_valid_choices_for(
        &mut self,
        key: &InterpreterKey,
        reference: ClockValue,
        pool: &[AppointmentId],
        direction: SearchDirection,
    ) -> Result<(), LedgerError> {
        self.availability.rebuild(
            &self.ledger,
            reference,
            pool,
            direction,
            std::slice::from_ref(key),
        )
    }

    pub fn valid_choices(&self, key: &InterpreterKey) -> &[AppointmentId] {
        self.availability.valid_choices(key)
    }

    pub fn next_valid_choice(
        &mut self,
        key: &InterpreterKey,
        reference: ClockValue,
        direction: SearchDirection,
    ) -> Result<Option<AppointmentId>, LedgerError> {
        self.availability
            .next_valid_choice(&self.ledger, key, reference, direction)
    }

    pub fn snapshot(&self) -> Schedule {
        self.ledger.schedule().clone()
    }

    pub fn into_schedule(self) -> Schedule {
        self.ledger.into_schedule()
    }
}
