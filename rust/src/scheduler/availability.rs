//! Availability index: which open appointments each interpreter could take next.
//!
//! Rebuilt from scratch on every query against the current ledger state.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::clock::ClockValue;
use crate::models::{AppointmentId, InterpreterKey};

use super::ledger::{Ledger, LedgerError};

/// Which side of the reference time the index looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchDirection {
    /// Appointments starting at or after the reference, earliest first.
    #[default]
    Forward,
    /// Appointments starting at or before the reference, latest first.
    Backward,
}

#[derive(Clone, Debug, Default)]
pub struct AvailabilityIndex {
    time_slots: BTreeMap<ClockValue, Vec<AppointmentId>>,
    valid_choices: FxHashMap<InterpreterKey, Vec<AppointmentId>>,
}

impl AvailabilityIndex {
    /// Rebuild the time slots from `pool` and the valid choices of each
    /// interpreter in `interpreters`.
    ///
    /// A valid choice starts no earlier than the interpreter's last job
    /// finishes and passes `can_assign` against that job.
    pub fn rebuild(
        &mut self,
        ledger: &Ledger,
        reference: ClockValue,
        pool: &[AppointmentId],
        direction: SearchDirection,
        interpreters: &[InterpreterKey],
    ) -> Result<(), LedgerError> {
        self.time_slots.clear();
        self.valid_choices.clear();

        for &id in pool {
            let start = ledger.appointment(id)?.start;
            let in_window = match direction {
                SearchDirection::Forward => start >= reference,
                SearchDirection::Backward => start <= reference,
            };
            if in_window {
                self.time_slots.entry(start).or_default().push(id);
            }
        }

        let slots: Vec<(&ClockValue, &Vec<AppointmentId>)> = match direction {
            SearchDirection::Forward => self.time_slots.iter().collect(),
            SearchDirection::Backward => self.time_slots.iter().rev().collect(),
        };

        let mut valid_choices = FxHashMap::default();
        for key in interpreters {
            let available_from = ledger.last_job(key)?.finish;
            let mut choices = Vec::new();
            for (start, ids) in &slots {
                if **start < available_from {
                    continue;
                }
                for &id in ids.iter() {
                    if ledger.can_assign(key, id, None)? {
                        choices.push(id);
                    }
                }
            }
            valid_choices.insert(key.clone(), choices);
        }
        self.valid_choices = valid_choices;
        Ok(())
    }

    pub fn time_slots(&self) -> &BTreeMap<ClockValue, Vec<AppointmentId>> {
        &self.time_slots
    }

    pub fn time_slot(&self, start: ClockValue) -> &[AppointmentId] {
        self.time_slots
            .get(&start)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn valid_choices(&self, key: &InterpreterKey) -> &[AppointmentId] {
        self.valid_choices
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The open appointment the interpreter could reach soonest, first found
    /// on ties.
    pub fn next_valid_choice(
        &mut self,
        ledger: &Ledger,
        key: &InterpreterKey,
        reference: ClockValue,
        direction: SearchDirection,
    ) -> Result<Option<AppointmentId>, LedgerError> {
        let pool = ledger.unassigned_in_order();
        self.rebuild(ledger, reference, &pool, direction, std::slice::from_ref(key))?;

        let last = ledger.last_job(key)?;
        let mut best: Option<(ClockValue, AppointmentId)> = None;
        for &id in self.valid_choices(key) {
            let arrival = ledger.calc_arrival(last, ledger.appointment(id)?);
            if best.map_or(true, |(soonest, _)| arrival < soonest) {
                best = Some((arrival, id));
            }
        }
        Ok(best.map(|(_, id)| id))
    }
}
