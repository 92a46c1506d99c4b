//! Assignment ledger.
//!
//! Tracks, per interpreter, the ordered job list and current location, plus the
//! pool of appointments still waiting for an interpreter. All assignments go
//! through [`Ledger::assign`], which enforces the compatibility rules.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

use crate::clock::ClockValue;
use crate::config::CompatibilityRules;
use crate::location::{Location, Point};
use crate::models::{
    Appointment, AppointmentId, Interpreter, InterpreterKey, Schedule, ScheduleError, ANCHOR_ID,
};

/// Errors raised by ledger operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Interpreter {interpreter} cannot take appointment {appointment}")]
    CannotAssign {
        interpreter: String,
        appointment: AppointmentId,
    },
    #[error("Appointment {0} is not waiting for an interpreter")]
    NotUnassigned(AppointmentId),
    #[error("Unknown interpreter: {0}")]
    UnknownInterpreter(String),
    #[error("Unknown appointment: {0}")]
    UnknownAppointment(AppointmentId),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

fn chronological<'a>(a: &'a Appointment, b: &'a Appointment) -> (&'a Appointment, &'a Appointment) {
    if (a.start, a.finish, a.id) <= (b.start, b.finish, b.id) {
        (a, b)
    } else {
        (b, a)
    }
}

/// Earliest time an interpreter finishing the earlier of `a` and `b` can be
/// at the later one.
pub fn calc_arrival(a: &Appointment, b: &Appointment, rules: &CompatibilityRules) -> ClockValue {
    let (earlier, later) = chronological(a, b);
    let travel = rules.travel_minutes(&earlier.location, &later.location);
    earlier.finish.plus_minutes(travel).max(later.start)
}

/// Whether one interpreter can attend both appointments, in either order.
pub fn are_compatible(a: &Appointment, b: &Appointment, rules: &CompatibilityRules) -> bool {
    let (_, later) = chronological(a, b);
    calc_arrival(a, b, rules) <= later.start.plus_minutes(rules.late_allowance_minutes)
}

#[derive(Clone, Debug)]
pub struct Ledger {
    original: Arc<Schedule>,
    rules: CompatibilityRules,
    schedule: Schedule,
    /// Stable-sorted by shift start.
    interpreters: Vec<Interpreter>,
    slots: FxHashMap<InterpreterKey, usize>,
    positions: FxHashMap<AppointmentId, usize>,
    anchor: Appointment,
    /// Per slot, job ids in start order. Always begins with the anchor.
    jobs: Vec<Vec<AppointmentId>>,
    locations: Vec<Location>,
    unassigned: FxHashSet<AppointmentId>,
    language_index: BTreeMap<String, Vec<AppointmentId>>,
}

impl Ledger {
    pub fn new(schedule: Schedule, rules: CompatibilityRules) -> Result<Self, LedgerError> {
        schedule.validate()?;
        Ok(Self::build(Arc::new(schedule), rules))
    }

    fn build(original: Arc<Schedule>, rules: CompatibilityRules) -> Self {
        let mut schedule = (*original).clone();
        schedule.impact = 0.0;

        let mut interpreters: Vec<Interpreter> = Vec::with_capacity(schedule.interpreters.len());
        let mut seen = FxHashSet::default();
        for interpreter in &schedule.interpreters {
            if seen.insert(interpreter.key()) {
                interpreters.push(interpreter.clone());
            }
        }
        interpreters.sort_by_key(|i| i.shift_start);
        let slots: FxHashMap<InterpreterKey, usize> = interpreters
            .iter()
            .enumerate()
            .map(|(slot, i)| (i.key(), slot))
            .collect();

        let positions = schedule
            .appointments
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.id, idx))
            .collect();

        let languages: BTreeSet<String> = schedule
            .appointments
            .iter()
            .flat_map(|a| a.patient.languages.iter().cloned())
            .collect();
        let anchor = Appointment::anchor(languages);

        let mut unassigned = FxHashSet::default();
        let mut language_index: BTreeMap<String, Vec<AppointmentId>> = BTreeMap::new();
        let mut jobs = vec![vec![ANCHOR_ID]; interpreters.len()];
        let mut locations = vec![Location::at(Point::ORIGIN); interpreters.len()];

        for appt in &schedule.appointments {
            match appt.interpreter.as_ref().and_then(|key| slots.get(key)) {
                // Appointments are in start order, so pushing keeps job lists sorted.
                Some(&slot) => {
                    jobs[slot].push(appt.id);
                    locations[slot] = appt.location.clone();
                }
                None if appt.interpreter.is_none() => {
                    unassigned.insert(appt.id);
                    for language in &appt.patient.languages {
                        language_index
                            .entry(language.clone())
                            .or_default()
                            .push(appt.id);
                    }
                }
                // Pre-assigned to someone outside this schedule: left as is.
                None => {}
            }
        }

        Self {
            original,
            rules,
            schedule,
            interpreters,
            slots,
            positions,
            anchor,
            jobs,
            locations,
            unassigned,
            language_index,
        }
    }

    /// Fresh ledger in the state right after construction.
    pub fn reset(&self) -> Ledger {
        Self::build(Arc::clone(&self.original), self.rules)
    }

    pub fn rules(&self) -> &CompatibilityRules {
        &self.rules
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }

    /// Running impact committed since the last reset.
    pub fn impact(&self) -> f64 {
        self.schedule.impact
    }

    pub fn interpreters(&self) -> &[Interpreter] {
        &self.interpreters
    }

    pub fn interpreter_keys(&self) -> Vec<InterpreterKey> {
        self.interpreters.iter().map(|i| i.key()).collect()
    }

    fn slot(&self, key: &InterpreterKey) -> Result<usize, LedgerError> {
        self.slots
            .get(key)
            .copied()
            .ok_or_else(|| LedgerError::UnknownInterpreter(key.to_string()))
    }

    pub fn interpreter(&self, key: &InterpreterKey) -> Result<&Interpreter, LedgerError> {
        Ok(&self.interpreters[self.slot(key)?])
    }

    pub fn anchor(&self) -> &Appointment {
        &self.anchor
    }

    pub fn appointment(&self, id: AppointmentId) -> Result<&Appointment, LedgerError> {
        if id == ANCHOR_ID {
            return Ok(&self.anchor);
        }
        self.positions
            .get(&id)
            .map(|&idx| &self.schedule.appointments[idx])
            .ok_or(LedgerError::UnknownAppointment(id))
    }

    pub fn appointments(&self, ids: &[AppointmentId]) -> Result<Vec<&Appointment>, LedgerError> {
        ids.iter().map(|&id| self.appointment(id)).collect()
    }

    /// The subset of `ids` still waiting for an interpreter.
    pub fn open_appointments(&self, ids: &[AppointmentId]) -> Vec<&Appointment> {
        ids.iter()
            .filter(|id| self.unassigned.contains(id))
            .filter_map(|&id| self.appointment(id).ok())
            .collect()
    }

    pub fn jobs(&self, key: &InterpreterKey) -> Result<&[AppointmentId], LedgerError> {
        Ok(&self.jobs[self.slot(key)?])
    }

    pub fn last_job(&self, key: &InterpreterKey) -> Result<&Appointment, LedgerError> {
        let slot = self.slot(key)?;
        let id = self.jobs[slot].last().copied().unwrap_or(ANCHOR_ID);
        self.appointment(id)
    }

    pub fn location(&self, key: &InterpreterKey) -> Result<&Location, LedgerError> {
        Ok(&self.locations[self.slot(key)?])
    }

    pub fn is_unassigned(&self, id: AppointmentId) -> bool {
        self.unassigned.contains(&id)
    }

    pub fn unassigned_count(&self) -> usize {
        self.unassigned.len()
    }

    /// Open appointments in schedule order.
    pub fn unassigned_in_order(&self) -> Vec<AppointmentId> {
        self.schedule
            .appointments
            .iter()
            .map(|a| a.id)
            .filter(|id| self.unassigned.contains(id))
            .collect()
    }

    /// Every appointment that was open at construction in a given language.
    pub fn language_candidates(&self, language: &str) -> &[AppointmentId] {
        self.language_index
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Open appointments in any of the interpreter's languages starting at or
    /// after `earliest`, in schedule order.
    pub fn candidates_for(
        &self,
        key: &InterpreterKey,
        earliest: ClockValue,
    ) -> Result<Vec<AppointmentId>, LedgerError> {
        let interpreter = self.interpreter(key)?;
        let mut seen = FxHashSet::default();
        let mut ids = Vec::new();
        for language in &interpreter.languages {
            for &id in self.language_candidates(language) {
                if self.unassigned.contains(&id)
                    && self.appointment(id)?.start >= earliest
                    && seen.insert(id)
                {
                    ids.push(id);
                }
            }
        }
        ids.sort_by_key(|id| self.positions.get(id).copied().unwrap_or(usize::MAX));
        Ok(ids)
    }

    pub fn calc_arrival(&self, a: &Appointment, b: &Appointment) -> ClockValue {
        calc_arrival(a, b, &self.rules)
    }

    pub fn are_compatible(&self, a: &Appointment, b: &Appointment) -> bool {
        are_compatible(a, b, &self.rules)
    }

    /// Timing, language and shift check for one interpreter doing both
    /// appointments. The anchor is inside every shift.
    pub fn is_pair_assignable(
        &self,
        interpreter: &Interpreter,
        candidate: &Appointment,
        reference: &Appointment,
    ) -> bool {
        let in_shift = |appt: &Appointment| appt.is_anchor() || interpreter.covers(appt);
        self.are_compatible(candidate, reference)
            && interpreter.can_interpret_for(&candidate.patient)
            && interpreter.can_interpret_for(&reference.patient)
            && in_shift(candidate)
            && in_shift(reference)
    }

    /// Whether `candidate` is open and can be done alongside `reference`
    /// (default: the interpreter's last job).
    pub fn can_assign(
        &self,
        key: &InterpreterKey,
        candidate: AppointmentId,
        reference: Option<AppointmentId>,
    ) -> Result<bool, LedgerError> {
        let interpreter = self.interpreter(key)?;
        let appt = self.appointment(candidate)?;
        let reference = match reference {
            Some(id) => self.appointment(id)?,
            None => self.last_job(key)?,
        };
        Ok(self.is_unassigned(candidate) && self.is_pair_assignable(interpreter, appt, reference))
    }

    /// Whether `candidate` is open and fits between its neighbours once
    /// inserted into the interpreter's job list.
    pub fn can_insert(
        &self,
        key: &InterpreterKey,
        candidate: AppointmentId,
    ) -> Result<bool, LedgerError> {
        let slot = self.slot(key)?;
        let appt = self.appointment(candidate)?;
        Ok(self.is_unassigned(candidate) && self.fits_between(slot, appt)?)
    }

    fn start_of(&self, id: AppointmentId) -> ClockValue {
        self.appointment(id)
            .map(|a| a.start)
            .unwrap_or(ClockValue::MIDNIGHT)
    }

    /// Position after every job starting at or before `appt`.
    fn insertion_point(&self, slot: usize, appt: &Appointment) -> usize {
        self.jobs[slot].partition_point(|&id| self.start_of(id) <= appt.start)
    }

    fn fits_between(&self, slot: usize, appt: &Appointment) -> Result<bool, LedgerError> {
        let interpreter = &self.interpreters[slot];
        let jobs = &self.jobs[slot];
        let pos = self.insertion_point(slot, appt);
        if pos > 0 {
            let prev = self.appointment(jobs[pos - 1])?;
            if !self.is_pair_assignable(interpreter, appt, prev) {
                return Ok(false);
            }
        }
        if let Some(&next) = jobs.get(pos) {
            let next = self.appointment(next)?;
            if !self.is_pair_assignable(interpreter, appt, next) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Commit one appointment to an interpreter.
    ///
    /// For an appointment after every existing job this is exactly
    /// `can_assign` against the last job; earlier appointments are checked
    /// against both neighbours.
    pub fn assign(&mut self, key: &InterpreterKey, id: AppointmentId) -> Result<(), LedgerError> {
        let slot = self.slot(key)?;
        let appt = self.appointment(id)?.clone();
        if !self.is_unassigned(id) {
            return Err(LedgerError::NotUnassigned(id));
        }
        if !self.fits_between(slot, &appt)? {
            return Err(LedgerError::CannotAssign {
                interpreter: key.to_string(),
                appointment: id,
            });
        }

        let pos = self.insertion_point(slot, &appt);
        self.jobs[slot].insert(pos, id);
        self.locations[slot] = appt.location.clone();
        if let Some(&idx) = self.positions.get(&id) {
            self.schedule.appointments[idx].interpreter = Some(key.clone());
        }
        self.unassigned.remove(&id);
        self.schedule.impact += appt.priority;
        Ok(())
    }

    /// Assign in order, stopping at the first failure. Earlier assignments
    /// from the batch stay committed.
    pub fn group_assign(
        &mut self,
        key: &InterpreterKey,
        ids: &[AppointmentId],
    ) -> Result<(), LedgerError> {
        for &id in ids {
            self.assign(key, id)?;
        }
        Ok(())
    }
}
