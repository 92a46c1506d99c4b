//! Core data types for the interpreter coverage problem.

use pyo3::prelude::*;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::clock::ClockValue;
use crate::location::{Location, Point};

/// Appointment identifier. Positive for real appointments.
pub type AppointmentId = u32;

/// Reserved id of the synthetic zero-length appointment at the start of the day.
pub const ANCHOR_ID: AppointmentId = 0;

fn clock_arg(text: &str) -> PyResult<ClockValue> {
    ClockValue::parse(text).map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Errors raised while building a schedule. Both are data-integrity failures
/// and the run must not continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Duplicate appointment id: {0}")]
    DuplicateAppointmentId(AppointmentId),
    #[error("Appointment id {0} is reserved for the day-start anchor")]
    ReservedAppointmentId(AppointmentId),
}

/// The person being interpreted for.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patient {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub languages: BTreeSet<String>,
    #[pyo3(get, set)]
    pub gender: String,
}

impl Patient {
    pub fn speaking(id: &str, name: &str, languages: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            languages: languages.iter().map(|l| l.to_string()).collect(),
            gender: String::new(),
        }
    }

    pub fn speaks_any(&self, languages: &BTreeSet<String>) -> bool {
        !self.languages.is_disjoint(languages)
    }
}

#[pymethods]
impl Patient {
    #[new]
    #[pyo3(signature = (id, name, languages, gender=String::new()))]
    fn new(id: String, name: String, languages: BTreeSet<String>, gender: String) -> Self {
        Self {
            id,
            name,
            languages,
            gender,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Patient(id={:?}, name={:?}, languages={:?})",
            self.id, self.name, self.languages
        )
    }
}

/// Value identity of an interpreter. Two staff rows with the same name but
/// different shifts are different interpreters.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterpreterKey {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub shift_start: ClockValue,
    #[pyo3(get)]
    pub shift_finish: ClockValue,
}

impl fmt::Display for InterpreterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}-{})",
            self.name, self.shift_start, self.shift_finish
        )
    }
}

#[pymethods]
impl InterpreterKey {
    fn __str__(&self) -> String {
        self.to_string()
    }

    fn __repr__(&self) -> String {
        format!("InterpreterKey({:?})", self.to_string())
    }
}

/// A staff interpreter with a shift window.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Interpreter {
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub languages: BTreeSet<String>,
    #[pyo3(get, set)]
    pub gender: String,
    #[pyo3(get, set)]
    pub shift_start: ClockValue,
    #[pyo3(get, set)]
    pub shift_finish: ClockValue,
    /// Multiplier applied to priorities of appointments in a building.
    /// Buildings not listed count with weight 1.
    #[pyo3(get, set)]
    pub building_weights: BTreeMap<String, f64>,
}

impl Interpreter {
    pub fn on_shift(
        name: &str,
        languages: &[&str],
        shift_start: ClockValue,
        shift_finish: ClockValue,
    ) -> Self {
        Self {
            name: name.to_string(),
            languages: languages.iter().map(|l| l.to_string()).collect(),
            gender: String::new(),
            shift_start,
            shift_finish,
            building_weights: BTreeMap::new(),
        }
    }

    pub fn with_building_weight(mut self, building: &str, weight: f64) -> Self {
        self.building_weights.insert(building.to_string(), weight);
        self
    }

    pub fn key(&self) -> InterpreterKey {
        InterpreterKey {
            name: self.name.clone(),
            shift_start: self.shift_start,
            shift_finish: self.shift_finish,
        }
    }

    pub fn weight_for(&self, building: &str) -> f64 {
        self.building_weights.get(building).copied().unwrap_or(1.0)
    }

    /// Whether the appointment lies entirely inside the shift.
    pub fn covers(&self, appt: &Appointment) -> bool {
        appt.start >= self.shift_start && appt.finish <= self.shift_finish
    }

    pub fn can_interpret_for(&self, patient: &Patient) -> bool {
        patient.speaks_any(&self.languages)
    }

    /// Priority of `appt` scaled by this interpreter's building multiplier.
    pub fn effective_weight(&self, appt: &Appointment) -> f64 {
        appt.priority * self.weight_for(&appt.location.building)
    }
}

#[pymethods]
impl Interpreter {
    #[new]
    #[pyo3(signature = (name, languages, shift_start, shift_finish, gender=String::new(), building_weights=None))]
    fn new(
        name: String,
        languages: BTreeSet<String>,
        shift_start: &str,
        shift_finish: &str,
        gender: String,
        building_weights: Option<BTreeMap<String, f64>>,
    ) -> PyResult<Self> {
        Ok(Self {
            name,
            languages,
            gender,
            shift_start: clock_arg(shift_start)?,
            shift_finish: clock_arg(shift_finish)?,
            building_weights: building_weights.unwrap_or_default(),
        })
    }

    #[pyo3(name = "key")]
    fn py_key(&self) -> InterpreterKey {
        self.key()
    }

    fn __repr__(&self) -> String {
        format!(
            "Interpreter(name={:?}, shift={}-{}, languages={:?})",
            self.name, self.shift_start, self.shift_finish, self.languages
        )
    }
}

/// A time-boxed appointment needing an interpreter.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Appointment {
    #[pyo3(get)]
    pub id: AppointmentId,
    #[pyo3(get)]
    pub start: ClockValue,
    #[pyo3(get)]
    pub duration_minutes: i64,
    /// Always `start + duration_minutes`.
    #[pyo3(get)]
    pub finish: ClockValue,
    #[pyo3(get, set)]
    pub patient: Patient,
    #[pyo3(get, set)]
    pub location: Location,
    #[pyo3(get, set)]
    pub priority: f64,
    #[pyo3(get, set)]
    pub provider: String,
    #[pyo3(get, set)]
    pub interpreter: Option<InterpreterKey>,
}

impl Appointment {
    pub fn new(
        id: AppointmentId,
        start: ClockValue,
        duration_minutes: i64,
        patient: Patient,
        location: Location,
        priority: f64,
    ) -> Self {
        Self {
            id,
            start,
            duration_minutes,
            finish: start.plus_minutes(duration_minutes),
            patient,
            location,
            priority,
            provider: String::new(),
            interpreter: None,
        }
    }

    /// Zero-length appointment at midnight at the origin whose patient speaks
    /// every language in `languages`. Every job list starts with it.
    pub fn anchor(languages: BTreeSet<String>) -> Self {
        let patient = Patient {
            id: String::new(),
            name: "day start".to_string(),
            languages,
            gender: String::new(),
        };
        Self::new(
            ANCHOR_ID,
            ClockValue::MIDNIGHT,
            0,
            patient,
            Location::at(Point::ORIGIN),
            0.0,
        )
    }

    pub fn with_interpreter(mut self, key: InterpreterKey) -> Self {
        self.interpreter = Some(key);
        self
    }

    pub fn is_anchor(&self) -> bool {
        self.id == ANCHOR_ID
    }

    pub fn is_assigned(&self) -> bool {
        self.interpreter.is_some()
    }
}

#[pymethods]
impl Appointment {
    #[new]
    #[pyo3(signature = (id, start, duration_minutes, patient, location, priority=1.0, provider=String::new(), interpreter=None))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        id: AppointmentId,
        start: &str,
        duration_minutes: i64,
        patient: Patient,
        location: Location,
        priority: f64,
        provider: String,
        interpreter: Option<InterpreterKey>,
    ) -> PyResult<Self> {
        let mut appt = Self::new(
            id,
            clock_arg(start)?,
            duration_minutes,
            patient,
            location,
            priority,
        );
        appt.provider = provider;
        appt.interpreter = interpreter;
        Ok(appt)
    }

    fn __repr__(&self) -> String {
        format!(
            "Appointment(id={}, {}-{}, priority={}, interpreter={})",
            self.id,
            self.start,
            self.finish,
            self.priority,
            self.interpreter
                .as_ref()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "None".to_string())
        )
    }
}

/// Appointments grouped under one interpreter, or the unassigned bucket when
/// `interpreter` is `None`.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageGroup {
    #[pyo3(get)]
    pub interpreter: Option<InterpreterKey>,
    #[pyo3(get)]
    pub appointment_ids: Vec<AppointmentId>,
    #[pyo3(get)]
    pub impact: f64,
    #[pyo3(get)]
    pub count: usize,
}

impl CoverageGroup {
    fn empty(interpreter: Option<InterpreterKey>) -> Self {
        Self {
            interpreter,
            appointment_ids: Vec::new(),
            impact: 0.0,
            count: 0,
        }
    }

    fn add(&mut self, appt: &Appointment) {
        self.appointment_ids.push(appt.id);
        self.impact += appt.priority;
        self.count += 1;
    }
}

/// The dataset for one day: appointments plus interpreters.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    /// Sorted by start; equal starts keep input order.
    #[pyo3(get)]
    pub appointments: Vec<Appointment>,
    #[pyo3(get)]
    pub interpreters: Vec<Interpreter>,
    /// Impact committed by the current run.
    #[pyo3(get)]
    pub impact: f64,
    /// Sum of all priorities, fixed at construction.
    #[pyo3(get)]
    pub total_impact: f64,
}

impl Schedule {
    pub fn try_new(
        mut appointments: Vec<Appointment>,
        interpreters: Vec<Interpreter>,
    ) -> Result<Self, ScheduleError> {
        check_ids(&appointments)?;
        appointments.sort_by_key(|a| a.start);
        let total_impact = appointments.iter().map(|a| a.priority).sum();
        Ok(Self {
            appointments,
            interpreters,
            impact: 0.0,
            total_impact,
        })
    }

    /// Re-check id uniqueness; fields are writable from Python.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        check_ids(&self.appointments)
    }

    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    /// Sum of priorities of appointments that carry an interpreter.
    pub fn calc_impact(&self) -> f64 {
        self.appointments
            .iter()
            .filter(|a| a.is_assigned())
            .map(|a| a.priority)
            .sum()
    }

    /// Per-interpreter coverage followed by the unassigned bucket.
    pub fn coverage(&self) -> Vec<CoverageGroup> {
        let mut groups: Vec<CoverageGroup> = Vec::new();
        let mut seen: FxHashSet<InterpreterKey> = FxHashSet::default();
        for interpreter in &self.interpreters {
            let key = interpreter.key();
            if seen.insert(key.clone()) {
                groups.push(CoverageGroup::empty(Some(key)));
            }
        }
        let mut unassigned = CoverageGroup::empty(None);

        for appt in &self.appointments {
            let Some(key) = &appt.interpreter else {
                unassigned.add(appt);
                continue;
            };
            match groups
                .iter_mut()
                .find(|g| g.interpreter.as_ref() == Some(key))
            {
                Some(group) => group.add(appt),
                None => {
                    let mut group = CoverageGroup::empty(Some(key.clone()));
                    group.add(appt);
                    groups.push(group);
                }
            }
        }
        groups.push(unassigned);
        groups
    }
}

fn check_ids(appointments: &[Appointment]) -> Result<(), ScheduleError> {
    let mut ids = FxHashSet::default();
    for appt in appointments {
        if appt.id == ANCHOR_ID {
            return Err(ScheduleError::ReservedAppointmentId(appt.id));
        }
        if !ids.insert(appt.id) {
            return Err(ScheduleError::DuplicateAppointmentId(appt.id));
        }
    }
    Ok(())
}

#[pymethods]
impl Schedule {
    #[new]
    fn py_new(appointments: Vec<Appointment>, interpreters: Vec<Interpreter>) -> PyResult<Self> {
        Self::try_new(appointments, interpreters)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[pyo3(name = "calc_impact")]
    fn py_calc_impact(&self) -> f64 {
        self.calc_impact()
    }

    #[pyo3(name = "coverage")]
    fn py_coverage(&self) -> Vec<CoverageGroup> {
        self.coverage()
    }

    fn __repr__(&self) -> String {
        format!(
            "Schedule(appointments={}, interpreters={}, covered={}/{})",
            self.appointments.len(),
            self.interpreters.len(),
            self.calc_impact(),
            self.total_impact
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{appt, spanish_patient};

    #[test]
    fn test_finish_is_start_plus_duration() {
        let a = appt(1, "8:25", 40, 30.0);
        assert_eq!(a.finish, a.start.plus_minutes(a.duration_minutes));
        assert_eq!(a.finish.to_string(), "09:05");
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let result = Schedule::try_new(
            vec![appt(1, "8:00", 10, 1.0), appt(1, "9:00", 10, 1.0)],
            vec![],
        );
        assert_eq!(result.unwrap_err(), ScheduleError::DuplicateAppointmentId(1));
    }

    #[test]
    fn test_anchor_id_is_reserved() {
        let result = Schedule::try_new(vec![appt(0, "8:00", 10, 1.0)], vec![]);
        assert_eq!(result.unwrap_err(), ScheduleError::ReservedAppointmentId(0));
    }

    #[test]
    fn test_appointments_sorted_by_start_stably() {
        let schedule = Schedule::try_new(
            vec![
                appt(3, "9:00", 10, 1.0),
                appt(1, "8:00", 10, 1.0),
                appt(2, "9:00", 10, 1.0),
            ],
            vec![],
        )
        .unwrap();
        let ids: Vec<_> = schedule.appointments.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(schedule.total_impact, 3.0);
    }

    #[test]
    fn test_interpreter_shift_cover() {
        let interp = Interpreter::on_shift(
            "Francois Thames",
            &["French", "English"],
            ClockValue::from_hm(8, 30),
            ClockValue::from_hm(12, 30),
        );
        assert!(interp.covers(&appt(4, "9:45", 40, 1.0)));
        assert!(!interp.covers(&appt(5, "12:45", 40, 1.0)));
        // finishing exactly at shift end is allowed
        assert!(interp.covers(&appt(6, "11:50", 40, 1.0)));
    }

    #[test]
    fn test_effective_weight_uses_building_multiplier() {
        let interp = Interpreter::on_shift(
            "Jose Gomez",
            &["Spanish"],
            ClockValue::from_hm(8, 0),
            ClockValue::from_hm(16, 30),
        )
        .with_building_weight("West Wing", 2.5);
        let mut a = appt(1, "8:00", 10, 10.0);
        assert_eq!(interp.effective_weight(&a), 10.0);
        a.location.building = "West Wing".to_string();
        assert_eq!(interp.effective_weight(&a), 25.0);
        assert_eq!(a.priority, 10.0);
    }

    #[test]
    fn test_language_match() {
        let interp = Interpreter::on_shift(
            "Janet Gomez",
            &["Spanish", "English"],
            ClockValue::from_hm(8, 0),
            ClockValue::from_hm(17, 0),
        );
        assert!(interp.can_interpret_for(&spanish_patient()));
        assert!(!interp.can_interpret_for(&Patient::speaking("p9", "Marie", &["French"])));
    }

    #[test]
    fn test_coverage_breakdown_includes_unassigned_bucket() {
        let interp = Interpreter::on_shift(
            "Jose Gomez",
            &["Spanish"],
            ClockValue::from_hm(8, 0),
            ClockValue::from_hm(16, 30),
        );
        let key = interp.key();
        let schedule = Schedule::try_new(
            vec![
                appt(1, "8:00", 10, 100.0).with_interpreter(key.clone()),
                appt(2, "8:25", 40, 30.0),
                appt(3, "8:45", 40, 20.0),
            ],
            vec![interp],
        )
        .unwrap();

        let groups = schedule.coverage();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].interpreter, Some(key));
        assert_eq!(groups[0].appointment_ids, vec![1]);
        assert_eq!(groups[0].impact, 100.0);
        assert_eq!(groups[1].interpreter, None);
        assert_eq!(groups[1].count, 2);
        assert_eq!(groups[1].impact, 50.0);
        assert_eq!(schedule.calc_impact(), 100.0);
    }
}
