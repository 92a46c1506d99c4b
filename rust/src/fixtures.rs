//! Shared test data.

use crate::clock::ClockValue;
use crate::location::Location;
use crate::models::{Appointment, AppointmentId, Interpreter, Patient, Schedule};
use crate::scheduler::SchedulingContext;
use crate::config::CompatibilityRules;

pub fn t(text: &str) -> ClockValue {
    ClockValue::parse(text).unwrap()
}

pub fn spanish_patient() -> Patient {
    Patient::speaking("1", "Joe Spanish", &["Spanish"])
}

pub fn french_patient() -> Patient {
    Patient::speaking("2", "John French", &["French"])
}

pub fn building(name: &str) -> Location {
    Location {
        x: 0.0,
        y: 0.0,
        building: name.to_string(),
        clinic: "Radiology".to_string(),
    }
}

/// Spanish-speaking appointment at the origin.
pub fn appt(id: AppointmentId, start: &str, duration: i64, priority: f64) -> Appointment {
    Appointment::new(
        id,
        t(start),
        duration,
        spanish_patient(),
        building("Central Hospital"),
        priority,
    )
}

pub fn french_appt(id: AppointmentId, start: &str, duration: i64, priority: f64) -> Appointment {
    Appointment::new(
        id,
        t(start),
        duration,
        french_patient(),
        building("West Wing"),
        priority,
    )
}

pub fn jose() -> Interpreter {
    Interpreter::on_shift("Jose Gomez", &["Spanish", "English"], t("8:00"), t("16:30"))
}

pub fn janet() -> Interpreter {
    Interpreter::on_shift("Janet Gomez", &["Spanish", "English"], t("8:00"), t("17:00"))
}

pub fn francois() -> Interpreter {
    Interpreter::on_shift("Francois Thames", &["French", "English"], t("8:30"), t("12:30"))
}

/// Three appointments worth 100 + 30 + 20 and three interpreters who can
/// cover all of them.
pub fn clinic_day() -> Schedule {
    Schedule::try_new(
        vec![
            appt(1, "8:00", 10, 100.0),
            appt(2, "8:25", 40, 30.0),
            french_appt(3, "8:45", 40, 20.0),
        ],
        vec![jose(), janet(), francois()],
    )
    .unwrap()
}

/// One interpreter, eight overlapping Spanish appointments whose ids follow
/// finish order.
pub fn busy_morning() -> Schedule {
    Schedule::try_new(
        vec![
            appt(1, "8:00", 15, 1.0),
            appt(2, "8:10", 30, 2.0),
            appt(3, "8:30", 20, 3.0),
            appt(4, "8:45", 35, 4.0),
            appt(5, "9:30", 35, 5.0),
            appt(6, "9:00", 75, 6.0),
            appt(7, "8:35", 150, 7.0),
            appt(8, "8:30", 180, 8.0),
        ],
        vec![Interpreter::on_shift("Inter", &["Spanish", "English"], t("8:00"), t("17:00"))],
    )
    .unwrap()
}

pub fn context(schedule: Schedule) -> SchedulingContext {
    SchedulingContext::new(schedule, CompatibilityRules::default()).unwrap()
}
