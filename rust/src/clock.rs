//! Minute-resolution wall-clock values for appointments and shifts.
//!
//! Values count minutes from midnight of the scheduling day. Adding minutes never
//! wraps at 24:00, so ordering stays total for anything that runs past midnight.

use chrono::{NaiveTime, Timelike};
use pyo3::prelude::*;
use std::fmt;
use std::str::FromStr;

const CLOCK_FORMAT: &str = "%H:%M";
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Error returned when a clock string is not `H:MM` / `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockParseError(pub String);

impl fmt::Display for ClockParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid clock value {:?}, expected HH:MM", self.0)
    }
}

impl std::error::Error for ClockParseError {}

/// A time of day with minute resolution.
#[pyclass]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockValue {
    minutes: i64,
}

impl ClockValue {
    pub const MIDNIGHT: ClockValue = ClockValue { minutes: 0 };

    pub const fn from_hm(hours: i64, minutes: i64) -> Self {
        Self {
            minutes: hours * 60 + minutes,
        }
    }

    /// Parses `H:MM` / `HH:MM`. Hours from 24 up are read as the next day,
    /// which is how [`fmt::Display`] writes values past midnight.
    pub fn parse(text: &str) -> Result<Self, ClockParseError> {
        let text = text.trim();
        let invalid = || ClockParseError(text.to_string());
        if let Ok(time) = NaiveTime::parse_from_str(text, CLOCK_FORMAT) {
            return Ok(Self::from_hm(time.hour() as i64, time.minute() as i64));
        }
        let (hours, rest) = text.split_once(':').ok_or_else(invalid)?;
        let hours: i64 = hours.parse().map_err(|_| invalid())?;
        if hours < 24 {
            return Err(invalid());
        }
        let time =
            NaiveTime::parse_from_str(&format!("00:{rest}"), CLOCK_FORMAT).map_err(|_| invalid())?;
        Ok(Self::from_hm(hours, time.minute() as i64))
    }

    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    /// Shift this value forward in place.
    pub fn add_minutes(&mut self, minutes: i64) {
        self.minutes += minutes;
    }

    /// Copy of this value shifted forward.
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        let mut shifted = *self;
        shifted.add_minutes(minutes);
        shifted
    }

    /// Signed minutes from `self` to `other`.
    pub fn minutes_until(&self, other: &ClockValue) -> i64 {
        other.minutes - self.minutes
    }

    /// The time of day this value falls on, wrapping past midnight.
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        let of_day = self.minutes.rem_euclid(MINUTES_PER_DAY) as u32;
        NaiveTime::from_hms_opt(of_day / 60, of_day % 60, 0)
    }
}

impl fmt::Display for ClockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes >= MINUTES_PER_DAY {
            return write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60);
        }
        match self.to_naive_time() {
            Some(time) => write!(f, "{}", time.format(CLOCK_FORMAT)),
            None => write!(f, "{}min", self.minutes),
        }
    }
}

impl FromStr for ClockValue {
    type Err = ClockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[pymethods]
impl ClockValue {
    #[new]
    fn py_new(text: &str) -> PyResult<Self> {
        Self::parse(text).map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[getter(minutes)]
    fn py_minutes(&self) -> i64 {
        self.minutes
    }

    #[getter]
    fn time(&self) -> Option<NaiveTime> {
        self.to_naive_time()
    }

    fn __str__(&self) -> String {
        self.to_string()
    }

    fn __repr__(&self) -> String {
        format!("ClockValue({:?})", self.to_string())
    }
}
