//! Planar coordinates and appointment locations.

use pyo3::prelude::*;

/// A point on the site map. Distances are straight-line.
#[pyclass]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn at(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[pymethods]
impl Point {
    #[new]
    #[pyo3(signature = (x=0.0, y=0.0))]
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[pyo3(name = "distance_to")]
    fn py_distance_to(&self, other: &Point) -> f64 {
        self.distance_to(other)
    }

    fn __repr__(&self) -> String {
        format!("Point(x={}, y={})", self.x, self.y)
    }
}

/// Where an appointment takes place.
///
/// `building` keys the interpreter's weight table.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Location {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub building: String,
    #[pyo3(get, set)]
    pub clinic: String,
}

impl Location {
    /// An unnamed location at `point`.
    pub fn at(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            ..Self::default()
        }
    }

    pub fn point(&self) -> Point {
        Point::at(self.x, self.y)
    }

    pub fn distance_to(&self, other: &Location) -> f64 {
        self.point().distance_to(&other.point())
    }
}

#[pymethods]
impl Location {
    #[new]
    #[pyo3(signature = (x=0.0, y=0.0, building=String::new(), clinic=String::new()))]
    fn new(x: f64, y: f64, building: String, clinic: String) -> Self {
        Self {
            x,
            y,
            building,
            clinic,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Location(x={}, y={}, building={:?}, clinic={:?})",
            self.x, self.y, self.building, self.clinic
        )
    }
}
