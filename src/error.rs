//! Errors from loading coefficient tables and from evaluating the model.

use thiserror::Error;

/// Errors associated with reading a `WMM.COF` coefficient table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoefficientError {
    #[error("The coefficient table is empty")]
    Empty,

    #[error("Could not read a model epoch from the header line '{0}'")]
    InvalidEpoch(String),

    #[error("Line {line}: expected 6 columns (n m gnm hnm dgnm dhnm), but found {found}")]
    ColumnCount { line: usize, found: usize },

    #[error("Line {line}: '{value}' is not a valid degree or order")]
    InvalidIndex { line: usize, value: String },

    #[error("Line {line}: '{value}' is not a finite number")]
    NotANumber { line: usize, value: String },

    #[error("Line {line}: degree {n} is out of range (1 <= n <= 12)")]
    DegreeOutOfRange { line: usize, n: usize },

    #[error("Line {line}: order {m} is larger than degree {n}")]
    OrderExceedsDegree { line: usize, n: usize, m: usize },

    #[error("Line {line}: degree {n} order {m} was already given")]
    Duplicate { line: usize, n: usize, m: usize },

    #[error("No coefficients were given for degree {n} order {m}")]
    Missing { n: usize, m: usize },
}

/// Errors associated with the inputs to an evaluation.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InputError {
    #[error("Attempted to use longitude {0}°, but it is not a finite number")]
    NonFiniteLongitude(f64),

    #[error("Attempted to use latitude {0}°, but this is out of range (-90° <= latitude <= 90°)")]
    InvalidLatitude(f64),

    #[error("Attempted to use altitude {0} m, but it is not a finite number")]
    NonFiniteAltitude(f64),

    #[error("Attempted to use decimal year {0}, but it is not a finite number")]
    NonFiniteYear(f64),
}
