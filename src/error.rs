//! Error types for u-benford.

use std::fmt;

/// All errors produced by u-benford operations.
#[derive(Debug, Clone, PartialEq)]
pub enum BenfordError {
    /// Requested column is absent from the table.
    FieldNotFound {
        field: String,
        available: Vec<String>,
    },
    /// No nonzero, non-null value with a leading digit 1-9 survived filtering.
    NoValidData { field: String },
    /// KS confidence level outside the supported set.
    InvalidConfidenceLevel { value: f64, supported: Vec<f64> },
    /// Chi-square significance level outside (0, 1).
    InvalidAlpha { value: f64 },
    /// A test method was called before any successful analysis.
    NotAnalyzed,
    /// Column exists but does not hold numeric values.
    NonNumericColumn { column: String },
    /// The numeric backend could not evaluate a test.
    TestFailed {
        test: &'static str,
        message: String,
    },
    /// CSV parsing failed.
    CsvParse { line: usize, message: String },
    /// Dimension mismatch.
    DimensionMismatch { expected: usize, actual: usize },
    /// I/O error during file reading.
    Io(String),
}

impl fmt::Display for BenfordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldNotFound { field, available } => {
                write!(
                    f,
                    "field '{field}' not found in columns: [{}]",
                    available.join(", ")
                )
            }
            Self::NoValidData { field } => {
                write!(
                    f,
                    "no valid data found in field '{field}' for Benford's Law analysis"
                )
            }
            Self::InvalidConfidenceLevel { value, supported } => {
                let levels: Vec<String> = supported.iter().map(|c| format!("{c:.2}")).collect();
                write!(
                    f,
                    "invalid confidence level {value}, choose from [{}]",
                    levels.join(", ")
                )
            }
            Self::InvalidAlpha { value } => {
                write!(f, "significance level {value} must lie strictly between 0 and 1")
            }
            Self::NotAnalyzed => write!(f, "must run analyze() first"),
            Self::NonNumericColumn { column } => {
                write!(f, "column '{column}' is not numeric")
            }
            Self::TestFailed { test, message } => {
                write!(f, "{test} test failed: {message}")
            }
            Self::CsvParse { line, message } => {
                write!(f, "CSV parse error at line {line}: {message}")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} elements, got {actual}")
            }
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BenfordError {}

impl From<std::io::Error> for BenfordError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
