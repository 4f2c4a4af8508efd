//! Error types returned by the library.
//!
//! Division by zero is never an error here: undefined ratios are `None`, and an
//! empty view is a valid input everywhere.

use thiserror::Error;

/// Rejected filter parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid year range: {year_min} is after {year_max}")]
    InvalidFilterRange { year_min: i32, year_max: i32 },
}

/// Failures while turning a delimited file into a [`RecordTable`](crate::records::RecordTable).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("input is not valid UTF-8 (try the latin1 encoding)")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("required column '{0}' is missing from the header")]
    MissingColumn(&'static str),

    #[error("malformed delimited text")]
    Csv(#[from] csv::Error),
}
