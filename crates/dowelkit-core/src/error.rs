//! Error handling for DowelKit
//!
//! The core crate only performs unit parsing and event distribution, so its
//! error surface is small. Domain crates define richer error enums and convert
//! into [`Error`] where a unified type is convenient.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Unit parsing error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    /// The unit system name was not recognised
    #[error("Unknown unit system: {0}")]
    UnknownSystem(String),

    /// A length string could not be parsed
    #[error("Invalid length '{input}': {reason}")]
    InvalidLength {
        /// The text that failed to parse.
        input: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// Main error type for DowelKit core
#[derive(Error, Debug)]
pub enum Error {
    /// Unit error
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
