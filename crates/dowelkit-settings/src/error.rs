//! Error types for the settings crate.
//!
//! This module provides structured error types for configuration files and
//! dowel settings persistence.

use dowelkit_camtools::InvalidSettings;
use std::io;
use thiserror::Error;

/// Errors that can occur during settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// A configuration validation error occurred.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A persistence error occurred.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors related to configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is out of valid range.
    #[error("Value out of range for '{key}': {value}")]
    ValueOutOfRange { key: String, value: String },

    /// The dowel section does not describe valid settings.
    #[error(transparent)]
    InvalidDowel(#[from] InvalidSettings),
}

/// Errors related to dowel settings persistence.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The property map was written by an unknown format version.
    #[error("Unsupported settings version: {0}")]
    UnsupportedVersion(String),

    /// A required property is absent.
    #[error("Missing property: {0}")]
    MissingProperty(String),

    /// A property value could not be parsed.
    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },

    /// Stored settings parsed but violate the settings invariants.
    #[error("Settings validation failed: {0}")]
    ValidationFailed(#[from] InvalidSettings),

    /// I/O error during persistence.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON error during persistence.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;
