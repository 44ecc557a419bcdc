//! Event type definitions for the event bus.
//!
//! This module defines all application events organized by category.
//! Events are designed to be cloneable and serializable for logging/replay.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root event enum for all application events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Settings and configuration
    Settings(SettingsEvent),
    /// Program file operations
    File(FileEvent),
    /// Error and diagnostic events
    Error(ErrorEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Settings(_) => EventCategory::Settings,
            AppEvent::File(_) => EventCategory::File,
            AppEvent::Error(_) => EventCategory::Error,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Settings(e) => e.description(),
            AppEvent::File(e) => e.description(),
            AppEvent::Error(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Settings and configuration events.
    Settings,
    /// Program file events.
    File,
    /// Error and diagnostic events.
    Error,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Settings => write!(f, "Settings"),
            EventCategory::File => write!(f, "File"),
            EventCategory::Error => write!(f, "Error"),
        }
    }
}

/// Settings-related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingsEvent {
    /// Settings loaded from a file.
    Loaded {
        /// File the settings came from.
        path: PathBuf,
    },
    /// Settings saved to a file.
    Saved {
        /// File the settings were written to.
        path: PathBuf,
    },
    /// Stored settings could not be read and defaults were installed instead.
    DefaultsRestored {
        /// Why the stored settings were rejected.
        reason: String,
    },
    /// New dowel settings were installed and the toolpath was re-planned.
    DowelSettingsChanged {
        /// Monotonic revision of the installed plan.
        revision: u64,
        /// Number of motion segments in the new plan.
        segments: usize,
    },
}

impl SettingsEvent {
    fn description(&self) -> String {
        match self {
            SettingsEvent::Loaded { path } => format!("Settings loaded: {}", path.display()),
            SettingsEvent::Saved { path } => format!("Settings saved: {}", path.display()),
            SettingsEvent::DefaultsRestored { reason } => {
                format!("Defaults restored: {}", reason)
            }
            SettingsEvent::DowelSettingsChanged { revision, segments } => {
                format!("Dowel plan r{} ({} segments)", revision, segments)
            }
        }
    }
}

/// Program file events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FileEvent {
    /// A generated program was installed as the active program.
    ProgramInstalled {
        /// Path of the installed program.
        path: PathBuf,
        /// Number of lines written.
        lines: usize,
    },
    /// Program generation was cancelled before completion.
    ProgramCancelled,
}

impl FileEvent {
    fn description(&self) -> String {
        match self {
            FileEvent::ProgramInstalled { path, lines } => {
                format!("Program installed: {} ({} lines)", path.display(), lines)
            }
            FileEvent::ProgramCancelled => "Program generation cancelled".to_string(),
        }
    }
}

/// Error and diagnostic events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorEvent {
    /// Settings were rejected by validation.
    InvalidSettings {
        /// Human readable list of violations.
        message: String,
    },
    /// Writing a program failed.
    ProgramWriteFailed {
        /// The underlying error message.
        message: String,
    },
}

impl ErrorEvent {
    fn description(&self) -> String {
        match self {
            ErrorEvent::InvalidSettings { message } => format!("Invalid settings: {}", message),
            ErrorEvent::ProgramWriteFailed { message } => {
                format!("Program write failed: {}", message)
            }
        }
    }
}
