//! # DowelKit Core
//!
//! Core types and utilities shared by the DowelKit crates: the unit system,
//! the core error type, the application event bus and shared-state aliases.

pub mod error;
pub mod event_bus;
pub mod types;
pub mod units;

pub use error::{Error, Result, UnitError};

pub use event_bus::{
    AppEvent, ErrorEvent, EventBus, EventCategory, EventFilter, FileEvent, SettingsEvent,
    SubscriptionId,
};

pub use types::{thread_safe_rw, ThreadSafeRw};

pub use units::{format_length, parse_length, UnitSystem, MM_PER_INCH};
