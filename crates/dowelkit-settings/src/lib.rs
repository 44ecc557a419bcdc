//! DowelKit Settings Crate
//!
//! Handles configuration files and persistence of dowel grid settings.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{Config, ConfigFormat, OutputSettings, PlannerSettings};
pub use error::{
    ConfigError, ConfigResult, PersistenceError, PersistenceResult, SettingsError, SettingsResult,
};
pub use persistence::{
    from_flat_map, read_properties, read_properties_or_default, to_flat_map, write_properties,
    PropertyMap, SettingsStore, SETTINGS_JSON_PROPERTY, SETTINGS_VERSION, VERSION_PROPERTY,
};
