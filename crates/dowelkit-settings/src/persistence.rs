//! Dowel settings persistence.
//!
//! Settings are stored as a string property map carrying a format version and
//! the settings as one JSON document:
//!
//! ```text
//! version             = "1.0"
//! dowel_settings_json = {"grid_count_x":3,...}
//! ```
//!
//! A flat map with one property per field is also supported for stores that
//! prefer plain key/value pairs. Both forms round-trip losslessly, and both
//! validate on read so a stored value can never yield invalid settings.

use crate::error::{PersistenceError, PersistenceResult, SettingsResult};
use dowelkit_camtools::dowel::{DowelSettings, DowelSettingsFields};
use dowelkit_core::event_bus::{AppEvent, EventBus, SettingsEvent};
use dowelkit_core::units::UnitSystem;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Property holding the format version.
pub const VERSION_PROPERTY: &str = "version";
/// Format version written by this crate.
pub const SETTINGS_VERSION: &str = "1.0";
/// Property holding the settings JSON document.
pub const SETTINGS_JSON_PROPERTY: &str = "dowel_settings_json";

/// String properties, ordered by key.
pub type PropertyMap = BTreeMap<String, String>;

/// Versioned property map for `settings`.
pub fn write_properties(settings: &DowelSettings) -> PersistenceResult<PropertyMap> {
    let mut props = PropertyMap::new();
    props.insert(VERSION_PROPERTY.to_string(), SETTINGS_VERSION.to_string());
    props.insert(
        SETTINGS_JSON_PROPERTY.to_string(),
        serde_json::to_string(settings)?,
    );
    Ok(props)
}

/// Read settings from a versioned property map.
///
/// A missing version is read as the current one.
pub fn read_properties(props: &PropertyMap) -> PersistenceResult<DowelSettings> {
    if let Some(version) = props.get(VERSION_PROPERTY) {
        if version != SETTINGS_VERSION {
            return Err(PersistenceError::UnsupportedVersion(version.clone()));
        }
    }
    let json = props
        .get(SETTINGS_JSON_PROPERTY)
        .ok_or_else(|| PersistenceError::MissingProperty(SETTINGS_JSON_PROPERTY.to_string()))?;

    let fields: DowelSettingsFields = serde_json::from_str(json)?;
    Ok(DowelSettings::create(fields)?)
}

/// Read settings, falling back to defaults when the map is unusable.
///
/// The error that forced the fallback is returned alongside the defaults.
pub fn read_properties_or_default(
    props: &PropertyMap,
) -> (DowelSettings, Option<PersistenceError>) {
    match read_properties(props) {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::warn!("Stored dowel settings unusable, restoring defaults: {}", err);
            (DowelSettings::default(), Some(err))
        }
    }
}

fn units_value(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "metric",
        UnitSystem::Imperial => "imperial",
    }
}

/// One property per settings field.
///
/// Reals are written in Rust's shortest round-trip form.
pub fn to_flat_map(settings: &DowelSettings) -> PropertyMap {
    let f = settings.fields();
    let mut map = PropertyMap::new();
    map.insert("grid_count_x".into(), f.grid_count_x.to_string());
    map.insert("grid_count_y".into(), f.grid_count_y.to_string());
    map.insert("dowel_diameter".into(), f.dowel_diameter.to_string());
    map.insert("dowel_length".into(), f.dowel_length.to_string());
    map.insert("tool_diameter".into(), f.tool_diameter.to_string());
    map.insert("feed_rate".into(), f.feed_rate.to_string());
    map.insert("pass_depth".into(), f.pass_depth.to_string());
    map.insert("safety_height".into(), f.safety_height.to_string());
    map.insert("units".into(), units_value(f.units).to_string());
    map
}

fn flat_value<T: FromStr>(map: &PropertyMap, key: &str) -> PersistenceResult<T> {
    let raw = map
        .get(key)
        .ok_or_else(|| PersistenceError::MissingProperty(key.to_string()))?;
    raw.trim()
        .parse()
        .map_err(|_| PersistenceError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })
}

/// Inverse of [`to_flat_map`]. Every field must be present.
pub fn from_flat_map(map: &PropertyMap) -> PersistenceResult<DowelSettings> {
    let fields = DowelSettingsFields {
        grid_count_x: flat_value(map, "grid_count_x")?,
        grid_count_y: flat_value(map, "grid_count_y")?,
        dowel_diameter: flat_value(map, "dowel_diameter")?,
        dowel_length: flat_value(map, "dowel_length")?,
        tool_diameter: flat_value(map, "tool_diameter")?,
        feed_rate: flat_value(map, "feed_rate")?,
        pass_depth: flat_value(map, "pass_depth")?,
        safety_height: flat_value(map, "safety_height")?,
        units: flat_value(map, "units")?,
    };
    Ok(DowelSettings::create(fields)?)
}

/// Property map stored as a JSON file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    events: Option<Arc<EventBus>>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            events: None,
        }
    }

    /// Store in the platform configuration directory, if one exists.
    pub fn in_config_dir() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("dowelkit").join("dowel_settings.json")))
    }

    /// Publish load/save notifications on `events`.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn publish(&self, event: SettingsEvent) {
        if let Some(events) = &self.events {
            events.publish(AppEvent::Settings(event));
        }
    }

    /// Write `settings`, creating the parent directory if needed.
    pub fn save(&self, settings: &DowelSettings) -> SettingsResult<()> {
        let props = write_properties(settings)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&props)?)?;
        tracing::debug!("Saved dowel settings to {}", self.path.display());
        self.publish(SettingsEvent::Saved {
            path: self.path.clone(),
        });
        Ok(())
    }

    pub fn load(&self) -> SettingsResult<DowelSettings> {
        let content = std::fs::read_to_string(&self.path)?;
        let props: PropertyMap = serde_json::from_str(&content)?;
        let settings = read_properties(&props)?;
        tracing::debug!("Loaded dowel settings from {}", self.path.display());
        self.publish(SettingsEvent::Loaded {
            path: self.path.clone(),
        });
        Ok(settings)
    }

    /// Load stored settings, or defaults when there are none or they are
    /// unusable.
    pub fn load_or_default(&self) -> DowelSettings {
        if !self.path.exists() {
            return DowelSettings::default();
        }
        match self.load() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(
                    "Failed to load dowel settings from {}, restoring defaults: {}",
                    self.path.display(),
                    err
                );
                self.publish(SettingsEvent::DefaultsRestored {
                    reason: err.to_string(),
                });
                DowelSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_map_layout() {
        let props = write_properties(&DowelSettings::default()).unwrap();
        assert_eq!(props.get("version").map(String::as_str), Some("1.0"));
        let json = props.get("dowel_settings_json").unwrap();
        assert!(json.contains("\"grid_count_x\":3"));
        assert!(json.contains("\"units\":\"metric\""));
        assert_eq!(read_properties(&props).unwrap(), DowelSettings::default());
    }

    #[test]
    fn test_property_map_keeps_every_bit() {
        let settings = DowelSettings::create(DowelSettingsFields {
            dowel_diameter: 994.1472819905795,
            dowel_length: 973.4622677525128,
            pass_depth: 97.34622677525127,
            feed_rate: 0.1 + 0.2,
            ..Default::default()
        })
        .unwrap();

        let restored = read_properties(&write_properties(&settings).unwrap()).unwrap();
        let (a, b) = (settings.fields(), restored.fields());
        assert_eq!(a.dowel_diameter.to_bits(), b.dowel_diameter.to_bits());
        assert_eq!(a.dowel_length.to_bits(), b.dowel_length.to_bits());
        assert_eq!(a.pass_depth.to_bits(), b.pass_depth.to_bits());
        assert_eq!(a.feed_rate.to_bits(), b.feed_rate.to_bits());
    }

    #[test]
    fn test_malformed_json_restores_defaults() {
        let mut props = PropertyMap::new();
        props.insert(VERSION_PROPERTY.to_string(), SETTINGS_VERSION.to_string());
        props.insert(SETTINGS_JSON_PROPERTY.to_string(), "{not json".to_string());

        let (settings, err) = read_properties_or_default(&props);
        assert_eq!(settings, DowelSettings::default());
        assert!(matches!(err, Some(PersistenceError::JsonError(_))));
    }

    #[test]
    fn test_invalid_stored_values_are_rejected() {
        let mut props = PropertyMap::new();
        props.insert(
            SETTINGS_JSON_PROPERTY.to_string(),
            r#"{"tool_diameter": 8.0}"#.to_string(),
        );
        assert!(matches!(
            read_properties(&props),
            Err(PersistenceError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_unknown_version() {
        let mut props = write_properties(&DowelSettings::default()).unwrap();
        props.insert(VERSION_PROPERTY.to_string(), "2.0".to_string());
        assert!(matches!(
            read_properties(&props),
            Err(PersistenceError::UnsupportedVersion(v)) if v == "2.0"
        ));
    }

    #[test]
    fn test_flat_map_requires_every_field() {
        let mut map = to_flat_map(&DowelSettings::default());
        assert_eq!(map.get("units").map(String::as_str), Some("metric"));
        assert_eq!(map.get("tool_diameter").map(String::as_str), Some("3.17"));

        map.insert("grid_count_y".to_string(), "three".to_string());
        assert!(matches!(
            from_flat_map(&map),
            Err(PersistenceError::InvalidValue { .. })
        ));

        map.remove("grid_count_y");
        assert!(matches!(
            from_flat_map(&map),
            Err(PersistenceError::MissingProperty(key)) if key == "grid_count_y"
        ));
    }
}
