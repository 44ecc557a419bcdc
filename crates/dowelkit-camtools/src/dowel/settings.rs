//! Dowel grid settings.
//!
//! [`DowelSettingsFields`] is the plain, editable form used by persistence and
//! input surfaces. [`DowelSettings`] is the validated, immutable value the
//! planner accepts; the only way to obtain one is [`DowelSettings::create`]
//! (or deserialisation, which goes through the same checks).

use super::planner::pass_count;
use crate::error::{InvalidSettings, SettingViolation};
use dowelkit_core::units::UnitSystem;
use serde::{Deserialize, Serialize};

/// Largest value accepted for any length, feed rate or grid count.
pub const MAX_DIMENSION: f64 = 1_000_000.0;

/// Largest number of holes along one axis.
pub const MAX_GRID_COUNT: u32 = 1_000_000;

/// Largest number of plunge passes cut at a single hole.
pub const MAX_PASSES_PER_HOLE: usize = 10_000;

/// Largest number of motion segments a plan may hold.
pub const MAX_PLAN_SEGMENTS: u64 = 10_000_000;

/// Unvalidated dowel grid parameters.
///
/// Lengths are expressed in `units`; `feed_rate` is in `units` per minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DowelSettingsFields {
    /// Number of holes along X
    pub grid_count_x: u32,
    /// Number of holes along Y
    pub grid_count_y: u32,
    /// Hole diameter
    pub dowel_diameter: f64,
    /// Hole depth
    pub dowel_length: f64,
    /// Cutting tool diameter
    pub tool_diameter: f64,
    /// Plunge feed rate
    pub feed_rate: f64,
    /// Maximum depth of a single plunge pass
    pub pass_depth: f64,
    /// Clearance height for travel moves
    pub safety_height: f64,
    /// Unit system of every length above
    pub units: UnitSystem,
}

impl Default for DowelSettingsFields {
    fn default() -> Self {
        Self {
            grid_count_x: 3,
            grid_count_y: 3,
            dowel_diameter: 5.0,
            dowel_length: 10.0,
            tool_diameter: 3.17,
            feed_rate: 100.0,
            pass_depth: 2.0,
            safety_height: 5.0,
            units: UnitSystem::Metric,
        }
    }
}

impl DowelSettingsFields {
    /// The same physical settings expressed in `units`.
    ///
    /// Lengths and the feed rate are converted; grid counts are unchanged.
    pub fn converted_to(&self, units: UnitSystem) -> Self {
        let from = self.units;
        let convert = |value: f64| units.from_mm(from.to_mm(value));
        Self {
            grid_count_x: self.grid_count_x,
            grid_count_y: self.grid_count_y,
            dowel_diameter: convert(self.dowel_diameter),
            dowel_length: convert(self.dowel_length),
            tool_diameter: convert(self.tool_diameter),
            feed_rate: convert(self.feed_rate),
            pass_depth: convert(self.pass_depth),
            safety_height: convert(self.safety_height),
            units,
        }
    }

    /// Check every invariant and collect all violations.
    pub fn violations(&self) -> Vec<SettingViolation> {
        let mut violations = Vec::new();

        check_count(&mut violations, "grid_count_x", self.grid_count_x);
        check_count(&mut violations, "grid_count_y", self.grid_count_y);
        check_positive(&mut violations, "dowel_diameter", self.dowel_diameter);
        check_positive(&mut violations, "dowel_length", self.dowel_length);
        check_positive(&mut violations, "tool_diameter", self.tool_diameter);
        check_positive(&mut violations, "feed_rate", self.feed_rate);
        check_positive(&mut violations, "pass_depth", self.pass_depth);

        if !self.safety_height.is_finite() {
            violations.push(SettingViolation::new(
                "safety_height",
                format!("must be finite (got {})", self.safety_height),
            ));
        } else if self.safety_height < 0.0 {
            violations.push(SettingViolation::new(
                "safety_height",
                format!("must be >= 0 (got {})", self.safety_height),
            ));
        } else if self.safety_height > MAX_DIMENSION {
            violations.push(SettingViolation::new(
                "safety_height",
                format!("must be <= {} (got {})", MAX_DIMENSION, self.safety_height),
            ));
        }

        // Cross-field relations only make sense once both sides are usable.
        if self.tool_diameter.is_finite()
            && self.dowel_diameter.is_finite()
            && self.tool_diameter > self.dowel_diameter
        {
            violations.push(SettingViolation::new(
                "tool_diameter",
                format!(
                    "must not exceed dowel_diameter ({} > {})",
                    self.tool_diameter, self.dowel_diameter
                ),
            ));
        }
        if self.pass_depth.is_finite()
            && self.dowel_length.is_finite()
            && self.pass_depth > self.dowel_length
        {
            violations.push(SettingViolation::new(
                "pass_depth",
                format!(
                    "must not exceed dowel_length ({} > {})",
                    self.pass_depth, self.dowel_length
                ),
            ));
        }

        // Plan size is only meaningful for otherwise valid settings.
        if violations.is_empty() {
            self.check_plan_size(&mut violations);
        }

        violations
    }

    fn check_plan_size(&self, violations: &mut Vec<SettingViolation>) {
        let ratio = self.dowel_length / self.pass_depth;
        if ratio > MAX_PASSES_PER_HOLE as f64 {
            violations.push(SettingViolation::new(
                "pass_depth",
                format!(
                    "must allow at most {} passes per hole (dowel_length / pass_depth = {})",
                    MAX_PASSES_PER_HOLE, ratio
                ),
            ));
            return;
        }

        let passes = pass_count(self.dowel_length, self.pass_depth) as u64;
        let holes = self.grid_count_x as u64 * self.grid_count_y as u64;
        let segments = holes * (passes + 2) + 1;
        if segments > MAX_PLAN_SEGMENTS {
            let constraint = format!(
                "grid of {} holes with {} passes each needs {} segments, limit is {}",
                holes, passes, segments, MAX_PLAN_SEGMENTS
            );
            violations.push(SettingViolation::new("grid_count_x", constraint.clone()));
            violations.push(SettingViolation::new("grid_count_y", constraint));
        }
    }
}

fn check_count(violations: &mut Vec<SettingViolation>, field: &'static str, value: u32) {
    if value < 1 {
        violations.push(SettingViolation::new(
            field,
            format!("must be >= 1 (got {})", value),
        ));
    } else if value > MAX_GRID_COUNT {
        violations.push(SettingViolation::new(
            field,
            format!("must be <= {} (got {})", MAX_GRID_COUNT, value),
        ));
    }
}

fn check_positive(violations: &mut Vec<SettingViolation>, field: &'static str, value: f64) {
    if !value.is_finite() {
        violations.push(SettingViolation::new(
            field,
            format!("must be finite (got {})", value),
        ));
    } else if value <= 0.0 {
        violations.push(SettingViolation::new(
            field,
            format!("must be > 0 (got {})", value),
        ));
    } else if value > MAX_DIMENSION {
        violations.push(SettingViolation::new(
            field,
            format!("must be <= {} (got {})", MAX_DIMENSION, value),
        ));
    }
}

/// Validated, immutable dowel grid settings.
///
/// Edits produce a new value: take [`DowelSettings::fields`], change it, and
/// call [`DowelSettings::create`] again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DowelSettingsFields", into = "DowelSettingsFields")]
pub struct DowelSettings {
    fields: DowelSettingsFields,
}

impl DowelSettings {
    /// Validate `fields`, reporting every violated constraint.
    pub fn create(fields: DowelSettingsFields) -> Result<Self, InvalidSettings> {
        let violations = fields.violations();
        if violations.is_empty() {
            Ok(Self { fields })
        } else {
            Err(InvalidSettings::new(violations))
        }
    }

    /// Re-run validation on an existing value.
    pub fn check(&self) -> Result<(), InvalidSettings> {
        let violations = self.fields.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(InvalidSettings::new(violations))
        }
    }

    /// The validated fields.
    pub fn fields(&self) -> &DowelSettingsFields {
        &self.fields
    }

    /// Consume into the plain field set, e.g. to edit and re-create.
    pub fn into_fields(self) -> DowelSettingsFields {
        self.fields
    }

    pub fn grid_count_x(&self) -> u32 {
        self.fields.grid_count_x
    }

    pub fn grid_count_y(&self) -> u32 {
        self.fields.grid_count_y
    }

    pub fn dowel_diameter(&self) -> f64 {
        self.fields.dowel_diameter
    }

    pub fn dowel_length(&self) -> f64 {
        self.fields.dowel_length
    }

    pub fn tool_diameter(&self) -> f64 {
        self.fields.tool_diameter
    }

    pub fn feed_rate(&self) -> f64 {
        self.fields.feed_rate
    }

    pub fn pass_depth(&self) -> f64 {
        self.fields.pass_depth
    }

    pub fn safety_height(&self) -> f64 {
        self.fields.safety_height
    }

    pub fn units(&self) -> UnitSystem {
        self.fields.units
    }

    /// Total number of holes in the grid.
    pub fn hole_count(&self) -> usize {
        self.fields.grid_count_x as usize * self.fields.grid_count_y as usize
    }
}

impl Default for DowelSettings {
    fn default() -> Self {
        Self {
            fields: DowelSettingsFields::default(),
        }
    }
}

impl TryFrom<DowelSettingsFields> for DowelSettings {
    type Error = InvalidSettings;

    fn try_from(fields: DowelSettingsFields) -> Result<Self, Self::Error> {
        Self::create(fields)
    }
}

impl From<DowelSettings> for DowelSettingsFields {
    fn from(settings: DowelSettings) -> Self {
        settings.fields
    }
}
