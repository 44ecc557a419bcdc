//! Unit conversion utilities
//!
//! Handles conversion between Metric (mm) and Imperial (inch) systems.
//! Millimeters are the canonical internal unit; every other length is
//! converted through [`UnitSystem::mm_per_unit`].
//! Supports decimal and fractional inch parsing and formatting.

use crate::error::UnitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Unit system a set of lengths is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Metric system (mm)
    Metric,
    /// Imperial system (inches)
    Imperial,
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self::Metric
    }
}

impl UnitSystem {
    /// All unit systems in ordinal order
    pub const ALL: [UnitSystem; 2] = [UnitSystem::Metric, UnitSystem::Imperial];

    /// Scalar converting one unit of this system into millimeters
    pub fn mm_per_unit(self) -> f64 {
        match self {
            Self::Metric => 1.0,
            Self::Imperial => MM_PER_INCH,
        }
    }

    /// Convert a value expressed in this system to millimeters
    pub fn to_mm(self, value: f64) -> f64 {
        value * self.mm_per_unit()
    }

    /// Convert a value in millimeters to this system
    pub fn from_mm(self, value_mm: f64) -> f64 {
        value_mm / self.mm_per_unit()
    }

    /// Stable ordinal used by unit selectors and persisted settings
    pub fn index(self) -> usize {
        match self {
            Self::Metric => 0,
            Self::Imperial => 1,
        }
    }

    /// Inverse of [`UnitSystem::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short unit label ("mm" or "in")
    pub fn label(self) -> &'static str {
        get_unit_label(self)
    }

    /// Decimal places used when writing coordinates in this system
    pub fn decimal_places(self) -> usize {
        match self {
            Self::Metric => 3,
            Self::Imperial => 4,
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "Metric"),
            Self::Imperial => write!(f, "Imperial"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" | "mm" => Ok(Self::Metric),
            "imperial" | "inch" | "in" => Ok(Self::Imperial),
            _ => Err(UnitError::UnknownSystem(s.to_string())),
        }
    }
}

/// Format length value for display
///
/// * `value_mm` - Value in millimeters
/// * `system` - Target unit system
pub fn format_length(value_mm: f64, system: UnitSystem) -> String {
    format!(
        "{:.*}",
        system.decimal_places(),
        system.from_mm(value_mm)
    )
}

/// Parse a length string into the given system's own units
///
/// Imperial input may be decimal (`0.375`) or fractional (`1 1/2`, `3/8`).
/// An empty string parses as zero.
pub fn parse_length(input: &str, system: UnitSystem) -> Result<f64, UnitError> {
    parse_length_inner(input, system).map_err(|reason| UnitError::InvalidLength {
        input: input.to_string(),
        reason,
    })
}

fn parse_length_inner(input: &str, system: UnitSystem) -> Result<f64, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0.0);
    }

    match system {
        UnitSystem::Metric => input.parse::<f64>().map_err(|e| e.to_string()),
        UnitSystem::Imperial => {
            if !input.contains('/') {
                return input.parse::<f64>().map_err(|e| e.to_string());
            }

            let mut total = 0.0;
            let mut negative = false;
            for part in input.split_whitespace() {
                let part = if let Some(stripped) = part.strip_prefix('-') {
                    negative = true;
                    stripped
                } else {
                    part
                };

                if part.contains('/') {
                    let frac_parts: Vec<&str> = part.split('/').collect();
                    if frac_parts.len() != 2 {
                        return Err("Invalid fraction format".to_string());
                    }
                    let num = frac_parts[0]
                        .parse::<f64>()
                        .map_err(|_| "Invalid numerator")?;
                    let den = frac_parts[1]
                        .parse::<f64>()
                        .map_err(|_| "Invalid denominator")?;
                    if den == 0.0 {
                        return Err("Division by zero".to_string());
                    }
                    total += num / den;
                } else {
                    total += part.parse::<f64>().map_err(|_| "Invalid number part")?;
                }
            }
            Ok(if negative { -total } else { total })
        }
    }
}

/// Get the unit label for the given system ("mm" or "in")
pub fn get_unit_label(system: UnitSystem) -> &'static str {
    match system {
        UnitSystem::Metric => "mm",
        UnitSystem::Imperial => "in",
    }
}
