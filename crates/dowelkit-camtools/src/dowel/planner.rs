//! Dowel grid toolpath planner.
//!
//! Holes are cut row by row (Y row outer, X column inner). Each hole is a
//! rapid to safety height, a series of straight plunges that never go deeper
//! than `pass_depth` at a time, and a rapid back up to safety height.

use super::settings::DowelSettings;
use super::toolpath::{MotionSegment, Position, ToolpathPlan};
use crate::error::{CamToolError, CamToolResult};

/// Slack, relative to the pass depth, allowed on the final plunge so that an
/// exact multiple is never split into an extra sliver pass.
const PASS_TOLERANCE: f64 = 1e-9;

/// Generator for dowel grid toolpaths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolpathPlanner {
    spacing_factor: f64,
}

impl ToolpathPlanner {
    /// Hole spacing as a multiple of the dowel diameter. At 2.0 there is one
    /// full diameter of material between neighbouring hole edges.
    pub const DEFAULT_SPACING_FACTOR: f64 = 2.0;

    /// Create a planner using the default spacing policy.
    pub fn new() -> Self {
        Self {
            spacing_factor: Self::DEFAULT_SPACING_FACTOR,
        }
    }

    /// Create a planner with a custom spacing factor.
    ///
    /// Factors below 2.0 would leave less than one dowel diameter between holes.
    pub fn with_spacing_factor(spacing_factor: f64) -> CamToolResult<Self> {
        if !spacing_factor.is_finite() || spacing_factor < Self::DEFAULT_SPACING_FACTOR {
            return Err(CamToolError::InvalidParameters(format!(
                "spacing factor must be finite and >= {} (got {})",
                Self::DEFAULT_SPACING_FACTOR,
                spacing_factor
            )));
        }
        Ok(Self { spacing_factor })
    }

    pub fn spacing_factor(&self) -> f64 {
        self.spacing_factor
    }

    /// Distance between neighbouring hole centres, in the settings' units.
    pub fn spacing(&self, settings: &DowelSettings) -> f64 {
        settings.dowel_diameter() * self.spacing_factor
    }

    /// Compute the full motion sequence for `settings`.
    pub fn plan(&self, settings: &DowelSettings) -> CamToolResult<ToolpathPlan> {
        settings.check()?;

        let units = settings.units();
        let spacing = units.to_mm(self.spacing(settings));
        let safety = units.to_mm(settings.safety_height());
        let feed = units.to_mm(settings.feed_rate());
        let depths: Vec<f64> = pass_depths(settings.dowel_length(), settings.pass_depth())
            .into_iter()
            .map(|d| -units.to_mm(d))
            .collect();

        let grid_x = settings.grid_count_x();
        let grid_y = settings.grid_count_y();
        let mut segments = Vec::with_capacity(settings.hole_count() * (depths.len() + 2) + 1);

        for j in 0..grid_y {
            for i in 0..grid_x {
                let above = Position::new(i as f64 * spacing, j as f64 * spacing, safety);
                segments.push(MotionSegment::rapid(above));
                for &z in &depths {
                    segments.push(MotionSegment::linear(above.at_z(z), feed));
                }
                segments.push(MotionSegment::rapid(above));
            }
        }

        if let Some(last) = segments.last().map(MotionSegment::end) {
            if last.z != safety {
                segments.push(MotionSegment::rapid(last.at_z(safety)));
            }
        }

        tracing::debug!(
            "Planned {}x{} dowel grid: {} segments, {} passes per hole, spacing {:.3} mm",
            grid_x,
            grid_y,
            segments.len(),
            depths.len(),
            spacing
        );

        Ok(ToolpathPlan {
            segments,
            units,
            grid_x,
            grid_y,
            passes_per_hole: depths.len(),
            safety_height: safety,
            spacing,
        })
    }
}

impl Default for ToolpathPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of plunge passes needed to reach `length` taking at most `pass_depth`
/// per pass. Always at least one.
///
/// The final plunge `length - pass_depth * (passes - 1)` never exceeds
/// `pass_depth` by more than `PASS_TOLERANCE * pass_depth`. Validated settings
/// bound the result by [`MAX_PASSES_PER_HOLE`](super::settings::MAX_PASSES_PER_HOLE).
pub fn pass_count(length: f64, pass_depth: f64) -> usize {
    let ratio = length / pass_depth;
    if ratio.is_nan() || ratio <= 1.0 {
        return 1;
    }
    if ratio >= usize::MAX as f64 {
        return usize::MAX;
    }

    let limit = pass_depth * (1.0 + PASS_TOLERANCE);
    let last_plunge = |passes: usize| length - pass_depth * (passes - 1) as f64;

    let mut passes = ratio.ceil() as usize;
    while passes > 1 && last_plunge(passes - 1) <= limit {
        passes -= 1;
    }
    while last_plunge(passes) > limit {
        passes += 1;
    }
    passes
}

/// Cumulative depths (positive, below the surface) of each plunge pass.
///
/// The last entry is exactly `length`.
pub fn pass_depths(length: f64, pass_depth: f64) -> Vec<f64> {
    let passes = pass_count(length, pass_depth);
    let mut depths: Vec<f64> = (1..passes).map(|k| pass_depth * k as f64).collect();
    depths.push(length);
    depths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_count() {
        assert_eq!(pass_count(10.0, 2.0), 5);
        assert_eq!(pass_count(10.0, 3.0), 4);
        assert_eq!(pass_count(2.0, 2.0), 1);
        assert_eq!(pass_count(0.3, 0.1), 3);
        assert_eq!(pass_count(0.7, 0.1), 7);
    }

    #[test]
    fn test_pass_depths_end_exactly() {
        assert_eq!(pass_depths(10.0, 3.0), vec![3.0, 6.0, 9.0, 10.0]);
        assert_eq!(pass_depths(10.0, 2.0), vec![2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(pass_depths(1.0, 1.0), vec![1.0]);
    }

    #[test]
    fn test_deep_hole_keeps_every_pass() {
        let pass_depth = 0.001;
        let depths = pass_depths(1000.0000005, pass_depth);
        assert_eq!(depths.len(), 1_000_001);

        let mut previous = 0.0;
        for depth in depths {
            assert!(depth - previous <= pass_depth * (1.0 + PASS_TOLERANCE));
            previous = depth;
        }
        assert_eq!(previous, 1000.0000005);
    }

    #[test]
    fn test_near_multiple_is_not_split() {
        assert_eq!(pass_count(6.0 + 1e-12, 2.0), 3);
        assert_eq!(pass_count(2.0 * (1.0 + 1e-12), 2.0), 1);
        assert_eq!(pass_count(6.0 + 1e-6, 2.0), 4);
    }

    #[test]
    fn test_degenerate_ratios() {
        assert_eq!(pass_count(1.0, 0.0), usize::MAX);
        assert_eq!(pass_count(f64::NAN, 1.0), 1);
        assert_eq!(pass_count(0.5, 1.0), 1);
    }

    #[test]
    fn test_spacing_factor_bounds() {
        assert!(ToolpathPlanner::with_spacing_factor(2.0).is_ok());
        assert!(ToolpathPlanner::with_spacing_factor(3.5).is_ok());
        assert!(ToolpathPlanner::with_spacing_factor(1.5).is_err());
        assert!(ToolpathPlanner::with_spacing_factor(f64::NAN).is_err());
    }

    #[test]
    fn test_default_plan_shape() {
        let plan = ToolpathPlanner::new()
            .plan(&DowelSettings::default())
            .unwrap();
        assert_eq!(plan.hole_count(), 9);
        assert_eq!(plan.passes_per_hole, 5);
        assert_eq!(plan.len(), 9 * 7);
        assert_eq!(plan.spacing, 10.0);
        assert_eq!(plan.end_position(), Position::new(20.0, 20.0, 5.0));
    }
}
