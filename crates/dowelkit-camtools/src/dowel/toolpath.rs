//! Toolpath plan data structures.
//!
//! A [`ToolpathPlan`] is the single artifact shared by G-code emission and the
//! preview. All coordinates are absolute millimeters with the origin at the
//! first hole centre and Z = 0 at the stock surface.

use dowelkit_core::units::UnitSystem;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A point in machine space (mm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same XY location at a different height.
    pub fn at_z(self, z: f64) -> Self {
        Self { z, ..self }
    }

    /// Whether two positions share an XY location.
    pub fn same_xy(&self, other: &Position) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Largest per-axis difference to `other`.
    pub fn max_axis_delta(&self, other: &Position) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }

    fn hash_bits<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
        self.z.to_bits().hash(state);
    }
}

/// Types of motion segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    Rapid,
    Linear,
}

/// A single machine motion, ending at `to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionSegment {
    /// Non-cutting travel move.
    Rapid { to: Position },
    /// Cutting move at `feed_rate` (mm/min).
    Linear { to: Position, feed_rate: f64 },
}

impl MotionSegment {
    pub fn rapid(to: Position) -> Self {
        MotionSegment::Rapid { to }
    }

    pub fn linear(to: Position, feed_rate: f64) -> Self {
        MotionSegment::Linear { to, feed_rate }
    }

    /// End point of the move.
    pub fn end(&self) -> Position {
        match self {
            MotionSegment::Rapid { to } | MotionSegment::Linear { to, .. } => *to,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            MotionSegment::Rapid { .. } => SegmentKind::Rapid,
            MotionSegment::Linear { .. } => SegmentKind::Linear,
        }
    }

    pub fn is_rapid(&self) -> bool {
        matches!(self, MotionSegment::Rapid { .. })
    }

    /// Feed rate of a linear move, `None` for rapids.
    pub fn feed_rate(&self) -> Option<f64> {
        match self {
            MotionSegment::Rapid { .. } => None,
            MotionSegment::Linear { feed_rate, .. } => Some(*feed_rate),
        }
    }

    fn hash_bits<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.end().hash_bits(state);
        if let Some(feed) = self.feed_rate() {
            feed.to_bits().hash(state);
        }
    }
}

/// Ordered motion sequence for one settings value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolpathPlan {
    /// Motion segments in execution order
    pub segments: Vec<MotionSegment>,
    /// Unit system the program is emitted in
    pub units: UnitSystem,
    /// Holes along X
    pub grid_x: u32,
    /// Holes along Y
    pub grid_y: u32,
    /// Plunge passes cut at every hole
    pub passes_per_hole: usize,
    /// Clearance height for travel (mm)
    pub safety_height: f64,
    /// Distance between neighbouring hole centres (mm)
    pub spacing: f64,
}

impl ToolpathPlan {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn hole_count(&self) -> usize {
        self.grid_x as usize * self.grid_y as usize
    }

    /// Position of the final segment, or the work origin for an empty plan.
    pub fn end_position(&self) -> Position {
        self.segments
            .last()
            .map(MotionSegment::end)
            .unwrap_or(Position::ORIGIN)
    }

    /// Number of rapid and linear moves.
    pub fn move_counts(&self) -> (usize, usize) {
        let rapids = self.segments.iter().filter(|s| s.is_rapid()).count();
        (rapids, self.segments.len() - rapids)
    }

    /// Deepest Z reached by the plan (mm, negative below the surface).
    pub fn min_z(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.end().z)
            .fold(0.0_f64, f64::min)
    }

    /// Bounding box of all segment end points as (min, max).
    pub fn bounds(&self) -> (Position, Position) {
        let mut min = Position::ORIGIN;
        let mut max = Position::ORIGIN;
        for end in self.segments.iter().map(MotionSegment::end) {
            min.x = min.x.min(end.x);
            min.y = min.y.min(end.y);
            min.z = min.z.min(end.z);
            max.x = max.x.max(end.x);
            max.y = max.y.max(end.y);
            max.z = max.z.max(end.z);
        }
        (min, max)
    }

    /// Hash over the exact bit patterns of the motion sequence.
    ///
    /// Equal plans hash equally across calls in the same build; used to key
    /// preview caches.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.units.hash(&mut hasher);
        self.segments.len().hash(&mut hasher);
        for segment in &self.segments {
            segment.hash_bits(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ToolpathPlan {
        ToolpathPlan {
            segments: vec![
                MotionSegment::rapid(Position::new(0.0, 0.0, 5.0)),
                MotionSegment::linear(Position::new(0.0, 0.0, -2.0), 100.0),
                MotionSegment::rapid(Position::new(0.0, 0.0, 5.0)),
            ],
            units: UnitSystem::Metric,
            grid_x: 1,
            grid_y: 1,
            passes_per_hole: 1,
            safety_height: 5.0,
            spacing: 10.0,
        }
    }

    #[test]
    fn test_segment_accessors() {
        let seg = MotionSegment::linear(Position::new(1.0, 2.0, -3.0), 250.0);
        assert_eq!(seg.kind(), SegmentKind::Linear);
        assert_eq!(seg.feed_rate(), Some(250.0));
        assert_eq!(seg.end(), Position::new(1.0, 2.0, -3.0));
        assert!(!seg.is_rapid());
        assert_eq!(MotionSegment::rapid(Position::ORIGIN).feed_rate(), None);
    }

    #[test]
    fn test_plan_summary() {
        let plan = sample();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.move_counts(), (2, 1));
        assert_eq!(plan.min_z(), -2.0);
        assert_eq!(plan.end_position(), Position::new(0.0, 0.0, 5.0));
        let (min, max) = plan.bounds();
        assert_eq!(min.z, -2.0);
        assert_eq!(max.z, 5.0);
    }

    #[test]
    fn test_content_hash_tracks_geometry() {
        let plan = sample();
        assert_eq!(plan.content_hash(), sample().content_hash());

        let mut moved = sample();
        moved.segments[1] = MotionSegment::linear(Position::new(0.0, 0.0, -2.5), 100.0);
        assert_ne!(plan.content_hash(), moved.content_hash());

        let mut refed = sample();
        refed.segments[1] = MotionSegment::linear(Position::new(0.0, 0.0, -2.0), 120.0);
        assert_ne!(plan.content_hash(), refed.content_hash());
    }
}
