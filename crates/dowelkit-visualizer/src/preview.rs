//! Preview geometry.
//!
//! Converts a [`ToolpathPlan`] into styled line segments. Geometry is read
//! directly from the plan's segments, so the preview shows exactly what the
//! emitted program cuts.

use dowelkit_camtools::dowel::{MotionSegment, Position, ToolpathPlan};
use serde::{Deserialize, Serialize};

/// Visual style of a preview line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineStyle {
    /// Travel move, typically drawn dashed.
    Rapid,
    /// Cutting move.
    Feed,
}

/// A straight line in machine space (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewLine {
    pub from: Position,
    pub to: Position,
    pub style: LineStyle,
}

impl PreviewLine {
    pub fn new(from: Position, to: Position, style: LineStyle) -> Self {
        Self { from, to, style }
    }

    /// Largest coordinate difference to `other`, or `None` if styles differ.
    pub fn max_delta(&self, other: &PreviewLine) -> Option<f64> {
        if self.style != other.style {
            return None;
        }
        Some(
            self.from
                .max_axis_delta(&other.from)
                .max(self.to.max_axis_delta(&other.to)),
        )
    }

    /// Whether the line moves only along Z.
    pub fn is_vertical(&self) -> bool {
        self.from.same_xy(&self.to)
    }
}

/// Stateless converter from plans to preview lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewAdapter;

impl PreviewAdapter {
    /// Work position assumed before the first move.
    pub const START: Position = Position::ORIGIN;

    pub fn style_of(segment: &MotionSegment) -> LineStyle {
        match segment {
            MotionSegment::Rapid { .. } => LineStyle::Rapid,
            MotionSegment::Linear { .. } => LineStyle::Feed,
        }
    }

    /// One line per segment, in plan order.
    pub fn to_primitives(plan: &ToolpathPlan) -> Vec<PreviewLine> {
        let mut from = Self::START;
        plan.segments
            .iter()
            .map(|segment| {
                let to = segment.end();
                let line = PreviewLine::new(from, to, Self::style_of(segment));
                from = to;
                line
            })
            .collect()
    }
}
