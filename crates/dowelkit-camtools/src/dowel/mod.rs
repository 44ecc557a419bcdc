//! Dowel hole grid CAM tool.
//!
//! Settings are validated once by [`DowelSettings::create`]; the
//! [`ToolpathPlanner`] turns them into a [`ToolpathPlan`], which the
//! [`GcodeEmitter`] and the preview both read. The [`DowelController`] keeps
//! the current settings and plan and publishes replacements.

pub mod controller;
pub mod emitter;
pub mod planner;
pub mod settings;
pub mod toolpath;

pub use controller::{DowelController, PlanSnapshot};
pub use emitter::{CancellationToken, GcodeEmitter};
pub use planner::{pass_count, pass_depths, ToolpathPlanner};
pub use settings::{
    DowelSettings, DowelSettingsFields, MAX_DIMENSION, MAX_GRID_COUNT, MAX_PASSES_PER_HOLE,
    MAX_PLAN_SEGMENTS,
};
pub use toolpath::{MotionSegment, Position, SegmentKind, ToolpathPlan};
