//! # DowelKit CAM Tools
//!
//! Toolpath generation for cutting a rectangular grid of round dowel holes.
//!
//! ## Contents
//!
//! - **Settings**: validated, immutable dowel grid parameters
//! - **Planner**: settings to an ordered sequence of rapid and linear moves
//! - **Emitter**: streams a plan as G-code text
//! - **Controller**: publishes the current plan and installs programs on disk

pub mod dowel;
pub mod error;

pub use dowel::{
    pass_count, pass_depths, CancellationToken, DowelController, DowelSettings,
    DowelSettingsFields, GcodeEmitter, MotionSegment, PlanSnapshot, Position, SegmentKind,
    ToolpathPlan, ToolpathPlanner, MAX_DIMENSION, MAX_GRID_COUNT, MAX_PASSES_PER_HOLE,
    MAX_PLAN_SEGMENTS,
};
pub use error::{CamToolError, CamToolResult, InvalidSettings, SettingViolation};
