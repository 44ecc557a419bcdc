//! # DowelKit Visualizer
//!
//! Preview geometry for dowel toolpaths: plan-to-line conversion, SVG path
//! caching, the render registry, and a decoder that reads generated programs
//! back into the same line geometry.

pub mod gcode;
pub mod preview;
pub mod visualizer;

pub use gcode::{compare_lines, decode_program, DecodedProgram, GcodeDecodeError, LineMismatch};
pub use preview::{LineStyle, PreviewAdapter, PreviewLine};
pub use visualizer::{DowelPreview, RenderRegistry, Renderable, ToolpathCache};
