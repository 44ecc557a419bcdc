//! Preview rendering support: SVG path caching and the render registry.

pub mod registry;
pub mod toolpath_cache;

pub use registry::{DowelPreview, RenderRegistry, Renderable};
pub use toolpath_cache::ToolpathCache;
