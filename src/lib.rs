//! # DowelKit
//!
//! Toolpath generation for CNC dowel hole grids: a rectangular grid of round
//! holes cut by straight multi-pass plunges, emitted as G-code and previewed
//! from the very same plan.
//!
//! ## Architecture
//!
//! DowelKit is organized as a workspace with multiple crates:
//!
//! 1. **dowelkit-core** - Unit system, core errors, event bus, shared-state aliases
//! 2. **dowelkit-camtools** - Settings validation, toolpath planning, G-code emission, controller
//! 3. **dowelkit-visualizer** - Preview geometry, SVG caching, render registry, program decoding
//! 4. **dowelkit-settings** - Config files and settings persistence
//! 5. **dowelkit** - Command line binary that integrates all crates

pub use dowelkit_core::{
    format_length, parse_length, AppEvent, Error, EventBus, Result, SettingsEvent, UnitSystem,
};

pub use dowelkit_camtools::{
    CamToolError, CancellationToken, DowelController, DowelSettings, DowelSettingsFields,
    GcodeEmitter, InvalidSettings, MotionSegment, Position, ToolpathPlan, ToolpathPlanner,
};

pub use dowelkit_visualizer::{
    compare_lines, decode_program, DowelPreview, LineStyle, PreviewAdapter, PreviewLine,
    RenderRegistry, Renderable, ToolpathCache,
};

pub use dowelkit_settings::{Config, SettingsStore};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date and time
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging to stderr.
///
/// `RUST_LOG` directives take precedence over `default_level`. Stdout is left
/// free for generated programs.
pub fn init_logging(default_level: tracing::Level) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
