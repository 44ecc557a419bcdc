//! DowelKit CLI - generate, preview and check dowel grid programs
//!
//! Usage:
//!   dowelkit generate --grid-x 4 --grid-y 2 -o dowels.gcode
//!   dowelkit generate --config dowels.toml
//!   dowelkit preview --units imperial --dowel-diameter "3/8" --svg > grid.svg
//!   dowelkit check dowels.gcode --config dowels.toml
//!   dowelkit defaults -o dowels.toml

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dowelkit::{
    compare_lines, decode_program, init_logging, parse_length, Config, DowelController,
    DowelPreview, DowelSettings, PreviewAdapter, RenderRegistry, Renderable,
    SettingsStore, ToolpathPlanner, UnitSystem, BUILD_DATE, VERSION,
};
use dowelkit_settings::{write_properties, PlannerSettings};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Dowel hole grid toolpath generator
#[derive(Parser, Debug)]
#[command(name = "dowelkit")]
#[command(author, about, long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"))]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only report warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan the grid and write its G-code program
    Generate {
        #[command(flatten)]
        grid: GridArgs,

        /// Install the program at this path instead of printing it
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Install at the output location from the config file
        #[arg(long, conflicts_with = "output")]
        install: bool,

        /// Add a summary comment block to the program
        #[arg(long)]
        comments: bool,
    },

    /// Summarise the planned toolpath, or render it as SVG
    Preview {
        #[command(flatten)]
        grid: GridArgs,

        /// Print a top-view SVG drawing instead of the summary
        #[arg(long)]
        svg: bool,
    },

    /// Verify that a program matches the toolpath planned for the settings
    Check {
        /// G-code program to verify
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Write the default configuration
    Defaults {
        /// Destination file (.json or .toml); printed as TOML when omitted
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write the versioned settings property map instead of a config
        #[arg(long)]
        properties: bool,
    },
}

/// Settings sources and per-field overrides.
///
/// Lengths are in the selected unit system; imperial lengths may be
/// fractional, e.g. "1 1/2" or "3/8".
#[derive(Args, Debug, Default)]
struct GridArgs {
    /// Configuration file (JSON or TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Stored settings property map, overriding the config's dowel section
    #[arg(long, value_name = "FILE")]
    properties: Option<PathBuf>,

    /// Unit system (metric or imperial)
    #[arg(long)]
    units: Option<UnitSystem>,

    /// Number of holes along X
    #[arg(long)]
    grid_x: Option<u32>,

    /// Number of holes along Y
    #[arg(long)]
    grid_y: Option<u32>,

    /// Hole diameter
    #[arg(long, allow_hyphen_values = true)]
    dowel_diameter: Option<String>,

    /// Hole depth
    #[arg(long, allow_hyphen_values = true)]
    dowel_length: Option<String>,

    /// Cutting tool diameter
    #[arg(long, allow_hyphen_values = true)]
    tool_diameter: Option<String>,

    /// Plunge feed rate, in units per minute
    #[arg(long, allow_hyphen_values = true)]
    feed_rate: Option<f64>,

    /// Maximum depth of one plunge pass
    #[arg(long, allow_hyphen_values = true)]
    pass_depth: Option<String>,

    /// Clearance height for travel moves
    #[arg(long, allow_hyphen_values = true)]
    safety_height: Option<String>,

    /// Hole spacing as a multiple of the dowel diameter (at least 2)
    #[arg(long)]
    spacing_factor: Option<f64>,
}

/// Everything a command needs once the settings sources are merged.
struct Resolved {
    config: Config,
    settings: DowelSettings,
    planner: ToolpathPlanner,
}

fn override_length(target: &mut f64, arg: &Option<String>, units: UnitSystem) -> Result<()> {
    if let Some(raw) = arg {
        *target = parse_length(raw, units)?;
    }
    Ok(())
}

impl GridArgs {
    fn resolve(&self) -> Result<Resolved> {
        let config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        let mut fields = match &self.properties {
            Some(path) => SettingsStore::new(path)
                .load()
                .with_context(|| format!("Failed to load settings {}", path.display()))?
                .into_fields(),
            None => config.dowel.clone(),
        };

        // Inherited lengths keep their physical size under a new unit system.
        if let Some(units) = self.units {
            if units != fields.units {
                debug!("Converting inherited settings from {} to {}", fields.units, units);
                fields = fields.converted_to(units);
            }
        }
        let units = fields.units;
        if let Some(x) = self.grid_x {
            fields.grid_count_x = x;
        }
        if let Some(y) = self.grid_y {
            fields.grid_count_y = y;
        }
        override_length(&mut fields.dowel_diameter, &self.dowel_diameter, units)?;
        override_length(&mut fields.dowel_length, &self.dowel_length, units)?;
        override_length(&mut fields.tool_diameter, &self.tool_diameter, units)?;
        override_length(&mut fields.pass_depth, &self.pass_depth, units)?;
        override_length(&mut fields.safety_height, &self.safety_height, units)?;
        if let Some(feed) = self.feed_rate {
            fields.feed_rate = feed;
        }

        let settings = DowelSettings::create(fields)?;
        let planner = PlannerSettings {
            spacing_factor: self
                .spacing_factor
                .unwrap_or(config.planner.spacing_factor),
        }
        .planner()?;

        Ok(Resolved {
            config,
            settings,
            planner,
        })
    }
}

fn generate(grid: &GridArgs, output: Option<&Path>, install: bool, comments: bool) -> Result<()> {
    let resolved = grid.resolve()?;
    let mut emitter = resolved.config.output.emitter();
    if comments {
        emitter = emitter.with_comments(true);
    }
    let controller = DowelController::with_planner(resolved.planner, resolved.settings)?
        .with_emitter(emitter);

    let target = match (output, install) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, true) => Some(resolved.config.output.target_path()),
        (None, false) => None,
    };

    match target {
        Some(path) => {
            let installed = controller
                .install_program(&path)
                .with_context(|| format!("Failed to install program {}", path.display()))?;
            info!("Program written to {}", installed.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            controller.write_program(&mut lock)?;
        }
    }
    Ok(())
}

fn preview(grid: &GridArgs, svg: bool) -> Result<()> {
    let resolved = grid.resolve()?;
    let units = resolved.settings.units();
    let controller = Arc::new(DowelController::with_planner(
        resolved.planner,
        resolved.settings,
    )?);

    let registry = RenderRegistry::new();
    let dowel_preview = Arc::new(DowelPreview::new(controller.clone()));
    registry.register(DowelPreview::DEFAULT_NAME, dowel_preview.clone());

    let mut out = io::stdout().lock();
    if svg {
        write!(out, "{}", dowel_preview.svg())?;
    } else {
        let plan = controller.current_plan();
        let (rapids, feeds) = plan.move_counts();
        let (min, max) = plan.bounds();
        writeln!(out, "Grid:      {} x {} ({} holes)", plan.grid_x, plan.grid_y, plan.hole_count())?;
        writeln!(out, "Passes:    {} per hole", plan.passes_per_hole)?;
        writeln!(out, "Segments:  {} ({} rapid, {} feed)", plan.len(), rapids, feeds)?;
        writeln!(
            out,
            "Spacing:   {} {}",
            dowelkit::format_length(plan.spacing, units),
            units.label()
        )?;
        writeln!(
            out,
            "Extent:    X {}..{}  Y {}..{}  Z {}..{} {}",
            dowelkit::format_length(min.x, units),
            dowelkit::format_length(max.x, units),
            dowelkit::format_length(min.y, units),
            dowelkit::format_length(max.y, units),
            dowelkit::format_length(min.z, units),
            dowelkit::format_length(max.z, units),
            units.label()
        )?;
        for (name, lines) in registry.render_all() {
            writeln!(out, "Preview:   {} ({} lines)", name, lines.len())?;
        }
    }
    registry.unregister(DowelPreview::DEFAULT_NAME);
    Ok(())
}

fn check(program: &Path, grid: &GridArgs) -> Result<()> {
    let resolved = grid.resolve()?;
    let text = std::fs::read_to_string(program)
        .with_context(|| format!("Failed to read {}", program.display()))?;
    let decoded = decode_program(&text)
        .with_context(|| format!("Failed to decode {}", program.display()))?;

    let plan = resolved.planner.plan(&resolved.settings)?;
    if decoded.units != plan.units {
        bail!(
            "{} is written in {} units, settings use {}",
            program.display(),
            decoded.units,
            plan.units
        );
    }

    let expected = PreviewAdapter::to_primitives(&plan);
    compare_lines(&expected, &decoded.lines, decoded.tolerance())
        .with_context(|| format!("{} does not match the planned toolpath", program.display()))?;

    println!("OK: {} motion lines match", expected.len());
    Ok(())
}

fn defaults(output: Option<&Path>, properties: bool) -> Result<()> {
    let config = Config::default();

    if properties {
        let json = serde_json::to_string_pretty(&write_properties(&DowelSettings::default())?)?;
        match output {
            Some(path) => std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => println!("{}", json),
        }
        return Ok(());
    }

    match output {
        Some(path) => config
            .save_to_file(path)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    init_logging(level)?;
    tracing::debug!("dowelkit {} (built {})", VERSION, BUILD_DATE);

    match &cli.command {
        Commands::Generate {
            grid,
            output,
            install,
            comments,
        } => generate(grid, output.as_deref(), *install, *comments),
        Commands::Preview { grid, svg } => preview(grid, *svg),
        Commands::Check { program, grid } => check(program, grid),
        Commands::Defaults { output, properties } => defaults(output.as_deref(), *properties),
    }
}
