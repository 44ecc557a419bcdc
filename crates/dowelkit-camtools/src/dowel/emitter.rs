//! G-code emission for toolpath plans.
//!
//! Output template, one line per item:
//!
//! ```text
//! G21                      (G20 when the plan is imperial)
//! G90
//! G0 X<x> Y<y> Z<z>        rapid
//! G1 X<x> Y<y> Z<z> F<f>   linear feed
//! ```
//!
//! Coordinates are written in the plan's unit system with 3 decimals (metric)
//! or 4 decimals (imperial). Feed rates keep at least 1 decimal and at least
//! 3 significant digits, so a positive feed never prints as zero. Lines are
//! produced lazily and written straight to the sink.

use super::toolpath::{MotionSegment, ToolpathPlan};
use dowelkit_core::units::UnitSystem;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag used to stop an in-flight emission.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Serialises a [`ToolpathPlan`] into G-code text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcodeEmitter {
    include_comments: bool,
}

impl GcodeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parenthesised summary block after the modal header.
    pub fn with_comments(mut self, include_comments: bool) -> Self {
        self.include_comments = include_comments;
        self
    }

    /// Units declaration for `units`.
    pub fn units_line(units: UnitSystem) -> &'static str {
        match units {
            UnitSystem::Metric => "G21",
            UnitSystem::Imperial => "G20",
        }
    }

    /// Decimal places used to write `feed`: one, or more for feeds below 10
    /// so that three significant digits survive.
    pub fn feed_decimal_places(feed: f64) -> usize {
        if !feed.is_finite() || feed <= 0.0 {
            return 1;
        }
        let magnitude = feed.log10().floor() as i64;
        (2 - magnitude).max(1) as usize
    }

    /// Format one motion segment in the plan's unit system.
    pub fn format_segment(segment: &MotionSegment, units: UnitSystem) -> String {
        let places = units.decimal_places();
        let to = segment.end();
        let x = units.from_mm(to.x);
        let y = units.from_mm(to.y);
        let z = units.from_mm(to.z);
        match segment {
            MotionSegment::Rapid { .. } => {
                format!("G0 X{:.*} Y{:.*} Z{:.*}", places, x, places, y, places, z)
            }
            MotionSegment::Linear { feed_rate, .. } => {
                let feed = units.from_mm(*feed_rate);
                format!(
                    "G1 X{:.*} Y{:.*} Z{:.*} F{:.*}",
                    places,
                    x,
                    places,
                    y,
                    places,
                    z,
                    Self::feed_decimal_places(feed),
                    feed
                )
            }
        }
    }

    fn header(&self, plan: &ToolpathPlan) -> Vec<String> {
        let mut header = vec![
            Self::units_line(plan.units).to_string(),
            "G90".to_string(),
        ];
        if self.include_comments {
            let label = plan.units.label();
            header.push(format!(
                "(Dowel grid {} x {}, {} holes)",
                plan.grid_x,
                plan.grid_y,
                plan.hole_count()
            ));
            header.push(format!(
                "(Spacing {:.*} {}, {} passes per hole)",
                plan.units.decimal_places(),
                plan.units.from_mm(plan.spacing),
                label,
                plan.passes_per_hole
            ));
            header.push(format!(
                "(Depth {:.*} {}, safety height {:.*} {})",
                plan.units.decimal_places(),
                plan.units.from_mm(-plan.min_z()),
                label,
                plan.units.decimal_places(),
                plan.units.from_mm(plan.safety_height),
                label
            ));
        }
        header
    }

    /// Lazily produced program lines, without terminators.
    pub fn lines<'a>(&self, plan: &'a ToolpathPlan) -> impl Iterator<Item = String> + 'a {
        let units = plan.units;
        self.header(plan).into_iter().chain(
            plan.segments
                .iter()
                .map(move |segment| Self::format_segment(segment, units)),
        )
    }

    /// Write the program for `plan` to `sink`.
    ///
    /// The first failed write aborts emission and is returned unchanged.
    pub fn emit<W: Write>(&self, plan: &ToolpathPlan, sink: &mut W) -> io::Result<()> {
        for line in self.lines(plan) {
            writeln!(sink, "{}", line)?;
        }
        sink.flush()
    }

    /// Like [`GcodeEmitter::emit`], but checks `token` before every line.
    ///
    /// Returns an `Interrupted` error once the token is cancelled.
    pub fn emit_cancellable<W: Write>(
        &self,
        plan: &ToolpathPlan,
        sink: &mut W,
        token: &CancellationToken,
    ) -> io::Result<usize> {
        let mut written = 0;
        for line in self.lines(plan) {
            if token.is_cancelled() {
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    format!("emission cancelled after {} lines", written),
                ));
            }
            writeln!(sink, "{}", line)?;
            written += 1;
        }
        sink.flush()?;
        Ok(written)
    }

    /// Render the whole program into a string.
    pub fn emit_to_string(&self, plan: &ToolpathPlan) -> String {
        let mut out = String::new();
        for line in self.lines(plan) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
