//! Decoder for generated dowel programs.
//!
//! Reads back the vocabulary the emitter writes (`G20`/`G21`, `G90`, `G0`,
//! `G1` with `X`/`Y`/`Z`/`F` words, parenthesised or `;` comments) and turns
//! it into the same preview lines the adapter draws, so a program on disk can
//! be checked against a plan. Motion and feed are modal. Spindle and program
//! words (`M`, `S`, `T`, `N`) are accepted and ignored.

use crate::preview::{LineStyle, PreviewLine};
use dowelkit_camtools::dowel::Position;
use dowelkit_core::units::UnitSystem;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// A program line that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {reason}")]
pub struct GcodeDecodeError {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

impl GcodeDecodeError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// First difference found by [`compare_lines`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineMismatch {
    #[error("line {index}: style differs (expected {expected:?}, found {actual:?})")]
    Style {
        index: usize,
        expected: LineStyle,
        actual: LineStyle,
    },

    #[error("line {index}: geometry differs by {delta:.6} mm")]
    Geometry { index: usize, delta: f64 },

    #[error("expected {expected} lines, found {actual}")]
    Count { expected: usize, actual: usize },
}

/// Geometry recovered from a program.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedProgram {
    /// Units in effect at the end of the program.
    pub units: UnitSystem,
    /// Motion lines in millimeters, starting from the work origin.
    pub lines: Vec<PreviewLine>,
    /// Feed rate (mm/min) of each line, `None` for rapids.
    pub feed_rates: Vec<Option<f64>>,
}

impl DecodedProgram {
    /// Largest coordinate error (mm) introduced by the emitter's rounding.
    pub fn tolerance(&self) -> f64 {
        let places = self.units.decimal_places() as i32;
        0.5 * 10f64.powi(-places) * self.units.mm_per_unit() + 1e-9
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Rapid,
    Linear,
}

fn comment_regex() -> &'static Regex {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMENT_REGEX.get_or_init(|| Regex::new(r"\([^)]*\)|;.*").expect("invalid regex pattern"))
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"([A-Za-z])\s*([-+]?(?:\d+\.?\d*|\.\d+))").expect("invalid regex pattern")
    })
}

/// Decode program text into preview lines.
pub fn decode_program(text: &str) -> Result<DecodedProgram, GcodeDecodeError> {
    let mut units = UnitSystem::Metric;
    let mut motion: Option<Motion> = None;
    let mut feed_mm: Option<f64> = None;
    let mut position = Position::ORIGIN;
    let mut lines = Vec::new();
    let mut feed_rates = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let code = comment_regex().replace_all(raw, "");
        let code = code.trim();
        if code.is_empty() {
            continue;
        }
        if code.contains('(') || code.contains(')') {
            return Err(GcodeDecodeError::new(line_no, "unbalanced comment"));
        }

        let leftover = word_regex().replace_all(code, "");
        if !leftover.trim().is_empty() {
            return Err(GcodeDecodeError::new(
                line_no,
                format!("unexpected text '{}'", leftover.trim()),
            ));
        }

        let mut axes: [Option<f64>; 3] = [None, None, None];
        let mut feed_word = None;

        for caps in word_regex().captures_iter(code) {
            let letter = caps[1].to_ascii_uppercase();
            let value: f64 = caps[2]
                .parse()
                .map_err(|_| GcodeDecodeError::new(line_no, format!("bad number '{}'", &caps[2])))?;

            match letter.as_str() {
                "G" => match value {
                    v if v == 0.0 => motion = Some(Motion::Rapid),
                    v if v == 1.0 => motion = Some(Motion::Linear),
                    v if v == 20.0 => units = UnitSystem::Imperial,
                    v if v == 21.0 => units = UnitSystem::Metric,
                    v if v == 90.0 => {}
                    v if v == 91.0 => {
                        return Err(GcodeDecodeError::new(
                            line_no,
                            "incremental distance mode (G91) is not supported",
                        ))
                    }
                    v => {
                        return Err(GcodeDecodeError::new(
                            line_no,
                            format!("unsupported command G{}", v),
                        ))
                    }
                },
                "X" => axes[0] = Some(value),
                "Y" => axes[1] = Some(value),
                "Z" => axes[2] = Some(value),
                "F" => feed_word = Some(value),
                "M" | "S" | "T" | "N" => {}
                other => {
                    return Err(GcodeDecodeError::new(
                        line_no,
                        format!("unsupported word '{}'", other),
                    ))
                }
            }
        }

        // Words on a line take effect together, so units set on this line
        // already apply to its coordinates.
        if let Some(feed) = feed_word {
            if feed <= 0.0 {
                return Err(GcodeDecodeError::new(line_no, "feed rate must be positive"));
            }
            feed_mm = Some(units.to_mm(feed));
        }

        if axes.iter().all(Option::is_none) {
            continue;
        }

        let mut to = position;
        if let Some(x) = axes[0] {
            to.x = units.to_mm(x);
        }
        if let Some(y) = axes[1] {
            to.y = units.to_mm(y);
        }
        if let Some(z) = axes[2] {
            to.z = units.to_mm(z);
        }

        match motion {
            Some(Motion::Rapid) => {
                lines.push(PreviewLine::new(position, to, LineStyle::Rapid));
                feed_rates.push(None);
            }
            Some(Motion::Linear) => {
                let feed = feed_mm.ok_or_else(|| {
                    GcodeDecodeError::new(line_no, "feed move without a feed rate")
                })?;
                lines.push(PreviewLine::new(position, to, LineStyle::Feed));
                feed_rates.push(Some(feed));
            }
            None => {
                return Err(GcodeDecodeError::new(
                    line_no,
                    "coordinates before any motion command",
                ))
            }
        }
        position = to;
    }

    tracing::debug!("Decoded {} motion lines ({})", lines.len(), units);
    Ok(DecodedProgram {
        units,
        lines,
        feed_rates,
    })
}

/// Compare two line sequences, reporting the first difference.
///
/// Coordinates may differ by at most `tolerance` (mm) per axis.
pub fn compare_lines(
    expected: &[PreviewLine],
    actual: &[PreviewLine],
    tolerance: f64,
) -> Result<(), LineMismatch> {
    for (index, (e, a)) in expected.iter().zip(actual).enumerate() {
        match e.max_delta(a) {
            None => {
                return Err(LineMismatch::Style {
                    index,
                    expected: e.style,
                    actual: a.style,
                })
            }
            Some(delta) if delta > tolerance => {
                return Err(LineMismatch::Geometry { index, delta })
            }
            Some(_) => {}
        }
    }
    if expected.len() != actual.len() {
        return Err(LineMismatch::Count {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(())
}
