use crate::preview::{LineStyle, PreviewAdapter, PreviewLine};
use dowelkit_camtools::dowel::ToolpathPlan;
use std::fmt::Write;
use tracing::{debug, trace};

/// Top-view SVG path strings for a plan, rebuilt only when its content
/// hash changes. Y is negated so the drawing matches machine orientation.
#[derive(Debug, Default, Clone)]
pub struct ToolpathCache {
    content_hash: u64,
    lines: Vec<PreviewLine>,
    cached_path: String,
    cached_rapid_path: String,
    cached_feed_path: String,
    cached_hole_marks: String,
}

impl ToolpathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_update(&self, new_hash: u64) -> bool {
        self.content_hash != new_hash || self.lines.is_empty()
    }

    pub fn update(&mut self, new_hash: u64, lines: Vec<PreviewLine>) {
        self.content_hash = new_hash;
        self.lines = lines;
        self.rebuild_paths();
    }

    /// Rebuild from `plan` if it differs from the cached one.
    ///
    /// Returns true when the paths were rebuilt.
    pub fn refresh(&mut self, plan: &ToolpathPlan) -> bool {
        let hash = plan.content_hash();
        if !self.needs_update(hash) {
            trace!("Toolpath cache hit ({:016x})", hash);
            return false;
        }
        self.update(hash, PreviewAdapter::to_primitives(plan));
        true
    }

    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }

    pub fn lines(&self) -> &[PreviewLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All horizontal motion, rapid and feed alike.
    pub fn toolpath_svg(&self) -> &str {
        &self.cached_path
    }

    pub fn rapid_svg(&self) -> &str {
        &self.cached_rapid_path
    }

    pub fn feed_svg(&self) -> &str {
        &self.cached_feed_path
    }

    /// One zero-length mark per plunge location.
    pub fn hole_marks_svg(&self) -> &str {
        &self.cached_hole_marks
    }

    /// Standalone SVG document showing the cached toolpath.
    ///
    /// `hole_diameter` (mm) sets the stroke width of the hole marks.
    pub fn svg_document(&self, hole_diameter: f64) -> String {
        let margin = hole_diameter.max(1.0);
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
        for line in &self.lines {
            for p in [line.from, line.to] {
                min_x = min_x.min(p.x);
                max_x = max_x.max(p.x);
                min_y = min_y.min(svg_y(p.y));
                max_y = max_y.max(svg_y(p.y));
            }
        }

        let mut doc = String::new();
        let _ = writeln!(
            doc,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{:.2} {:.2} {:.2} {:.2}">"#,
            min_x - margin,
            min_y - margin,
            max_x - min_x + 2.0 * margin,
            max_y - min_y + 2.0 * margin
        );
        let _ = writeln!(
            doc,
            r#"  <path d="{}" fill="none" stroke="gray" stroke-width="0.2" stroke-dasharray="1 1"/>"#,
            self.cached_rapid_path.trim_end()
        );
        let _ = writeln!(
            doc,
            r#"  <path d="{}" fill="none" stroke="blue" stroke-width="0.4"/>"#,
            self.cached_feed_path.trim_end()
        );
        let _ = writeln!(
            doc,
            r#"  <path d="{}" fill="none" stroke="red" stroke-width="{:.2}" stroke-linecap="round"/>"#,
            self.cached_hole_marks.trim_end(),
            hole_diameter
        );
        doc.push_str("</svg>\n");
        doc
    }

    fn rebuild_paths(&mut self) {
        debug!("Rebuilding SVG paths from {} lines", self.lines.len());

        self.cached_path.clear();
        self.cached_rapid_path.clear();
        self.cached_feed_path.clear();
        self.cached_hole_marks.clear();

        if self.lines.is_empty() {
            debug!("No lines to render");
            return;
        }

        self.cached_path.reserve(self.lines.len() * 10);
        self.cached_rapid_path.reserve(self.lines.len() * 10);
        self.cached_hole_marks.reserve(self.lines.len() * 5);

        let mut last_mark = None;
        for line in &self.lines {
            let (from, to) = (line.from, line.to);

            if line.is_vertical() {
                // Plunges collapse to a point in top view.
                if line.style == LineStyle::Feed && last_mark != Some((to.x, to.y)) {
                    let _ = write!(
                        self.cached_hole_marks,
                        "M {:.2} {:.2} l 0 0 ",
                        to.x,
                        svg_y(to.y)
                    );
                    last_mark = Some((to.x, to.y));
                }
                continue;
            }

            let segment = format!(
                "M {:.2} {:.2} L {:.2} {:.2} ",
                from.x,
                svg_y(from.y),
                to.x,
                svg_y(to.y)
            );
            self.cached_path.push_str(&segment);
            match line.style {
                LineStyle::Rapid => self.cached_rapid_path.push_str(&segment),
                LineStyle::Feed => self.cached_feed_path.push_str(&segment),
            }
        }

        debug!(
            "SVG paths rebuilt: toolpath={} bytes, rapid={} bytes, holes={} bytes",
            self.cached_path.len(),
            self.cached_rapid_path.len(),
            self.cached_hole_marks.len()
        );
    }
}

/// SVG Y grows downwards. `0.0 - y` keeps zero positive in the output.
fn svg_y(y: f64) -> f64 {
    0.0 - y
}
