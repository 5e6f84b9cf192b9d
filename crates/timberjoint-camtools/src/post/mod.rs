//! Post-processors for converting machine-space paths to control files.

mod gcode;
mod sbp;

pub use gcode::GcodePost;
pub use sbp::SbpPost;

use crate::milling_path::MillVertex;
use timberjoint_core::geometry::angle_between;
use timberjoint_core::{ExportFormat, FabricationSettings, Vec3};

/// Decimals written for every coordinate.
pub const PRECISION: usize = 3;

/// State tracked during post-processing.
#[derive(Debug, Clone, Default)]
pub struct PostState {
    /// Vertex written last.
    pub previous: Option<MillVertex>,
    /// Number of motion lines written so far.
    pub moves: usize,
}

/// Trait for post-processors that turn a path into a control file.
///
/// Vertices must already be in machine space and rounded, so unchanged
/// axes compare equal.
pub trait PostProcessor {
    /// Program start: units, modes, spindle and feed.
    fn header(&self) -> String;

    /// A rapid or cutting move to `v`. Returns an empty string when nothing
    /// moves.
    fn linear(&self, v: &MillVertex, previous: Option<&MillVertex>) -> String;

    /// An arc from `previous` to `v` around their shared center.
    fn arc(&self, v: &MillVertex, previous: &MillVertex, clockwise: bool) -> String;

    /// Program end.
    fn footer(&self) -> String;

    /// Complete file contents for one component path.
    fn generate(&self, vertices: &[MillVertex]) -> String {
        let mut output = String::new();
        let mut state = PostState::default();

        output.push_str(&self.header());

        for v in vertices {
            let line = match state.previous.as_ref() {
                Some(prev) if v.is_connected_arc(prev) => self.arc(v, prev, is_clockwise(v, prev)),
                prev => self.linear(v, prev),
            };
            if !line.is_empty() {
                state.moves += 1;
            }
            output.push_str(&line);
            state.previous = Some(v.clone());
        }

        output.push_str(&self.footer());
        output
    }
}

/// Post-processor for `format`.
pub fn post_for(format: ExportFormat, settings: &FabricationSettings) -> Box<dyn PostProcessor> {
    match format {
        ExportFormat::Gcode | ExportFormat::Nc => Box::new(GcodePost::new(settings)),
        ExportFormat::Sbp => Box::new(SbpPost::new(settings)),
    }
}

/// Format a coordinate with [`PRECISION`] decimals; negative zero prints
/// as `0.000`.
pub fn format_coord(value: f64) -> String {
    let s = format!("{:.prec$}", value, prec = PRECISION);
    if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
        s[1..].to_string()
    } else {
        s
    }
}

/// Whether the arc ending at `v` turns clockwise seen from +Z.
pub fn is_clockwise(v: &MillVertex, previous: &MillVertex) -> bool {
    let flat = |p: Vec3| Vec3::new(p.x, p.y, 0.0);
    let radial = flat(v.pt - v.arc_center);
    let tangent = radial.cross(&Vec3::z());
    let back = flat(previous.pt - v.arc_center);
    angle_between(&tangent, &back) > 0.5 * std::f64::consts::PI
}

/// Radius of the arc ending at `v`, measured in the XY plane.
pub fn arc_radius(v: &MillVertex) -> f64 {
    (v.pt - v.arc_center).xy().norm()
}
