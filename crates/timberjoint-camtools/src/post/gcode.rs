//! G-code post-processor, also used for `.nc` files.

use super::{arc_radius, format_coord, PostProcessor};
use crate::arc_expander::ArcExpander;
use crate::milling_path::MillVertex;
use timberjoint_core::FabricationSettings;

/// Plain G-code with optional native arcs.
#[derive(Debug)]
pub struct GcodePost {
    feed_rate: f64,
    spindle_speed: f64,
    arc_interpolation: bool,
    expander: ArcExpander,
}

impl GcodePost {
    pub fn new(settings: &FabricationSettings) -> Self {
        Self {
            feed_rate: settings.feed_rate,
            spindle_speed: settings.spindle_speed,
            arc_interpolation: settings.arc_interpolation,
            expander: ArcExpander::default(),
        }
    }
}

impl PostProcessor for GcodePost {
    fn header(&self) -> String {
        let mut out = String::new();
        out.push_str("%\n");
        out.push_str("G90 (Absolute [G91 is incremental])\n");
        out.push_str("G17 (set XY plane for circle path)\n");
        out.push_str("G94 (set unit/minute)\n");
        out.push_str("G21 (set unit[mm])\n");
        out.push_str(&format!(
            "S{:.0} (Spindle {:.0}rpm)\n",
            self.spindle_speed, self.spindle_speed
        ));
        out.push_str("M3 (spindle start)\n");
        out.push_str("G54\n");
        out.push_str(&format!(
            "F{:.0} (Feed {:.0}mm/min)\n",
            self.feed_rate, self.feed_rate
        ));
        out
    }

    fn linear(&self, v: &MillVertex, previous: Option<&MillVertex>) -> String {
        let changed = |axis: usize| previous.map_or(true, |p| p.pt[axis] != v.pt[axis]);
        if !(0..3).any(changed) {
            return String::new();
        }
        let mut line = String::from(if v.is_traversing { "G0" } else { "G1" });
        for (axis, name) in ["X", "Y", "Z"].iter().enumerate() {
            if changed(axis) {
                line.push_str(&format!(" {}{}", name, format_coord(v.pt[axis])));
            }
        }
        line.push('\n');
        line
    }

    fn arc(&self, v: &MillVertex, previous: &MillVertex, clockwise: bool) -> String {
        let rises = v.pt.z != previous.pt.z;
        let mut out = String::new();
        if self.arc_interpolation {
            out.push_str(if clockwise { "G2" } else { "G3" });
            out.push_str(&format!(
                " R{} X{} Y{}",
                format_coord(arc_radius(v)),
                format_coord(v.pt.x),
                format_coord(v.pt.y)
            ));
            if rises {
                out.push_str(&format!(" Z{}", format_coord(v.pt.z)));
            }
            out.push('\n');
        } else {
            for pt in self
                .expander
                .expand_arc(&previous.pt, &v.pt, &v.arc_center, clockwise)
            {
                out.push_str(&format!("G1 X{} Y{}", format_coord(pt.x), format_coord(pt.y)));
                if rises {
                    out.push_str(&format!(" Z{}", format_coord(pt.z)));
                }
                out.push('\n');
            }
        }
        out
    }

    fn footer(&self) -> String {
        let mut out = String::new();
        out.push_str("M5 (Spindle stop)\n");
        out.push_str("M2 (end of program)\n");
        out.push_str("M30 (delete sd file)\n");
        out.push_str("%\n");
        out
    }
}
