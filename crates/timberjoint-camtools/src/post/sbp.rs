//! ShopBot part file post-processor.

use super::{arc_radius, format_coord, PostProcessor};
use crate::arc_expander::ArcExpander;
use crate::milling_path::MillVertex;
use timberjoint_core::FabricationSettings;

#[derive(Debug)]
pub struct SbpPost {
    feed_rate: f64,
    spindle_speed: f64,
    expander: ArcExpander,
}

impl SbpPost {
    pub fn new(settings: &FabricationSettings) -> Self {
        Self {
            feed_rate: settings.feed_rate,
            spindle_speed: settings.spindle_speed,
            expander: ArcExpander::default(),
        }
    }
}

impl PostProcessor for SbpPost {
    fn header(&self) -> String {
        // ShopBot move speeds are in units per second.
        let speed = self.feed_rate / 60.0;
        let mut out = String::new();
        out.push_str("'%\n");
        out.push_str("SA\n");
        out.push_str(&format!("MS,{:.2},{:.2}\n\n", speed, speed));
        out.push_str(&format!("TR {:.0}\n\n", self.spindle_speed));
        out.push_str("SO 1,1\n");
        out
    }

    fn linear(&self, v: &MillVertex, previous: Option<&MillVertex>) -> String {
        let changed = |axis: usize| previous.map_or(true, |p| p.pt[axis] != v.pt[axis]);
        if !(0..3).any(changed) {
            return String::new();
        }
        let fields: Vec<String> = (0..3)
            .map(|axis| {
                if changed(axis) {
                    format_coord(v.pt[axis])
                } else {
                    " ".to_string()
                }
            })
            .collect();
        let code = if v.is_traversing { "J3" } else { "M3" };
        format!("{},{}\n", code, fields.join(","))
    }

    fn arc(&self, v: &MillVertex, previous: &MillVertex, clockwise: bool) -> String {
        if v.pt.z == previous.pt.z {
            return format!(
                "CG,{},{},{},,,T,{}\n",
                format_coord(2.0 * arc_radius(v)),
                format_coord(v.pt.x),
                format_coord(v.pt.y),
                if clockwise { 1 } else { -1 }
            );
        }
        self.expander
            .expand_arc(&previous.pt, &v.pt, &v.arc_center, clockwise)
            .into_iter()
            .map(|pt| {
                format!(
                    "M3,{},{},{}\n",
                    format_coord(pt.x),
                    format_coord(pt.y),
                    format_coord(pt.z)
                )
            })
            .collect()
    }

    fn footer(&self) -> String {
        "SO 1,0\nEND\n'%\n".to_string()
    }
}
