//! Depth layering of 2D paths.
//!
//! A path found on the entry face of a voxel layer is repeated at several
//! depths until the whole layer is cleared. The stored order is reversed
//! after every pass so consecutive passes join without a retract.

use crate::milling_path::MillVertex;
use timberjoint_core::{Axis, Direction};

/// Height of the final retract above the last cut (mm).
pub const RETRACT_HEIGHT: f64 = 15.0;

/// Number of passes per voxel layer and the depth of each.
pub fn pass_depths(voxel_height: f64, pass_depth: f64) -> (usize, f64) {
    let count = ((voxel_height / pass_depth).ceil() as usize).max(1);
    (count, voxel_height / count as f64)
}

/// Everything the layering step needs to know about one voxel layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerDepths {
    pub sliding_axis: Axis,
    pub fab_direction: Direction,
    /// Layer number counted from the entry face.
    pub layer: usize,
    pub res: usize,
    pub voxel_height: f64,
    pub passes: usize,
    pub pass_depth: f64,
    /// The component is not fixed on the sliding axis, so the last layer
    /// cuts one pass deeper to clear the far face.
    pub extra_final_pass: bool,
    pub incremental: bool,
}

impl LayerDepths {
    fn sign(&self) -> f64 {
        self.fab_direction.sign()
    }

    fn shifted(&self, v: &MillVertex, depth: f64) -> MillVertex {
        let ax = self.sliding_axis.index();
        let mut out = v.clone();
        out.pt[ax] += depth;
        if out.is_arc {
            out.arc_center[ax] += depth;
        }
        out.is_traversing = false;
        out
    }
}

/// Cumulative length fraction at each vertex of `outline`.
pub fn segment_proportions(outline: &[MillVertex]) -> Vec<f64> {
    let mut lengths = vec![0.0];
    for pair in outline.windows(2) {
        let last = lengths[lengths.len() - 1];
        lengths.push(last + (pair[1].pt - pair[0].pt).norm());
    }
    let total = lengths[lengths.len() - 1];
    if total == 0.0 {
        return vec![0.0; outline.len()];
    }
    lengths.iter().map(|l| l / total).collect()
}

/// Replicate `outline` over the passes of one layer.
///
/// The sequence starts with a rapid to a safe height above the first point.
/// With incremental depth every pass ramps down along the path length and a
/// flat final pass is added at full depth.
pub fn layered_vertices(outline: &[MillVertex], depths: &LayerDepths) -> Vec<MillVertex> {
    let Some(first) = outline.first() else {
        return Vec::new();
    };
    let ax = depths.sliding_axis.index();
    let sign = depths.sign();
    let mut out = Vec::new();

    let mut safe = first.pt;
    safe[ax] -= sign * (depths.layer as f64 * depths.voxel_height + 2.0 * depths.pass_depth);
    out.push(MillVertex::traverse(safe));
    if depths.layer != 0 {
        let mut above = first.pt;
        above[ax] -= sign * depths.pass_depth;
        out.push(MillVertex::traverse(above));
    }

    let start = if depths.layer == 0 { 0 } else { 1 };
    let mut end = depths.passes + 1;
    if depths.layer + 1 == depths.res && depths.extra_final_pass {
        end += 1;
    }
    let mut props = if depths.incremental {
        end += 1;
        segment_proportions(outline)
    } else {
        vec![1.0; outline.len()]
    };

    let mut path = outline.to_vec();
    for pass in start..end {
        if depths.incremental && pass + 1 == end {
            props = vec![0.0; path.len()];
        }
        for (v, prop) in path.iter().zip(&props) {
            let depth = sign * ((pass as f64 - 1.0) + prop) * depths.pass_depth;
            out.push(depths.shifted(v, depth));
        }
        path.reverse();
        // Keep the ramp rising from the new start of the path.
        if depths.incremental {
            props = props.iter().rev().map(|p| 1.0 - p).collect();
        }
    }
    out
}

/// Retract from the last cut and return to the joint origin.
pub fn end_points(last: &MillVertex, sliding_axis: Axis, fab_direction: Direction) -> [MillVertex; 2] {
    let ax = sliding_axis.index();
    let mut retract = last.pt;
    retract[ax] -= fab_direction.sign() * RETRACT_HEIGHT;
    let mut origin = timberjoint_core::Vec3::zeros();
    origin[ax] = retract[ax];
    [MillVertex::traverse(retract), MillVertex::traverse(origin)]
}
