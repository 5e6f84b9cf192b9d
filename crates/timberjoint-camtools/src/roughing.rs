//! Rough-clearing lanes for open regions.
//!
//! Every region cell gets a set of parallel lanes along the first in-plane
//! axis, stepping across the cell along the second axis. Runs of cells with
//! the same boundary on the second axis are merged into one longer lane.

use crate::milling_path::MillVertex;
use crate::region::{LayerFrame, LayerGrid};
use timberjoint_core::geometry::normalize;

/// A region cell with its material neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoughPixel {
    /// Cell index in voxel coordinates.
    pub ind: [isize; 2],
    /// Lies on the padding rather than the voxel grid.
    pub outside: bool,
    /// `blocked[axis][side]`: the neighbour on `side` (0 = lower) along
    /// in-plane `axis` is the component's own material.
    pub blocked: [[bool; 2]; 2],
}

impl RoughPixel {
    /// Classify padded cell `(i, j)` against component `n` in `grid`.
    pub fn new(grid: &LayerGrid, cell: (usize, usize), n: usize, res: usize) -> Self {
        let [pad_i, pad_j] = grid.pad_lo();
        let ind = [cell.0 as isize - pad_i as isize, cell.1 as isize - pad_j as isize];
        let outside = ind.iter().any(|&c| c < 0 || c >= res as isize);
        let mut blocked = [[false; 2]; 2];
        for (axis, sides) in blocked.iter_mut().enumerate() {
            for (side, delta) in [-1isize, 1].into_iter().enumerate() {
                let mut probe = [cell.0 as isize, cell.1 as isize];
                probe[axis] += delta;
                sides[side] = grid.get(probe[0], probe[1]) == Some(n as i32);
            }
        }
        Self { ind, outside, blocked }
    }

    fn same_lane_as(&self, other: &RoughPixel) -> bool {
        !other.outside && self.blocked[1] == other.blocked[1]
    }
}

/// Lane layout for one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneLayout {
    pub count: usize,
    /// Distance between neighbouring lanes along the stepping axis.
    pub width: f64,
    /// Tool radius measured along the stretched stepping axis.
    pub edge_inset: f64,
}

impl LaneLayout {
    /// Lanes needed to clear one voxel of `timber_dim / res` with a tool of
    /// effective diameter `2 * radius`.
    pub fn new(frame: &LayerFrame, timber_dim: f64, voxel_size: f64, radius: f64) -> Self {
        let diameter = 2.0 * radius;
        let res = frame.res() as f64;
        let count = (2.0 + ((timber_dim / res - 2.0 * diameter) / diameter).ceil()).max(2.0) as usize;
        let stretch = frame.plane_vector(1).norm() / voxel_size;
        Self {
            count,
            width: (voxel_size - diameter) / (count - 1) as f64 * stretch,
            edge_inset: radius * stretch,
        }
    }
}

/// Lanes for every run of region cells; empty runs are dropped.
pub fn rough_milling_paths(
    pixels: &[RoughPixel],
    frame: &LayerFrame,
    layout: LaneLayout,
    radius: f64,
) -> Vec<Vec<MillVertex>> {
    let dir = normalize(&frame.plane_vector(0));
    let off = normalize(&frame.plane_vector(1));
    let find = |ind: [isize; 2], like: &RoughPixel| pixels.iter().find(|p| p.ind == ind && like.same_lane_as(p));

    let mut paths = Vec::new();
    for pix in pixels.iter().filter(|p| !p.outside) {
        if layout.count <= 2 && pix.blocked.iter().any(|sides| sides[0] && sides[1]) {
            continue;
        }
        // Only the first cell of a run starts lanes.
        if find([pix.ind[0] - 1, pix.ind[1]], pix).is_some() {
            continue;
        }
        let mut end = pix;
        for step in 1..frame.res() as isize {
            match find([pix.ind[0] + step, pix.ind[1]], pix) {
                Some(next) => end = next,
                None => break,
            }
        }

        let pull_start = if pix.blocked[0][0] { 2.5 * radius } else { 0.0 };
        let pull_end = if end.blocked[0][1] { 2.5 * radius } else { 0.0 };
        let start = frame.corner(pix.ind[0] as usize, pix.ind[1] as usize)
            + off * layout.edge_inset
            + dir * pull_start;
        let stop = frame.corner(end.ind[0] as usize + 1, end.ind[1] as usize)
            + off * layout.edge_inset
            - dir * pull_end;

        let mut lanes = Vec::new();
        for lane in 0..layout.count {
            if (lane == 0 && pix.blocked[1][0]) || (lane + 1 == layout.count && pix.blocked[1][1]) {
                continue;
            }
            let shift = off * (layout.width * lane as f64);
            let mut ends = [MillVertex::new(start + shift), MillVertex::new(stop + shift)];
            if lane % 2 == 1 {
                ends.reverse();
            }
            lanes.extend(ends);
        }
        if !lanes.is_empty() {
            paths.push(lanes);
        }
    }
    paths
}
