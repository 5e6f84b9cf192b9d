//! Ordering region outline vertices into chains.

use crate::region::{NeighborKind, RegionVertex};

/// One ordered run of outline vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedChain {
    pub vertices: Vec<RegionVertex>,
    /// The last vertex steps back onto the first one.
    pub closed: bool,
}

/// Move the preferred starting vertex to the front.
///
/// The last vertex touching both material and free space wins, then the
/// last one touching material, then the current first vertex.
pub fn set_starting_vertex(verts: &mut Vec<RegionVertex>) {
    let mut corner = None;
    let mut edge = None;
    for (i, v) in verts.iter().enumerate() {
        if v.count(NeighborKind::Blocked) > 0 {
            if v.count(NeighborKind::Free) > 0 {
                corner = Some(i);
            } else {
                edge = Some(i);
            }
        }
    }
    if let Some(i) = corner.or(edge) {
        let start = verts.remove(i);
        verts.insert(0, start);
    }
}

/// Whether moving one step along in-plane axis `axis` (`forward` for +1)
/// follows a material edge as seen from vertex `v`.
///
/// `ahead` selects the quadrants in the direction of travel; the arriving
/// vertex looks behind itself.
fn follows_edge(v: &RegionVertex, axis: usize, ahead: usize) -> bool {
    let mut q0 = [0, 0];
    let mut q1 = [1, 1];
    q0[axis] = ahead;
    q1[axis] = ahead;
    let k0 = v.neighbors[q0[0]][q0[1]];
    let k1 = v.neighbors[q1[0]][q1[1]];
    if k0 != NeighborKind::Blocked && k1 != NeighborKind::Blocked {
        return false;
    }
    // Free counts as material here: the edge must separate region from it.
    (k0 == NeighborKind::Region) != (k1 == NeighborKind::Region)
}

fn step_valid(from: &RegionVertex, to: &RegionVertex, axis: usize, forward: bool) -> bool {
    let ahead = forward as usize;
    follows_edge(from, axis, ahead) && follows_edge(to, axis, 1 - ahead)
}

/// Take the first vertex of `verts` and walk along the material edge as far
/// as possible. Visited vertices are removed from `verts`.
pub fn next_ordered_chain(verts: &mut Vec<RegionVertex>) -> OrderedChain {
    if verts.is_empty() {
        return OrderedChain {
            vertices: Vec::new(),
            closed: false,
        };
    }
    let mut ordered = vec![verts.remove(0)];
    let steps = verts.len();
    for _ in 0..steps {
        let Some(next) = find_next(&ordered, verts) else {
            break;
        };
        ordered.push(verts.remove(next));
    }

    let closed = ordered.len() > 3 && closes(&ordered);
    OrderedChain {
        vertices: ordered,
        closed,
    }
}

fn find_next(ordered: &[RegionVertex], verts: &[RegionVertex]) -> Option<usize> {
    let last = &ordered[ordered.len() - 1];
    let previous = ordered.len().checked_sub(2).map(|p| ordered[p].ind);
    for axis in 0..2 {
        for forward in [false, true] {
            let mut target = last.ind;
            target[axis] += if forward { 1 } else { -1 };
            if previous == Some(target) {
                continue;
            }
            let found = verts
                .iter()
                .position(|v| v.ind == target && step_valid(last, v, axis, forward));
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

fn closes(ordered: &[RegionVertex]) -> bool {
    let start = ordered[0].ind;
    let end = ordered[ordered.len() - 1].ind;
    let diff = [start[0] - end[0], start[1] - end[1]];
    let axis = match diff {
        [0, d] if d.abs() == 1 => 1,
        [d, 0] if d.abs() == 1 => 0,
        _ => return false,
    };
    follows_edge(&ordered[ordered.len() - 1], axis, (diff[axis] > 0) as usize)
}

/// Split all outline vertices into ordered chains.
pub fn order_outline(mut verts: Vec<RegionVertex>) -> Vec<OrderedChain> {
    let mut chains = Vec::new();
    while !verts.is_empty() {
        set_starting_vertex(&mut verts);
        chains.push(next_ordered_chain(&mut verts));
    }
    chains
}
