//! Joint validity evaluation.
//!
//! Path generation only needs the milling direction of each component and
//! a `valid` flag for filtering suggestions, so the checks sit behind the
//! [`JointEvaluator`] trait. [`DefaultEvaluator`] implements the standard
//! checks on the voxel matrix:
//!
//! - **connectivity**: every voxel of a component reaches one of its fixed
//!   faces through same-owner face neighbours
//! - **bridging**: a component fixed on two faces joins both in one piece
//! - **checkerboard**: no two components touch along a bare voxel edge
//! - **fabricability**: each component can be milled from one end of the
//!   sliding axis without undercuts
//! - **durability**: informational flag for single-voxel bottlenecks

use crate::fixed_sides::{Direction, FixedSide, FixedSides};
use crate::voxel::{edit_height_fields, HeightField, VoxelMatrix};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Most suggestions offered for an invalid design.
pub const MAX_SUGGESTIONS: usize = 4;

/// Outcome of evaluating one voxel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// All gating checks passed.
    pub valid: bool,
    /// Per component: every voxel is linked to a fixed face.
    pub connected: Vec<bool>,
    /// Per component: both fixed faces are joined (always true for one face).
    pub bridged: Vec<bool>,
    /// Some voxel edge is shared by two components only diagonally.
    pub checker: bool,
    /// Per component: direction in which the cut progresses along the
    /// sliding axis. `Negative` means milled from the positive face.
    pub fab_directions: Vec<Direction>,
    /// Per component: the chosen milling direction has no undercut.
    pub fab_ok: Vec<bool>,
    /// Per component: a single voxel carries the rest of the piece.
    pub fragile: Vec<bool>,
}

/// Anything that can judge a voxel configuration.
pub trait JointEvaluator {
    fn evaluate(&self, voxels: &VoxelMatrix, fixed_sides: &FixedSides) -> Evaluation;
}

/// Evaluator implementing the standard geometric checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEvaluator;

impl JointEvaluator for DefaultEvaluator {
    fn evaluate(&self, voxels: &VoxelMatrix, fixed_sides: &FixedSides) -> Evaluation {
        let count = voxels.component_count();
        let mut connected = Vec::with_capacity(count);
        let mut bridged = Vec::with_capacity(count);
        let mut fragile = Vec::with_capacity(count);
        for n in 0..count {
            let sides = fixed_sides.component(n);
            connected.push(is_connected(voxels, fixed_sides, n));
            bridged.push(sides.len() < 2 || is_bridged(voxels, fixed_sides, n));
            fragile.push(is_fragile(voxels, fixed_sides, n));
        }
        let checker = has_checker(voxels);
        let (fab_directions, fab_ok): (Vec<_>, Vec<_>) =
            fabrication_directions(voxels, fixed_sides).into_iter().unzip();

        let valid = connected.iter().all(|c| *c)
            && bridged.iter().all(|b| *b)
            && !checker
            && fab_ok.iter().all(|f| *f);

        Evaluation {
            valid,
            connected,
            bridged,
            checker,
            fab_directions,
            fab_ok,
            fragile,
        }
    }
}

/// Milling direction of each component and whether it is free of undercuts.
///
/// The first component prefers to be cut from the positive face, the last
/// from the negative face, middle components try the positive face first.
/// A direction is refused when its approach face is a fixed side or when
/// some column has foreign material behind the component's own material.
pub fn fabrication_directions(voxels: &VoxelMatrix, fixed_sides: &FixedSides) -> Vec<(Direction, bool)> {
    let count = voxels.component_count();
    (0..count)
        .map(|n| {
            let preferred = if n + 1 == count && n != 0 {
                [Direction::Positive, Direction::Negative]
            } else {
                [Direction::Negative, Direction::Positive]
            };
            preferred
                .into_iter()
                .find(|dir| direction_ok(voxels, fixed_sides, n, *dir))
                .map_or((preferred[0], false), |dir| (dir, true))
        })
        .collect()
}

fn direction_ok(voxels: &VoxelMatrix, fixed_sides: &FixedSides, n: usize, progression: Direction) -> bool {
    let sliding = voxels.sliding_axis();
    let approach = progression.opposite();
    if fixed_sides
        .component(n)
        .iter()
        .any(|side| side.axis == sliding && side.direction == approach)
    {
        return false;
    }
    let res = voxels.res();
    for i in 0..res {
        for j in 0..res {
            let mut reached_own = false;
            for step in 0..res {
                let k = match progression {
                    Direction::Negative => res - 1 - step,
                    Direction::Positive => step,
                };
                if voxels.owner_at(i, j, k) == n {
                    reached_own = true;
                } else if reached_own {
                    return false;
                }
            }
        }
    }
    true
}

fn face_neighbors(index: [usize; 3], res: usize) -> impl Iterator<Item = [usize; 3]> {
    (0..3).flat_map(move |axis| {
        let mut lower = None;
        let mut upper = None;
        if index[axis] > 0 {
            let mut n = index;
            n[axis] -= 1;
            lower = Some(n);
        }
        if index[axis] + 1 < res {
            let mut n = index;
            n[axis] += 1;
            upper = Some(n);
        }
        lower.into_iter().chain(upper)
    })
}

fn on_fixed_face(index: [usize; 3], res: usize, fixed_sides: &FixedSides, n: usize) -> bool {
    fixed_sides
        .component(n)
        .iter()
        .any(|side| index[side.axis.index()] == side.direction.index() * (res - 1))
}

/// Flood fill over voxels of `n` from `seeds`, never entering `excluded`.
fn reach(
    voxels: &VoxelMatrix,
    n: usize,
    seeds: impl Iterator<Item = [usize; 3]>,
    excluded: Option<[usize; 3]>,
) -> HashSet<[usize; 3]> {
    let mut visited: HashSet<[usize; 3]> = HashSet::new();
    let mut queue: VecDeque<[usize; 3]> = VecDeque::new();
    for seed in seeds {
        if Some(seed) != excluded && visited.insert(seed) {
            queue.push_back(seed);
        }
    }
    while let Some(index) = queue.pop_front() {
        for next in face_neighbors(index, voxels.res()) {
            if Some(next) == excluded || voxels.get(next) != n {
                continue;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

fn fixed_face_voxels<'a>(
    voxels: &'a VoxelMatrix,
    fixed_sides: &'a FixedSides,
    n: usize,
) -> impl Iterator<Item = [usize; 3]> + 'a {
    voxels
        .indices()
        .filter(move |idx| voxels.get(*idx) == n && on_fixed_face(*idx, voxels.res(), fixed_sides, n))
}

fn is_connected(voxels: &VoxelMatrix, fixed_sides: &FixedSides, n: usize) -> bool {
    let total = voxels.count(n);
    total == 0 || reach(voxels, n, fixed_face_voxels(voxels, fixed_sides, n), None).len() == total
}

fn is_bridged(voxels: &VoxelMatrix, fixed_sides: &FixedSides, n: usize) -> bool {
    let res = voxels.res();
    let sides = fixed_sides.component(n);
    let (first, second) = (sides[0], sides[1]);
    let on_face = |idx: &[usize; 3], side: FixedSide| {
        idx[side.axis.index()] == side.direction.index() * (res - 1)
    };
    let seeds = voxels
        .indices()
        .filter(|idx| voxels.get(*idx) == n && on_face(idx, first));
    reach(voxels, n, seeds, None)
        .iter()
        .any(|idx| on_face(idx, second))
}

fn is_fragile(voxels: &VoxelMatrix, fixed_sides: &FixedSides, n: usize) -> bool {
    let total = voxels.count(n);
    if total < 3 || !is_connected(voxels, fixed_sides, n) {
        return false;
    }
    let res = voxels.res();
    voxels
        .indices()
        .filter(|idx| voxels.get(*idx) == n && !on_fixed_face(*idx, res, fixed_sides, n))
        .any(|cut| {
            let reached = reach(voxels, n, fixed_face_voxels(voxels, fixed_sides, n), Some(cut));
            reached.len() + 1 < total
        })
}

fn has_checker(voxels: &VoxelMatrix) -> bool {
    let res = voxels.res();
    if res < 2 {
        return false;
    }
    for edge_axis in 0..3 {
        let (a, b) = match edge_axis {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        for c in 0..res {
            for i in 0..res - 1 {
                for j in 0..res - 1 {
                    let at = |di: usize, dj: usize| {
                        let mut idx = [0; 3];
                        idx[edge_axis] = c;
                        idx[a] = i + di;
                        idx[b] = j + dj;
                        voxels.get(idx)
                    };
                    let (v00, v01, v10, v11) = (at(0, 0), at(0, 1), at(1, 0), at(1, 1));
                    if v00 == v11 && v01 == v10 && v00 != v01 {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Single-cell ±1 edits of `fields` that evaluate valid, at most
/// [`MAX_SUGGESTIONS`].
pub fn produce_suggestions<E: JointEvaluator + ?Sized>(
    evaluator: &E,
    fields: &[HeightField],
    fixed_sides: &FixedSides,
    voxels: &VoxelMatrix,
) -> Vec<Vec<HeightField>> {
    let res = voxels.res();
    let mut suggestions = Vec::new();
    for (f, field) in fields.iter().enumerate() {
        for i in 0..res {
            for j in 0..res {
                for delta in [-1i64, 1] {
                    let value = field.get(i, j) as i64 + delta;
                    if value < 0 || value > res as i64 {
                        continue;
                    }
                    let mut candidate = fields.to_vec();
                    if edit_height_fields(&mut candidate, &[(i, j)], value as usize, f).is_err() {
                        continue;
                    }
                    let matrix = VoxelMatrix::from_height_fields(&candidate, voxels.sliding_axis(), res);
                    if evaluator.evaluate(&matrix, fixed_sides).valid {
                        suggestions.push(candidate);
                        if suggestions.len() == MAX_SUGGESTIONS {
                            debug!("Suggestion limit reached");
                            return suggestions;
                        }
                    }
                }
            }
        }
    }
    suggestions
}
