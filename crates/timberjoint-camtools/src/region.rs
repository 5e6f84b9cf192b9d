//! Layer extraction and region outlines.
//!
//! One layer of one component is read from the voxel matrix as a 2D owner
//! grid, padded with the owners of the fixed sides that border it. Every
//! connected patch of foreign material in that grid is a region; its outline
//! is the set of grid corners touching it, each with a 2×2 classification of
//! the surrounding cells.

use std::collections::{HashSet, VecDeque};
use timberjoint_core::{Axis, Direction, FixedSides, Vec3, VoxelMatrix};

/// Padding cell that belongs to no component (two fixed sides meet).
pub const OUTSIDE: i32 = -1;
/// Quadrant value reported for a cell holding [`OUTSIDE`].
pub const SENTINEL: i32 = -2;

/// Coordinate frame of one milling layer.
#[derive(Debug, Clone)]
pub struct LayerFrame {
    res: usize,
    sliding_axis: Axis,
    fab_direction: Direction,
    layer: usize,
    pos_vecs: [Vec3; 3],
}

impl LayerFrame {
    pub fn new(res: usize, sliding_axis: Axis, fab_direction: Direction, layer: usize, pos_vecs: [Vec3; 3]) -> Self {
        Self {
            res,
            sliding_axis,
            fab_direction,
            layer,
            pos_vecs,
        }
    }

    pub fn res(&self) -> usize {
        self.res
    }

    pub fn sliding_axis(&self) -> Axis {
        self.sliding_axis
    }

    pub fn fab_direction(&self) -> Direction {
        self.fab_direction
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn is_last_layer(&self) -> bool {
        self.layer + 1 == self.res
    }

    pub fn pos_vecs(&self) -> &[Vec3; 3] {
        &self.pos_vecs
    }

    /// The in-plane axes, ascending.
    pub fn plane_axes(&self) -> [Axis; 2] {
        self.sliding_axis.others()
    }

    /// Grid vector of in-plane axis `k` (0 or 1).
    pub fn plane_vector(&self, k: usize) -> Vec3 {
        self.pos_vecs[self.plane_axes()[k].index()]
    }

    /// Voxel layer read along the sliding axis. Layers are counted from the
    /// face the tool enters through.
    pub fn voxel_layer(&self) -> usize {
        match self.fab_direction {
            Direction::Negative => self.res - 1 - self.layer,
            Direction::Positive => self.layer,
        }
    }

    /// Grid corner coordinate of the face the tool enters the layer through.
    pub fn entry_face(&self) -> usize {
        self.voxel_layer() + 1 - self.fab_direction.index()
    }

    /// Model-space position of grid corner `index`.
    pub fn point(&self, index: [usize; 3]) -> Vec3 {
        let half = 0.5 * self.res as f64;
        (0..3).fold(Vec3::zeros(), |acc, a| acc + self.pos_vecs[a] * (index[a] as f64 - half))
    }

    /// Position of in-plane corner `(i, j)` on the entry face.
    pub fn corner(&self, i: usize, j: usize) -> Vec3 {
        let [a, b] = self.plane_axes();
        let mut index = [0; 3];
        index[a.index()] = i;
        index[b.index()] = j;
        index[self.sliding_axis.index()] = self.entry_face();
        self.point(index)
    }
}

/// Owner grid of one layer, padded with fixed-side owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerGrid {
    rows: usize,
    cols: usize,
    cells: Vec<i32>,
    pad_lo: [usize; 2],
}

impl LayerGrid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Padding rows/columns added before the voxel cells on each axis.
    pub fn pad_lo(&self) -> [usize; 2] {
        self.pad_lo
    }

    pub fn get(&self, i: isize, j: isize) -> Option<i32> {
        if i < 0 || j < 0 || i as usize >= self.rows || j as usize >= self.cols {
            return None;
        }
        Some(self.cells[i as usize * self.cols + j as usize])
    }

    pub fn set(&mut self, i: usize, j: usize, value: i32) {
        self.cells[i * self.cols + j] = value;
    }

    /// First cell in row-major order owned by neither `n` nor the outside.
    pub fn first_foreign(&self, n: usize) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|v| *v != OUTSIDE && *v != n as i32)
            .map(|p| (p / self.cols, p % self.cols))
    }
}

/// Read layer `frame.layer()` from the voxels and pad it with the owners of
/// the fixed sides around it.
pub fn padded_layer(voxels: &VoxelMatrix, fixed_sides: &FixedSides, frame: &LayerFrame) -> LayerGrid {
    let res = frame.res();
    let sliding = frame.sliding_axis();
    let mut pad = [[false; 2]; 2];
    let mut pad_value = [[OUTSIDE; 2]; 2];
    for (n, sides) in fixed_sides.sides().iter().enumerate() {
        for side in sides {
            if let Some(k) = sliding.plane_index(side.axis) {
                pad[k][side.direction.index()] = true;
                pad_value[k][side.direction.index()] = n as i32;
            }
        }
    }
    let pad_lo = [pad[0][0] as usize, pad[1][0] as usize];
    let rows = res + pad_lo[0] + pad[0][1] as usize;
    let cols = res + pad_lo[1] + pad[1][1] as usize;

    let layer = frame.voxel_layer();
    let mut cells = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let vi = i as isize - pad_lo[0] as isize;
            let vj = j as isize - pad_lo[1] as isize;
            // Column padding is written last and wins at the corners.
            let value = if vj < 0 {
                pad_value[1][0]
            } else if vj as usize >= res {
                pad_value[1][1]
            } else if vi < 0 {
                pad_value[0][0]
            } else if vi as usize >= res {
                pad_value[0][1]
            } else {
                voxels.owner_at(vi as usize, vj as usize, layer) as i32
            };
            cells.push(value);
        }
    }
    let mut grid = LayerGrid {
        rows,
        cols,
        cells,
        pad_lo,
    };

    let plane_sides: Vec<(usize, Direction)> = fixed_sides
        .sides()
        .iter()
        .flatten()
        .filter_map(|side| sliding.plane_index(side.axis).map(|k| (k, side.direction)))
        .collect();
    for &(k1, d1) in &plane_sides {
        for &(k2, d2) in &plane_sides {
            if k1 != 0 || k2 != 1 {
                continue;
            }
            let i = d1.index() * (rows - 1);
            let j = d2.index() * (cols - 1);
            grid.set(i, j, OUTSIDE);
        }
    }
    grid
}

/// Breadth-first collection of the foreign cells connected to `seed`.
///
/// Cells owned by `n` and outside cells stop the fill.
pub fn collect_region(grid: &LayerGrid, seed: (usize, usize), n: usize) -> Vec<(usize, usize)> {
    let mut region = vec![seed];
    let mut visited = HashSet::from([seed]);
    let mut queue = VecDeque::from([seed]);
    while let Some((i, j)) = queue.pop_front() {
        for (di, dj) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
            let ni = i as isize + di;
            let nj = j as isize + dj;
            let Some(value) = grid.get(ni, nj) else {
                continue;
            };
            if value == n as i32 || value == OUTSIDE {
                continue;
            }
            let cell = (ni as usize, nj as usize);
            if visited.insert(cell) {
                region.push(cell);
                queue.push_back(cell);
            }
        }
    }
    region
}

/// How a cell next to a region corner relates to the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborKind {
    /// Part of the region being milled.
    Region,
    /// Material of the component itself.
    Blocked,
    /// Outside the grid or an outside padding cell.
    Free,
}

/// A grid corner on a region outline.
///
/// Quadrant `[a][b]` is the cell at `(i - 1 + a, j - 1 + b)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionVertex {
    /// Corner index in voxel coordinates (may lie on the padding).
    pub ind: [isize; 2],
    pub neighbors: [[NeighborKind; 2]; 2],
    /// Owner of each quadrant; `-1` off the grid, [`SENTINEL`] for outside cells.
    pub values: [[i32; 2]; 2],
    /// Split from a checkerboard corner.
    pub diagonal: bool,
}

impl RegionVertex {
    pub fn count(&self, kind: NeighborKind) -> usize {
        self.neighbors.iter().flatten().filter(|k| **k == kind).count()
    }

    /// First quadrant of `kind` in row-major order.
    pub fn first(&self, kind: NeighborKind) -> Option<(usize, usize)> {
        quadrants().find(|&(a, b)| self.neighbors[a][b] == kind)
    }

    /// First quadrant holding `value` in row-major order.
    pub fn first_value(&self, value: i32) -> Option<(usize, usize)> {
        quadrants().find(|&(a, b)| self.values[a][b] == value)
    }

    pub fn value_count(&self, value: i32) -> usize {
        self.values.iter().flatten().filter(|v| **v == value).count()
    }
}

pub(crate) fn quadrants() -> impl Iterator<Item = (usize, usize)> {
    [(0, 0), (0, 1), (1, 0), (1, 1)].into_iter()
}

/// Corners of `region` with their classification.
///
/// `grid` must already have the region overwritten with `n`; owner values
/// are read from `original`. Checkerboard corners (two region and two
/// blocked cells on the diagonals) yield one vertex per region quadrant.
pub fn region_outline_vertices(
    region: &[(usize, usize)],
    grid: &LayerGrid,
    original: &LayerGrid,
) -> Vec<RegionVertex> {
    let members: HashSet<(usize, usize)> = region.iter().copied().collect();
    let [pad_i, pad_j] = grid.pad_lo();
    let mut vertices = Vec::new();
    for i in 0..=grid.rows() {
        for j in 0..=grid.cols() {
            let mut neighbors = [[NeighborKind::Free; 2]; 2];
            let mut values = [[OUTSIDE; 2]; 2];
            for (a, b) in quadrants() {
                let ci = i as isize - 1 + a as isize;
                let cj = j as isize - 1 + b as isize;
                let is_member = ci >= 0 && cj >= 0 && members.contains(&(ci as usize, cj as usize));
                let (kind, value) = if is_member {
                    (NeighborKind::Region, original.get(ci, cj).unwrap_or(OUTSIDE))
                } else {
                    match grid.get(ci, cj) {
                        None => (NeighborKind::Free, OUTSIDE),
                        Some(v) if v < 0 => (NeighborKind::Free, SENTINEL),
                        Some(_) => (NeighborKind::Blocked, original.get(ci, cj).unwrap_or(OUTSIDE)),
                    }
                };
                neighbors[a][b] = kind;
                values[a][b] = value;
            }

            let vertex = RegionVertex {
                ind: [i as isize - pad_i as isize, j as isize - pad_j as isize],
                neighbors,
                values,
                diagonal: false,
            };
            let regions = vertex.count(NeighborKind::Region);
            if regions == 0 || regions == 4 {
                continue;
            }
            let checker = regions == 2
                && vertex.count(NeighborKind::Blocked) == 2
                && neighbors[0][1] == neighbors[1][0]
                && neighbors[0][0] == neighbors[1][1];
            if checker {
                for (a, b) in quadrants().filter(|&(a, b)| neighbors[a][b] == NeighborKind::Region) {
                    let mut split = vertex.clone();
                    split.neighbors[a][b] = NeighborKind::Blocked;
                    split.diagonal = true;
                    vertices.push(split);
                }
            } else {
                vertices.push(vertex);
            }
        }
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use timberjoint_core::{FixedSide, HeightField};

    fn frame(res: usize, dir: Direction, layer: usize) -> LayerFrame {
        let v = 10.0;
        LayerFrame::new(
            res,
            Axis::Z,
            dir,
            layer,
            [Vec3::new(v, 0.0, 0.0), Vec3::new(0.0, v, 0.0), Vec3::new(0.0, 0.0, v)],
        )
    }

    fn voxels(rows: Vec<Vec<usize>>) -> VoxelMatrix {
        let field = HeightField::from_rows(rows).unwrap();
        VoxelMatrix::from_height_fields(&[field], Axis::Z, 3)
    }

    #[test]
    fn test_layer_order_follows_fab_direction() {
        let f = frame(3, Direction::Negative, 0);
        assert_eq!(f.voxel_layer(), 2);
        assert_eq!(f.entry_face(), 3);
        let f = frame(3, Direction::Positive, 0);
        assert_eq!(f.voxel_layer(), 0);
        assert_eq!(f.entry_face(), 0);
        assert!((f.corner(0, 0) - Vec3::new(-15.0, -15.0, -15.0)).norm() < 1e-9);
    }

    #[test]
    fn test_no_padding_for_sliding_axis_sides() {
        let m = voxels(vec![vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1]]);
        let grid = padded_layer(&m, &FixedSides::default(), &frame(3, Direction::Negative, 2));
        assert_eq!((grid.rows(), grid.cols()), (3, 3));
        assert_eq!(grid.pad_lo(), [0, 0]);
        assert_eq!(grid.get(1, 1), Some(0));
    }

    #[test]
    fn test_padding_and_outside_corners() {
        let m = voxels(vec![vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1]]);
        let sides = FixedSides::new(
            vec![
                vec![FixedSide::new(Axis::X, Direction::Negative)],
                vec![FixedSide::new(Axis::Y, Direction::Positive)],
            ],
            Axis::Z,
        );
        let grid = padded_layer(&m, &sides, &frame(3, Direction::Negative, 2));
        assert_eq!((grid.rows(), grid.cols()), (4, 4));
        assert_eq!(grid.pad_lo(), [1, 0]);
        // Row 0 is component 0's padding, column 3 component 1's.
        assert_eq!(grid.get(0, 1), Some(0));
        assert_eq!(grid.get(2, 3), Some(1));
        assert_eq!(grid.get(0, 3), Some(OUTSIDE));
    }

    #[test]
    fn test_island_region_and_outline() {
        // Component 1 fills the centre column down to the bottom layer.
        let m = voxels(vec![vec![3, 3, 3], vec![3, 0, 3], vec![3, 3, 3]]);
        let f = frame(3, Direction::Negative, 2);
        let mut grid = padded_layer(&m, &FixedSides::default(), &f);
        let original = grid.clone();
        let seed = grid.first_foreign(0).unwrap();
        assert_eq!(seed, (1, 1));
        let region = collect_region(&grid, seed, 0);
        assert_eq!(region, vec![(1, 1)]);
        for &(i, j) in &region {
            grid.set(i, j, 0);
        }
        let verts = region_outline_vertices(&region, &grid, &original);
        assert_eq!(verts.len(), 4);
        for v in &verts {
            assert_eq!(v.count(NeighborKind::Region), 1);
            assert_eq!(v.count(NeighborKind::Blocked), 3);
            assert_eq!(v.value_count(1), 1);
        }
        assert_eq!(grid.first_foreign(0), None);
    }

    #[test]
    fn test_checkerboard_corner_is_split() {
        let m = voxels(vec![vec![3, 0, 3], vec![0, 3, 3], vec![3, 3, 3]]);
        let f = frame(3, Direction::Negative, 2);
        let mut grid = padded_layer(&m, &FixedSides::default(), &f);
        let original = grid.clone();
        let region = collect_region(&grid, (0, 1), 0);
        assert_eq!(region, vec![(0, 1)]);
        for &(i, j) in &region {
            grid.set(i, j, 0);
        }
        let verts = region_outline_vertices(&region, &grid, &original);
        assert!(verts.iter().all(|v| !v.diagonal));

        // Both foreign cells in one region produce a split corner at (1, 1).
        let region = vec![(0, 1), (1, 0)];
        let mut grid = original.clone();
        for &(i, j) in &region {
            grid.set(i, j, 0);
        }
        let verts = region_outline_vertices(&region, &grid, &original);
        let split: Vec<_> = verts.iter().filter(|v| v.ind == [1, 1]).collect();
        assert_eq!(split.len(), 2);
        assert!(split.iter().all(|v| v.diagonal && v.count(NeighborKind::Region) == 1));
    }
}
