//! Height fields and the derived voxel matrix.
//!
//! A design with `N` components stores `N - 1` height fields stacked along
//! the sliding axis. Field `n` is the boundary between component `n` and
//! component `n + 1`: voxel layer `k` of column `(i, j)` belongs to the
//! first component whose field is above `k`, otherwise to the last one.
//! The fields are kept non-decreasing per column so every column is split
//! into contiguous runs.

use crate::error::{JointError, JointResult};
use crate::fixed_sides::Axis;
use rand::Rng;
use std::collections::{HashSet, VecDeque};

/// Square grid of layer counts, one value per column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeightField {
    res: usize,
    values: Vec<usize>,
}

impl HeightField {
    /// All-zero field.
    pub fn new(res: usize) -> Self {
        Self {
            res,
            values: vec![0; res * res],
        }
    }

    /// Field filled with `height`.
    pub fn filled(res: usize, height: usize) -> JointResult<Self> {
        if height > res {
            return Err(JointError::HeightOutOfRange {
                i: 0,
                j: 0,
                value: height,
                res,
            });
        }
        Ok(Self {
            res,
            values: vec![height; res * res],
        })
    }

    /// Build from row-major rows, checking shape and value range.
    pub fn from_rows(rows: Vec<Vec<usize>>) -> JointResult<Self> {
        let res = rows.len();
        let mut values = Vec::with_capacity(res * res);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != res {
                return Err(JointError::HeightFieldShape(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    res
                )));
            }
            for (j, value) in row.into_iter().enumerate() {
                if value > res {
                    return Err(JointError::HeightOutOfRange { i, j, value, res });
                }
                values.push(value);
            }
        }
        Ok(Self { res, values })
    }

    pub fn res(&self) -> usize {
        self.res
    }

    pub fn get(&self, i: usize, j: usize) -> usize {
        self.values[i * self.res + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: usize) -> JointResult<()> {
        if i >= self.res || j >= self.res {
            return Err(JointError::CellOutOfRange { i, j, res: self.res });
        }
        if value > self.res {
            return Err(JointError::HeightOutOfRange {
                i,
                j,
                value,
                res: self.res,
            });
        }
        self.values[i * self.res + j] = value;
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.values.chunks(self.res.max(1))
    }

    /// Cells 4-connected to `seed` that share its height, seed first.
    pub fn same_height_neighbors(&self, seed: (usize, usize)) -> Vec<(usize, usize)> {
        if seed.0 >= self.res || seed.1 >= self.res {
            return Vec::new();
        }
        let height = self.get(seed.0, seed.1);
        let mut visited = HashSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        let mut patch = Vec::new();
        while let Some((i, j)) = queue.pop_front() {
            patch.push((i, j));
            for (ni, nj) in grid_neighbors(i, j, self.res) {
                if self.get(ni, nj) == height && visited.insert((ni, nj)) {
                    queue.push_back((ni, nj));
                }
            }
        }
        patch
    }
}

fn grid_neighbors(i: usize, j: usize, res: usize) -> impl Iterator<Item = (usize, usize)> {
    let candidates = [
        (i.checked_sub(1), Some(j)),
        (Some(i + 1).filter(|v| *v < res), Some(j)),
        (Some(i), j.checked_sub(1)),
        (Some(i), Some(j + 1).filter(|v| *v < res)),
    ];
    candidates
        .into_iter()
        .filter_map(|(a, b)| Some((a?, b?)))
}

/// Check that `fields` fit a design with `component_count` components.
pub fn validate_height_fields(fields: &[HeightField], res: usize, component_count: usize) -> JointResult<()> {
    if fields.len() + 1 != component_count {
        return Err(JointError::HeightFieldShape(format!(
            "{} height fields for {} components",
            fields.len(),
            component_count
        )));
    }
    for field in fields {
        if field.res() != res {
            return Err(JointError::HeightFieldShape(format!(
                "field resolution {} does not match voxel resolution {}",
                field.res(),
                res
            )));
        }
    }
    Ok(())
}

/// Set the boundary `field_index` to `height` on every cell in `faces`.
///
/// Fields above the edited one are raised and fields below it are lowered
/// where needed so each column stays non-decreasing.
pub fn edit_height_fields(
    fields: &mut [HeightField],
    faces: &[(usize, usize)],
    height: usize,
    field_index: usize,
) -> JointResult<()> {
    if field_index >= fields.len() {
        return Err(JointError::HeightFieldShape(format!(
            "no height field {} (have {})",
            field_index,
            fields.len()
        )));
    }
    // Validate everything before touching any field.
    let res = fields[field_index].res();
    for &(i, j) in faces {
        if i >= res || j >= res {
            return Err(JointError::CellOutOfRange { i, j, res });
        }
    }
    if height > res {
        return Err(JointError::HeightOutOfRange {
            i: faces.first().map_or(0, |f| f.0),
            j: faces.first().map_or(0, |f| f.1),
            value: height,
            res,
        });
    }

    for &(i, j) in faces {
        fields[field_index].set(i, j, height)?;
        for field in fields[field_index + 1..].iter_mut() {
            if field.get(i, j) < height {
                field.set(i, j, height)?;
            }
        }
        for field in fields[..field_index].iter_mut() {
            if field.get(i, j) > height {
                field.set(i, j, height)?;
            }
        }
    }
    Ok(())
}

/// Random non-decreasing height fields for `component_count` components.
pub fn random_height_fields<R: Rng + ?Sized>(rng: &mut R, res: usize, component_count: usize) -> Vec<HeightField> {
    let mut fields = vec![HeightField::new(res); component_count.saturating_sub(1)];
    for i in 0..res {
        for j in 0..res {
            let mut column: Vec<usize> = (0..fields.len()).map(|_| rng.random_range(0..=res)).collect();
            column.sort_unstable();
            for (field, value) in fields.iter_mut().zip(column) {
                field.values[i * res + j] = value;
            }
        }
    }
    fields
}

/// Owner index of every voxel in the joint cube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelMatrix {
    res: usize,
    sliding_axis: Axis,
    component_count: usize,
    cells: Vec<usize>,
}

impl VoxelMatrix {
    /// Derive the matrix from height fields stacked along `sliding_axis`.
    ///
    /// Column `(i, j)` of a field maps to the two non-sliding axes in
    /// ascending order; layer `k` runs along the sliding axis.
    pub fn from_height_fields(fields: &[HeightField], sliding_axis: Axis, res: usize) -> Self {
        let component_count = fields.len() + 1;
        let mut matrix = Self {
            res,
            sliding_axis,
            component_count,
            cells: vec![0; res * res * res],
        };
        for i in 0..res {
            for j in 0..res {
                for k in 0..res {
                    let owner = fields
                        .iter()
                        .position(|field| k < field.get(i, j))
                        .unwrap_or(component_count - 1);
                    let index = matrix.column_index(i, j, k);
                    matrix.set(index, owner);
                }
            }
        }
        matrix
    }

    pub fn res(&self) -> usize {
        self.res
    }

    pub fn sliding_axis(&self) -> Axis {
        self.sliding_axis
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Cube index of column `(i, j)` at layer `k` along the sliding axis.
    pub fn column_index(&self, i: usize, j: usize, k: usize) -> [usize; 3] {
        let [a, b] = self.sliding_axis.others();
        let mut index = [0; 3];
        index[a.index()] = i;
        index[b.index()] = j;
        index[self.sliding_axis.index()] = k;
        index
    }

    pub fn get(&self, index: [usize; 3]) -> usize {
        self.cells[self.flat(index)]
    }

    fn set(&mut self, index: [usize; 3], owner: usize) {
        let flat = self.flat(index);
        self.cells[flat] = owner;
    }

    fn flat(&self, [x, y, z]: [usize; 3]) -> usize {
        (x * self.res + y) * self.res + z
    }

    /// Every cube index in x-major order.
    pub fn indices(&self) -> impl Iterator<Item = [usize; 3]> {
        let res = self.res;
        (0..res).flat_map(move |x| (0..res).flat_map(move |y| (0..res).map(move |z| [x, y, z])))
    }

    /// Number of voxels owned by component `n`.
    pub fn count(&self, n: usize) -> usize {
        self.cells.iter().filter(|owner| **owner == n).count()
    }

    /// Owner of column `(i, j)` at layer `k` along the sliding axis.
    pub fn owner_at(&self, i: usize, j: usize, k: usize) -> usize {
        self.get(self.column_index(i, j, k))
    }
}
