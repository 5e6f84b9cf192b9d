//! The joint design aggregate.
//!
//! [`JointDesign`] owns the height fields, fixed sides, fabrication
//! settings and every derived value (voxel matrix, evaluation,
//! suggestions). Each entry point validates its input first and rebuilds
//! the derived state before returning, so a rejected call leaves the design
//! exactly as it was.

use crate::error::{JointError, JointResult};
use crate::evaluation::{produce_suggestions, DefaultEvaluator, Evaluation, JointEvaluator};
use crate::fabrication::FabricationSettings;
use crate::fixed_sides::{Axis, Direction, FixedSide, FixedSides};
use crate::geometry::{position_vectors, Vec3};
use crate::voxel::{edit_height_fields, random_height_fields, validate_height_fields, HeightField, VoxelMatrix};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const MIN_COMPONENTS: usize = 2;
pub const MAX_COMPONENTS: usize = 6;
pub const MIN_VOXEL_RES: usize = 2;
pub const MAX_VOXEL_RES: usize = 8;
/// Joint angles at or beyond this deviation from square are rejected.
pub const MAX_ANGLE_DEG: f64 = 80.0;

/// Scalar parameters of a joint design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignParameters {
    /// Axis along which the components are assembled
    pub sliding_axis: Axis,
    /// Voxels per cube edge
    pub voxel_res: usize,
    /// Deviation from a square joint (degrees)
    pub angle: f64,
    /// Timber cross-section and joint length along x, y, z (mm)
    pub timber_dims: [f64; 3],
    /// Ramp into each layer instead of plunging
    pub incremental_depth: bool,
}

impl Default for DesignParameters {
    fn default() -> Self {
        Self {
            sliding_axis: Axis::Z,
            voxel_res: 3,
            angle: 0.0,
            timber_dims: [44.0, 44.0, 44.0],
            incremental_depth: false,
        }
    }
}

impl DesignParameters {
    pub fn validate(&self) -> JointResult<()> {
        if !(MIN_VOXEL_RES..=MAX_VOXEL_RES).contains(&self.voxel_res) {
            return Err(JointError::Resolution {
                res: self.voxel_res,
                min: MIN_VOXEL_RES,
                max: MAX_VOXEL_RES,
            });
        }
        if !self.angle.is_finite() || self.angle.abs() >= MAX_ANGLE_DEG {
            return Err(JointError::InvalidGeometry(format!(
                "angle {} out of range (valid: |angle| < {})",
                self.angle, MAX_ANGLE_DEG
            )));
        }
        if self.timber_dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(JointError::InvalidGeometry(
                "timber dimensions must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A complete joint design with its derived state.
#[derive(Debug, Clone)]
pub struct JointDesign {
    params: DesignParameters,
    fixed_sides: FixedSides,
    height_fields: Vec<HeightField>,
    fabrication: FabricationSettings,
    suggestions_enabled: bool,
    voxels: VoxelMatrix,
    evaluation: Evaluation,
    suggestions: Vec<Vec<HeightField>>,
}

impl JointDesign {
    /// Build a design from explicit height fields.
    pub fn new(
        params: DesignParameters,
        sides: Vec<Vec<FixedSide>>,
        height_fields: Vec<HeightField>,
        fabrication: FabricationSettings,
    ) -> JointResult<Self> {
        params.validate()?;
        fabrication.validate()?;
        let fixed_sides = checked_fixed_sides(sides, params.sliding_axis)?;
        validate_height_fields(&height_fields, params.voxel_res, fixed_sides.component_count())?;
        check_stacking(&height_fields)?;

        let voxels = VoxelMatrix::from_height_fields(&height_fields, params.sliding_axis, params.voxel_res);
        let evaluation = DefaultEvaluator.evaluate(&voxels, &fixed_sides);
        let mut design = Self {
            params,
            fixed_sides,
            height_fields,
            fabrication,
            suggestions_enabled: true,
            voxels,
            evaluation,
            suggestions: Vec::new(),
        };
        design.rebuild();
        Ok(design)
    }

    /// Build a design with random height fields.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        params: DesignParameters,
        sides: Vec<Vec<FixedSide>>,
        fabrication: FabricationSettings,
    ) -> JointResult<Self> {
        let fields = random_height_fields(rng, params.voxel_res, sides.len());
        Self::new(params, sides, fields, fabrication)
    }

    fn rebuild(&mut self) {
        self.voxels =
            VoxelMatrix::from_height_fields(&self.height_fields, self.params.sliding_axis, self.params.voxel_res);
        self.evaluation = DefaultEvaluator.evaluate(&self.voxels, &self.fixed_sides);
        self.suggestions = if self.suggestions_enabled && !self.evaluation.valid {
            produce_suggestions(&DefaultEvaluator, &self.height_fields, &self.fixed_sides, &self.voxels)
        } else {
            Vec::new()
        };
        debug!(
            valid = self.evaluation.valid,
            suggestions = self.suggestions.len(),
            "Joint design rebuilt"
        );
    }

    pub fn params(&self) -> &DesignParameters {
        &self.params
    }

    pub fn sliding_axis(&self) -> Axis {
        self.params.sliding_axis
    }

    pub fn voxel_res(&self) -> usize {
        self.params.voxel_res
    }

    pub fn angle(&self) -> f64 {
        self.params.angle
    }

    pub fn timber_dims(&self) -> [f64; 3] {
        self.params.timber_dims
    }

    pub fn incremental_depth(&self) -> bool {
        self.params.incremental_depth
    }

    pub fn component_count(&self) -> usize {
        self.fixed_sides.component_count()
    }

    pub fn fixed_sides(&self) -> &FixedSides {
        &self.fixed_sides
    }

    pub fn height_fields(&self) -> &[HeightField] {
        &self.height_fields
    }

    pub fn fabrication(&self) -> &FabricationSettings {
        &self.fabrication
    }

    pub fn voxels(&self) -> &VoxelMatrix {
        &self.voxels
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn suggestions(&self) -> &[Vec<HeightField>] {
        &self.suggestions
    }

    /// Run another evaluator over the current voxels.
    pub fn evaluate_with(&self, evaluator: &dyn JointEvaluator) -> Evaluation {
        evaluator.evaluate(&self.voxels, &self.fixed_sides)
    }

    /// Direction in which component `n`'s layers are cut.
    pub fn fab_direction(&self, n: usize) -> Direction {
        self.evaluation.fab_directions[n]
    }

    /// Edge length of one voxel along each axis (mm).
    pub fn voxel_sizes(&self) -> [f64; 3] {
        let res = self.params.voxel_res as f64;
        self.params.timber_dims.map(|d| d / res)
    }

    /// One-voxel grid vectors, rotated for oblique joints.
    pub fn position_vectors(&self) -> [Vec3; 3] {
        position_vectors(
            self.voxel_sizes(),
            self.params.sliding_axis,
            self.params.angle,
            self.fixed_sides.rotation_allowed(),
        )
    }

    /// Model-space position of grid corner `index` (each entry in `0..=res`).
    pub fn vertex(&self, index: [usize; 3]) -> Vec3 {
        let half = 0.5 * self.params.voxel_res as f64;
        let vecs = self.position_vectors();
        (0..3).fold(Vec3::zeros(), |acc, a| acc + vecs[a] * (index[a] as f64 - half))
    }

    /// Change the sliding axis unless a fixed side blocks it.
    pub fn update_sliding_axis(&mut self, axis: Axis) -> JointResult<()> {
        if self.fixed_sides.blocks_sliding_axis(axis) {
            return Err(JointError::SlidingAxisBlocked(axis));
        }
        self.params.sliding_axis = axis;
        self.fixed_sides.update_unblocked(axis);
        self.rebuild();
        info!("Sliding axis set to {}", axis);
        Ok(())
    }

    /// Change the voxel resolution; height fields are randomized.
    pub fn update_voxel_resolution<R: Rng + ?Sized>(&mut self, rng: &mut R, res: usize) -> JointResult<()> {
        let params = DesignParameters {
            voxel_res: res,
            ..self.params.clone()
        };
        params.validate()?;
        self.params = params;
        self.height_fields = random_height_fields(rng, res, self.component_count());
        self.rebuild();
        Ok(())
    }

    pub fn update_angle(&mut self, angle: f64) -> JointResult<()> {
        let params = DesignParameters {
            angle,
            ..self.params.clone()
        };
        params.validate()?;
        self.params = params;
        self.rebuild();
        Ok(())
    }

    /// Set the timber dimension along each of `axes` to `value` (mm).
    pub fn update_timber_dimensions(&mut self, axes: &[Axis], value: f64) -> JointResult<()> {
        let mut params = self.params.clone();
        for axis in axes {
            params.timber_dims[axis.index()] = value;
        }
        params.validate()?;
        self.params = params;
        self.rebuild();
        Ok(())
    }

    /// Add or remove components; height fields are randomized.
    ///
    /// New components take random free faces off the sliding axis. While
    /// the last component sits on the sliding axis it stays last.
    pub fn update_component_count<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize) -> JointResult<()> {
        if !(MIN_COMPONENTS..=MAX_COMPONENTS).contains(&count) {
            return Err(JointError::ComponentCount {
                count,
                min: MIN_COMPONENTS,
                max: MAX_COMPONENTS,
            });
        }
        let current = self.component_count();
        if count == current {
            return Ok(());
        }
        let sliding = self.params.sliding_axis;
        let mut fixed_sides = self.fixed_sides.clone();
        if count > current {
            let candidates = fixed_sides.unblocked().iter().filter(|s| s.axis != sliding).count();
            if candidates < count - current {
                return Err(JointError::NoUnblockedSides {
                    requested: count - current,
                    available: candidates,
                });
            }
            for _ in current..count {
                let free: Vec<FixedSide> = fixed_sides
                    .unblocked()
                    .iter()
                    .copied()
                    .filter(|s| s.axis != sliding)
                    .collect();
                let side = free[rng.random_range(0..free.len())];
                let last = fixed_sides.component_count() - 1;
                if fixed_sides.primary(last).axis == sliding {
                    fixed_sides.insert_component(last, vec![side], sliding);
                } else {
                    fixed_sides.insert_component(last + 1, vec![side], sliding);
                }
            }
        } else {
            fixed_sides.truncate(count, sliding);
        }
        fixed_sides.validate()?;
        self.fixed_sides = fixed_sides;
        self.height_fields = random_height_fields(rng, self.params.voxel_res, count);
        self.rebuild();
        info!("Component count changed from {} to {}", current, count);
        Ok(())
    }

    /// Move or rotate component `n` onto new fixed sides.
    pub fn update_component_position(&mut self, n: usize, sides: Vec<FixedSide>) -> JointResult<()> {
        let count = self.component_count();
        if n >= count {
            return Err(JointError::UnknownComponent { index: n, count });
        }
        if self.fixed_sides.relocation_blocked(n, &sides, self.params.sliding_axis) {
            return Err(JointError::SideTaken(
                sides.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("."),
            ));
        }
        let mut fixed_sides = self.fixed_sides.clone();
        fixed_sides.set_component(n, sides, self.params.sliding_axis);
        fixed_sides.validate()?;
        self.fixed_sides = fixed_sides;
        self.rebuild();
        Ok(())
    }

    /// Pull the faces `faces` of component `n` to `height`.
    ///
    /// `end` picks the face: `Positive` is the component's face towards the
    /// positive end of the sliding axis, `Negative` the opposite one.
    pub fn edit_height_fields(
        &mut self,
        faces: &[(usize, usize)],
        height: usize,
        n: usize,
        end: Direction,
    ) -> JointResult<()> {
        let count = self.component_count();
        if n >= count {
            return Err(JointError::UnknownComponent { index: n, count });
        }
        let field_index = match end {
            Direction::Positive if n + 1 < count => n,
            Direction::Negative if n > 0 => n - 1,
            _ => {
                return Err(JointError::HeightFieldShape(format!(
                    "component {} has no editable face on the {:?} end",
                    n, end
                )))
            }
        };
        let mut fields = self.height_fields.clone();
        edit_height_fields(&mut fields, faces, height, field_index)?;
        self.height_fields = fields;
        self.rebuild();
        Ok(())
    }

    /// Replace all height fields.
    pub fn set_height_fields(&mut self, fields: Vec<HeightField>) -> JointResult<()> {
        validate_height_fields(&fields, self.params.voxel_res, self.component_count())?;
        check_stacking(&fields)?;
        self.height_fields = fields;
        self.rebuild();
        Ok(())
    }

    pub fn randomize_height_fields<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.height_fields = random_height_fields(rng, self.params.voxel_res, self.component_count());
        self.rebuild();
    }

    /// Adopt suggestion `index`.
    pub fn apply_suggestion(&mut self, index: usize) -> JointResult<()> {
        let fields = self
            .suggestions
            .get(index)
            .cloned()
            .ok_or_else(|| JointError::HeightFieldShape(format!("no suggestion {}", index)))?;
        self.set_height_fields(fields)
    }

    pub fn set_fabrication(&mut self, fabrication: FabricationSettings) -> JointResult<()> {
        fabrication.validate()?;
        self.fabrication = fabrication;
        Ok(())
    }

    pub fn set_incremental_depth(&mut self, enabled: bool) {
        self.params.incremental_depth = enabled;
    }

    pub fn set_suggestions_enabled(&mut self, enabled: bool) {
        self.suggestions_enabled = enabled;
        self.rebuild();
    }
}

/// Every column must be non-decreasing from field to field.
fn check_stacking(fields: &[HeightField]) -> JointResult<()> {
    for pair in fields.windows(2) {
        let res = pair[0].res();
        for i in 0..res {
            for j in 0..res {
                if pair[0].get(i, j) > pair[1].get(i, j) {
                    return Err(JointError::HeightFieldShape(format!(
                        "column ({}, {}) is not stacked in order",
                        i, j
                    )));
                }
            }
        }
    }
    Ok(())
}

fn checked_fixed_sides(sides: Vec<Vec<FixedSide>>, sliding_axis: Axis) -> JointResult<FixedSides> {
    let count = sides.len();
    if !(MIN_COMPONENTS..=MAX_COMPONENTS).contains(&count) {
        return Err(JointError::ComponentCount {
            count,
            min: MIN_COMPONENTS,
            max: MAX_COMPONENTS,
        });
    }
    let fixed_sides = FixedSides::new(sides, sliding_axis);
    fixed_sides.validate()?;
    if fixed_sides.blocks_sliding_axis(sliding_axis) {
        return Err(JointError::SlidingAxisBlocked(sliding_axis));
    }
    Ok(fixed_sides)
}
