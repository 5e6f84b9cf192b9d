//! # Timberjoint Core
//!
//! Data model for interlocking timber joints designed on a voxel grid.
//!
//! ## Contents
//!
//! - **Fixed sides**: which cube faces each timber component is anchored to
//! - **Height fields**: the editable boundary between stacked components
//! - **Voxel matrix**: owner of every voxel, derived from the height fields
//! - **Evaluation**: connectivity, bridging, checkerboard and undercut checks,
//!   plus repair suggestions for invalid designs
//! - **Design**: the aggregate that keeps all of the above consistent
//! - **Fabrication settings**: tool and machine parameters

pub mod design;
pub mod error;
pub mod evaluation;
pub mod fabrication;
pub mod fixed_sides;
pub mod geometry;
pub mod voxel;

pub use design::{DesignParameters, JointDesign, MAX_COMPONENTS, MAX_VOXEL_RES, MIN_COMPONENTS, MIN_VOXEL_RES};
pub use error::{JointError, JointResult};
pub use evaluation::{DefaultEvaluator, Evaluation, JointEvaluator, MAX_SUGGESTIONS};
pub use fabrication::{ExportFormat, FabricationSettings};
pub use fixed_sides::{parse_side_groups, Axis, Direction, FixedSide, FixedSides};
pub use geometry::Vec3;
pub use voxel::{HeightField, VoxelMatrix};
