//! Error types for the joint design model.
//!
//! Every rejected reconfiguration leaves the design untouched; the error
//! carries the reason reported back to the caller.

use crate::fixed_sides::Axis;
use thiserror::Error;

/// Errors raised while building or reconfiguring a joint design.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JointError {
    /// A fixed side prevents the requested sliding axis.
    #[error("This sliding direction is blocked: a fixed side lies on the {0} axis")]
    SlidingAxisBlocked(Axis),

    /// The number of timber components is outside the supported range.
    #[error("Component count {count} out of range (valid: {min}..={max})")]
    ComponentCount { count: usize, min: usize, max: usize },

    /// Not enough free cube faces to place new components.
    #[error("Not enough unblocked sides to add {requested} component(s), {available} available")]
    NoUnblockedSides { requested: usize, available: usize },

    /// The voxel resolution is outside the supported range.
    #[error("Voxel resolution {res} out of range (valid: {min}..={max})")]
    Resolution { res: usize, min: usize, max: usize },

    /// A height value is outside `[0, voxel_res]`.
    #[error("Height {value} at ({i}, {j}) exceeds voxel resolution {res}")]
    HeightOutOfRange {
        i: usize,
        j: usize,
        value: usize,
        res: usize,
    },

    /// Height fields do not match the design's shape.
    #[error("Height field shape mismatch: {0}")]
    HeightFieldShape(String),

    /// A component index does not exist.
    #[error("Component {index} does not exist (component count {count})")]
    UnknownComponent { index: usize, count: usize },

    /// A grid cell lies outside the height field.
    #[error("Cell ({i}, {j}) outside a {res}x{res} height field")]
    CellOutOfRange { i: usize, j: usize, res: usize },

    /// A fixed side is already claimed by another component.
    #[error("Fixed side {0} is already taken")]
    SideTaken(String),

    /// The fixed side configuration is unusable.
    #[error("Invalid fixed sides: {0}")]
    InvalidFixedSides(String),

    /// A fixed side string could not be parsed.
    #[error("Cannot parse fixed sides '{input}': {reason}")]
    ParseFixedSides { input: String, reason: String },

    /// A timber dimension or angle is not usable.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type alias for joint design operations.
pub type JointResult<T> = Result<T, JointError>;
