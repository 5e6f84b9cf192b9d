//! Error types for the CAM tools crate.
//!
//! Hard failures are [`CamToolError`]s. Problems that still leave a usable
//! path behind are collected as [`GeometryWarning`]s next to the path.

use std::io;
use thiserror::Error;
use timberjoint_core::JointError;

/// Errors that can occur while generating or exporting milling paths.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// The milling bit cannot fit inside a single voxel.
    #[error("The milling bit is too large: effective diameter {tool_diameter:.3} mm exceeds the smallest voxel size {voxel_size:.3} mm")]
    ToolTooLarge { tool_diameter: f64, voxel_size: f64 },

    /// A component index outside the design was requested.
    #[error("Unknown component {index} (design has {count})")]
    UnknownComponent { index: usize, count: usize },

    /// The design model rejected an operation.
    #[error("Design error: {0}")]
    Joint(#[from] JointError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Non-fatal geometry problems found while generating a path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryWarning {
    /// The clearing passes for a very rounded corner did not converge.
    #[error("Corner clearing on component {component}, layer {layer} stopped after {iterations} passes")]
    ArtifactNotConverged {
        component: usize,
        layer: usize,
        iterations: usize,
    },
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;
