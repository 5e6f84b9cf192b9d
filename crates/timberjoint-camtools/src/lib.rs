//! # Timberjoint CAM Tools
//!
//! Turns a voxel joint design into milling paths and machine control files.
//!
//! ## Pipeline
//!
//! - **Region**: one layer of one component as a padded owner grid, split
//!   into connected regions of foreign material
//! - **Ordering**: region outline corners chained along material edges
//! - **Offset**: tool-radius offsetting with arc rounding of convex corners
//! - **Roughing**: parallel clearing lanes across open regions
//! - **Layering**: repetition of each 2D path over the pass depths of a layer
//! - **Milling path**: the per-component driver tying the steps together
//!
//! ## Output
//!
//! - **Export**: machine-space transform and one file per component
//! - **Post**: G-code (`.gcode`, `.nc`) and ShopBot (`.sbp`) writers
//! - **Arc Expander**: arc flattening for output without native arcs

pub mod arc_expander;
pub mod error;
pub mod export;
pub mod layering;
pub mod milling_path;
pub mod offset;
pub mod ordering;
pub mod post;
pub mod region;
pub mod roughing;

// Re-export commonly used items
pub use arc_expander::{ArcExpander, ArcExpanderConfig};
pub use error::{CamToolError, CamToolResult, GeometryWarning};
pub use export::{component_file_name, component_letter, Exporter, MachineTransform};
pub use milling_path::{ComponentPath, MillVertex, MillingPathGenerator};
pub use post::{GcodePost, PostProcessor, SbpPost};
