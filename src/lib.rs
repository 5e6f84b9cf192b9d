//! # Timberjoint
//!
//! Design interlocking timber joints on a voxel grid and export CNC milling
//! programs for every timber component.
//!
//! ## Architecture
//!
//! Timberjoint is organized as a workspace with multiple crates:
//!
//! 1. **timberjoint-core** - Design model: fixed sides, height fields, voxel
//!    matrix, evaluation and repair suggestions
//! 2. **timberjoint-camtools** - Milling path generation and machine file
//!    export (G-code, ShopBot)
//! 3. **timberjoint-settings** - Application config and design files
//! 4. **timberjoint** - Command line front end that integrates all crates

pub mod cli;

pub use timberjoint_camtools::{
    component_file_name, component_letter, ComponentPath, Exporter, MillVertex, MillingPathGenerator,
};
pub use timberjoint_core::{
    Axis, DesignParameters, Direction, ExportFormat, FabricationSettings, FixedSide, FixedSides,
    HeightField, JointDesign, JointError,
};
pub use timberjoint_settings::{load_design, save_design, AppConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - Console output, human readable or JSON lines
/// - RUST_LOG environment variable support (default level: info)
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.as_str()));

    match format {
        LogFormat::Text => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_level(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
