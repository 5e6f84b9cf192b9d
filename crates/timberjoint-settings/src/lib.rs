//! Timberjoint Settings Crate
//!
//! Handles application configuration and design file persistence.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::AppConfig;
pub use error::{
    ConfigError, ConfigResult, PersistenceError, PersistenceResult, SettingsError, SettingsResult,
};
pub use persistence::{load_design, load_design_from_str, save_design, save_design_to_string};
