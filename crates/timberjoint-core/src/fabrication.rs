//! Fabrication settings shared by every path generation step.

use crate::error::{JointError, JointResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Machine control file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Plain G-code (`.gcode`).
    Gcode,
    /// G-code with the `.nc` extension used by Roland machines.
    Nc,
    /// ShopBot part file (`.sbp`).
    Sbp,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Gcode => "gcode",
            ExportFormat::Nc => "nc",
            ExportFormat::Sbp => "sbp",
        }
    }
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::Gcode
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = JointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcode" => Ok(Self::Gcode),
            "nc" => Ok(Self::Nc),
            "sbp" => Ok(Self::Sbp),
            other => Err(JointError::InvalidGeometry(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

/// Tool and machine parameters for one joint design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricationSettings {
    /// Nominal diameter of the milling bit (mm)
    pub tool_diameter: f64,
    /// Clearance subtracted from the bit radius on each side (mm)
    pub tolerance: f64,
    /// Depth of one milling pass (mm)
    pub pass_depth: f64,
    /// Feed rate (mm/min)
    pub feed_rate: f64,
    /// Spindle speed (RPM)
    pub spindle_speed: f64,
    /// Output file format
    pub export_format: ExportFormat,
    /// Machine axis the component is aligned with: `a / 2` selects X or Y,
    /// `a % 2` the sign
    pub alignment_axis: u8,
    /// Emit native arcs instead of short line segments
    pub arc_interpolation: bool,
}

impl Default for FabricationSettings {
    fn default() -> Self {
        Self {
            tool_diameter: 6.0,
            tolerance: 0.15,
            pass_depth: 1.5,
            feed_rate: 400.0,
            spindle_speed: 6000.0,
            export_format: ExportFormat::Gcode,
            alignment_axis: 0,
            arc_interpolation: true,
        }
    }
}

impl FabricationSettings {
    /// Tool radius after the tolerance is taken off.
    pub fn effective_radius(&self) -> f64 {
        0.5 * self.tool_diameter - self.tolerance
    }

    pub fn effective_diameter(&self) -> f64 {
        2.0 * self.effective_radius()
    }

    pub fn validate(&self) -> JointResult<()> {
        if self.tool_diameter <= 0.0 {
            return Err(JointError::InvalidGeometry(
                "tool diameter must be > 0".to_string(),
            ));
        }
        if self.tolerance < 0.0 || self.effective_radius() <= 0.0 {
            return Err(JointError::InvalidGeometry(
                "tolerance must be >= 0 and smaller than the tool radius".to_string(),
            ));
        }
        if self.pass_depth <= 0.0 {
            return Err(JointError::InvalidGeometry(
                "pass depth must be > 0".to_string(),
            ));
        }
        if self.feed_rate <= 0.0 || self.spindle_speed <= 0.0 {
            return Err(JointError::InvalidGeometry(
                "feed rate and spindle speed must be > 0".to_string(),
            ));
        }
        if self.alignment_axis > 3 {
            return Err(JointError::InvalidGeometry(format!(
                "alignment axis {} out of range (valid: 0..=3)",
                self.alignment_axis
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_tool_size() {
        let settings = FabricationSettings::default();
        assert!((settings.effective_radius() - 2.85).abs() < 1e-12);
        assert!((settings.effective_diameter() - 5.7).abs() < 1e-12);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let settings = FabricationSettings {
            tolerance: 3.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = FabricationSettings {
            alignment_axis: 4,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("SBP".parse::<ExportFormat>().unwrap(), ExportFormat::Sbp);
        assert_eq!(ExportFormat::Nc.to_string(), "nc");
        assert!("dxf".parse::<ExportFormat>().is_err());
    }
}
