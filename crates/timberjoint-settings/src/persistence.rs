//! Design file persistence.
//!
//! A design is stored as `key value` lines followed by a `height_fields`
//! marker and one line per height field (`,` between values, `:` between
//! rows). Only the inputs are stored; the voxel matrix, evaluation and
//! suggestions are rebuilt on load.
//!
//! ```text
//! sliding_axis 2
//! timber_count 2
//! voxel_res 3
//! angle 0.0
//! ...
//! fixed_sides 2,0:2,1
//! height_fields
//! 1,1,1:2,2,2:1,1,1
//! ```

use crate::error::{PersistenceError, PersistenceResult};
use std::fmt::Write as _;
use std::path::Path;
use timberjoint_core::{
    parse_side_groups, Axis, DesignParameters, ExportFormat, FabricationSettings, FixedSides,
    HeightField, JointDesign,
};
use tracing::info;

const HEIGHT_FIELDS: &str = "height_fields";

/// Whole numbers keep one decimal, everything else prints at full precision.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn format_field(field: &HeightField) -> String {
    field
        .rows()
        .map(|row| {
            row.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join(":")
}

/// Serialize a design to its text form.
pub fn save_design_to_string(design: &JointDesign) -> PersistenceResult<String> {
    let fab = design.fabrication();
    let dims = design.timber_dims();
    let mut out = String::new();

    writeln!(out, "sliding_axis {}", design.sliding_axis().index())?;
    writeln!(out, "timber_count {}", design.component_count())?;
    writeln!(out, "voxel_res {}", design.voxel_res())?;
    writeln!(out, "angle {}", format_float(design.angle()))?;
    writeln!(out, "timber_xdim {}", format_float(dims[0]))?;
    writeln!(out, "timber_ydim {}", format_float(dims[1]))?;
    writeln!(out, "timber_zdim {}", format_float(dims[2]))?;
    writeln!(out, "milling_diam {}", format_float(fab.tool_diameter))?;
    writeln!(out, "tolerances {}", format_float(fab.tolerance))?;
    writeln!(out, "milling_speed {}", format_float(fab.feed_rate))?;
    writeln!(out, "spindle_speed {}", format_float(fab.spindle_speed))?;
    writeln!(out, "milling_depth {}", format_float(fab.pass_depth))?;
    writeln!(out, "increm_depth {}", format_bool(design.incremental_depth()))?;
    writeln!(out, "arc_interp {}", format_bool(fab.arc_interpolation))?;
    writeln!(out, "alignment_axis {}", fab.alignment_axis)?;
    writeln!(out, "export_ext {}", fab.export_format)?;
    writeln!(out, "fixed_sides {}", design.fixed_sides())?;
    writeln!(out, "{}", HEIGHT_FIELDS)?;
    for field in design.height_fields() {
        writeln!(out, "{}", format_field(field))?;
    }
    Ok(out)
}

/// One line of input, for error reporting.
struct Line<'a> {
    number: usize,
    key: &'a str,
    value: Option<&'a str>,
}

impl<'a> Line<'a> {
    fn malformed(&self, reason: impl Into<String>) -> PersistenceError {
        PersistenceError::Malformed {
            line: self.number,
            reason: reason.into(),
        }
    }

    fn value(&self) -> PersistenceResult<&'a str> {
        self.value
            .ok_or_else(|| self.malformed(format!("'{}' has no value", self.key)))
    }

    fn float(&self) -> PersistenceResult<f64> {
        let value = self.value()?;
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.malformed(format!("'{}' is not a number", value)))
    }

    /// Integers may be written as whole floats (`2.0`).
    fn integer(&self) -> PersistenceResult<usize> {
        let value = self.value()?;
        if let Ok(v) = value.parse::<usize>() {
            return Ok(v);
        }
        match value.parse::<f64>() {
            Ok(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as usize),
            _ => Err(self.malformed(format!("'{}' is not a whole number", value))),
        }
    }

    fn boolean(&self) -> PersistenceResult<bool> {
        match self.value()? {
            "True" => Ok(true),
            "False" => Ok(false),
            other => Err(self.malformed(format!("expected True or False, found '{}'", other))),
        }
    }
}

fn parse_field(line: &Line<'_>, text: &str) -> PersistenceResult<HeightField> {
    let rows = text
        .split(':')
        .map(|row| {
            row.split(',')
                .map(|item| {
                    let item = item.trim();
                    item.parse::<usize>().ok().or_else(|| {
                        item.parse::<f64>()
                            .ok()
                            .filter(|v| *v >= 0.0 && v.fract() == 0.0)
                            .map(|v| v as usize)
                    })
                    .ok_or_else(|| line.malformed(format!("'{}' is not a layer count", item)))
                })
                .collect::<PersistenceResult<Vec<usize>>>()
        })
        .collect::<PersistenceResult<Vec<_>>>()?;
    HeightField::from_rows(rows).map_err(|e| line.malformed(e.to_string()))
}

/// Parse a design from its text form.
///
/// Missing keys fall back to the defaults. Nothing is built until the whole
/// input has been read, so an error never yields a partial design.
pub fn load_design_from_str(text: &str) -> PersistenceResult<JointDesign> {
    let mut params = DesignParameters::default();
    let mut fab = FabricationSettings::default();
    let mut sides = FixedSides::default().sides().to_vec();
    let mut sides_given = false;
    let mut timber_count: Option<(usize, usize)> = None;
    let mut fields: Option<Vec<HeightField>> = None;

    for (index, raw) in text.lines().enumerate() {
        let mut items = raw.split_whitespace();
        let Some(key) = items.next() else {
            continue;
        };
        let line = Line {
            number: index + 1,
            key,
            value: items.next(),
        };

        if let Some(fields) = fields.as_mut() {
            fields.push(parse_field(&line, raw.trim())?);
            continue;
        }

        match key {
            "sliding_axis" => {
                let ax = line.integer()?;
                params.sliding_axis = Axis::from_index(ax)
                    .ok_or_else(|| line.malformed(format!("axis {} out of range", ax)))?;
            }
            "timber_count" => timber_count = Some((line.integer()?, line.number)),
            "voxel_res" => params.voxel_res = line.integer()?,
            "angle" => params.angle = line.float()?,
            "timber_xdim" => params.timber_dims[0] = line.float()?,
            "timber_ydim" => params.timber_dims[1] = line.float()?,
            "timber_zdim" => params.timber_dims[2] = line.float()?,
            "milling_diam" => fab.tool_diameter = line.float()?,
            "tolerances" => fab.tolerance = line.float()?,
            "milling_speed" => fab.feed_rate = line.float()?,
            "spindle_speed" => fab.spindle_speed = line.float()?,
            "milling_depth" => fab.pass_depth = line.float()?,
            "increm_depth" => params.incremental_depth = line.boolean()?,
            "arc_interp" => fab.arc_interpolation = line.boolean()?,
            "alignment_axis" => {
                let axis = line.integer()?;
                fab.alignment_axis = u8::try_from(axis)
                    .ok()
                    .filter(|a| *a < 4)
                    .ok_or_else(|| line.malformed(format!("alignment axis {} out of range", axis)))?;
            }
            "export_ext" => {
                fab.export_format = line
                    .value()?
                    .parse::<ExportFormat>()
                    .map_err(|e| line.malformed(e.to_string()))?;
            }
            "fixed_sides" => {
                sides = parse_side_groups(line.value()?).map_err(|e| line.malformed(e.to_string()))?;
                sides_given = true;
            }
            HEIGHT_FIELDS => fields = Some(Vec::new()),
            _ => {}
        }
    }

    let fields = fields.ok_or_else(|| PersistenceError::MissingSection(HEIGHT_FIELDS.to_string()))?;
    if let Some((count, number)) = timber_count {
        if count != sides.len() {
            if !sides_given {
                return Err(PersistenceError::MissingSection("fixed_sides".to_string()));
            }
            return Err(PersistenceError::Malformed {
                line: number,
                reason: format!(
                    "timber_count is {} but {} components have fixed sides",
                    count,
                    sides.len()
                ),
            });
        }
    }

    Ok(JointDesign::new(params, sides, fields, fab)?)
}

/// Write a design file.
pub fn save_design(design: &JointDesign, path: &Path) -> PersistenceResult<()> {
    std::fs::write(path, save_design_to_string(design)?)?;
    info!("Saved design to {}", path.display());
    Ok(())
}

/// Read a design file.
pub fn load_design(path: &Path) -> PersistenceResult<JointDesign> {
    let text = std::fs::read_to_string(path)?;
    let design = load_design_from_str(&text)?;
    info!(
        components = design.component_count(),
        res = design.voxel_res(),
        "Loaded design from {}",
        path.display()
    );
    Ok(design)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;
    use timberjoint_core::{Direction, FixedSide, JointError};

    const STEP_JOINT: &str = "\
sliding_axis 2
timber_count 2
voxel_res 3
angle 0.0
timber_xdim 44.0
timber_ydim 44.0
timber_zdim 44.0
milling_diam 6.0
tolerances 0.15
milling_speed 400.0
spindle_speed 6000.0
milling_depth 1.5
increm_depth False
arc_interp True
alignment_axis 0
export_ext gcode
fixed_sides 2,0:2,1
height_fields
1,1,1:2,2,2:1,1,1
";

    #[test]
    fn test_load_step_joint() {
        let design = load_design_from_str(STEP_JOINT).unwrap();
        assert_eq!(design.sliding_axis(), Axis::Z);
        assert_eq!(design.component_count(), 2);
        assert_eq!(design.voxel_res(), 3);
        assert_eq!(design.fabrication(), &FabricationSettings::default());
        let rows: Vec<Vec<usize>> = design.height_fields()[0]
            .rows()
            .map(|r| r.to_vec())
            .collect();
        assert_eq!(rows, vec![vec![1, 1, 1], vec![2, 2, 2], vec![1, 1, 1]]);
    }

    #[test]
    fn test_save_matches_file_layout() {
        let design = load_design_from_str(STEP_JOINT).unwrap();
        assert_eq!(save_design_to_string(&design).unwrap(), STEP_JOINT);
    }

    #[test]
    fn test_older_files_without_new_keys() {
        // No milling_depth, floats for integers, unknown keys and a trailing
        // space after the marker.
        let text = "\
sliding_axis 2.0
voxel_res 2
export_ext sbp
window_size 1600
fixed_sides 2,0:2,1
height_fields \n\
1,2:0,1
";
        let design = load_design_from_str(text).unwrap();
        assert_eq!(design.voxel_res(), 2);
        assert_eq!(design.fabrication().export_format, ExportFormat::Sbp);
        assert_eq!(design.fabrication().pass_depth, 1.5);
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(44.0), "44.0");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(0.15), "0.15");
        assert_eq!(format_float(12.5), "12.5");
    }

    #[test]
    fn test_malformed_number_reports_line() {
        let text = STEP_JOINT.replace("angle 0.0", "angle steep");
        let err = load_design_from_str(&text).unwrap_err();
        assert!(matches!(err, PersistenceError::Malformed { line: 4, .. }));
    }

    #[test]
    fn test_malformed_boolean() {
        let text = STEP_JOINT.replace("arc_interp True", "arc_interp yes");
        assert!(matches!(
            load_design_from_str(&text),
            Err(PersistenceError::Malformed { line: 14, .. })
        ));
    }

    #[test]
    fn test_malformed_field_row() {
        let text = STEP_JOINT.replace("1,1,1:2,2,2:1,1,1", "1,1,1:2,2:1,1,1");
        assert!(matches!(
            load_design_from_str(&text),
            Err(PersistenceError::Malformed { line: 19, .. })
        ));
    }

    #[test]
    fn test_missing_height_fields() {
        let text: String = STEP_JOINT
            .lines()
            .take_while(|l| !l.starts_with(HEIGHT_FIELDS))
            .map(|l| format!("{}\n", l))
            .collect();
        assert!(matches!(
            load_design_from_str(&text),
            Err(PersistenceError::MissingSection(_))
        ));
    }

    #[test]
    fn test_timber_count_mismatch() {
        let text = STEP_JOINT.replace("timber_count 2", "timber_count 3");
        assert!(matches!(
            load_design_from_str(&text),
            Err(PersistenceError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_design_is_rejected() {
        // An angle of 95 degrees parses but cannot form a design.
        let text = STEP_JOINT.replace("0.0\ntimber_xdim", "95.0\ntimber_xdim");
        let err = load_design_from_str(&text).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Design(JointError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("joint.tsu");
        let design = load_design_from_str(STEP_JOINT).unwrap();
        save_design(&design, &path).unwrap();
        let loaded = load_design(&path).unwrap();
        assert_eq!(loaded.height_fields(), design.height_fields());
        assert_eq!(loaded.fixed_sides(), design.fixed_sides());
        assert_eq!(loaded.voxels(), design.voxels());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_design(&dir.path().join("none.tsu")).unwrap_err();
        assert!(matches!(err, PersistenceError::IoError(_)));
    }

    fn axis_strategy() -> impl Strategy<Value = Axis> {
        prop_oneof![Just(Axis::X), Just(Axis::Y), Just(Axis::Z)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_save_load_save_is_stable(
            seed in any::<u64>(),
            axis in axis_strategy(),
            res in 2usize..=5,
            angle in -30.0f64..30.0,
            dims in proptest::array::uniform3(20.0f64..90.0),
            tool in 2.0f64..6.0,
            incremental in any::<bool>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let params = DesignParameters {
                sliding_axis: axis,
                voxel_res: res,
                angle,
                timber_dims: dims,
                incremental_depth: incremental,
            };
            let sides = vec![
                vec![FixedSide::new(axis, Direction::Negative)],
                vec![FixedSide::new(axis, Direction::Positive)],
            ];
            let fab = FabricationSettings {
                tool_diameter: tool,
                ..Default::default()
            };
            let design = JointDesign::random(&mut rng, params, sides, fab);
            prop_assume!(design.is_ok());
            let design = design.unwrap();

            let first = save_design_to_string(&design).unwrap();
            let loaded = load_design_from_str(&first).unwrap();
            prop_assert_eq!(loaded.height_fields(), design.height_fields());
            prop_assert_eq!(loaded.voxels(), design.voxels());
            prop_assert_eq!(save_design_to_string(&loaded).unwrap(), first);
        }
    }
}
