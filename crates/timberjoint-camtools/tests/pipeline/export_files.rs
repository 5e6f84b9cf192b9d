use std::fs;
use tempfile::TempDir;
use timberjoint_camtools::{CamToolError, Exporter};
use timberjoint_core::{
    DesignParameters, ExportFormat, FabricationSettings, FixedSides, HeightField, JointDesign,
};

fn step_joint(fabrication: FabricationSettings) -> JointDesign {
    let field = HeightField::from_rows(vec![vec![1, 1, 1], vec![2, 2, 2], vec![1, 1, 1]]).unwrap();
    JointDesign::new(
        DesignParameters::default(),
        FixedSides::default().sides().to_vec(),
        vec![field],
        fabrication,
    )
    .unwrap()
}

#[test]
fn test_gcode_files_per_component() {
    let dir = TempDir::new().unwrap();
    let joint = step_joint(FabricationSettings::default());
    let files = Exporter::new(&joint).export(&dir.path().join("joint.tsu")).unwrap();

    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("joint_A.gcode"));
    assert!(files[1].ends_with("joint_B.gcode"));
    for file in &files {
        let text = fs::read_to_string(file).unwrap();
        assert!(text.starts_with("%\nG90"));
        assert!(text.ends_with("M30 (delete sd file)\n%\n"));
        assert!(text.contains("\nG0 "));
        assert!(text.contains("\nG1 "));
        assert!(!text.contains("-0.000"));
    }
}

#[test]
fn test_machine_space_depths() {
    let joint = step_joint(FabricationSettings::default());
    let rendered = Exporter::new(&joint).render().unwrap();
    // The top surface is Z = 0 and nothing is cut below the timber.
    for text in &rendered {
        for line in text.lines().filter(|l| l.starts_with("G1")) {
            if let Some(z) = line.split_whitespace().find_map(|w| w.strip_prefix('Z')) {
                let z: f64 = z.parse().unwrap();
                assert!(z <= 0.0 + 1e-9, "cut above the top surface: {}", line);
                assert!(z >= -44.0 - 1e-9, "cut below the timber: {}", line);
            }
        }
    }
}

#[test]
fn test_sbp_files() {
    let dir = TempDir::new().unwrap();
    let joint = step_joint(FabricationSettings {
        export_format: ExportFormat::Sbp,
        ..Default::default()
    });
    let files = Exporter::new(&joint).export(&dir.path().join("lap.tsu")).unwrap();
    assert!(files[0].ends_with("lap_A.sbp"));
    let text = fs::read_to_string(&files[0]).unwrap();
    assert!(text.starts_with("'%\nSA\n"));
    assert!(text.contains("\nJ3,"));
    assert!(text.contains("\nM3,"));
    assert!(text.ends_with("END\n'%\n"));
}

#[test]
fn test_tool_too_large_writes_no_files() {
    let dir = TempDir::new().unwrap();
    let joint = step_joint(FabricationSettings {
        tool_diameter: 20.0,
        ..Default::default()
    });
    let err = Exporter::new(&joint).export(&dir.path().join("joint.tsu")).unwrap_err();
    assert!(matches!(err, CamToolError::ToolTooLarge { .. }));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
