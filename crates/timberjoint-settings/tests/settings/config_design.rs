use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;
use timberjoint_core::{Axis, Direction, ExportFormat, FixedSide, JointDesign};
use timberjoint_settings::{load_design, save_design, AppConfig};

#[test]
fn test_config_defaults_survive_a_saved_design() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let mut config = AppConfig::new();
    config.design.sliding_axis = Axis::X;
    config.design.voxel_res = 4;
    config.design.timber_dims = [60.0, 45.5, 45.5];
    config.fabrication.tool_diameter = 8.0;
    config.fabrication.export_format = ExportFormat::Nc;
    config.fabrication.arc_interpolation = false;
    config.save_to_file(&config_path).unwrap();

    let config = AppConfig::load_from_file(&config_path).unwrap();
    let sides = vec![
        vec![FixedSide::new(Axis::X, Direction::Negative)],
        vec![FixedSide::new(Axis::X, Direction::Positive)],
    ];
    let mut rng = StdRng::seed_from_u64(7);
    let design = JointDesign::random(
        &mut rng,
        config.design.clone(),
        sides,
        config.fabrication.clone(),
    )
    .unwrap();

    let design_path = dir.path().join("joint.tsu");
    save_design(&design, &design_path).unwrap();
    let loaded = load_design(&design_path).unwrap();

    assert_eq!(loaded.params(), &config.design);
    assert_eq!(loaded.fabrication(), &config.fabrication);
    assert_eq!(loaded.fixed_sides(), design.fixed_sides());
    assert_eq!(loaded.voxels(), design.voxels());
}
