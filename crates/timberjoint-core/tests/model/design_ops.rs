use rand::rngs::StdRng;
use rand::SeedableRng;
use timberjoint_core::{
    Axis, DesignParameters, Direction, FabricationSettings, FixedSide, FixedSides, HeightField,
    JointDesign, JointError,
};

fn design_with(rows: Vec<Vec<usize>>) -> JointDesign {
    JointDesign::new(
        DesignParameters::default(),
        FixedSides::default().sides().to_vec(),
        vec![HeightField::from_rows(rows).unwrap()],
        FabricationSettings::default(),
    )
    .unwrap()
}

#[test]
fn test_step_joint_is_valid() {
    let design = design_with(vec![vec![1, 1, 1], vec![2, 2, 2], vec![1, 1, 1]]);
    let eval = design.evaluation();
    assert!(eval.valid);
    assert!(design.suggestions().is_empty());
    assert_eq!(design.fab_direction(0), Direction::Negative);
    assert_eq!(design.fab_direction(1), Direction::Positive);
}

#[test]
fn test_unstacked_fields_are_rejected() {
    let params = DesignParameters::default();
    let sides = vec![
        vec![FixedSide::new(Axis::Z, Direction::Negative)],
        vec![FixedSide::new(Axis::X, Direction::Negative)],
        vec![FixedSide::new(Axis::Z, Direction::Positive)],
    ];
    let fields = vec![HeightField::filled(3, 2).unwrap(), HeightField::filled(3, 1).unwrap()];
    let result = JointDesign::new(params, sides, fields, FabricationSettings::default());
    assert!(matches!(result, Err(JointError::HeightFieldShape(_))));
}

#[test]
fn test_resolution_change_rerandomizes() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut design = design_with(vec![vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1]]);
    design.update_voxel_resolution(&mut rng, 4).unwrap();
    assert_eq!(design.voxel_res(), 4);
    assert_eq!(design.height_fields()[0].res(), 4);
    assert_eq!(design.voxels().res(), 4);

    let err = design.update_voxel_resolution(&mut rng, 1).unwrap_err();
    assert!(matches!(err, JointError::Resolution { res: 1, .. }));
    assert_eq!(design.voxel_res(), 4);
}

#[test]
fn test_component_relocation() {
    let mut design = design_with(vec![vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1]]);
    design
        .update_component_position(1, vec![FixedSide::new(Axis::X, Direction::Positive)])
        .unwrap();
    assert_eq!(design.fixed_sides().primary(1), FixedSide::new(Axis::X, Direction::Positive));

    // Face already used by component 0.
    let err = design
        .update_component_position(1, vec![FixedSide::new(Axis::Z, Direction::Negative)])
        .unwrap_err();
    assert!(matches!(err, JointError::SideTaken(_)));
    assert_eq!(design.fixed_sides().primary(1), FixedSide::new(Axis::X, Direction::Positive));
}

#[test]
fn test_vertex_grid_is_centered() {
    let design = design_with(vec![vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1]]);
    let center = design.vertex([0, 0, 0]) + design.vertex([3, 3, 3]);
    assert!(center.norm() < 1e-9);
}
