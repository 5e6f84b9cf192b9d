use timberjoint_camtools::{CamToolError, MillingPathGenerator};
use timberjoint_core::{
    Axis, DesignParameters, Direction, FabricationSettings, FixedSide, FixedSides, HeightField,
    JointDesign,
};

const RADIUS: f64 = 2.85;

fn design(params: DesignParameters, sides: Vec<Vec<FixedSide>>, field: HeightField) -> JointDesign {
    JointDesign::new(params, sides, vec![field], FabricationSettings::default()).unwrap()
}

/// A flat joint mills component 0 with rough lanes only and leaves
/// component 1 without a path: no grid corner touches foreign material, so
/// no finishing outline is produced.
#[test]
fn test_flat_joint() {
    // All of the cube belongs to component 1.
    let joint = design(
        DesignParameters::default(),
        FixedSides::default().sides().to_vec(),
        HeightField::filled(3, 0).unwrap(),
    );
    let paths = MillingPathGenerator::new(&joint).generate().unwrap();

    // Component 0 owns nothing: every layer is one open region that is
    // rough-cleared, with no material edge left to finish.
    let cleared = &paths[0];
    assert!(!cleared.is_empty());
    assert!(cleared.vertices.iter().all(|v| !v.is_arc));
    assert!(cleared.warnings.is_empty());
    for v in cleared.vertices.iter().filter(|v| !v.is_traversing) {
        assert!(v.pt.x.abs() <= 22.0 + 1e-6);
        assert!(v.pt.y.abs() <= 22.0 - RADIUS + 1e-6);
    }

    // Component 1 is the whole cube: nothing to mill.
    assert!(paths[1].is_empty());
}

#[test]
fn test_tool_too_large_generates_nothing() {
    let mut joint = design(
        DesignParameters::default(),
        FixedSides::default().sides().to_vec(),
        HeightField::filled(3, 1).unwrap(),
    );
    joint
        .set_fabrication(FabricationSettings {
            tool_diameter: 16.0,
            ..Default::default()
        })
        .unwrap();
    let generator = MillingPathGenerator::new(&joint);
    for n in 0..2 {
        let err = generator.generate_component(n).unwrap_err();
        assert!(matches!(err, CamToolError::ToolTooLarge { .. }));
    }
}

#[test]
fn test_incremental_depth_adds_a_final_pass() {
    let sides = FixedSides::default().sides().to_vec();
    let field = HeightField::from_rows(vec![vec![1, 1, 1], vec![2, 2, 2], vec![1, 1, 1]]).unwrap();
    let plain = design(DesignParameters::default(), sides.clone(), field.clone());
    let ramped = design(
        DesignParameters {
            incremental_depth: true,
            ..Default::default()
        },
        sides,
        field,
    );
    let a = MillingPathGenerator::new(&plain).generate_component(0).unwrap();
    let b = MillingPathGenerator::new(&ramped).generate_component(0).unwrap();
    assert!(b.vertices.len() > a.vertices.len());
}

#[test]
fn test_oblique_joint_trims_the_edge() {
    let sides = vec![
        vec![FixedSide::new(Axis::X, Direction::Negative)],
        vec![FixedSide::new(Axis::X, Direction::Positive)],
    ];
    let field = HeightField::filled(3, 1).unwrap();
    let square = design(DesignParameters::default(), sides.clone(), field.clone());
    let oblique = design(
        DesignParameters {
            angle: 20.0,
            ..Default::default()
        },
        sides,
        field,
    );
    let a = MillingPathGenerator::new(&square).generate_component(0).unwrap();
    let b = MillingPathGenerator::new(&oblique).generate_component(0).unwrap();
    assert!(b.vertices.len() > a.vertices.len());
}
