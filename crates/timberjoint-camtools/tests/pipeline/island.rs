use timberjoint_camtools::MillingPathGenerator;
use timberjoint_core::{DesignParameters, FabricationSettings, FixedSides, HeightField, JointDesign, Vec3};

const VOXEL: f64 = 44.0 / 3.0;
const RADIUS: f64 = 2.85;

/// Component 1 only fills the centre column, so every layer of component 0
/// has a one-cell hole.
fn pocket_design() -> JointDesign {
    let field = HeightField::from_rows(vec![vec![3, 3, 3], vec![3, 0, 3], vec![3, 3, 3]]).unwrap();
    JointDesign::new(
        DesignParameters::default(),
        FixedSides::default().sides().to_vec(),
        vec![field],
        FabricationSettings::default(),
    )
    .unwrap()
}

fn near(a: Vec3, x: f64, y: f64) -> bool {
    (a.x - x).abs() < 1e-6 && (a.y - y).abs() < 1e-6
}

#[test]
fn test_pocket_outline_is_offset_inwards() {
    let design = pocket_design();
    let path = MillingPathGenerator::new(&design).generate_component(0).unwrap();
    let inner = 0.5 * VOXEL - RADIUS;
    let cuts: Vec<Vec3> = path
        .vertices
        .iter()
        .filter(|v| !v.is_traversing)
        .map(|v| v.pt)
        .collect();

    for (x, y) in [(-inner, -inner), (inner, -inner), (inner, inner), (-inner, inner)] {
        assert!(cuts.iter().any(|p| near(*p, x, y)), "missing corner ({}, {})", x, y);
    }
    // The tool centre never leaves the pocket by more than its own clearance.
    for p in &cuts {
        assert!(p.x.abs() <= inner + 1e-6 && p.y.abs() <= inner + 1e-6);
    }
}

#[test]
fn test_pocket_is_cut_through_every_layer() {
    let design = pocket_design();
    let path = MillingPathGenerator::new(&design).generate_component(0).unwrap();
    let deepest = path
        .vertices
        .iter()
        .filter(|v| !v.is_traversing)
        .map(|v| v.pt.z)
        .fold(f64::INFINITY, f64::min);
    // Component 0 is cut from the top face down to the bottom face.
    assert!((deepest - (-22.0)).abs() < 1e-6);
    assert!(path.warnings.is_empty());
}

#[test]
fn test_centre_column_corners_are_rounded() {
    let design = pocket_design();
    let path = MillingPathGenerator::new(&design).generate_component(1).unwrap();
    assert!(!path.is_empty());
    // Component 0 has a sharp inner corner at every corner of the centre
    // column, so component 1 gets arcs of one tool diameter around them.
    let inner = 0.5 * VOXEL - RADIUS;
    let arcs: Vec<_> = path.vertices.iter().filter(|v| v.is_arc).collect();
    assert!(!arcs.is_empty());
    for (x, y) in [(-inner, -inner), (inner, -inner), (inner, inner), (-inner, inner)] {
        assert!(arcs.iter().any(|v| near(v.arc_center, x, y)), "missing arc at ({}, {})", x, y);
    }
    for v in &arcs {
        let r = (v.pt - v.arc_center).xy().norm();
        assert!((r - 2.0 * RADIUS).abs() < 1e-6);
    }
}
