use timberjoint_core::{
    DesignParameters, FabricationSettings, FixedSides, HeightField, JointDesign,
};
use timberjoint_settings::{load_design_from_str, save_design_to_string};

fn checkerboard() -> JointDesign {
    let field =
        HeightField::from_rows(vec![vec![3, 0, 3], vec![0, 3, 0], vec![3, 0, 3]]).unwrap();
    JointDesign::new(
        DesignParameters::default(),
        FixedSides::default().sides().to_vec(),
        vec![field],
        FabricationSettings::default(),
    )
    .unwrap()
}

#[test]
fn test_invalid_design_round_trips() {
    let design = checkerboard();
    assert!(!design.evaluation().valid);

    let loaded = load_design_from_str(&save_design_to_string(&design).unwrap()).unwrap();
    assert!(!loaded.evaluation().valid);
    assert_eq!(loaded.evaluation(), design.evaluation());
    assert_eq!(loaded.suggestions(), design.suggestions());
}

#[test]
fn test_applied_suggestions_stay_valid_after_reload() {
    let design = checkerboard();
    for index in 0..design.suggestions().len() {
        let mut repaired = design.clone();
        repaired.apply_suggestion(index).unwrap();
        assert!(repaired.evaluation().valid);

        let loaded = load_design_from_str(&save_design_to_string(&repaired).unwrap()).unwrap();
        assert!(loaded.evaluation().valid);
        assert_eq!(loaded.height_fields(), repaired.height_fields());
    }
}
