use timberjoint_core::{parse_side_groups, Axis, Direction, FixedSide, FixedSides};

#[test]
fn test_default_sides_leave_four_faces_free() {
    let fixed = FixedSides::default();
    assert_eq!(fixed.component_count(), 2);
    assert_eq!(fixed.unblocked().len(), 4);
    assert!(fixed
        .unblocked()
        .iter()
        .all(|side| side.axis != Axis::Z));
    assert!(!fixed.rotation_allowed());
}

#[test]
fn test_parse_round_trip_through_display() {
    let groups = parse_side_groups("0,0.1,1:2,1").unwrap();
    let fixed = FixedSides::new(groups, Axis::Z);
    assert_eq!(fixed.to_string(), "0,0.1,1:2,1");
    assert_eq!(fixed.component(0).len(), 2);
    assert_eq!(fixed.primary(1), FixedSide::new(Axis::Z, Direction::Positive));
}

#[test]
fn test_shared_face_is_rejected() {
    let groups = parse_side_groups("0,0:0,0").unwrap();
    let fixed = FixedSides::new(groups, Axis::Z);
    assert!(fixed.validate().is_err());
}

#[test]
fn test_parse_errors() {
    assert!(parse_side_groups("3,0:2,1").is_err());
    assert!(parse_side_groups("0,2:2,1").is_err());
    assert!(parse_side_groups("x:2,1").is_err());
}
