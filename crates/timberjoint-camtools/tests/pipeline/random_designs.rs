use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use timberjoint_camtools::{Exporter, MillingPathGenerator};
use timberjoint_core::{
    Axis, DesignParameters, Direction, FabricationSettings, FixedSide, JointDesign,
};

/// Fixed sides for both components, sliding along Z.
fn sides_strategy() -> impl Strategy<Value = Vec<Vec<FixedSide>>> {
    let side = |axis, direction| vec![FixedSide::new(axis, direction)];
    prop_oneof![
        Just(vec![side(Axis::Z, Direction::Negative), side(Axis::Z, Direction::Positive)]),
        Just(vec![side(Axis::X, Direction::Negative), side(Axis::Z, Direction::Positive)]),
        Just(vec![side(Axis::X, Direction::Negative), side(Axis::X, Direction::Positive)]),
    ]
}

fn word(line: &str, letter: char) -> Option<f64> {
    line.split_whitespace()
        .find_map(|w| w.strip_prefix(letter))
        .and_then(|v| v.parse().ok())
}

/// Every G2/G3 line of `program` together with the XY it starts from.
fn arcs_with_start(program: &str) -> Vec<(String, (f64, f64))> {
    let mut xy = (f64::NAN, f64::NAN);
    let mut arcs = Vec::new();
    for line in program.lines() {
        let code = line.split_whitespace().next().unwrap_or("");
        if !matches!(code, "G0" | "G1" | "G2" | "G3") {
            continue;
        }
        if matches!(code, "G2" | "G3") {
            arcs.push((line.to_string(), xy));
        }
        if let Some(x) = word(line, 'X') {
            xy.0 = x;
        }
        if let Some(y) = word(line, 'Y') {
            xy.1 = y;
        }
    }
    arcs
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rendered_arcs_have_a_chord(
        seed in any::<u64>(),
        res in 3usize..=5,
        sides in sides_strategy(),
        incremental in any::<bool>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let params = DesignParameters {
            voxel_res: res,
            incremental_depth: incremental,
            ..Default::default()
        };
        let design = JointDesign::random(&mut rng, params, sides, FabricationSettings::default()).unwrap();

        for path in MillingPathGenerator::new(&design).generate().unwrap() {
            for pair in path.vertices.windows(2) {
                let (prev, v) = (&pair[0], &pair[1]);
                if !v.is_connected_arc(prev) {
                    continue;
                }
                let r0 = (prev.pt - v.arc_center).xy().norm();
                let r1 = (v.pt - v.arc_center).xy().norm();
                prop_assert!((r0 - r1).abs() < 1e-6, "arc ends at radius {} and {}", r0, r1);
                prop_assert!((v.pt - prev.pt).xy().norm() > 1e-9);
            }
        }

        for program in Exporter::new(&design).render().unwrap() {
            for (line, (x, y)) in arcs_with_start(&program) {
                let radius = word(&line, 'R');
                prop_assert!(radius.is_some_and(|r| r > 0.0), "{}", line);
                let end = (word(&line, 'X'), word(&line, 'Y'));
                prop_assert!(
                    end != (Some(x), Some(y)),
                    "arc without chord: {} after X{} Y{}",
                    line,
                    x,
                    y
                );
            }
        }
    }
}
