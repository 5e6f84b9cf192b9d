use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use timberjoint_core::voxel::random_height_fields;
use timberjoint_core::{Axis, VoxelMatrix};

fn axis_strategy() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::X), Just(Axis::Y), Just(Axis::Z)]
}

proptest! {
    #[test]
    fn every_voxel_has_exactly_one_owner(
        seed in any::<u64>(),
        res in 2usize..=5,
        count in 2usize..=6,
        axis in axis_strategy(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let fields = random_height_fields(&mut rng, res, count);
        let matrix = VoxelMatrix::from_height_fields(&fields, axis, res);

        let total: usize = (0..count).map(|n| matrix.count(n)).sum();
        prop_assert_eq!(total, res * res * res);
        for index in matrix.indices() {
            prop_assert!(matrix.get(index) < count);
        }
    }

    #[test]
    fn owner_follows_column_heights(
        seed in any::<u64>(),
        res in 2usize..=5,
        count in 2usize..=4,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let fields = random_height_fields(&mut rng, res, count);
        let matrix = VoxelMatrix::from_height_fields(&fields, Axis::Z, res);
        for i in 0..res {
            for j in 0..res {
                for k in 0..res {
                    let expected = fields
                        .iter()
                        .position(|f| k < f.get(i, j))
                        .unwrap_or(count - 1);
                    prop_assert_eq!(matrix.owner_at(i, j, k), expected);
                }
            }
        }
    }
}
