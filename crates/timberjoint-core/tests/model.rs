#[path = "model/design_ops.rs"]
mod design_ops;
#[path = "model/fixed_sides.rs"]
mod fixed_sides;
#[path = "model/voxel_partition.rs"]
mod voxel_partition;
