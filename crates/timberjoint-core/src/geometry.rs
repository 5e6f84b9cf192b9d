//! Vector helpers shared by the design model and the path generator.
//!
//! All lengths are millimetres in model space: the joint cube is centred on
//! the origin and spans `[-dim/2, dim/2]` along each axis.

use crate::fixed_sides::Axis;
use nalgebra::{Rotation3, Unit, Vector3};

/// A point or direction in model space.
pub type Vec3 = Vector3<f64>;

/// Rotate `vec` by `theta` radians around `axis` (right-handed).
///
/// A zero-length axis leaves the vector unchanged.
pub fn rotate_vector_around_axis(vec: &Vec3, axis: &Vec3, theta: f64) -> Vec3 {
    if axis.norm() == 0.0 {
        return *vec;
    }
    let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(*axis), theta);
    rotation * vec
}

/// Unsigned angle between two vectors in radians, in `[0, π]`.
pub fn angle_between(a: &Vec3, b: &Vec3) -> f64 {
    let na = a.norm();
    let nb = b.norm();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (na * nb)).clamp(-1.0, 1.0).acos()
}

/// Angle from `a` to `b`, negative when `a × b` points against `normal`.
pub fn signed_angle_between(a: &Vec3, b: &Vec3, normal: &Vec3) -> f64 {
    let angle = angle_between(a, b);
    if normal.dot(&a.cross(b)) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Unit vector in the direction of `v`; the zero vector is returned as is.
pub fn normalize(v: &Vec3) -> Vec3 {
    let norm = v.norm();
    if norm == 0.0 {
        *v
    } else {
        v / norm
    }
}

/// Rescale `v` to `length`, keeping its direction.
pub fn set_vector_length(v: &Vec3, length: f64) -> Vec3 {
    normalize(v) * length
}

/// Unit vector along `axis`.
pub fn axis_unit(axis: Axis) -> Vec3 {
    let mut v = Vec3::zeros();
    v[axis.index()] = 1.0;
    v
}

/// Intermediate points of a circular sweep from `start` to `end`.
///
/// The sweep turns around `center0` towards `center1` in steps close to
/// `angular_step` radians, interpolating linearly along `axis` so that
/// helical moves keep their height change. The end point is included, the
/// start point is not.
pub fn arc_points(
    start: &Vec3,
    end: &Vec3,
    center0: &Vec3,
    center1: &Vec3,
    axis: Axis,
    angular_step: f64,
) -> Vec<Vec3> {
    let v0 = start - center0;
    let v1 = end - center1;
    let sweep = angle_between(&v0, &v1);
    let count = ((sweep / angular_step) + 0.5).floor().max(1.0) as usize;
    let step = sweep / count as f64;
    let rise = (end[axis.index()] - start[axis.index()]) / count as f64;

    let mut turn_axis = v0.cross(&v1);
    if turn_axis.norm() < 1e-12 {
        turn_axis = axis_unit(axis);
    }
    let lift = axis_unit(axis);

    (1..=count)
        .map(|i| {
            let radial = rotate_vector_around_axis(&v0, &turn_axis, step * i as f64);
            center0 + radial + lift * (rise * i as f64)
        })
        .collect()
}

/// Grid position vectors for the three axes.
///
/// Each vector is one voxel long. When `rotate` is set and the joint is
/// oblique, the two non-sliding vectors are turned by `±angle/2` around the
/// sliding vector and stretched by `1 / cos(angle)`.
pub fn position_vectors(voxel_sizes: [f64; 3], sliding: Axis, angle_deg: f64, rotate: bool) -> [Vec3; 3] {
    let mut vecs = [
        axis_unit(Axis::X) * voxel_sizes[0],
        axis_unit(Axis::Y) * voxel_sizes[1],
        axis_unit(Axis::Z) * voxel_sizes[2],
    ];
    if rotate && angle_deg != 0.0 {
        let sliding_vec = vecs[sliding.index()];
        let stretch = angle_deg.abs().to_radians().cos();
        for (i, axis) in sliding.others().iter().enumerate() {
            let mut theta = (0.5 * angle_deg).to_radians();
            if i % 2 == 1 {
                theta = -theta;
            }
            let turned = rotate_vector_around_axis(&vecs[axis.index()], &sliding_vec, theta);
            vecs[axis.index()] = turned / stretch;
        }
    }
    vecs
}
