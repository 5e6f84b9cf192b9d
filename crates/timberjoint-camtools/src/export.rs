//! Machine file export.
//!
//! Paths are generated in joint coordinates. Before writing, every vertex is
//! moved into machine space: the sliding axis becomes Z, the component is
//! flipped so the tool always enters from above, the top surface sits at
//! Z = 0, and the component axis is turned onto the configured alignment
//! axis. One file is written per component.

use crate::error::CamToolResult;
use crate::milling_path::{ComponentPath, MillVertex, MillingPathGenerator};
use crate::post::post_for;
use std::fs;
use std::path::{Path, PathBuf};
use timberjoint_core::geometry::{normalize, rotate_vector_around_axis, signed_angle_between};
use timberjoint_core::{Axis, Direction, ExportFormat, JointDesign, Vec3};
use tracing::info;

/// Joint-to-machine coordinate mapping for one component.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineTransform {
    sliding_axis: Axis,
    fab_direction: Direction,
    /// Half the timber size along the sliding axis (mm).
    half_depth: f64,
    /// Turn about machine Z, if the component is not aligned with the
    /// sliding axis.
    rotation: Option<f64>,
}

impl MachineTransform {
    pub fn for_component(design: &JointDesign, n: usize) -> Self {
        let sliding_axis = design.sliding_axis();
        let fab_direction = design.fab_direction(n);
        let primary = design.fixed_sides().primary(n);

        let rotation = (primary.axis != sliding_axis).then(|| {
            let mut comp_vec = design.position_vectors()[primary.axis.index()];
            if primary.direction == Direction::Negative {
                comp_vec = -comp_vec;
            }
            let comp_vec = normalize(&swizzle(comp_vec, sliding_axis));
            let align = design.fabrication().alignment_axis as usize;
            let mut target = Vec3::zeros();
            target[align / 2] = if align % 2 == 1 { 1.0 } else { -1.0 };
            let angle = signed_angle_between(&target, &comp_vec, &Vec3::z());
            match fab_direction {
                Direction::Negative => -angle,
                Direction::Positive => angle,
            }
        });

        Self {
            sliding_axis,
            fab_direction,
            half_depth: 0.5 * design.timber_dims()[sliding_axis.index()],
            rotation,
        }
    }

    /// Machine-space position of joint point `p`, unrounded.
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        let mut q = p;
        if self.sliding_axis == Axis::Z {
            q.y = -q.y;
        }
        let mut q = swizzle(q, self.sliding_axis);
        let sign = self.fab_direction.sign();
        q.z = -sign * q.z - self.half_depth;
        q.y = -sign * q.y;
        match self.rotation {
            Some(angle) => rotate_vector_around_axis(&q, &Vec3::z(), angle),
            None => q,
        }
    }

    /// Machine-space vertex, rounded to the output precision.
    pub fn apply(&self, v: &MillVertex) -> MillVertex {
        let mut out = v.clone();
        out.pt = round3(self.apply_point(v.pt));
        if v.is_arc {
            out.arc_center = round3(self.apply_point(v.arc_center));
        }
        out
    }
}

/// Reorder coordinates so the sliding axis lands on Z.
fn swizzle(p: Vec3, sliding_axis: Axis) -> Vec3 {
    let mut coords = vec![0, 1];
    coords.insert(sliding_axis.index(), 2);
    let mut out = Vec3::zeros();
    for (i, c) in coords.into_iter().enumerate() {
        out[c] = p[i];
    }
    out
}

fn round3(p: Vec3) -> Vec3 {
    p.map(|c| (c * 1000.0).round() / 1000.0)
}

/// Label of component `n`: `A` to `Z`, then `AA`, `AB`, ...
pub fn component_letter(n: usize) -> String {
    let mut label = Vec::new();
    let mut rest = n + 1;
    while rest > 0 {
        rest -= 1;
        label.push(b'A' + (rest % 26) as u8);
        rest /= 26;
    }
    label.iter().rev().map(|&b| b as char).collect()
}

/// File for component `n` next to `base`: `joint.tsu` becomes
/// `joint_A.gcode` for the first component.
pub fn component_file_name(base: &Path, n: usize, format: ExportFormat) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("joint");
    base.with_file_name(format!("{}_{}.{}", stem, component_letter(n), format.extension()))
}

/// Writes the control files of a design.
pub struct Exporter<'a> {
    design: &'a JointDesign,
}

impl<'a> Exporter<'a> {
    pub fn new(design: &'a JointDesign) -> Self {
        Self { design }
    }

    /// Control file contents for one generated component path.
    pub fn render_component(&self, path: &ComponentPath) -> String {
        let fab = self.design.fabrication();
        let transform = MachineTransform::for_component(self.design, path.component);
        let vertices: Vec<MillVertex> = path.vertices.iter().map(|v| transform.apply(v)).collect();
        post_for(fab.export_format, fab).generate(&vertices)
    }

    /// Generate and render every component.
    pub fn render(&self) -> CamToolResult<Vec<String>> {
        let paths = MillingPathGenerator::new(self.design).generate()?;
        Ok(paths.iter().map(|p| self.render_component(p)).collect())
    }

    /// Write one file per component next to `base` and return their paths.
    ///
    /// Files are written in component order; on failure the files already
    /// written are left in place.
    pub fn export(&self, base: &Path) -> CamToolResult<Vec<PathBuf>> {
        let format = self.design.fabrication().export_format;
        let mut written = Vec::new();
        for (n, contents) in self.render()?.into_iter().enumerate() {
            let file = component_file_name(base, n, format);
            fs::write(&file, contents)?;
            info!("Exported {}", file.display());
            written.push(file);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swizzle_puts_sliding_axis_on_z() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(swizzle(p, Axis::Z), p);
        assert_eq!(swizzle(p, Axis::X), Vec3::new(2.0, 3.0, 1.0));
        assert_eq!(swizzle(p, Axis::Y), Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn test_top_face_maps_to_zero() {
        let t = MachineTransform {
            sliding_axis: Axis::Z,
            fab_direction: Direction::Negative,
            half_depth: 22.0,
            rotation: None,
        };
        let top = t.apply_point(Vec3::new(5.0, 7.0, 22.0));
        // Y is mirrored when sliding along Z.
        assert_eq!(top, Vec3::new(5.0, -7.0, 0.0));
        let bottom = t.apply_point(Vec3::new(5.0, 7.0, -22.0));
        assert_eq!(bottom.z, -44.0);

        let t = MachineTransform {
            fab_direction: Direction::Positive,
            ..t
        };
        // Cut from the bottom: the far face becomes the top.
        let p = t.apply_point(Vec3::new(5.0, 7.0, -22.0));
        assert_eq!(p, Vec3::new(5.0, 7.0, 0.0));
    }

    #[test]
    fn test_rounding_and_arc_centers() {
        let t = MachineTransform {
            sliding_axis: Axis::Z,
            fab_direction: Direction::Negative,
            half_depth: 0.0,
            rotation: Some(std::f64::consts::FRAC_PI_2),
        };
        let v = t.apply(&MillVertex::arc(Vec3::new(1.23456, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(v.pt, Vec3::new(0.0, 1.235, 0.0));
        assert_eq!(v.arc_center, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_component_file_name() {
        let base = Path::new("/tmp/out/joint.tsu");
        assert_eq!(
            component_file_name(base, 0, ExportFormat::Gcode),
            PathBuf::from("/tmp/out/joint_A.gcode")
        );
        assert_eq!(
            component_file_name(base, 5, ExportFormat::Sbp),
            PathBuf::from("/tmp/out/joint_F.sbp")
        );
        assert_eq!(
            component_file_name(base, 6, ExportFormat::Nc),
            PathBuf::from("/tmp/out/joint_G.nc")
        );
    }

    #[test]
    fn test_component_letters_are_distinct() {
        assert_eq!(component_letter(0), "A");
        assert_eq!(component_letter(25), "Z");
        assert_eq!(component_letter(26), "AA");
        assert_eq!(component_letter(27), "AB");
        assert_eq!(component_letter(701), "ZZ");
        assert_eq!(component_letter(702), "AAA");
        let labels: std::collections::HashSet<String> = (0..800).map(component_letter).collect();
        assert_eq!(labels.len(), 800);
    }
}
