//! Milling path generation for joint components.
//!
//! Each component is milled layer by layer from the face given by its
//! fabrication direction. On every layer the foreign material around the
//! component is split into regions; every region is rough-cleared with
//! parallel lanes and then finished along its offset outline. Oblique
//! joints get an extra trimming cut along the sloped edge.

use crate::error::{CamToolError, CamToolResult, GeometryWarning};
use crate::layering::{end_points, layered_vertices, pass_depths, LayerDepths};
use crate::offset::{offset_vertices, NeighborVectors, OffsetParams};
use crate::ordering::order_outline;
use crate::region::{collect_region, padded_layer, region_outline_vertices, LayerFrame};
use crate::roughing::{rough_milling_paths, LaneLayout, RoughPixel};
use timberjoint_core::geometry::{axis_unit, normalize, rotate_vector_around_axis};
use timberjoint_core::{JointDesign, Vec3};
use tracing::{debug, info};

/// Angles below this many degrees are milled like square joints.
const OBLIQUE_THRESHOLD_DEG: f64 = 1.0;

/// Arc end points closer than this in XY are written as straight moves.
const MIN_ARC_CHORD: f64 = 1e-9;

/// One point of a milling path.
#[derive(Debug, Clone, PartialEq)]
pub struct MillVertex {
    pub pt: Vec3,
    /// Rapid move to this point (G0) instead of a cutting move.
    pub is_traversing: bool,
    /// This point ends or starts an arc around `arc_center`.
    pub is_arc: bool,
    pub arc_center: Vec3,
}

impl MillVertex {
    pub fn new(pt: Vec3) -> Self {
        Self {
            pt,
            is_traversing: false,
            is_arc: false,
            arc_center: Vec3::zeros(),
        }
    }

    pub fn traverse(pt: Vec3) -> Self {
        Self {
            is_traversing: true,
            ..Self::new(pt)
        }
    }

    pub fn arc(pt: Vec3, center: Vec3) -> Self {
        Self {
            pt,
            is_traversing: false,
            is_arc: true,
            arc_center: center,
        }
    }

    /// Both vertices lie on the same arc in the machine XY plane and are
    /// apart in XY. A pass that starts where the previous one ended shares
    /// the arc center but only plunges.
    pub fn is_connected_arc(&self, previous: &MillVertex) -> bool {
        self.is_arc
            && previous.is_arc
            && self.arc_center.x == previous.arc_center.x
            && self.arc_center.y == previous.arc_center.y
            && (self.pt - previous.pt).xy().norm() > MIN_ARC_CHORD
    }
}

/// Complete path of one component, in joint coordinates.
#[derive(Debug, Clone, Default)]
pub struct ComponentPath {
    pub component: usize,
    pub vertices: Vec<MillVertex>,
    pub warnings: Vec<GeometryWarning>,
}

impl ComponentPath {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Generates milling paths for the components of a joint design.
pub struct MillingPathGenerator<'a> {
    design: &'a JointDesign,
}

impl<'a> MillingPathGenerator<'a> {
    pub fn new(design: &'a JointDesign) -> Self {
        Self { design }
    }

    /// Refuse tools that cannot enter a single voxel.
    pub fn check_tool(&self) -> CamToolResult<()> {
        let diameter = self.design.fabrication().effective_diameter();
        let smallest = self
            .design
            .voxel_sizes()
            .into_iter()
            .fold(f64::INFINITY, f64::min);
        if smallest < diameter {
            return Err(CamToolError::ToolTooLarge {
                tool_diameter: diameter,
                voxel_size: smallest,
            });
        }
        Ok(())
    }

    /// Paths for all components in order.
    pub fn generate(&self) -> CamToolResult<Vec<ComponentPath>> {
        self.check_tool()?;
        info!(
            "Generating milling paths for {} components",
            self.design.component_count()
        );
        (0..self.design.component_count())
            .map(|n| self.generate_component(n))
            .collect()
    }

    /// Path for component `n`.
    pub fn generate_component(&self, n: usize) -> CamToolResult<ComponentPath> {
        let design = self.design;
        let count = design.component_count();
        if n >= count {
            return Err(CamToolError::UnknownComponent { index: n, count });
        }
        self.check_tool()?;

        let fab = design.fabrication();
        let radius = fab.effective_radius();
        let sliding = design.sliding_axis();
        let res = design.voxel_res();
        let fab_direction = design.fab_direction(n);
        let pos_vecs = design.position_vectors();
        let voxel_sizes = design.voxel_sizes();
        let (passes, pass_depth) = pass_depths(voxel_sizes[sliding.index()], fab.pass_depth);
        let primary = design.fixed_sides().primary(n);

        let mut path = ComponentPath {
            component: n,
            ..Default::default()
        };

        for layer in 0..res {
            let frame = LayerFrame::new(res, sliding, fab_direction, layer, pos_vecs);
            let depths = LayerDepths {
                sliding_axis: sliding,
                fab_direction,
                layer,
                res,
                voxel_height: voxel_sizes[sliding.index()],
                passes,
                pass_depth,
                extra_final_pass: primary.axis != sliding,
                incremental: design.incremental_depth(),
            };
            let vectors = NeighborVectors::new(&frame, radius, design.angle());
            let params = OffsetParams {
                frame: &frame,
                vectors: &vectors,
                radius,
                component: n,
                component_count: count,
            };
            let [_, off_axis] = frame.plane_axes();
            let layout = LaneLayout::new(
                &frame,
                design.timber_dims()[off_axis.index()],
                voxel_sizes[off_axis.index()],
                radius,
            );

            let mut grid = padded_layer(design.voxels(), design.fixed_sides(), &frame);
            let original = grid.clone();
            let mut edge_done = false;

            while let Some(seed) = grid.first_foreign(n) {
                let region = collect_region(&grid, seed, n);
                debug!(
                    "Component {} layer {}: region of {} cells",
                    n,
                    layer,
                    region.len()
                );

                if !edge_done && design.angle().abs() > OBLIQUE_THRESHOLD_DEG {
                    let edge = self.edge_milling_path(&frame, n, radius);
                    path.vertices.extend(layered_vertices(&edge, &depths));
                    edge_done = true;
                }

                let pixels: Vec<RoughPixel> = region
                    .iter()
                    .map(|&cell| RoughPixel::new(&grid, cell, n, res))
                    .collect();
                for lanes in rough_milling_paths(&pixels, &frame, layout, radius) {
                    path.vertices.extend(layered_vertices(&lanes, &depths));
                }

                for &(i, j) in &region {
                    grid.set(i, j, n as i32);
                }

                let outline = region_outline_vertices(&region, &grid, &original);
                for chain in order_outline(outline) {
                    let offset = offset_vertices(&chain.vertices, &params);
                    if chain.vertices.len() > 1 && !offset.outline.is_empty() {
                        let mut outline = offset.outline;
                        if chain.closed {
                            outline.push(MillVertex::new(outline[0].pt));
                        }
                        path.vertices.extend(layered_vertices(&outline, &depths));
                    }
                    for artifact in &offset.artifacts {
                        path.vertices.extend(layered_vertices(artifact, &depths));
                    }
                    path.warnings.extend(offset.warnings);
                }
            }
        }

        if let Some(last) = path.vertices.last() {
            let ends = end_points(last, sliding, fab_direction);
            path.vertices.extend(ends);
        }
        info!(
            "Component {}: {} path vertices, {} warnings",
            n,
            path.vertices.len(),
            path.warnings.len()
        );
        Ok(path)
    }

    /// Trimming cut along the sloped outer edge of an oblique component.
    ///
    /// Only components held by a single side across the sliding axis get
    /// one, and only when some of their material reaches that edge.
    fn edge_milling_path(&self, frame: &LayerFrame, n: usize, radius: f64) -> Vec<MillVertex> {
        let design = self.design;
        let sides = design.fixed_sides().component(n);
        let sliding = frame.sliding_axis();
        let [side] = sides else {
            return Vec::new();
        };
        if side.axis == sliding {
            return Vec::new();
        }
        let Some(&along) = sliding.others().iter().find(|a| **a != side.axis) else {
            return Vec::new();
        };
        let res = frame.res();
        let dir = side.direction.index();
        let fdir = frame.fab_direction().index();

        let mut probe = [0; 3];
        probe[side.axis.index()] = (1 - dir) * (res - 1);
        probe[sliding.index()] = fdir * (res - 1);
        let reaches_edge = (0..res).any(|i| {
            probe[along.index()] = i;
            design.voxels().get(probe) == n
        });
        if !reaches_edge {
            return Vec::new();
        }

        let mut index = [0; 3];
        index[side.axis.index()] = (1 - dir) * res;
        index[sliding.index()] = frame.entry_face();
        let pt0 = frame.point(index);
        index[along.index()] = res;
        let pt1 = frame.point(index);

        let turn = axis_unit(sliding) * frame.fab_direction().sign();
        let off = rotate_vector_around_axis(&normalize(&(pt0 - pt1)), &turn, 90f64.to_radians())
            * side.direction.sign()
            * radius;
        vec![MillVertex::new(pt0 + off), MillVertex::new(pt1 + off)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timberjoint_core::{Direction, FabricationSettings, FixedSide, HeightField};
    use timberjoint_core::{Axis, DesignParameters};

    fn step_design(fabrication: FabricationSettings) -> JointDesign {
        let field = HeightField::from_rows(vec![vec![0, 0, 0], vec![1, 1, 1], vec![2, 2, 2]]).unwrap();
        JointDesign::new(
            DesignParameters::default(),
            vec![
                vec![FixedSide::new(Axis::Z, Direction::Negative)],
                vec![FixedSide::new(Axis::Z, Direction::Positive)],
            ],
            vec![field],
            fabrication,
        )
        .unwrap()
    }

    #[test]
    fn test_connected_arc_needs_shared_center() {
        let c = Vec3::new(1.0, 2.0, 3.0);
        let a = MillVertex::arc(Vec3::zeros(), c);
        let b = MillVertex::arc(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, -5.0));
        assert!(b.is_connected_arc(&a));
        assert!(!MillVertex::new(Vec3::zeros()).is_connected_arc(&a));
        let d = MillVertex::arc(Vec3::zeros(), Vec3::new(1.5, 2.0, 3.0));
        assert!(!d.is_connected_arc(&a));
        // Same XY, lower Z: a plunge, not an arc.
        let e = MillVertex::arc(Vec3::new(0.0, 0.0, -1.5), c);
        assert!(!e.is_connected_arc(&a));
    }

    #[test]
    fn test_tool_too_large() {
        let design = step_design(FabricationSettings {
            tool_diameter: 20.0,
            ..Default::default()
        });
        let generator = MillingPathGenerator::new(&design);
        let err = generator.generate().unwrap_err();
        assert!(matches!(err, CamToolError::ToolTooLarge { .. }));
    }

    #[test]
    fn test_unknown_component() {
        let design = step_design(FabricationSettings::default());
        let err = MillingPathGenerator::new(&design).generate_component(2).unwrap_err();
        assert!(matches!(err, CamToolError::UnknownComponent { index: 2, count: 2 }));
    }

    #[test]
    fn test_step_joint_paths_end_at_origin() {
        let design = step_design(FabricationSettings::default());
        let paths = MillingPathGenerator::new(&design).generate().unwrap();
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert!(!path.is_empty());
            assert!(path.vertices[0].is_traversing);
            let last = &path.vertices[path.vertices.len() - 1];
            assert!(last.is_traversing);
            assert_eq!(last.pt.x, 0.0);
            assert_eq!(last.pt.y, 0.0);
        }
    }
}
