//! Tool-radius offsetting of ordered outline vertices.
//!
//! Each outline corner is pushed away from the material by the tool radius.
//! Convex corners that meet a matching inner corner of another component are
//! rounded with an arc so the other component still fits.

use crate::error::GeometryWarning;
use crate::milling_path::MillVertex;
use crate::region::{LayerFrame, NeighborKind, RegionVertex, SENTINEL};
use timberjoint_core::geometry::{angle_between, normalize, set_vector_length};
use timberjoint_core::Vec3;
use tracing::warn;

/// Cap on zig-zag passes when clearing a heavily rounded corner.
pub const MAX_ARTIFACT_PASSES: usize = 64;

/// Offset vectors towards each quadrant of a corner.
///
/// `full[x][y]` points into quadrant `[x][y]`; `along` and `across` are its
/// components on the first and second in-plane axis.
#[derive(Debug, Clone)]
pub struct NeighborVectors {
    pub full: [[Vec3; 2]; 2],
    pub along: [[Vec3; 2]; 2],
    pub across: [[Vec3; 2]; 2],
}

impl NeighborVectors {
    /// Vectors of length `radius / cos(angle)` along the layer's grid axes.
    pub fn new(frame: &LayerFrame, radius: f64, angle_deg: f64) -> Self {
        let length = radius / angle_deg.abs().to_radians().cos();
        let dir = normalize(&frame.plane_vector(0)) * length;
        let off = normalize(&frame.plane_vector(1)) * length;
        let sign = |k: usize| if k == 0 { -1.0 } else { 1.0 };
        let mut full = [[Vec3::zeros(); 2]; 2];
        let mut along = [[Vec3::zeros(); 2]; 2];
        let mut across = [[Vec3::zeros(); 2]; 2];
        for x in 0..2 {
            for y in 0..2 {
                along[x][y] = dir * sign(x);
                across[x][y] = off * sign(y);
                full[x][y] = along[x][y] + across[x][y];
            }
        }
        Self { full, along, across }
    }
}

/// Offset result for one ordered chain.
#[derive(Debug, Clone, Default)]
pub struct OffsetOutline {
    pub outline: Vec<MillVertex>,
    /// Extra clearing paths for corners a single arc cannot clear.
    pub artifacts: Vec<Vec<MillVertex>>,
    pub warnings: Vec<GeometryWarning>,
}

/// Parameters shared by every corner of a layer.
#[derive(Debug, Clone)]
pub struct OffsetParams<'a> {
    pub frame: &'a LayerFrame,
    pub vectors: &'a NeighborVectors,
    /// Effective tool radius (mm)
    pub radius: f64,
    pub component: usize,
    pub component_count: usize,
}

impl OffsetParams<'_> {
    fn diameter(&self) -> f64 {
        2.0 * self.radius
    }

    /// Whether a convex corner faces an inner corner of another component.
    fn is_rounded(&self, v: &RegionVertex) -> bool {
        if v.count(NeighborKind::Region) != 3 {
            return false;
        }
        let diagonal =
            v.values[0][0] == v.values[1][1] || v.values[0][1] == v.values[1][0];
        (0..self.component_count)
            .filter(|n2| *n2 != self.component)
            .any(|n2| match v.value_count(n2 as i32) {
                3 => true,
                2 => diagonal,
                _ => false,
            })
    }
}

/// Turn an ordered chain into a tool-centre outline.
pub fn offset_vertices(chain: &[RegionVertex], params: &OffsetParams<'_>) -> OffsetOutline {
    let res = params.frame.res() as isize;
    let nv = params.vectors;
    let mut result = OffsetOutline::default();
    let mut check_first_arc = true;

    for v in chain {
        let regions = v.count(NeighborKind::Region);
        let blocked = v.count(NeighborKind::Blocked);
        if (regions == 2 && blocked == 2) || blocked == 0 {
            continue;
        }
        if v.ind.iter().any(|&c| c < 0 || c > res) {
            continue;
        }
        let pt = params.frame.corner(v.ind[0] as usize, v.ind[1] as usize);

        let mut pushes = Vec::new();
        if blocked == 1 {
            if let Some((a, b)) = v.first(NeighborKind::Blocked) {
                pushes.push(-nv.full[a][b]);
            }
        }
        if regions == 1 && v.count(NeighborKind::Free) != 3 {
            if let Some((a, b)) = v.first(NeighborKind::Region) {
                pushes.push(nv.full[a][b]);
            }
            if let Some((a, b)) = v.first_value(SENTINEL) {
                pushes.push(nv.full[a][b]);
            }
        }
        let off = if pushes.is_empty() {
            Vec3::zeros()
        } else {
            pushes.iter().sum::<Vec3>() / pushes.len() as f64
        };

        match v.first(NeighborKind::Blocked) {
            Some((qa, qb)) if params.is_rounded(v) => {
                let a = -nv.along[qa][qb];
                let b = -nv.across[qa][qb];
                let reach = ((2.0 * (a + b).norm()).powi(2) - params.diameter().powi(2)).sqrt() - a.norm();
                let a2 = set_vector_length(&a, reach);
                let b2 = set_vector_length(&b, reach);
                let mut ends = [pt + a - b2, pt + b - a2];
                let center = pt - a - b;
                if let Some(prev) = result.outline.last() {
                    let ang1 = angle_between(&(ends[0] - prev.pt), &b);
                    let ang2 = angle_between(&(ends[1] - prev.pt), &b);
                    if ang1 > ang2 {
                        ends.swap(0, 1);
                    }
                }
                result.outline.push(MillVertex::arc(ends[0], center));
                result.outline.push(MillVertex::arc(ends[1], center));

                if (pt - center).norm() > params.diameter() && !params.frame.is_last_layer() {
                    clear_corner_artifact(pt, off, ends, params, &mut result);
                }
            }
            _ => result.outline.push(MillVertex::new(pt + off)),
        }

        // The first arc had no predecessor to orient it; fix it once the
        // third point is known.
        if check_first_arc && result.outline.len() > 2 && result.outline[0].is_arc {
            let next = result.outline[2].pt;
            let d0 = (result.outline[0].pt - next).norm();
            let d1 = (result.outline[1].pt - next).norm();
            if d0 < d1 {
                result.outline.swap(0, 1);
            }
            check_first_arc = false;
        }
    }
    result
}

/// Zig-zag into the leftover material behind a wide rounding arc.
fn clear_corner_artifact(
    pt: Vec3,
    off: Vec3,
    ends: [Vec3; 2],
    params: &OffsetParams<'_>,
    result: &mut OffsetOutline,
) {
    let diameter = params.diameter();
    let v0 = normalize(&(pt + off - ends[0])) * diameter;
    let v1 = normalize(&(pt + off - ends[1])) * diameter;
    let mut step = normalize(&(ends[1] - ends[0])) * params.radius;
    let mut pts = [ends[0] - step + v0, pt + 2.0 * off, ends[1] + step + v1];

    let mut artifact = Vec::new();
    let mut passes = 0;
    while (pts[2] - pts[0]).norm() > diameter {
        if passes == MAX_ARTIFACT_PASSES {
            let warning = GeometryWarning::ArtifactNotConverged {
                component: params.component,
                layer: params.frame.layer(),
                iterations: passes,
            };
            warn!("{}", warning);
            result.warnings.push(warning);
            break;
        }
        pts[0] += step;
        pts[1] -= off;
        pts[2] -= step;
        artifact.extend(pts.iter().map(|p| MillVertex::new(*p)));
        pts.reverse();
        step = -step;
        passes += 1;
    }
    if !artifact.is_empty() {
        result.artifacts.push(artifact);
    }
}
