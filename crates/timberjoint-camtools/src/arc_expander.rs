//! Arc Expander
//!
//! Converts arc moves into short linear moves, for output without native
//! arcs and for arcs that change height.

use std::f64::consts::PI;
use timberjoint_core::Vec3;

/// Arc expansion configuration
#[derive(Debug, Clone)]
pub struct ArcExpanderConfig {
    /// Largest sweep of one segment (degrees)
    pub angular_step_deg: f64,
}

impl Default for ArcExpanderConfig {
    fn default() -> Self {
        Self {
            angular_step_deg: 1.0,
        }
    }
}

/// Converts arc moves to line segments
#[derive(Debug)]
pub struct ArcExpander {
    config: ArcExpanderConfig,
}

impl ArcExpander {
    /// Create a new arc expander
    pub fn new(config: ArcExpanderConfig) -> Self {
        Self { config }
    }

    /// Expand the XY arc from `start` to `end` around `center` into points.
    ///
    /// Z is interpolated linearly, so a helical move stays helical. The end
    /// point is included, the start point is not.
    pub fn expand_arc(&self, start: &Vec3, end: &Vec3, center: &Vec3, is_clockwise: bool) -> Vec<Vec3> {
        let radius_x = start.x - center.x;
        let radius_y = start.y - center.y;
        let radius = (radius_x * radius_x + radius_y * radius_y).sqrt();

        let start_angle = radius_y.atan2(radius_x);
        let end_angle = (end.y - center.y).atan2(end.x - center.x);

        let mut angle_delta = end_angle - start_angle;
        if is_clockwise && angle_delta > 0.0 {
            angle_delta -= 2.0 * PI;
        } else if !is_clockwise && angle_delta < 0.0 {
            angle_delta += 2.0 * PI;
        }

        let step = self.config.angular_step_deg.to_radians();
        let segments = ((angle_delta.abs() / step).round() as usize).max(1);
        let rise = end.z - start.z;

        let mut points: Vec<Vec3> = (1..segments)
            .map(|i| {
                let fraction = i as f64 / segments as f64;
                let angle = start_angle + angle_delta * fraction;
                Vec3::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                    start.z + rise * fraction,
                )
            })
            .collect();
        points.push(*end);
        points
    }
}

impl Default for ArcExpander {
    fn default() -> Self {
        Self::new(ArcExpanderConfig::default())
    }
}
