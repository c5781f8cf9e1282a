//! Model and camera placement for a given viewport.
//!
//! [`solve`] is a pure function of the asset bounds and the viewport. Desktop
//! layouts push the model to the left and tilt it into a three-quarter view to
//! leave room for overlaid text; mobile layouts present it frontally. The camera
//! always sits on the +Z axis looking at the origin, far enough away for the
//! largest bounding dimension to fit the frame.

use cgmath::{Deg, Point3, Rad, Vector3};

use crate::{
    data_structures::bounds::BoundingInfo,
    viewport::{Viewport, ViewportClass},
};

/// Horizontal shift on desktop, as a fraction of the model width.
pub const DESKTOP_SHIFT: f32 = 0.4;
/// Horizontal shift on mobile, as a fraction of the model width.
pub const MOBILE_SHIFT: f32 = 1.0;
/// Vertical lift in both layouts, as a fraction of the model height.
pub const VERTICAL_LIFT: f32 = 0.085;
/// Tilt about the Z axis on desktop.
pub const DESKTOP_TILT: Deg<f32> = Deg(-25.0);
/// Largest bounding dimension assumed for flat or empty assets.
pub const MIN_EXTENT: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub class: ViewportClass,
    pub model_position: Vector3<f32>,
    pub model_rotation_z: Rad<f32>,
    pub camera_position: Point3<f32>,
    pub camera_look_at: Point3<f32>,
}

impl Placement {
    /// Distance of the camera from the point it looks at.
    pub fn camera_distance(&self) -> f32 {
        use cgmath::MetricSpace;
        self.camera_position.distance(self.camera_look_at)
    }
}

/// Largest bounding dimension, clamped so the camera never collapses onto its target.
pub fn framing_extent(bounds: &BoundingInfo) -> f32 {
    let extent = bounds.max_extent();
    if extent.is_finite() && extent >= MIN_EXTENT {
        extent
    } else {
        MIN_EXTENT
    }
}

pub fn solve(bounds: &BoundingInfo, viewport: Viewport, camera_distance: f32) -> Placement {
    let class = viewport.class();
    let center = bounds.center;
    let size = bounds.size;

    let (x, model_rotation_z) = match class {
        ViewportClass::Mobile => (center.x + size.x * MOBILE_SHIFT, Rad(0.0)),
        ViewportClass::Desktop => (center.x - size.x * DESKTOP_SHIFT, Rad::from(DESKTOP_TILT)),
    };
    let model_position = Vector3::new(x, center.y + size.y * VERTICAL_LIFT, center.z);

    let camera_position = Point3::new(0.0, 0.0, framing_extent(bounds) * camera_distance);

    Placement {
        class,
        model_position,
        model_rotation_z,
        camera_position,
        camera_look_at: Point3::new(0.0, 0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::bounds::Aabb;

    fn bounds(min: [f32; 3], max: [f32; 3]) -> BoundingInfo {
        BoundingInfo::from(Aabb {
            min: min.into(),
            max: max.into(),
        })
    }

    #[test]
    fn flat_asset_is_clamped() {
        let flat = bounds([0.0; 3], [0.0; 3]);
        let placement = solve(&flat, Viewport::new(1200.0, 800.0), 2.0);
        assert_eq!(placement.camera_position.z, MIN_EXTENT * 2.0);
    }

    #[test]
    fn non_finite_extent_is_clamped() {
        let broken = bounds([0.0; 3], [f32::NAN, 1.0, 1.0]);
        assert_eq!(framing_extent(&broken), 1.0);
        let broken = bounds([0.0; 3], [f32::INFINITY, 1.0, 1.0]);
        assert_eq!(framing_extent(&broken), MIN_EXTENT);
    }
}
