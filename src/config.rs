//! Viewer configuration.
//!
//! Everything the presentation pipeline treats as a tunable lives in
//! [`ViewerConfig`]. The defaults describe the shipped product page.

use cgmath::Deg;

/// Multiplier applied to the largest bounding dimension to get the camera's
/// distance from the origin.
pub const DEFAULT_CAMERA_DISTANCE: f32 = 1.5;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Path of the one asset to present, relative to `asset_root`.
    pub asset_path: String,
    /// Directory (native) or URL path prefix (web) assets are resolved against.
    pub asset_root: String,
    pub camera_distance: f32,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Upper bound for the device pixel ratio used to size the render surface
    /// on the web. Native windows render at their full physical size.
    pub max_pixel_ratio: f32,
    /// MSAA samples per pixel. Lowered to what the adapter supports, 1 disables it.
    pub sample_count: u32,
    pub clear_colour: wgpu::Color,
    /// Id of the page element the canvas gets appended to (web only).
    pub container_id: String,
}

impl ViewerConfig {
    pub fn with_asset(mut self, asset_path: impl Into<String>) -> Self {
        self.asset_path = asset_path.into();
        self
    }

    pub fn with_camera_distance(mut self, camera_distance: f32) -> Self {
        self.camera_distance = camera_distance;
        self
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_path: "models/scene.glb".to_string(),
            asset_root: "assets".to_string(),
            camera_distance: DEFAULT_CAMERA_DISTANCE,
            fovy: Deg(60.0),
            znear: 0.1,
            zfar: 1000.0,
            max_pixel_ratio: 2.0,
            sample_count: 4,
            clear_colour: wgpu::Color::TRANSPARENT,
            container_id: "model-container".to_string(),
        }
    }
}
