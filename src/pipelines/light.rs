//! The fixed light rig: a soft ambient term, a key light and a fill light.

/// Directions point from the origin towards the light. The alpha channel of
/// every colour carries the intensity.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 4],
    pub key_direction: [f32; 4],
    pub key_colour: [f32; 4],
    pub fill_direction: [f32; 4],
    pub fill_colour: [f32; 4],
}

impl LightUniform {
    pub fn new(ambient: f32, key: ([f32; 3], f32), fill: ([f32; 3], f32)) -> Self {
        let direction = |[x, y, z]: [f32; 3]| [x, y, z, 0.0];
        Self {
            ambient: [1.0, 1.0, 1.0, ambient],
            key_direction: direction(key.0),
            key_colour: [1.0, 1.0, 1.0, key.1],
            fill_direction: direction(fill.0),
            fill_colour: [1.0, 1.0, 1.0, fill.1],
        }
    }
}

impl Default for LightUniform {
    /// White ambient at 0.7, key light from (1, 2, 3) at full strength and a
    /// fill light from (-2, 0, -2) at half strength.
    fn default() -> Self {
        Self::new(0.7, ([1.0, 2.0, 3.0], 1.0), ([-2.0, 0.0, -2.0], 0.5))
    }
}
