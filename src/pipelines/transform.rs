use cgmath::SquareMatrix;

use crate::data_structures::transform::Transform;

/// Model and normal matrix of the asset root, written once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn new() -> Self {
        Self {
            model: cgmath::Matrix4::identity().into(),
            normal: cgmath::Matrix4::identity().into(),
        }
    }
}

impl Default for TransformUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Transform> for TransformUniform {
    fn from(transform: &Transform) -> Self {
        Self {
            model: transform.to_matrix().into(),
            normal: transform.normal_matrix().into(),
        }
    }
}
