//! Local node transformations.
//!
//! A [`Transform`] is the position/rotation/scale triple every scene node
//! carries. World matrices are the product of the matrices along the path
//! from the root.

use cgmath::{Matrix, One, SquareMatrix};

/// Translation, rotation (as quaternion) and non-uniform scale of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// The identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Translation * rotation * scale, the order glTF and most DCC tools use.
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse-transpose of the upper 3x3 block, padded to a 4x4 for uniform alignment.
    ///
    /// Falls back to the pure rotation when the scale is singular.
    pub fn normal_matrix(&self) -> cgmath::Matrix4<f32> {
        normal_matrix(&self.to_matrix()).unwrap_or_else(|| cgmath::Matrix4::from(self.rotation))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<cgmath::Vector3<f32>> for Transform {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

/// Normal matrix of an arbitrary affine matrix, `None` if it cannot be inverted.
pub fn normal_matrix(matrix: &cgmath::Matrix4<f32>) -> Option<cgmath::Matrix4<f32>> {
    let upper = cgmath::Matrix3::new(
        matrix.x.x, matrix.x.y, matrix.x.z, //
        matrix.y.x, matrix.y.y, matrix.y.z, //
        matrix.z.x, matrix.z.y, matrix.z.z,
    );
    upper
        .invert()
        .map(|inverse| cgmath::Matrix4::from(inverse.transpose()))
}
