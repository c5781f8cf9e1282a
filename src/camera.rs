//! The single perspective camera the model is presented through.
//!
//! [`Camera`] holds the eye position and the point it looks at, [`Projection`]
//! the perspective parameters that follow the surface aspect ratio, and
//! [`CameraUniform`] the matrices uploaded for the shaders.

use cgmath::{Matrix4, Point3, Rad, Vector3, perspective};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new((0.0, 0.0, 5.0), (0.0, 0.0, 0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let mut projection = Self {
            aspect: 1.0,
            fovy: fovy.into(),
            znear,
            zfar,
        };
        projection.resize(width as f32, height as f32);
        projection
    }

    /// Keeps the previous aspect when either side is zero (e.g. a minimised window).
    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<(&Camera, &Projection)> for CameraUniform {
    fn from((camera, projection): (&Camera, &Projection)) -> Self {
        let mut uniform = Self::new();
        uniform.update_view_proj(camera, projection);
        uniform
    }
}
