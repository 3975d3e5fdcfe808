//! Camera state and projection settings.

use cgmath::{Matrix4, Vector3};

use crate::{config::RendererConfig, math};

/// Converts OpenGL clip space (depth -1..1) to wgpu clip space (depth 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A free-look camera. `pitch` turns about X, `yaw` about Y, both in degrees.
/// Input handling lives outside the engine and mutates the fields directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub pitch: f32,
    pub yaw: f32,
}

impl Camera {
    pub fn new(position: Vector3<f32>, pitch: f32, yaw: f32) -> Self {
        Self {
            position,
            pitch,
            yaw,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        math::view_matrix(self)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, 0.0), 0.0, 0.0)
    }
}

/// Perspective settings tied to the viewport size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    aspect: f32,
    fov_deg: f32,
    near: f32,
    far: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fov_deg: f32, near: f32, far: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fov_deg,
            near,
            far,
        }
    }

    pub fn from_config(config: &RendererConfig, width: u32, height: u32) -> Self {
        Self::new(width, height, config.fov_deg, config.near_plane, config.far_plane)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        math::projection_matrix(self.fov_deg, self.aspect, self.near, self.far)
    }
}
