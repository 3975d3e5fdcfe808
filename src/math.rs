//! Model, view and projection matrices.
//!
//! All matrices are column-major `cgmath` matrices in a right-handed,
//! OpenGL-style clip space (depth in -1..1). The wgpu backend converts the
//! projection to wgpu's 0..1 depth range when it is loaded into a shader.

use cgmath::{Deg, Matrix4, Vector3};

use crate::camera::Camera;

/// `T(position) · Rx(rx) · Ry(ry) · Rz(rz) · S(scale)`, angles in degrees.
///
/// Vertices are scaled first, then rotated about Z, Y and X, then moved; a
/// zero rotation with unit scale degenerates to a pure translation.
pub fn model_matrix(position: Vector3<f32>, rx: f32, ry: f32, rz: f32, scale: f32) -> Matrix4<f32> {
    Matrix4::from_translation(position)
        * Matrix4::from_angle_x(Deg(rx))
        * Matrix4::from_angle_y(Deg(ry))
        * Matrix4::from_angle_z(Deg(rz))
        * Matrix4::from_scale(scale)
}

/// World-to-camera transform.
///
/// The camera is oriented by yaw about Y and then pitch about X, so the world
/// is rotated by the inverse (−pitch about X, −yaw about Y) and then shifted
/// by the negated camera position.
pub fn view_matrix(camera: &Camera) -> Matrix4<f32> {
    Matrix4::from_angle_x(Deg(-camera.pitch))
        * Matrix4::from_angle_y(Deg(-camera.yaw))
        * Matrix4::from_translation(-camera.position)
}

/// Symmetric perspective frustum.
///
/// `fov_deg` is the horizontal field of view; the vertical extent follows
/// from `aspect` (width / height).
pub fn projection_matrix(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let x_scale = 1.0 / (fov_deg / 2.0).to_radians().tan();
    let y_scale = x_scale * aspect;
    let frustum_length = far - near;

    #[rustfmt::skip]
    let matrix = Matrix4::new(
        x_scale, 0.0,     0.0,                                 0.0,
        0.0,     y_scale, 0.0,                                 0.0,
        0.0,     0.0,     -((far + near) / frustum_length),    -1.0,
        0.0,     0.0,     -((2.0 * near * far) / frustum_length), 0.0,
    );
    matrix
}
