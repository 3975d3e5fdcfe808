//! Drawable instances.
//!
//! A [`SceneInstance`] places one copy of a [`MaterialBinding`] in the world.
//! Many instances share a binding; the renderer draws all of them with a
//! single bind cycle and one draw call per instance.

use cgmath::Vector3;

use crate::{data_structures::material::MaterialBinding, math};

/// Position, Euler rotation (degrees, applied X then Y then Z) and uniform
/// scale of one drawable entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneInstance {
    pub binding: MaterialBinding,
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: f32,
}

impl SceneInstance {
    /// Create an instance at the origin with no rotation and unit scale.
    pub fn new(binding: MaterialBinding) -> Self {
        Self {
            binding,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
        }
    }

    pub fn at(binding: MaterialBinding, position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::new(binding)
        }
    }

    pub fn with_rotation(mut self, rx: f32, ry: f32, rz: f32) -> Self {
        self.rotation = Vector3::new(rx, ry, rz);
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn increase_position(&mut self, dx: f32, dy: f32, dz: f32) {
        self.position += Vector3::new(dx, dy, dz);
    }

    pub fn increase_rotation(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation += Vector3::new(dx, dy, dz);
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        math::model_matrix(
            self.position,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.scale,
        )
    }
}
