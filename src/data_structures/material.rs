//! Material bindings: the unit the renderer batches by.

use crate::{
    error::{RenderError, Result},
    geometry::{MeshHandle, TextureHandle},
};

/// A mesh, the texture it is drawn with and its specular coefficients.
///
/// `shine_damper` controls how tight the specular highlight is (must be > 0),
/// `reflectivity` how strong it is (must be >= 0). Every instance that looks
/// the same shares one binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialBinding {
    mesh: MeshHandle,
    texture: TextureHandle,
    shine_damper: f32,
    reflectivity: f32,
}

impl MaterialBinding {
    pub const DEFAULT_SHINE_DAMPER: f32 = 1.0;
    pub const DEFAULT_REFLECTIVITY: f32 = 0.0;

    /// A matte binding with the default coefficients.
    pub fn new(mesh: MeshHandle, texture: TextureHandle) -> Self {
        Self {
            mesh,
            texture,
            shine_damper: Self::DEFAULT_SHINE_DAMPER,
            reflectivity: Self::DEFAULT_REFLECTIVITY,
        }
    }

    pub fn with_shine(self, shine_damper: f32, reflectivity: f32) -> Result<Self> {
        if !(shine_damper > 0.0) {
            return Err(RenderError::InvalidMaterial(format!(
                "shine damper must be positive, got {shine_damper}"
            )));
        }
        if !(reflectivity >= 0.0) {
            return Err(RenderError::InvalidMaterial(format!(
                "reflectivity must not be negative, got {reflectivity}"
            )));
        }
        Ok(Self {
            shine_damper,
            reflectivity,
            ..self
        })
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn shine_damper(&self) -> f32 {
        self.shine_damper
    }

    pub fn reflectivity(&self) -> f32 {
        self.reflectivity
    }

    pub fn key(&self) -> BindingKey {
        BindingKey {
            mesh: self.mesh,
            texture: self.texture,
            shine_damper: self.shine_damper.to_bits(),
            reflectivity: self.reflectivity.to_bits(),
        }
    }
}

/// Hashable identity of a [`MaterialBinding`]. Two bindings with equal keys
/// need exactly the same GPU state and can share a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    mesh: MeshHandle,
    texture: TextureHandle,
    shine_damper: u32,
    reflectivity: u32,
}
