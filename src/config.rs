//! Renderer configuration.
//!
//! [`RendererConfig`] carries the knobs the batch renderer and the asset
//! loaders read: frustum parameters, the clear colour, face culling and the
//! directory assets are loaded from.

use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq)]
pub struct RendererConfig {
    /// Horizontal field of view in degrees.
    pub fov_deg: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// RGBA colour the colour target is cleared to at the start of a flush.
    pub clear_colour: [f32; 4],
    pub cull_back_faces: bool,
    pub asset_dir: PathBuf,
}

impl RendererConfig {
    pub const DEFAULT_FOV_DEG: f32 = 70.0;
    pub const DEFAULT_NEAR_PLANE: f32 = 0.1;
    pub const DEFAULT_FAR_PLANE: f32 = 1000.0;
    pub const CLEAR_COLOUR: [f32; 4] = [0.3, 0.0, 0.0, 1.0];

    pub fn new() -> Self {
        Self {
            fov_deg: Self::DEFAULT_FOV_DEG,
            near_plane: Self::DEFAULT_NEAR_PLANE,
            far_plane: Self::DEFAULT_FAR_PLANE,
            clear_colour: Self::CLEAR_COLOUR,
            cull_back_faces: true,
            asset_dir: PathBuf::from("assets"),
        }
    }

    pub fn with_fov(mut self, fov_deg: f32) -> Self {
        self.fov_deg = fov_deg;
        self
    }

    pub fn with_planes(mut self, near: f32, far: f32) -> Self {
        self.near_plane = near;
        self.far_plane = far;
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: [f32; 4]) -> Self {
        self.clear_colour = clear_colour;
        self
    }

    pub fn with_back_face_culling(mut self, enabled: bool) -> Self {
        self.cull_back_faces = enabled;
        self
    }

    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self
    }

    /// Resolve an asset name against [`asset_dir`](Self::asset_dir).
    pub fn asset_path(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.asset_dir.join(file_name)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_frustum() {
        let config = RendererConfig::default();
        assert_eq!(config.fov_deg, 70.0);
        assert_eq!(config.near_plane, 0.1);
        assert_eq!(config.far_plane, 1000.0);
        assert_eq!(config.clear_colour, [0.3, 0.0, 0.0, 1.0]);
        assert!(config.cull_back_faces);
    }

    #[test]
    fn asset_paths_are_relative_to_the_asset_dir() {
        let config = RendererConfig::new().with_asset_dir("res");
        assert_eq!(config.asset_path("cube.obj"), PathBuf::from("res/cube.obj"));
    }
}
