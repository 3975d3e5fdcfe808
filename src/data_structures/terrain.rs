//! Flat terrain tiles.
//!
//! A tile is a square grid of [`Terrain::VERTEX_COUNT`]² vertices spanning
//! [`Terrain::SIZE`] world units on the XZ plane, with normals pointing up and
//! the texture stretched once over the whole tile. Tiles are placed on a grid:
//! tile `(gx, gz)` starts at `(gx * SIZE, 0, gz * SIZE)`.

use cgmath::Vector3;

use crate::{
    backend::GraphicsBackend,
    data_structures::{material::MaterialBinding, model::RawMeshData},
    error::{RenderError, Result},
    geometry::{GeometryStore, TextureHandle},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terrain {
    x: f32,
    z: f32,
    binding: MaterialBinding,
}

impl Terrain {
    pub const SIZE: f32 = 800.0;
    pub const VERTEX_COUNT: usize = 128;

    /// Generate the tile mesh, upload it and bind it to `texture`.
    pub fn new<B: GraphicsBackend>(
        grid_x: i32,
        grid_z: i32,
        store: &mut GeometryStore<B>,
        texture: TextureHandle,
    ) -> Result<Self> {
        let mesh = store.upload(&generate_mesh(Self::VERTEX_COUNT, Self::SIZE)?)?;
        Ok(Self {
            x: grid_x as f32 * Self::SIZE,
            z: grid_z as f32 * Self::SIZE,
            binding: MaterialBinding::new(mesh, texture),
        })
    }

    /// Replace the default matte coefficients.
    pub fn with_shine(self, shine_damper: f32, reflectivity: f32) -> Result<Self> {
        Ok(Self {
            binding: self.binding.with_shine(shine_damper, reflectivity)?,
            ..self
        })
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    pub fn origin(&self) -> Vector3<f32> {
        Vector3::new(self.x, 0.0, self.z)
    }

    pub fn binding(&self) -> &MaterialBinding {
        &self.binding
    }
}

/// Build a `vertex_count`×`vertex_count` grid of side `size`.
///
/// A grid needs at least two vertices per side.
pub fn generate_mesh(vertex_count: usize, size: f32) -> Result<RawMeshData> {
    if vertex_count < 2 {
        return Err(RenderError::InvalidGeometry(format!(
            "terrain grid needs at least 2 vertices per side, got {}",
            vertex_count
        )));
    }
    let count = vertex_count * vertex_count;
    let last = (vertex_count - 1) as f32;

    let mut positions = Vec::with_capacity(count * 3);
    let mut normals = Vec::with_capacity(count * 3);
    let mut tex_coords = Vec::with_capacity(count * 2);
    for i in 0..vertex_count {
        for j in 0..vertex_count {
            positions.extend([j as f32 / last * size, 0.0, i as f32 / last * size]);
            normals.extend([0.0, 1.0, 0.0]);
            tex_coords.extend([j as f32 / last, i as f32 / last]);
        }
    }

    let mut indices = Vec::with_capacity(6 * (vertex_count - 1) * (vertex_count - 1));
    for gz in 0..vertex_count - 1 {
        for gx in 0..vertex_count - 1 {
            let top_left = (gz * vertex_count + gx) as u32;
            let top_right = top_left + 1;
            let bottom_left = ((gz + 1) * vertex_count + gx) as u32;
            let bottom_right = bottom_left + 1;
            indices.extend([
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }

    Ok(RawMeshData::new(positions, tex_coords, normals, Some(indices)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::headless::HeadlessBackend, data_structures::texture::TextureData};

    #[test]
    fn grid_has_expected_sizes() {
        let mesh = generate_mesh(4, 10.0).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.tex_coords.len(), 32);
        assert_eq!(mesh.indices.as_ref().map(Vec::len), Some(6 * 9));
        // Last vertex sits in the far corner.
        assert_eq!(&mesh.positions[45..48], &[10.0, 0.0, 10.0]);
    }

    #[test]
    fn degenerate_grids_are_rejected() {
        for vertex_count in [0, 1] {
            assert!(matches!(
                generate_mesh(vertex_count, 10.0),
                Err(RenderError::InvalidGeometry(_))
            ));
        }
        let smallest = generate_mesh(2, 1.0).unwrap();
        assert!(smallest.positions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn tiles_are_placed_on_the_grid() {
        let mut store = GeometryStore::new(HeadlessBackend::new(1, 1));
        let texture = store
            .upload_texture(&TextureData::solid(1, 1, [0, 255, 0, 255]))
            .unwrap();
        let terrain = Terrain::new(-1, 2, &mut store, texture).unwrap();
        assert_eq!(terrain.origin(), Vector3::new(-800.0, 0.0, 1600.0));
        let mesh = terrain.binding().mesh();
        assert_eq!(mesh.element_count() as usize, 6 * 127 * 127);
    }
}
