//! Raw geometry as produced by the loaders and consumed by the geometry store.

/// Flat vertex streams for one mesh.
///
/// `positions` and `normals` hold three floats per vertex, `tex_coords` two.
/// `indices` holds three entries per triangle; `None` draws the vertices in
/// order. The data is consumed once by
/// [`GeometryStore::upload`](crate::geometry::GeometryStore::upload) and can be
/// dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMeshData {
    pub positions: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Option<Vec<u32>>,
}

impl RawMeshData {
    pub fn new(
        positions: Vec<f32>,
        tex_coords: Vec<f32>,
        normals: Vec<f32>,
        indices: Option<Vec<u32>>,
    ) -> Self {
        Self {
            positions,
            tex_coords,
            normals,
            indices,
        }
    }

    /// Number of vertices implied by the position stream.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// What a draw call over this mesh would process.
    pub fn element_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.vertex_count(),
        }
    }
}
