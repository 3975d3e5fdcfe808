//! GPU resource ownership.
//!
//! [`GeometryStore`] owns the graphics backend together with every mesh and
//! texture uploaded through it. Resources live in generational arenas: a
//! handle is a slot index plus the generation the slot had when the resource
//! was created. Releasing a resource bumps the generation, so any handle still
//! pointing at the slot is detected as stale instead of resolving to whatever
//! reuses the slot later.
//!
//! Dropping the store releases everything that is still alive.

use crate::{
    backend::{BufferId, BufferKind, GraphicsBackend, MeshBuffers, TextureId},
    data_structures::{model::RawMeshData, texture::TextureData},
    error::{RenderError, Result},
};

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Vec-backed arena with a free list and per-slot generations.
#[derive(Debug)]
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, value: T) -> (u32, u32) {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return (index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        (index, 0)
    }

    fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_ref())
    }

    fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        Some(value)
    }

    fn drain(&mut self) -> Vec<T> {
        let mut drained = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                drained.push(value);
            }
        }
        drained
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value.is_some()).count()
    }
}

/// Reference to an uploaded mesh.
///
/// `element_count` is the number of indices for indexed meshes and the number
/// of vertices otherwise; it is what a draw call over the mesh processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle {
    index: u32,
    generation: u32,
    element_count: u32,
    indexed: bool,
}

impl MeshHandle {
    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }
}

/// Reference to an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    index: u32,
    generation: u32,
}

pub struct GeometryStore<B: GraphicsBackend> {
    backend: B,
    meshes: Arena<MeshBuffers>,
    textures: Arena<TextureId>,
}

impl<B: GraphicsBackend> GeometryStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            meshes: Arena::new(),
            textures: Arena::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Validate `data` and upload it as one buffer per vertex stream plus an
    /// index buffer when the mesh is indexed.
    ///
    /// Nothing reaches the backend unless every array agrees with the vertex
    /// count. If the backend fails half way, the buffers created so far are
    /// destroyed again before the error is returned.
    pub fn upload(&mut self, data: &RawMeshData) -> Result<MeshHandle> {
        let element_count = validate(data)?;

        let mut created: Vec<BufferId> = Vec::with_capacity(4);
        let buffers = match self.create_mesh_buffers(data, element_count, &mut created) {
            Ok(buffers) => buffers,
            Err(e) => {
                log::error!("Mesh upload failed, rolling back {} buffers: {}", created.len(), e);
                for buffer in created {
                    self.backend.destroy_buffer(buffer);
                }
                return Err(e);
            }
        };

        let (index, generation) = self.meshes.insert(buffers);
        log::debug!(
            "Uploaded mesh {}#{} ({} vertices, {} elements)",
            index,
            generation,
            data.vertex_count(),
            element_count
        );
        Ok(MeshHandle {
            index,
            generation,
            element_count,
            indexed: buffers.is_indexed(),
        })
    }

    fn create_mesh_buffers(
        &mut self,
        data: &RawMeshData,
        element_count: u32,
        created: &mut Vec<BufferId>,
    ) -> Result<MeshBuffers> {
        let mut create = |kind: BufferKind, bytes: &[u8]| -> Result<BufferId> {
            let id = self.backend.create_buffer(kind, bytes)?;
            created.push(id);
            Ok(id)
        };
        let positions = create(BufferKind::POSITIONS, bytemuck::cast_slice(&data.positions))?;
        let tex_coords = create(BufferKind::TEX_COORDS, bytemuck::cast_slice(&data.tex_coords))?;
        let normals = create(BufferKind::NORMALS, bytemuck::cast_slice(&data.normals))?;
        let indices = match &data.indices {
            Some(indices) => Some(create(BufferKind::Index, bytemuck::cast_slice(indices))?),
            None => None,
        };
        Ok(MeshBuffers {
            positions,
            tex_coords,
            normals,
            indices,
            element_count,
        })
    }

    pub fn upload_texture(&mut self, image: &TextureData) -> Result<TextureHandle> {
        let id = self.backend.create_texture(image)?;
        let (index, generation) = self.textures.insert(id);
        log::debug!(
            "Uploaded texture {}#{} ({}x{})",
            index,
            generation,
            image.width,
            image.height
        );
        Ok(TextureHandle { index, generation })
    }

    /// Resolve a mesh handle, failing if it was released.
    pub fn mesh(&self, handle: MeshHandle) -> Result<&MeshBuffers> {
        self.meshes
            .get(handle.index, handle.generation)
            .ok_or_else(|| {
                RenderError::UseAfterFree(format!(
                    "mesh {}#{} has been released",
                    handle.index, handle.generation
                ))
            })
    }

    /// Resolve a texture handle, failing if it was released.
    pub fn texture(&self, handle: TextureHandle) -> Result<TextureId> {
        self.textures
            .get(handle.index, handle.generation)
            .copied()
            .ok_or_else(|| {
                RenderError::UseAfterFree(format!(
                    "texture {}#{} has been released",
                    handle.index, handle.generation
                ))
            })
    }

    pub fn is_live_mesh(&self, handle: MeshHandle) -> bool {
        self.meshes.get(handle.index, handle.generation).is_some()
    }

    pub fn is_live_texture(&self, handle: TextureHandle) -> bool {
        self.textures.get(handle.index, handle.generation).is_some()
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Free the mesh's buffers. Returns `false` if it was already released.
    pub fn release(&mut self, handle: MeshHandle) -> bool {
        match self.meshes.remove(handle.index, handle.generation) {
            Some(buffers) => {
                for buffer in buffers.buffer_ids() {
                    self.backend.destroy_buffer(buffer);
                }
                log::debug!("Released mesh {}#{}", handle.index, handle.generation);
                true
            }
            None => {
                log::warn!(
                    "Mesh {}#{} was already released",
                    handle.index,
                    handle.generation
                );
                false
            }
        }
    }

    /// Free the texture. Returns `false` if it was already released.
    pub fn release_texture(&mut self, handle: TextureHandle) -> bool {
        match self.textures.remove(handle.index, handle.generation) {
            Some(id) => {
                self.backend.destroy_texture(id);
                log::debug!("Released texture {}#{}", handle.index, handle.generation);
                true
            }
            None => {
                log::warn!(
                    "Texture {}#{} was already released",
                    handle.index,
                    handle.generation
                );
                false
            }
        }
    }

    /// Free every live mesh and texture.
    pub fn release_all(&mut self) {
        let meshes = self.meshes.drain();
        let textures = self.textures.drain();
        if !meshes.is_empty() || !textures.is_empty() {
            log::debug!(
                "Releasing {} meshes and {} textures",
                meshes.len(),
                textures.len()
            );
        }
        for buffers in meshes {
            for buffer in buffers.buffer_ids() {
                self.backend.destroy_buffer(buffer);
            }
        }
        for id in textures {
            self.backend.destroy_texture(id);
        }
    }
}

impl<B: GraphicsBackend> Drop for GeometryStore<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Check array lengths and index ranges; returns the element count.
fn validate(data: &RawMeshData) -> Result<u32> {
    if data.positions.is_empty() || data.positions.len() % 3 != 0 {
        return Err(RenderError::InvalidGeometry(format!(
            "positions must be a non-empty multiple of 3 floats, got {}",
            data.positions.len()
        )));
    }
    let vertex_count = data.vertex_count();
    if data.tex_coords.len() != vertex_count * 2 {
        return Err(RenderError::InvalidGeometry(format!(
            "expected {} texture coordinate floats for {} vertices, got {}",
            vertex_count * 2,
            vertex_count,
            data.tex_coords.len()
        )));
    }
    if data.normals.len() != vertex_count * 3 {
        return Err(RenderError::InvalidGeometry(format!(
            "expected {} normal floats for {} vertices, got {}",
            vertex_count * 3,
            vertex_count,
            data.normals.len()
        )));
    }
    if let Some(indices) = &data.indices {
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(RenderError::InvalidGeometry(format!(
                "indices must be a non-empty multiple of 3, got {}",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(RenderError::InvalidGeometry(format!(
                "index {} is out of range for {} vertices",
                bad, vertex_count
            )));
        }
    }
    u32::try_from(data.element_count())
        .map_err(|_| RenderError::InvalidGeometry("mesh has too many elements".into()))
}
