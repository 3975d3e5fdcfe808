//! Capabilities the renderer consumes from the graphics layer.
//!
//! The batching core never talks to a graphics API directly. It drives three
//! small traits instead:
//!
//! - [`GraphicsBackend`] allocates buffers and textures and executes bind/draw
//!   calls,
//! - [`ShaderProgram`] receives uniforms (one implementation per shader
//!   variant, swapped in as strategies),
//! - [`Display`] reports the viewport size and presents a finished frame.
//!
//! Two implementations ship with the crate: [`headless`] records every call
//! and is what the tests count against, [`gpu`] renders through wgpu.

pub mod headless;
pub mod gpu;

use cgmath::{Matrix4, Vector3};

use crate::{data_structures::texture::TextureData, error::Result};

/// Backend-side identifier of a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Backend-side identifier of a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// What a buffer holds. Vertex streams are bound to a fixed shader attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex { attribute: u32, components: u32 },
    Index,
}

impl BufferKind {
    pub const POSITIONS: BufferKind = BufferKind::Vertex {
        attribute: 0,
        components: 3,
    };
    pub const TEX_COORDS: BufferKind = BufferKind::Vertex {
        attribute: 1,
        components: 2,
    };
    pub const NORMALS: BufferKind = BufferKind::Vertex {
        attribute: 2,
        components: 3,
    };
}

/// The buffers that make up one uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub positions: BufferId,
    pub tex_coords: BufferId,
    pub normals: BufferId,
    pub indices: Option<BufferId>,
    pub element_count: u32,
}

impl MeshBuffers {
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    pub(crate) fn buffer_ids(&self) -> impl Iterator<Item = BufferId> {
        [self.positions, self.tex_coords, self.normals]
            .into_iter()
            .chain(self.indices)
    }
}

pub trait GraphicsBackend {
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> Result<BufferId>;

    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Upload RGBA8 pixels. Backends reject formats they cannot store with
    /// [`RenderError::Resource`](crate::error::RenderError::Resource).
    fn create_texture(&mut self, image: &TextureData) -> Result<TextureId>;

    fn destroy_texture(&mut self, texture: TextureId);

    /// Clear both the colour and the depth target.
    fn clear(&mut self, colour: [f32; 4]);

    fn bind_mesh(&mut self, mesh: &MeshBuffers);

    fn bind_texture(&mut self, texture: TextureId);

    /// Draw the currently bound mesh with the currently loaded uniforms.
    fn draw(&mut self, element_count: u32, indexed: bool);

    fn unbind_mesh(&mut self);

    /// Drop whatever was recorded for a frame that will not be presented.
    fn discard_frame(&mut self);
}

/// Uniform slots understood by every shader variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    Transformation,
    Projection,
    View,
    LightPosition,
    LightColour,
    ShineDamper,
    Reflectivity,
}

/// A linked vertex/fragment program the renderer uploads uniforms into.
///
/// Uniform values persist in the program between `start`/`stop` cycles, so a
/// projection loaded once at start-up stays valid for every later frame.
pub trait ShaderProgram {
    fn start(&mut self);

    fn stop(&mut self);

    fn load_matrix(&mut self, slot: Uniform, matrix: &Matrix4<f32>);

    fn load_vector(&mut self, slot: Uniform, vector: Vector3<f32>);

    fn load_float(&mut self, slot: Uniform, value: f32);

    /// Release the program. Called once at shutdown.
    fn clean_up(&mut self);
}

/// The window/surface side: viewport size and presentation.
pub trait Display {
    fn size(&self) -> (u32, u32);

    fn present(&mut self) -> Result<()>;

    fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.size();
        width as f32 / height.max(1) as f32
    }
}
