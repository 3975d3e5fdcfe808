//! batch-ngin
//!
//! A small forward renderer for textured, lit meshes. Meshes are loaded from
//! Wavefront OBJ files (or generated, like terrain tiles), uploaded into a
//! [`GeometryStore`] that hands out generation-checked handles, and drawn by a
//! [`BatchRenderer`] that groups every submitted instance by its material
//! binding so each mesh/texture pair is bound once per frame.
//!
//! High-level modules
//! - `backend`: the traits the renderer drives, plus a recording headless
//!   backend and a wgpu backend
//! - `camera` / `math`: camera state and model, view and projection matrices
//! - `config`: renderer settings (frustum, clear colour, culling, asset dir)
//! - `context`: wgpu device, queue and surface setup
//! - `data_structures`: bindings, instances, lights, terrain and raw meshes
//! - `geometry`: GPU resource ownership and handle validation
//! - `pipelines`: wgpu render pipelines and shaders
//! - `render`: per-frame batching and draw submission
//! - `resources`: OBJ parsing, image decoding and async asset loading
//!

pub mod backend;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use backend::{Display, GraphicsBackend, ShaderProgram};
pub use camera::{Camera, Projection};
pub use config::RendererConfig;
pub use data_structures::{
    instance::SceneInstance, light::Light, material::MaterialBinding, terrain::Terrain,
};
pub use error::{RenderError, Result};
pub use geometry::{GeometryStore, MeshHandle, TextureHandle};
pub use render::{BatchRenderer, FrameStats};
pub use cgmath::*;
