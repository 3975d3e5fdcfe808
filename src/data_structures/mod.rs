//! Engine data structures: raw geometry, textures, materials and instances.
//!
//! - `model` holds the transient vertex/index arrays produced by loaders
//! - `texture` contains decoded images and the GPU texture wrapper
//! - `material` pairs a mesh with a texture and shading coefficients
//! - `instance` is a positioned, rotated and scaled reference to a material
//! - `light` is the single point light of a frame
//! - `terrain` generates flat, textured terrain tiles

pub mod instance;
pub mod light;
pub mod material;
pub mod model;
pub mod terrain;
pub mod texture;
