//! Loading meshes and textures from the asset directory.
//!
//! File reads are async (`tokio::fs`) so start-up code can load several assets
//! concurrently; parsing and uploading happen synchronously on the caller's
//! thread, which owns the graphics context.

pub mod mesh;
pub mod texture;

use std::{io::ErrorKind, path::Path};

use crate::{
    backend::GraphicsBackend,
    config::RendererConfig,
    data_structures::model::RawMeshData,
    error::{RenderError, Result},
    geometry::{GeometryStore, MeshHandle, TextureHandle},
};

fn not_found(path: &Path, e: std::io::Error) -> RenderError {
    if e.kind() == ErrorKind::NotFound {
        log::error!("Asset {} not found", path.display());
        RenderError::AssetNotFound {
            path: path.to_path_buf(),
        }
    } else {
        RenderError::Io(e)
    }
}

pub async fn load_string(config: &RendererConfig, file_name: &str) -> Result<String> {
    let path = config.asset_path(file_name);
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| not_found(&path, e))
}

pub async fn load_binary(config: &RendererConfig, file_name: &str) -> Result<Vec<u8>> {
    let path = config.asset_path(file_name);
    tokio::fs::read(&path).await.map_err(|e| not_found(&path, e))
}

/// Read and parse an OBJ file without uploading it.
pub async fn load_obj(config: &RendererConfig, file_name: &str) -> Result<RawMeshData> {
    let source = load_string(config, file_name).await?;
    mesh::parse_obj(&source)
}

/// Read, parse and upload an OBJ file.
pub async fn load_obj_model<B: GraphicsBackend>(
    store: &mut GeometryStore<B>,
    config: &RendererConfig,
    file_name: &str,
) -> Result<MeshHandle> {
    let data = load_obj(config, file_name).await?;
    store.upload(&data)
}

/// Read, decode and upload an image file.
pub async fn load_texture<B: GraphicsBackend>(
    store: &mut GeometryStore<B>,
    config: &RendererConfig,
    file_name: &str,
) -> Result<TextureHandle> {
    let bytes = load_binary(config, file_name).await?;
    let extension = Path::new(file_name).extension().and_then(|ext| ext.to_str());
    let image = texture::decode(&bytes, extension)?;
    store.upload_texture(&image)
}
