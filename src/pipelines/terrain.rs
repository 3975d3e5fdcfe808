use crate::{data_structures::texture::Texture, pipelines};

/// Pipeline for terrain tiles. Same layout and vertex streams as entities,
/// but the fragment stage tiles the ground texture across the tile.
pub fn mk_terrain_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    layout: &wgpu::PipelineLayout,
    cull_back_faces: bool,
) -> wgpu::RenderPipeline {
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Terrain Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("terrain.wgsl").into()),
    };

    pipelines::basic::mk_render_pipeline(
        device,
        layout,
        color_format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        &pipelines::vertex_layouts(),
        shader,
        cull_back_faces.then_some(wgpu::Face::Back),
    )
}
