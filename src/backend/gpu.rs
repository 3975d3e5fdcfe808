//! wgpu implementation of the backend traits.
//!
//! wgpu has no notion of a "currently bound" program or uniform, so the
//! renderer's immediate-style calls are recorded first and replayed into a
//! single render pass when the frame is presented. Every draw snapshots the
//! uniform block of the running shader into one slot of a dynamic-offset
//! uniform buffer.

use std::{cell::RefCell, collections::HashMap, iter, rc::Rc};

use cgmath::{Matrix4, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    backend::{
        BufferId, BufferKind, Display, GraphicsBackend, MeshBuffers, ShaderProgram, TextureId,
        Uniform,
    },
    camera::OPENGL_TO_WGPU_MATRIX,
    config::RendererConfig,
    context::Context,
    data_structures::texture::{Texture, TextureData},
    error::{RenderError, Result},
    pipelines::{self, UniformBlock},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Entity,
    Terrain,
}

impl PipelineKind {
    fn index(self) -> usize {
        match self {
            PipelineKind::Entity => 0,
            PipelineKind::Terrain => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Clear([f32; 4]),
    Pipeline(PipelineKind),
    Mesh(MeshBuffers),
    Texture(TextureId),
    Draw {
        element_count: u32,
        indexed: bool,
        uniforms: u32,
    },
}

/// Frame commands and uniform state shared by the backend and its shaders.
#[derive(Debug, Default)]
struct Recorder {
    commands: Vec<Command>,
    blocks: [UniformBlock; 2],
    snapshots: Vec<UniformBlock>,
    active: Option<PipelineKind>,
}

impl Recorder {
    fn snapshot(&mut self) -> u32 {
        let block = match self.active {
            Some(kind) => self.blocks[kind.index()],
            None => {
                log::warn!("Draw recorded without a running shader");
                UniformBlock::default()
            }
        };
        self.snapshots.push(block);
        (self.snapshots.len() - 1) as u32
    }

    fn take(&mut self) -> (Vec<Command>, Vec<UniformBlock>) {
        (
            std::mem::take(&mut self.commands),
            std::mem::take(&mut self.snapshots),
        )
    }
}

/// A shader variant of the wgpu backend. Uniform loads update the variant's
/// block; the block is copied into the frame on every draw.
#[derive(Debug)]
pub struct GpuShader {
    kind: PipelineKind,
    recorder: Rc<RefCell<Recorder>>,
}

impl GpuShader {
    fn with_block(&self, f: impl FnOnce(&mut UniformBlock)) {
        f(&mut self.recorder.borrow_mut().blocks[self.kind.index()]);
    }
}

impl ShaderProgram for GpuShader {
    fn start(&mut self) {
        let mut recorder = self.recorder.borrow_mut();
        recorder.active = Some(self.kind);
        recorder.commands.push(Command::Pipeline(self.kind));
    }

    fn stop(&mut self) {
        self.recorder.borrow_mut().active = None;
    }

    fn load_matrix(&mut self, slot: Uniform, matrix: &Matrix4<f32>) {
        self.with_block(|block| match slot {
            Uniform::Transformation => block.transformation = (*matrix).into(),
            Uniform::View => block.view = (*matrix).into(),
            Uniform::Projection => block.projection = (OPENGL_TO_WGPU_MATRIX * *matrix).into(),
            other => log::warn!("{:?} is not a matrix uniform", other),
        });
    }

    fn load_vector(&mut self, slot: Uniform, vector: Vector3<f32>) {
        self.with_block(|block| match slot {
            Uniform::LightPosition => block.light_position = vector.into(),
            Uniform::LightColour => block.light_colour = vector.into(),
            other => log::warn!("{:?} is not a vector uniform", other),
        });
    }

    fn load_float(&mut self, slot: Uniform, value: f32) {
        self.with_block(|block| match slot {
            Uniform::ShineDamper => block.shine_damper = value,
            Uniform::Reflectivity => block.reflectivity = value,
            other => log::warn!("{:?} is not a float uniform", other),
        });
    }

    fn clean_up(&mut self) {
        self.with_block(|block| *block = UniformBlock::default());
        log::debug!("Cleaned up {:?} shader", self.kind);
    }
}

struct GpuTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

pub struct GpuBackend {
    context: Context,
    entity_pipeline: wgpu::RenderPipeline,
    terrain_pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    uniforms: UniformSlots,
    depth_texture: Texture,
    /// Colour target when there is no surface to present to.
    offscreen: Option<Texture>,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    textures: HashMap<TextureId, GpuTexture>,
    next_id: u64,
    recorder: Rc<RefCell<Recorder>>,
}

/// Dynamic-offset uniform buffer holding one [`UniformBlock`] per draw.
struct UniformSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u64,
    stride: u64,
}

impl UniformSlots {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: u64) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = UniformBlock::SIZE.div_ceil(alignment) * alignment;
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Slots"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(UniformBlock::SIZE),
                }),
            }],
            label: Some("uniform_bind_group"),
        });
        Self {
            buffer,
            bind_group,
            capacity,
            stride,
        }
    }

    fn offset(&self, slot: u32) -> wgpu::DynamicOffset {
        (slot as u64 * self.stride) as wgpu::DynamicOffset
    }
}

impl GpuBackend {
    /// Build pipelines and frame resources for `context`.
    pub fn new(context: Context, config: &RendererConfig) -> Self {
        let device = &context.device;
        let format = context.config.format;
        let uniform_layout = pipelines::uniform_layout(device);
        let texture_layout = pipelines::texture_layout(device);
        let layout = pipelines::mk_pipeline_layout(device, &uniform_layout, &texture_layout);
        let entity_pipeline =
            pipelines::basic::mk_entity_pipeline(device, format, &layout, config.cull_back_faces);
        let terrain_pipeline = pipelines::terrain::mk_terrain_pipeline(
            device,
            format,
            &layout,
            config.cull_back_faces,
        );
        let uniforms = UniformSlots::new(device, &uniform_layout, 64);
        let (width, height) = context.size();
        let depth_texture = Texture::create_depth_texture(device, [width, height], "depth_texture");
        let offscreen = context
            .surface
            .is_none()
            .then(|| create_offscreen_target(device, &context.config));

        Self {
            context,
            entity_pipeline,
            terrain_pipeline,
            uniform_layout,
            texture_layout,
            uniforms,
            depth_texture,
            offscreen,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            next_id: 1,
            recorder: Rc::default(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// A shader program recording into this backend.
    pub fn shader(&self, kind: PipelineKind) -> GpuShader {
        GpuShader {
            kind,
            recorder: self.recorder.clone(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.depth_texture =
            Texture::create_depth_texture(&self.context.device, [width, height], "depth_texture");
        if self.offscreen.is_some() {
            self.offscreen = Some(create_offscreen_target(
                &self.context.device,
                &self.context.config,
            ));
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Replay the recorded frame into one render pass targeting `view`.
    pub fn render_to(&mut self, view: &wgpu::TextureView) -> Result<()> {
        let (commands, snapshots) = self.recorder.borrow_mut().take();

        if snapshots.len() as u64 > self.uniforms.capacity {
            let capacity = (snapshots.len() as u64).next_power_of_two();
            log::debug!("Growing uniform slots to {}", capacity);
            self.uniforms = UniformSlots::new(&self.context.device, &self.uniform_layout, capacity);
        }
        if !snapshots.is_empty() {
            let stride = self.uniforms.stride as usize;
            let mut bytes = vec![0u8; stride * snapshots.len()];
            for (chunk, block) in bytes.chunks_mut(stride).zip(&snapshots) {
                chunk[..UniformBlock::SIZE as usize].copy_from_slice(bytemuck::bytes_of(block));
            }
            self.context.queue.write_buffer(&self.uniforms.buffer, 0, &bytes);
        }

        let clear = commands.iter().find_map(|command| match command {
            Command::Clear(colour) => Some(*colour),
            _ => None,
        });
        let load = match clear {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for command in &commands {
                match *command {
                    Command::Clear(_) => {}
                    Command::Pipeline(PipelineKind::Entity) => {
                        render_pass.set_pipeline(&self.entity_pipeline)
                    }
                    Command::Pipeline(PipelineKind::Terrain) => {
                        render_pass.set_pipeline(&self.terrain_pipeline)
                    }
                    Command::Mesh(mesh) => {
                        for (slot, id) in [mesh.positions, mesh.tex_coords, mesh.normals]
                            .into_iter()
                            .enumerate()
                        {
                            render_pass.set_vertex_buffer(slot as u32, self.buffer(id)?.slice(..));
                        }
                        if let Some(indices) = mesh.indices {
                            render_pass.set_index_buffer(
                                self.buffer(indices)?.slice(..),
                                wgpu::IndexFormat::Uint32,
                            );
                        }
                    }
                    Command::Texture(id) => {
                        let texture = self.textures.get(&id).ok_or_else(|| {
                            RenderError::Resource(format!("texture {:?} is not resident", id))
                        })?;
                        render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    }
                    Command::Draw {
                        element_count,
                        indexed,
                        uniforms,
                    } => {
                        render_pass.set_bind_group(
                            0,
                            &self.uniforms.bind_group,
                            &[self.uniforms.offset(uniforms)],
                        );
                        if indexed {
                            render_pass.draw_indexed(0..element_count, 0, 0..1);
                        } else {
                            render_pass.draw(0..element_count, 0..1);
                        }
                    }
                }
            }
        }

        self.context.queue.submit(iter::once(encoder.finish()));
        Ok(())
    }

    fn buffer(&self, id: BufferId) -> Result<&wgpu::Buffer> {
        self.buffers
            .get(&id)
            .ok_or_else(|| RenderError::Resource(format!("buffer {:?} is not resident", id)))
    }

    /// Copy the offscreen colour target back to the CPU.
    ///
    /// Fails with `Resource` when rendering to a window surface.
    pub async fn capture(&self) -> Result<TextureData> {
        let target = self.offscreen.as_ref().ok_or_else(|| {
            RenderError::Resource("capture needs an offscreen context".into())
        })?;
        let (width, height) = self.context.size();
        let unpadded_bytes_per_row = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let device = &self.context.device;
        let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Buffer"),
            size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.context.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures::channel::oneshot::channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| RenderError::Resource(format!("device poll failed: {}", e)))?;
        rx.await
            .map_err(|_| RenderError::Resource("capture was cancelled".into()))?
            .map_err(|e| RenderError::Resource(format!("mapping the capture failed: {}", e)))?;

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            data.chunks(padded_bytes_per_row as usize)
                .flat_map(|row| &row[..unpadded_bytes_per_row as usize])
                .copied()
                .collect()
        };
        output_buffer.unmap();
        Ok(TextureData {
            width,
            height,
            pixels,
        })
    }
}

fn create_offscreen_target(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Texture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Texture {
        texture,
        view,
        sampler: None,
    }
}

impl GraphicsBackend for GpuBackend {
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> Result<BufferId> {
        if contents.is_empty() {
            return Err(RenderError::Resource("zero-sized buffer".into()));
        }
        let max = self.context.device.limits().max_buffer_size;
        if contents.len() as u64 > max {
            return Err(RenderError::Resource(format!(
                "buffer of {} bytes exceeds the device limit of {}",
                contents.len(),
                max
            )));
        }
        let (label, usage) = match kind {
            BufferKind::Vertex { .. } => ("Vertex Buffer", wgpu::BufferUsages::VERTEX),
            BufferKind::Index => ("Index Buffer", wgpu::BufferUsages::INDEX),
        };
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        let id = BufferId(self.next_id());
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        match self.buffers.remove(&buffer) {
            Some(buffer) => buffer.destroy(),
            None => log::warn!("Destroying unknown buffer {:?}", buffer),
        }
    }

    fn create_texture(&mut self, image: &TextureData) -> Result<TextureId> {
        let texture = Texture::from_data(
            &self.context.device,
            &self.context.queue,
            image,
            Some("Diffuse Texture"),
        )?;
        let sampler = texture
            .sampler
            .as_ref()
            .ok_or_else(|| RenderError::Resource("colour texture without a sampler".into()))?;
        let bind_group = self
            .context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
                label: Some("texture_bind_group"),
            });
        let id = TextureId(self.next_id());
        self.textures.insert(
            id,
            GpuTexture {
                texture,
                bind_group,
            },
        );
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        match self.textures.remove(&texture) {
            Some(gpu) => gpu.texture.texture.destroy(),
            None => log::warn!("Destroying unknown texture {:?}", texture),
        }
    }

    fn clear(&mut self, colour: [f32; 4]) {
        self.recorder.borrow_mut().commands.push(Command::Clear(colour));
    }

    fn bind_mesh(&mut self, mesh: &MeshBuffers) {
        self.recorder.borrow_mut().commands.push(Command::Mesh(*mesh));
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.recorder
            .borrow_mut()
            .commands
            .push(Command::Texture(texture));
    }

    fn draw(&mut self, element_count: u32, indexed: bool) {
        let mut recorder = self.recorder.borrow_mut();
        let uniforms = recorder.snapshot();
        recorder.commands.push(Command::Draw {
            element_count,
            indexed,
            uniforms,
        });
    }

    fn unbind_mesh(&mut self) {}

    fn discard_frame(&mut self) {
        let (commands, _) = self.recorder.borrow_mut().take();
        log::debug!("Discarded {} recorded commands", commands.len());
    }
}

impl Display for GpuBackend {
    fn size(&self) -> (u32, u32) {
        self.context.size()
    }

    /// Render the recorded frame and show it. Without a surface the frame
    /// lands in the offscreen target, see [`GpuBackend::capture`].
    fn present(&mut self) -> Result<()> {
        let Some(surface) = self.context.surface.as_ref() else {
            let view = match &self.offscreen {
                Some(target) => target.view.clone(),
                None => return Err(RenderError::Resource("no render target".into())),
            };
            return self.render_to(&view);
        };

        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = self.context.size();
                log::warn!("Surface lost, reconfiguring at {}x{}", width, height);
                self.resize(width, height);
                self.recorder.borrow_mut().take();
                return Ok(());
            }
            Err(e) => return Err(RenderError::Resource(format!("unable to render: {}", e))),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render_to(&view)?;
        output.present();
        Ok(())
    }
}

impl std::fmt::Debug for GpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBackend")
            .field("size", &self.context.size())
            .field("buffers", &self.buffers.len())
            .field("textures", &self.textures.len())
            .finish_non_exhaustive()
    }
}
