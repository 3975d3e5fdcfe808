//! Per-frame batching and draw submission.
//!
//! [`BatchRenderer`] collects the instances submitted during a frame into a
//! [`FrameBatch`], grouped by their material binding. On [`flush`] every group
//! is drawn with one bind cycle: mesh buffers, texture and shading
//! coefficients are bound once, then each instance only uploads its model
//! matrix and issues a draw call. Terrain tiles are drawn afterwards with
//! their own shader.
//!
//! # Frame lifecycle
//!
//! 1. [`begin_frame`] clears what is left of the previous frame (`Idle` → `Collecting`)
//! 2. [`submit`] / [`submit_terrain`] queue drawables (`Collecting`)
//! 3. [`flush`] clears the targets, draws every group and empties the batch
//!    (`Drawing` → `Idle`)
//!
//! Instances are not retained between frames; everything visible has to be
//! submitted again every frame.
//!
//! [`flush`]: BatchRenderer::flush
//! [`begin_frame`]: BatchRenderer::begin_frame
//! [`submit`]: BatchRenderer::submit
//! [`submit_terrain`]: BatchRenderer::submit_terrain

use std::collections::HashMap;

use crate::{
    backend::{Display, GraphicsBackend, ShaderProgram, Uniform},
    camera::{Camera, Projection},
    config::RendererConfig,
    data_structures::{
        instance::SceneInstance,
        light::Light,
        material::{BindingKey, MaterialBinding},
        terrain::Terrain,
    },
    error::Result,
    geometry::GeometryStore,
    math,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Collecting,
    Drawing,
}

/// What a flush did: one bind cycle per group, one draw per instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub bind_cycles: usize,
    pub draw_calls: usize,
}

/// Instances sharing one binding, in submission order.
#[derive(Debug, Clone)]
pub struct Batch {
    binding: MaterialBinding,
    instances: Vec<SceneInstance>,
}

impl Batch {
    pub fn binding(&self) -> &MaterialBinding {
        &self.binding
    }

    pub fn instances(&self) -> &[SceneInstance] {
        &self.instances
    }
}

/// Instances of the current frame grouped by [`BindingKey`]. Group order is
/// unspecified.
#[derive(Debug, Default)]
pub struct FrameBatch {
    groups: HashMap<BindingKey, Batch>,
}

impl FrameBatch {
    pub fn push(&mut self, instance: &SceneInstance) {
        self.groups
            .entry(instance.binding.key())
            .or_insert_with(|| Batch {
                binding: instance.binding,
                instances: Vec::new(),
            })
            .instances
            .push(*instance);
    }

    pub fn get(&self, binding: &MaterialBinding) -> Option<&Batch> {
        self.groups.get(&binding.key())
    }

    pub fn groups(&self) -> impl Iterator<Item = &Batch> {
        self.groups.values()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn instance_count(&self) -> usize {
        self.groups.values().map(|batch| batch.instances.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

pub struct BatchRenderer {
    config: RendererConfig,
    projection: Projection,
    entity_shader: Box<dyn ShaderProgram>,
    terrain_shader: Box<dyn ShaderProgram>,
    batch: FrameBatch,
    terrains: Vec<Terrain>,
    state: FrameState,
}

impl BatchRenderer {
    /// Build the renderer and load the projection for `display`'s viewport
    /// into both shader programs.
    pub fn new(
        config: RendererConfig,
        display: &dyn Display,
        entity_shader: Box<dyn ShaderProgram>,
        terrain_shader: Box<dyn ShaderProgram>,
    ) -> Self {
        let (width, height) = display.size();
        let projection = Projection::from_config(&config, width, height);
        let mut renderer = Self {
            config,
            projection,
            entity_shader,
            terrain_shader,
            batch: FrameBatch::default(),
            terrains: Vec::new(),
            state: FrameState::Idle,
        };
        renderer.load_projection();
        renderer
    }

    fn load_projection(&mut self) {
        let projection = self.projection.calc_matrix();
        for shader in [&mut self.entity_shader, &mut self.terrain_shader] {
            shader.start();
            shader.load_matrix(Uniform::Projection, &projection);
            shader.stop();
        }
    }

    /// Recompute the projection after the viewport changed size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.projection.resize(width, height);
        self.load_projection();
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn frame_batch(&self) -> &FrameBatch {
        &self.batch
    }

    pub fn begin_frame(&mut self) {
        self.batch.clear();
        self.terrains.clear();
        self.state = FrameState::Collecting;
    }

    /// Queue `instance` for this frame.
    ///
    /// Fails with `UseAfterFree` if its mesh or texture has been released.
    /// Submitting without [`begin_frame`](Self::begin_frame) starts a frame.
    pub fn submit<B: GraphicsBackend>(
        &mut self,
        store: &GeometryStore<B>,
        instance: &SceneInstance,
    ) -> Result<()> {
        check_binding(store, &instance.binding)?;
        self.state = FrameState::Collecting;
        self.batch.push(instance);
        Ok(())
    }

    pub fn submit_terrain<B: GraphicsBackend>(
        &mut self,
        store: &GeometryStore<B>,
        terrain: &Terrain,
    ) -> Result<()> {
        check_binding(store, terrain.binding())?;
        self.state = FrameState::Collecting;
        self.terrains.push(*terrain);
        Ok(())
    }

    /// Draw everything submitted since the last flush and empty the batch.
    ///
    /// Every batched binding is checked before anything reaches the backend,
    /// so a handle released after submission fails with `UseAfterFree`
    /// without clearing or drawing. The batch is emptied even if drawing
    /// fails, and anything the backend recorded for the frame is discarded.
    pub fn flush<B: GraphicsBackend>(
        &mut self,
        store: &mut GeometryStore<B>,
        light: &Light,
        camera: &Camera,
    ) -> Result<FrameStats> {
        self.state = FrameState::Drawing;
        let result = match self.check_frame(store) {
            Ok(()) => self.draw(store, light, camera),
            Err(e) => Err(e),
        };
        self.batch.clear();
        self.terrains.clear();
        self.state = FrameState::Idle;
        if let Err(e) = &result {
            store.backend_mut().discard_frame();
            log::error!("Frame aborted: {}", e);
        }
        result
    }

    fn check_frame<B: GraphicsBackend>(&self, store: &GeometryStore<B>) -> Result<()> {
        self.batch
            .groups()
            .map(Batch::binding)
            .chain(self.terrains.iter().map(Terrain::binding))
            .try_for_each(|binding| check_binding(store, binding))
    }

    fn draw<B: GraphicsBackend>(
        &mut self,
        store: &mut GeometryStore<B>,
        light: &Light,
        camera: &Camera,
    ) -> Result<FrameStats> {
        store.backend_mut().clear(self.config.clear_colour);
        let view = math::view_matrix(camera);
        let mut stats = FrameStats::default();

        let shader = self.entity_shader.as_mut();
        shader.start();
        load_scene_uniforms(shader, light, &view);
        let outcome = self.batch.groups().try_for_each(|batch| {
            draw_group(
                &mut *shader,
                &mut *store,
                &batch.binding,
                batch.instances.iter().map(SceneInstance::to_matrix),
                &mut stats,
            )
        });
        shader.stop();
        outcome?;

        if !self.terrains.is_empty() {
            let shader = self.terrain_shader.as_mut();
            shader.start();
            load_scene_uniforms(shader, light, &view);
            let outcome = self.terrains.iter().try_for_each(|terrain| {
                let model = math::model_matrix(terrain.origin(), 0.0, 0.0, 0.0, 1.0);
                draw_group(
                    &mut *shader,
                    &mut *store,
                    terrain.binding(),
                    std::iter::once(model),
                    &mut stats,
                )
            });
            shader.stop();
            outcome?;
        }

        log::trace!(
            "Flushed frame: {} bind cycles, {} draw calls",
            stats.bind_cycles,
            stats.draw_calls
        );
        Ok(stats)
    }

    /// Release both shader programs. Call once at shutdown.
    pub fn clean_up(&mut self) {
        self.entity_shader.clean_up();
        self.terrain_shader.clean_up();
    }
}

fn check_binding<B: GraphicsBackend>(
    store: &GeometryStore<B>,
    binding: &MaterialBinding,
) -> Result<()> {
    store.mesh(binding.mesh())?;
    store.texture(binding.texture())?;
    Ok(())
}

fn load_scene_uniforms(shader: &mut dyn ShaderProgram, light: &Light, view: &cgmath::Matrix4<f32>) {
    shader.load_vector(Uniform::LightPosition, light.position);
    shader.load_vector(Uniform::LightColour, light.colour);
    shader.load_matrix(Uniform::View, view);
}

/// One bind cycle: bind the binding's state once, draw every model matrix.
fn draw_group<B: GraphicsBackend>(
    shader: &mut dyn ShaderProgram,
    store: &mut GeometryStore<B>,
    binding: &MaterialBinding,
    models: impl Iterator<Item = cgmath::Matrix4<f32>>,
    stats: &mut FrameStats,
) -> Result<()> {
    let mesh = *store.mesh(binding.mesh())?;
    let texture = store.texture(binding.texture())?;

    let backend = store.backend_mut();
    backend.bind_mesh(&mesh);
    backend.bind_texture(texture);
    shader.load_float(Uniform::ShineDamper, binding.shine_damper());
    shader.load_float(Uniform::Reflectivity, binding.reflectivity());

    for model in models {
        shader.load_matrix(Uniform::Transformation, &model);
        backend.draw(mesh.element_count, mesh.is_indexed());
        stats.draw_calls += 1;
    }

    backend.unbind_mesh();
    stats.bind_cycles += 1;
    Ok(())
}
