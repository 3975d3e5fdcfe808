//! Headless backend that records instead of rendering.
//!
//! Every call the renderer makes lands in a shared [`CallLog`], which makes
//! batching behaviour observable without a GPU: tests count bind cycles and
//! draw calls, tools can dump the command stream of a frame. The log is shared
//! through `Rc<RefCell<..>>` so shaders, the backend and the caller all see the
//! same sequence even after the store that owned the backend has been dropped.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use cgmath::{Matrix4, Vector3};

use crate::{
    backend::{
        BufferId, BufferKind, Display, GraphicsBackend, MeshBuffers, ShaderProgram, TextureId,
        Uniform,
    },
    data_structures::texture::TextureData,
    error::{RenderError, Result},
};

/// One recorded backend or shader call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(BufferId, BufferKind),
    DestroyBuffer(BufferId),
    CreateTexture(TextureId),
    DestroyTexture(TextureId),
    Clear([f32; 4]),
    BindMesh(MeshBuffers),
    BindTexture(TextureId),
    Draw { element_count: u32, indexed: bool },
    UnbindMesh,
    DiscardFrame,
    Present,
    ShaderStart(&'static str),
    ShaderStop(&'static str),
    LoadMatrix(&'static str, Uniform, Matrix4<f32>),
    LoadVector(&'static str, Uniform, Vector3<f32>),
    LoadFloat(&'static str, Uniform, f32),
    ShaderCleanUp(&'static str),
}

/// Shared, append-only record of calls.
#[derive(Debug, Default, Clone)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|call| predicate(call)).count()
    }

    pub fn draw_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::Draw { .. }))
    }

    pub fn mesh_binds(&self) -> usize {
        self.count(|call| matches!(call, Call::BindMesh(_)))
    }

    pub fn texture_binds(&self) -> usize {
        self.count(|call| matches!(call, Call::BindTexture(_)))
    }

    /// Buffers created and not yet destroyed.
    pub fn live_buffers(&self) -> usize {
        let created = self.count(|call| matches!(call, Call::CreateBuffer(..)));
        let destroyed = self.count(|call| matches!(call, Call::DestroyBuffer(_)));
        created - destroyed
    }

    /// Textures created and not yet destroyed.
    pub fn live_textures(&self) -> usize {
        let created = self.count(|call| matches!(call, Call::CreateTexture(_)));
        let destroyed = self.count(|call| matches!(call, Call::DestroyTexture(_)));
        created - destroyed
    }

    /// Matrices loaded into `slot` of the named shader, in call order.
    pub fn matrices(&self, shader: &str, slot: Uniform) -> Vec<Matrix4<f32>> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::LoadMatrix(name, s, m) if *name == shader && *s == slot => Some(*m),
                _ => None,
            })
            .collect()
    }
}

/// Backend that validates and records, but never touches a GPU.
#[derive(Debug)]
pub struct HeadlessBackend {
    log: CallLog,
    size: (u32, u32),
    next_id: u64,
    buffers: HashMap<BufferId, BufferKind>,
    textures: HashSet<TextureId>,
    bound_mesh: Option<MeshBuffers>,
    allocation_budget: Option<usize>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_log(CallLog::new(), width, height)
    }

    pub fn with_log(log: CallLog, width: u32, height: u32) -> Self {
        Self {
            log,
            size: (width, height),
            next_id: 1,
            buffers: HashMap::new(),
            textures: HashSet::new(),
            bound_mesh: None,
            allocation_budget: None,
        }
    }

    /// Refuse every allocation after `allocations` successful ones, the way a
    /// driver that ran out of memory would.
    pub fn with_allocation_budget(mut self, allocations: usize) -> Self {
        self.allocation_budget = Some(allocations);
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    fn allocate(&mut self) -> Result<u64> {
        if let Some(budget) = self.allocation_budget.as_mut() {
            if *budget == 0 {
                return Err(RenderError::Resource(
                    "headless backend allocation budget exhausted".into(),
                ));
            }
            *budget -= 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> Result<BufferId> {
        if contents.is_empty() {
            return Err(RenderError::Resource("zero-sized buffer".into()));
        }
        let id = BufferId(self.allocate()?);
        self.buffers.insert(id, kind);
        self.log.push(Call::CreateBuffer(id, kind));
        Ok(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            self.log.push(Call::DestroyBuffer(buffer));
        } else {
            log::warn!("Destroying unknown buffer {:?}", buffer);
        }
    }

    fn create_texture(&mut self, image: &TextureData) -> Result<TextureId> {
        image.validate()?;
        let id = TextureId(self.allocate()?);
        self.textures.insert(id);
        self.log.push(Call::CreateTexture(id));
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture) {
            self.log.push(Call::DestroyTexture(texture));
        } else {
            log::warn!("Destroying unknown texture {:?}", texture);
        }
    }

    fn clear(&mut self, colour: [f32; 4]) {
        self.log.push(Call::Clear(colour));
    }

    fn bind_mesh(&mut self, mesh: &MeshBuffers) {
        debug_assert!(
            mesh.buffer_ids().all(|id| self.buffers.contains_key(&id)),
            "binding a mesh whose buffers were destroyed"
        );
        self.bound_mesh = Some(*mesh);
        self.log.push(Call::BindMesh(*mesh));
    }

    fn bind_texture(&mut self, texture: TextureId) {
        debug_assert!(self.textures.contains(&texture));
        self.log.push(Call::BindTexture(texture));
    }

    fn draw(&mut self, element_count: u32, indexed: bool) {
        debug_assert!(self.bound_mesh.is_some(), "draw without a bound mesh");
        self.log.push(Call::Draw {
            element_count,
            indexed,
        });
    }

    fn unbind_mesh(&mut self) {
        self.bound_mesh = None;
        self.log.push(Call::UnbindMesh);
    }

    fn discard_frame(&mut self) {
        self.bound_mesh = None;
        self.log.push(Call::DiscardFrame);
    }
}

impl Display for HeadlessBackend {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn present(&mut self) -> Result<()> {
        self.log.push(Call::Present);
        Ok(())
    }
}

/// Shader strategy for the headless backend. Uniform loads are recorded with
/// the program name so several variants can share one log.
#[derive(Debug)]
pub struct HeadlessShader {
    name: &'static str,
    log: CallLog,
    running: bool,
}

impl HeadlessShader {
    pub fn new(name: &'static str, log: CallLog) -> Self {
        Self {
            name,
            log,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl ShaderProgram for HeadlessShader {
    fn start(&mut self) {
        self.running = true;
        self.log.push(Call::ShaderStart(self.name));
    }

    fn stop(&mut self) {
        self.running = false;
        self.log.push(Call::ShaderStop(self.name));
    }

    fn load_matrix(&mut self, slot: Uniform, matrix: &Matrix4<f32>) {
        self.log.push(Call::LoadMatrix(self.name, slot, *matrix));
    }

    fn load_vector(&mut self, slot: Uniform, vector: Vector3<f32>) {
        self.log.push(Call::LoadVector(self.name, slot, vector));
    }

    fn load_float(&mut self, slot: Uniform, value: f32) {
        self.log.push(Call::LoadFloat(self.name, slot, value));
    }

    fn clean_up(&mut self) {
        self.running = false;
        self.log.push(Call::ShaderCleanUp(self.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_budget_is_enforced() {
        let mut backend = HeadlessBackend::new(4, 4).with_allocation_budget(1);
        assert!(backend.create_buffer(BufferKind::Index, &[0; 4]).is_ok());
        let err = backend.create_buffer(BufferKind::Index, &[0; 4]).unwrap_err();
        assert!(matches!(err, RenderError::Resource(_)));
        assert_eq!(backend.live_buffer_count(), 1);
    }

    #[test]
    fn rejects_textures_with_wrong_pixel_count() {
        let mut backend = HeadlessBackend::new(4, 4);
        let image = TextureData {
            width: 2,
            height: 2,
            pixels: vec![255; 3],
        };
        assert!(matches!(
            backend.create_texture(&image),
            Err(RenderError::Resource(_))
        ));
        assert!(backend.log().calls().is_empty());
    }

    #[test]
    fn shaders_share_the_log() {
        let log = CallLog::new();
        let mut a = HeadlessShader::new("a", log.clone());
        let mut b = HeadlessShader::new("b", log.clone());
        a.start();
        b.load_float(Uniform::ShineDamper, 2.0);
        a.stop();
        assert_eq!(
            log.calls(),
            vec![
                Call::ShaderStart("a"),
                Call::LoadFloat("b", Uniform::ShineDamper, 2.0),
                Call::ShaderStop("a"),
            ]
        );
    }
}
