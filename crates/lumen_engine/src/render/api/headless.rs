//! Headless recording backend
//!
//! Implements [`GraphicsBackend`] without a GPU. Resources live in slot maps,
//! buffer and texture contents are kept in CPU memory, and every state change
//! or draw is appended to a command log. Tests and tooling inspect the log to
//! check exactly what the renderer asked the GPU to do.

use std::cell::RefCell;
use std::collections::HashMap;

use slotmap::SlotMap;

use super::backend::{BackendError, BackendResult, GraphicsApi, GraphicsBackend};
use super::types::{
    AttachmentPoint, BlendMode, BufferDescriptor, BufferId, BufferKind, ClearFlags, CullMode,
    FramebufferId, FramebufferStatus, PrimitiveTopology, ShaderDescriptor, ShaderId, StencilOp,
    TextureDescriptor, TextureFormat, TextureId, UniformValue, VertexArrayId,
};
use crate::foundation::math::Vec4;
use crate::render::resources::layout::BufferLayout;

/// Texture units exposed by the headless backend
pub const HEADLESS_TEXTURE_UNITS: u32 = 32;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// Buffer created
    CreateBuffer {
        /// New buffer
        id: BufferId,
        /// Binding point
        kind: BufferKind,
        /// Size in bytes
        size: usize,
    },
    /// Buffer released
    DeleteBuffer(BufferId),
    /// Sub-range upload
    UploadSubData {
        /// Target buffer
        buffer: BufferId,
        /// Byte offset
        offset: usize,
        /// Bytes written
        size: usize,
    },
    /// Vertex array created
    CreateVertexArray(VertexArrayId),
    /// Vertex array released
    DeleteVertexArray(VertexArrayId),
    /// Vertex array bound
    BindVertexArray(VertexArrayId),
    /// Texture created
    CreateTexture {
        /// New texture
        id: TextureId,
        /// Creation parameters
        descriptor: TextureDescriptor,
    },
    /// Texture released
    DeleteTexture(TextureId),
    /// Texture bound to a slot
    BindTexture {
        /// Bound texture
        texture: TextureId,
        /// Sampler slot
        slot: u32,
    },
    /// Framebuffer created
    CreateFramebuffer(FramebufferId),
    /// Framebuffer released
    DeleteFramebuffer(FramebufferId),
    /// Render target changed
    BindFramebuffer(Option<FramebufferId>),
    /// Program made current
    EnableShader(ShaderId),
    /// Uniform written
    SetUniform {
        /// Target program
        shader: ShaderId,
        /// Uniform name
        name: String,
        /// Written value
        value: UniformValue,
    },
    /// Viewport changed
    SetViewport {
        /// Left edge
        x: u32,
        /// Bottom edge
        y: u32,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Clear color changed
    SetClearColor(Vec4),
    /// Target cleared
    Clear(ClearFlags),
    /// Indexed draw
    DrawIndexed {
        /// Vertex array used
        vertex_array: VertexArrayId,
        /// Indices consumed
        index_count: u32,
    },
    /// Non-indexed draw
    DrawArrays {
        /// Vertex array used
        vertex_array: VertexArrayId,
        /// Assembly mode
        topology: PrimitiveTopology,
        /// Vertices consumed
        vertex_count: u32,
    },
    /// Line width changed
    SetLineWidth(f32),
    /// Blending changed
    SetBlend(BlendMode),
    /// Culling changed
    SetCullFace(CullMode),
    /// Depth test toggled
    SetDepthTest(bool),
    /// Depth writes toggled
    SetDepthMask(bool),
    /// Stencil op changed
    SetStencilOp {
        /// Operation on pass
        op: StencilOp,
        /// Reference value
        reference: i32,
    },
}

#[derive(Debug)]
struct BufferRecord {
    descriptor: BufferDescriptor,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct VertexArrayRecord {
    vertex_buffers: Vec<BufferId>,
    index_buffer: Option<BufferId>,
    locations: u32,
}

#[derive(Debug)]
struct TextureRecord {
    descriptor: TextureDescriptor,
    texels: Vec<u8>,
}

#[derive(Debug, Default)]
struct FramebufferRecord {
    attachments: Vec<(AttachmentPoint, TextureId)>,
    draw_buffers: u32,
}

#[derive(Debug)]
struct ShaderRecord {
    name: String,
    uniforms: HashMap<String, UniformValue>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    buffers: SlotMap<BufferId, BufferRecord>,
    vertex_arrays: SlotMap<VertexArrayId, VertexArrayRecord>,
    textures: SlotMap<TextureId, TextureRecord>,
    framebuffers: SlotMap<FramebufferId, FramebufferRecord>,
    shaders: SlotMap<ShaderId, ShaderRecord>,
    bound_vertex_array: Option<VertexArrayId>,
    bound_shader: Option<ShaderId>,
    bound_framebuffer: Option<FramebufferId>,
    texture_units: HashMap<u32, TextureId>,
    depth_mask: bool,
    commands: Vec<BackendCommand>,
    force_incomplete: bool,
}

/// Recording backend with no GPU behind it
#[derive(Debug)]
pub struct HeadlessBackend {
    state: RefCell<HeadlessState>,
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            state: RefCell::new(HeadlessState {
                depth_mask: true,
                ..HeadlessState::default()
            }),
        }
    }

    /// Snapshot of every recorded command
    pub fn commands(&self) -> Vec<BackendCommand> {
        self.state.borrow().commands.clone()
    }

    /// Drain the command log
    pub fn take_commands(&self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    /// Discard the command log
    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Number of draw commands recorded so far
    pub fn draw_call_count(&self) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| matches!(c, BackendCommand::DrawIndexed { .. } | BackendCommand::DrawArrays { .. }))
            .count()
    }

    /// Live buffers
    pub fn live_buffer_count(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// Live vertex arrays
    pub fn live_vertex_array_count(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    /// Live textures
    pub fn live_texture_count(&self) -> usize {
        self.state.borrow().textures.len()
    }

    /// Live framebuffers
    pub fn live_framebuffer_count(&self) -> usize {
        self.state.borrow().framebuffers.len()
    }

    /// Live shader programs
    pub fn live_shader_count(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Current contents of a buffer
    pub fn buffer_data(&self, id: BufferId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(id).map(|b| b.data.clone())
    }

    /// Look up a program by the name it was created with
    pub fn shader_by_name(&self, name: &str) -> Option<ShaderId> {
        self.state
            .borrow()
            .shaders
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
    }

    /// Last value written to a uniform of the named program
    pub fn uniform(&self, shader_name: &str, uniform: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        state
            .shaders
            .values()
            .find(|s| s.name == shader_name)
            .and_then(|s| s.uniforms.get(uniform).cloned())
    }

    /// Texture currently bound to a sampler slot
    pub fn bound_texture(&self, slot: u32) -> Option<TextureId> {
        self.state.borrow().texture_units.get(&slot).copied()
    }

    /// Whether depth writes are currently enabled
    pub fn depth_mask(&self) -> bool {
        self.state.borrow().depth_mask
    }

    /// Report every framebuffer as incomplete, for exercising error paths
    pub fn set_force_incomplete_framebuffers(&self, incomplete: bool) {
        self.state.borrow_mut().force_incomplete = incomplete;
    }

    fn record(&self, command: BackendCommand) {
        self.state.borrow_mut().commands.push(command);
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown(kind: &'static str) -> BackendError {
    BackendError::UnknownResource { kind }
}

fn check_range(offset: usize, len: usize, capacity: usize) -> BackendResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(BackendError::OutOfBounds { offset, len, capacity }),
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Headless
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor, data: Option<&[u8]>) -> BackendResult<BufferId> {
        let mut contents = vec![0u8; descriptor.size];
        if let Some(data) = data {
            check_range(0, data.len(), descriptor.size)?;
            contents[..data.len()].copy_from_slice(data);
        }

        let mut state = self.state.borrow_mut();
        let id = state.buffers.insert(BufferRecord {
            descriptor: *descriptor,
            data: contents,
        });
        state.commands.push(BackendCommand::CreateBuffer {
            id,
            kind: descriptor.kind,
            size: descriptor.size,
        });
        Ok(id)
    }

    fn delete_buffer(&self, id: BufferId) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(id).is_some() {
            state.commands.push(BackendCommand::DeleteBuffer(id));
        }
    }

    fn upload_sub_data(&self, id: BufferId, offset: usize, data: &[u8]) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        let buffer = state.buffers.get_mut(id).ok_or_else(|| unknown("buffer"))?;
        check_range(offset, data.len(), buffer.data.len())?;
        buffer.data[offset..offset + data.len()].copy_from_slice(data);
        state.commands.push(BackendCommand::UploadSubData {
            buffer: id,
            offset,
            size: data.len(),
        });
        Ok(())
    }

    fn create_vertex_array(&self) -> BackendResult<VertexArrayId> {
        let mut state = self.state.borrow_mut();
        let id = state.vertex_arrays.insert(VertexArrayRecord::default());
        state.commands.push(BackendCommand::CreateVertexArray(id));
        Ok(id)
    }

    fn delete_vertex_array(&self, id: VertexArrayId) {
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(id).is_some() {
            if state.bound_vertex_array == Some(id) {
                state.bound_vertex_array = None;
            }
            state.commands.push(BackendCommand::DeleteVertexArray(id));
        }
    }

    fn attach_vertex_buffer(
        &self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
        layout: &BufferLayout,
        first_location: u32,
    ) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        match state.buffers.get(buffer) {
            Some(record) if record.descriptor.kind == BufferKind::Vertex => {}
            Some(_) => return Err(BackendError::InvalidState("index buffer attached as vertex buffer".into())),
            None => return Err(unknown("buffer")),
        }
        let record = state.vertex_arrays.get_mut(vertex_array).ok_or_else(|| unknown("vertex array"))?;
        if first_location != record.locations {
            return Err(BackendError::InvalidState(format!(
                "attribute location {first_location} does not follow {}",
                record.locations
            )));
        }
        record.locations += layout.location_count();
        record.vertex_buffers.push(buffer);
        Ok(())
    }

    fn set_index_buffer(&self, vertex_array: VertexArrayId, buffer: BufferId) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        match state.buffers.get(buffer) {
            Some(record) if record.descriptor.kind == BufferKind::Index => {}
            Some(_) => return Err(BackendError::InvalidState("vertex buffer attached as index buffer".into())),
            None => return Err(unknown("buffer")),
        }
        let record = state.vertex_arrays.get_mut(vertex_array).ok_or_else(|| unknown("vertex array"))?;
        record.index_buffer = Some(buffer);
        Ok(())
    }

    fn bind_vertex_array(&self, vertex_array: VertexArrayId) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.vertex_arrays.contains_key(vertex_array) {
            return Err(unknown("vertex array"));
        }
        state.bound_vertex_array = Some(vertex_array);
        state.commands.push(BackendCommand::BindVertexArray(vertex_array));
        Ok(())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> BackendResult<TextureId> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(BackendError::Unsupported("zero-sized texture".into()));
        }
        let size = descriptor.width as usize
            * descriptor.height as usize
            * descriptor.format.bytes_per_texel()
            * descriptor.layer_count();

        let mut state = self.state.borrow_mut();
        let id = state.textures.insert(TextureRecord {
            descriptor: *descriptor,
            texels: vec![0u8; size],
        });
        state.commands.push(BackendCommand::CreateTexture {
            id,
            descriptor: *descriptor,
        });
        Ok(id)
    }

    fn upload_texture(&self, id: TextureId, data: &[u8]) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        let texture = state.textures.get_mut(id).ok_or_else(|| unknown("texture"))?;
        if data.len() != texture.texels.len() {
            return Err(BackendError::OutOfBounds {
                offset: 0,
                len: data.len(),
                capacity: texture.texels.len(),
            });
        }
        texture.texels.copy_from_slice(data);
        Ok(())
    }

    fn bind_texture(&self, id: TextureId, slot: u32) -> BackendResult<()> {
        if slot >= HEADLESS_TEXTURE_UNITS {
            return Err(BackendError::Unsupported(format!("texture slot {slot}")));
        }
        let mut state = self.state.borrow_mut();
        if !state.textures.contains_key(id) {
            return Err(unknown("texture"));
        }
        state.texture_units.insert(slot, id);
        state.commands.push(BackendCommand::BindTexture { texture: id, slot });
        Ok(())
    }

    fn delete_texture(&self, id: TextureId) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(id).is_some() {
            state.texture_units.retain(|_, bound| *bound != id);
            state.commands.push(BackendCommand::DeleteTexture(id));
        }
    }

    fn create_framebuffer(&self) -> BackendResult<FramebufferId> {
        let mut state = self.state.borrow_mut();
        let id = state.framebuffers.insert(FramebufferRecord::default());
        state.commands.push(BackendCommand::CreateFramebuffer(id));
        Ok(id)
    }

    fn attach_texture(&self, framebuffer: FramebufferId, point: AttachmentPoint, texture: TextureId) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.textures.contains_key(texture) {
            return Err(unknown("texture"));
        }
        let record = state.framebuffers.get_mut(framebuffer).ok_or_else(|| unknown("framebuffer"))?;
        record.attachments.retain(|(p, _)| *p != point);
        record.attachments.push((point, texture));
        Ok(())
    }

    fn set_draw_buffers(&self, framebuffer: FramebufferId, count: u32) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        let record = state.framebuffers.get_mut(framebuffer).ok_or_else(|| unknown("framebuffer"))?;
        record.draw_buffers = count;
        Ok(())
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> BackendResult<FramebufferStatus> {
        let state = self.state.borrow();
        let record = state.framebuffers.get(framebuffer).ok_or_else(|| unknown("framebuffer"))?;
        if state.force_incomplete {
            return Ok(FramebufferStatus::Unsupported);
        }
        if record.attachments.is_empty() {
            return Ok(FramebufferStatus::MissingAttachment);
        }

        let mut extents = record.attachments.iter().filter_map(|(_, texture)| {
            state
                .textures
                .get(*texture)
                .map(|t| (t.descriptor.width, t.descriptor.height, t.descriptor.samples))
        });
        let first = extents.next();
        if first.is_none() || extents.any(|extent| Some(extent) != first) {
            return Ok(FramebufferStatus::IncompleteDimensions);
        }
        Ok(FramebufferStatus::Complete)
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(id) = framebuffer {
            if !state.framebuffers.contains_key(id) {
                return Err(unknown("framebuffer"));
            }
        }
        state.bound_framebuffer = framebuffer;
        state.commands.push(BackendCommand::BindFramebuffer(framebuffer));
        Ok(())
    }

    fn delete_framebuffer(&self, id: FramebufferId) {
        let mut state = self.state.borrow_mut();
        if state.framebuffers.remove(id).is_some() {
            if state.bound_framebuffer == Some(id) {
                state.bound_framebuffer = None;
            }
            state.commands.push(BackendCommand::DeleteFramebuffer(id));
        }
    }

    fn read_pixel(&self, framebuffer: FramebufferId, attachment_index: u32, x: u32, y: u32) -> BackendResult<i32> {
        let state = self.state.borrow();
        let record = state.framebuffers.get(framebuffer).ok_or_else(|| unknown("framebuffer"))?;
        let texture_id = record
            .attachments
            .iter()
            .find(|(point, _)| *point == AttachmentPoint::Color(attachment_index))
            .map(|(_, texture)| *texture)
            .ok_or_else(|| BackendError::InvalidState(format!("no color attachment {attachment_index}")))?;
        let texture = state.textures.get(texture_id).ok_or_else(|| unknown("texture"))?;
        if texture.descriptor.format != TextureFormat::RedInteger {
            return Err(BackendError::Unsupported(format!(
                "read_pixel on {:?} attachment",
                texture.descriptor.format
            )));
        }
        let (width, height) = (texture.descriptor.width, texture.descriptor.height);
        if x >= width || y >= height {
            return Err(BackendError::OutOfBounds {
                offset: (y * width + x) as usize,
                len: 1,
                capacity: (width * height) as usize,
            });
        }

        let start = (y * width + x) as usize * 4;
        let bytes: [u8; 4] = texture.texels[start..start + 4]
            .try_into()
            .map_err(|_| BackendError::InvalidState("texel storage truncated".into()))?;
        Ok(i32::from_le_bytes(bytes))
    }

    fn clear_texture(&self, texture: TextureId, value: i32) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        let record = state.textures.get_mut(texture).ok_or_else(|| unknown("texture"))?;
        if record.descriptor.format != TextureFormat::RedInteger {
            return Err(BackendError::Unsupported(format!(
                "integer clear on {:?} texture",
                record.descriptor.format
            )));
        }
        let bytes = value.to_le_bytes();
        for texel in record.texels.chunks_exact_mut(4) {
            texel.copy_from_slice(&bytes);
        }
        Ok(())
    }

    fn create_shader(&self, descriptor: &ShaderDescriptor) -> BackendResult<ShaderId> {
        let mut state = self.state.borrow_mut();
        Ok(state.shaders.insert(ShaderRecord {
            name: descriptor.name.clone(),
            uniforms: HashMap::new(),
        }))
    }

    fn enable_shader(&self, id: ShaderId) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(id) {
            return Err(unknown("shader"));
        }
        state.bound_shader = Some(id);
        state.commands.push(BackendCommand::EnableShader(id));
        Ok(())
    }

    fn set_uniform(&self, id: ShaderId, name: &str, value: &UniformValue) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        let shader = state.shaders.get_mut(id).ok_or_else(|| unknown("shader"))?;
        shader.uniforms.insert(name.to_string(), value.clone());
        state.commands.push(BackendCommand::SetUniform {
            shader: id,
            name: name.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn delete_shader(&self, id: ShaderId) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(id).is_some() && state.bound_shader == Some(id) {
            state.bound_shader = None;
        }
    }

    fn set_viewport(&self, x: u32, y: u32, width: u32, height: u32) {
        self.record(BackendCommand::SetViewport { x, y, width, height });
    }

    fn set_clear_color(&self, color: Vec4) {
        self.record(BackendCommand::SetClearColor(color));
    }

    fn clear(&self, flags: ClearFlags) {
        self.record(BackendCommand::Clear(flags));
    }

    fn draw_indexed(&self, index_count: u32) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if state.bound_shader.is_none() {
            return Err(BackendError::InvalidState("indexed draw without a shader".into()));
        }
        let vertex_array = state
            .bound_vertex_array
            .ok_or_else(|| BackendError::InvalidState("indexed draw without a vertex array".into()))?;
        let index_buffer = state
            .vertex_arrays
            .get(vertex_array)
            .and_then(|va| va.index_buffer)
            .ok_or_else(|| BackendError::InvalidState("indexed draw without an index buffer".into()))?;
        let capacity = state.buffers.get(index_buffer).map_or(0, |b| b.data.len());
        check_range(0, index_count as usize * 4, capacity)?;

        state.commands.push(BackendCommand::DrawIndexed {
            vertex_array,
            index_count,
        });
        Ok(())
    }

    fn draw_arrays(&self, topology: PrimitiveTopology, vertex_count: u32) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if state.bound_shader.is_none() {
            return Err(BackendError::InvalidState("draw without a shader".into()));
        }
        let vertex_array = state
            .bound_vertex_array
            .ok_or_else(|| BackendError::InvalidState("draw without a vertex array".into()))?;
        let has_vertices = state
            .vertex_arrays
            .get(vertex_array)
            .is_some_and(|va| !va.vertex_buffers.is_empty());
        if !has_vertices {
            return Err(BackendError::InvalidState("draw from an empty vertex array".into()));
        }

        state.commands.push(BackendCommand::DrawArrays {
            vertex_array,
            topology,
            vertex_count,
        });
        Ok(())
    }

    fn set_line_width(&self, width: f32) {
        self.record(BackendCommand::SetLineWidth(width));
    }

    fn set_blend(&self, mode: BlendMode) {
        self.record(BackendCommand::SetBlend(mode));
    }

    fn set_cull_face(&self, mode: CullMode) {
        self.record(BackendCommand::SetCullFace(mode));
    }

    fn set_depth_test(&self, enabled: bool) {
        self.record(BackendCommand::SetDepthTest(enabled));
    }

    fn set_depth_mask(&self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.depth_mask = enabled;
        state.commands.push(BackendCommand::SetDepthMask(enabled));
    }

    fn set_stencil_op(&self, op: StencilOp, reference: i32) {
        self.record(BackendCommand::SetStencilOp { op, reference });
    }
}
