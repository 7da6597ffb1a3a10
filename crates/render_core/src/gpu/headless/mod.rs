//! Headless graphics context
//!
//! A software [`GraphicsContext`] that keeps every object in host memory. It follows
//! the API's object rules closely enough to catch lifecycle mistakes: names are never
//! reused, deleting an unknown name raises `INVALID_VALUE`, shaders deleted while
//! attached stay alive until detached, and writes past the end of a buffer raise
//! `INVALID_VALUE`. Tests and tools use it in place of a real driver.
//!
//! Shader "compilation" checks for a `main` entry point, balanced braces and
//! `#error` directives. Linking requires exactly one compiled vertex and one
//! compiled fragment stage and introspects uniform blocks with std140 sizing.

pub mod std140;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use bitflags::bitflags;

use super::context::{BufferUsage, GraphicsContext, ShaderType, VertexAttribute};
use super::error::ApiError;
use super::handle::{BufferHandle, ProgramHandle, ShaderHandle, VaoHandle};
use std140::UniformBlockLayout;

bitflags! {
    /// Pending API error flags; the API keeps at most one of each code
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct ErrorFlags: u8 {
        const INVALID_ENUM = 1 << 0;
        const INVALID_VALUE = 1 << 1;
        const INVALID_OPERATION = 1 << 2;
        const OUT_OF_MEMORY = 1 << 3;
    }
}

impl ErrorFlags {
    fn from_error(error: ApiError) -> Self {
        match error {
            ApiError::InvalidEnum => Self::INVALID_ENUM,
            ApiError::InvalidValue => Self::INVALID_VALUE,
            ApiError::InvalidOperation => Self::INVALID_OPERATION,
            ApiError::OutOfMemory => Self::OUT_OF_MEMORY,
        }
    }

    /// Clear and return the lowest pending flag
    fn pop(&mut self) -> Option<ApiError> {
        let order = [
            (Self::INVALID_ENUM, ApiError::InvalidEnum),
            (Self::INVALID_VALUE, ApiError::InvalidValue),
            (Self::INVALID_OPERATION, ApiError::InvalidOperation),
            (Self::OUT_OF_MEMORY, ApiError::OutOfMemory),
        ];
        let (flag, error) = order.into_iter().find(|(flag, _)| self.contains(*flag))?;
        self.remove(flag);
        Some(error)
    }
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderType,
    source: Option<String>,
    compiled: bool,
    delete_pending: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderHandle>,
    linked: bool,
    blocks: Vec<UniformBlockLayout>,
    block_bindings: HashMap<u32, u32>,
}

#[derive(Debug, Default)]
struct BufferObject {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
}

#[derive(Debug, Default)]
struct VertexArrayObject {
    attributes: HashMap<u32, (VertexAttribute, BufferHandle, usize)>,
    element_buffer: Option<BufferHandle>,
}

/// Number of uniform buffer binding points, the usual desktop driver limit
pub const MAX_UNIFORM_BUFFER_BINDINGS: u32 = 72;

#[derive(Debug, Default)]
struct HeadlessState {
    next_name: u32,
    shaders: HashMap<ShaderHandle, ShaderObject>,
    programs: HashMap<ProgramHandle, ProgramObject>,
    buffers: HashMap<BufferHandle, BufferObject>,
    vertex_arrays: HashMap<VaoHandle, VertexArrayObject>,
    uniform_bindings: HashMap<u32, BufferHandle>,
    reserved_bindings: HashSet<u32>,
    errors: ErrorFlags,
}

impl Default for ErrorFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl HeadlessState {
    fn allocate_name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }

    fn raise(&mut self, error: ApiError) {
        self.errors.insert(ErrorFlags::from_error(error));
    }

    fn is_attached_anywhere(&self, shader: ShaderHandle) -> bool {
        self.programs.values().any(|p| p.attached.contains(&shader))
    }
}

/// Software graphics context for tests and offline tools
#[derive(Debug, Default)]
pub struct HeadlessContext {
    state: RefCell<HeadlessState>,
}

impl HeadlessContext {
    /// Create a context with no objects and a clear error state
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject an API error, as a driver would raise it
    pub fn raise(&self, error: ApiError) {
        self.state.borrow_mut().raise(error);
    }

    /// Whether any API error is waiting to be read
    pub fn has_pending_errors(&self) -> bool {
        !self.state.borrow().errors.is_empty()
    }

    /// Number of live shader objects (including ones pending deletion)
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Number of live program objects
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Number of live buffer objects
    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// Number of live vertex array objects
    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    /// Total number of live objects of every kind
    pub fn live_object_count(&self) -> usize {
        self.live_shaders() + self.live_programs() + self.live_buffers() + self.live_vertex_arrays()
    }

    /// Copy of a buffer's storage, `None` if the buffer does not exist
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).map(|b| b.data.clone())
    }

    /// Usage hint of a buffer's current storage
    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        self.state.borrow().buffers.get(&buffer)?.usage
    }

    /// Buffer bound to uniform binding point `binding`
    pub fn uniform_binding(&self, binding: u32) -> Option<BufferHandle> {
        self.state.borrow().uniform_bindings.get(&binding).copied()
    }

    /// Number of uniform binding points currently reserved
    pub fn reserved_uniform_bindings(&self) -> usize {
        self.state.borrow().reserved_bindings.len()
    }

    /// Binding point the program's block at `block_index` is routed to
    pub fn block_binding(&self, program: ProgramHandle, block_index: u32) -> Option<u32> {
        let state = self.state.borrow();
        state.programs.get(&program)?.block_bindings.get(&block_index).copied()
    }

    /// Whether `program` exists and its last link succeeded
    pub fn is_program_linked(&self, program: ProgramHandle) -> bool {
        self.state.borrow().programs.get(&program).is_some_and(|p| p.linked)
    }

    /// Number of enabled attributes of a vertex array
    pub fn vertex_array_attribute_count(&self, vao: VaoHandle) -> usize {
        self.state.borrow().vertex_arrays.get(&vao).map_or(0, |v| v.attributes.len())
    }

    /// Element buffer of a vertex array
    pub fn vertex_array_element_buffer_of(&self, vao: VaoHandle) -> Option<BufferHandle> {
        self.state.borrow().vertex_arrays.get(&vao)?.element_buffer
    }
}

fn check_source(source: &str) -> Result<(), String> {
    if let Some(line) = source.lines().map(str::trim).find(|l| l.starts_with("#error")) {
        return Err(format!("ERROR: 0:1: {}", line.trim_start_matches("#error").trim()));
    }

    let mut depth: i64 = 0;
    for c in source.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err("ERROR: unexpected '}'".to_string());
        }
    }
    if depth != 0 {
        return Err("ERROR: unexpected end of file, missing '}'".to_string());
    }

    let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.contains("voidmain(") {
        return Err("ERROR: missing entry point 'main'".to_string());
    }
    Ok(())
}

impl GraphicsContext for HeadlessContext {
    fn create_shader(&self, stage: ShaderType) -> ShaderHandle {
        let mut state = self.state.borrow_mut();
        if stage == ShaderType::Program {
            state.raise(ApiError::InvalidEnum);
            return ShaderHandle::INVALID;
        }
        let shader = ShaderHandle::from_raw(state.allocate_name());
        state.shaders.insert(shader, ShaderObject {
            stage,
            source: None,
            compiled: false,
            delete_pending: false,
        });
        shader
    }

    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            state.raise(ApiError::InvalidValue);
            return Err(format!("{shader:?} does not exist"));
        }
        let result = check_source(source);
        if let Some(object) = state.shaders.get_mut(&shader) {
            object.source = Some(source.to_string());
            object.compiled = result.is_ok();
        }
        result
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        if !shader.is_valid() {
            return;
        }
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            state.raise(ApiError::InvalidValue);
            return;
        }
        if state.is_attached_anywhere(shader) {
            if let Some(object) = state.shaders.get_mut(&shader) {
                object.delete_pending = true;
            }
        } else {
            state.shaders.remove(&shader);
        }
    }

    fn create_program(&self) -> ProgramHandle {
        let mut state = self.state.borrow_mut();
        let program = ProgramHandle::from_raw(state.allocate_name());
        state.programs.insert(program, ProgramObject::default());
        program
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        let shader_exists = state.shaders.contains_key(&shader);
        let outcome = match state.programs.get_mut(&program) {
            _ if !shader_exists => Err(ApiError::InvalidValue),
            Some(object) if object.attached.contains(&shader) => Err(ApiError::InvalidOperation),
            Some(object) => {
                object.attached.push(shader);
                Ok(())
            }
            None => Err(ApiError::InvalidValue),
        };
        if let Err(error) = outcome {
            state.raise(error);
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        let outcome = match state.programs.get_mut(&program) {
            Some(object) => match object.attached.iter().position(|s| *s == shader) {
                Some(position) => {
                    object.attached.remove(position);
                    Ok(())
                }
                None => Err(ApiError::InvalidOperation),
            },
            None => Err(ApiError::InvalidValue),
        };
        if let Err(error) = outcome {
            state.raise(error);
            return;
        }

        let pending = state.shaders.get(&shader).is_some_and(|s| s.delete_pending);
        if pending && !state.is_attached_anywhere(shader) {
            state.shaders.remove(&shader);
        }
    }

    fn link_program(&self, program: ProgramHandle) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        if !state.programs.contains_key(&program) {
            state.raise(ApiError::InvalidValue);
            return Err(format!("{program:?} does not exist"));
        }

        let stages: Vec<&ShaderObject> = state.programs[&program]
            .attached
            .iter()
            .filter_map(|s| state.shaders.get(s))
            .collect();
        let count = |stage: ShaderType| stages.iter().filter(|s| s.stage == stage).count();

        let result = if stages.iter().any(|s| !s.compiled) {
            Err("ERROR: one or more attached shaders not successfully compiled".to_string())
        } else if count(ShaderType::Vertex) != 1 || count(ShaderType::Fragment) != 1 {
            Err("ERROR: program needs exactly one vertex and one fragment shader".to_string())
        } else {
            introspect_blocks(&stages)
        };

        let linked = result.is_ok();
        let blocks = result.clone().unwrap_or_default();
        if let Some(object) = state.programs.get_mut(&program) {
            object.linked = linked;
            object.blocks = blocks;
            object.block_bindings.clear();
        }
        result.map(|_| ())
    }

    fn delete_program(&self, program: ProgramHandle) {
        if !program.is_valid() {
            return;
        }
        let mut state = self.state.borrow_mut();
        let Some(object) = state.programs.remove(&program) else {
            state.raise(ApiError::InvalidValue);
            return;
        };
        // Deleting a program detaches its shaders
        for shader in object.attached {
            let pending = state.shaders.get(&shader).is_some_and(|s| s.delete_pending);
            if pending && !state.is_attached_anywhere(shader) {
                state.shaders.remove(&shader);
            }
        }
    }

    fn uniform_block_index(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        if !state.programs.contains_key(&program) {
            state.raise(ApiError::InvalidValue);
            return None;
        }
        let index = state.programs[&program].blocks.iter().position(|b| b.name == name)?;
        u32::try_from(index).ok()
    }

    fn uniform_block_size(&self, program: ProgramHandle, block_index: u32) -> usize {
        let mut state = self.state.borrow_mut();
        let size = state
            .programs
            .get(&program)
            .and_then(|p| p.blocks.get(block_index as usize))
            .map(|b| b.size);
        size.unwrap_or_else(|| {
            state.raise(ApiError::InvalidValue);
            0
        })
    }

    fn uniform_block_binding(&self, program: ProgramHandle, block_index: u32, binding: u32) {
        let mut state = self.state.borrow_mut();
        let routed = match state.programs.get_mut(&program) {
            Some(object) if (block_index as usize) < object.blocks.len() && binding < MAX_UNIFORM_BUFFER_BINDINGS => {
                object.block_bindings.insert(block_index, binding);
                true
            }
            _ => false,
        };
        if !routed {
            state.raise(ApiError::InvalidValue);
        }
    }

    fn create_buffer(&self) -> BufferHandle {
        let mut state = self.state.borrow_mut();
        let buffer = BufferHandle::from_raw(state.allocate_name());
        state.buffers.insert(buffer, BufferObject::default());
        buffer
    }

    fn buffer_data(&self, buffer: BufferHandle, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        let mut storage = vec![0; size];
        if let Some(data) = data {
            let n = data.len().min(size);
            storage[..n].copy_from_slice(&data[..n]);
        }

        let mut state = self.state.borrow_mut();
        let outcome = match state.buffers.get_mut(&buffer) {
            Some(object) => {
                object.data = storage;
                object.usage = Some(usage);
                Ok(())
            }
            None => Err(ApiError::InvalidOperation),
        };
        if let Err(error) = outcome {
            state.raise(error);
        }
    }

    fn buffer_sub_data(&self, buffer: BufferHandle, offset: usize, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let outcome = match state.buffers.get_mut(&buffer) {
            Some(object) => match object.data.get_mut(offset..offset + data.len()) {
                Some(range) => {
                    range.copy_from_slice(data);
                    Ok(())
                }
                None => Err(ApiError::InvalidValue),
            },
            None => Err(ApiError::InvalidOperation),
        };
        if let Err(error) = outcome {
            state.raise(error);
        }
    }

    fn bind_uniform_buffer_base(&self, binding: u32, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        if binding >= MAX_UNIFORM_BUFFER_BINDINGS {
            state.raise(ApiError::InvalidValue);
            return;
        }
        if !state.buffers.contains_key(&buffer) {
            state.raise(ApiError::InvalidOperation);
            return;
        }
        state.uniform_bindings.insert(binding, buffer);
    }

    fn reserve_uniform_binding(&self, first: u32) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        let binding = (first..MAX_UNIFORM_BUFFER_BINDINGS).find(|b| !state.reserved_bindings.contains(b))?;
        state.reserved_bindings.insert(binding);
        Some(binding)
    }

    fn release_uniform_binding(&self, binding: u32) {
        let mut state = self.state.borrow_mut();
        if !state.reserved_bindings.remove(&binding) {
            state.raise(ApiError::InvalidValue);
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        if !buffer.is_valid() {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer).is_none() {
            state.raise(ApiError::InvalidValue);
            return;
        }
        state.uniform_bindings.retain(|_, bound| *bound != buffer);
    }

    fn create_vertex_array(&self) -> VaoHandle {
        let mut state = self.state.borrow_mut();
        let vao = VaoHandle::from_raw(state.allocate_name());
        state.vertex_arrays.insert(vao, VertexArrayObject::default());
        vao
    }

    fn vertex_array_attribute(&self, vao: VaoHandle, attribute: &VertexAttribute, buffer: BufferHandle, stride: usize) {
        let mut state = self.state.borrow_mut();
        if !state.buffers.contains_key(&buffer) || attribute.components == 0 || attribute.components > 4 {
            state.raise(ApiError::InvalidValue);
            return;
        }
        let outcome = match state.vertex_arrays.get_mut(&vao) {
            Some(object) => {
                object.attributes.insert(attribute.location, (*attribute, buffer, stride));
                Ok(())
            }
            None => Err(ApiError::InvalidOperation),
        };
        if let Err(error) = outcome {
            state.raise(error);
        }
    }

    fn vertex_array_element_buffer(&self, vao: VaoHandle, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        if !state.buffers.contains_key(&buffer) {
            state.raise(ApiError::InvalidValue);
            return;
        }
        let outcome = match state.vertex_arrays.get_mut(&vao) {
            Some(object) => {
                object.element_buffer = Some(buffer);
                Ok(())
            }
            None => Err(ApiError::InvalidOperation),
        };
        if let Err(error) = outcome {
            state.raise(error);
        }
    }

    fn delete_vertex_array(&self, vao: VaoHandle) {
        if !vao.is_valid() {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(&vao).is_none() {
            state.raise(ApiError::InvalidValue);
        }
    }

    fn get_error(&self) -> Option<ApiError> {
        self.state.borrow_mut().errors.pop()
    }
}

/// Merge uniform blocks declared across stages; a block shared by both stages
/// must agree on its layout
fn introspect_blocks(stages: &[&ShaderObject]) -> Result<Vec<UniformBlockLayout>, String> {
    let mut blocks: Vec<UniformBlockLayout> = Vec::new();
    let mut seen = HashSet::new();

    for stage in stages {
        let source = stage.source.as_deref().unwrap_or_default();
        for block in std140::parse_uniform_blocks(source).map_err(|e| format!("ERROR: {e}"))? {
            if seen.insert(block.name.clone()) {
                blocks.push(block);
            } else if blocks.iter().any(|b| b.name == block.name && *b != block) {
                return Err(format!("ERROR: uniform block '{}' differs between stages", block.name));
            }
        }
    }
    Ok(blocks)
}
