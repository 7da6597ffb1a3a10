//! Graphics context abstraction
//!
//! The graphics API is a single state machine per rendering thread. Rather than
//! reaching for it through process-wide globals, every resource function takes the
//! context explicitly as `&dyn GraphicsContext`. Methods take `&self` (the API is
//! inherently stateful behind the handle) and mirror the direct-state-access entry
//! points of the underlying API one to one, so a binding-backed implementation is a
//! thin forwarding layer and tests can run against [`super::HeadlessContext`].
//!
//! Implementations are thread-confined; nothing here is `Send` or `Sync`.

use super::error::ApiError;
use super::handle::{BufferHandle, ProgramHandle, ShaderHandle, VaoHandle};

/// Shader object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
    /// Linked program (used to tag link-time diagnostics)
    Program,
}

impl ShaderType {
    /// Human-readable stage name
    pub fn label(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Program => "program",
        }
    }
}

/// Buffer usage hint passed to data allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times
    StaticDraw,
    /// Rewritten repeatedly (uniform data)
    DynamicDraw,
}

/// One 32-bit float vertex attribute inside an interleaved vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader attribute location
    pub location: u32,
    /// Number of components (1-4)
    pub components: u32,
    /// Byte offset from the start of the vertex
    pub offset: usize,
}

impl VertexAttribute {
    /// Float attribute at `location` with `components` components at `offset`
    pub const fn float(location: u32, components: u32, offset: usize) -> Self {
        Self { location, components, offset }
    }

    /// Size in bytes of the attribute
    pub fn size(&self) -> usize {
        self.components as usize * std::mem::size_of::<f32>()
    }
}

/// Low-level graphics API surface used by the resource functions
///
/// Creation methods return [`Default`] (zero) handles when the API cannot create
/// the object. Everything else reports failures through the API error state,
/// drained by [`GraphicsContext::get_error`].
pub trait GraphicsContext {
    /// Create an empty shader object for `stage`
    fn create_shader(&self, stage: ShaderType) -> ShaderHandle;

    /// Upload `source` and compile; `Err` carries the info log
    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> Result<(), String>;

    /// Delete a shader object (deferred while attached to a program)
    fn delete_shader(&self, shader: ShaderHandle);

    /// Create an empty program object
    fn create_program(&self) -> ProgramHandle;

    /// Attach a compiled shader to a program
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);

    /// Detach a shader from a program
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);

    /// Link the attached stages; `Err` carries the info log
    fn link_program(&self, program: ProgramHandle) -> Result<(), String>;

    /// Delete a program object
    fn delete_program(&self, program: ProgramHandle);

    /// Index of the named active uniform block, if the program has one
    fn uniform_block_index(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Data size in bytes of the uniform block at `block_index`
    fn uniform_block_size(&self, program: ProgramHandle, block_index: u32) -> usize;

    /// Route the program's block at `block_index` to uniform binding point `binding`
    fn uniform_block_binding(&self, program: ProgramHandle, block_index: u32, binding: u32);

    /// Create an empty buffer object
    fn create_buffer(&self) -> BufferHandle;

    /// (Re)allocate `size` bytes of buffer storage, optionally initialized from `data`
    fn buffer_data(&self, buffer: BufferHandle, size: usize, data: Option<&[u8]>, usage: BufferUsage);

    /// Overwrite part of the buffer storage starting at `offset`
    fn buffer_sub_data(&self, buffer: BufferHandle, offset: usize, data: &[u8]);

    /// Bind a whole buffer to uniform binding point `binding`
    fn bind_uniform_buffer_base(&self, binding: u32, buffer: BufferHandle);

    /// Reserve the lowest free uniform binding point at or above `first`
    ///
    /// Returns `None` when every binding point from `first` up to the context's
    /// limit is already reserved. A reserved point stays taken until released.
    fn reserve_uniform_binding(&self, first: u32) -> Option<u32>;

    /// Return a binding point obtained from [`Self::reserve_uniform_binding`]
    fn release_uniform_binding(&self, binding: u32);

    /// Delete a buffer object
    fn delete_buffer(&self, buffer: BufferHandle);

    /// Create an empty vertex array object
    fn create_vertex_array(&self) -> VaoHandle;

    /// Source `attribute` of `vao` from `buffer` with the given vertex stride
    fn vertex_array_attribute(&self, vao: VaoHandle, attribute: &VertexAttribute, buffer: BufferHandle, stride: usize);

    /// Use `buffer` as the element (index) buffer of `vao`
    fn vertex_array_element_buffer(&self, vao: VaoHandle, buffer: BufferHandle);

    /// Delete a vertex array object
    fn delete_vertex_array(&self, vao: VaoHandle);

    /// Pop one pending API error, `None` when the error state is clear
    fn get_error(&self) -> Option<ApiError>;
}
