//! GPU resource management
//!
//! Free functions that create, destroy and validate GPU objects: shader programs,
//! uniform buffers and vertex array objects. There is no manager instance; the
//! graphics context is passed in explicitly and is the only state these functions
//! touch. Handles are not reference counted. Each successful `create_*` must be
//! paired with exactly one matching `destroy_*`, or the handle wrapped in [`Owned`].
//!
//! In debug builds every mutating call is followed by an error check
//! ([`check_error`]); release builds compile the checks out.

pub mod check;
pub mod context;
pub mod error;
pub mod handle;
pub mod headless;
pub mod shader;
pub mod uniform;
pub mod vao;

pub use check::{check_error, ERROR_CHECKS_ENABLED};
pub use context::{BufferUsage, GraphicsContext, ShaderType, VertexAttribute};
pub use error::{ApiError, GpuError, GpuResult};
pub use handle::{BufferHandle, GpuHandle, Owned, ProgramHandle, ShaderHandle, VaoHandle};
pub use headless::HeadlessContext;
pub use shader::{
    create_program, destroy_program,
    ShaderDirectory, ShaderLibrary, ShaderSourceProvider, ShaderSources,
};
pub use uniform::{
    create_uniform_buffer, create_uniform_buffer_with, destroy_uniform_buffer, set_uniform_buffer,
    UniformBuffer, UniformBufferOptions,
};
pub use vao::{create_buffer, create_vao, destroy_buffer, destroy_vao};
