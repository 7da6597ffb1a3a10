//! Vertex array objects and the data buffers they reference

use crate::check_gl_error;

use super::context::{BufferUsage, GraphicsContext};
use super::error::{GpuError, GpuResult};
use super::handle::{BufferHandle, VaoHandle};

/// Create an empty vertex array object
pub fn create_vao(ctx: &dyn GraphicsContext) -> GpuResult<VaoHandle> {
    let vao = ctx.create_vertex_array();
    check_gl_error!(ctx);
    if !vao.is_valid() {
        return Err(GpuError::ObjectCreation("vertex array"));
    }
    log::debug!("Created {:?}", vao);
    Ok(vao)
}

/// Release a vertex array object
///
/// The buffers it references are not touched; they have their own owner.
pub fn destroy_vao(ctx: &dyn GraphicsContext, vao: VaoHandle) {
    debug_assert!(vao.is_valid(), "destroy_vao called with an invalid handle");
    log::debug!("Destroying {:?}", vao);
    ctx.delete_vertex_array(vao);
    check_gl_error!(ctx);
}

/// Create a buffer initialized with `data`
pub fn create_buffer(ctx: &dyn GraphicsContext, data: &[u8], usage: BufferUsage) -> GpuResult<BufferHandle> {
    let buffer = ctx.create_buffer();
    check_gl_error!(ctx);
    if !buffer.is_valid() {
        return Err(GpuError::ObjectCreation("buffer"));
    }
    ctx.buffer_data(buffer, data.len(), Some(data), usage);
    check_gl_error!(ctx);
    Ok(buffer)
}

/// Release a buffer created by [`create_buffer`]
pub fn destroy_buffer(ctx: &dyn GraphicsContext, buffer: BufferHandle) {
    debug_assert!(buffer.is_valid(), "destroy_buffer called with an invalid handle");
    ctx.delete_buffer(buffer);
    check_gl_error!(ctx);
}
