//! Uniform buffer objects
//!
//! A uniform buffer is sized from the introspected layout of a named uniform block
//! in a linked program. Each live buffer holds its own binding point, reserved from
//! the context, and the program's block is routed to that point. Buffers of different
//! programs therefore never share a binding even when their block indices match.

use crate::config::GraphicsConfig;
use crate::{check_gl_error, gl_call};

use super::context::{BufferUsage, GraphicsContext};
use super::error::{GpuError, GpuResult};
use super::handle::{BufferHandle, Owned, ProgramHandle};

/// Size of one uploaded uniform value
const ELEMENT_SIZE: usize = std::mem::size_of::<f32>();

/// A uniform buffer together with the block layout it was sized from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBuffer {
    /// Buffer object
    pub handle: BufferHandle,
    /// Index of the uniform block in the program it was created from
    pub block_index: u32,
    /// Data size of one block instance in bytes
    pub block_size: usize,
    /// Number of consecutive block instances allocated
    pub num_blocks: usize,
    /// Size of one uploaded element in bytes
    pub element_size: usize,
    /// Uniform binding point reserved for this buffer
    pub binding: u32,
}

impl UniformBuffer {
    /// Allocated storage in bytes
    pub fn capacity(&self) -> usize {
        self.block_size * self.num_blocks
    }

    /// Maximum number of elements a single upload may carry
    pub fn max_elements(&self) -> usize {
        self.capacity() / self.element_size
    }
}

/// Allocation options for [`create_uniform_buffer_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBufferOptions {
    /// Number of consecutive block instances to allocate
    pub num_blocks: usize,
    /// Lowest binding point the buffer may be given
    pub binding_base: u32,
}

impl Default for UniformBufferOptions {
    fn default() -> Self {
        Self { num_blocks: 1, binding_base: 0 }
    }
}

impl From<&GraphicsConfig> for UniformBufferOptions {
    fn from(config: &GraphicsConfig) -> Self {
        Self {
            num_blocks: config.blocks_per_uniform_buffer.max(1),
            binding_base: config.first_uniform_binding,
        }
    }
}

/// Create a buffer for the uniform block `name` of `program` with default options
pub fn create_uniform_buffer(
    ctx: &dyn GraphicsContext,
    name: &str,
    program: ProgramHandle,
) -> GpuResult<UniformBuffer> {
    create_uniform_buffer_with(ctx, name, program, UniformBufferOptions::default())
}

/// Create a buffer for the uniform block `name` of `program`
///
/// Fails with [`GpuError::UniformBlockNotFound`] when the program has no active
/// block by that name, and with [`GpuError::NoUniformBinding`] when no binding point
/// at or above `options.binding_base` is free. Nothing stays allocated on failure.
pub fn create_uniform_buffer_with(
    ctx: &dyn GraphicsContext,
    name: &str,
    program: ProgramHandle,
    options: UniformBufferOptions,
) -> GpuResult<UniformBuffer> {
    let Some(block_index) = ctx.uniform_block_index(program, name) else {
        check_gl_error!(ctx);
        log::error!("Uniform block '{}' not found in {:?}", name, program);
        return Err(GpuError::UniformBlockNotFound {
            block: name.to_string(),
            program: program.raw(),
        });
    };

    let block_size = ctx.uniform_block_size(program, block_index);
    let num_blocks = options.num_blocks.max(1);

    let buffer = ctx.create_buffer();
    check_gl_error!(ctx);
    if !buffer.is_valid() {
        return Err(GpuError::ObjectCreation("uniform buffer"));
    }
    let buffer = Owned::new(ctx, buffer);

    ctx.buffer_data(buffer.handle(), block_size * num_blocks, None, BufferUsage::DynamicDraw);
    check_gl_error!(ctx);

    let Some(binding) = ctx.reserve_uniform_binding(options.binding_base) else {
        log::error!(
            "No free uniform binding for block '{}' at or above {}",
            name, options.binding_base
        );
        return Err(GpuError::NoUniformBinding { first: options.binding_base });
    };

    gl_call!(ctx, ctx.uniform_block_binding(program, block_index, binding));
    gl_call!(ctx, ctx.bind_uniform_buffer_base(binding, buffer.handle()));

    let ubo = UniformBuffer {
        handle: buffer.into_inner(),
        block_index,
        block_size,
        num_blocks,
        element_size: ELEMENT_SIZE,
        binding,
    };
    log::debug!(
        "Created uniform buffer {:?} for block '{}' (index {}, {} bytes x {}) at binding {}",
        ubo.handle, name, block_index, block_size, num_blocks, binding
    );
    Ok(ubo)
}

/// Release a uniform buffer created by [`create_uniform_buffer`]
///
/// Same contract as [`super::destroy_program`]: exactly once per buffer.
pub fn destroy_uniform_buffer(ctx: &dyn GraphicsContext, buffer: UniformBuffer) {
    debug_assert!(buffer.handle.is_valid(), "destroy_uniform_buffer called with an invalid handle");
    log::debug!("Destroying uniform buffer {:?} at binding {}", buffer.handle, buffer.binding);
    ctx.release_uniform_binding(buffer.binding);
    ctx.delete_buffer(buffer.handle);
    check_gl_error!(ctx);
}

/// Upload `data` to the start of `buffer` in a single call
///
/// `data` must fit the allocated block range; oversized uploads are rejected with
/// [`GpuError::UniformOverflow`] before anything reaches the context. The buffer is
/// re-bound to its binding point and `program`'s block routed to it, so the program
/// reads the freshly uploaded values.
pub fn set_uniform_buffer(
    ctx: &dyn GraphicsContext,
    buffer: &UniformBuffer,
    data: &[f32],
    program: ProgramHandle,
) -> GpuResult<()> {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    if bytes.len() > buffer.capacity() {
        log::error!(
            "Rejecting uniform upload to {:?}: {} bytes exceeds {} byte block",
            buffer.handle, bytes.len(), buffer.capacity()
        );
        return Err(GpuError::UniformOverflow {
            requested: bytes.len(),
            capacity: buffer.capacity(),
        });
    }

    debug_assert!(program.is_valid(), "set_uniform_buffer called with an invalid program");
    log::trace!("Uploading {} bytes to {:?}", bytes.len(), buffer.handle);

    ctx.buffer_sub_data(buffer.handle, 0, bytes);
    check_gl_error!(ctx);

    gl_call!(ctx, ctx.uniform_block_binding(program, buffer.block_index, buffer.binding));
    gl_call!(ctx, ctx.bind_uniform_buffer_base(buffer.binding, buffer.handle));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::headless::HeadlessContext;
    use crate::gpu::shader::{create_program, destroy_program, ShaderLibrary};

    const VERT: &str = r"
        #version 330
        layout(std140) uniform Transforms {
            mat4 model;
            mat4 view_projection;
        };
        void main() { gl_Position = model * vec4(0.0); }
    ";
    const FRAG: &str = r"
        #version 330
        layout(std140) uniform Material {
            vec4 diffuse;
            float shininess;
        };
        out vec4 color;
        void main() { color = diffuse; }
    ";

    fn program(ctx: &HeadlessContext) -> ProgramHandle {
        let shaders = ShaderLibrary::new().with_program("lit", VERT, FRAG);
        create_program(ctx, &shaders, "lit").unwrap()
    }

    #[test]
    fn test_create_sized_from_block() {
        let ctx = HeadlessContext::new();
        let program = program(&ctx);

        let ubo = create_uniform_buffer(&ctx, "Transforms", program).unwrap();
        assert_eq!(ubo.block_size, 128);
        assert_eq!(ubo.num_blocks, 1);
        assert_eq!(ubo.element_size, 4);
        assert_eq!(ubo.max_elements(), 32);
        assert_eq!(ctx.buffer_contents(ubo.handle).map(|data| data.len()), Some(128));
        assert_eq!(ctx.uniform_binding(ubo.binding), Some(ubo.handle));

        // vec4 + float rounds up to the 16 byte block alignment
        let material = create_uniform_buffer(&ctx, "Material", program).unwrap();
        assert_eq!(material.block_size, 32);
        assert_ne!(material.binding, ubo.binding);

        destroy_uniform_buffer(&ctx, ubo);
        destroy_uniform_buffer(&ctx, material);
        destroy_program(&ctx, program);
        assert_eq!(ctx.live_object_count(), 0);
    }

    #[test]
    fn test_missing_block() {
        let ctx = HeadlessContext::new();
        let program = program(&ctx);

        let result = create_uniform_buffer(&ctx, "Lights", program);
        assert_eq!(
            result,
            Err(GpuError::UniformBlockNotFound { block: "Lights".to_string(), program: program.raw() })
        );
        assert_eq!(ctx.live_buffers(), 0);
        destroy_program(&ctx, program);
    }

    #[test]
    fn test_options_from_config() {
        let ctx = HeadlessContext::new();
        let program = program(&ctx);
        let config = GraphicsConfig {
            blocks_per_uniform_buffer: 3,
            first_uniform_binding: 4,
            ..GraphicsConfig::default()
        };

        let ubo = create_uniform_buffer_with(&ctx, "Material", program, (&config).into()).unwrap();
        assert_eq!(ubo.capacity(), 96);
        assert!(ubo.binding >= 4);
        assert_eq!(ctx.block_binding(program, ubo.block_index), Some(ubo.binding));
        destroy_uniform_buffer(&ctx, ubo);
        destroy_program(&ctx, program);
    }

    #[test]
    fn test_set_uniform_buffer_uploads() {
        let ctx = HeadlessContext::new();
        let program = program(&ctx);
        let ubo = create_uniform_buffer(&ctx, "Material", program).unwrap();

        let values = [0.25_f32, 0.5, 0.75, 1.0, 32.0];
        set_uniform_buffer(&ctx, &ubo, &values, program).unwrap();

        let contents = ctx.buffer_contents(ubo.handle).unwrap();
        let uploaded: &[f32] = bytemuck::cast_slice(&contents[..20]);
        assert_eq!(uploaded, &values);
        assert!(!ctx.has_pending_errors());
    }

    #[test]
    fn test_set_uniform_buffer_rejects_oversized() {
        let ctx = HeadlessContext::new();
        let program = program(&ctx);
        let ubo = create_uniform_buffer(&ctx, "Material", program).unwrap();
        set_uniform_buffer(&ctx, &ubo, &[1.0; 8], program).unwrap();

        let oversized = vec![2.0_f32; ubo.max_elements() + 1];
        let result = set_uniform_buffer(&ctx, &ubo, &oversized, program);
        assert_eq!(result, Err(GpuError::UniformOverflow { requested: 36, capacity: 32 }));

        // Program state is untouched and the buffer is still usable
        assert!(!ctx.has_pending_errors());
        assert!(ctx.is_program_linked(program));
        assert_eq!(ctx.buffer_contents(ubo.handle).map(|data| data.len()), Some(32));
        set_uniform_buffer(&ctx, &ubo, &[3.0; 8], program).unwrap();
    }

    #[test]
    fn test_binding_base_at_limit_fails_cleanly() {
        let ctx = HeadlessContext::new();
        let program = program(&ctx);
        let config = GraphicsConfig { first_uniform_binding: u32::MAX, ..GraphicsConfig::default() };

        let result = create_uniform_buffer_with(&ctx, "Material", program, (&config).into());
        assert_eq!(result, Err(GpuError::NoUniformBinding { first: u32::MAX }));
        assert_eq!(ctx.live_buffers(), 0);
        assert_eq!(ctx.reserved_uniform_bindings(), 0);
        assert!(!ctx.has_pending_errors());
        destroy_program(&ctx, program);
    }

    #[test]
    fn test_programs_keep_separate_bindings() {
        let ctx = HeadlessContext::new();
        let shaders = ShaderLibrary::new()
            .with_program("transforms", VERT, "#version 330\nout vec4 color;\nvoid main() { }")
            .with_program("material", "#version 330\nvoid main() { }", FRAG);
        let a = create_program(&ctx, &shaders, "transforms").unwrap();
        let b = create_program(&ctx, &shaders, "material").unwrap();

        let a_ubo = create_uniform_buffer(&ctx, "Transforms", a).unwrap();
        let b_ubo = create_uniform_buffer(&ctx, "Material", b).unwrap();
        assert_eq!(a_ubo.block_index, 0);
        assert_eq!(b_ubo.block_index, 0);
        assert_ne!(a_ubo.binding, b_ubo.binding);

        // Uploading through one program leaves the other's routing alone
        set_uniform_buffer(&ctx, &b_ubo, &[1.0; 5], b).unwrap();
        set_uniform_buffer(&ctx, &a_ubo, &[2.0; 32], a).unwrap();
        assert_eq!(ctx.block_binding(a, 0), Some(a_ubo.binding));
        assert_eq!(ctx.block_binding(b, 0), Some(b_ubo.binding));
        assert_eq!(ctx.uniform_binding(a_ubo.binding), Some(a_ubo.handle));
        assert_eq!(ctx.uniform_binding(b_ubo.binding), Some(b_ubo.handle));
        assert!(!ctx.has_pending_errors());

        destroy_uniform_buffer(&ctx, a_ubo);
        destroy_uniform_buffer(&ctx, b_ubo);
        destroy_program(&ctx, a);
        destroy_program(&ctx, b);
        assert_eq!(ctx.live_object_count(), 0);
    }

    #[test]
    fn test_released_binding_is_reused() {
        let ctx = HeadlessContext::new();
        let program = program(&ctx);

        let first = create_uniform_buffer(&ctx, "Material", program).unwrap();
        let binding = first.binding;
        destroy_uniform_buffer(&ctx, first);
        assert_eq!(ctx.reserved_uniform_bindings(), 0);

        let second = create_uniform_buffer(&ctx, "Material", program).unwrap();
        assert_eq!(second.binding, binding);
        destroy_uniform_buffer(&ctx, second);
        destroy_program(&ctx, program);
        assert!(!ctx.has_pending_errors());
    }
}
