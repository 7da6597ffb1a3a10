//! Opaque GPU object handles
//!
//! Handles are plain integer names handed out by the graphics context. Zero is
//! never a live object. Nothing here counts references: the owner of a handle
//! destroys it exactly once, either explicitly through the matching `destroy_*`
//! function or by wrapping it in [`Owned`].

use std::fmt;

use super::context::GraphicsContext;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(u32);

        impl $name {
            /// The reserved "no object" handle
            pub const INVALID: Self = Self(0);

            /// Wrap a raw object name
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Raw object name
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Whether this handle can name a live object
            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $kind, self.0)
            }
        }
    };
}

gpu_handle!(
    /// Shader program handle
    ProgramHandle, "Program"
);
gpu_handle!(
    /// Single shader stage handle (only lives inside program creation)
    ShaderHandle, "Shader"
);
gpu_handle!(
    /// Buffer object handle (uniform, vertex or index data)
    BufferHandle, "Buffer"
);
gpu_handle!(
    /// Vertex array object handle
    VaoHandle, "Vao"
);

/// A handle type with a matching destroy operation
pub trait GpuHandle: Copy + fmt::Debug {
    /// Object kind, for logs
    const KIND: &'static str;

    /// Raw object name
    fn raw_name(self) -> u32;

    /// Destroy the object through the context
    fn release(self, ctx: &dyn GraphicsContext);
}

impl GpuHandle for ProgramHandle {
    const KIND: &'static str = "program";

    fn raw_name(self) -> u32 {
        self.raw()
    }

    fn release(self, ctx: &dyn GraphicsContext) {
        super::shader::destroy_program(ctx, self);
    }
}

impl GpuHandle for ShaderHandle {
    const KIND: &'static str = "shader";

    fn raw_name(self) -> u32 {
        self.raw()
    }

    fn release(self, ctx: &dyn GraphicsContext) {
        ctx.delete_shader(self);
        crate::check_gl_error!(ctx);
    }
}

impl GpuHandle for BufferHandle {
    const KIND: &'static str = "buffer";

    fn raw_name(self) -> u32 {
        self.raw()
    }

    fn release(self, ctx: &dyn GraphicsContext) {
        super::vao::destroy_buffer(ctx, self);
    }
}

impl GpuHandle for VaoHandle {
    const KIND: &'static str = "vertex array";

    fn raw_name(self) -> u32 {
        self.raw()
    }

    fn release(self, ctx: &dyn GraphicsContext) {
        super::vao::destroy_vao(ctx, self);
    }
}

/// Scoped owner of one GPU object
///
/// Destroys the object when dropped, which covers early returns on error paths.
/// [`Owned::into_inner`] hands the handle back to manual create/destroy pairing.
pub struct Owned<'ctx, H: GpuHandle> {
    ctx: &'ctx dyn GraphicsContext,
    handle: Option<H>,
}

impl<'ctx, H: GpuHandle> Owned<'ctx, H> {
    /// Take ownership of `handle`
    pub fn new(ctx: &'ctx dyn GraphicsContext, handle: H) -> Self {
        Self { ctx, handle: Some(handle) }
    }

    /// Borrow the handle without giving up ownership
    pub fn handle(&self) -> H {
        // Only `into_inner` and `drop` take the handle, and both consume `self`
        self.handle.unwrap_or_else(|| unreachable!("owned handle already released"))
    }

    /// Release ownership without destroying the object
    pub fn into_inner(mut self) -> H {
        self.handle
            .take()
            .unwrap_or_else(|| unreachable!("owned handle already released"))
    }
}

impl<H: GpuHandle> fmt::Debug for Owned<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned").field("handle", &self.handle).finish()
    }
}

impl<H: GpuHandle> Drop for Owned<'_, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::trace!("Releasing scoped {} {}", H::KIND, handle.raw_name());
            handle.release(self.ctx);
        }
    }
}
