//! Graphics-API error checking
//!
//! [`check_error`] drains and reports the API error state. The [`check_gl_error!`]
//! and [`gl_call!`] macros wrap it so that error checks exist only in debug builds
//! (or when the `gl-error-check` feature is enabled); in release builds they expand
//! to nothing and leave no branch behind.
//!
//! [`check_gl_error!`]: crate::check_gl_error
//! [`gl_call!`]: crate::gl_call

use super::context::GraphicsContext;
use super::error::ApiError;

/// Upper bound on errors drained per check; a lost context can report forever
const MAX_DRAINED_ERRORS: usize = 32;

/// Whether this build compiles graphics-API error checks in
pub const ERROR_CHECKS_ENABLED: bool = cfg!(any(debug_assertions, feature = "gl-error-check"));

/// Check, report and clear all pending graphics-API errors
///
/// Each error is logged with the call site that detected it. Returns the drained
/// errors, oldest first.
pub fn check_error(ctx: &dyn GraphicsContext, file: &str, line: u32, function: &str) -> Vec<ApiError> {
    let mut errors = Vec::new();
    while let Some(error) = ctx.get_error() {
        log::error!("{file}:{line} ({function}): graphics API error {error}");
        errors.push(error);
        if errors.len() == MAX_DRAINED_ERRORS {
            log::error!("{file}:{line} ({function}): error state did not clear, giving up");
            break;
        }
    }
    errors
}

/// Path of the function the macro is expanded in, e.g. `render_core::gpu::uniform::set_uniform_buffer`
#[doc(hidden)]
#[macro_export]
macro_rules! function_name {
    () => {{
        fn here() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(here);
        name.strip_suffix("::here").unwrap_or(name)
    }};
}

/// Check, report and clear graphics-API errors at this call site (debug builds only)
#[cfg(any(debug_assertions, feature = "gl-error-check"))]
#[macro_export]
macro_rules! check_gl_error {
    ($ctx:expr) => {{
        let _ = $crate::gpu::check_error($ctx, file!(), line!(), $crate::function_name!());
    }};
}

/// Check, report and clear graphics-API errors at this call site (debug builds only)
#[cfg(not(any(debug_assertions, feature = "gl-error-check")))]
#[macro_export]
macro_rules! check_gl_error {
    ($ctx:expr) => {{
        let _ = &$ctx;
    }};
}

/// Run one graphics call and, in debug builds, panic if it raised an API error
///
/// For calls whose failure can only mean a programming error.
#[cfg(any(debug_assertions, feature = "gl-error-check"))]
#[macro_export]
macro_rules! gl_call {
    ($ctx:expr, $call:expr) => {{
        let result = $call;
        let errors = $crate::gpu::check_error($ctx, file!(), line!(), $crate::function_name!());
        assert!(errors.is_empty(), "`{}` raised {:?}", stringify!($call), errors);
        result
    }};
}

/// Run one graphics call and, in debug builds, panic if it raised an API error
///
/// For calls whose failure can only mean a programming error.
#[cfg(not(any(debug_assertions, feature = "gl-error-check")))]
#[macro_export]
macro_rules! gl_call {
    ($ctx:expr, $call:expr) => {{
        let _ = &$ctx;
        $call
    }};
}
