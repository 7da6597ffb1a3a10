//! Per-step transform functions
//!
//! A transform function maps an asset's current model matrix and the elapsed time
//! of one step to its next model matrix. Assets either share ownership of the
//! function or borrow it weakly from whoever owns it; a borrowed function that has
//! been dropped turns the step into a no-op.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// `(current model matrix, elapsed seconds) -> next model matrix`
pub type TransformFn = dyn Fn(Mat4, f32) -> Mat4;

/// How an asset refers to its transform function
#[derive(Clone, Default)]
pub enum TransformBinding {
    /// No transform; stepping leaves the matrix unchanged
    #[default]
    None,
    /// Shared ownership; the function lives as long as any holder
    Shared(Rc<TransformFn>),
    /// Non-owning reference to a function owned elsewhere
    Borrowed(Weak<TransformFn>),
}

impl TransformBinding {
    /// Share ownership of `function`
    pub fn shared(function: impl Fn(Mat4, f32) -> Mat4 + 'static) -> Self {
        Self::Shared(Rc::new(function))
    }

    /// Borrow `function` without keeping it alive
    pub fn borrowed(function: &Rc<TransformFn>) -> Self {
        Self::Borrowed(Rc::downgrade(function))
    }

    /// The function to call for the next step, if one is still available
    pub fn resolve(&self) -> Option<Rc<TransformFn>> {
        match self {
            Self::None => None,
            Self::Shared(function) => Some(Rc::clone(function)),
            Self::Borrowed(function) => function.upgrade(),
        }
    }

    /// True when a borrowed function has been dropped by its owner
    pub fn is_dangling(&self) -> bool {
        matches!(self, Self::Borrowed(function) if function.strong_count() == 0)
    }
}

impl fmt::Debug for TransformBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Shared(_) => f.write_str("Shared(..)"),
            Self::Borrowed(_) if self.is_dangling() => f.write_str("Borrowed(dropped)"),
            Self::Borrowed(_) => f.write_str("Borrowed(..)"),
        }
    }
}

/// Factory for common transform functions
pub struct TransformFactory;

impl TransformFactory {
    /// Spin about `axis` in model space at `degrees_per_second`
    pub fn rotation(axis: Vec3, degrees_per_second: f32) -> Rc<TransformFn> {
        let radians_per_second = utils::deg_to_rad(degrees_per_second);
        Rc::new(move |current: Mat4, elapsed: f32| {
            current * Mat4::rotation_axis(&axis, radians_per_second * elapsed)
        })
    }

    /// Move along `velocity` (units per second) in world space
    pub fn translation(velocity: Vec3) -> Rc<TransformFn> {
        Rc::new(move |current: Mat4, elapsed: f32| Mat4::new_translation(&(velocity * elapsed)) * current)
    }

    /// Apply `first`, then `second`, in the same step
    pub fn chain(first: Rc<TransformFn>, second: Rc<TransformFn>) -> Rc<TransformFn> {
        Rc::new(move |current: Mat4, elapsed: f32| second(first(current, elapsed), elapsed))
    }
}
