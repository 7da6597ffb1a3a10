//! # Render Core
//!
//! The runtime core of a small real-time 3D renderer.
//!
//! ## Features
//!
//! - **Asset Pipeline**: per-step model transforms and renderable generation
//! - **GPU Resources**: shader programs, uniform buffers and vertex arrays as
//!   plain handles with explicit create/destroy pairs
//! - **Debug Error Checking**: graphics-API error checks after every mutating
//!   call, compiled out of release builds
//! - **Headless Context**: a software graphics context for tests and tools
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use render_core::prelude::*;
//!
//! let mut asset = Asset::new("cube")
//!     .with_geometry(Rc::new(Geometry::cube()))
//!     .with_transform(TransformBinding::Shared(TransformFactory::rotation(Vec3::y(), 90.0)));
//! let material = asset.add_surface_model(Rc::new(SurfaceModel::new("paint", "lit")));
//! asset.add_subset(Subset::new("faces", 0..36, material));
//!
//! asset.step_transforms(1.0 / 60.0);
//! let renderables = asset.generate_renderables()?;
//! assert_eq!(renderables.len(), 1);
//! # Ok::<(), RenderableError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate, clippy::cast_precision_loss)]

pub mod asset;
pub mod config;
pub mod foundation;
pub mod gpu;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        asset::{
            Asset, Geometry, IndexRange, Renderable, RenderableError, Subset, SurfaceModel,
            SurfaceModelRef, TransformBinding, TransformFactory,
        },
        config::{Config, GraphicsConfig},
        foundation::math::{Mat4, Mat4Ext, Vec3, Vec4},
        gpu::{
            create_program, create_uniform_buffer, destroy_program, destroy_uniform_buffer,
            set_uniform_buffer, GpuError, GraphicsContext, HeadlessContext, ProgramHandle,
            ShaderLibrary, UniformBuffer,
        },
    };
}
