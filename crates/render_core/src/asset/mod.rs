//! Asset transform and renderable pipeline
//!
//! An [`Asset`] owns one object's model matrix and an optional transform function
//! that advances it each step. Its subsets index into shared [`Geometry`] and
//! name a [`SurfaceModel`] each; [`Asset::generate_renderables`] resolves them
//! into draw-ready [`Renderable`]s.

pub mod asset_data;
pub mod geometry;
pub mod renderable;
pub mod subset;
pub mod surface_model;
pub mod transform;

pub use asset_data::Asset;
pub use geometry::{Aabb, Geometry, GpuGeometry, Vertex, VertexLayout};
pub use renderable::{Renderable, RenderableError, SubsetFailure, SubsetFailureKind};
pub use subset::{IndexRange, Subset, SurfaceModelRef};
pub use surface_model::{MaterialBlock, SurfaceModel, MATERIAL_BLOCK_NAME};
pub use transform::{TransformBinding, TransformFactory, TransformFn};
