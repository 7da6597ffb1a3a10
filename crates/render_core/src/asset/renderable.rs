//! Draw-ready descriptions produced from an asset's subsets

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::foundation::math::{Mat4, Mat4Ext};
use crate::gpu::{self, GpuResult, GraphicsContext, ProgramHandle, UniformBuffer};

use super::geometry::Geometry;
use super::subset::IndexRange;
use super::surface_model::SurfaceModel;

/// One drawable unit: an index range of shared geometry, the surface model to
/// draw it with and the asset's model matrix at generation time
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Name of the subset this was generated from
    pub subset: String,
    /// Indices to draw
    pub index_range: IndexRange,
    /// Geometry the indices refer to
    pub geometry: Rc<Geometry>,
    /// Surface model to draw with
    pub surface_model: Rc<SurfaceModel>,
    /// Model matrix snapshot
    pub model_matrix: Mat4,
}

impl Renderable {
    /// Upload the model matrix, column-major, to a transform uniform buffer
    pub fn upload_model_matrix(
        &self,
        ctx: &dyn GraphicsContext,
        buffer: &UniformBuffer,
        program: ProgramHandle,
    ) -> GpuResult<()> {
        gpu::set_uniform_buffer(ctx, buffer, &self.model_matrix.to_column_array(), program)
    }

    /// Upload the surface model's parameters to a `Material` uniform buffer
    pub fn upload_material(
        &self,
        ctx: &dyn GraphicsContext,
        buffer: &UniformBuffer,
        program: ProgramHandle,
    ) -> GpuResult<()> {
        self.surface_model.upload(ctx, buffer, program)
    }
}

/// Why a single subset could not become a renderable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubsetFailureKind {
    /// The referenced surface model does not exist
    #[error("surface model {0} not found")]
    UnresolvedSurfaceModel(String),

    /// A surface model name matches more than one model
    #[error("surface model '{name}' is ambiguous ({matches} matches)")]
    AmbiguousSurfaceModel {
        /// Requested name
        name: String,
        /// Number of models with that name
        matches: usize,
    },

    /// The index range extends past the end of the index buffer
    #[error("index range {range} exceeds {index_count} indices")]
    IndexRangeOutOfBounds {
        /// Requested range
        range: IndexRange,
        /// Number of indices in the geometry
        index_count: usize,
    },

    /// An index inside the range references a vertex that does not exist
    #[error("index {index} exceeds {vertex_count} vertices")]
    VertexOutOfBounds {
        /// Offending index value
        index: u32,
        /// Number of vertices in the geometry
        vertex_count: usize,
    },

    /// The range selects no indices
    #[error("empty index range")]
    EmptyRange,
}

/// A subset that failed to resolve, with its position in the asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetFailure {
    /// Position of the subset in the asset
    pub index: usize,
    /// Subset name
    pub name: String,
    /// What went wrong
    pub kind: SubsetFailureKind,
}

impl fmt::Display for SubsetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subset {} '{}': {}", self.index, self.name, self.kind)
    }
}

/// Renderable generation failures
#[derive(Error, Debug)]
pub enum RenderableError {
    /// The asset has subsets but no geometry to draw them from
    #[error("asset has {subsets} subsets but no geometry")]
    MissingGeometry {
        /// Number of subsets that could not be resolved
        subsets: usize,
    },

    /// Some subsets failed; the rest are returned in `partial`
    #[error("{} of {} subsets failed: {}", .failures.len(), .total, summarize(.failures))]
    Subsets {
        /// Every subset that failed, in subset order
        failures: Vec<SubsetFailure>,
        /// Renderables for the subsets that resolved
        partial: Vec<Renderable>,
        /// Number of subsets in the asset
        total: usize,
    },
}

fn summarize(failures: &[SubsetFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl RenderableError {
    /// Subsets that failed to resolve
    pub fn failures(&self) -> &[SubsetFailure] {
        match self {
            Self::MissingGeometry { .. } => &[],
            Self::Subsets { failures, .. } => failures,
        }
    }

    /// Renderables for the subsets that did resolve
    pub fn into_partial(self) -> Vec<Renderable> {
        match self {
            Self::MissingGeometry { .. } => Vec::new(),
            Self::Subsets { partial, .. } => partial,
        }
    }
}
