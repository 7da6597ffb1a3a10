//! Shared vertex/index data that an asset's subsets draw from
//!
//! `Geometry` is plain host data; [`Geometry::upload`] realizes it as a vertex
//! array object with vertex and index buffers. One geometry is typically shared
//! (`Rc<Geometry>`) by every subset of an asset and possibly by several assets,
//! so it is read-only once built.

use crate::check_gl_error;
use crate::foundation::math::Vec3;
use crate::gpu::{
    self, BufferHandle, BufferUsage, GpuResult, GraphicsContext, Owned, VaoHandle, VertexAttribute,
};

use super::renderable::SubsetFailureKind;
use super::subset::IndexRange;

/// Interleaved vertex: position, normal, texture coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

// Only f32 arrays, no padding
unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }

    /// Attribute layout matching the shader locations 0, 1 and 2
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Self>(),
            attributes: vec![
                VertexAttribute::float(0, 3, 0),
                VertexAttribute::float(1, 3, 12),
                VertexAttribute::float(2, 2, 24),
            ],
        }
    }
}

/// Layout of one interleaved vertex buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices
    pub stride: usize,
    /// Attributes in location order
    pub attributes: Vec<VertexAttribute>,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box around `points`, `None` when there are none
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self { min: first, max: first }, |aabb, p| Self {
            min: aabb.min.inf(&p),
            max: aabb.max.sup(&p),
        }))
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Longest edge
    pub fn largest_extent(&self) -> f32 {
        self.extent().max()
    }
}

/// Host-side geometry: vertices, triangle indices and their bounds
#[derive(Debug, Clone)]
pub struct Geometry {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: Option<Aabb>,
}

impl Geometry {
    /// Create geometry from vertex and index data
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.position)));
        Self { name: name.into(), vertices, indices, bounds }
    }

    /// Unit cube centered at the origin with corners at ±1
    ///
    /// Eight shared corners with averaged normals; 12 triangles in face order
    /// front, back, left, right, top, bottom (six indices per face).
    pub fn cube() -> Self {
        let n = 1.0 / 3.0_f32.sqrt();
        let vertices = vec![
            Vertex::new([-1.0, -1.0, 1.0], [-n, -n, n], [0.0, 0.0]),
            Vertex::new([1.0, -1.0, 1.0], [n, -n, n], [1.0, 0.0]),
            Vertex::new([1.0, 1.0, 1.0], [n, n, n], [1.0, 1.0]),
            Vertex::new([-1.0, 1.0, 1.0], [-n, n, n], [0.0, 1.0]),
            Vertex::new([-1.0, -1.0, -1.0], [-n, -n, -n], [1.0, 0.0]),
            Vertex::new([-1.0, 1.0, -1.0], [-n, n, -n], [1.0, 1.0]),
            Vertex::new([1.0, 1.0, -1.0], [n, n, -n], [0.0, 1.0]),
            Vertex::new([1.0, -1.0, -1.0], [n, -n, -n], [0.0, 0.0]),
        ];

        let indices = vec![
            // Front
            0, 1, 2, 2, 3, 0,
            // Back
            4, 5, 6, 6, 7, 4,
            // Left
            4, 0, 3, 3, 5, 4,
            // Right
            1, 7, 6, 6, 2, 1,
            // Top
            3, 2, 6, 6, 5, 3,
            // Bottom
            4, 7, 1, 1, 0, 4,
        ];

        Self::new("cube", vertices, indices)
    }

    /// Geometry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex data
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index data
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Bounds of all vertex positions, `None` for empty geometry
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Check that `range` lies inside the index buffer and only references
    /// existing vertices
    pub fn validate_range(&self, range: IndexRange) -> Result<(), SubsetFailureKind> {
        if range.is_empty() {
            return Err(SubsetFailureKind::EmptyRange);
        }

        let indices = usize::try_from(range.first)
            .ok()
            .zip(usize::try_from(range.end()).ok())
            .and_then(|(first, end)| self.indices.get(first..end))
            .ok_or(SubsetFailureKind::IndexRangeOutOfBounds {
                range,
                index_count: self.indices.len(),
            })?;

        match indices.iter().find(|&&i| (i as usize) >= self.vertices.len()) {
            Some(&index) => Err(SubsetFailureKind::VertexOutOfBounds {
                index,
                vertex_count: self.vertices.len(),
            }),
            None => Ok(()),
        }
    }

    /// Create a vertex array object with vertex and index buffers for this geometry
    ///
    /// Objects created before a failure are released before the error is returned.
    pub fn upload(&self, ctx: &dyn GraphicsContext) -> GpuResult<GpuGeometry> {
        let vertex_buffer = Owned::new(
            ctx,
            gpu::create_buffer(ctx, bytemuck::cast_slice(&self.vertices), BufferUsage::StaticDraw)?,
        );
        let index_buffer = Owned::new(
            ctx,
            gpu::create_buffer(ctx, bytemuck::cast_slice(&self.indices), BufferUsage::StaticDraw)?,
        );
        let vao = Owned::new(ctx, gpu::create_vao(ctx)?);

        let layout = Vertex::layout();
        for attribute in &layout.attributes {
            ctx.vertex_array_attribute(vao.handle(), attribute, vertex_buffer.handle(), layout.stride);
        }
        ctx.vertex_array_element_buffer(vao.handle(), index_buffer.handle());
        check_gl_error!(ctx);

        log::debug!(
            "Uploaded geometry '{}' ({} vertices, {} indices) as {:?}",
            self.name, self.vertices.len(), self.indices.len(), vao.handle()
        );
        Ok(GpuGeometry {
            vao: vao.into_inner(),
            vertex_buffer: vertex_buffer.into_inner(),
            index_buffer: index_buffer.into_inner(),
            index_count: self.indices.len(),
        })
    }
}

/// GPU objects backing one uploaded [`Geometry`]
///
/// Not released on drop; call [`GpuGeometry::release`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuGeometry {
    /// Vertex array object with attributes and element buffer set up
    pub vao: VaoHandle,
    /// Interleaved vertex buffer
    pub vertex_buffer: BufferHandle,
    /// Index buffer
    pub index_buffer: BufferHandle,
    /// Number of indices in the index buffer
    pub index_count: usize,
}

impl GpuGeometry {
    /// Destroy the vertex array object and both buffers
    pub fn release(self, ctx: &dyn GraphicsContext) {
        gpu::destroy_vao(ctx, self.vao);
        gpu::destroy_buffer(ctx, self.vertex_buffer);
        gpu::destroy_buffer(ctx, self.index_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessContext;
    use approx::assert_relative_eq;

    fn strip(vertex_count: usize, index_count: u32) -> Geometry {
        let vertices = (0..vertex_count)
            .map(|i| Vertex::new([i as f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]))
            .collect();
        let indices = (0..index_count).map(|i| i % vertex_count as u32).collect();
        Geometry::new("strip", vertices, indices)
    }

    #[test]
    fn test_vertex_layout() {
        let layout = Vertex::layout();
        assert_eq!(layout.stride, 32);
        let total: usize = layout.attributes.iter().map(VertexAttribute::size).sum();
        assert_eq!(total, layout.stride);
    }

    #[test]
    fn test_cube_bounds() {
        let cube = Geometry::cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.index_count(), 36);

        let bounds = cube.bounds().unwrap();
        assert_relative_eq!(bounds.center(), Vec3::zeros());
        assert_relative_eq!(bounds.largest_extent(), 2.0);
    }

    #[test]
    fn test_empty_geometry_has_no_bounds() {
        assert!(Geometry::new("empty", Vec::new(), Vec::new()).bounds().is_none());
    }

    #[test]
    fn test_validate_range() {
        let geometry = strip(4, 100);

        assert_eq!(geometry.validate_range(IndexRange::new(0, 50)), Ok(()));
        assert_eq!(geometry.validate_range(IndexRange::new(50, 50)), Ok(()));
        assert_eq!(
            geometry.validate_range(IndexRange::new(60, 50)),
            Err(SubsetFailureKind::IndexRangeOutOfBounds { range: IndexRange::new(60, 50), index_count: 100 })
        );
        assert_eq!(geometry.validate_range(IndexRange::new(10, 0)), Err(SubsetFailureKind::EmptyRange));
        assert!(geometry.validate_range(IndexRange::new(u32::MAX, 2)).is_err());
    }

    #[test]
    fn test_validate_range_checks_vertices() {
        let geometry = Geometry::new("broken", vec![Vertex::default(); 2], vec![0, 1, 5]);

        assert_eq!(geometry.validate_range(IndexRange::new(0, 2)), Ok(()));
        assert_eq!(
            geometry.validate_range(IndexRange::new(0, 3)),
            Err(SubsetFailureKind::VertexOutOfBounds { index: 5, vertex_count: 2 })
        );
    }

    #[test]
    fn test_upload_and_release() {
        let ctx = HeadlessContext::new();
        let cube = Geometry::cube();
        let gpu_cube = cube.upload(&ctx).unwrap();

        assert_eq!(gpu_cube.index_count, 36);
        assert_eq!(ctx.vertex_array_attribute_count(gpu_cube.vao), 3);
        assert_eq!(ctx.vertex_array_element_buffer_of(gpu_cube.vao), Some(gpu_cube.index_buffer));
        assert_eq!(ctx.buffer_usage(gpu_cube.vertex_buffer), Some(BufferUsage::StaticDraw));
        assert_eq!(ctx.buffer_contents(gpu_cube.vertex_buffer).map(|d| d.len()), Some(8 * 32));
        assert_eq!(ctx.live_object_count(), 3);

        gpu_cube.release(&ctx);
        assert_eq!(ctx.live_object_count(), 0);
        assert!(!ctx.has_pending_errors());
    }
}
