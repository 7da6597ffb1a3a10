//! Surface appearance of a subset
//!
//! A surface model pairs a shader program name with the lighting parameters that
//! program reads from its `Material` uniform block.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::gpu::{self, GpuResult, GraphicsContext, ProgramHandle, UniformBuffer};

/// Name of the uniform block that receives [`MaterialBlock`] data
pub const MATERIAL_BLOCK_NAME: &str = "Material";

/// GPU-side material data, laid out to match
///
/// ```glsl
/// layout(std140) uniform Material {
///     vec4 ambient;
///     vec4 diffuse;
///     vec4 specular;
///     float shininess;
/// };
/// ```
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialBlock {
    /// Ambient color - RGB + unused
    pub ambient: [f32; 4],
    /// Diffuse color - RGB + alpha
    pub diffuse: [f32; 4],
    /// Specular color - RGB + unused
    pub specular: [f32; 4],
    /// Specular exponent
    pub shininess: f32,
    /// Padding to the 16 byte block size
    pub _padding: [f32; 3],
}

// Only f32 fields, size is a multiple of the alignment
unsafe impl bytemuck::Pod for MaterialBlock {}
unsafe impl bytemuck::Zeroable for MaterialBlock {}

/// Named set of lighting parameters and the shader program drawing with them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceModel {
    /// Surface model name, referenced by subsets
    pub name: String,
    /// Name of the shader program to draw with
    pub shader: String,
    /// Ambient color
    pub ambient: Vec3,
    /// Diffuse color
    pub diffuse: Vec3,
    /// Specular color
    pub specular: Vec3,
    /// Specular exponent
    pub shininess: f32,
    /// Opacity
    pub alpha: f32,
}

impl Default for SurfaceModel {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            shader: "lit".to_string(),
            ambient: Vec3::new(0.1, 0.1, 0.1),
            diffuse: Vec3::new(0.8, 0.8, 0.8),
            specular: Vec3::new(1.0, 1.0, 1.0),
            shininess: 32.0,
            alpha: 1.0,
        }
    }
}

impl SurfaceModel {
    /// Create a surface model with default lighting parameters
    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader: shader.into(),
            ..Self::default()
        }
    }

    /// Set the diffuse color
    pub fn with_diffuse(mut self, diffuse: Vec3) -> Self {
        self.diffuse = diffuse;
        self
    }

    /// Set the specular color and exponent
    pub fn with_specular(mut self, specular: Vec3, shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    /// Pack into the `Material` block layout
    pub fn material_block(&self) -> MaterialBlock {
        MaterialBlock {
            ambient: [self.ambient.x, self.ambient.y, self.ambient.z, 0.0],
            diffuse: [self.diffuse.x, self.diffuse.y, self.diffuse.z, self.alpha],
            specular: [self.specular.x, self.specular.y, self.specular.z, 0.0],
            shininess: self.shininess,
            _padding: [0.0; 3],
        }
    }

    /// Material block as uniform elements, ready for [`gpu::set_uniform_buffer`]
    pub fn uniform_data(&self) -> Vec<f32> {
        bytemuck::cast_slice(std::slice::from_ref(&self.material_block())).to_vec()
    }

    /// Upload this surface model's parameters to a `Material` uniform buffer
    pub fn upload(&self, ctx: &dyn GraphicsContext, buffer: &UniformBuffer, program: ProgramHandle) -> GpuResult<()> {
        gpu::set_uniform_buffer(ctx, buffer, &self.uniform_data(), program)
    }
}
