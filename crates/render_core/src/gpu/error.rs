//! GPU resource errors

use std::fmt;
use thiserror::Error;

use super::context::ShaderType;

/// Error codes reported by the graphics API error query
///
/// Discriminants are the raw API codes so they can be logged alongside driver output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ApiError {
    /// An enumerated argument was out of range
    InvalidEnum = 0x0500,
    /// A numeric argument, or an object name, was invalid
    InvalidValue = 0x0501,
    /// The operation is not allowed in the current state
    InvalidOperation = 0x0502,
    /// Not enough memory left to execute the command
    OutOfMemory = 0x0505,
}

impl ApiError {
    /// Raw API error code
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidEnum => "GL_INVALID_ENUM",
            Self::InvalidValue => "GL_INVALID_VALUE",
            Self::InvalidOperation => "GL_INVALID_OPERATION",
            Self::OutOfMemory => "GL_OUT_OF_MEMORY",
        };
        write!(f, "{name} (0x{:04X})", self.code())
    }
}

/// GPU resource errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// No vertex/fragment source pair is known for the program name
    #[error("Shader sources not found for program '{0}'")]
    SourceNotFound(String),

    /// A shader stage failed to compile
    #[error("Failed to compile {stage:?} shader of program '{program}': {log}")]
    CompileFailed {
        /// Program name the stage belongs to
        program: String,
        /// Stage that failed
        stage: ShaderType,
        /// Compiler info log
        log: String,
    },

    /// The program failed to link
    #[error("Failed to link program '{program}': {log}")]
    LinkFailed {
        /// Program name
        program: String,
        /// Linker info log
        log: String,
    },

    /// The program has no active uniform block with this name
    #[error("Uniform block '{block}' not found in program {program}")]
    UniformBlockNotFound {
        /// Requested block name
        block: String,
        /// Raw program name
        program: u32,
    },

    /// Uniform data does not fit the buffer's allocated block range
    #[error("Uniform upload of {requested} bytes exceeds buffer capacity of {capacity} bytes")]
    UniformOverflow {
        /// Bytes the caller tried to upload
        requested: usize,
        /// Bytes allocated for the buffer
        capacity: usize,
    },

    /// The context returned the reserved zero name for a new object
    #[error("Graphics context failed to create a {0} object")]
    ObjectCreation(&'static str),

    /// Every uniform binding point at or above `first` is already reserved
    #[error("No free uniform binding point at or above {first}")]
    NoUniformBinding {
        /// Lowest binding point that was acceptable
        first: u32,
    },
}

/// Result type for GPU resource operations
pub type GpuResult<T> = Result<T, GpuError>;
