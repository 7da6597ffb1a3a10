//! Shader program creation and destruction
//!
//! A program name resolves to a vertex + fragment source pair through a
//! [`ShaderSourceProvider`]. Where the sources come from (an embedded table, a
//! directory of files, an asset bundle) is up to the provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::check_gl_error;
use crate::config::GraphicsConfig;

use super::context::{GraphicsContext, ShaderType};
use super::error::{GpuError, GpuResult};
use super::handle::{Owned, ProgramHandle, ShaderHandle};

/// Vertex and fragment sources of one program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
}

impl ShaderSources {
    /// Pair up a vertex and fragment source
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }
}

/// Resolves program names to shader sources
pub trait ShaderSourceProvider {
    /// Sources for `name`, or `None` when the name is unknown
    fn resolve(&self, name: &str) -> Option<ShaderSources>;
}

/// In-memory table of program sources
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    programs: HashMap<String, ShaderSources>,
}

impl ShaderLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the sources of a program
    pub fn insert(&mut self, name: impl Into<String>, sources: ShaderSources) {
        self.programs.insert(name.into(), sources);
    }

    /// Builder form of [`ShaderLibrary::insert`]
    pub fn with_program(mut self, name: impl Into<String>, vertex: &str, fragment: &str) -> Self {
        self.insert(name, ShaderSources::new(vertex, fragment));
        self
    }

    /// Number of registered programs
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether no program is registered
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl ShaderSourceProvider for ShaderLibrary {
    fn resolve(&self, name: &str) -> Option<ShaderSources> {
        self.programs.get(name).cloned()
    }
}

/// Loads `{dir}/{name}.{ext}` shader files from a list of search directories
///
/// Each stage is searched independently; the first directory containing the file wins.
#[derive(Debug, Clone)]
pub struct ShaderDirectory {
    search_paths: Vec<PathBuf>,
    vertex_extension: String,
    fragment_extension: String,
}

impl ShaderDirectory {
    /// Search a single directory with the default `vert`/`frag` extensions
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let defaults = GraphicsConfig::default();
        Self {
            search_paths: vec![dir.into()],
            vertex_extension: defaults.vertex_extension,
            fragment_extension: defaults.fragment_extension,
        }
    }

    /// Build from the search paths and extensions in `config`
    pub fn from_config(config: &GraphicsConfig) -> Self {
        Self {
            search_paths: config.shader_search_paths.iter().map(PathBuf::from).collect(),
            vertex_extension: config.vertex_extension.clone(),
            fragment_extension: config.fragment_extension.clone(),
        }
    }

    /// Path of the file that would be loaded for `name`'s `stage`, if one exists
    pub fn locate(&self, name: &str, stage: ShaderType) -> Option<PathBuf> {
        let extension = match stage {
            ShaderType::Vertex => &self.vertex_extension,
            ShaderType::Fragment => &self.fragment_extension,
            ShaderType::Program => return None,
        };
        let file_name = format!("{name}.{extension}");

        self.search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }

    fn read_stage(&self, name: &str, stage: ShaderType) -> Option<String> {
        let Some(path) = self.locate(name, stage) else {
            log::debug!("No {} shader for '{}' in {:?}", stage.label(), name, self.search_paths);
            return None;
        };
        read_source(&path)
    }
}

fn read_source(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(e) => {
            log::warn!("Failed to read shader file {}: {}", path.display(), e);
            None
        }
    }
}

impl ShaderSourceProvider for ShaderDirectory {
    fn resolve(&self, name: &str) -> Option<ShaderSources> {
        let vertex = self.read_stage(name, ShaderType::Vertex)?;
        let fragment = self.read_stage(name, ShaderType::Fragment)?;
        Some(ShaderSources { vertex, fragment })
    }
}

fn compile_stage<'ctx>(
    ctx: &'ctx dyn GraphicsContext,
    program: &str,
    stage: ShaderType,
    source: &str,
) -> GpuResult<Owned<'ctx, ShaderHandle>> {
    let shader = ctx.create_shader(stage);
    check_gl_error!(ctx);
    if !shader.is_valid() {
        return Err(GpuError::ObjectCreation("shader"));
    }
    let shader = Owned::new(ctx, shader);

    let compiled = ctx.compile_shader(shader.handle(), source);
    check_gl_error!(ctx);
    compiled.map_err(|log| GpuError::CompileFailed {
        program: program.to_string(),
        stage,
        log,
    })?;

    Ok(shader)
}

/// Compile and link the program called `name`
///
/// On any failure every shader and program object created along the way is
/// deleted before the error is returned, so there is nothing for the caller to
/// destroy. On success the caller owns the handle and must pass it to
/// [`destroy_program`] exactly once.
pub fn create_program(
    ctx: &dyn GraphicsContext,
    sources: &dyn ShaderSourceProvider,
    name: &str,
) -> GpuResult<ProgramHandle> {
    let Some(stages) = sources.resolve(name) else {
        log::error!("Cannot create program '{name}': no shader sources");
        return Err(GpuError::SourceNotFound(name.to_string()));
    };

    let result = link_stages(ctx, name, &stages);
    match &result {
        Ok(program) => log::debug!("Created program '{}' as {:?}", name, program),
        Err(e) => log::error!("{e}"),
    }
    result
}

fn link_stages(ctx: &dyn GraphicsContext, name: &str, stages: &ShaderSources) -> GpuResult<ProgramHandle> {
    let vertex = compile_stage(ctx, name, ShaderType::Vertex, &stages.vertex)?;
    let fragment = compile_stage(ctx, name, ShaderType::Fragment, &stages.fragment)?;

    let program = ctx.create_program();
    check_gl_error!(ctx);
    if !program.is_valid() {
        return Err(GpuError::ObjectCreation("program"));
    }
    let program = Owned::new(ctx, program);

    ctx.attach_shader(program.handle(), vertex.handle());
    ctx.attach_shader(program.handle(), fragment.handle());
    let linked = ctx.link_program(program.handle());
    // Stages are no longer needed once linking has run, whatever the outcome
    ctx.detach_shader(program.handle(), vertex.handle());
    ctx.detach_shader(program.handle(), fragment.handle());
    check_gl_error!(ctx);

    linked.map_err(|log| GpuError::LinkFailed { program: name.to_string(), log })?;
    Ok(program.into_inner())
}

/// Release a program created by [`create_program`]
///
/// Passing an invalid handle is a caller error: it asserts in debug builds.
/// Passing an already-destroyed handle is reported by the debug error check.
pub fn destroy_program(ctx: &dyn GraphicsContext, handle: ProgramHandle) {
    debug_assert!(handle.is_valid(), "destroy_program called with an invalid handle");
    log::debug!("Destroying {:?}", handle);
    ctx.delete_program(handle);
    check_gl_error!(ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::headless::HeadlessContext;

    const VERT: &str = "#version 330\nvoid main() { gl_Position = vec4(0.0); }\n";
    const FRAG: &str = "#version 330\nout vec4 color;\nvoid main() { color = vec4(1.0); }\n";
    const BROKEN: &str = "#version 330\n#error missing semicolon\nvoid main() { }\n";

    fn library() -> ShaderLibrary {
        ShaderLibrary::new()
            .with_program("flat", VERT, FRAG)
            .with_program("broken_vertex", BROKEN, FRAG)
            .with_program("broken_fragment", VERT, BROKEN)
            .with_program("two_vertex", VERT, VERT)
    }

    #[test]
    fn test_create_and_destroy_program() {
        let ctx = HeadlessContext::new();
        let program = create_program(&ctx, &library(), "flat").unwrap();

        assert!(program.is_valid());
        assert_eq!(ctx.live_programs(), 1);
        // Stage objects are gone once the program is linked
        assert_eq!(ctx.live_shaders(), 0);

        destroy_program(&ctx, program);
        assert_eq!(ctx.live_object_count(), 0);
        assert!(!ctx.has_pending_errors());
    }

    #[test]
    fn test_unknown_program_name() {
        let ctx = HeadlessContext::new();
        let result = create_program(&ctx, &library(), "missing");

        assert_eq!(result, Err(GpuError::SourceNotFound("missing".to_string())));
        assert_eq!(ctx.live_object_count(), 0);
    }

    #[test]
    fn test_compile_failure_cleans_up() {
        let ctx = HeadlessContext::new();

        for (name, stage) in [("broken_vertex", ShaderType::Vertex), ("broken_fragment", ShaderType::Fragment)] {
            match create_program(&ctx, &library(), name) {
                Err(GpuError::CompileFailed { stage: failed, log, .. }) => {
                    assert_eq!(failed, stage);
                    assert!(log.contains("missing semicolon"));
                }
                other => panic!("expected compile failure, got {other:?}"),
            }
            assert_eq!(ctx.live_object_count(), 0);
        }
    }

    #[test]
    fn test_link_failure_cleans_up() {
        let ctx = HeadlessContext::new();
        let result = create_program(&ctx, &library(), "two_vertex");

        assert!(matches!(result, Err(GpuError::LinkFailed { .. })));
        assert_eq!(ctx.live_object_count(), 0);
        assert!(!ctx.has_pending_errors());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "invalid handle")]
    fn test_destroy_invalid_program_asserts() {
        let ctx = HeadlessContext::new();
        destroy_program(&ctx, ProgramHandle::INVALID);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_double_destroy_is_reported_and_cleared() {
        let ctx = HeadlessContext::new();
        let program = create_program(&ctx, &library(), "flat").unwrap();
        destroy_program(&ctx, program);
        destroy_program(&ctx, program);

        // The stale name raised an API error, which the debug check drained
        assert!(!ctx.has_pending_errors());
        assert_eq!(ctx.live_programs(), 0);
    }

    #[test]
    fn test_shader_directory_resolves_files() {
        let dir = std::env::temp_dir().join(format!("render_core_shaders_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("lit.vert"), VERT).unwrap();
        std::fs::write(dir.join("lit.frag"), FRAG).unwrap();
        std::fs::write(dir.join("half.vert"), VERT).unwrap();

        let shaders = ShaderDirectory::new(&dir);
        assert_eq!(shaders.resolve("lit"), Some(ShaderSources::new(VERT, FRAG)));
        assert_eq!(shaders.resolve("half"), None);
        assert_eq!(shaders.locate("lit", ShaderType::Program), None);

        let ctx = HeadlessContext::new();
        let program = create_program(&ctx, &shaders, "lit").unwrap();
        destroy_program(&ctx, program);
    }

    #[test]
    fn test_shader_directory_from_config() {
        let dir = std::env::temp_dir().join(format!("render_core_shader_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Default.vsh"), VERT).unwrap();
        std::fs::write(dir.join("Default.fsh"), FRAG).unwrap();

        let config = GraphicsConfig {
            shader_search_paths: vec!["/nonexistent".to_string(), dir.to_string_lossy().into_owned()],
            vertex_extension: "vsh".to_string(),
            fragment_extension: "fsh".to_string(),
            ..GraphicsConfig::default()
        };
        let shaders = ShaderDirectory::from_config(&config);
        assert_eq!(shaders.locate("Default", ShaderType::Vertex), Some(dir.join("Default.vsh")));
        assert!(shaders.resolve("Default").is_some());
    }
}
