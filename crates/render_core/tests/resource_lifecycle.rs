//! GPU resource create/destroy contracts against a headless context

use render_core::config::{Config, GraphicsConfig};
use render_core::gpu::{
    check_error, create_program, create_uniform_buffer, create_uniform_buffer_with, destroy_program,
    destroy_uniform_buffer, set_uniform_buffer, ApiError, GpuError, HeadlessContext, Owned, ProgramHandle,
    ShaderDirectory, ShaderLibrary, ShaderType,
};

const VERT: &str = r"
    #version 330
    layout(std140) uniform Transforms { mat4 model; };
    void main() { gl_Position = model * vec4(1.0); }
";

const FRAG: &str = r"
    #version 330
    layout(std140) uniform Material { vec4 diffuse; };
    out vec4 color;
    void main() { color = diffuse; }
";

const UNBALANCED: &str = "#version 330\nvoid main() { color = vec4(1.0);\n";

fn shaders() -> ShaderLibrary {
    ShaderLibrary::new()
        .with_program("flat", VERT, FRAG)
        .with_program("unbalanced", VERT, UNBALANCED)
}

#[test]
fn test_unknown_program_leaves_nothing_to_destroy() {
    let ctx = HeadlessContext::new();

    let result = create_program(&ctx, &shaders(), "does_not_exist");
    assert_eq!(result, Err(GpuError::SourceNotFound("does_not_exist".to_string())));
    assert_eq!(ctx.live_object_count(), 0);
    assert!(!ctx.has_pending_errors());
}

#[test]
fn test_compile_failure_cleans_up_intermediates() {
    let ctx = HeadlessContext::new();

    match create_program(&ctx, &shaders(), "unbalanced") {
        Err(GpuError::CompileFailed { program, stage, .. }) => {
            assert_eq!(program, "unbalanced");
            assert_eq!(stage, ShaderType::Fragment);
        }
        other => panic!("expected a compile failure, got {other:?}"),
    }
    // The vertex stage compiled before the fragment stage failed
    assert_eq!(ctx.live_shaders(), 0);
    assert_eq!(ctx.live_programs(), 0);
}

#[test]
fn test_unknown_block_allocates_nothing() {
    let ctx = HeadlessContext::new();
    let program = create_program(&ctx, &shaders(), "flat").unwrap();

    let result = create_uniform_buffer(&ctx, "Lights", program);
    assert!(matches!(result, Err(GpuError::UniformBlockNotFound { ref block, .. }) if block == "Lights"));
    assert_eq!(ctx.live_buffers(), 0);

    destroy_program(&ctx, program);
    assert_eq!(ctx.live_object_count(), 0);
}

#[test]
fn test_oversized_upload_keeps_program_intact() {
    let ctx = HeadlessContext::new();
    let program = create_program(&ctx, &shaders(), "flat").unwrap();
    let material = create_uniform_buffer(&ctx, "Material", program).unwrap();

    set_uniform_buffer(&ctx, &material, &[0.5; 4], program).unwrap();
    let result = set_uniform_buffer(&ctx, &material, &[1.0; 5], program);
    assert_eq!(result, Err(GpuError::UniformOverflow { requested: 20, capacity: 16 }));

    assert!(ctx.is_program_linked(program));
    assert_eq!(ctx.block_binding(program, material.block_index), Some(material.binding));
    assert_eq!(ctx.uniform_binding(material.binding), Some(material.handle));
    assert!(!ctx.has_pending_errors());

    destroy_uniform_buffer(&ctx, material);
    destroy_program(&ctx, program);
}

#[test]
fn test_multi_block_buffer() {
    let ctx = HeadlessContext::new();
    let program = create_program(&ctx, &shaders(), "flat").unwrap();
    let config = GraphicsConfig { blocks_per_uniform_buffer: 4, first_uniform_binding: 2, ..Default::default() };

    let transforms = create_uniform_buffer_with(&ctx, "Transforms", program, (&config).into()).unwrap();
    assert_eq!(transforms.capacity(), 4 * 64);
    assert_eq!(transforms.binding, 2);

    // The next buffer takes the next free point regardless of its block index
    let material = create_uniform_buffer_with(&ctx, "Material", program, (&config).into()).unwrap();
    assert_eq!(material.binding, 3);
    destroy_uniform_buffer(&ctx, material);

    // Four model matrices in one upload
    set_uniform_buffer(&ctx, &transforms, &[1.0; 64], program).unwrap();

    destroy_uniform_buffer(&ctx, transforms);
    destroy_program(&ctx, program);
    assert_eq!(ctx.live_object_count(), 0);
    assert_eq!(ctx.reserved_uniform_bindings(), 0);
}

#[test]
fn test_owned_program_released_on_drop() {
    let ctx = HeadlessContext::new();
    {
        let program = Owned::new(&ctx, create_program(&ctx, &shaders(), "flat").unwrap());
        assert!(ctx.is_program_linked(program.handle()));
        assert_eq!(ctx.live_programs(), 1);
    }
    assert_eq!(ctx.live_programs(), 0);

    let kept: ProgramHandle = Owned::new(&ctx, create_program(&ctx, &shaders(), "flat").unwrap()).into_inner();
    assert_eq!(ctx.live_programs(), 1);
    destroy_program(&ctx, kept);
}

#[test]
fn test_check_error_drains_and_clears() {
    let ctx = HeadlessContext::new();
    ctx.raise(ApiError::InvalidValue);
    ctx.raise(ApiError::InvalidOperation);

    let errors = check_error(&ctx, file!(), line!(), "test_check_error_drains_and_clears");
    assert_eq!(errors, [ApiError::InvalidValue, ApiError::InvalidOperation]);
    assert!(!ctx.has_pending_errors());
    assert!(check_error(&ctx, file!(), line!(), "again").is_empty());
}

#[test]
fn test_programs_from_configured_directory() {
    let dir = std::env::temp_dir().join(format!("render_core_shaders_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("flat.vs"), VERT).unwrap();
    std::fs::write(dir.join("flat.fs"), FRAG).unwrap();

    let config_path = dir.join("graphics.toml");
    std::fs::write(
        &config_path,
        format!(
            "shader_search_paths = [\"missing_dir\", {:?}]\nvertex_extension = \"vs\"\nfragment_extension = \"fs\"\n",
            dir.to_string_lossy()
        ),
    )
    .unwrap();

    let config = GraphicsConfig::load_from_file(&config_path.to_string_lossy()).unwrap();
    assert_eq!(config.blocks_per_uniform_buffer, 1);
    let directory = ShaderDirectory::from_config(&config);

    let ctx = HeadlessContext::new();
    let program = create_program(&ctx, &directory, "flat").unwrap();
    assert!(matches!(create_program(&ctx, &directory, "absent"), Err(GpuError::SourceNotFound(_))));

    destroy_program(&ctx, program);
    assert_eq!(ctx.live_object_count(), 0);
    std::fs::remove_dir_all(&dir).unwrap();
}
