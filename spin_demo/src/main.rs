//! Spinning cube demo
//!
//! Drives one cube asset through two seconds of fixed 60 Hz steps against the
//! headless graphics context: every frame steps the transform, regenerates the
//! renderables and uploads their uniforms. All GPU resources are destroyed at
//! the end and the context is checked for leaks.

use std::rc::Rc;

use render_core::asset::{Asset, Geometry, Subset, SurfaceModel, TransformBinding, TransformFactory};
use render_core::config::{Config, GraphicsConfig};
use render_core::foundation::logging;
use render_core::foundation::math::{Vec3, Vec4};
use render_core::gpu::{
    self, GpuError, GraphicsContext, HeadlessContext, ProgramHandle, ShaderDirectory, ShaderLibrary,
};

const CONFIG_PATHS: [&str; 2] = ["graphics.toml", "spin_demo/graphics.toml"];
const FRAME_TIME: f32 = 1.0 / 60.0;
const FRAMES: usize = 120;

fn load_config() -> GraphicsConfig {
    for path in CONFIG_PATHS {
        if !std::path::Path::new(path).is_file() {
            continue;
        }
        match GraphicsConfig::load_from_file(path) {
            Ok(config) => {
                log::info!("Loaded graphics config from {}", path);
                return config;
            }
            Err(e) => log::warn!("Ignoring {}: {}", path, e),
        }
    }
    log::info!("Using default graphics config");
    GraphicsConfig::default()
}

/// Load the lit program from disk, falling back to the copy built into the binary
fn create_lit_program(ctx: &dyn GraphicsContext, config: &GraphicsConfig) -> Result<ProgramHandle, GpuError> {
    match gpu::create_program(ctx, &ShaderDirectory::from_config(config), "lit") {
        Err(GpuError::SourceNotFound(_)) => {
            log::warn!("Shader files not found, using built-in sources");
            let builtin = ShaderLibrary::new().with_program(
                "lit",
                include_str!("../shaders/lit.vert"),
                include_str!("../shaders/lit.frag"),
            );
            gpu::create_program(ctx, &builtin, "lit")
        }
        result => result,
    }
}

fn build_cube() -> Asset {
    let mut cube = Asset::new("cube")
        .with_geometry(Rc::new(Geometry::cube()))
        .with_transform(TransformBinding::Shared(TransformFactory::rotation(Vec3::new(0.3, 1.0, 0.0), 90.0)));

    let painted = cube.add_surface_model(Rc::new(
        SurfaceModel::new("painted", "lit").with_diffuse(Vec3::new(0.8, 0.7, 0.5)),
    ));
    cube.add_surface_model(Rc::new(
        SurfaceModel::new("polished", "lit").with_specular(Vec3::new(1.0, 1.0, 1.0), 96.0),
    ));

    // Front, back, left and right faces are painted; top and bottom are polished
    cube.add_subset(Subset::new("sides", 0..24, painted));
    cube.add_subset(Subset::new("caps", 24..36, "polished"));
    cube
}

fn run(ctx: &HeadlessContext) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config();

    let program = create_lit_program(ctx, &config)?;
    let transforms = gpu::create_uniform_buffer_with(ctx, "Transforms", program, (&config).into())?;
    let material = gpu::create_uniform_buffer_with(ctx, "Material", program, (&config).into())?;

    let mut cube = build_cube();
    let gpu_cube = cube
        .geometry()
        .ok_or("cube asset has no geometry")?
        .upload(ctx)?;

    for frame in 1..=FRAMES {
        cube.step_transforms(FRAME_TIME);

        for renderable in cube.generate_renderables()? {
            renderable.upload_model_matrix(ctx, &transforms, program)?;
            renderable.upload_material(ctx, &material, program)?;
            log::trace!(
                "Frame {}: draw '{}' indices {} of {:?}",
                frame, renderable.subset, renderable.index_range, gpu_cube.vao
            );
        }

        if frame % 30 == 0 {
            let facing = cube.model_matrix() * Vec4::new(0.0, 0.0, 1.0, 0.0);
            log::info!(
                "t={:.2}s front face points at ({:.3}, {:.3}, {:.3})",
                frame as f32 * FRAME_TIME, facing.x, facing.y, facing.z
            );
        }
    }

    gpu_cube.release(ctx);
    gpu::destroy_uniform_buffer(ctx, transforms);
    gpu::destroy_uniform_buffer(ctx, material);
    gpu::destroy_program(ctx, program);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("info");
    log::info!("Starting spin demo ({} frames)", FRAMES);

    let ctx = HeadlessContext::new();
    let result = run(&ctx);

    let leaked = ctx.live_object_count();
    if leaked == 0 {
        log::info!("All GPU objects released");
    } else {
        log::warn!("{} GPU objects still live at exit", leaked);
    }

    match result {
        Ok(()) => {
            log::info!("Spin demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Spin demo failed: {}", e);
            Err(e)
        }
    }
}
