mod args;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use rand::{rngs::StdRng, SeedableRng};

use gpu_tracer::{
    scene::examples::SpheresScene, utils::fs::find_directory, AcceleratorConfig, Backend,
    CameraConfig, Config, PpmOutput, Scene, VulkanAccelerator,
};

use args::Args;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let Args {
        dimensions,
        frames,
        seed,
        ..
    } = args;

    let config = Config {
        width: dimensions.width,
        height: dimensions.height,
        seed,
        accelerator: AcceleratorConfig {
            platform_index: args.platform,
            device_index: args.device,
            build_options: args.build_options,
            kernel_dir: args.kernels,
            samples_per_pixel: args.samples_per_pixel,
            max_depth: args.max_depth,
        },
    };

    log::info!("Building scene");
    let mut scene = Scene::new();
    SpheresScene::insert_into(&mut scene, &mut StdRng::seed_from_u64(seed))?;
    log::info!(
        "{} spheres, {} materials",
        scene.sphere_count(),
        scene.material_count()
    );

    let camera = CameraConfig::default()
        .with_look_from(Vec3::new(0.0, 1.0, 4.0))
        .with_look_at(Vec3::new(0.0, 1.0, 1.0))
        .with_image(
            dimensions.width,
            dimensions.width as f32 / dimensions.height.max(1) as f32,
        )
        .build()
        .context("Invalid camera")?;

    log::info!("Initialization");
    let mut backend = Backend::<VulkanAccelerator>::initialize(config)
        .context("Could not initialize the accelerator")?;

    let path = args
        .output
        .unwrap_or_else(|| find_directory("images").join("render.ppm"));
    if frames > 1 {
        backend.add_output(PpmOutput::numbered(path));
    } else {
        backend.add_output(PpmOutput::new(path));
    }

    for frame in 0..frames {
        log::info!("Rendering frame {frame} at {dimensions}");
        backend
            .render(&camera, &scene)
            .with_context(|| format!("Frame {frame} failed"))?;
    }

    log::info!("Done");
    Ok(())
}
