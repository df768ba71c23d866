use image::RgbaImage;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    accelerator::{Accelerator, KernelArg},
    buffers::GpuBufferSet,
    camera::Camera,
    config::Config,
    error::{Error, Result},
    output::FrameOutput,
    pack::{pack, PIXEL_RECORD_SIZE},
    scene::Scene,
    utils::{log_once::warn_once, timer::timed_scope_log},
};

/// Size in bytes of the output buffer for a `width`x`height` frame.
///
/// Fails when it does not fit in the largest buffer range an accelerator can bind.
pub fn output_byte_size(width: u32, height: u32) -> Result<usize> {
    let bytes = u64::from(width) * u64::from(height) * PIXEL_RECORD_SIZE as u64;
    if bytes > u64::from(u32::MAX) {
        return Err(Error::ImageTooLarge { width, height });
    }
    usize::try_from(bytes).map_err(|_| Error::ImageTooLarge { width, height })
}

fn to_kernel_int(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| Error::ArgumentBinding(format!("{what} {value} overflows an int")))
}

/// Renders scenes on an accelerator.
///
/// A `Backend` only exists once the accelerator is set up and the kernel built, so every
/// value of this type is ready to render.
pub struct Backend<A: Accelerator> {
    config: Config,
    accelerator: A,
    buffers: GpuBufferSet<A::Buffer>,
    outputs: Vec<Box<dyn FrameOutput>>,
    rng: StdRng,
}

impl<A: Accelerator> Backend<A> {
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        let accelerator =
            timed_scope_log("Accelerator setup", || A::setup(&config.accelerator)).res?;

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            accelerator,
            buffers: GpuBufferSet::default(),
            outputs: Vec::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn accelerator(&self) -> &A {
        &self.accelerator
    }

    pub fn add_output(&mut self, output: impl FrameOutput + 'static) {
        self.outputs.push(Box::new(output));
    }

    /// Change the output dimensions. Zero is allowed, rendering is then skipped.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
    }

    /// Render `scene` seen through `camera` and hand the frame to every output
    pub fn render(&mut self, camera: &Camera, scene: &Scene) -> Result<()> {
        let Config { width, height, .. } = self.config;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let output_bytes = output_byte_size(width, height)?;

        if [camera.image_width(), camera.image_height()] != [width, height] {
            warn_once!(
                "camera image is {}x{} but the output is {width}x{height}, rays are spread over the output",
                camera.image_width(),
                camera.image_height()
            );
        }

        let packed = timed_scope_log("Pack scene", || pack(scene, camera)).res?;

        timed_scope_log("Upload", || -> Result<()> {
            self.buffers.upload(&mut self.accelerator, &packed)?;
            self.buffers.ensure_output(&mut self.accelerator, output_bytes)
        })
        .res?;

        let seed: f32 = self.rng.gen();
        let buffers = &self.buffers;
        let args = [
            KernelArg::Int(to_kernel_int(width as usize, "width")?),
            KernelArg::Int(to_kernel_int(height as usize, "height")?),
            KernelArg::Buffer(buffers.camera.handle()),
            KernelArg::Buffer(buffers.spheres.handle()),
            KernelArg::Int(to_kernel_int(packed.spheres.len(), "sphere count")?),
            KernelArg::Buffer(buffers.materials.handle()),
            KernelArg::Int(to_kernel_int(packed.materials.len(), "material count")?),
            KernelArg::Float(seed),
            KernelArg::Buffer(buffers.output.handle()),
        ];
        let accelerator = &mut self.accelerator;
        timed_scope_log("Dispatch", || accelerator.dispatch(&args, [width, height])).res?;

        let output = buffers.output.handle().ok_or_else(|| {
            Error::ArgumentBinding("output buffer is not allocated".to_owned())
        })?;
        let pixels = timed_scope_log("Readback", || accelerator.read(output, output_bytes)).res?;
        let frame = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| Error::Accelerator {
            stage: "readback",
            source: format!("short read for a {width}x{height} frame").into(),
        })?;

        for output in &mut self.outputs {
            output.commit(&frame)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use glam::Vec3;
    use image::{Rgba, RgbaImage};

    use super::{output_byte_size, Backend};
    use crate::{
        accelerator::mock::{Call, MockAccelerator},
        camera::CameraConfig,
        config::Config,
        error::{Error, Result},
        material::Material,
        output::FrameOutput,
        scene::{Scene, Sphere},
    };

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<RgbaImage>>>);

    impl FrameOutput for Recorder {
        fn commit(&mut self, frame: &RgbaImage) -> Result<()> {
            self.0.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    fn config(width: u32, height: u32) -> Config {
        Config {
            width,
            height,
            ..Default::default()
        }
    }

    fn one_sphere() -> Scene {
        let mut scene = Scene::new();
        let material = scene.insert_material(Material::lambertian(Vec3::new(0.7, 0.3, 0.3)));
        scene
            .insert_sphere(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, material))
            .unwrap();
        scene
    }

    #[test]
    fn renders_to_every_output() {
        let camera = CameraConfig::default().with_image(4, 1.0).build().unwrap();
        let mut backend = Backend::<MockAccelerator>::initialize(config(4, 4)).unwrap();
        let (first, second) = (Recorder::default(), Recorder::default());
        backend.add_output(first.clone());
        backend.add_output(second.clone());

        backend.render(&camera, &one_sphere()).unwrap();

        for recorder in [first, second] {
            let frames = recorder.0.lock().unwrap();
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0].dimensions(), (4, 4));
            assert_eq!(frames[0].get_pixel(3, 2), &Rgba([3, 2, 0, 255]));
        }
        assert_eq!(backend.accelerator().dispatches(), 1);
    }

    #[test]
    fn arguments_in_kernel_order() {
        let camera = CameraConfig::default().with_image(2, 1.0).build().unwrap();
        let mut backend = Backend::<MockAccelerator>::initialize(config(2, 2)).unwrap();
        backend.render(&camera, &one_sphere()).unwrap();

        let dispatch = backend
            .accelerator()
            .calls
            .iter()
            .find_map(|call| match call {
                Call::Dispatch { domain, args } => Some((*domain, args.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(dispatch.0, [2, 2]);
        let args = dispatch.1;
        assert!(
            args.starts_with(
                "[Int(2), Int(2), Buffer(<allocated>), Buffer(<allocated>), Int(1), Buffer(<allocated>), Int(1), Float("
            ),
            "{args}"
        );
        assert!(args.ends_with("), Buffer(<allocated>)]"), "{args}");
    }

    #[test]
    fn zero_dimension_is_a_no_op() {
        let camera = CameraConfig::default().build().unwrap();
        for (width, height) in [(0, 10), (10, 0), (0, 0)] {
            let mut backend =
                Backend::<MockAccelerator>::initialize(config(width, height)).unwrap();
            let recorder = Recorder::default();
            backend.add_output(recorder.clone());

            backend.render(&camera, &one_sphere()).unwrap();
            assert!(backend.accelerator().calls.is_empty());
            assert!(recorder.0.lock().unwrap().is_empty());
        }
    }

    #[test]
    fn oversized_image_fails_before_allocation() {
        assert!(matches!(
            output_byte_size(65536, 65536),
            Err(Error::ImageTooLarge {
                width: 65536,
                height: 65536
            })
        ));
        assert_eq!(output_byte_size(800, 600).unwrap(), 800 * 600 * 4);

        let camera = CameraConfig::default().build().unwrap();
        let mut backend = Backend::<MockAccelerator>::initialize(config(65536, 65536)).unwrap();
        assert!(matches!(
            backend.render(&camera, &one_sphere()),
            Err(Error::ImageTooLarge { .. })
        ));
        assert!(backend.accelerator().calls.is_empty());
    }

    #[test]
    fn repeated_renders_reuse_buffers() {
        let camera = CameraConfig::default().with_image(8, 1.0).build().unwrap();
        let mut backend = Backend::<MockAccelerator>::initialize(config(8, 8)).unwrap();
        let scene = one_sphere();

        backend.render(&camera, &scene).unwrap();
        let allocations = backend.accelerator().allocations();
        assert_eq!(allocations, 4);

        backend.render(&camera, &scene).unwrap();
        backend.resize(4, 4);
        backend.render(&camera, &scene).unwrap();
        assert_eq!(backend.accelerator().allocations(), allocations);
        assert_eq!(backend.accelerator().dispatches(), 3);

        backend.resize(16, 16);
        backend.render(&camera, &scene).unwrap();
        assert_eq!(backend.accelerator().allocations(), allocations + 1);
    }

    #[test]
    fn empty_scene_binds_unallocated_buffers() {
        let camera = CameraConfig::default().with_image(2, 1.0).build().unwrap();
        let mut backend = Backend::<MockAccelerator>::initialize(config(2, 2)).unwrap();
        backend.render(&camera, &Scene::new()).unwrap();

        let args = backend
            .accelerator()
            .calls
            .iter()
            .find_map(|call| match call {
                Call::Dispatch { args, .. } => Some(args.clone()),
                _ => None,
            })
            .unwrap();
        assert!(
            args.contains("Buffer(<unallocated>), Int(0), Buffer(<unallocated>), Int(0)"),
            "{args}"
        );
    }

    #[test]
    fn dispatch_failure_is_reported() {
        let camera = CameraConfig::default().with_image(2, 1.0).build().unwrap();
        let mut backend = Backend::<MockAccelerator>::initialize(config(2, 2)).unwrap();
        let recorder = Recorder::default();
        backend.add_output(recorder.clone());
        backend.accelerator.fail_dispatch = true;

        assert!(matches!(
            backend.render(&camera, &one_sphere()),
            Err(Error::Accelerator {
                stage: "dispatch",
                ..
            })
        ));
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut bad = config(2, 2);
        bad.accelerator.samples_per_pixel = 0;
        assert!(matches!(
            Backend::<MockAccelerator>::initialize(bad),
            Err(Error::InvalidConfig(_))
        ));

        let mut bad = config(2, 2);
        bad.accelerator.platform_index = 3;
        assert!(matches!(
            Backend::<MockAccelerator>::initialize(bad),
            Err(Error::AcceleratorInit(_))
        ));
    }

    #[test]
    fn seeds_are_reproducible() {
        let camera = CameraConfig::default().with_image(2, 1.0).build().unwrap();
        let dispatched = |seed| {
            let mut backend = Backend::<MockAccelerator>::initialize(Config {
                seed,
                ..config(2, 2)
            })
            .unwrap();
            backend.render(&camera, &one_sphere()).unwrap();
            backend.render(&camera, &one_sphere()).unwrap();
            backend
                .accelerator()
                .calls
                .iter()
                .filter_map(|call| match call {
                    Call::Dispatch { args, .. } => Some(args.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };

        let first = dispatched(7);
        assert_eq!(first, dispatched(7));
        assert_ne!(first[0], first[1]);
    }
}
