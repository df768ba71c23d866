//! Vulkan compute backend.
//!
//! Devices are grouped into platforms by PCI vendor, in enumeration order. The kernel is
//! compiled at setup from GLSL with shaderc so build options apply at run time.
//!
//! Scalar kernel arguments become push constants, in argument order. Buffer arguments become
//! storage buffers of descriptor set 0, bound in argument order starting at binding 0.

use std::{collections::BTreeMap, sync::Arc};

use vulkano::{
    buffer::{BufferUsage, CpuAccessibleBuffer},
    command_buffer::{
        allocator::StandardCommandBufferAllocator, AutoCommandBufferBuilder, CommandBufferUsage,
    },
    descriptor_set::{
        allocator::StandardDescriptorSetAllocator, layout::DescriptorType,
        PersistentDescriptorSet, WriteDescriptorSet,
    },
    device::{physical::PhysicalDevice, Device, DeviceCreateInfo, Queue, QueueCreateInfo},
    instance::{Instance, InstanceCreateInfo},
    memory::allocator::StandardMemoryAllocator,
    pipeline::{ComputePipeline, Pipeline, PipelineBindPoint},
    shader::ShaderModule,
    sync::{self, GpuFuture},
    VulkanLibrary,
};

use super::{
    check_signature,
    program::{BuildOptions, Optimization, ProgramSources, ENTRY_POINT},
    Accelerator, ArgKind, BufferAccess, KernelArg, RENDER_KERNEL_SIGNATURE,
};
use crate::{
    config::AcceleratorConfig,
    error::{Error, Result},
};

pub type VulkanBuffer = Arc<CpuAccessibleBuffer<[u8]>>;

/// Must match `local_size_x` and `local_size_y` in the kernel
const WORKGROUP_SIZE: u32 = 8;

/// width, height, sphere count, material count, seed
const PUSH_CONSTANT_WORDS: usize = 5;

/// Bound in place of buffers that were never allocated
const PLACEHOLDER_BYTES: usize = 64;

fn vendor_name(vendor_id: u32) -> &'static str {
    match vendor_id {
        0x1002 => "AMD",
        0x1010 => "ImgTec",
        0x10DE => "NVIDIA",
        0x13B5 => "ARM",
        0x5143 => "Qualcomm",
        0x8086 => "Intel",
        0x10005 => "Mesa",
        _ => "unknown vendor",
    }
}

/// Physical devices sharing a vendor
struct Platform {
    vendor_id: u32,
    devices: Vec<Arc<PhysicalDevice>>,
}

fn enumerate_platforms(instance: &Arc<Instance>) -> Result<Vec<Platform>> {
    let mut platforms: Vec<Platform> = Vec::new();
    for physical in instance
        .enumerate_physical_devices()
        .map_err(Error::accelerator("device enumeration"))?
    {
        let vendor_id = physical.properties().vendor_id;
        match platforms.iter_mut().find(|p| p.vendor_id == vendor_id) {
            Some(platform) => platform.devices.push(physical),
            None => platforms.push(Platform {
                vendor_id,
                devices: vec![physical],
            }),
        }
    }
    Ok(platforms)
}

fn compute_queue_family(physical: &PhysicalDevice) -> Option<u32> {
    physical
        .queue_family_properties()
        .iter()
        .position(|q| q.queue_flags.compute)
        .map(|i| i as u32)
}

fn select_device(
    instance: &Arc<Instance>,
    platform_index: usize,
    device_index: usize,
) -> Result<(Arc<PhysicalDevice>, u32)> {
    let platforms = enumerate_platforms(instance)?;
    for (i, platform) in platforms.iter().enumerate() {
        log::info!(
            "Platform {i}: {} ({} device(s))",
            vendor_name(platform.vendor_id),
            platform.devices.len()
        );
    }

    let platform = platforms.get(platform_index).ok_or_else(|| {
        Error::AcceleratorInit(format!(
            "platform index {platform_index} is out of range, {} platform(s) available",
            platforms.len()
        ))
    })?;

    let compute_devices: Vec<_> = platform
        .devices
        .iter()
        .filter_map(|p| compute_queue_family(p).map(|family| (p.clone(), family)))
        .collect();

    compute_devices
        .get(device_index)
        .cloned()
        .ok_or_else(|| {
            Error::AcceleratorInit(format!(
                "device index {device_index} is out of range, platform {platform_index} has {} compute device(s)",
                compute_devices.len()
            ))
        })
}

/// Buffers the kernel writes are only ever read back by the host
fn host_cached(access: BufferAccess) -> bool {
    matches!(access, BufferAccess::WriteOnly)
}

/// Compile the kernel to SPIR-V, logging any warning
fn compile(sources: &ProgramSources, options: &BuildOptions) -> Result<Vec<u32>> {
    let compiler = shaderc::Compiler::new()
        .ok_or_else(|| Error::AcceleratorInit("could not create the kernel compiler".to_owned()))?;
    let mut compile_options = shaderc::CompileOptions::new()
        .ok_or_else(|| Error::AcceleratorInit("could not create compile options".to_owned()))?;

    compile_options.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_0 as u32,
    );
    for (name, value) in &options.defines {
        compile_options.add_macro_definition(name, value.as_deref());
    }
    if let Some(optimization) = options.optimization {
        compile_options.set_optimization_level(match optimization {
            Optimization::Zero => shaderc::OptimizationLevel::Zero,
            Optimization::Size => shaderc::OptimizationLevel::Size,
            Optimization::Performance => shaderc::OptimizationLevel::Performance,
        });
    }
    if options.debug_info {
        compile_options.set_generate_debug_info();
    }
    if options.suppress_warnings {
        compile_options.set_suppress_warnings();
    }
    if options.warnings_as_errors {
        compile_options.set_warnings_as_errors();
    }

    let artifact = compiler
        .compile_into_spirv(
            &sources.concatenated(),
            shaderc::ShaderKind::Compute,
            "render.glsl",
            ENTRY_POINT,
            Some(&compile_options),
        )
        .map_err(|err| {
            log::error!("Kernel build log:\n{err}");
            Error::AcceleratorInit(format!("kernel build failed: {err}"))
        })?;

    if artifact.get_num_warnings() > 0 {
        log::warn!("Kernel build log:\n{}", artifact.get_warning_messages());
    }
    Ok(artifact.as_binary().to_vec())
}

/// Match the reflected bindings of set 0 and the push constant size against the render
/// kernel signature
fn check_interface(
    bindings: &BTreeMap<u32, DescriptorType>,
    push_constant_bytes: usize,
) -> Result<()> {
    let buffer_count = RENDER_KERNEL_SIGNATURE
        .iter()
        .filter(|kind| matches!(kind, ArgKind::Buffer))
        .count();
    if bindings.len() != buffer_count {
        return Err(Error::ArgumentBinding(format!(
            "kernel has {} bindings, expected {buffer_count}",
            bindings.len()
        )));
    }
    for binding in 0..buffer_count as u32 {
        match bindings.get(&binding) {
            Some(DescriptorType::StorageBuffer) => {}
            Some(other) => {
                return Err(Error::ArgumentBinding(format!(
                    "binding {binding} is a {other:?}, expected a storage buffer"
                )))
            }
            None => {
                return Err(Error::ArgumentBinding(format!(
                    "binding {binding} is missing"
                )))
            }
        }
    }

    let expected = PUSH_CONSTANT_WORDS * std::mem::size_of::<u32>();
    if push_constant_bytes != expected {
        return Err(Error::ArgumentBinding(format!(
            "kernel takes {push_constant_bytes} bytes of push constants, expected {expected}"
        )));
    }
    Ok(())
}

/// The first `len` bytes of a mapped buffer
fn write_target(content: &mut [u8], len: usize) -> Result<&mut [u8]> {
    let capacity = content.len();
    content.get_mut(..len).ok_or_else(|| Error::Accelerator {
        stage: "buffer write",
        source: format!("cannot write {len} bytes to a buffer of {capacity}").into(),
    })
}

fn read_range(content: &[u8], bytes: usize) -> Result<&[u8]> {
    content.get(..bytes).ok_or_else(|| Error::Accelerator {
        stage: "readback",
        source: format!("cannot read {bytes} bytes from a buffer of {}", content.len()).into(),
    })
}

pub struct VulkanAccelerator {
    device: Arc<Device>,
    queue: Arc<Queue>,
    pipeline: Arc<ComputePipeline>,
    placeholder: VulkanBuffer,
    memory_allocator: StandardMemoryAllocator,
    command_buffer_allocator: StandardCommandBufferAllocator,
    descriptor_set_allocator: StandardDescriptorSetAllocator,
}

impl VulkanAccelerator {
    /// Check that the compiled kernel takes what [`RENDER_KERNEL_SIGNATURE`] describes
    fn check_layout(pipeline: &ComputePipeline) -> Result<()> {
        let layout = pipeline.layout();
        let set = layout.set_layouts().get(0).ok_or_else(|| {
            Error::ArgumentBinding("kernel does not use descriptor set 0".to_owned())
        })?;
        let bindings: BTreeMap<u32, DescriptorType> = set
            .bindings()
            .iter()
            .map(|(binding, b)| (*binding, b.descriptor_type))
            .collect();
        let push_constant_bytes = layout
            .push_constant_ranges()
            .iter()
            .map(|range| range.offset + range.size)
            .max()
            .unwrap_or(0) as usize;
        check_interface(&bindings, push_constant_bytes)
    }

    fn zeroed_buffer(
        allocator: &StandardMemoryAllocator,
        bytes: usize,
        access: BufferAccess,
    ) -> Result<VulkanBuffer> {
        CpuAccessibleBuffer::from_iter(
            allocator,
            BufferUsage {
                storage_buffer: true,
                ..BufferUsage::empty()
            },
            host_cached(access),
            vec![0u8; bytes],
        )
        .map_err(Error::accelerator("buffer allocation"))
    }
}

impl Accelerator for VulkanAccelerator {
    type Buffer = VulkanBuffer;

    fn setup(config: &AcceleratorConfig) -> Result<Self> {
        let library =
            VulkanLibrary::new().map_err(|err| Error::AcceleratorInit(err.to_string()))?;
        let instance = Instance::new(
            library,
            InstanceCreateInfo {
                // enable enumerating devices that use non-conformant vulkan implementations. (ex. moltenvk)
                enumerate_portability: true,
                ..Default::default()
            },
        )
        .map_err(|err| Error::AcceleratorInit(err.to_string()))?;

        let (physical_device, queue_family_index) =
            select_device(&instance, config.platform_index, config.device_index)?;
        log::info!(
            "Using device {} (type {:?})",
            physical_device.properties().device_name,
            physical_device.properties().device_type
        );

        let (device, mut queues) = Device::new(
            physical_device,
            DeviceCreateInfo {
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index,
                    ..Default::default()
                }],
                ..Default::default()
            },
        )
        .map_err(|err| Error::AcceleratorInit(err.to_string()))?;
        let queue = queues
            .next()
            .ok_or_else(|| Error::AcceleratorInit("could not find a queue".to_owned()))?;

        let sources = match &config.kernel_dir {
            Some(dir) => ProgramSources::from_dir(dir)?,
            None => ProgramSources::embedded(),
        };
        log::debug!(
            "Kernel sources: {}",
            sources.file_names().collect::<Vec<_>>().join(", ")
        );
        let options = BuildOptions::parse(&config.build_options)?
            .with_define("SAMPLES_PER_PIXEL", config.samples_per_pixel)
            .with_define("MAX_DEPTH", config.max_depth);
        let words = compile(&sources, &options)?;

        // SAFETY: the words come straight out of the compiler
        let module = unsafe { ShaderModule::from_words(device.clone(), &words) }
            .map_err(|err| Error::AcceleratorInit(err.to_string()))?;
        let entry_point = module.entry_point(ENTRY_POINT).ok_or_else(|| {
            Error::AcceleratorInit(format!("kernel has no `{ENTRY_POINT}` entry point"))
        })?;
        let pipeline = ComputePipeline::new(device.clone(), entry_point, &(), None, |_| {})
            .map_err(|err| Error::AcceleratorInit(err.to_string()))?;
        Self::check_layout(&pipeline)?;

        let memory_allocator = StandardMemoryAllocator::new_default(device.clone());
        let placeholder =
            Self::zeroed_buffer(&memory_allocator, PLACEHOLDER_BYTES, BufferAccess::ReadOnly)?;

        Ok(Self {
            command_buffer_allocator: StandardCommandBufferAllocator::new(
                device.clone(),
                Default::default(),
            ),
            descriptor_set_allocator: StandardDescriptorSetAllocator::new(device.clone()),
            device,
            queue,
            pipeline,
            placeholder,
            memory_allocator,
        })
    }

    fn allocate(&mut self, bytes: usize, access: BufferAccess) -> Result<VulkanBuffer> {
        Self::zeroed_buffer(&self.memory_allocator, bytes, access)
    }

    fn write(&mut self, buffer: &VulkanBuffer, data: &[u8]) -> Result<()> {
        let mut content = buffer.write().map_err(Error::accelerator("buffer write"))?;
        write_target(&mut content, data.len())?.copy_from_slice(data);
        Ok(())
    }

    fn dispatch(&mut self, args: &[KernelArg<'_, VulkanBuffer>], domain: [u32; 2]) -> Result<()> {
        check_signature(args, &RENDER_KERNEL_SIGNATURE)?;

        let mut scalars = Vec::with_capacity(PUSH_CONSTANT_WORDS);
        let mut writes = Vec::new();
        for arg in args {
            match arg {
                KernelArg::Int(i) => scalars.push(*i as u32),
                KernelArg::Float(x) => scalars.push(x.to_bits()),
                KernelArg::Buffer(buffer) => {
                    let buffer = match buffer {
                        Some(buffer) => Arc::clone(buffer),
                        None => self.placeholder.clone(),
                    };
                    writes.push(WriteDescriptorSet::buffer(writes.len() as u32, buffer));
                }
            }
        }
        let push_constants: [u32; PUSH_CONSTANT_WORDS] =
            scalars.as_slice().try_into().map_err(|_| {
                Error::ArgumentBinding(format!(
                    "{} scalar arguments for {PUSH_CONSTANT_WORDS} push constants",
                    scalars.len()
                ))
            })?;

        let [width, height] = domain;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let groups = |n: u32| n / WORKGROUP_SIZE + u32::from(n % WORKGROUP_SIZE != 0);

        let layout = self.pipeline.layout().clone();
        let set_layout = layout.set_layouts()[0].clone();
        let set = PersistentDescriptorSet::new(&self.descriptor_set_allocator, set_layout, writes)
            .map_err(|err| Error::ArgumentBinding(err.to_string()))?;

        let mut builder = AutoCommandBufferBuilder::primary(
            &self.command_buffer_allocator,
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .map_err(Error::accelerator("command buffer creation"))?;
        builder
            .bind_pipeline_compute(self.pipeline.clone())
            .bind_descriptor_sets(PipelineBindPoint::Compute, layout.clone(), 0, set)
            .push_constants(layout, 0, push_constants)
            .dispatch([groups(width), groups(height), 1])
            .map_err(Error::accelerator("dispatch"))?;
        let command_buffer = builder
            .build()
            .map_err(Error::accelerator("command buffer creation"))?;

        sync::now(self.device.clone())
            .then_execute(self.queue.clone(), command_buffer)
            .map_err(Error::accelerator("dispatch"))?
            .then_signal_fence_and_flush()
            .map_err(Error::accelerator("dispatch"))?
            .wait(None)
            .map_err(Error::accelerator("dispatch"))
    }

    fn read(&mut self, buffer: &VulkanBuffer, bytes: usize) -> Result<Vec<u8>> {
        let content = buffer.read().map_err(Error::accelerator("readback"))?;
        read_range(&content, bytes).map(<[u8]>::to_vec)
    }
}
