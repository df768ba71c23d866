use crate::{
    accelerator::{Accelerator, BufferAccess},
    error::Result,
    pack::PackedScene,
};

/// A device buffer that only grows.
///
/// The handle is replaced only when a request does not fit in the current allocation, so a
/// scene that shrinks, or stays the same from frame to frame, never triggers an allocation.
pub struct DeviceBuffer<B> {
    label: &'static str,
    handle: Option<B>,
    capacity: usize,
}

impl<B> DeviceBuffer<B> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            handle: None,
            capacity: 0,
        }
    }

    pub fn handle(&self) -> Option<&B> {
        self.handle.as_ref()
    }

    /// Size of the current allocation, 0 when unallocated
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Make sure the buffer can hold `requested` bytes.
    ///
    /// Returns whether a new buffer was allocated. A request of 0 bytes does nothing.
    pub fn ensure<A>(
        &mut self,
        accelerator: &mut A,
        requested: usize,
        access: BufferAccess,
    ) -> Result<bool>
    where
        A: Accelerator<Buffer = B>,
    {
        if requested == 0 {
            return Ok(false);
        }
        if self.handle.is_some() && self.capacity >= requested {
            return Ok(false);
        }

        log::debug!(
            "allocating {} buffer: {} -> {} bytes",
            self.label,
            self.capacity,
            requested
        );
        let buffer = accelerator.allocate(requested, access)?;
        self.handle = Some(buffer);
        self.capacity = requested;
        Ok(true)
    }

    /// Ensure then copy `data` at the start of the buffer. Empty data is not copied.
    pub fn upload<A>(
        &mut self,
        accelerator: &mut A,
        data: &[u8],
        access: BufferAccess,
    ) -> Result<()>
    where
        A: Accelerator<Buffer = B>,
    {
        self.ensure(accelerator, data.len(), access)?;
        match (&self.handle, data.is_empty()) {
            (Some(buffer), false) => accelerator.write(buffer, data),
            _ => Ok(()),
        }
    }
}

/// Device-side copies of a [`PackedScene`] and the output pixels
pub struct GpuBufferSet<B> {
    pub camera: DeviceBuffer<B>,
    pub spheres: DeviceBuffer<B>,
    pub materials: DeviceBuffer<B>,
    pub output: DeviceBuffer<B>,
}

impl<B> Default for GpuBufferSet<B> {
    fn default() -> Self {
        Self {
            camera: DeviceBuffer::new("camera"),
            spheres: DeviceBuffer::new("spheres"),
            materials: DeviceBuffer::new("materials"),
            output: DeviceBuffer::new("output"),
        }
    }
}

impl<B> GpuBufferSet<B> {
    /// Copy every array of `packed` to the device, growing buffers as needed
    pub fn upload<A>(&mut self, accelerator: &mut A, packed: &PackedScene) -> Result<()>
    where
        A: Accelerator<Buffer = B>,
    {
        self.spheres
            .upload(accelerator, packed.sphere_bytes(), BufferAccess::ReadOnly)?;
        self.materials
            .upload(accelerator, packed.material_bytes(), BufferAccess::ReadOnly)?;
        self.camera
            .upload(accelerator, packed.camera_bytes(), BufferAccess::ReadOnly)?;
        Ok(())
    }

    pub fn ensure_output<A>(&mut self, accelerator: &mut A, bytes: usize) -> Result<()>
    where
        A: Accelerator<Buffer = B>,
    {
        self.output
            .ensure(accelerator, bytes, BufferAccess::WriteOnly)
            .map(|_| ())
    }
}
