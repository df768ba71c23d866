//! Abstraction over the device the kernel runs on.
//!
//! The backend only talks to the device through [`Accelerator`]: allocate byte buffers, copy
//! bytes in and out and launch the kernel over a 2D domain with an ordinal argument list.

pub mod program;
pub mod vulkan;

#[cfg(test)]
pub(crate) mod mock;

use std::fmt;

use crate::{
    config::AcceleratorConfig,
    error::{Error, Result},
};

pub use vulkan::VulkanAccelerator;

/// How the kernel uses a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    ReadOnly,
    WriteOnly,
}

/// Kind of an argument slot in the kernel signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Int,
    Float,
    Buffer,
}

/// One argument passed to the kernel.
///
/// A `Buffer(None)` is a buffer that has never been allocated because nothing was ever written
/// in it (an empty sphere list for instance). The matching count argument is then 0.
pub enum KernelArg<'a, B> {
    Int(i32),
    Float(f32),
    Buffer(Option<&'a B>),
}

impl<B> KernelArg<'_, B> {
    pub fn kind(&self) -> ArgKind {
        match self {
            KernelArg::Int(_) => ArgKind::Int,
            KernelArg::Float(_) => ArgKind::Float,
            KernelArg::Buffer(_) => ArgKind::Buffer,
        }
    }
}

impl<B> fmt::Debug for KernelArg<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelArg::Int(i) => write!(f, "Int({i})"),
            KernelArg::Float(x) => write!(f, "Float({x})"),
            KernelArg::Buffer(Some(_)) => f.write_str("Buffer(<allocated>)"),
            KernelArg::Buffer(None) => f.write_str("Buffer(<unallocated>)"),
        }
    }
}

/// Signature of the `render` kernel:
///
/// | # | argument        | kind   |
/// |---|-----------------|--------|
/// | 0 | image width     | int    |
/// | 1 | image height    | int    |
/// | 2 | camera record   | buffer |
/// | 3 | sphere records  | buffer |
/// | 4 | sphere count    | int    |
/// | 5 | material records| buffer |
/// | 6 | material count  | int    |
/// | 7 | random seed     | float  |
/// | 8 | output pixels   | buffer |
pub const RENDER_KERNEL_SIGNATURE: [ArgKind; 9] = [
    ArgKind::Int,
    ArgKind::Int,
    ArgKind::Buffer,
    ArgKind::Buffer,
    ArgKind::Int,
    ArgKind::Buffer,
    ArgKind::Int,
    ArgKind::Float,
    ArgKind::Buffer,
];

/// Check `args` against `signature`, slot by slot
pub fn check_signature<B>(args: &[KernelArg<'_, B>], signature: &[ArgKind]) -> Result<()> {
    if args.len() != signature.len() {
        return Err(Error::ArgumentBinding(format!(
            "expected {} arguments, got {}",
            signature.len(),
            args.len()
        )));
    }
    for (i, (arg, expected)) in args.iter().zip(signature).enumerate() {
        if arg.kind() != *expected {
            return Err(Error::ArgumentBinding(format!(
                "argument {i} should be {expected:?}, got {:?}",
                arg.kind()
            )));
        }
    }
    Ok(())
}

/// A compute device able to run the render kernel.
///
/// Every call blocks until the device is done with it.
pub trait Accelerator
where
    Self: Sized,
{
    type Buffer;

    /// Select the device and build the kernel
    fn setup(config: &AcceleratorConfig) -> Result<Self>;

    /// Allocate a buffer of exactly `bytes` bytes
    fn allocate(&mut self, bytes: usize, access: BufferAccess) -> Result<Self::Buffer>;

    /// Copy `data` at the start of `buffer`
    fn write(&mut self, buffer: &Self::Buffer, data: &[u8]) -> Result<()>;

    /// Run the kernel with one work-item per cell of `domain`
    fn dispatch(&mut self, args: &[KernelArg<'_, Self::Buffer>], domain: [u32; 2]) -> Result<()>;

    /// Copy the first `bytes` bytes of `buffer` back to the host
    fn read(&mut self, buffer: &Self::Buffer, bytes: usize) -> Result<Vec<u8>>;
}
