//! In-memory accelerator recording every call, for tests.

use super::{check_signature, Accelerator, BufferAccess, KernelArg, RENDER_KERNEL_SIGNATURE};
use crate::{
    config::AcceleratorConfig,
    error::{Error, Result},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Allocate {
        id: usize,
        bytes: usize,
        access: BufferAccess,
    },
    Write {
        id: usize,
        bytes: usize,
    },
    Dispatch {
        domain: [u32; 2],
        args: String,
    },
    Read {
        id: usize,
        bytes: usize,
    },
}

#[derive(Debug)]
pub struct MockBuffer {
    pub id: usize,
}

#[derive(Debug, Default)]
pub struct MockAccelerator {
    pub calls: Vec<Call>,
    pub memory: Vec<Vec<u8>>,
    /// Make the next dispatch fail
    pub fail_dispatch: bool,
}

impl MockAccelerator {
    fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| f(call)).count()
    }

    pub fn allocations(&self) -> usize {
        self.count(|call| matches!(call, Call::Allocate { .. }))
    }

    pub fn writes(&self) -> usize {
        self.count(|call| matches!(call, Call::Write { .. }))
    }

    pub fn dispatches(&self) -> usize {
        self.count(|call| matches!(call, Call::Dispatch { .. }))
    }
}

impl Accelerator for MockAccelerator {
    type Buffer = MockBuffer;

    fn setup(config: &AcceleratorConfig) -> Result<Self> {
        if config.platform_index != 0 || config.device_index != 0 {
            return Err(Error::AcceleratorInit(format!(
                "no device {} on platform {}",
                config.device_index, config.platform_index
            )));
        }
        Ok(Self::default())
    }

    fn allocate(&mut self, bytes: usize, access: BufferAccess) -> Result<MockBuffer> {
        let id = self.memory.len();
        self.memory.push(vec![0; bytes]);
        self.calls.push(Call::Allocate { id, bytes, access });
        Ok(MockBuffer { id })
    }

    fn write(&mut self, buffer: &MockBuffer, data: &[u8]) -> Result<()> {
        self.memory[buffer.id][..data.len()].copy_from_slice(data);
        self.calls.push(Call::Write {
            id: buffer.id,
            bytes: data.len(),
        });
        Ok(())
    }

    /// Fill the output with `[x, y, 0, 255]` pixels
    fn dispatch(&mut self, args: &[KernelArg<'_, MockBuffer>], domain: [u32; 2]) -> Result<()> {
        check_signature(args, &RENDER_KERNEL_SIGNATURE)?;
        self.calls.push(Call::Dispatch {
            domain,
            args: format!("{args:?}"),
        });
        if self.fail_dispatch {
            return Err(Error::accelerator("dispatch")(std::io::Error::new(
                std::io::ErrorKind::Other,
                "device lost",
            )));
        }

        let KernelArg::Buffer(Some(output)) = &args[8] else {
            return Err(Error::ArgumentBinding("output buffer is not allocated".to_owned()));
        };
        let [width, height] = domain;
        let memory = &mut self.memory[output.id];
        for y in 0..height {
            for x in 0..width {
                let i = 4 * (y * width + x) as usize;
                memory[i..i + 4].copy_from_slice(&[x as u8, y as u8, 0, 255]);
            }
        }
        Ok(())
    }

    fn read(&mut self, buffer: &MockBuffer, bytes: usize) -> Result<Vec<u8>> {
        self.calls.push(Call::Read {
            id: buffer.id,
            bytes,
        });
        Ok(self.memory[buffer.id][..bytes].to_vec())
    }
}
