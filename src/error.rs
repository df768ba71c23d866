use std::path::PathBuf;

use thiserror::Error;

use crate::material::MaterialId;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("sphere references material {0:?}, which is not part of the scene")]
    InvalidMaterial(MaterialId),

    #[error("material tag {0} is not supported by the packer")]
    UnsupportedMaterial(i32),

    #[error("degenerate camera: {0}")]
    DegenerateCamera(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to initialize the accelerator: {0}")]
    AcceleratorInit(String),

    #[error("an image of {width}x{height} pixels does not fit in an accelerator buffer")]
    ImageTooLarge { width: u32, height: u32 },

    #[error("kernel arguments do not match the program signature: {0}")]
    ArgumentBinding(String),

    #[error("accelerator failure during {stage}")]
    Accelerator {
        stage: &'static str,
        #[source]
        source: BoxedError,
    },

    #[error("could not write image to {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an accelerator-reported error, for use with `map_err`
    pub fn accelerator<E>(stage: &'static str) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |err| Error::Accelerator {
            stage,
            source: Box::new(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
