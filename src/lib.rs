//! Host side of a GPU sphere renderer.
//!
//! A [`Scene`] of spheres and materials is seen through a [`Camera`], packed into flat
//! records, uploaded to an [`Accelerator`] and rendered by a compute kernel. The resulting
//! frame is read back and handed to every registered [`FrameOutput`].

pub mod accelerator;
pub mod backend;
pub mod buffers;
pub mod camera;
pub mod config;
pub mod error;
pub mod material;
pub mod output;
pub mod pack;
pub mod scene;
pub mod utils;

pub use accelerator::{Accelerator, VulkanAccelerator};
pub use backend::Backend;
pub use camera::{Camera, CameraConfig};
pub use config::{AcceleratorConfig, Config};
pub use error::{Error, Result};
pub use material::{Material, MaterialId};
pub use output::{FrameOutput, PpmOutput};
pub use scene::{Scene, Sphere};
