use std::path::PathBuf;

use crate::error::{Error, Result};

/// Device selection and kernel build settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceleratorConfig {
    /// Index of the platform (devices grouped by vendor) to use
    pub platform_index: usize,
    /// Index of the device within the platform
    pub device_index: usize,
    /// Passed verbatim to the kernel compiler, e.g. `-O -DNO_SKY`
    pub build_options: String,
    /// Directory to read the kernel sources from instead of the ones built in
    pub kernel_dir: Option<PathBuf>,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    /// Seed of the per-frame random numbers handed to the kernel
    pub seed: u64,
    pub accelerator: AcceleratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            seed: 0,
            accelerator: AcceleratorConfig {
                samples_per_pixel: 100,
                max_depth: 50,
                ..Default::default()
            },
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.accelerator.samples_per_pixel == 0 {
            return Err(Error::InvalidConfig(
                "samples per pixel must be positive".to_owned(),
            ));
        }
        if self.accelerator.max_depth == 0 {
            return Err(Error::InvalidConfig("max depth must be positive".to_owned()));
        }
        Ok(())
    }
}
