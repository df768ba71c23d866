use std::{fmt::Display, path::PathBuf, str::FromStr};

use clap::Parser;

#[derive(Parser, Debug)]
pub struct Args {
    #[arg(short, long, default_value = "1920x1080")]
    /// Screen dimension in format `width`x`height`
    pub dimensions: Dimensions,

    #[arg(long = "spp", default_value_t = 20)]
    /// Samples per pixel
    pub samples_per_pixel: u32,

    #[arg(long, default_value_t = 50)]
    /// Maximum number of bounces of a ray
    pub max_depth: u32,

    #[arg(long, default_value_t = 0)]
    /// Platform index, devices are grouped into platforms by vendor
    pub platform: usize,

    #[arg(long, default_value_t = 0)]
    /// Device index within the platform
    pub device: usize,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    /// Kernel compiler flags, e.g. "-O -DFOO=1"
    pub build_options: String,

    #[arg(long)]
    /// Directory to load the kernel sources from instead of the built-in ones
    pub kernels: Option<PathBuf>,

    #[arg(long, default_value_t)]
    /// Seed to use for all the random stuff, scene generation included
    pub seed: u64,

    #[arg(short, long)]
    /// Output file. Defaults to `render.ppm` in the nearest `images` directory
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    /// Number of frames to render, each one to its own file when more than one
    pub frames: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Dimensions {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((a, b)) = s.split_once('x') else {
            return Err(anyhow::anyhow!("Incorrect format, see help"));
        };
        let width: u32 = a.parse()?;
        let height: u32 = b.parse()?;

        Ok(Dimensions { width, height })
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}x{}", self.width, self.height))
    }
}
