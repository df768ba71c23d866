//! Records shared with the kernel.
//!
//! Layouts follow std430 rules on the kernel side: every record is a multiple of 16 bytes and
//! starts with a `vec4`, so arrays of records keep every `vec4` 16-byte aligned.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::{camera::Camera, error::Result, material::MaterialTag};

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct CameraRecord {
    pub origin: Vec4,
    pub pixel_delta_x: Vec4,
    pub pixel_delta_y: Vec4,
    pub pixel00: Vec4,
}

impl CameraRecord {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            origin: camera.origin().extend(0.0),
            pixel_delta_x: camera.pixel_delta_x().extend(0.0),
            pixel_delta_y: camera.pixel_delta_y().extend(0.0),
            pixel00: camera.pixel00().extend(0.0),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct MaterialRecord {
    /// xyz albedo, w fuzz (metals only)
    pub albedo_fuzz: Vec4,
    /// A [`MaterialTag`]
    pub tag: i32,
    /// Dielectrics only
    pub refractive_index: f32,
    pub _pad: [i32; 2],
}

impl MaterialRecord {
    pub fn new(albedo_fuzz: Vec4, tag: MaterialTag, refractive_index: f32) -> Self {
        Self {
            albedo_fuzz,
            tag: tag as i32,
            refractive_index,
            _pad: [0; 2],
        }
    }

    pub fn material_tag(&self) -> Result<MaterialTag> {
        MaterialTag::try_from(self.tag)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct SphereRecord {
    /// xyz center, w radius
    pub center_radius: Vec4,
    /// xyz emission, w unused
    pub emission: Vec4,
    pub material_index: i32,
    pub _pad: [i32; 3],
}

impl SphereRecord {
    pub fn new(center: Vec3, radius: f32, emission: Vec3, material_index: i32) -> Self {
        Self {
            center_radius: center.extend(radius),
            emission: emission.extend(0.0),
            material_index,
            _pad: [0; 3],
        }
    }
}

/// One RGBA8 pixel as written by the kernel
pub const PIXEL_RECORD_SIZE: usize = 4;

const _: () = assert!(std::mem::size_of::<CameraRecord>() == 64);
const _: () = assert!(std::mem::size_of::<MaterialRecord>() == 32);
const _: () = assert!(std::mem::size_of::<SphereRecord>() == 48);
const _: () = assert!(std::mem::align_of::<CameraRecord>() == 16);
const _: () = assert!(std::mem::align_of::<MaterialRecord>() == 16);
const _: () = assert!(std::mem::align_of::<SphereRecord>() == 16);
