use glam::{Vec3, Vec4};

use crate::{
    error::{Error, Result},
    pack::records::MaterialRecord,
};

/// Handle to a material stored in a [`Scene`](crate::scene::Scene).
///
/// Two spheres holding the same id share the material, whatever the material's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

/// Discriminant written in [`MaterialRecord::tag`], shared with the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MaterialTag {
    Lambertian = 0,
    Metal = 1,
    Dielectric = 2,
}

impl TryFrom<i32> for MaterialTag {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(MaterialTag::Lambertian),
            1 => Ok(MaterialTag::Metal),
            2 => Ok(MaterialTag::Dielectric),
            other => Err(Error::UnsupportedMaterial(other)),
        }
    }
}

/// Refractive index written for materials that do not refract
pub const UNUSED_REFRACTIVE_INDEX: f32 = 1.0;
/// Albedo written for materials that do not carry one
pub const UNUSED_ALBEDO: [f32; 4] = [1.0, 1.0, 1.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Lambertian { albedo: Vec3 },
    Metal { albedo: Vec3, fuzz: f32 },
    Dielectric { refractive_index: f32 },
}

impl Material {
    pub fn lambertian(albedo: Vec3) -> Self {
        Material::Lambertian { albedo }
    }

    /// Fuzz is clamped to `[0, 1]`
    pub fn metal(albedo: Vec3, fuzz: f32) -> Self {
        Material::Metal {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    pub fn dielectric(refractive_index: f32) -> Self {
        Material::Dielectric { refractive_index }
    }

    pub fn tag(&self) -> MaterialTag {
        match self {
            Material::Lambertian { .. } => MaterialTag::Lambertian,
            Material::Metal { .. } => MaterialTag::Metal,
            Material::Dielectric { .. } => MaterialTag::Dielectric,
        }
    }

    /// Flat representation consumed by the kernel
    pub fn encode(&self) -> MaterialRecord {
        let (albedo_fuzz, refractive_index) = match *self {
            Material::Lambertian { albedo } => (albedo.extend(0.0), UNUSED_REFRACTIVE_INDEX),
            Material::Metal { albedo, fuzz } => (albedo.extend(fuzz), UNUSED_REFRACTIVE_INDEX),
            Material::Dielectric { refractive_index } => {
                (Vec4::from(UNUSED_ALBEDO), refractive_index)
            }
        };
        MaterialRecord::new(albedo_fuzz, self.tag(), refractive_index)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::{Material, MaterialTag};
    use crate::error::Error;

    #[test]
    fn lambertian_encoding() {
        let record = Material::lambertian(Vec3::new(0.6, 0.5, 0.2)).encode();
        assert_eq!(record.albedo_fuzz, Vec4::new(0.6, 0.5, 0.2, 0.0));
        assert_eq!(record.tag, MaterialTag::Lambertian as i32);
        assert_eq!(record.refractive_index, 1.0);
    }

    #[test]
    fn metal_encoding_carries_fuzz() {
        let record = Material::metal(Vec3::splat(0.9), 0.25).encode();
        assert_eq!(record.albedo_fuzz, Vec4::new(0.9, 0.9, 0.9, 0.25));
        assert_eq!(record.tag, MaterialTag::Metal as i32);
        assert_eq!(record.refractive_index, 1.0);
    }

    #[test]
    fn metal_fuzz_is_clamped() {
        assert_eq!(
            Material::metal(Vec3::ONE, 3.0),
            Material::Metal {
                albedo: Vec3::ONE,
                fuzz: 1.0
            }
        );
        assert_eq!(
            Material::metal(Vec3::ONE, -1.0),
            Material::Metal {
                albedo: Vec3::ONE,
                fuzz: 0.0
            }
        );
    }

    #[test]
    fn dielectric_encoding() {
        let record = Material::dielectric(1.5).encode();
        assert_eq!(record.albedo_fuzz, Vec4::new(1.0, 1.0, 1.0, 0.0));
        assert_eq!(record.tag, MaterialTag::Dielectric as i32);
        assert_eq!(record.refractive_index, 1.5);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(MaterialTag::try_from(1).unwrap(), MaterialTag::Metal);
        assert!(matches!(
            MaterialTag::try_from(7),
            Err(Error::UnsupportedMaterial(7))
        ));
    }
}
