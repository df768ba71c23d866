pub mod examples;

use glam::Vec3;

use crate::{
    error::{Error, Result},
    material::{Material, MaterialId},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    emission: Vec3,
    material: MaterialId,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: MaterialId) -> Self {
        Self {
            center,
            radius,
            emission: Vec3::ZERO,
            material,
        }
    }

    /// Light emitted by the sphere, added on top of what its material scatters
    pub fn with_emission(self, emission: Vec3) -> Self {
        Self { emission, ..self }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn emission(&self) -> Vec3 {
        self.emission
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }
}

/// Spheres and the materials they reference.
///
/// Materials live in an arena and are referenced through [`MaterialId`]s, so several spheres can
/// share one material. The scene only grows; it is read-only while a frame is rendered.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    spheres: Vec<Sphere>,
    materials: Vec<Material>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a material and returns the Material ID associated with this material
    pub fn insert_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Insert a sphere in the scene.
    ///
    /// Fails if the sphere's material was not inserted in this scene.
    pub fn insert_sphere(&mut self, sphere: Sphere) -> Result<()> {
        self.material(sphere.material)?;
        self.spheres.push(sphere);
        Ok(())
    }

    pub fn material(&self, id: MaterialId) -> Result<&Material> {
        self.materials.get(id.0).ok_or(Error::InvalidMaterial(id))
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
