use glam::Vec3;
use rand::Rng;

use crate::{
    error::Result,
    material::Material,
    scene::{Scene, Sphere},
};

/// A light, a mirror ball and a jittered grid of small spheres resting on a huge ground sphere.
pub struct SpheresScene;

impl SpheresScene {
    pub fn insert_into<R: Rng>(scene: &mut Scene, rng: &mut R) -> Result<()> {
        let light = scene.insert_material(Material::lambertian(Vec3::new(0.9, 0.3, 0.2)));
        scene.insert_sphere(
            Sphere::new(Vec3::new(-4.0, 5.0, -3.0), 0.5, light).with_emission(Vec3::splat(50.0)),
        )?;

        let mirror = scene.insert_material(Material::metal(Vec3::splat(0.9), 0.0));
        scene.insert_sphere(Sphere::new(Vec3::new(0.0, 1.0, -3.0), 1.0, mirror))?;

        for a in -5..5 {
            for b in -5..5 {
                let choose_mat: f32 = rng.gen();
                let center = Vec3::new(
                    a as f32 + 1.5 * rng.gen::<f32>(),
                    0.2,
                    -5.0 + b as f32 + 0.9 * rng.gen::<f32>(),
                );
                if center.distance(Vec3::new(4.0, 0.2, 0.0)) <= 0.9 {
                    continue;
                }

                let albedo = Vec3::new(rng.gen(), rng.gen(), rng.gen());
                if choose_mat < 0.3 {
                    let diffuse = scene.insert_material(Material::lambertian(albedo));
                    scene.insert_sphere(Sphere::new(center, 0.3, diffuse))?;
                } else if choose_mat < 0.95 {
                    let fuzz = rng.gen_range(0.0..0.5);
                    let metal = scene.insert_material(Material::metal(albedo, fuzz));
                    scene.insert_sphere(Sphere::new(center, 0.2, metal))?;
                } else {
                    let glass = scene.insert_material(Material::dielectric(1.5));
                    scene.insert_sphere(Sphere::new(center, 0.2, glass))?;
                }
            }
        }

        let ground = scene.insert_material(Material::lambertian(Vec3::splat(0.5)));
        scene.insert_sphere(Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::SpheresScene;
    use crate::scene::Scene;

    #[test]
    fn every_sphere_owns_its_material() {
        let mut scene = Scene::new();
        SpheresScene::insert_into(&mut scene, &mut StdRng::seed_from_u64(0)).unwrap();

        assert!(scene.sphere_count() > 2);
        assert_eq!(scene.sphere_count(), scene.material_count());
    }

    #[test]
    fn same_seed_same_scene() {
        let mut a = Scene::new();
        let mut b = Scene::new();
        SpheresScene::insert_into(&mut a, &mut StdRng::seed_from_u64(7)).unwrap();
        SpheresScene::insert_into(&mut b, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.spheres(), b.spheres());
        assert_eq!(a.materials(), b.materials());
    }
}
