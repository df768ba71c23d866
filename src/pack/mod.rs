pub mod records;

use crate::{
    camera::Camera,
    error::{Error, Result},
    scene::Scene,
};

pub use records::{CameraRecord, MaterialRecord, SphereRecord, PIXEL_RECORD_SIZE};

/// Flat copy of a scene, ready to be uploaded to the accelerator
#[derive(Debug, Clone, PartialEq)]
pub struct PackedScene {
    pub camera: CameraRecord,
    pub spheres: Vec<SphereRecord>,
    pub materials: Vec<MaterialRecord>,
}

impl PackedScene {
    pub fn camera_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.camera)
    }

    pub fn sphere_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.spheres)
    }

    pub fn material_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.materials)
    }
}

/// Flatten `scene` and `camera`.
///
/// Materials are emitted in the order spheres first reference them, once per [`MaterialId`]:
/// materials the scene holds but no sphere uses are left out. The output only depends on the
/// inputs, so packing twice gives the same bytes.
///
/// [`MaterialId`]: crate::material::MaterialId
pub fn pack(scene: &Scene, camera: &Camera) -> Result<PackedScene> {
    // indexed by MaterialId
    let mut material_index: Vec<Option<i32>> = vec![None; scene.material_count()];
    let mut materials = Vec::new();
    let mut spheres = Vec::with_capacity(scene.sphere_count());

    for sphere in scene.spheres() {
        let id = sphere.material();
        let slot = material_index
            .get_mut(id.0)
            .ok_or(Error::InvalidMaterial(id))?;

        let index = match *slot {
            Some(index) => index,
            None => {
                let index = materials.len() as i32;
                materials.push(scene.material(id)?.encode());
                *slot = Some(index);
                index
            }
        };

        spheres.push(SphereRecord::new(
            sphere.center(),
            sphere.radius(),
            sphere.emission(),
            index,
        ));
    }

    Ok(PackedScene {
        camera: CameraRecord::from_camera(camera),
        spheres,
        materials,
    })
}
