use glam::Vec3;

use crate::error::{Error, Result};

/// Below this length a vector is considered null when building the camera basis
const BASIS_EPSILON: f32 = 1e-6;

/// View parameters of a [`Camera`].
///
/// Nothing is derived here; call [`CameraConfig::build`] to get a usable camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical view angle, in degrees
    pub vertical_fov: f32,
    pub look_from: Vec3,
    pub look_at: Vec3,
    /// Camera-relative "up" direction
    pub up: Vec3,
    /// Distance from `look_from` to the plane of perfect focus
    pub focus_distance: f32,
    /// Width of the image, in pixel
    pub image_width: u32,
    /// Ratio of image width over height
    pub aspect_ratio: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            vertical_fov: 90.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            up: Vec3::Y,
            focus_distance: 1.0,
            image_width: 100,
            aspect_ratio: 1.0,
        }
    }
}

impl CameraConfig {
    pub fn with_vertical_fov(self, vertical_fov: f32) -> Self {
        Self {
            vertical_fov,
            ..self
        }
    }

    pub fn with_look_from(self, look_from: Vec3) -> Self {
        Self { look_from, ..self }
    }

    pub fn with_look_at(self, look_at: Vec3) -> Self {
        Self { look_at, ..self }
    }

    pub fn with_up(self, up: Vec3) -> Self {
        Self { up, ..self }
    }

    pub fn with_focus_distance(self, focus_distance: f32) -> Self {
        Self {
            focus_distance,
            ..self
        }
    }

    pub fn with_image(self, image_width: u32, aspect_ratio: f32) -> Self {
        Self {
            image_width,
            aspect_ratio,
            ..self
        }
    }

    /// Derive the viewing basis and the per-pixel geometry.
    pub fn build(self) -> Result<Camera> {
        if self.image_width == 0 {
            return Err(Error::DegenerateCamera("image width is zero"));
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(Error::DegenerateCamera("aspect ratio must be positive"));
        }

        let image_height = ((self.image_width as f32 / self.aspect_ratio).round() as u32).max(1);

        let theta = self.vertical_fov.to_radians();
        let viewport_height = 2.0 * f32::tan(theta / 2.0) * self.focus_distance;
        let viewport_width = viewport_height * (self.image_width as f32 / image_height as f32);

        let forward = self.look_from - self.look_at;
        if forward.length() < BASIS_EPSILON {
            return Err(Error::DegenerateCamera("look_from and look_at coincide"));
        }
        let w = forward.normalize();
        let side = self.up.cross(w);
        if side.length() < BASIS_EPSILON {
            return Err(Error::DegenerateCamera(
                "up vector is parallel to the view direction",
            ));
        }
        let u = side.normalize();
        let v = w.cross(u);

        // Going down the image means going down in world space
        let viewport_x = viewport_width * u;
        let viewport_y = -viewport_height * v;

        let pixel_delta_x = viewport_x / self.image_width as f32;
        let pixel_delta_y = viewport_y / image_height as f32;

        let origin = self.look_from;
        let viewport_upper_left =
            origin - self.focus_distance * w - viewport_x / 2.0 - viewport_y / 2.0;
        let pixel00 = viewport_upper_left + 0.5 * (pixel_delta_x + pixel_delta_y);

        Ok(Camera {
            config: self,
            image_height,
            origin,
            u,
            v,
            w,
            pixel_delta_x,
            pixel_delta_y,
            pixel00,
        })
    }
}

/// A camera whose derived state matches its [`CameraConfig`].
///
/// To move the camera, change a copy of [`Camera::config`] and build it again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    config: CameraConfig,
    image_height: u32,
    origin: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    pixel_delta_x: Vec3,
    pixel_delta_y: Vec3,
    pixel00: Vec3,
}

impl Camera {
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn image_width(&self) -> u32 {
        self.config.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Orthonormal basis: `u` points right, `v` up and `w` backward
    pub fn basis(&self) -> [Vec3; 3] {
        [self.u, self.v, self.w]
    }

    /// Offset from a pixel center to the next one on the right
    pub fn pixel_delta_x(&self) -> Vec3 {
        self.pixel_delta_x
    }

    /// Offset from a pixel center to the one below
    pub fn pixel_delta_y(&self) -> Vec3 {
        self.pixel_delta_y
    }

    /// World-space center of the top-left pixel
    pub fn pixel00(&self) -> Vec3 {
        self.pixel00
    }
}
