//! Thin-lens camera projection, following the original's `Renderer::init`
//! vector derivation: an orthonormal basis built from `eye`/`coi`/`vup`,
//! a screen half-extent from the field of view, and optional depth-of-
//! field via aperture-disk jitter of the ray origin.

use crate::error::SceneError;
use crate::math::Vec3;
use crate::ray::Ray;

#[derive(Clone)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub coi: Vec3,
    pub vup: Vec3,
    pub fov_degrees: f64,
    pub aspect: f64,
    pub aperture: f64,
    pub focal_length: Option<f64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            coi: Vec3::zero(),
            vup: Vec3::unit_y(),
            fov_degrees: 45.0,
            aspect: 1.0,
            aperture: 0.0,
            focal_length: None,
        }
    }
}

pub struct Camera {
    eye: Vec3,
    vcenter: Vec3,
    pixel_x: Vec3,
    pixel_y: Vec3,
    vside: Vec3,
    vtop: Vec3,
    aperture_radius: f64,
}

impl Camera {
    pub fn init(cfg: &CameraConfig) -> Result<Self, SceneError> {
        let vnormal = (cfg.coi - cfg.eye).normalized();
        if vnormal.near_zero() {
            return Err(SceneError::DegenerateVup);
        }
        let vup = cfg.vup.normalized();
        let vnvup_dot = vnormal.dot(vup);
        if crate::math::is_equal(vnvup_dot.abs(), 1.0) {
            return Err(SceneError::DegenerateVup);
        }
        let vside = vnormal.cross(vup).normalized();
        let vtop = vside.cross(vnormal).normalized();

        let focal_len = cfg.focal_length.unwrap_or_else(|| (cfg.coi - cfg.eye).length());
        let half_height = (cfg.fov_degrees.to_radians() * 0.5).tan() * focal_len;
        let half_width = half_height * cfg.aspect;

        let vcenter_full = cfg.eye + vnormal * focal_len;
        let pixel_x = vside * (2.0 * half_width);
        let pixel_y = vtop * (-2.0 * half_height);
        let top_left = vcenter_full - vside * half_width + vtop * half_height;

        Ok(Self {
            eye: cfg.eye,
            vcenter: top_left,
            pixel_x,
            pixel_y,
            vside,
            vtop,
            aperture_radius: cfg.aperture * 0.5,
        })
    }

    /// Generates a primary ray for normalized film coordinates `(u, v)`
    /// in `[0, 1]^2` (origin top-left), optionally jittered across the
    /// aperture disk for depth of field.
    pub fn generate_ray(&self, u: f64, v: f64, rng: &mut dyn rand::RngCore) -> Ray {
        let film_pt = self.vcenter + self.pixel_x * u + self.pixel_y * v;
        if self.aperture_radius <= 0.0 {
            return Ray::new(self.eye, (film_pt - self.eye).normalized());
        }
        let disk = Vec3::random_in_unit_disk(rng) * self.aperture_radius;
        let lens_origin = self.eye + self.vside * disk.x + self.vtop * disk.y;
        Ray::new(lens_origin, (film_pt - lens_origin).normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_pixel_points_toward_coi() {
        let cfg = CameraConfig { eye: Vec3::new(0.0, 0.0, 5.0), coi: Vec3::zero(), ..Default::default() };
        let cam = Camera::init(&cfg).unwrap();
        let mut rng = rand::thread_rng();
        let ray = cam.generate_ray(0.5, 0.5, &mut rng);
        assert!(ray.dir.dot(Vec3::new(0.0, 0.0, -1.0)) > 0.99);
    }

    #[test]
    fn degenerate_vup_is_rejected() {
        let cfg = CameraConfig {
            eye: Vec3::new(0.0, 0.0, 5.0),
            coi: Vec3::zero(),
            vup: Vec3::new(0.0, 0.0, 1.0),
            ..Default::default()
        };
        assert!(Camera::init(&cfg).is_err());
    }
}
