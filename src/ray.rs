use crate::math::{is_zero, Vec3};

/// Minimum offset applied when spawning a secondary ray from a hit point,
/// to avoid immediate self-intersection from floating-point error.
pub const RAY_MOVEOUT: f64 = 1e-9;

/// A traced ray: origin, direction, the valid `[min_length, max_length]`
/// parametric range, recursion `depth`, and a `time` sample for callers
/// that want to extend the model to motion blur (unused by this crate's
/// static scenes, carried for data-model completeness).
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub base: Vec3,
    pub dir: Vec3,
    pub min_length: f64,
    pub max_length: f64,
    pub time: f64,
    pub depth: u32,
}

impl Ray {
    pub fn new(base: Vec3, dir: Vec3) -> Self {
        Self {
            base,
            dir,
            min_length: RAY_MOVEOUT,
            max_length: f64::MAX,
            time: 0.0,
            depth: 0,
        }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.base + self.dir * t
    }

    pub fn in_range(&self, t: f64) -> bool {
        t >= self.min_length && t <= self.max_length
    }

    /// Spawns a secondary ray from `hit_point` along `dir`, offset by
    /// `RAY_MOVEOUT` to avoid immediate re-intersection with the surface
    /// that spawned it.
    pub fn spawn(hit_point: Vec3, dir: Vec3, depth: u32) -> Self {
        let mut r = Ray::new(hit_point, dir);
        r.depth = depth;
        r
    }

    pub fn calc_hit_point(&self, distance: f64) -> Vec3 {
        self.at(distance)
    }
}

/// Reflects an incoming unit direction about a unit normal.
pub fn calc_reflect(dir: Vec3, normal: Vec3) -> Vec3 {
    dir - normal * (2.0 * dir.dot(normal))
}

/// Refracts an incoming unit direction through a surface with the given
/// normal and index-of-refraction ratio `eta` (incident-side / transmitted-side).
/// Returns `None` on total internal reflection.
pub fn calc_transmit_result(dir: Vec3, normal: Vec3, eta: f64) -> Option<Vec3> {
    let cos_i = -dir.dot(normal);
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
    if sin2_t > 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let result = dir * eta + normal * (eta * cos_i - cos_t);
    if result.near_zero() && is_zero(sin2_t) {
        Some(Vec3::zero())
    } else {
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_advances_along_direction() {
        let r = Ray::new(Vec3::zero(), Vec3::unit_z());
        assert_eq!(r.at(3.0), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn in_range_respects_bounds() {
        let mut r = Ray::new(Vec3::zero(), Vec3::unit_z());
        r.min_length = 1.0;
        r.max_length = 5.0;
        assert!(!r.in_range(0.5));
        assert!(r.in_range(2.0));
        assert!(!r.in_range(6.0));
    }

    #[test]
    fn reflect_flips_normal_component() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalized();
        let n = Vec3::unit_y();
        let r = calc_reflect(d, n);
        assert!((r.y + d.y).abs() < 1e-9);
    }
}
