use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

pub const VERY_SMALL: f64 = 1e-12;
pub const VERY_LARGE: f64 = 1e99;

pub fn is_zero(x: f64) -> bool {
    x.abs() < VERY_SMALL
}

pub fn is_equal(a: f64, b: f64) -> bool {
    is_zero(a - b)
}

pub fn is_greater(a: f64, b: f64) -> bool {
    a > b + VERY_SMALL
}

pub fn is_less(a: f64, b: f64) -> bool {
    a < b - VERY_SMALL
}

/// Two-component vector, used for texture/map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f64) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

/// Three-component vector, doubling as a point and as an RGB color
/// depending on call-site context, matching the original's `Vec3` reuse.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub type Point3 = Vec3;
pub type Color = Vec3;

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn fill(v: f64) -> Self {
        Self::new(v, v, v)
    }

    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub const fn unit_z() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn dot(self, o: Vec3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    pub fn length_sqr(self) -> f64 {
        self.dot(self)
    }

    pub fn length(self) -> f64 {
        self.length_sqr().sqrt()
    }

    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if is_zero(len) {
            self
        } else {
            self * (1.0 / len)
        }
    }

    pub fn near_zero(self) -> bool {
        is_zero(self.x) && is_zero(self.y) && is_zero(self.z)
    }

    pub fn hadamard(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x * o.x, self.y * o.y, self.z * o.z)
    }

    pub fn lerp(self, o: Vec3, t: f64) -> Vec3 {
        self + (o - self) * t
    }

    pub fn saturate(self) -> Vec3 {
        Vec3::new(
            self.x.clamp(0.0, 1.0),
            self.y.clamp(0.0, 1.0),
            self.z.clamp(0.0, 1.0),
        )
    }

    pub fn gamma_correct(self, gamma: f64) -> Vec3 {
        let inv = 1.0 / gamma;
        Vec3::new(
            self.x.max(0.0).powf(inv),
            self.y.max(0.0).powf(inv),
            self.z.max(0.0).powf(inv),
        )
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let c = self.saturate();
        [
            (c.x * 255.0 + 0.5) as u8,
            (c.y * 255.0 + 0.5) as u8,
            (c.z * 255.0 + 0.5) as u8,
        ]
    }

    /// Reflects `self` (an incoming direction) about `normal`.
    pub fn reflect(self, normal: Vec3) -> Vec3 {
        self - normal * (2.0 * self.dot(normal))
    }

    /// Refracts `self` (a unit incoming direction) through a surface with
    /// the given `normal` and ratio of refractive indices `eta_ratio`.
    /// Returns `None` on total internal reflection.
    pub fn refract(self, normal: Vec3, eta_ratio: f64) -> Option<Vec3> {
        let cos_theta = (-self).dot(normal).min(1.0);
        let sin2_theta_t = eta_ratio * eta_ratio * (1.0 - cos_theta * cos_theta);
        if sin2_theta_t > 1.0 {
            return None;
        }
        let cos_theta_t = (1.0 - sin2_theta_t).sqrt();
        Some(self * eta_ratio + normal * (eta_ratio * cos_theta - cos_theta_t))
    }

    pub fn random_in_unit_sphere(rng: &mut dyn rand::RngCore) -> Vec3 {
        use rand::Rng;
        loop {
            let p = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if p.length_sqr() < 1.0 {
                return p;
            }
        }
    }

    pub fn random_unit_vector(rng: &mut dyn rand::RngCore) -> Vec3 {
        Self::random_in_unit_sphere(rng).normalized()
    }

    pub fn random_in_unit_disk(rng: &mut dyn rand::RngCore) -> Vec3 {
        use rand::Rng;
        loop {
            let p = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0);
            if p.length_sqr() < 1.0 {
                return p;
            }
        }
    }

    /// Uniform direction on the hemisphere around `normal`, via rejection
    /// sampling on the unit sphere and flipping into the correct half.
    pub fn random_hemisphere_dir(normal: Vec3, rng: &mut dyn rand::RngCore) -> Vec3 {
        let d = Self::random_unit_vector(rng);
        if d.dot(normal) < 0.0 {
            -d
        } else {
            d
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, o: Vec3) {
        self.x += o.x;
        self.y += o.y;
        self.z += o.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, o: Vec3) {
        self.x -= o.x;
        self.y -= o.y;
        self.z -= o.z;
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl MulAssign<f64> for Vec3 {
    fn mul_assign(&mut self, s: f64) {
        self.x *= s;
        self.y *= s;
        self.z *= s;
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;
    fn div(self, s: f64) -> Vec3 {
        self * (1.0 / s)
    }
}

impl DivAssign<f64> for Vec3 {
    fn div_assign(&mut self, s: f64) {
        *self *= 1.0 / s;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range: {i}"),
        }
    }
}

impl IndexMut<usize> for Vec3 {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vec3 index out of range: {i}"),
        }
    }
}

/// Four-component homogeneous vector, used only as an intermediate in
/// matrix multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vec4 {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_point(p: Vec3) -> Self {
        Self::new(p.x, p.y, p.z, 1.0)
    }

    pub fn from_vector(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z, 0.0)
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_is_orthogonal() {
        let a = Vec3::unit_x();
        let b = Vec3::unit_y();
        let c = a.cross(b);
        assert!(is_zero(c.dot(a)));
        assert!(is_zero(c.dot(b)));
        assert_eq!(c, Vec3::unit_z());
    }

    #[test]
    fn reflect_about_normal() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalized();
        let n = Vec3::unit_y();
        let r = d.reflect(n);
        assert!(is_equal(r.x, d.x));
        assert!(is_equal(r.y, -d.y));
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(Vec3::zero().normalized(), Vec3::zero());
    }
}
