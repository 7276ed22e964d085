use crate::math::{Matrix, Vec3};
use crate::ray::Ray;
use std::sync::Arc;

/// Object-to-world / world-to-object transform pair. `base` is the
/// transform contributed by this node alone; `final_` folds in every
/// ancestor's transform (`final = base * parent.final`) unless
/// `no_parent` is set, in which case this node ignores its ancestry and
/// is anchored directly in world space (used by lights and unbounded
/// background shaders).
#[derive(Debug, Clone)]
pub struct Transform {
    pub base: Matrix,
    pub final_: Matrix,
    pub final_inv: Matrix,
    pub no_parent: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            base: Matrix::identity(),
            final_: Matrix::identity(),
            final_inv: Matrix::identity(),
            no_parent: false,
        }
    }
}

impl Transform {
    pub fn new(base: Matrix) -> Self {
        Self {
            base,
            final_: Matrix::identity(),
            final_inv: Matrix::identity(),
            no_parent: false,
        }
    }

    /// Recomputes `final_`/`final_inv` from `base` and an optional parent
    /// transform. Returns `Err` if the resulting matrix is singular.
    pub fn init(&mut self, parent: Option<&Arc<Transform>>) -> Result<(), crate::error::SceneError> {
        self.final_ = match parent {
            Some(p) if !self.no_parent => self.base * p.final_,
            _ => self.base,
        };
        self.final_inv = self
            .final_
            .inverse()
            .ok_or_else(|| crate::error::SceneError::SingularTransform)?;
        Ok(())
    }

    pub fn point_local_to_global(&self, p: Vec3) -> Vec3 {
        self.final_.mul_point(p)
    }

    pub fn point_global_to_local(&self, p: Vec3) -> Vec3 {
        self.final_inv.mul_point(p)
    }

    pub fn vector_local_to_global(&self, v: Vec3) -> Vec3 {
        self.final_.mul_vector(v)
    }

    pub fn vector_global_to_local(&self, v: Vec3) -> Vec3 {
        self.final_inv.mul_vector(v)
    }

    /// Normals transform by the inverse-transpose, so that non-uniform
    /// scale doesn't skew them off the surface.
    pub fn normal_local_to_global(&self, n: Vec3) -> Vec3 {
        self.final_inv.transpose().mul_vector(n).normalized()
    }

    pub fn ray_local_base(&self, base: Vec3) -> Vec3 {
        self.point_global_to_local(base)
    }

    pub fn ray_local_dir(&self, dir: Vec3) -> Vec3 {
        self.vector_global_to_local(dir)
    }

    pub fn ray_to_local(&self, ray: &Ray) -> Ray {
        let mut local = *ray;
        local.base = self.ray_local_base(ray.base);
        local.dir = self.ray_local_dir(ray.dir);
        local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::is_equal;

    #[test]
    fn identity_transform_is_noop() {
        let mut t = Transform::default();
        t.init(None).unwrap();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(t.point_local_to_global(p), p);
    }

    #[test]
    fn translation_round_trips_through_local() {
        let mut t = Transform::new(Matrix::translation(Vec3::new(1.0, 0.0, 0.0)));
        t.init(None).unwrap();
        let world = Vec3::new(5.0, 5.0, 5.0);
        let local = t.point_global_to_local(world);
        assert!(is_equal(local.x, 4.0));
        let back = t.point_local_to_global(local);
        assert!(is_equal(back.x, world.x));
    }

    #[test]
    fn parent_chain_composes() {
        let parent = Arc::new({
            let mut p = Transform::new(Matrix::translation(Vec3::new(10.0, 0.0, 0.0)));
            p.init(None).unwrap();
            p
        });
        let mut child = Transform::new(Matrix::translation(Vec3::new(1.0, 0.0, 0.0)));
        child.init(Some(&parent)).unwrap();
        let world = child.point_local_to_global(Vec3::zero());
        assert!(is_equal(world.x, 11.0));
    }

    #[test]
    fn no_parent_ignores_ancestry() {
        let parent = Arc::new({
            let mut p = Transform::new(Matrix::translation(Vec3::new(10.0, 0.0, 0.0)));
            p.init(None).unwrap();
            p
        });
        let mut child = Transform::new(Matrix::translation(Vec3::new(1.0, 0.0, 0.0)));
        child.no_parent = true;
        child.init(Some(&parent)).unwrap();
        let world = child.point_local_to_global(Vec3::zero());
        assert!(is_equal(world.x, 1.0));
    }
}
