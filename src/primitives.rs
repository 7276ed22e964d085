//! Primitive intersection, normal, bound, and hit-cost routines. Each
//! primitive is a unit-sized shape living in its own local coordinate
//! frame (`[-1,1]` extents or the unit sphere/cylinder/etc.), scaled and
//! positioned into the scene by its owning object's `Transform`.

use crate::bbox::BBox;
use crate::hit::HitType;
use crate::math::{is_zero, roots, Vec2, Vec3};
use crate::ray::Ray;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Sphere,
    Cube,
    Cylinder,
    Cone,
    Disc,
    Plane,
    Paraboloid,
    Torus { hole_radius: f64 },
    /// Extruded `sides`-gon, bounded to `[-1,1]` in Z.
    Prism { sides: u32 },
}

/// One local-frame intersection: parametric distance, a primitive-defined
/// side index (for multi-surface primitives, drives the map/normal
/// lookup), and whether the ray enters or exits the solid at this point.
#[derive(Debug, Clone, Copy)]
pub struct LocalHit {
    pub distance: f64,
    pub side: i32,
    pub kind: HitType,
}

impl Primitive {
    pub fn hit_cost(&self) -> f64 {
        match self {
            Primitive::Sphere => 1.0,
            Primitive::Cube => 1.2,
            Primitive::Cylinder => 1.7,
            Primitive::Cone => 1.5,
            Primitive::Disc => 0.9,
            Primitive::Plane => 0.85,
            Primitive::Paraboloid => 1.3,
            Primitive::Torus { .. } => 7.0,
            Primitive::Prism { .. } => 1.4,
        }
    }

    pub fn local_bound(&self) -> BBox {
        match self {
            Primitive::Sphere => BBox::new(Vec3::fill(-1.0), Vec3::fill(1.0)),
            Primitive::Cube => BBox::new(Vec3::fill(-1.0), Vec3::fill(1.0)),
            Primitive::Cylinder => BBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
            Primitive::Cone => BBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
            Primitive::Disc => BBox::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)),
            // Unbounded in x/y: a finite box here would let the BVH cull
            // rays that do hit the infinite plane.
            Primitive::Plane => BBox::new(
                Vec3::new(-crate::math::VERY_LARGE, -crate::math::VERY_LARGE, 0.0),
                Vec3::new(crate::math::VERY_LARGE, crate::math::VERY_LARGE, 0.0),
            ),
            Primitive::Paraboloid => BBox::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            Primitive::Torus { hole_radius } => {
                let r = 1.0 + hole_radius;
                let h = hole_radius.min(1.0);
                BBox::new(Vec3::new(-r, -r, -h), Vec3::new(r, r, h))
            }
            Primitive::Prism { .. } => BBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
        }
    }

    /// Intersects a ray already transformed into this primitive's local
    /// frame. Returns every candidate hit sorted by ascending distance.
    ///
    /// `csg` mirrors `HitList.csg`: when true, every contiguous solid
    /// interval along the ray is reported as an `ENTER` followed by an
    /// `EXIT`, so the CSG insideness algebra has boundary events to
    /// count. When false, hits are tagged `NORMAL` and the caller (via
    /// `HitList::find_first_in_range`) picks the nearest one in range.
    pub fn intersect(&self, ray: &Ray, csg: bool) -> Vec<LocalHit> {
        match self {
            Primitive::Sphere => intersect_sphere(ray, csg),
            Primitive::Cube => intersect_cube(ray),
            Primitive::Cylinder => intersect_cylinder(ray, csg),
            Primitive::Cone => intersect_cone(ray, csg),
            Primitive::Disc => intersect_disc(ray),
            Primitive::Plane => intersect_plane(ray, csg),
            Primitive::Paraboloid => intersect_paraboloid(ray, csg),
            Primitive::Torus { hole_radius } => intersect_torus(ray, *hole_radius, csg),
            Primitive::Prism { sides } => intersect_prism(ray, *sides),
        }
    }

    pub fn normal(&self, local_pt: Vec3, side: i32) -> Vec3 {
        match self {
            Primitive::Sphere => local_pt.normalized(),
            Primitive::Cube => cube_normal(side),
            Primitive::Cylinder => cylinder_normal(local_pt, side),
            Primitive::Cone => cone_normal(local_pt, side),
            Primitive::Disc => Vec3::unit_z(),
            Primitive::Plane => Vec3::unit_z(),
            Primitive::Paraboloid => paraboloid_normal(local_pt, side),
            Primitive::Torus { hole_radius } => torus_normal(local_pt, *hole_radius),
            Primitive::Prism { sides } => prism_normal(local_pt, *sides, side),
        }
    }

    /// Projects a local hit point into `(u, v)` texture-map space, side
    /// dependent for primitives with more than one surface.
    pub fn map(&self, local_pt: Vec3, side: i32) -> Vec2 {
        match self {
            Primitive::Sphere => {
                let theta = local_pt.z.clamp(-1.0, 1.0).acos();
                let phi = local_pt.y.atan2(local_pt.x);
                Vec2::new(phi / (2.0 * std::f64::consts::PI) + 0.5, theta / std::f64::consts::PI)
            }
            Primitive::Cube | Primitive::Prism { .. } => match side {
                0 | 1 => Vec2::new(local_pt.y, local_pt.z),
                2 | 3 => Vec2::new(local_pt.x, local_pt.z),
                _ => Vec2::new(local_pt.x, local_pt.y),
            },
            _ => Vec2::new(local_pt.x, local_pt.y),
        }
    }
}

/// Retags a sorted run of candidate crossings of a single closed surface
/// as alternating `ENTER`/`EXIT` pairs. A closed, orientable surface
/// (sphere, capped cylinder/cone/paraboloid, torus) always crosses a
/// ray an even number of times; an odd leftover is a grazing tangency
/// and is left `NORMAL` rather than unbalancing the insideness count.
fn tag_closed_solid(mut hits: Vec<LocalHit>) -> Vec<LocalHit> {
    hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
    let paired = hits.len() / 2 * 2;
    for (i, h) in hits[..paired].iter_mut().enumerate() {
        h.kind = if i % 2 == 0 { HitType::Enter } else { HitType::Exit };
    }
    hits
}

// ---- Sphere: |p + t*d|^2 = 1 ----
fn intersect_sphere(ray: &Ray, csg: bool) -> Vec<LocalHit> {
    let a = ray.dir.length_sqr();
    let b = 2.0 * ray.base.dot(ray.dir);
    let c = ray.base.length_sqr() - 1.0;
    let hits: Vec<LocalHit> = roots::solve_quadric(b / a, c / a)
        .into_iter()
        .map(|t| LocalHit { distance: t, side: 0, kind: HitType::Normal })
        .collect();
    if csg {
        tag_closed_solid(hits)
    } else {
        hits
    }
}

// ---- Plane: z = 0, infinite in x/y; `Disc` reuses this and adds a radius
// clip. Not a closed solid: the half-space `z <= 0` extends to infinity,
// so in CSG mode the far endpoint of whichever event is missing is
// synthesized at `VERY_LARGE` rather than left unpaired. ----
fn intersect_plane(ray: &Ray, csg: bool) -> Vec<LocalHit> {
    use crate::math::VERY_LARGE;
    if is_zero(ray.dir.z) {
        if csg && ray.base.z <= 0.0 {
            return vec![
                LocalHit { distance: -VERY_LARGE, side: 0, kind: HitType::Enter },
                LocalHit { distance: VERY_LARGE, side: 0, kind: HitType::Exit },
            ];
        }
        return Vec::new();
    }
    let t = -ray.base.z / ray.dir.z;
    if !csg {
        return vec![LocalHit { distance: t, side: 0, kind: HitType::Normal }];
    }
    if ray.dir.z < 0.0 {
        vec![
            LocalHit { distance: t, side: 0, kind: HitType::Enter },
            LocalHit { distance: VERY_LARGE, side: 0, kind: HitType::Exit },
        ]
    } else {
        vec![
            LocalHit { distance: -VERY_LARGE, side: 0, kind: HitType::Enter },
            LocalHit { distance: t, side: 0, kind: HitType::Exit },
        ]
    }
}

/// A disc is a flat, zero-volume cap, not a solid region, so it never
/// participates in insideness counting — it always reports a single
/// `NORMAL` crossing regardless of `HitList.csg`.
fn intersect_disc(ray: &Ray) -> Vec<LocalHit> {
    intersect_plane(ray, false)
        .into_iter()
        .filter(|h| {
            let p = ray.at(h.distance);
            p.x * p.x + p.y * p.y <= 1.0
        })
        .collect()
}

// ---- Cube: slab test against [-1,1]^3, tracking which face was hit ----
fn intersect_cube(ray: &Ray) -> Vec<LocalHit> {
    let mut tmin = f64::MIN;
    let mut tmax = f64::MAX;
    let mut near_side = 0;
    let mut far_side = 0;
    for axis in 0..3 {
        if is_zero(ray.dir[axis]) {
            if ray.base[axis] < -1.0 || ray.base[axis] > 1.0 {
                return Vec::new();
            }
            continue;
        }
        let inv_d = 1.0 / ray.dir[axis];
        let mut t0 = (-1.0 - ray.base[axis]) * inv_d;
        let mut t1 = (1.0 - ray.base[axis]) * inv_d;
        let (mut s0, mut s1) = (axis as i32 * 2, axis as i32 * 2 + 1);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            std::mem::swap(&mut s0, &mut s1);
        }
        if t0 > tmin {
            tmin = t0;
            near_side = s0;
        }
        if t1 < tmax {
            tmax = t1;
            far_side = s1;
        }
        if tmin > tmax {
            return Vec::new();
        }
    }
    vec![
        LocalHit { distance: tmin, side: near_side, kind: HitType::Enter },
        LocalHit { distance: tmax, side: far_side, kind: HitType::Exit },
    ]
}

fn cube_normal(side: i32) -> Vec3 {
    match side {
        0 => -Vec3::unit_x(),
        1 => Vec3::unit_x(),
        2 => -Vec3::unit_y(),
        3 => Vec3::unit_y(),
        4 => -Vec3::unit_z(),
        _ => Vec3::unit_z(),
    }
}

// ---- Cylinder: x^2+y^2=1, capped at z=-1,1 ----
fn intersect_cylinder(ray: &Ray, csg: bool) -> Vec<LocalHit> {
    let mut hits = Vec::new();
    let a = ray.dir.x * ray.dir.x + ray.dir.y * ray.dir.y;
    if !is_zero(a) {
        let b = 2.0 * (ray.base.x * ray.dir.x + ray.base.y * ray.dir.y);
        let c = ray.base.x * ray.base.x + ray.base.y * ray.base.y - 1.0;
        for t in roots::solve_quadric(b / a, c / a) {
            let z = ray.at(t).z;
            if (-1.0..=1.0).contains(&z) {
                hits.push(LocalHit { distance: t, side: 0, kind: HitType::Normal });
            }
        }
    }
    for (side, z_plane) in [(1, -1.0), (2, 1.0)] {
        if is_zero(ray.dir.z) {
            continue;
        }
        let t = (z_plane - ray.base.z) / ray.dir.z;
        let p = ray.at(t);
        if p.x * p.x + p.y * p.y <= 1.0 {
            hits.push(LocalHit { distance: t, side, kind: HitType::Normal });
        }
    }
    if csg {
        tag_closed_solid(hits)
    } else {
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        hits
    }
}

fn cylinder_normal(local_pt: Vec3, side: i32) -> Vec3 {
    match side {
        1 => -Vec3::unit_z(),
        2 => Vec3::unit_z(),
        _ => Vec3::new(local_pt.x, local_pt.y, 0.0).normalized(),
    }
}

// ---- Cone: apex at z=1, base radius 1 at z=-1 ----
fn intersect_cone(ray: &Ray, csg: bool) -> Vec<LocalHit> {
    let mut hits = Vec::new();
    let k = 0.5; // radius shrinks to 0 over z in [-1,1], radius(z) = (1-z)/2
    let a = ray.dir.x * ray.dir.x + ray.dir.y * ray.dir.y - k * k * ray.dir.z * ray.dir.z;
    let b = 2.0 * (ray.base.x * ray.dir.x + ray.base.y * ray.dir.y + k * k * ray.dir.z * (1.0 - ray.base.z));
    let c = ray.base.x * ray.base.x + ray.base.y * ray.base.y - k * k * (1.0 - ray.base.z) * (1.0 - ray.base.z);
    if !is_zero(a) {
        for t in roots::solve_quadric(b / a, c / a) {
            let z = ray.at(t).z;
            if (-1.0..=1.0).contains(&z) {
                hits.push(LocalHit { distance: t, side: 0, kind: HitType::Normal });
            }
        }
    }
    if !is_zero(ray.dir.z) {
        let t = (-1.0 - ray.base.z) / ray.dir.z;
        let p = ray.at(t);
        if p.x * p.x + p.y * p.y <= 1.0 {
            hits.push(LocalHit { distance: t, side: 1, kind: HitType::Normal });
        }
    }
    if csg {
        tag_closed_solid(hits)
    } else {
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        hits
    }
}

fn cone_normal(local_pt: Vec3, side: i32) -> Vec3 {
    if side == 1 {
        return -Vec3::unit_z();
    }
    let k = 0.5;
    Vec3::new(local_pt.x, local_pt.y, k * k * (1.0 - local_pt.z)).normalized()
}

// ---- Paraboloid: z = x^2+y^2, bounded to z in [0,1] ----
fn intersect_paraboloid(ray: &Ray, csg: bool) -> Vec<LocalHit> {
    let mut hits = Vec::new();
    let a = ray.dir.x * ray.dir.x + ray.dir.y * ray.dir.y;
    let b = 2.0 * (ray.base.x * ray.dir.x + ray.base.y * ray.dir.y) - ray.dir.z;
    let c = ray.base.x * ray.base.x + ray.base.y * ray.base.y - ray.base.z;
    if !is_zero(a) {
        for t in roots::solve_quadric(b / a, c / a) {
            let z = ray.at(t).z;
            if (0.0..=1.0).contains(&z) {
                hits.push(LocalHit { distance: t, side: 0, kind: HitType::Normal });
            }
        }
    }
    if !is_zero(ray.dir.z) {
        let t = (1.0 - ray.base.z) / ray.dir.z;
        let p = ray.at(t);
        if p.x * p.x + p.y * p.y <= 1.0 {
            hits.push(LocalHit { distance: t, side: 1, kind: HitType::Normal });
        }
    }
    if csg {
        tag_closed_solid(hits)
    } else {
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        hits
    }
}

fn paraboloid_normal(local_pt: Vec3, side: i32) -> Vec3 {
    if side == 1 {
        return Vec3::unit_z();
    }
    Vec3::new(2.0 * local_pt.x, 2.0 * local_pt.y, -1.0).normalized()
}

// ---- Torus: (x^2+y^2+z^2+R^2-r^2)^2 = 4R^2(x^2+y^2), R=1, r=hole_radius,
// solved as a quartic in the ray parameter. ----
fn intersect_torus(ray: &Ray, hole_radius: f64, csg: bool) -> Vec<LocalHit> {
    let o = ray.base;
    let d = ray.dir;
    let r2 = hole_radius * hole_radius;
    let big_r2 = 1.0;

    let g = d.dot(d);
    let h = o.dot(d);
    let i = o.dot(o) + big_r2 - r2;

    let a = g * g;
    let b = 4.0 * g * h;
    let c = 4.0 * h * h + 2.0 * g * i - 4.0 * big_r2 * (d.x * d.x + d.y * d.y);
    let d_coef = 4.0 * h * i - 8.0 * big_r2 * (o.x * d.x + o.y * d.y);
    let e = i * i - 4.0 * big_r2 * (o.x * o.x + o.y * o.y);

    let hits: Vec<LocalHit> = roots::solve_quartic(b / a, c / a, d_coef / a, e / a)
        .into_iter()
        .map(|t| LocalHit { distance: t, side: 0, kind: HitType::Normal })
        .collect();
    if csg {
        tag_closed_solid(hits)
    } else {
        hits
    }
}

fn torus_normal(local_pt: Vec3, _hole_radius: f64) -> Vec3 {
    let r_xy = (local_pt.x * local_pt.x + local_pt.y * local_pt.y).sqrt().max(1e-9);
    let k = 1.0 - 1.0 / r_xy;
    Vec3::new(local_pt.x * k, local_pt.y * k, local_pt.z).normalized()
}

// ---- Prism: extruded regular N-gon along Z, bounded to [-1,1] ----
fn prism_side_planes(sides: u32) -> Vec<(Vec3, f64)> {
    (0..sides)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * (i as f64) / (sides as f64);
            let normal = Vec3::new(theta.cos(), theta.sin(), 0.0);
            (normal, 1.0)
        })
        .collect()
}

fn intersect_prism(ray: &Ray, sides: u32) -> Vec<LocalHit> {
    let planes = prism_side_planes(sides);
    let mut tmin = f64::MIN;
    let mut tmax = f64::MAX;
    let mut near_side = -1;
    let mut far_side = -1;
    for (i, (n, d)) in planes.iter().enumerate() {
        let denom = n.dot(ray.dir);
        let num = *d - n.dot(ray.base);
        if is_zero(denom) {
            if num < 0.0 {
                return Vec::new();
            }
            continue;
        }
        let t = num / denom;
        if denom < 0.0 {
            if t > tmin {
                tmin = t;
                near_side = i as i32;
            }
        } else if t < tmax {
            tmax = t;
            far_side = i as i32;
        }
        if tmin > tmax {
            return Vec::new();
        }
    }
    for (side, z_plane) in [(-2, -1.0), (-3, 1.0)] {
        if is_zero(ray.dir.z) {
            continue;
        }
        let t = (z_plane - ray.base.z) / ray.dir.z;
        if ray.dir.z < 0.0 {
            if t > tmin {
                tmin = t;
                near_side = side;
            }
        } else if t < tmax {
            tmax = t;
            far_side = side;
        }
    }
    if tmin > tmax || near_side == -1 || far_side == -1 {
        return Vec::new();
    }
    vec![
        LocalHit { distance: tmin, side: near_side, kind: HitType::Enter },
        LocalHit { distance: tmax, side: far_side, kind: HitType::Exit },
    ]
}

fn prism_normal(_local_pt: Vec3, sides: u32, side: i32) -> Vec3 {
    if side == -2 {
        return -Vec3::unit_z();
    }
    if side == -3 {
        return Vec3::unit_z();
    }
    let planes = prism_side_planes(sides);
    planes[side.max(0) as usize % planes.len()].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_hit_through_center() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z());
        let hits = Primitive::Sphere.intersect(&ray, false);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].distance - 4.0).abs() < 1e-9);
        assert!((hits[1].distance - 6.0).abs() < 1e-9);
    }

    #[test]
    fn sphere_miss() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, -5.0), Vec3::unit_z());
        assert!(Primitive::Sphere.intersect(&ray, false).is_empty());
    }

    #[test]
    fn sphere_emits_enter_exit_pair_in_csg_mode() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z());
        let hits = Primitive::Sphere.intersect(&ray, true);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].kind, HitType::Enter);
        assert_eq!(hits[1].kind, HitType::Exit);
    }

    #[test]
    fn cube_enters_and_exits() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z());
        let hits = Primitive::Cube.intersect(&ray, false);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].kind, HitType::Enter);
        assert_eq!(hits[1].kind, HitType::Exit);
    }

    #[test]
    fn sphere_normal_points_outward() {
        let p = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(Primitive::Sphere.normal(p, 0), p);
    }
}
