//! Shader evaluation: solid colors, procedural patterns, projection
//! "map" shaders, Perlin noise, Phong lighting, and ambient occlusion.
//! Shaders form a tree (stored flat, like objects) because patterns and
//! maps wrap child shaders.

use crate::light::Light;
use crate::math::{Color, Vec2, Vec3};
use crate::noise::noise;
use crate::pattern::Pattern;
use crate::ray::{calc_reflect, Ray};
use crate::transform::Transform;
use std::sync::Arc;

pub type ShaderId = usize;

/// The fully evaluated geometric/texture-coordinate state at a hit
/// point, independent of which shader is asked to color it.
#[derive(Debug, Clone, Copy)]
pub struct EvaluatedHit {
    pub world_pt: Vec3,
    pub local_pt: Vec3,
    pub normal: Vec3,
    pub map: Vec2,
    pub view_dir: Vec3,
    /// Which face/cap of the originating primitive was struck; drives
    /// `SideSelector` and is passed through by map shaders unchanged.
    pub side: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapKind {
    Global,
    Local,
    Cone,
    Cube,
    Cylinder,
    Paraboloid,
    Sphere,
    Torus,
}

#[derive(Clone)]
pub enum ShaderKind {
    Solid(Color),
    /// One sub-shader per cube-like side index, selected by `hit.side
    /// mod N`.
    SideSelector(Vec<ShaderId>),
    Pattern(Pattern),
    Map { kind: MapKind, child: ShaderId },
    /// Perlin-perturbs `map.x` by `noise(transform(map))·value`, then
    /// delegates to `child`.
    Noise { transform: Arc<Transform>, value: f64, child: ShaderId },
    Phong(Phong),
    Occlusion { radius: f64, samples: u32, child: ShaderId },
}

#[derive(Clone, Default)]
pub struct Phong {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub transmit: Color,
    pub specular_exp: f64,
    pub index_of_refraction: f64,
}

impl Default for ShaderKind {
    fn default() -> Self {
        ShaderKind::Solid(Color::fill(0.5))
    }
}

#[derive(Default)]
pub struct ShaderArena {
    nodes: Vec<ShaderKind>,
}

impl ShaderArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, kind: ShaderKind) -> ShaderId {
        self.nodes.push(kind);
        self.nodes.len() - 1
    }

    pub fn get(&self, id: ShaderId) -> &ShaderKind {
        &self.nodes[id]
    }
}

/// Closures the shader evaluator calls back into the trace engine with,
/// so this module doesn't need to depend on `Scene` directly.
pub struct ShadingContext<'a> {
    pub lights: &'a [Light],
    pub depth: u32,
    pub max_ray_depth: u32,
    pub ambient_light: Color,
    pub trace_reflect: &'a dyn Fn(Ray) -> Color,
    pub cast_shadow: &'a dyn Fn(Ray, f64) -> bool,
    pub rng: &'a mut dyn rand::RngCore,
}

pub fn evaluate(arena: &ShaderArena, id: ShaderId, hit: &EvaluatedHit, ctx: &mut ShadingContext) -> Color {
    match arena.get(id).clone() {
        ShaderKind::Solid(c) => c,
        ShaderKind::SideSelector(children) => {
            if children.is_empty() {
                return Color::fill(0.5);
            }
            let n = children.len() as i64;
            let idx = ((hit.side as i64 % n) + n) % n;
            evaluate(arena, children[idx as usize], hit, ctx)
        }
        ShaderKind::Pattern(p) => {
            let (child, in_border) = p.select(hit);
            match (in_border, p.border) {
                (true, Some(border)) => evaluate(arena, border, hit, ctx),
                _ => evaluate(arena, child, hit, ctx),
            }
        }
        ShaderKind::Map { kind, child } => {
            let mut remapped = *hit;
            remapped.map = project(kind, hit.local_pt);
            evaluate(arena, child, &remapped, ctx)
        }
        ShaderKind::Noise { transform, value, child } => {
            let p = transform.point_local_to_global(Vec3::new(hit.map.x, hit.map.y, 0.0));
            let n = noise(p.x, p.y, p.z);
            let mut remapped = *hit;
            remapped.map.x += n * value;
            evaluate(arena, child, &remapped, ctx)
        }
        ShaderKind::Phong(p) => evaluate_phong(&p, hit, ctx),
        ShaderKind::Occlusion { radius, samples, child } => evaluate_occlusion(arena, child, radius, samples, hit, ctx),
    }
}

fn project(kind: MapKind, p: Vec3) -> Vec2 {
    match kind {
        MapKind::Local | MapKind::Global => Vec2::new(p.x, p.y),
        MapKind::Sphere => {
            let theta = p.z.clamp(-1.0, 1.0).acos();
            let phi = p.y.atan2(p.x);
            Vec2::new(phi / (2.0 * std::f64::consts::PI) + 0.5, theta / std::f64::consts::PI)
        }
        MapKind::Cylinder => {
            let phi = p.y.atan2(p.x);
            Vec2::new(phi / (2.0 * std::f64::consts::PI) + 0.5, (p.z + 1.0) * 0.5)
        }
        MapKind::Cone => {
            let phi = p.y.atan2(p.x);
            Vec2::new(phi / (2.0 * std::f64::consts::PI) + 0.5, (p.z + 1.0) * 0.5)
        }
        MapKind::Cube => Vec2::new(p.x, p.y),
        MapKind::Paraboloid => Vec2::new(p.x, p.y),
        MapKind::Torus => {
            let phi = p.y.atan2(p.x);
            let theta = p.z.atan2((p.x * p.x + p.y * p.y).sqrt() - 1.0);
            Vec2::new(phi / (2.0 * std::f64::consts::PI) + 0.5, theta / (2.0 * std::f64::consts::PI) + 0.5)
        }
    }
}

/// Ambient + per-light diffuse/specular, with a recursive reflection ray
/// bounded by `max_ray_depth`.
fn evaluate_phong(p: &Phong, hit: &EvaluatedHit, ctx: &mut ShadingContext) -> Color {
    let mut color = p.ambient.hadamard(ctx.ambient_light);
    for light in ctx.lights {
        if let Some((dir, intensity, dist)) = light.sample(hit.world_pt) {
            if (ctx.cast_shadow)(Ray::spawn(hit.world_pt, dir, ctx.depth), dist) {
                continue;
            }
            let n_dot_l = hit.normal.dot(dir).max(0.0);
            if n_dot_l > 0.0 {
                color += p.diffuse.hadamard(intensity) * n_dot_l;
                let reflected = calc_reflect(-dir, hit.normal);
                let spec = reflected.dot(-hit.view_dir).max(0.0).powf(p.specular_exp.max(1.0));
                color += p.specular.hadamard(intensity) * spec;
            }
        }
    }
    if !p.specular.near_zero() && ctx.depth < ctx.max_ray_depth {
        let reflect_dir = calc_reflect(hit.view_dir, hit.normal);
        let reflect_ray = Ray::spawn(hit.world_pt, reflect_dir, ctx.depth + 1);
        color += p.specular.hadamard((ctx.trace_reflect)(reflect_ray));
    }
    color
}

fn evaluate_occlusion(
    arena: &ShaderArena,
    child: ShaderId,
    radius: f64,
    samples: u32,
    hit: &EvaluatedHit,
    ctx: &mut ShadingContext,
) -> Color {
    let mut lit = 0u32;
    for _ in 0..samples {
        let dir = Vec3::random_hemisphere_dir(hit.normal, ctx.rng);
        if !(ctx.cast_shadow)(Ray::spawn(hit.world_pt, dir, ctx.depth), radius) {
            lit += 1;
        }
    }
    if lit == 0 {
        return Color::zero();
    }
    let base = evaluate(arena, child, hit, ctx);
    base * (lit as f64 / samples as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_shader_returns_its_color() {
        let mut arena = ShaderArena::new();
        let id = arena.push(ShaderKind::Solid(Color::new(1.0, 0.0, 0.0)));
        let hit = EvaluatedHit {
            world_pt: Vec3::zero(),
            local_pt: Vec3::zero(),
            normal: Vec3::unit_z(),
            map: Vec2::zero(),
            view_dir: Vec3::unit_z(),
            side: 0,
        };
        let lights: Vec<Light> = Vec::new();
        use rand::SeedableRng;
        let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
        let mut ctx = ShadingContext {
            lights: &lights,
            depth: 0,
            max_ray_depth: 4,
            ambient_light: Color::fill(0.1),
            trace_reflect: &|_r| Color::zero(),
            cast_shadow: &|_r, _d| false,
            rng: &mut rng,
        };
        assert_eq!(evaluate(&arena, id, &hit, &mut ctx), Color::new(1.0, 0.0, 0.0));
    }
}
