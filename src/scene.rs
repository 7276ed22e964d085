//! Scene container, validation, and the trace engine: `trace_ray` walks
//! the BVH/CSG object tree to find the nearest surface, evaluates its
//! shader (which may recurse into `trace_ray` for reflections), and
//! `cast_shadow_ray` answers the boolean occlusion query shaders need
//! for their per-light visibility test.

use crate::bbox::BBox;
use crate::camera::{Camera, CameraConfig};
use crate::csg::{self, CsgOp};
use crate::error::SceneError;
use crate::framebuffer::FrameBuffer;
use crate::hit::{HitCache, HitInfo, HitList, StatInfo};
use crate::jobpool::partition_rows;
use crate::light::Light;
use crate::math::{Color, Vec3};
use crate::object::{ObjectArena, ObjectId, ObjectKind, ObjectNode};
use crate::ray::Ray;
use crate::shader::{evaluate, EvaluatedHit, ShaderArena, ShaderId, ShadingContext};
use crate::transform::Transform;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;

pub struct SamplingConfig {
    pub samples_x: u32,
    pub samples_y: u32,
    pub jitter: f64,
    pub max_ray_depth: u32,
    pub min_ray_value: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { samples_x: 1, samples_y: 1, jitter: 0.0, max_ray_depth: 4, min_ray_value: 0.001 }
    }
}

pub struct Scene {
    pub objects: ObjectArena,
    pub shaders: ShaderArena,
    pub lights: Vec<Light>,
    pub background: Color,
    pub ambient: Color,
    pub camera: CameraConfig,
    pub sampling: SamplingConfig,
    pub width: u32,
    pub height: u32,
    roots: Vec<ObjectId>,
    pub base_seed: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            objects: ObjectArena::new(),
            shaders: ShaderArena::new(),
            lights: Vec::new(),
            background: Color::zero(),
            ambient: Color::fill(0.1),
            camera: CameraConfig::default(),
            sampling: SamplingConfig::default(),
            width: 640,
            height: 480,
            roots: Vec::new(),
            base_seed: 0x5EED,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_primitive(
        &mut self,
        primitive: crate::primitives::Primitive,
        transform: Arc<Transform>,
        shader: ShaderId,
    ) -> ObjectId {
        let mut bound = BBox::empty();
        let local = primitive.local_bound();
        let corners = [
            Vec3::new(local.pmin.x, local.pmin.y, local.pmin.z),
            Vec3::new(local.pmin.x, local.pmin.y, local.pmax.z),
            Vec3::new(local.pmin.x, local.pmax.y, local.pmin.z),
            Vec3::new(local.pmin.x, local.pmax.y, local.pmax.z),
            Vec3::new(local.pmax.x, local.pmin.y, local.pmin.z),
            Vec3::new(local.pmax.x, local.pmin.y, local.pmax.z),
            Vec3::new(local.pmax.x, local.pmax.y, local.pmin.z),
            Vec3::new(local.pmax.x, local.pmax.y, local.pmax.z),
        ];
        bound.fit_transformed_points(&transform.final_, &corners);
        self.objects.push(ObjectNode {
            kind: ObjectKind::Primitive(primitive),
            transform,
            shader: Some(shader),
            no_shadow: false,
            bound,
        })
    }

    pub fn add_csg(&mut self, op: CsgOp, children: Vec<ObjectId>, transform: Arc<Transform>) -> Result<ObjectId, SceneError> {
        if children.is_empty() {
            return Err(SceneError::EmptyCsg { entity: "csg group".into() });
        }
        let mut bound = BBox::empty();
        for &c in &children {
            bound.fit_box(&self.objects.get(c).bound);
        }
        Ok(self.objects.push(ObjectNode {
            kind: ObjectKind::Csg(op, children),
            transform,
            shader: None,
            no_shadow: false,
            bound,
        }))
    }

    /// Builds the BVH over every top-level object added so far and
    /// stores the resulting root, logging the before/after traversal
    /// cost improvement.
    pub fn build_bvh(&mut self, top_level: Vec<ObjectId>) {
        let scene_weight = crate::bvh::scene_weight_of(&self.objects, &top_level);
        let before: f64 = top_level.iter().map(|&id| crate::bvh::total_cost(&self.objects, id, scene_weight)).sum();
        self.roots = crate::bvh::build(&mut self.objects, &top_level);
        let after: f64 = self.roots.iter().map(|&id| crate::bvh::total_cost(&self.objects, id, scene_weight)).sum();
        info!("BVH built: cost {before:.2} -> {after:.2}");
    }

    /// The top-level objects reached after `build_bvh` (possibly more
    /// than one, when no further merge would have improved traversal
    /// cost), or empty if no objects were added.
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// Validates camera/light setup and finalizes per-object transforms.
    pub fn init(&mut self) -> Result<(), SceneError> {
        if self.camera.vup.near_zero() {
            return Err(SceneError::DegenerateVup);
        }
        Camera::init(&self.camera)?;
        Ok(())
    }

    /// Finds the nearest surface hit along `ray`, if any, across every
    /// top-level root in `roots`.
    fn intersect(&self, roots: &[ObjectId], ray: &Ray, cache: &mut HitCache, stats: &mut StatInfo) -> Option<(HitInfo, ObjectId)> {
        let mut list = HitList::new();
        for &root in roots {
            self.intersect_into(root, ray, cache, &mut list, stats);
        }
        list.find_first_in_range(cache, ray.min_length, ray.max_length).map(|h| (h, h.parent))
    }

    fn intersect_into(&self, id: ObjectId, ray: &Ray, cache: &mut HitCache, out: &mut HitList, stats: &mut StatInfo) {
        let node = self.objects.get(id);
        match &node.kind {
            ObjectKind::Bound(children) => {
                let local = node.transform.ray_to_local(ray);
                let hit = node
                    .bound
                    .hit(local.base, local.dir, ray.min_length, ray.max_length)
                    .is_some();
                stats.bound.record(hit);
                if !hit {
                    return;
                }
                for &c in children {
                    self.intersect_into(c, ray, cache, out, stats);
                }
            }
            ObjectKind::Group(children) => {
                for &c in children {
                    self.intersect_into(c, ray, cache, out, stats);
                }
            }
            ObjectKind::Csg(op, children) => {
                let mut merged = HitList::new();
                merged.csg = !matches!(op, CsgOp::Merge);
                for &c in children {
                    self.intersect_into(c, ray, cache, &mut merged, stats);
                }
                let local_hits: Vec<HitInfo> = merged.iter(cache).copied().collect();
                let reduced = csg::reduce(*op, children, &local_hits, id);
                let any = !reduced.is_empty();
                for h in reduced {
                    out.add(cache, h);
                }
                stats.csg.record(any);
            }
            ObjectKind::Primitive(primitive) => {
                let local = node.transform.ray_to_local(ray);
                let hits = primitive.intersect(&local, out.csg);
                record_primitive_stat(stats, primitive, !hits.is_empty());
                for h in hits {
                    let local_pt = local.at(h.distance);
                    let mut info = HitInfo::new(id, h.distance, local_pt, h.side);
                    info.kind = h.kind;
                    out.add(cache, info);
                }
            }
        }
    }

    /// Casts a shadow ray toward a light; returns `true` if occluded
    /// within `max_dist`.
    pub fn cast_shadow_ray(&self, base: Vec3, dir: Vec3, max_dist: f64, cache: &mut HitCache, stats: &mut StatInfo) -> bool {
        if self.roots.is_empty() {
            return false;
        }
        let mut ray = Ray::spawn(base, dir, 0);
        ray.max_length = max_dist - 1e-6;
        self.intersect(&self.roots, &ray, cache, stats).is_some()
    }

    /// Traces a primary or secondary ray, returning its shaded color, or
    /// `background` if it escapes the scene.
    pub fn trace_ray(&self, ray: Ray, cache: &mut HitCache, stats: &mut StatInfo, rng: &mut dyn rand::RngCore) -> Color {
        if ray.depth > self.sampling.max_ray_depth {
            return Color::zero();
        }
        if self.roots.is_empty() {
            return self.background;
        }
        let Some((hit, parent_id)) = self.intersect(&self.roots, &ray, cache, stats) else {
            return self.background;
        };

        let parent_node = self.objects.get(parent_id);
        let (primitive, shader) = match &parent_node.kind {
            ObjectKind::Primitive(p) => (p, parent_node.shader),
            _ => return self.background,
        };
        let Some(shader_id) = shader else { return self.background };

        let world_pt = ray.at(hit.distance);
        let normal = parent_node.transform.normal_local_to_global(primitive.normal(hit.local_pt, hit.side));
        let map = primitive.map(hit.local_pt, hit.side);

        let eval_hit = EvaluatedHit { world_pt, local_pt: hit.local_pt, normal, map, view_dir: ray.dir, side: hit.side };

        let depth = ray.depth;
        let trace_reflect = |r: Ray| -> Color {
            let mut local_cache = HitCache::new();
            let mut local_stats = StatInfo::default();
            let mut local_rng = SmallRng::seed_from_u64(0xC0FFEE ^ (depth as u64));
            self.trace_ray(r, &mut local_cache, &mut local_stats, &mut local_rng)
        };
        let cast_shadow = |r: Ray, dist: f64| -> bool {
            let mut local_cache = HitCache::new();
            let mut local_stats = StatInfo::default();
            self.cast_shadow_ray(r.base, r.dir, dist, &mut local_cache, &mut local_stats)
        };

        let mut ctx = ShadingContext {
            lights: &self.lights,
            depth,
            max_ray_depth: self.sampling.max_ray_depth,
            ambient_light: self.ambient,
            trace_reflect: &trace_reflect,
            cast_shadow: &cast_shadow,
            rng,
        };
        evaluate(&self.shaders, shader_id, &eval_hit, &mut ctx)
    }

    /// Renders the scene with `jobs` worker threads, returning the
    /// completed frame buffer. `jobs == 0` uses
    /// `std::thread::available_parallelism`.
    pub fn render(&self, jobs: usize) -> FrameBuffer {
        let jobs = if jobs == 0 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            jobs
        };
        let camera = Camera::init(&self.camera).expect("camera validated during Scene::init");
        let mut fb = FrameBuffer::new(self.width, self.height);
        let fb_ptr = std::sync::Mutex::new(&mut fb);

        let started = Instant::now();
        let ranges = partition_rows(self.height, jobs);
        let total_tasks = ranges.len();
        crate::jobpool::run_scoped(jobs, ranges, |worker_id, y0, y1| {
            let mut rng = SmallRng::seed_from_u64(self.base_seed ^ (worker_id as u64).wrapping_mul(0x9E3779B97F4A7C15));
            let mut cache = HitCache::new();
            let mut stats = StatInfo::default();
            let mut row_colors = Vec::with_capacity(((y1 - y0) as usize) * self.width as usize);
            for y in y0..y1 {
                for x in 0..self.width {
                    let mut accum = Color::zero();
                    for sy in 0..self.sampling.samples_y {
                        for sx in 0..self.sampling.samples_x {
                            let (ju, jv) = if self.sampling.jitter > 0.0 {
                                use rand::Rng;
                                (rng.gen_range(-self.sampling.jitter..self.sampling.jitter), rng.gen_range(-self.sampling.jitter..self.sampling.jitter))
                            } else {
                                (0.0, 0.0)
                            };
                            let u = (x as f64 + (sx as f64 + 0.5) / self.sampling.samples_x as f64 + ju) / self.width as f64;
                            let v = (y as f64 + (sy as f64 + 0.5) / self.sampling.samples_y as f64 + jv) / self.height as f64;
                            let ray = camera.generate_ray(u, v, &mut rng);
                            accum += self.trace_ray(ray, &mut cache, &mut stats, &mut rng);
                        }
                    }
                    let total_samples = (self.sampling.samples_x * self.sampling.samples_y).max(1) as f64;
                    row_colors.push(accum / total_samples);
                }
            }
            let mut fb = fb_ptr.lock().unwrap();
            let mut i = 0;
            for y in y0..y1 {
                for x in 0..self.width {
                    fb.set(x, y, row_colors[i]);
                    i += 1;
                }
            }
            debug!("worker {worker_id} finished rows {y0}..{y1}");
        });

        let elapsed = started.elapsed();
        let mrays = (self.width as f64 * self.height as f64 * self.sampling.samples_x as f64 * self.sampling.samples_y as f64)
            / elapsed.as_secs_f64().max(1e-9)
            / 1_000_000.0;
        info!(
            "render finished: {total_tasks} tasks in {:.2}s ({mrays:.2} Mrays/s)",
            elapsed.as_secs_f64()
        );

        fb
    }
}

fn record_primitive_stat(stats: &mut StatInfo, primitive: &crate::primitives::Primitive, hit: bool) {
    use crate::primitives::Primitive::*;
    match primitive {
        Sphere => stats.sphere.record(hit),
        Cube => stats.cube.record(hit),
        Cylinder => stats.cylinder.record(hit),
        Cone => stats.cone.record(hit),
        Disc => stats.disc.record(hit),
        Plane => stats.plane.record(hit),
        Paraboloid => stats.paraboloid.record(hit),
        Torus { .. } => stats.torus.record(hit),
        Prism { .. } => stats.prism.record(hit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::primitives::Primitive;
    use crate::shader::ShaderKind;

    fn single_sphere_scene() -> Scene {
        let mut scene = Scene::new();
        let mut t = Transform::default();
        t.init(None).unwrap();
        let shader = scene.shaders.push(ShaderKind::Solid(Color::new(1.0, 0.0, 0.0)));
        let id = scene.add_primitive(Primitive::Sphere, Arc::new(t), shader);
        scene.build_bvh(vec![id]);
        scene.width = 8;
        scene.height = 8;
        scene.camera = CameraConfig { eye: Vec3::new(0.0, 0.0, 5.0), coi: Vec3::zero(), ..Default::default() };
        scene
    }

    #[test]
    fn empty_scene_returns_background() {
        let mut scene = Scene::new();
        scene.background = Color::new(0.2, 0.3, 0.4);
        scene.init().unwrap();
        let fb = scene.render(1);
        assert_eq!(fb.get(0, 0), Color::new(0.2, 0.3, 0.4));
    }

    #[test]
    fn sphere_hits_center_pixel() {
        let mut scene = single_sphere_scene();
        scene.init().unwrap();
        let fb = scene.render(1);
        let center = fb.get(scene.width / 2, scene.height / 2);
        assert!(center.x > 0.0, "expected red sphere ambient contribution, got {center:?}");
    }

    #[test]
    fn deterministic_across_job_counts_without_jitter() {
        let mut scene = single_sphere_scene();
        scene.init().unwrap();
        let fb1 = scene.render(1);
        let fb2 = scene.render(3);
        for y in 0..scene.height {
            for x in 0..scene.width {
                assert_eq!(fb1.get(x, y), fb2.get(x, y));
            }
        }
    }
}
