//! Hit list and hit cache. The original implementation threads an
//! intrusive singly-linked list through `HitInfo` nodes pulled from a
//! per-thread free list; Rust ownership doesn't allow that pointer
//! aliasing, so this is an arena: `HitInfo` nodes live in a `Vec` owned
//! by the `HitCache`, and the `HitList` holds indices into it. The
//! `HitCache` is reused per traced ray (cleared, not reallocated), which
//! keeps the zero-allocator-traffic property the original's free list
//! was designed for.

use crate::math::Vec2;
use crate::object::ObjectId;

/// Distinguishes a CSG insideness-algebra boundary crossing from a plain
/// surface hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitType {
    Normal,
    Enter,
    Exit,
}

/// A single candidate intersection. `object` is the CSG node this hit
/// currently belongs to after algebra reduction; `parent` is the
/// original primitive that produced it, kept so the correct local
/// geometry/normal can be recovered after CSG merges hits belonging to
/// different primitives into one list.
#[derive(Debug, Clone, Copy)]
pub struct HitInfo {
    pub object: ObjectId,
    pub parent: ObjectId,
    pub distance: f64,
    pub local_pt: crate::math::Vec3,
    pub side: i32,
    pub map: Vec2,
    pub kind: HitType,
}

impl HitInfo {
    pub fn new(object: ObjectId, distance: f64, local_pt: crate::math::Vec3, side: i32) -> Self {
        Self {
            object,
            parent: object,
            distance,
            local_pt,
            side,
            map: Vec2::zero(),
            kind: HitType::Normal,
        }
    }
}

/// Arena of `HitInfo` nodes, reused across traced rays within a job.
#[derive(Default)]
pub struct HitCache {
    nodes: Vec<HitInfo>,
}

impl HitCache {
    pub fn new() -> Self {
        Self { nodes: Vec::with_capacity(64) }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn store(&mut self, hit: HitInfo) -> usize {
        self.nodes.push(hit);
        self.nodes.len() - 1
    }

    pub fn get(&self, idx: usize) -> &HitInfo {
        &self.nodes[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut HitInfo {
        &mut self.nodes[idx]
    }
}

/// A distance-sorted run of hit indices into a `HitCache`. `csg` marks a
/// list that is mid-CSG-algebra (ENTER/EXIT pairs rather than plain
/// surface hits).
#[derive(Default)]
pub struct HitList {
    indices: Vec<usize>,
    pub csg: bool,
}

impl HitList {
    pub fn new() -> Self {
        Self { indices: Vec::new(), csg: false }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.csg = false;
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Inserts a new hit into the cache and into this list, keeping the
    /// list sorted by ascending distance.
    pub fn add(&mut self, cache: &mut HitCache, hit: HitInfo) -> usize {
        let idx = cache.store(hit);
        let pos = self
            .indices
            .partition_point(|&i| cache.get(i).distance < hit.distance);
        self.indices.insert(pos, idx);
        idx
    }

    pub fn iter<'a>(&'a self, cache: &'a HitCache) -> impl Iterator<Item = &'a HitInfo> + 'a {
        self.indices.iter().map(move |&i| cache.get(i))
    }

    pub fn index_iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn first(&self, cache: &HitCache) -> Option<HitInfo> {
        self.indices.first().map(|&i| *cache.get(i))
    }

    /// Finds the first hit whose distance lies within the ray's valid
    /// range, discarding earlier, out-of-range entries.
    pub fn find_first_in_range(&self, cache: &HitCache, min_length: f64, max_length: f64) -> Option<HitInfo> {
        self.indices
            .iter()
            .map(|&i| *cache.get(i))
            .find(|h| h.distance >= min_length && h.distance <= max_length)
    }

    /// Merges `other` into `self`, keeping the result sorted by distance
    /// (equivalent to the original's `mergeList`).
    pub fn merge_sorted(&mut self, other: &mut HitList, cache: &HitCache) {
        let mut merged = Vec::with_capacity(self.indices.len() + other.indices.len());
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            if cache.get(self.indices[i]).distance <= cache.get(other.indices[j]).distance {
                merged.push(self.indices[i]);
                i += 1;
            } else {
                merged.push(other.indices[j]);
                j += 1;
            }
        }
        merged.extend_from_slice(&self.indices[i..]);
        merged.extend_from_slice(&other.indices[j..]);
        self.indices = merged;
        other.indices.clear();
    }

    pub fn take_indices(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.indices)
    }

    pub fn set_indices(&mut self, indices: Vec<usize>) {
        self.indices = indices;
    }
}

/// Per-primitive-kind and bound hit/tried counters, folded from each
/// worker's `JobState` into a scene-global total on job pool shutdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatItem {
    pub tried: u64,
    pub hit: u64,
}

impl StatItem {
    pub fn record(&mut self, hit: bool) {
        self.tried += 1;
        if hit {
            self.hit += 1;
        }
    }
}

impl std::ops::AddAssign for StatItem {
    fn add_assign(&mut self, o: StatItem) {
        self.tried += o.tried;
        self.hit += o.hit;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatInfo {
    pub bound: StatItem,
    pub sphere: StatItem,
    pub cube: StatItem,
    pub cylinder: StatItem,
    pub cone: StatItem,
    pub disc: StatItem,
    pub plane: StatItem,
    pub paraboloid: StatItem,
    pub torus: StatItem,
    pub prism: StatItem,
    pub csg: StatItem,
}

impl std::ops::AddAssign for StatInfo {
    fn add_assign(&mut self, o: StatInfo) {
        self.bound += o.bound;
        self.sphere += o.sphere;
        self.cube += o.cube;
        self.cylinder += o.cylinder;
        self.cone += o.cone;
        self.disc += o.disc;
        self.plane += o.plane;
        self.paraboloid += o.paraboloid;
        self.torus += o.torus;
        self.prism += o.prism;
        self.csg += o.csg;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_ascending_distance_order() {
        let mut cache = HitCache::new();
        let mut list = HitList::new();
        list.add(&mut cache, HitInfo::new(0, 5.0, crate::math::Vec3::zero(), 0));
        list.add(&mut cache, HitInfo::new(0, 1.0, crate::math::Vec3::zero(), 0));
        list.add(&mut cache, HitInfo::new(0, 3.0, crate::math::Vec3::zero(), 0));
        let dists: Vec<f64> = list.iter(&cache).map(|h| h.distance).collect();
        assert_eq!(dists, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn merge_sorted_interleaves() {
        let mut cache = HitCache::new();
        let mut a = HitList::new();
        let mut b = HitList::new();
        a.add(&mut cache, HitInfo::new(0, 1.0, crate::math::Vec3::zero(), 0));
        a.add(&mut cache, HitInfo::new(0, 4.0, crate::math::Vec3::zero(), 0));
        b.add(&mut cache, HitInfo::new(0, 2.0, crate::math::Vec3::zero(), 0));
        b.add(&mut cache, HitInfo::new(0, 3.0, crate::math::Vec3::zero(), 0));
        a.merge_sorted(&mut b, &cache);
        let dists: Vec<f64> = a.iter(&cache).map(|h| h.distance).collect();
        assert_eq!(dists, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(b.is_empty());
    }
}
