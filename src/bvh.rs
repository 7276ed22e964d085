//! BVH construction via greedy pairwise merge: repeatedly fuse whichever
//! two top-level nodes would save the most traversal cost, stopping once
//! no remaining pair improves on leaving them separate. This is not a
//! median-split/SAH-bucket tree; it directly optimizes the same cost
//! model the trace engine pays at render time (a bound's own slab-test
//! cost plus the weighted cost of whatever it contains).

use crate::bbox::BBox;
use crate::object::{ObjectArena, ObjectId, ObjectKind, ObjectNode};
use crate::primitives::Primitive;
use crate::transform::Transform;
use std::sync::Arc;

/// Default per-primitive-kind hit costs, carried from the original's
/// concrete table (referenced only abstractly by cost category in the
/// high-level design).
pub struct HitCostTable;

impl HitCostTable {
    pub const BOUND: f64 = 0.8;
    pub const CSG: f64 = 0.3;

    pub fn cost(p: &Primitive) -> f64 {
        p.hit_cost()
    }
}

/// A candidate top-level node during optimization. `rate` is its
/// content's intrinsic per-unit-weight hit cost. Every candidate still
/// sits in the shared top-level list, so its own bound test (if any) is
/// paid at `scene_weight`, the weight of everything being optimized
/// together; only its *content* is paid at the node's own tighter
/// `bound.weight()` once something guards it.
struct OptNode {
    bound: BBox,
    rate: f64,
    cost: f64,
    object: ObjectId,
}

/// Sums the intrinsic hit-cost rate of everything reachable from `id`.
/// A `Csg` is charged as one opaque unit — section 4.4's flatten step
/// preserves Unions whole, since their insideness algebra can't be
/// decomposed into independently-bounded pieces.
fn content_rate(arena: &ObjectArena, id: ObjectId) -> f64 {
    match &arena.get(id).kind {
        ObjectKind::Primitive(p) => HitCostTable::cost(p),
        ObjectKind::Csg(..) => HitCostTable::CSG,
        ObjectKind::Group(children) => children.iter().map(|&c| content_rate(arena, c)).sum(),
        ObjectKind::Bound(children) => children.iter().map(|&c| content_rate(arena, c)).sum(),
    }
}

/// The flat list of objects `id` would contribute if absorbed into a
/// larger bound: its own children if it's already a `Bound` (so merging
/// never nests one bound inside another), or just itself.
fn flatten(arena: &ObjectArena, id: ObjectId) -> Vec<ObjectId> {
    match &arena.get(id).kind {
        ObjectKind::Bound(children) => children.clone(),
        _ => vec![id],
    }
}

fn push_bound(arena: &mut ObjectArena, children: Vec<ObjectId>, bound: BBox) -> ObjectId {
    arena.push(ObjectNode {
        kind: ObjectKind::Bound(children),
        transform: Arc::new(Transform::default()),
        shader: None,
        no_shadow: false,
        bound,
    })
}

/// For every still-bare top-level node, compares `baseCost` (its content
/// evaluated at `scene_weight`, since nothing shields it) to `wrapCost`
/// (a bound test at `scene_weight`, guarding content now evaluated at
/// its own tighter weight). Swaps in the wrap when cheaper.
fn self_wrap(arena: &mut ObjectArena, nodes: &mut [OptNode], scene_weight: f64) {
    for node in nodes.iter_mut() {
        let own_weight = node.bound.weight();
        let base_cost = node.rate * scene_weight;
        let wrap_cost = HitCostTable::BOUND * scene_weight + node.rate * own_weight;
        if wrap_cost < base_cost {
            let children = flatten(arena, node.object);
            let wrapped = push_bound(arena, children, node.bound);
            node.object = wrapped;
            node.cost = wrap_cost;
        }
    }
}

/// Builds a BVH over `leaf_ids` (objects already present in `arena`,
/// each with its world-space `bound` populated) via greedy pairwise
/// merging, stopping once no remaining pair would improve traversal
/// cost. Returns every surviving top-level object — ordinarily one, but
/// more than one when the leaves are spread out enough that merging any
/// pair would cost more than leaving them separate.
pub fn build(arena: &mut ObjectArena, leaf_ids: &[ObjectId]) -> Vec<ObjectId> {
    if leaf_ids.is_empty() {
        return Vec::new();
    }
    if leaf_ids.len() == 1 {
        return vec![leaf_ids[0]];
    }

    let scene_weight = scene_weight_of(arena, leaf_ids);

    let mut nodes: Vec<OptNode> = leaf_ids
        .iter()
        .map(|&id| {
            let bound = arena.get(id).bound;
            let rate = content_rate(arena, id);
            OptNode { bound, rate, cost: rate * scene_weight, object: id }
        })
        .collect();

    self_wrap(arena, &mut nodes, scene_weight);

    loop {
        if nodes.len() < 2 {
            break;
        }
        let mut best: Option<(usize, usize, f64, BBox)> = None;
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let merged = nodes[i].bound.merged(&nodes[j].bound);
                let w = merged.weight();
                let cost = HitCostTable::BOUND * scene_weight + (nodes[i].rate + nodes[j].rate) * w;
                let gain = cost - (nodes[i].cost + nodes[j].cost);
                let improves = match &best {
                    Some(b) => gain < b.2,
                    None => true,
                };
                if improves {
                    best = Some((i, j, gain, merged));
                }
            }
        }
        let Some((i, j, gain, merged_bound)) = best else { break };
        if gain >= 0.0 {
            break;
        }
        let b = nodes.swap_remove(j);
        let a = nodes.swap_remove(i);
        let mut children = flatten(arena, a.object);
        children.extend(flatten(arena, b.object));
        let rate = a.rate + b.rate;
        let cost = HitCostTable::BOUND * scene_weight + rate * merged_bound.weight();
        let bound_id = push_bound(arena, children, merged_bound);
        nodes.push(OptNode { bound: merged_bound, rate, cost, object: bound_id });
    }

    nodes.into_iter().map(|n| n.object).collect()
}

/// The combined bounding weight of `ids`, used as the shared top-level
/// context every candidate's own bound-test cost is measured against.
pub fn scene_weight_of(arena: &ObjectArena, ids: &[ObjectId]) -> f64 {
    if ids.is_empty() {
        return 0.0;
    }
    ids.iter()
        .skip(1)
        .fold(arena.get(ids[0]).bound, |acc, &id| acc.merged(&arena.get(id).bound))
        .weight()
}

/// Traversal cost of the tree rooted at `root` when `root` is reached
/// with context weight `context_weight` (ordinarily `scene_weight_of`
/// over the whole top-level list, since every root is tested
/// unconditionally by `trace_ray` regardless of how many there are).
/// Used to log the before/after improvement a BVH build achieves.
pub fn total_cost(arena: &ObjectArena, root: ObjectId, context_weight: f64) -> f64 {
    let n = arena.get(root);
    match &n.kind {
        ObjectKind::Primitive(p) => HitCostTable::cost(p) * context_weight,
        ObjectKind::Csg(..) => HitCostTable::CSG * context_weight,
        ObjectKind::Group(children) => children.iter().map(|&c| total_cost(arena, c, context_weight)).sum(),
        ObjectKind::Bound(children) => {
            let w = n.bound.weight();
            HitCostTable::BOUND * context_weight + children.iter().map(|&c| total_cost(arena, c, w)).sum::<f64>()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn leaf(arena: &mut ObjectArena, center: Vec3) -> ObjectId {
        arena.push(ObjectNode {
            kind: ObjectKind::Primitive(Primitive::Sphere),
            transform: Arc::new(Transform::default()),
            shader: None,
            no_shadow: false,
            bound: BBox::new(center - Vec3::fill(1.0), center + Vec3::fill(1.0)),
        })
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let mut arena = ObjectArena::new();
        let id = leaf(&mut arena, Vec3::zero());
        assert_eq!(build(&mut arena, &[id]), vec![id]);
    }

    #[test]
    fn nearby_leaves_merge_under_one_bound() {
        let mut arena = ObjectArena::new();
        let a = leaf(&mut arena, Vec3::new(-1.0, 0.0, 0.0));
        let b = leaf(&mut arena, Vec3::new(1.0, 0.0, 0.0));
        let c = leaf(&mut arena, Vec3::new(0.0, 1.5, 0.0));
        let roots = build(&mut arena, &[a, b, c]);
        assert_eq!(roots.len(), 1);
        assert!(matches!(arena.get(roots[0]).kind, ObjectKind::Bound(..)));
    }

    #[test]
    fn build_never_increases_total_cost() {
        let mut arena = ObjectArena::new();
        let a = leaf(&mut arena, Vec3::new(-10.0, 0.0, 0.0));
        let b = leaf(&mut arena, Vec3::new(10.0, 0.0, 0.0));
        let c = leaf(&mut arena, Vec3::new(0.0, 10.0, 0.0));
        let leaves = [a, b, c];
        let scene_weight = scene_weight_of(&arena, &leaves);
        let before: f64 = leaves.iter().map(|&id| total_cost(&arena, id, scene_weight)).sum();
        let roots = build(&mut arena, &leaves);
        let after: f64 = roots.iter().map(|&id| total_cost(&arena, id, scene_weight)).sum();
        assert!(after <= before + 1e-9, "BVH cost increased: {before} -> {after}");
    }

    #[test]
    fn empty_leaves_has_no_root() {
        let mut arena = ObjectArena::new();
        assert!(build(&mut arena, &[]).is_empty());
    }
}
