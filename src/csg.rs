//! CSG insideness algebra. Each combinator walks a single hit list,
//! already merged and sorted by distance across all child objects, and
//! reduces ENTER/EXIT events from the children down to the ENTER/EXIT
//! events of the combined solid, tracking which children the ray is
//! currently inside.

use crate::hit::{HitInfo, HitType};
use crate::object::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsgOp {
    Union,
    Intersection,
    Difference,
    /// Forwards every child hit unchanged; used for objects grouped only
    /// to share a shader or transform, not to perform insideness algebra.
    Merge,
}

/// Reduces a sorted, merged list of child hits down to the hits that
/// belong to the combined CSG solid, given the direct child ids (so a
/// hit's `object` field can be mapped back to "which operand").
pub fn reduce(op: CsgOp, children: &[ObjectId], merged: &[HitInfo], self_id: ObjectId) -> Vec<HitInfo> {
    match op {
        CsgOp::Merge => merged.to_vec(),
        CsgOp::Union => union(children, merged, self_id),
        CsgOp::Intersection => intersection(children, merged, self_id),
        CsgOp::Difference => difference(children, merged, self_id),
    }
}

fn child_index(children: &[ObjectId], object: ObjectId) -> usize {
    children.iter().position(|&c| c == object).unwrap_or(0)
}

fn union(children: &[ObjectId], merged: &[HitInfo], self_id: ObjectId) -> Vec<HitInfo> {
    let mut inside = vec![false; children.len()];
    let mut inside_count = 0usize;
    let mut out = Vec::new();
    for h in merged {
        let idx = child_index(children, h.object);
        match h.kind {
            HitType::Enter => {
                let was_outside_all = inside_count == 0;
                inside[idx] = true;
                inside_count += 1;
                if was_outside_all {
                    out.push(retag(*h, self_id, HitType::Enter));
                }
            }
            HitType::Exit => {
                inside[idx] = false;
                inside_count = inside_count.saturating_sub(1);
                if inside_count == 0 {
                    out.push(retag(*h, self_id, HitType::Exit));
                }
            }
            HitType::Normal => out.push(retag(*h, self_id, HitType::Normal)),
        }
    }
    out
}

fn intersection(children: &[ObjectId], merged: &[HitInfo], self_id: ObjectId) -> Vec<HitInfo> {
    let total = children.len();
    let mut inside = vec![false; total];
    let mut inside_count = 0usize;
    let mut out = Vec::new();
    for h in merged {
        let idx = child_index(children, h.object);
        match h.kind {
            HitType::Enter => {
                inside[idx] = true;
                inside_count += 1;
                if inside_count == total {
                    out.push(retag(*h, self_id, HitType::Enter));
                }
            }
            HitType::Exit => {
                if inside_count == total {
                    out.push(retag(*h, self_id, HitType::Exit));
                }
                inside[idx] = false;
                inside_count = inside_count.saturating_sub(1);
            }
            HitType::Normal => {}
        }
    }
    out
}

/// `children[0]` is the primary solid; every other child is subtracted
/// from it.
fn difference(children: &[ObjectId], merged: &[HitInfo], self_id: ObjectId) -> Vec<HitInfo> {
    if children.is_empty() {
        return Vec::new();
    }
    let mut primary_inside = false;
    let mut others_inside_count = 0usize;
    let mut out = Vec::new();
    for h in merged {
        let idx = child_index(children, h.object);
        if idx == 0 {
            match h.kind {
                HitType::Enter => {
                    primary_inside = true;
                    if others_inside_count == 0 {
                        out.push(retag(*h, self_id, HitType::Enter));
                    }
                }
                HitType::Exit => {
                    if others_inside_count == 0 {
                        out.push(retag(*h, self_id, HitType::Exit));
                    }
                    primary_inside = false;
                }
                HitType::Normal => {}
            }
        } else {
            match h.kind {
                HitType::Enter => {
                    if primary_inside && others_inside_count == 0 {
                        out.push(retag(*h, self_id, HitType::Exit));
                    }
                    others_inside_count += 1;
                }
                HitType::Exit => {
                    others_inside_count = others_inside_count.saturating_sub(1);
                    if primary_inside && others_inside_count == 0 {
                        out.push(retag(*h, self_id, HitType::Enter));
                    }
                }
                HitType::Normal => {}
            }
        }
    }
    out
}

fn retag(mut h: HitInfo, self_id: ObjectId, kind: HitType) -> HitInfo {
    h.object = self_id;
    h.kind = kind;
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn hit(object: ObjectId, distance: f64, kind: HitType) -> HitInfo {
        HitInfo { object, parent: object, distance, local_pt: Vec3::zero(), side: 0, map: crate::math::Vec2::zero(), kind }
    }

    #[test]
    fn union_of_disjoint_spheres_keeps_both_boundaries() {
        let children = [0usize, 1usize];
        let merged = vec![
            hit(0, 1.0, HitType::Enter),
            hit(0, 2.0, HitType::Exit),
            hit(1, 3.0, HitType::Enter),
            hit(1, 4.0, HitType::Exit),
        ];
        let out = union(&children, &merged, 99);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn union_of_overlapping_spheres_merges_interior() {
        let children = [0usize, 1usize];
        let merged = vec![
            hit(0, 1.0, HitType::Enter),
            hit(1, 2.0, HitType::Enter),
            hit(0, 3.0, HitType::Exit),
            hit(1, 4.0, HitType::Exit),
        ];
        let out = union(&children, &merged, 99);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].distance, 1.0);
        assert_eq!(out[1].distance, 4.0);
    }

    #[test]
    fn intersection_of_disjoint_spheres_is_empty() {
        let children = [0usize, 1usize];
        let merged = vec![
            hit(0, 1.0, HitType::Enter),
            hit(0, 2.0, HitType::Exit),
            hit(1, 3.0, HitType::Enter),
            hit(1, 4.0, HitType::Exit),
        ];
        assert!(intersection(&children, &merged, 99).is_empty());
    }

    #[test]
    fn difference_removes_overlap_region() {
        let children = [0usize, 1usize];
        let merged = vec![
            hit(0, 1.0, HitType::Enter),
            hit(1, 2.0, HitType::Enter),
            hit(0, 3.0, HitType::Exit),
            hit(1, 4.0, HitType::Exit),
        ];
        let out = difference(&children, &merged, 99);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].distance, 1.0);
        assert_eq!(out[0].kind, HitType::Enter);
        assert_eq!(out[1].distance, 2.0);
        assert_eq!(out[1].kind, HitType::Exit);
    }
}
