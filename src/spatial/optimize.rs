//! Static layout optimization.
//!
//! After the static world is loaded, every node gets the list of fixed
//! colliders that an object stored there could touch (those of the node,
//! its ancestors and its subtree), sorted along the axis where they spread
//! the most. Collision candidates then come from an interval query instead
//! of a scan over every static object in the path.

use rayon::prelude::*;
use slotmap::SlotMap;

use crate::core::types::Vec3;
use crate::math::BoundingSphere;
use crate::world::{GameObject, ObjectId, PhysicsBehavior};
use super::category::{classify, ObjectCategory};
use super::octree::{NodeId, Octree};

/// Static object projected on a node's sort axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SortedStaticObj {
    pub start: f32,
    pub end: f32,
    pub object: ObjectId,
}

/// Fixed, collidable, non-dynamic objects take part in the sorted lists
pub fn is_sortable_static(obj: &GameObject) -> bool {
    obj.physics == PhysicsBehavior::Fixed
        && obj.is_collidable()
        && matches!(classify(obj), ObjectCategory::Static | ObjectCategory::Light)
}

/// Axis with the largest positional variance among `spheres`
pub fn sorting_axis(spheres: &[BoundingSphere]) -> usize {
    let n = spheres.len().max(1) as f32;
    let mut s = Vec3::ZERO;
    let mut s2 = Vec3::ZERO;
    for sphere in spheres {
        s += sphere.center;
        s2 += sphere.center * sphere.center;
    }
    let variance = s2 - s * s / n;

    let mut axis = 0;
    for i in 1..3 {
        if variance[i] > variance[axis] {
            axis = i;
        }
    }
    axis
}

/// Build the per-node sorted static lists. Returns the number of nodes that got one.
pub fn generate_optimized_octree(octree: &mut Octree, objects: &SlotMap<ObjectId, GameObject>) -> usize {
    let count = octree.len();

    let own: Vec<Vec<ObjectId>> = octree
        .nodes()
        .map(|(_, node)| {
            node.objects
                .iter()
                .chain(node.lights.iter())
                .copied()
                .filter(|id| objects.get(*id).is_some_and(is_sortable_static))
                .collect()
        })
        .collect();

    // children always come after their parent, so a reverse sweep sees subtrees first
    let mut below: Vec<Vec<ObjectId>> = own.clone();
    for i in (0..count).rev() {
        let children: Vec<NodeId> = octree.node(NodeId(i as u32)).child_ids().collect();
        for child in children {
            let (head, tail) = below.split_at_mut(child.index());
            head[i].extend_from_slice(&tail[0]);
        }
    }

    let tree: &Octree = octree;
    let lists: Vec<(Option<usize>, Vec<SortedStaticObj>)> = (0..count)
        .into_par_iter()
        .map(|i| {
            let ids: Vec<ObjectId> = tree
                .ancestors(NodeId(i as u32))
                .flat_map(|a| own[a.index()].iter().copied())
                .chain(below[i].iter().copied())
                .collect();
            sorted_list(&ids, objects)
        })
        .collect();

    let mut populated = 0;
    for (node, (axis, list)) in octree.nodes_mut().iter_mut().zip(lists) {
        populated += axis.is_some() as usize;
        node.axis = axis;
        node.static_objects = list;
    }

    log::info!("Optimized octree: {populated} of {count} nodes carry sorted static lists");
    populated
}

fn sorted_list(ids: &[ObjectId], objects: &SlotMap<ObjectId, GameObject>) -> (Option<usize>, Vec<SortedStaticObj>) {
    if ids.is_empty() {
        return (None, Vec::new());
    }

    let spheres: Vec<(ObjectId, BoundingSphere)> = ids
        .iter()
        .filter_map(|id| objects.get(*id).map(|o| (*id, o.transformed_bounding_sphere())))
        .collect();
    let only_spheres: Vec<BoundingSphere> = spheres.iter().map(|(_, s)| *s).collect();
    let axis = sorting_axis(&only_spheres);

    let mut list: Vec<SortedStaticObj> = spheres
        .into_iter()
        .map(|(object, s)| SortedStaticObj {
            start: s.center[axis] - s.radius,
            end: s.center[axis] + s.radius,
            object,
        })
        .collect();
    list.sort_by(|a, b| a.start.total_cmp(&b.start));

    (Some(axis), list)
}

/// Fixed colliders whose extent on the sort axis overlaps `sphere`.
///
/// Uses the list of `node` or, if it has none, of its nearest ancestor that
/// does. Entries are sorted by `start`, so the scan stops at the first one
/// starting past the sphere.
pub fn static_candidates(octree: &Octree, node: NodeId, sphere: &BoundingSphere) -> Vec<ObjectId> {
    let Some(holder) = std::iter::once(node)
        .chain(octree.ancestors(node))
        .find(|id| octree.node(*id).axis.is_some())
    else {
        return Vec::new();
    };

    let n = octree.node(holder);
    let Some(axis) = n.axis else {
        return Vec::new();
    };

    let start = sphere.center[axis] - sphere.radius;
    let end = sphere.center[axis] + sphere.radius;
    let cut = n.static_objects.partition_point(|e| e.start <= end);

    n.static_objects[..cut]
        .iter()
        .filter(|e| e.end >= start)
        .map(|e| e.object)
        .collect()
}
