//! Arena octree with quadtree-hybrid levels.
//!
//! Nodes live in a flat `Vec` and reference each other by [`NodeId`]. The
//! whole tree is allocated when the world is created; afterwards only the
//! per-node membership buckets change.

use crate::core::config::OctreeConfig;
use crate::core::types::{Result, Vec3};
use crate::core::Error;
use crate::math::{Aabb, BoundingSphere};
use crate::world::{ObjectId, RegionId, SectorId};
use super::category::ObjectCategory;
use super::optimize::SortedStaticObj;

/// Octant (bit 0 = x, bit 1 = y, bit 2 = z) to child slot in quadtree levels
pub const QUAD_OCTANT: [usize; 8] = [0, 1, 0, 1, 2, 3, 2, 3];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Something stored in an octree node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Member {
    Object(ObjectId, ObjectCategory),
    Sector(SectorId),
    Region(RegionId),
}

#[derive(Clone, Debug)]
pub struct OctreeNode {
    pub center: Vec3,
    pub half_dimensions: Vec3,
    pub parent: Option<NodeId>,
    pub children: [Option<NodeId>; 8],
    pub depth: u32,
    /// World-clock time of the last membership change in this subtree
    pub updated_at: f64,
    /// Axis `static_objects` is sorted on, set by the optimizer
    pub axis: Option<usize>,
    pub static_objects: Vec<SortedStaticObj>,

    pub objects: Vec<ObjectId>,
    pub moving: Vec<ObjectId>,
    pub creatures: Vec<ObjectId>,
    pub lights: Vec<ObjectId>,
    pub items: Vec<ObjectId>,
    pub regions: Vec<RegionId>,
    pub sectors: Vec<SectorId>,
}

impl OctreeNode {
    fn new(center: Vec3, half_dimensions: Vec3, parent: Option<NodeId>, depth: u32) -> Self {
        Self {
            center,
            half_dimensions,
            parent,
            children: [None; 8],
            depth,
            updated_at: 0.0,
            axis: None,
            static_objects: Vec::new(),
            objects: Vec::new(),
            moving: Vec::new(),
            creatures: Vec::new(),
            lights: Vec::new(),
            items: Vec::new(),
            regions: Vec::new(),
            sectors: Vec::new(),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extent(self.center, self.half_dimensions)
    }

    pub fn bucket(&self, category: ObjectCategory) -> &[ObjectId] {
        match category {
            ObjectCategory::Static => &self.objects,
            ObjectCategory::Moving => &self.moving,
            ObjectCategory::Creature => &self.creatures,
            ObjectCategory::Light => &self.lights,
            ObjectCategory::Item => &self.items,
        }
    }

    fn bucket_mut(&mut self, category: ObjectCategory) -> &mut Vec<ObjectId> {
        match category {
            ObjectCategory::Static => &mut self.objects,
            ObjectCategory::Moving => &mut self.moving,
            ObjectCategory::Creature => &mut self.creatures,
            ObjectCategory::Light => &mut self.lights,
            ObjectCategory::Item => &mut self.items,
        }
    }

    /// Every object stored directly in this node, all buckets
    pub fn all_objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        ObjectCategory::ALL.iter().flat_map(move |c| self.bucket(*c).iter().copied())
    }

    pub fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().flatten().copied()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    fn push(&mut self, member: Member) {
        match member {
            Member::Object(id, category) => self.bucket_mut(category).push(id),
            Member::Sector(id) => self.sectors.push(id),
            Member::Region(id) => self.regions.push(id),
        }
    }

    fn erase(&mut self, member: Member) -> bool {
        fn swap_out<T: PartialEq>(list: &mut Vec<T>, value: &T) -> bool {
            match list.iter().position(|v| v == value) {
                Some(i) => {
                    list.swap_remove(i);
                    true
                }
                None => false,
            }
        }

        match member {
            Member::Object(id, category) => {
                // category may be stale if the object changed kind; fall back to a full sweep
                swap_out(self.bucket_mut(category), &id)
                    || ObjectCategory::ALL
                        .iter()
                        .any(|c| swap_out(self.bucket_mut(*c), &id))
            }
            Member::Sector(id) => swap_out(&mut self.sectors, &id),
            Member::Region(id) => swap_out(&mut self.regions, &id),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    max_depth: u32,
    quadtree_depth: Option<u32>,
}

impl Octree {
    /// Allocate every node down to `max_depth`
    pub fn build(config: &OctreeConfig) -> Self {
        let mut tree = Self {
            nodes: vec![OctreeNode::new(config.center, config.half_dimensions, None, 0)],
            max_depth: config.max_depth,
            quadtree_depth: config.quadtree_depth,
        };

        // breadth-first, so children always have larger indices than parents
        let mut i = 0;
        while i < tree.nodes.len() {
            let (center, half, depth) = {
                let n = &tree.nodes[i];
                (n.center, n.half_dimensions, n.depth)
            };

            if depth < tree.max_depth {
                let quad = tree.is_quad_depth(depth);
                let slots = if quad { 4 } else { 8 };
                for slot in 0..slots {
                    let (child_center, child_half) = child_bounds(center, half, slot, quad);
                    let id = NodeId(tree.nodes.len() as u32);
                    tree.nodes.push(OctreeNode::new(child_center, child_half, Some(NodeId(i as u32)), depth + 1));
                    tree.nodes[i].children[slot] = Some(id);
                }
            }
            i += 1;
        }

        log::debug!(
            "Built octree: {} nodes, max depth {}, quadtree below {:?}",
            tree.nodes.len(),
            tree.max_depth,
            tree.quadtree_depth
        );
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &OctreeNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut OctreeNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &OctreeNode)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i as u32), n))
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [OctreeNode] {
        &mut self.nodes
    }

    /// Nodes at or below this depth split in 4 and ignore height
    pub fn is_quad(&self, id: NodeId) -> bool {
        self.is_quad_depth(self.node(id).depth)
    }

    fn is_quad_depth(&self, depth: u32) -> bool {
        self.quadtree_depth.is_some_and(|q| depth >= q)
    }

    /// Child slot a point falls into. Points on a splitting plane go to the low side.
    pub fn child_slot(&self, id: NodeId, point: Vec3) -> usize {
        let node = self.node(id);
        let mut octant = 0;
        for i in 0..3 {
            if point[i] - node.center[i] > 0.0 {
                octant |= 1 << i;
            }
        }
        if self.is_quad(id) { QUAD_OCTANT[octant] } else { octant }
    }

    /// Insert `member` below `start`, where `depth` is the depth the caller
    /// attributes to `start`.
    ///
    /// The member stops at the first node whose splitting planes its sphere
    /// straddles, or at `max_depth`. Returns the node it was stored in.
    pub fn insert(&mut self, member: Member, sphere: &BoundingSphere, start: NodeId, depth: u32) -> Result<NodeId> {
        let mut id = start;
        let mut depth = depth;

        loop {
            let quad = self.is_quad(id);
            let node = self.node(id);

            let mut octant = 0;
            let mut straddle = false;
            for i in 0..3 {
                // height never pushes an object up in quadtree levels
                if quad && i == 1 {
                    continue;
                }
                let delta = sphere.center[i] - node.center[i];
                if delta.abs() < sphere.radius {
                    straddle = true;
                    break;
                }
                if delta > 0.0 {
                    octant |= 1 << i;
                }
            }

            if straddle || depth >= self.max_depth {
                self.node_mut(id).push(member);
                return Ok(id);
            }

            let slot = if quad { QUAD_OCTANT[octant] } else { octant };
            match node.children[slot] {
                Some(child) => {
                    id = child;
                    depth += 1;
                }
                None => return Err(Error::MissingChild { node: id, octant }),
            }
        }
    }

    /// Remove `member` from every bucket of `node`. Returns false if it was not there.
    pub fn remove(&mut self, member: Member, node: NodeId) -> bool {
        self.node_mut(node).erase(member)
    }

    /// Stamp `node` and all its ancestors with `time`
    pub fn touch(&mut self, node: NodeId, time: f64) {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node_mut(id);
            n.updated_at = time;
            current = n.parent;
        }
    }

    /// Deepest node reached from `start` by following the octant of `point`
    pub fn node_at_point(&self, start: NodeId, point: Vec3) -> NodeId {
        let mut id = start;
        while let Some(child) = self.node(id).children[self.child_slot(id, point)] {
            id = child;
        }
        id
    }

    /// Ancestors of `node`, nearest first, not including `node`
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(node).parent, move |id| self.node(*id).parent)
    }

    /// Nodes whose subtree changed at or after `time`, pruning stale subtrees
    pub fn updated_since(&self, time: f64) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.updated_at < time {
                continue;
            }
            out.push(id);
            stack.extend(node.child_ids());
        }
        out
    }
}

fn child_bounds(center: Vec3, half: Vec3, slot: usize, quad: bool) -> (Vec3, Vec3) {
    let sign = |bit: usize| if slot & bit != 0 { 1.0 } else { -1.0 };
    if quad {
        let child_half = Vec3::new(half.x * 0.5, half.y, half.z * 0.5);
        let offset = Vec3::new(sign(1), 0.0, sign(2)) * child_half;
        (center + offset, child_half)
    } else {
        let child_half = half * 0.5;
        let offset = Vec3::new(sign(1), sign(2), sign(4)) * child_half;
        (center + offset, child_half)
    }
}
