//! Axis-aligned trigger regions used by scripted enter/leave events

use crate::core::types::Vec3;
use crate::math::{Aabb, BoundingSphere};
use crate::spatial::NodeId;
use super::object::ObjectId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);

#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub aabb: Aabb,
    pub(crate) octree_node: Option<NodeId>,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, aabb: Aabb) -> Self {
        Self {
            id,
            name: name.into(),
            aabb,
            octree_node: None,
        }
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.aabb.contains_point(p)
    }

    /// Sphere used to place the region in the octree
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.aabb.center(), self.aabb.half_extent().length())
    }

    pub fn octree_node(&self) -> Option<NodeId> {
        self.octree_node
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionEventKind {
    Enter,
    Leave,
}

/// Emitted when an object crosses a region boundary during repositioning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionEvent {
    pub kind: RegionEventKind,
    pub region: RegionId,
    pub name: String,
    pub object: ObjectId,
}
