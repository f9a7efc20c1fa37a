//! Sectors and the portals connecting them

use std::collections::BTreeMap;

use crate::core::types::Vec3;
use crate::math::{BoundingSphere, ConvexHull, Polygon, Triangle};
use crate::spatial::NodeId;
use super::stabbing::StabbingTree;

/// Name of the single outdoor sector
pub const OUTSIDE_NAME: &str = "outside";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorId(pub u32);

impl SectorId {
    /// The outdoor sector is always created first
    pub const OUTSIDE: SectorId = SectorId(0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(pub u32);

/// Polygon-bounded opening from one sector into another
#[derive(Clone, Debug, PartialEq)]
pub struct Portal {
    pub id: PortalId,
    pub from: SectorId,
    pub to: SectorId,
    pub position: Vec3,
    /// World-space polygons
    pub polygons: Vec<Polygon>,
    /// Cave entrances contribute the far sector's objects without recursion
    pub cave: bool,
}

impl Portal {
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.polygons.iter().flat_map(Polygon::triangles)
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        let vertices: Vec<Vec3> = self
            .polygons
            .iter()
            .flat_map(|p| p.vertices.iter().copied())
            .collect();
        if vertices.is_empty() {
            BoundingSphere::new(self.position, 0.0)
        } else {
            BoundingSphere::from_points(&vertices)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    pub position: Vec3,
    pub rotation_y: f32,
    /// Hull in sector-local space (rotation applied, translation not)
    pub hull: ConvexHull,
    /// World-space bounding sphere of the hull
    pub bounding_sphere: BoundingSphere,
    pub lighting_color: Vec3,
    pub(crate) octree_node: NodeId,
    pub(crate) portals: BTreeMap<SectorId, Portal>,
    pub(crate) stabbing_tree: StabbingTree,
    /// False while the tree is derived from the portal list
    pub(crate) tree_authored: bool,
}

impl Sector {
    pub(crate) fn outside(root: NodeId) -> Self {
        Self {
            id: SectorId::OUTSIDE,
            name: OUTSIDE_NAME.to_string(),
            position: Vec3::ZERO,
            rotation_y: 0.0,
            hull: ConvexHull::default(),
            bounding_sphere: BoundingSphere::default(),
            lighting_color: Vec3::ONE,
            octree_node: root,
            portals: BTreeMap::new(),
            stabbing_tree: StabbingTree::leaf(SectorId::OUTSIDE),
            tree_authored: false,
        }
    }

    pub(crate) fn indoor(id: SectorId, name: String, position: Vec3, rotation_y: f32, hull: ConvexHull) -> Self {
        let bounding_sphere = hull.bounding_sphere().translated(position);
        Self {
            id,
            name,
            position,
            rotation_y,
            hull,
            bounding_sphere,
            lighting_color: Vec3::ONE,
            // placeholder until the sector is inserted into the outdoor octree
            octree_node: NodeId::ROOT,
            portals: BTreeMap::new(),
            stabbing_tree: StabbingTree::leaf(id),
            tree_authored: false,
        }
    }

    pub fn is_outside(&self) -> bool {
        self.id == SectorId::OUTSIDE
    }

    /// Bounding-sphere rejection followed by the hull half-space test
    pub fn contains_point(&self, p: Vec3) -> bool {
        !self.is_outside()
            && self.bounding_sphere.contains_point(p)
            && self.hull.contains_point(p - self.position)
    }

    /// Node the sector is registered in (the octree root for "outside")
    pub fn octree_node(&self) -> NodeId {
        self.octree_node
    }

    pub fn portals(&self) -> &BTreeMap<SectorId, Portal> {
        &self.portals
    }

    pub fn portal_to(&self, to: SectorId) -> Option<&Portal> {
        self.portals.get(&to)
    }

    pub fn stabbing_tree(&self) -> &StabbingTree {
        &self.stabbing_tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;

    fn room() -> Sector {
        let hull = ConvexHull::from_aabb(&Aabb::new(Vec3::splat(-5.0), Vec3::splat(5.0)));
        Sector::indoor(SectorId(1), "room".into(), Vec3::new(100.0, 0.0, 100.0), 0.0, hull)
    }

    #[test]
    fn test_contains_point_uses_position() {
        let sector = room();
        assert!(sector.contains_point(Vec3::new(102.0, 1.0, 98.0)));
        assert!(!sector.contains_point(Vec3::new(2.0, 1.0, -2.0)));
        assert!((sector.bounding_sphere.center - Vec3::new(100.0, 0.0, 100.0)).length() < 1e-4);
    }

    #[test]
    fn test_outside_never_claims_points() {
        let outside = Sector::outside(NodeId::ROOT);
        assert!(outside.is_outside());
        assert!(!outside.contains_point(Vec3::ZERO));
        assert_eq!(outside.stabbing_tree().root().sector, SectorId::OUTSIDE);
    }

    #[test]
    fn test_portal_triangles() {
        let portal = Portal {
            id: PortalId(7),
            from: SectorId(0),
            to: SectorId(1),
            position: Vec3::ZERO,
            polygons: vec![Polygon::new(vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y])],
            cave: false,
        };
        assert_eq!(portal.triangles().count(), 2);
        assert!(portal.bounding_sphere().contains_point(Vec3::new(1.0, 1.0, 0.0)));
    }
}
