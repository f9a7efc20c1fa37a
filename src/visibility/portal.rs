//! Sector-to-sector visibility through portals.
//!
//! Traversal follows the camera sector's stabbing tree. A child is entered
//! only when the portal leading to it is on screen, or when the camera is
//! close enough to touch the doorway. Cave portals pull in the far sector's
//! objects without going any further.

use rustc_hash::FxHashSet;

use crate::core::types::Vec4;
use crate::math::intersect::sphere_triangle;
use crate::math::{BoundingSphere, Frustum};
use crate::world::{ObjectId, Portal, PortalId, SectorId, StabbingTree, World};
use super::solver::VisibilitySolver;

/// Camera sphere used to keep a portal open while walking through it
pub const NEAR_PORTAL_RADIUS: f32 = 0.75;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisibleEntry {
    /// Draw the outdoor height map
    Terrain,
    Object(ObjectId),
    /// Doorway polygons the camera looks through
    Portal(PortalId),
}

/// Draw list produced by a stabbing-tree traversal
#[derive(Clone, Debug, Default)]
pub struct VisibleSet {
    pub entries: Vec<VisibleEntry>,
    /// Set when outside looks into an indoor sector; plane `y = portal height`
    pub clip_plane: Option<Vec4>,
    sectors: FxHashSet<SectorId>,
}

impl VisibleSet {
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.iter().filter_map(|e| match e {
            VisibleEntry::Object(id) => Some(*id),
            _ => None,
        })
    }

    pub fn portals(&self) -> impl Iterator<Item = PortalId> + '_ {
        self.entries.iter().filter_map(|e| match e {
            VisibleEntry::Portal(id) => Some(*id),
            _ => None,
        })
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains(&VisibleEntry::Object(id))
    }

    pub fn draws_terrain(&self) -> bool {
        self.entries.contains(&VisibleEntry::Terrain)
    }

    /// Sectors whose contents were added
    pub fn sectors(&self) -> impl Iterator<Item = SectorId> + '_ {
        self.sectors.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable partition putting transparent, particle and darkness objects last
    pub fn move_blended_last(&mut self, world: &World) {
        let blended = |e: &VisibleEntry| match e {
            VisibleEntry::Object(id) => world.object(*id).is_some_and(|o| o.render.is_blended()),
            VisibleEntry::Terrain | VisibleEntry::Portal(_) => false,
        };
        let (opaque, translucent): (Vec<VisibleEntry>, Vec<VisibleEntry>) =
            self.entries.drain(..).partition(|e| !blended(e));
        self.entries = opaque;
        self.entries.extend(translucent);
    }

    fn add_sector(&mut self, solver: &VisibilitySolver, world: &World, frustum: &Frustum, sector: SectorId) {
        if !self.sectors.insert(sector) {
            return;
        }
        if sector == SectorId::OUTSIDE {
            self.entries.push(VisibleEntry::Terrain);
        }
        self.entries.extend(
            solver
                .sector_objects(world, frustum, sector)
                .into_iter()
                .map(VisibleEntry::Object),
        );
    }
}

/// On screen, or within reach of the camera
pub fn portal_visible(portal: &Portal, frustum: &Frustum) -> bool {
    let near = BoundingSphere::new(frustum.eye(), NEAR_PORTAL_RADIUS);
    portal
        .triangles()
        .any(|t| frustum.test_triangle(t.a, t.b, t.c) || sphere_triangle(&near, &t))
}

/// Add the sector at `index` of `tree` and recurse into children whose
/// portals pass [`portal_visible`]
pub fn visible_in_stabbing_node(
    solver: &VisibilitySolver,
    world: &World,
    frustum: &Frustum,
    tree: &StabbingTree,
    index: usize,
    set: &mut VisibleSet,
) {
    let id = tree.node(index).sector;
    let Some(sector) = world.sector(id) else {
        return;
    };
    set.add_sector(solver, world, frustum, id);

    for (child_index, child) in tree.children(index) {
        let Some(portal) = sector.portal_to(child.sector) else {
            log::trace!("{} has no portal to sector {:?}", sector.name, child.sector);
            continue;
        };

        if portal.cave {
            set.entries.push(VisibleEntry::Portal(portal.id));
            set.add_sector(solver, world, frustum, child.sector);
            continue;
        }
        if !portal_visible(portal, frustum) {
            continue;
        }
        set.entries.push(VisibleEntry::Portal(portal.id));

        if sector.is_outside() && set.clip_plane.is_none() {
            set.clip_plane = Some(Vec4::new(0.0, 1.0, 0.0, -portal.position.y));
        }
        visible_in_stabbing_node(solver, world, frustum, tree, child_index, set);
    }
}
