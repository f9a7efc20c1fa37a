//! The world context.
//!
//! `World` owns every object, the octree, the sector graph, trigger regions
//! and the terrain grid. Subsystems receive it by reference; threads share
//! it through [`SharedWorld`], whose mutex makes each reinsertion atomic.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::core::config::WorldConfig;
use crate::core::time::WorldClock;
use crate::core::types::{IVec2, Result, Vec3};
use crate::core::Error;
use crate::math::polygon::y_rotation;
use crate::math::{Aabb, BoundingSphere, ConvexHull, Polygon};
use crate::query::terrain::{self, HeightMap};
use crate::spatial::{self, classify, Member, NodeId, Octree};
use super::object::{GameObject, ObjectId, PhysicsBehavior};
use super::region::{Region, RegionEvent, RegionEventKind, RegionId};
use super::sector::{Portal, PortalId, Sector, SectorId, OUTSIDE_NAME};
use super::stabbing::{StabbingBranch, StabbingTree};

/// World handle shared between the main loop and worker threads
pub type SharedWorld = Arc<Mutex<World>>;

pub struct World {
    config: WorldConfig,
    clock: WorldClock,
    octree: Octree,
    objects: SlotMap<ObjectId, GameObject>,
    object_names: FxHashMap<String, ObjectId>,
    sectors: Vec<Sector>,
    sector_names: FxHashMap<String, SectorId>,
    next_portal: u32,
    regions: Vec<Region>,
    region_names: FxHashMap<String, RegionId>,
    region_events: Vec<RegionEvent>,
    terrain: Option<HeightMap>,
    player: Option<ObjectId>,
}

impl World {
    /// Empty world with the octree fully built and the outdoor sector in place
    pub fn new(config: WorldConfig) -> Self {
        let octree = Octree::build(&config.octree);
        let outside = Sector::outside(octree.root());

        let mut sector_names = FxHashMap::default();
        sector_names.insert(OUTSIDE_NAME.to_string(), SectorId::OUTSIDE);

        log::info!(
            "Created world: octree of {} nodes around {} (half {})",
            octree.len(),
            config.octree.center,
            config.octree.half_dimensions
        );

        Self {
            config,
            clock: WorldClock::new(),
            octree,
            objects: SlotMap::with_key(),
            object_names: FxHashMap::default(),
            sectors: vec![outside],
            sector_names,
            next_portal: 0,
            regions: Vec::new(),
            region_names: FxHashMap::default(),
            region_events: Vec::new(),
            terrain: None,
            player: None,
        }
    }

    pub fn into_shared(self) -> SharedWorld {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut WorldClock {
        &mut self.clock
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn octree_root(&self) -> NodeId {
        self.octree.root()
    }

    // ---- objects ----

    /// Add an object and place it in the tree
    pub fn add_object(&mut self, object: GameObject) -> Result<ObjectId> {
        let name = object.name.clone();
        let id = self.objects.insert(object);
        if !name.is_empty() {
            if let Some(previous) = self.object_names.insert(name.clone(), id) {
                log::debug!("Object name {name} now refers to {id:?} instead of {previous:?}");
            }
        }
        self.update_object_position(id)?;
        Ok(id)
    }

    /// Add an object authored inside `sector`. Fixed objects whose hull test
    /// fails (walls, door frames on the hull face) stay members of it while
    /// their bounding sphere still touches the sector.
    pub fn add_object_in_sector(&mut self, mut object: GameObject, sector: SectorId) -> Result<ObjectId> {
        if self.sector(sector).is_none() {
            return Err(Error::UnknownSector(format!("#{}", sector.0)));
        }
        object.home_sector = Some(sector).filter(|s| *s != SectorId::OUTSIDE);
        self.add_object(object)
    }

    /// Remove an object from the world and the tree
    pub fn remove_object(&mut self, id: ObjectId) -> Option<GameObject> {
        let object = self.objects.remove(id)?;
        if let Some(node) = object.octree_node {
            self.octree.remove(Member::Object(id, classify(&object)), node);
            let now = self.clock.now();
            self.octree.touch(node, now);
        }
        if self.object_names.get(&object.name) == Some(&id) {
            self.object_names.remove(&object.name);
        }
        if let Some(region) = object.current_region {
            self.push_region_event(RegionEventKind::Leave, region, id);
        }
        if self.player == Some(id) {
            self.player = None;
        }
        Some(object)
    }

    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Mutable access. Position changes must be followed by
    /// [`World::update_object_position`].
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    pub fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.object_names.get(name).copied()
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> + '_ {
        self.objects.iter()
    }

    pub(crate) fn object_map(&self) -> &SlotMap<ObjectId, GameObject> {
        &self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Move an object and reposition it
    pub fn set_position(&mut self, id: ObjectId, position: Vec3) -> Result<Option<NodeId>> {
        let object = self.objects.get_mut(id).ok_or(Error::UnknownObject(id))?;
        object.prev_position = object.position;
        object.position = position;
        self.update_object_position(id)
    }

    pub fn set_player(&mut self, id: ObjectId) -> Result<()> {
        if !self.objects.contains_key(id) {
            return Err(Error::UnknownObject(id));
        }
        self.player = Some(id);
        Ok(())
    }

    pub fn player(&self) -> Option<ObjectId> {
        self.player
    }

    // ---- octree placement ----

    /// Insert an object below `node`, which the caller places at `depth`.
    /// The object is first taken out of the node it currently occupies.
    pub fn insert_object_into_octree(&mut self, id: ObjectId, node: NodeId, depth: u32) -> Result<NodeId> {
        let object = self.objects.get(id).ok_or(Error::UnknownObject(id))?;
        let member = Member::Object(id, classify(object));
        let sphere = object.transformed_bounding_sphere();
        if let Some(previous) = object.octree_node {
            self.octree.remove(member, previous);
        }
        self.objects[id].octree_node = None;

        let placed = self.octree.insert(member, &sphere, node, depth)?;
        self.objects[id].octree_node = Some(placed);
        Ok(placed)
    }

    /// Re-place an object after its position changed.
    ///
    /// Recomputes sector and region membership, reinserts the object from
    /// its sector's node and stamps the touched nodes. Returns `Ok(None)`
    /// for camera-fixed objects and for non-finite positions, which leave
    /// the tree untouched.
    pub fn update_object_position(&mut self, id: ObjectId) -> Result<Option<NodeId>> {
        let object = self.objects.get(id).ok_or(Error::UnknownObject(id))?;
        if object.kind.is_camera_fixed() {
            return Ok(None);
        }

        let position = object.position;
        if !position.is_finite() {
            log::warn!("Not repositioning {} ({id:?}): position {position} is not finite", object.name);
            return Ok(None);
        }

        let member = Member::Object(id, classify(object));
        let sphere = object.transformed_bounding_sphere();
        let previous_node = object.octree_node;
        let previous_sector = object.current_sector;
        let previous_region = object.current_region;
        let home = object.home_sector.filter(|_| object.physics == PhysicsBehavior::Fixed);

        if let Some(node) = previous_node {
            self.octree.remove(member, node);
        }
        self.objects[id].octree_node = None;

        // staying inside the same indoor sector skips the descent
        let mut sector = match previous_sector {
            Some(s) if self.sectors[s.0 as usize].contains_point(position) => s,
            _ => self.get_sector(position),
        };
        if sector == SectorId::OUTSIDE {
            if let Some(home) = self.pinned_sector(home, &sphere) {
                sector = home;
            }
        }

        let start = self.sectors[sector.0 as usize].octree_node;
        let depth = self.octree.node(start).depth;
        let node = self.octree.insert(member, &sphere, start, depth)?;

        let region = self.get_region(position);
        if region != previous_region {
            if let Some(r) = previous_region {
                self.push_region_event(RegionEventKind::Leave, r, id);
            }
            if let Some(r) = region {
                self.push_region_event(RegionEventKind::Enter, r, id);
            }
        }

        let now = self.clock.now();
        if let Some(previous) = previous_node.filter(|p| *p != node) {
            self.octree.touch(previous, now);
        }
        self.octree.touch(node, now);

        let object = &mut self.objects[id];
        object.octree_node = Some(node);
        object.current_sector = Some(sector);
        object.current_region = region;

        log::trace!("{} placed in node {node:?}, sector {sector:?}", object.name);
        Ok(Some(node))
    }

    /// Authored sector of a fixed object, while its sphere still touches it
    fn pinned_sector(&self, home: Option<SectorId>, sphere: &BoundingSphere) -> Option<SectorId> {
        let home = home?;
        self.sectors
            .get(home.0 as usize)?
            .bounding_sphere
            .intersects(sphere)
            .then_some(home)
    }

    /// Build the sorted static lists used by [`World::static_candidates`]
    pub fn generate_optimized_octree(&mut self) -> usize {
        spatial::generate_optimized_octree(&mut self.octree, &self.objects)
    }

    /// Fixed colliders an object could touch. Missiles use the sphere
    /// swept between their previous and current positions.
    pub fn static_candidates(&self, id: ObjectId) -> Result<Vec<ObjectId>> {
        let object = self.objects.get(id).ok_or(Error::UnknownObject(id))?;
        let sphere = if object.is_missile() {
            let travel = object.position - object.prev_position;
            BoundingSphere::new(
                object.prev_position + object.bounding_sphere.center + travel * 0.5,
                travel.length() * 0.5 + object.bounding_sphere.radius,
            )
        } else {
            object.transformed_bounding_sphere()
        };

        let node = object
            .octree_node
            .unwrap_or_else(|| self.octree.node_at_point(self.octree.root(), sphere.center));

        let mut found = spatial::static_candidates(&self.octree, node, &sphere);
        found.retain(|c| *c != id);
        Ok(found)
    }

    /// Creatures within `radius` of `point`
    pub fn creatures_near(&self, point: Vec3, radius: f32) -> Vec<ObjectId> {
        let mut found = Vec::new();
        let mut stack = vec![self.octree.root()];
        while let Some(id) = stack.pop() {
            let node = self.octree.node(id);
            if node.aabb().axis_distance(point).max_element() > radius {
                continue;
            }
            found.extend(node.creatures.iter().copied().filter(|c| {
                self.objects
                    .get(*c)
                    .is_some_and(|o| o.position.distance(point) <= radius)
            }));
            stack.extend(node.child_ids());
        }
        found
    }

    // ---- sectors ----

    /// Sector containing `point`, or the outdoor sector when no hull claims it
    pub fn get_sector(&self, point: Vec3) -> SectorId {
        let mut id = self.outside().octree_node;
        loop {
            let node = self.octree.node(id);
            if let Some(s) = node
                .sectors
                .iter()
                .copied()
                .find(|s| self.sectors[s.0 as usize].contains_point(point))
            {
                return s;
            }

            match node.children[self.octree.child_slot(id, point)] {
                Some(child) => id = child,
                None => return SectorId::OUTSIDE,
            }
        }
    }

    pub fn outside(&self) -> &Sector {
        &self.sectors[SectorId::OUTSIDE.0 as usize]
    }

    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(id.0 as usize)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sector_by_name(&self, name: &str) -> Option<&Sector> {
        self.sector_names.get(name).and_then(|id| self.sector(*id))
    }

    /// Look up a sector id, failing for unknown names
    pub fn sector_id(&self, name: &str) -> Result<SectorId> {
        self.sector_names
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSector(name.to_string()))
    }

    fn sector_name(&self, id: SectorId) -> String {
        self.sector(id)
            .map_or_else(|| format!("#{}", id.0), |s| s.name.clone())
    }

    fn sector_mut(&mut self, id: SectorId) -> Result<&mut Sector> {
        self.sectors
            .get_mut(id.0 as usize)
            .ok_or_else(|| Error::UnknownSector(format!("#{}", id.0)))
    }

    /// Register an indoor sector. `mesh` is the hull in sector-local space
    /// before rotation around +Y.
    pub fn add_sector(&mut self, name: impl Into<String>, position: Vec3, rotation_y: f32, mesh: &[Polygon]) -> Result<SectorId> {
        let name = name.into();
        if self.sector_names.contains_key(&name) {
            return Err(Error::DuplicateSector(name));
        }

        let rotation = y_rotation(rotation_y);
        let hull = ConvexHull::new(mesh.iter().map(|p| p.transformed(&rotation)).collect());

        let id = SectorId(self.sectors.len() as u32);
        let mut sector = Sector::indoor(id, name.clone(), position, rotation_y, hull);
        let root = self.octree.root();
        sector.octree_node = self.octree.insert(Member::Sector(id), &sector.bounding_sphere, root, 0)?;

        let node = self.octree.node(sector.octree_node);
        log::debug!(
            "Sector {name} at {position}: octree node {:?} (center {}, half {})",
            sector.octree_node,
            node.center,
            node.half_dimensions
        );

        self.sector_names.insert(name, id);
        self.sectors.push(sector);

        let moved = self.reassign_objects_in(id)?;
        if moved > 0 {
            log::debug!("{moved} existing objects moved into sector {}", self.sector_name(id));
        }
        Ok(id)
    }

    /// Re-place objects that a newly added sector now claims
    fn reassign_objects_in(&mut self, id: SectorId) -> Result<usize> {
        let sector = &self.sectors[id.0 as usize];
        let reach = sector.bounding_sphere;

        let mut claimed = Vec::new();
        let mut stack = vec![self.octree.root()];
        while let Some(node) = stack.pop() {
            let node = self.octree.node(node);
            if node.aabb().axis_distance(reach.center).max_element() > reach.radius {
                continue;
            }
            claimed.extend(node.all_objects().filter(|o| {
                self.objects.get(*o).is_some_and(|obj| {
                    obj.current_sector != Some(id) && sector.contains_point(obj.position)
                })
            }));
            stack.extend(node.child_ids());
        }

        for object in &claimed {
            self.update_object_position(*object)?;
        }
        Ok(claimed.len())
    }

    pub fn set_sector_lighting(&mut self, id: SectorId, color: Vec3) -> Result<()> {
        self.sector_mut(id)?.lighting_color = color;
        Ok(())
    }

    /// Add a portal stored at `from.portals[to]`. `mesh` is in portal-local
    /// space, rotated around +Y and moved to `position`.
    pub fn add_portal(
        &mut self,
        from: SectorId,
        to: SectorId,
        position: Vec3,
        rotation_y: f32,
        mesh: &[Polygon],
        cave: bool,
    ) -> Result<PortalId> {
        if self.sector(to).is_none() {
            return Err(Error::UnknownSector(format!("#{}", to.0)));
        }

        let rotation = y_rotation(rotation_y);
        let polygons = mesh
            .iter()
            .map(|p| p.transformed(&rotation).translated(position))
            .collect();

        let id = PortalId(self.next_portal);
        let portal = Portal { id, from, to, position, polygons, cave };

        let sector = self.sector_mut(from)?;
        if sector.portals.insert(to, portal).is_some() {
            log::warn!("Portal from {} to sector #{} replaced", sector.name, to.0);
        }
        self.next_portal += 1;

        if !self.sectors[from.0 as usize].tree_authored {
            let branches: Vec<StabbingBranch> = self.sectors[from.0 as usize]
                .portals
                .keys()
                .map(|s| StabbingBranch::leaf(*s))
                .collect();
            let tree = StabbingTree::build(from, &branches, |s| self.sector_name(s))?;
            self.sectors[from.0 as usize].stabbing_tree = tree;
        }

        log::debug!(
            "Portal {id:?}: {} -> {}{}",
            self.sector_name(from),
            self.sector_name(to),
            if cave { " (cave)" } else { "" }
        );
        Ok(id)
    }

    /// Replace the stabbing tree of `sector` with authored branches
    pub fn set_stabbing_tree(&mut self, sector: SectorId, branches: &[StabbingBranch]) -> Result<()> {
        fn check(world: &World, branch: &StabbingBranch) -> Result<()> {
            if world.sector(branch.sector).is_none() {
                return Err(Error::UnknownSector(format!("#{}", branch.sector.0)));
            }
            branch.children.iter().try_for_each(|c| check(world, c))
        }
        branches.iter().try_for_each(|b| check(self, b))?;

        let tree = StabbingTree::build(sector, branches, |s| self.sector_name(s))?;
        let target = self.sector_mut(sector)?;
        target.stabbing_tree = tree;
        target.tree_authored = true;
        Ok(())
    }

    // ---- regions ----

    pub fn add_region(&mut self, name: impl Into<String>, aabb: Aabb) -> Result<RegionId> {
        let name = name.into();
        if self.region_names.contains_key(&name) {
            return Err(Error::DuplicateRegion(name));
        }

        let id = RegionId(self.regions.len() as u32);
        let mut region = Region::new(id, name.clone(), aabb);
        let root = self.octree.root();
        region.octree_node = Some(self.octree.insert(Member::Region(id), &region.bounding_sphere(), root, 0)?);

        log::debug!("Region {name} registered at node {:?}", region.octree_node);
        self.region_names.insert(name, id);
        self.regions.push(region);
        Ok(id)
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0 as usize)
    }

    pub fn region_by_name(&self, name: &str) -> Option<&Region> {
        self.region_names.get(name).and_then(|id| self.region(*id))
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Region containing `point`, found by octant descent
    pub fn get_region(&self, point: Vec3) -> Option<RegionId> {
        let mut id = self.octree.root();
        loop {
            let node = self.octree.node(id);
            if let Some(r) = node
                .regions
                .iter()
                .copied()
                .find(|r| self.regions[r.0 as usize].contains_point(point))
            {
                return Some(r);
            }

            id = node.children[self.octree.child_slot(id, point)]?;
        }
    }

    fn push_region_event(&mut self, kind: RegionEventKind, region: RegionId, object: ObjectId) {
        let name = self.regions[region.0 as usize].name.clone();
        log::debug!("Object {object:?} {kind:?} region {name}");
        self.region_events.push(RegionEvent { kind, region, name, object });
    }

    /// Enter/leave events since the last drain, oldest first
    pub fn drain_region_events(&mut self) -> Vec<RegionEvent> {
        std::mem::take(&mut self.region_events)
    }

    /// Whether the object was inside the named region at its last repositioning
    pub fn is_inside_region(&self, id: ObjectId, region: &str) -> bool {
        let Some(target) = self.region_names.get(region) else {
            return false;
        };
        self.objects
            .get(id)
            .is_some_and(|o| o.current_region == Some(*target))
    }

    // ---- terrain ----

    pub fn set_terrain(&mut self, terrain: HeightMap) {
        self.terrain = Some(terrain);
    }

    pub fn terrain(&self) -> Option<&HeightMap> {
        self.terrain.as_ref()
    }

    /// Terrain tile hit by the segment, `None` without terrain or on a miss
    pub fn collide_ray_against_terrain(&self, start: Vec3, end: Vec3) -> Option<IVec2> {
        terrain::collide_ray_against_terrain(self.terrain.as_ref()?, start, end)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}
