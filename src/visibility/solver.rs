//! Octree traversal producing draw lists

use crate::core::config::RenderSettings;
use crate::core::types::Vec3;
use crate::math::Frustum;
use crate::spatial::{NodeId, ObjectCategory};
use crate::world::{GameObject, ObjectId, SectorId, StabbingTree, World};
use super::culling::{cull_object, within_cutoff};
use super::portal::{visible_in_stabbing_node, VisibleSet};

/// Buckets walked when collecting drawable objects
const DRAWN: [ObjectCategory; 5] = [
    ObjectCategory::Static,
    ObjectCategory::Moving,
    ObjectCategory::Creature,
    ObjectCategory::Item,
    ObjectCategory::Light,
];

pub struct VisibilitySolver {
    settings: RenderSettings,
}

impl VisibilitySolver {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    /// Solver using the world's render settings
    pub fn for_world(world: &World) -> Self {
        Self::new(world.config().render.clone())
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    /// Every object of the octree that survives culling, farthest first
    pub fn get_visible_objects(&self, world: &World, frustum: &Frustum) -> Vec<ObjectId> {
        let found = self.collect(world, frustum, world.octree_root(), |_| true);
        log::trace!("{} visible objects", found.len());
        found
    }

    /// Draw list for the camera's sector: its objects, terrain when
    /// outdoors, and everything reached through visible portals
    pub fn get_visible_entries(&self, world: &World, frustum: &Frustum) -> VisibleSet {
        let sector = world.get_sector(frustum.eye());
        let mut set = VisibleSet::default();
        if let Some(s) = world.sector(sector) {
            visible_in_stabbing_node(self, world, frustum, s.stabbing_tree(), StabbingTree::ROOT, &mut set);
        }
        set.move_blended_last(world);
        log::trace!("{} entries visible from {}", set.len(), world.sector(sector).map_or("?", |s| s.name.as_str()));
        set
    }

    /// Objects of `sector` that survive culling, farthest first
    pub fn sector_objects(&self, world: &World, frustum: &Frustum, sector: SectorId) -> Vec<ObjectId> {
        let Some(s) = world.sector(sector) else {
            return Vec::new();
        };

        if s.is_outside() {
            // objects resolved to an indoor sector are drawn through its portals
            self.collect(world, frustum, s.octree_node(), |o| {
                o.current_sector().is_none_or(|c| c == SectorId::OUTSIDE)
            })
        } else {
            self.collect(world, frustum, s.octree_node(), |o| o.current_sector() == Some(sector))
        }
    }

    /// Up to `k` light emitters within the cutoff of `point`, nearest first
    pub fn lights_near(&self, world: &World, point: Vec3, k: usize) -> Vec<ObjectId> {
        let cutoff = self.settings.cutoff;
        let mut found: Vec<(ObjectId, f32)> = Vec::new();
        let mut stack = vec![world.octree_root()];

        while let Some(id) = stack.pop() {
            let node = world.octree().node(id);
            if !within_cutoff(&node.aabb(), point, cutoff) {
                continue;
            }
            for object in node.all_objects() {
                let Some(o) = world.object(object) else { continue };
                let distance = o.position.distance(point);
                if o.emits_light && distance <= cutoff {
                    found.push((object, distance));
                }
            }
            stack.extend(node.child_ids());
        }

        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found.truncate(k);
        found.into_iter().map(|(id, _)| id).collect()
    }

    /// Depth-first walk from `start`, pruning nodes beyond the cutoff or
    /// outside the frustum
    fn collect<F>(&self, world: &World, frustum: &Frustum, start: NodeId, keep: F) -> Vec<ObjectId>
    where
        F: Fn(&GameObject) -> bool,
    {
        let eye = frustum.eye();
        let mut found: Vec<(ObjectId, f32)> = Vec::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            let node = world.octree().node(id);
            let aabb = node.aabb();
            if !within_cutoff(&aabb, eye, self.settings.cutoff) || !frustum.test_aabb(&aabb) {
                continue;
            }

            for category in DRAWN {
                for &object in node.bucket(category) {
                    let Some(o) = world.object(object) else { continue };
                    if keep(o) && !cull_object(o, frustum, &self.settings) {
                        found.push((object, o.position.distance_squared(eye)));
                    }
                }
            }
            stack.extend(node.child_ids());
        }

        found.sort_by(|a, b| b.1.total_cmp(&a.1));
        found.into_iter().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Mat4;
    use crate::world::{GameObject, ObjectKind, RenderFlags};

    fn camera(eye: Vec3, forward: Vec3) -> Frustum {
        let proj = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 2000.0);
        let view = Mat4::look_at_rh(eye, eye + forward, Vec3::Y);
        Frustum::from_view_projection(&(proj * view), eye)
    }

    fn spawn(world: &mut World, name: &str, kind: ObjectKind, position: Vec3) -> ObjectId {
        world.add_object(GameObject::new(name, kind, position, 1.0)).unwrap()
    }

    #[test]
    fn test_visible_objects_sorted_farthest_first() {
        let mut world = World::default();
        let eye = Vec3::new(130.0, 2.0, 100.0);
        let near = spawn(&mut world, "near", ObjectKind::Static, Vec3::new(130.0, 2.0, 120.0));
        let far = spawn(&mut world, "far", ObjectKind::Creature, Vec3::new(130.0, 2.0, 300.0));
        let mid = spawn(&mut world, "mid", ObjectKind::Item, Vec3::new(135.0, 2.0, 200.0));
        let behind = spawn(&mut world, "behind", ObjectKind::Static, Vec3::new(130.0, 2.0, 50.0));

        let solver = VisibilitySolver::for_world(&world);
        let visible = solver.get_visible_objects(&world, &camera(eye, Vec3::Z));
        assert_eq!(visible, vec![far, mid, near]);
        assert!(!visible.contains(&behind));
    }

    #[test]
    fn test_cutoff_prunes_nodes() {
        let mut world = World::default();
        let eye = Vec3::new(130.0, 2.0, 100.0);
        let far = spawn(&mut world, "far", ObjectKind::Static, Vec3::new(130.0, 2.0, 1510.0));
        let giant = world
            .add_object(GameObject::new("giant", ObjectKind::Static, Vec3::new(130.0, 2.0, 1510.0), 200.0))
            .unwrap();

        let mut solver = VisibilitySolver::for_world(&world);
        solver.settings_mut().cutoff = 100.0;
        let visible = solver.get_visible_objects(&world, &camera(eye, Vec3::Z));
        assert!(!visible.contains(&far));

        solver.settings_mut().cutoff = 5000.0;
        solver.settings_mut().min_apparent_size = 0.0;
        let visible = solver.get_visible_objects(&world, &camera(eye, Vec3::Z));
        assert!(visible.contains(&far));
        assert!(visible.contains(&giant));
    }

    #[test]
    fn test_lights_are_drawn() {
        let mut world = World::default();
        let eye = Vec3::new(130.0, 2.0, 100.0);
        let torch = world
            .add_object(GameObject::new("torch", ObjectKind::Static, Vec3::new(130.0, 2.0, 130.0), 1.0).with_light(10.0))
            .unwrap();
        let hidden = world
            .add_object(
                GameObject::new("marker", ObjectKind::Static, Vec3::new(130.0, 2.0, 140.0), 1.0)
                    .with_render(RenderFlags { never_draw: true, ..Default::default() }),
            )
            .unwrap();

        let solver = VisibilitySolver::for_world(&world);
        let visible = solver.get_visible_objects(&world, &camera(eye, Vec3::Z));
        assert_eq!(visible, vec![torch]);
        assert!(!visible.contains(&hidden));
    }

    #[test]
    fn test_lights_near() {
        let mut world = World::default();
        let p = Vec3::new(500.0, 0.0, 500.0);
        let a = world
            .add_object(GameObject::new("a", ObjectKind::Static, p + Vec3::X * 5.0, 0.5).with_light(8.0))
            .unwrap();
        let b = world
            .add_object(GameObject::new("b", ObjectKind::Static, p + Vec3::Z * 2.0, 0.5).with_light(8.0))
            .unwrap();
        let c = world
            .add_object(GameObject::new("c", ObjectKind::Creature, p - Vec3::X * 9.0, 0.5).with_light(3.0))
            .unwrap();
        world
            .add_object(GameObject::new("d", ObjectKind::Static, p + Vec3::X, 0.5))
            .unwrap();
        world
            .add_object(GameObject::new("e", ObjectKind::Static, p + Vec3::X * 3000.0, 0.5).with_light(8.0))
            .unwrap();

        let solver = VisibilitySolver::for_world(&world);
        assert_eq!(solver.lights_near(&world, p, 2), vec![b, a]);
        assert_eq!(solver.lights_near(&world, p, 10), vec![b, a, c]);
    }
}
