//! Closest-hit ray queries over the octree.
//!
//! Broad phase is a slab test per node; only nodes entered within the
//! query distance are descended. Every object in a surviving node goes to
//! the narrow phase of its collision shape.

use crate::core::types::Vec3;
use crate::math::Ray;
use crate::spatial::ObjectCategory;
use crate::world::{GameObject, ObjectId, World};
use super::narrow::intersect_shape;

/// Which objects a ray query may return
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IntersectMode {
    #[default]
    All,
    /// Anything with a collision shape, items excluded
    Collidable,
    /// Only pickable items
    Items,
}

impl IntersectMode {
    fn categories(self) -> &'static [ObjectCategory] {
        use ObjectCategory::*;
        match self {
            IntersectMode::All => &[Static, Light, Moving, Creature, Item],
            IntersectMode::Collidable => &[Static, Light, Moving, Creature],
            IntersectMode::Items => &[Item],
        }
    }

    fn accepts(self, object: &GameObject) -> bool {
        match self {
            IntersectMode::Collidable => object.is_collidable(),
            IntersectMode::All | IntersectMode::Items => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub object: ObjectId,
    /// Distance from the origin along the normalized direction
    pub t: f32,
    pub point: Vec3,
}

/// Closest object hit by the ray within `max_distance`.
///
/// `direction` need not be normalized. Ties keep the object found first.
pub fn intersect_ray_objects(
    world: &World,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    mode: IntersectMode,
) -> Option<RayHit> {
    let direction = direction.try_normalize()?;
    if !origin.is_finite() || max_distance.is_nan() || max_distance < 0.0 {
        return None;
    }
    let ray = Ray::new(origin, direction);

    let octree = world.octree();
    let mut best: Option<(ObjectId, f32)> = None;
    let mut stack = vec![world.octree_root()];
    let mut visited = 0usize;

    while let Some(id) = stack.pop() {
        let node = octree.node(id);
        if !ray.hits_aabb_within(&node.aabb(), max_distance) {
            continue;
        }
        visited += 1;

        for &category in mode.categories() {
            for &object in node.bucket(category) {
                let Some(o) = world.object(object) else { continue };
                if !mode.accepts(o) {
                    continue;
                }
                let Some(t) = intersect_shape(o, &ray) else { continue };
                if t <= max_distance && best.is_none_or(|(_, b)| t < b) {
                    best = Some((object, t));
                }
            }
        }
        stack.extend(node.child_ids());
    }

    log::trace!("ray from {origin} visited {visited} nodes, hit {best:?}");
    best.map(|(object, t)| RayHit { object, t, point: ray.at(t) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Aabb, BoundingSphere};
    use crate::world::{CollisionShape, ObjectKind, PhysicsBehavior};

    const ORIGIN: Vec3 = Vec3::new(500.0, 10.0, 500.0);

    fn add(world: &mut World, object: GameObject) -> ObjectId {
        world.add_object(object).unwrap()
    }

    /// Box at +20, sphere at +40 and a bone-sphere creature at +60 along X
    fn lineup() -> (World, [ObjectId; 3]) {
        let mut world = World::default();
        let crate_box = add(
            &mut world,
            GameObject::new("crate", ObjectKind::Static, ORIGIN + Vec3::X * 20.0, 1.8)
                .with_collision(CollisionShape::Obb(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)))),
        );
        let ball = add(
            &mut world,
            GameObject::new("ball", ObjectKind::Moving, ORIGIN + Vec3::X * 40.0, 1.0)
                .with_collision(CollisionShape::Sphere),
        );
        let mut troll = GameObject::new("troll", ObjectKind::Creature, ORIGIN + Vec3::X * 60.0, 3.0)
            .with_collision(CollisionShape::Bones);
        troll.set_bone_spheres(vec![
            BoundingSphere::new(ORIGIN + Vec3::new(60.0, 2.0, 0.0), 1.0),
            BoundingSphere::new(ORIGIN + Vec3::new(60.0, 0.0, 0.0), 0.5),
        ]);
        let troll = add(&mut world, troll);
        (world, [crate_box, ball, troll])
    }

    #[test]
    fn test_closest_hit_wins() {
        let (world, [crate_box, _, _]) = lineup();
        let hit = intersect_ray_objects(&world, ORIGIN, Vec3::X, 100.0, IntersectMode::All).unwrap();
        assert_eq!(hit.object, crate_box);
        assert!((hit.t - 19.0).abs() < 1e-3);
        assert!((hit.point - (ORIGIN + Vec3::X * 19.0)).length() < 1e-3);
    }

    #[test]
    fn test_hits_never_exceed_max_distance() {
        let (world, [crate_box, ball, troll]) = lineup();
        assert_eq!(intersect_ray_objects(&world, ORIGIN, Vec3::X, 10.0, IntersectMode::All), None);

        // from just past each object, the next one is found within range
        let hit = intersect_ray_objects(&world, ORIGIN + Vec3::X * 25.0, Vec3::X, 20.0, IntersectMode::All).unwrap();
        assert_eq!(hit.object, ball);
        assert!(hit.t <= 20.0);

        let hit = intersect_ray_objects(&world, ORIGIN + Vec3::X * 45.0, Vec3::X, 20.0, IntersectMode::All).unwrap();
        assert_eq!(hit.object, troll);
        assert!((hit.t - 14.5).abs() < 1e-3);

        assert_eq!(intersect_ray_objects(&world, ORIGIN + Vec3::X * 45.0, Vec3::X, 14.0, IntersectMode::All), None);

        // backwards from between the crate and the ball
        let hit = intersect_ray_objects(&world, ORIGIN + Vec3::X * 30.0, Vec3::NEG_X, 100.0, IntersectMode::All).unwrap();
        assert_eq!(hit.object, crate_box);
        assert!((hit.t - 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_unnormalized_direction() {
        let (world, [crate_box, _, _]) = lineup();
        let hit = intersect_ray_objects(&world, ORIGIN, Vec3::X * 7.0, 100.0, IntersectMode::All).unwrap();
        assert_eq!(hit.object, crate_box);
        assert!((hit.t - 19.0).abs() < 1e-3);
        assert_eq!(intersect_ray_objects(&world, ORIGIN, Vec3::ZERO, 100.0, IntersectMode::All), None);
    }

    #[test]
    fn test_modes() {
        let mut world = World::default();
        let key = add(&mut world, GameObject::new("key", ObjectKind::Item, ORIGIN + Vec3::X * 5.0, 0.5));
        let ghost = add(
            &mut world,
            GameObject::new("ghost", ObjectKind::Static, ORIGIN + Vec3::X * 8.0, 1.0)
                .with_collision(CollisionShape::None),
        );
        let smoke = add(&mut world, GameObject::new("smoke", ObjectKind::Particle, ORIGIN + Vec3::X * 10.0, 1.0));
        let door = add(&mut world, GameObject::new("door", ObjectKind::Door, ORIGIN + Vec3::X * 15.0, 1.0));
        assert_eq!(world.object(smoke).unwrap().physics, PhysicsBehavior::None);

        let all = intersect_ray_objects(&world, ORIGIN, Vec3::X, 50.0, IntersectMode::All).unwrap();
        assert_eq!(all.object, key);

        let items = intersect_ray_objects(&world, ORIGIN + Vec3::X * 6.0, Vec3::X, 50.0, IntersectMode::Items);
        assert_eq!(items, None);
        let items = intersect_ray_objects(&world, ORIGIN, Vec3::X, 50.0, IntersectMode::Items).unwrap();
        assert_eq!(items.object, key);

        let solid = intersect_ray_objects(&world, ORIGIN, Vec3::X, 50.0, IntersectMode::Collidable).unwrap();
        assert_eq!(solid.object, door);
        assert_ne!(solid.object, ghost);
    }

    #[test]
    fn test_ray_crossing_many_nodes() {
        let mut world = World::default();
        let far = add(&mut world, GameObject::new("far", ObjectKind::Static, Vec3::new(3000.0, 5.0, 3000.0), 2.0));
        let origin = Vec3::new(-1000.0, 5.0, -1000.0);
        let toward = Vec3::new(3000.0, 5.0, 3000.0) - origin;

        let hit = intersect_ray_objects(&world, origin, toward, 10_000.0, IntersectMode::All).unwrap();
        assert_eq!(hit.object, far);
        assert!((hit.t - (toward.length() - 2.0)).abs() < 1e-2);
    }
}
