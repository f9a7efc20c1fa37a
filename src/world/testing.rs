//! Worlds shared by tests across the crate

use crate::core::types::Vec3;
use crate::math::{Aabb, ConvexHull, Polygon};
use super::{SectorId, World};

pub const TOWER_POSITION: Vec3 = Vec3::new(2040.0, 170.0, 2010.0);
pub const PORTAL_POSITION: Vec3 = Vec3::new(2042.0, 172.8, 2010.0);

/// Closed box around the local origin
pub fn box_mesh(half: f32) -> Vec<Polygon> {
    ConvexHull::from_aabb(&Aabb::new(Vec3::splat(-half), Vec3::splat(half))).polygons
}

/// Doorway quad in the local XY plane
pub fn portal_mesh() -> Vec<Polygon> {
    vec![Polygon::new(vec![
        Vec3::new(-1.0, -1.5, 0.0),
        Vec3::new(1.0, -1.5, 0.0),
        Vec3::new(1.0, 1.5, 0.0),
        Vec3::new(-1.0, 1.5, 0.0),
    ])]
}

/// Default world with a 12-unit "tower" joined to outside in both directions
pub fn tower_world() -> (World, SectorId) {
    let mut world = World::default();
    let tower = world
        .add_sector("tower", TOWER_POSITION, 0.0, &box_mesh(6.0))
        .expect("tower sector");
    world
        .add_portal(SectorId::OUTSIDE, tower, PORTAL_POSITION, 0.0, &portal_mesh(), false)
        .expect("outside portal");
    world
        .add_portal(tower, SectorId::OUTSIDE, PORTAL_POSITION, 0.0, &portal_mesh(), false)
        .expect("tower portal");
    (world, tower)
}
