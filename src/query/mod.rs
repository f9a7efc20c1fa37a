//! Ray queries: octree broad phase, per-shape narrow phase and the
//! height-map walk

pub mod aabb_tree;
pub mod narrow;
pub mod ray_engine;
pub mod terrain;

pub use aabb_tree::AabbTree;
pub use narrow::intersect_shape;
pub use ray_engine::{intersect_ray_objects, IntersectMode, RayHit};
pub use terrain::{collide_ray_against_terrain, HeightMap};
