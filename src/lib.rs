//! Umbra - spatial partitioning, sector/portal visibility and ray queries
//! for a game world

pub mod core;
pub mod math;
pub mod spatial;
pub mod world;
pub mod visibility;
pub mod query;
pub mod ai;

pub use crate::core::{Error, Result, WorldConfig};
pub use crate::world::{GameObject, ObjectId, ObjectKind, SectorId, SharedWorld, World};
pub use crate::visibility::{VisibilitySolver, VisibleEntry, VisibleSet};
pub use crate::query::{intersect_ray_objects, IntersectMode, RayHit};
