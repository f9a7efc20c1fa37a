//! Spatial index: arena octree, bucket classification and static layout optimization

pub mod octree;
pub mod category;
pub mod optimize;

pub use octree::{Member, NodeId, Octree, OctreeNode, QUAD_OCTANT};
pub use category::{classify, is_moving_object, ObjectCategory};
pub use optimize::{generate_optimized_octree, static_candidates, SortedStaticObj};
