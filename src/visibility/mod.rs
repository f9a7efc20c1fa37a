//! Visibility determination: object culling, octree traversal and
//! portal/stabbing-tree traversal

pub mod culling;
pub mod portal;
pub mod solver;

pub use culling::{cull_object, within_cutoff};
pub use portal::{portal_visible, visible_in_stabbing_node, NEAR_PORTAL_RADIUS, VisibleEntry, VisibleSet};
pub use solver::VisibilitySolver;
