//! World state: objects, sectors, portals, regions and the context owning them

pub mod context;
pub mod loader;
pub mod object;
pub mod region;
pub mod sector;
pub mod stabbing;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{SharedWorld, World};
pub use loader::{AssetDef, AssetLibrary, CollisionDef, LoadStats, MeshLibrary, WorldLoader};
pub use object::{CollisionShape, GameObject, ObjectId, ObjectKind, PhysicsBehavior, RenderFlags};
pub use region::{Region, RegionEvent, RegionEventKind, RegionId};
pub use sector::{Portal, PortalId, Sector, SectorId, OUTSIDE_NAME};
pub use stabbing::{StabbingBranch, StabbingTree, StabbingTreeNode};
