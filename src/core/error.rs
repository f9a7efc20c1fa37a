//! Error types for the world index

use thiserror::Error;

use crate::spatial::NodeId;
use crate::world::ObjectId;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error in {file}: {source}")]
    Xml {
        file: String,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("Sector with name {0} doesn't exist.")]
    UnknownSector(String),

    #[error("Sector with name {0} already exists.")]
    DuplicateSector(String),

    #[error("Region with name {0} already exists.")]
    DuplicateRegion(String),

    #[error("{element} must have a {field}.")]
    MissingField {
        element: &'static str,
        field: &'static str,
    },

    #[error("Mesh {0} doesn't exist.")]
    UnknownMesh(String),

    #[error("Asset {0} doesn't exist.")]
    UnknownAsset(String),

    #[error("Stabbing tree of sector {sector} revisits a sector: {}", path.join(" -> "))]
    StabbingTreeCycle {
        sector: String,
        path: Vec<String>,
    },

    #[error("Octree node {node:?} has no child for octant {octant}")]
    MissingChild {
        node: NodeId,
        octant: usize,
    },

    #[error("Object {0:?} doesn't exist")]
    UnknownObject(ObjectId),

    #[error("AI worker pool error: {0}")]
    Worker(String),
}
