//! World configuration
//!
//! All tunables live here so a world can be described by a single JSON file.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::Result;

/// Shape of the world octree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Center of the root node
    pub center: Vec3,
    /// Half extent of the root node along each axis
    pub half_dimensions: Vec3,
    /// Depth of the deepest nodes (root is depth 0)
    pub max_depth: u32,
    /// Depth at which vertical subdivision stops and nodes split in 4.
    /// `None` keeps a pure octree down to `max_depth`.
    pub quadtree_depth: Option<u32>,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            center: Vec3::new(2100.0, 0.0, 2100.0),
            half_dimensions: Vec3::splat(4000.0),
            max_depth: 6,
            quadtree_depth: Some(2),
        }
    }
}

/// Per-object render culling parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Octree nodes farther than this along any axis are never visited
    pub cutoff: f32,
    /// When set, objects farther than this from the eye are dropped
    pub light_radius: Option<f32>,
    /// Minimum `radius / distance` for an object to be worth drawing
    pub min_apparent_size: f32,
    /// Viewer can see invisible objects (and therefore not secret ones)
    pub see_invisible: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            cutoff: 1000.0,
            light_radius: None,
            min_apparent_size: 0.002,
            see_invisible: false,
        }
    }
}

/// AI scheduling parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Creatures farther than this from the player are not simulated
    pub cutoff: f32,
    /// Number of worker threads
    pub workers: usize,
    /// Capacity of the job channel
    pub queue_capacity: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            cutoff: 200.0,
            workers: 4,
            queue_capacity: 256,
        }
    }
}

/// Top-level world configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub octree: OctreeConfig,
    pub render: RenderSettings,
    pub ai: AiConfig,
}

impl WorldConfig {
    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.octree.center, Vec3::new(2100.0, 0.0, 2100.0));
        assert_eq!(config.octree.half_dimensions, Vec3::splat(4000.0));
        assert!(config.ai.workers > 0);
        assert!(config.render.light_radius.is_none());
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("world.json");

        let mut config = WorldConfig::default();
        config.octree.max_depth = 4;
        config.render.light_radius = Some(25.0);
        config.save_sync(&path).unwrap();

        let loaded = WorldConfig::load_sync(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WorldConfig =
            serde_json::from_str(r#"{ "ai": { "workers": 2 } }"#).unwrap();
        assert_eq!(config.ai.workers, 2);
        assert_eq!(config.ai.queue_capacity, AiConfig::default().queue_capacity);
        assert_eq!(config.octree, OctreeConfig::default());
    }

    #[test]
    fn test_load_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        let err = WorldConfig::load_sync(&path).unwrap_err();
        assert!(matches!(err, crate::core::Error::Json(_)));

        let missing = WorldConfig::load_sync(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, crate::core::Error::Io(_)));
    }
}
