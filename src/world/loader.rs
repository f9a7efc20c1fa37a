//! Authoring data: XML sector/portal files plus JSON mesh and asset libraries.
//!
//! A world directory holds `*.xml` files. Each file may describe sectors
//! (position, hull mesh, rotation, lighting, placed game objects), regions,
//! and per-sector portals and stabbing trees. Every file is read twice:
//! first for sectors and regions, then for portals, so portals may refer to
//! sectors declared in any file.
//!
//! ```xml
//! <xml>
//!   <sector name="tower">
//!     <position x="2040" y="170" z="2010"/>
//!     <mesh>tower-hull</mesh>
//!     <rotation x="0" y="1.57" z="0"/>
//!     <lighting r="0.6" g="0.6" b="0.8"/>
//!     <game-objs>
//!       <game-obj name="torch-1"><position x="2041" y="171" z="2011"/><asset>torch</asset></game-obj>
//!     </game-objs>
//!     <portals>
//!       <portal to="outside"><position x="2042" y="172.8" z="2010"/><mesh>door</mesh></portal>
//!     </portals>
//!     <stabbing-tree><st-node sector="outside"/></stabbing-tree>
//!   </sector>
//!   <region name="gate"><point x="500" y="0" z="500"/><dimensions x="10" y="10" z="10"/></region>
//! </xml>
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{Result, Vec3};
use crate::core::Error;
use crate::math::{Aabb, BoundingSphere, ConvexHull, Polygon};
use crate::query::aabb_tree::AabbTree;
use super::context::World;
use super::object::{CollisionShape, GameObject, ObjectKind, PhysicsBehavior, RenderFlags};
use super::sector::{SectorId, OUTSIDE_NAME};
use super::stabbing::StabbingBranch;

/// Named polygon soups referenced by sectors, portals and assets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshLibrary {
    #[serde(default)]
    meshes: FxHashMap<String, Vec<Polygon>>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, polygons: Vec<Polygon>) {
        self.meshes.insert(name.into(), polygons);
    }

    pub fn get(&self, name: &str) -> Result<&[Polygon]> {
        self.meshes
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownMesh(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync). Normals missing from the file are derived.
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut library: Self = serde_json::from_str(&json)?;
        for polygons in library.meshes.values_mut() {
            for polygon in polygons.iter_mut() {
                *polygon = polygon.clone().with_normal();
            }
        }
        log::info!("Loaded {} meshes from {}", library.meshes.len(), path.display());
        Ok(library)
    }
}

/// Collision shape as written in an asset definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum CollisionDef {
    None,
    #[default]
    QuickSphere,
    Sphere,
    /// Box corners in object space; the mesh bounds are used when omitted
    Obb {
        #[serde(default)]
        min: Option<Vec3>,
        #[serde(default)]
        max: Option<Vec3>,
    },
    Bones,
    Perfect,
    ConvexHull,
}

/// Template for game objects placed by authoring files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDef {
    pub kind: ObjectKind,
    /// Bounding sphere radius; derived from the mesh when omitted
    pub radius: Option<f32>,
    pub center: Vec3,
    pub collision: CollisionDef,
    /// Overrides the default behavior of `kind`
    pub physics: Option<PhysicsBehavior>,
    pub light_radius: Option<f32>,
    pub mesh: Option<String>,
    pub render: RenderFlags,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetLibrary {
    #[serde(default)]
    assets: FxHashMap<String, AssetDef>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, asset: AssetDef) {
        self.assets.insert(name.into(), asset);
    }

    pub fn get(&self, name: &str) -> Result<&AssetDef> {
        self.assets
            .get(name)
            .ok_or_else(|| Error::UnknownAsset(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

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
        let library: Self = serde_json::from_str(&json)?;
        log::info!("Loaded {} assets from {}", library.assets.len(), path.display());
        Ok(library)
    }
}

// ---- XML layout ----

#[derive(Debug, Default, Deserialize)]
struct WorldXml {
    #[serde(rename = "sector", default)]
    sectors: Vec<SectorXml>,
    #[serde(rename = "region", default)]
    regions: Vec<RegionXml>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct Vec3Xml {
    #[serde(rename = "@x", default)]
    x: f32,
    #[serde(rename = "@y", default)]
    y: f32,
    #[serde(rename = "@z", default)]
    z: f32,
}

impl From<Vec3Xml> for Vec3 {
    fn from(v: Vec3Xml) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ColorXml {
    #[serde(rename = "@r", default)]
    r: f32,
    #[serde(rename = "@g", default)]
    g: f32,
    #[serde(rename = "@b", default)]
    b: f32,
}

#[derive(Debug, Deserialize)]
struct SectorXml {
    #[serde(rename = "@name")]
    name: Option<String>,
    position: Option<Vec3Xml>,
    mesh: Option<String>,
    rotation: Option<Vec3Xml>,
    lighting: Option<ColorXml>,
    #[serde(rename = "game-objs")]
    game_objs: Option<GameObjsXml>,
    portals: Option<PortalsXml>,
    #[serde(rename = "stabbing-tree")]
    stabbing_tree: Option<StabbingTreeXml>,
}

#[derive(Debug, Default, Deserialize)]
struct GameObjsXml {
    #[serde(rename = "game-obj", default)]
    objects: Vec<GameObjXml>,
}

#[derive(Debug, Deserialize)]
struct GameObjXml {
    #[serde(rename = "@name", default)]
    name: String,
    position: Option<Vec3Xml>,
    asset: Option<String>,
    rotation: Option<Vec3Xml>,
}

#[derive(Debug, Default, Deserialize)]
struct PortalsXml {
    #[serde(rename = "portal", default)]
    portals: Vec<PortalXml>,
}

#[derive(Debug, Deserialize)]
struct PortalXml {
    #[serde(rename = "@to")]
    to: Option<String>,
    #[serde(rename = "@cave", default)]
    cave: bool,
    position: Option<Vec3Xml>,
    mesh: Option<String>,
    rotation: Option<Vec3Xml>,
}

#[derive(Debug, Default, Deserialize)]
struct StabbingTreeXml {
    #[serde(rename = "st-node", default)]
    nodes: Vec<StNodeXml>,
}

#[derive(Debug, Deserialize)]
struct StNodeXml {
    #[serde(rename = "@sector")]
    sector: Option<String>,
    #[serde(rename = "st-node", default)]
    children: Vec<StNodeXml>,
}

#[derive(Debug, Deserialize)]
struct RegionXml {
    #[serde(rename = "@name")]
    name: Option<String>,
    point: Option<Vec3Xml>,
    dimensions: Option<Vec3Xml>,
}

fn parse(xml: &str, file: &str) -> Result<WorldXml> {
    quick_xml::de::from_str(xml).map_err(|source| Error::Xml {
        file: file.to_string(),
        source,
    })
}

fn require<T>(value: Option<T>, element: &'static str, field: &'static str) -> Result<T> {
    value.ok_or(Error::MissingField { element, field })
}

/// Counts reported by a load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub sectors: usize,
    pub objects: usize,
    pub regions: usize,
    pub portals: usize,
}

/// Populates a [`World`] from authoring files
pub struct WorldLoader<'a> {
    meshes: &'a MeshLibrary,
    assets: &'a AssetLibrary,
    /// Collision shapes built so far, per asset name
    shapes: FxHashMap<String, CollisionShape>,
}

impl<'a> WorldLoader<'a> {
    pub fn new(meshes: &'a MeshLibrary, assets: &'a AssetLibrary) -> Self {
        Self {
            meshes,
            assets,
            shapes: FxHashMap::default(),
        }
    }

    /// Load every `*.xml` file of `dir`: sectors and regions first, then portals
    pub fn load_dir(&mut self, world: &mut World, dir: &Path) -> Result<LoadStats> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "xml"))
            .collect();
        files.sort();

        let mut stats = LoadStats::default();
        for file in &files {
            let s = self.load_sectors(world, file)?;
            stats.sectors += s.sectors;
            stats.objects += s.objects;
            stats.regions += s.regions;
        }
        for file in &files {
            stats.portals += self.load_portals(world, file)?;
        }

        log::info!(
            "Loaded world from {}: {} files, {} sectors, {} objects, {} regions, {} portals",
            dir.display(),
            files.len(),
            stats.sectors,
            stats.objects,
            stats.regions,
            stats.portals
        );
        Ok(stats)
    }

    pub fn load_sectors(&mut self, world: &mut World, path: &Path) -> Result<LoadStats> {
        let xml = std::fs::read_to_string(path)?;
        self.load_sectors_str(world, &xml, &path.display().to_string())
    }

    pub fn load_portals(&mut self, world: &mut World, path: &Path) -> Result<usize> {
        let xml = std::fs::read_to_string(path)?;
        self.load_portals_str(world, &xml, &path.display().to_string())
    }

    /// Sectors, their game objects and regions. `file` names the source in errors.
    pub fn load_sectors_str(&mut self, world: &mut World, xml: &str, file: &str) -> Result<LoadStats> {
        let doc = parse(xml, file)?;
        let mut stats = LoadStats::default();

        // regions first so objects placed below raise their enter events
        for region in &doc.regions {
            let name = require(region.name.as_deref(), "Region", "name")?;
            let point = require(region.point, "Region", "point")?;
            let dimensions = require(region.dimensions, "Region", "size")?;
            world.add_region(name, Aabb::from_point_dimensions(point.into(), dimensions.into()))?;
            stats.regions += 1;
        }

        for sector in &doc.sectors {
            let name = require(sector.name.as_deref(), "Sector", "name")?;

            let mut home = SectorId::OUTSIDE;
            if name != OUTSIDE_NAME {
                let position = require(sector.position, "Indoors sector", "location")?;
                let mesh = require(sector.mesh.as_deref(), "Indoors sector", "mesh")?;
                let polygons = self.meshes.get(mesh.trim())?;
                let rotation_y = sector.rotation.map_or(0.0, |r| r.y);

                home = world.add_sector(name, position.into(), rotation_y, polygons)?;
                if let Some(c) = sector.lighting {
                    world.set_sector_lighting(home, Vec3::new(c.r, c.g, c.b))?;
                }
                stats.sectors += 1;
            }

            for obj in sector.game_objs.iter().flat_map(|g| g.objects.iter()) {
                let position = require(obj.position, "Game object", "location")?;
                let asset = require(obj.asset.as_deref(), "Game object", "asset")?;
                let rotation_y = obj.rotation.map_or(0.0, |r| r.y);

                let object = self.instantiate(&obj.name, asset.trim(), position.into(), rotation_y)?;
                world.add_object_in_sector(object, home)?;
                stats.objects += 1;
            }
        }

        log::debug!(
            "{file}: {} sectors, {} objects, {} regions",
            stats.sectors,
            stats.objects,
            stats.regions
        );
        Ok(stats)
    }

    /// Portals and stabbing trees. Returns the number of portals added.
    pub fn load_portals_str(&mut self, world: &mut World, xml: &str, file: &str) -> Result<usize> {
        let doc = parse(xml, file)?;
        let mut count = 0;

        for sector in &doc.sectors {
            if sector.portals.is_none() && sector.stabbing_tree.is_none() {
                continue;
            }
            let name = require(sector.name.as_deref(), "Sector", "name")?;
            let from = world.sector_id(name)?;

            for portal in sector.portals.iter().flat_map(|p| p.portals.iter()) {
                let to_name = require(portal.to.as_deref(), "Portal", "destination")?;
                let to = world.sector_id(to_name)?;
                let position = require(portal.position, "Portal", "location")?;
                let mesh = require(portal.mesh.as_deref(), "Portal", "mesh")?;
                let polygons = self.meshes.get(mesh.trim())?;
                let rotation_y = portal.rotation.map_or(0.0, |r| r.y);

                world.add_portal(from, to, position.into(), rotation_y, polygons, portal.cave)?;
                count += 1;
            }

            if let Some(tree) = &sector.stabbing_tree {
                let branches = tree
                    .nodes
                    .iter()
                    .map(|n| Self::branch(world, n))
                    .collect::<Result<Vec<_>>>()?;
                world.set_stabbing_tree(from, &branches)?;
            }
        }

        log::debug!("{file}: {count} portals");
        Ok(count)
    }

    fn branch(world: &World, node: &StNodeXml) -> Result<StabbingBranch> {
        let name = require(node.sector.as_deref(), "Stabbing tree node", "sector")?;
        let sector: SectorId = world.sector_id(name)?;
        let children = node
            .children
            .iter()
            .map(|c| Self::branch(world, c))
            .collect::<Result<Vec<_>>>()?;
        Ok(StabbingBranch::new(sector, children))
    }

    /// Build a game object from an asset definition
    pub fn instantiate(&mut self, name: &str, asset_name: &str, position: Vec3, rotation_y: f32) -> Result<GameObject> {
        let (assets, meshes) = (self.assets, self.meshes);
        let asset = assets.get(asset_name)?;
        let mesh = asset.mesh.as_deref().map(|m| meshes.get(m)).transpose()?;

        let sphere = match (asset.radius, mesh) {
            (Some(radius), _) => BoundingSphere::new(asset.center, radius),
            (None, Some(polygons)) => {
                let vertices: Vec<Vec3> = polygons.iter().flat_map(|p| p.vertices.iter().copied()).collect();
                BoundingSphere::from_points(&vertices)
            }
            (None, None) => return Err(Error::MissingField { element: "Asset", field: "bounding sphere" }),
        };

        let collision = self.collision_shape(asset_name, asset, mesh)?;

        let mut object = GameObject::new(name, asset.kind, position, sphere.radius)
            .with_bounding_sphere(sphere)
            .with_collision(collision)
            .with_render(asset.render)
            .with_rotation_y(rotation_y);
        if let Some(physics) = asset.physics {
            object = object.with_physics(physics);
        }
        if let Some(radius) = asset.light_radius {
            object = object.with_light(radius);
        }
        object.asset = Some(asset_name.to_string());
        Ok(object)
    }

    fn collision_shape(&mut self, asset_name: &str, asset: &AssetDef, mesh: Option<&[Polygon]>) -> Result<CollisionShape> {
        if let Some(shape) = self.shapes.get(asset_name) {
            return Ok(shape.clone());
        }

        let shape = match &asset.collision {
            CollisionDef::None => CollisionShape::None,
            CollisionDef::QuickSphere => CollisionShape::QuickSphere,
            CollisionDef::Sphere => CollisionShape::Sphere,
            CollisionDef::Bones => CollisionShape::Bones,
            CollisionDef::Obb { min, max } => {
                let bounds = match (min, max) {
                    (Some(min), Some(max)) => Aabb::new(*min, *max),
                    _ => {
                        let polygons = require(mesh, "Box collision asset", "mesh")?;
                        require(
                            Aabb::from_points(polygons.iter().flat_map(|p| p.vertices.iter().copied())),
                            "Box collision asset",
                            "mesh",
                        )?
                    }
                };
                CollisionShape::Obb(bounds)
            }
            CollisionDef::Perfect => {
                let polygons = require(mesh, "Perfect collision asset", "mesh")?;
                CollisionShape::Perfect(Arc::new(AabbTree::from_polygons(polygons)))
            }
            CollisionDef::ConvexHull => {
                let polygons = require(mesh, "Convex hull collision asset", "mesh")?;
                CollisionShape::ConvexHull(Arc::new(ConvexHull::new(polygons.to_vec())))
            }
        };

        self.shapes.insert(asset_name.to_string(), shape.clone());
        Ok(shape)
    }
}
