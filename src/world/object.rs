//! Game objects as seen by the spatial index

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::core::types::Vec3;
use crate::math::{Aabb, BoundingSphere, ConvexHull, Obb};
use crate::query::aabb_tree::AabbTree;
use crate::spatial::NodeId;
use super::region::RegionId;
use super::sector::SectorId;

new_key_type! {
    /// Stable handle to a game object
    pub struct ObjectId;
}

/// What an object is, as far as placement and culling care
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    #[default]
    Static,
    Moving,
    Creature,
    Player,
    Missile,
    Item,
    Particle,
    Destructible,
    Door,
    /// First-person hand, always attached to the camera
    Hand,
    Skydome,
}

impl ObjectKind {
    /// Objects pinned to the camera are never repositioned in the tree
    pub fn is_camera_fixed(self) -> bool {
        matches!(self, ObjectKind::Hand | ObjectKind::Skydome)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhysicsBehavior {
    /// Never moves, eligible for the sorted static lists
    #[default]
    Fixed,
    Normal,
    None,
}

/// Narrow-phase shape used by ray queries.
/// Geometry is in object-local space; `position` and `rotation_y` place it.
#[derive(Clone, Debug, Default)]
pub enum CollisionShape {
    #[default]
    Undefined,
    None,
    /// Bounding sphere only
    QuickSphere,
    Sphere,
    /// Local box rotated with the object
    Obb(Aabb),
    /// One sphere per bone, supplied by the animation system in world space
    Bones,
    /// Exact triangles in an AABB tree
    Perfect(Arc<AabbTree>),
    ConvexHull(Arc<ConvexHull>),
}

impl CollisionShape {
    /// Shapes that can never produce a hit
    pub fn is_empty(&self) -> bool {
        matches!(self, CollisionShape::None | CollisionShape::Undefined)
    }
}

/// Flags consulted by the cull decision and the draw ordering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderFlags {
    pub never_draw: bool,
    pub invisible: bool,
    pub secret: bool,
    pub transparent: bool,
    pub particle: bool,
    pub darkness: bool,
}

impl RenderFlags {
    /// Needs back-to-front compositing
    pub fn is_blended(&self) -> bool {
        self.transparent || self.particle || self.darkness
    }
}

#[derive(Clone, Debug)]
pub struct GameObject {
    pub name: String,
    pub kind: ObjectKind,
    pub position: Vec3,
    pub prev_position: Vec3,
    pub target_position: Vec3,
    /// Rotation around +Y in radians
    pub rotation_y: f32,
    /// Object-local bounding sphere
    pub bounding_sphere: BoundingSphere,
    pub collision: CollisionShape,
    pub physics: PhysicsBehavior,
    pub emits_light: bool,
    pub light_radius: f32,
    pub render: RenderFlags,
    /// Set when attached to a bone of another object
    pub parent_bone: Option<u32>,
    /// World-space bone spheres for `CollisionShape::Bones`
    pub bone_spheres: Vec<BoundingSphere>,
    pub life: f32,
    pub asset: Option<String>,

    pub(crate) current_sector: Option<SectorId>,
    /// Sector the object was authored in; fixed geometry near its hull keeps it
    pub(crate) home_sector: Option<SectorId>,
    pub(crate) current_region: Option<RegionId>,
    pub(crate) octree_node: Option<NodeId>,
}

impl GameObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind, position: Vec3, radius: f32) -> Self {
        let physics = match kind {
            ObjectKind::Moving | ObjectKind::Creature | ObjectKind::Player | ObjectKind::Missile => {
                PhysicsBehavior::Normal
            }
            ObjectKind::Particle | ObjectKind::Hand | ObjectKind::Skydome => PhysicsBehavior::None,
            _ => PhysicsBehavior::Fixed,
        };

        Self {
            name: name.into(),
            kind,
            position,
            prev_position: position,
            target_position: position,
            rotation_y: 0.0,
            bounding_sphere: BoundingSphere::new(Vec3::ZERO, radius),
            collision: CollisionShape::QuickSphere,
            physics,
            emits_light: false,
            light_radius: 0.0,
            render: RenderFlags::default(),
            parent_bone: None,
            bone_spheres: Vec::new(),
            life: 1.0,
            asset: None,
            current_sector: None,
            home_sector: None,
            current_region: None,
            octree_node: None,
        }
    }

    pub fn with_collision(mut self, collision: CollisionShape) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_physics(mut self, physics: PhysicsBehavior) -> Self {
        self.physics = physics;
        self
    }

    pub fn with_light(mut self, radius: f32) -> Self {
        self.emits_light = true;
        self.light_radius = radius;
        self
    }

    pub fn with_render(mut self, render: RenderFlags) -> Self {
        self.render = render;
        self
    }

    pub fn with_rotation_y(mut self, rotation_y: f32) -> Self {
        self.rotation_y = rotation_y;
        self
    }

    pub fn with_bounding_sphere(mut self, sphere: BoundingSphere) -> Self {
        self.bounding_sphere = sphere;
        self
    }

    /// Bounding sphere in world space
    pub fn transformed_bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere.translated(self.position)
    }

    /// Box shape in world space, if the object has one
    pub fn transformed_obb(&self) -> Option<Obb> {
        match &self.collision {
            CollisionShape::Obb(local) => Some(Obb::from_local_aabb(local, self.position, self.rotation_y)),
            _ => None,
        }
    }

    pub fn set_bone_spheres(&mut self, spheres: Vec<BoundingSphere>) {
        self.bone_spheres = spheres;
    }

    pub fn is_collidable(&self) -> bool {
        !self.collision.is_empty() && self.physics != PhysicsBehavior::None
    }

    pub fn is_missile(&self) -> bool {
        self.kind == ObjectKind::Missile
    }

    pub fn current_sector(&self) -> Option<SectorId> {
        self.current_sector
    }

    pub fn home_sector(&self) -> Option<SectorId> {
        self.home_sector
    }

    pub fn current_region(&self) -> Option<RegionId> {
        self.current_region
    }

    pub fn octree_node(&self) -> Option<NodeId> {
        self.octree_node
    }
}
