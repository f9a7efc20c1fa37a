//! Bucket selection for objects stored in the octree

use crate::world::{GameObject, ObjectKind, PhysicsBehavior};

/// Per-node bucket an object lives in. Every consumer iterates only the
/// buckets it cares about instead of filtering whole nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    Static,
    Moving,
    Creature,
    Light,
    Item,
}

impl ObjectCategory {
    pub const ALL: [ObjectCategory; 5] = [
        ObjectCategory::Static,
        ObjectCategory::Moving,
        ObjectCategory::Creature,
        ObjectCategory::Light,
        ObjectCategory::Item,
    ];
}

/// Simulated by physics every frame
pub fn is_moving_object(obj: &GameObject) -> bool {
    matches!(obj.kind, ObjectKind::Moving | ObjectKind::Missile)
        && obj.parent_bone.is_none()
        && obj.physics != PhysicsBehavior::Fixed
}

/// Bucket for `obj`. Checked in order: creature, item, moving, light, static.
pub fn classify(obj: &GameObject) -> ObjectCategory {
    match obj.kind {
        ObjectKind::Creature | ObjectKind::Player => ObjectCategory::Creature,
        ObjectKind::Item => ObjectCategory::Item,
        _ if is_moving_object(obj) => ObjectCategory::Moving,
        _ if obj.emits_light => ObjectCategory::Light,
        _ => ObjectCategory::Static,
    }
}
