//! Per-object and per-node cull decisions

use crate::core::config::RenderSettings;
use crate::core::types::Vec3;
use crate::math::{Aabb, Frustum};
use crate::world::GameObject;

/// True when `object` should not be drawn from the frustum's eye
pub fn cull_object(object: &GameObject, frustum: &Frustum, settings: &RenderSettings) -> bool {
    let render = &object.render;
    if render.never_draw {
        return true;
    }
    if render.invisible && !settings.see_invisible {
        return true;
    }
    if render.secret && settings.see_invisible {
        return true;
    }

    let sphere = object.transformed_bounding_sphere();
    if !frustum.test_sphere(&sphere) {
        return true;
    }

    let distance = sphere.center.distance(frustum.eye());
    if settings.light_radius.is_some_and(|r| distance > r) {
        return true;
    }

    // too small on screen to matter
    !object.is_missile() && distance > f32::EPSILON && sphere.radius / distance < settings.min_apparent_size
}

/// Whether any point of the box lies within `cutoff` of `point` on every axis
pub fn within_cutoff(aabb: &Aabb, point: Vec3, cutoff: f32) -> bool {
    aabb.axis_distance(point).max_element() <= cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Mat4;
    use crate::world::{ObjectKind, RenderFlags};

    fn frustum() -> Frustum {
        let proj = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        Frustum::from_view_projection(&(proj * view), Vec3::ZERO)
    }

    fn object_at(z: f32, radius: f32) -> GameObject {
        GameObject::new("o", ObjectKind::Static, Vec3::new(0.0, 0.0, z), radius)
    }

    #[test]
    fn test_visible_object_passes() {
        assert!(!cull_object(&object_at(-10.0, 1.0), &frustum(), &RenderSettings::default()));
    }

    #[test]
    fn test_behind_camera_is_culled() {
        assert!(cull_object(&object_at(10.0, 1.0), &frustum(), &RenderSettings::default()));
    }

    #[test]
    fn test_render_flags() {
        let settings = RenderSettings::default();
        let f = frustum();

        let hidden = object_at(-10.0, 1.0).with_render(RenderFlags { never_draw: true, ..Default::default() });
        assert!(cull_object(&hidden, &f, &settings));

        let ghost = object_at(-10.0, 1.0).with_render(RenderFlags { invisible: true, ..Default::default() });
        assert!(cull_object(&ghost, &f, &settings));
        let seer = RenderSettings { see_invisible: true, ..Default::default() };
        assert!(!cull_object(&ghost, &f, &seer));

        let secret = object_at(-10.0, 1.0).with_render(RenderFlags { secret: true, ..Default::default() });
        assert!(!cull_object(&secret, &f, &settings));
        assert!(cull_object(&secret, &f, &seer));
    }

    #[test]
    fn test_light_radius() {
        let settings = RenderSettings { light_radius: Some(20.0), ..Default::default() };
        assert!(!cull_object(&object_at(-10.0, 1.0), &frustum(), &settings));
        assert!(cull_object(&object_at(-30.0, 1.0), &frustum(), &settings));
    }

    #[test]
    fn test_apparent_size_spares_missiles() {
        let settings = RenderSettings { min_apparent_size: 0.01, ..Default::default() };
        let pebble = object_at(-500.0, 1.0);
        assert!(cull_object(&pebble, &frustum(), &settings));

        let arrow = GameObject::new("arrow", ObjectKind::Missile, Vec3::new(0.0, 0.0, -500.0), 1.0);
        assert!(!cull_object(&arrow, &frustum(), &settings));
    }

    #[test]
    fn test_within_cutoff() {
        let aabb = Aabb::new(Vec3::splat(10.0), Vec3::splat(20.0));
        assert!(within_cutoff(&aabb, Vec3::splat(15.0), 0.0));
        assert!(within_cutoff(&aabb, Vec3::new(0.0, 15.0, 15.0), 10.0));
        assert!(!within_cutoff(&aabb, Vec3::new(0.0, 15.0, 15.0), 9.0));
    }
}
