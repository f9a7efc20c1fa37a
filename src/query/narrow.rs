//! Ray against a single object's collision shape

use crate::core::types::{Mat4, Vec3};
use crate::math::intersect::{ray_convex_hull, ray_sphere};
use crate::math::Ray;
use crate::world::{CollisionShape, GameObject};

/// Distance along `ray` to the first hit on `object`, if any
pub fn intersect_shape(object: &GameObject, ray: &Ray) -> Option<f32> {
    match &object.collision {
        CollisionShape::None | CollisionShape::Undefined => None,
        CollisionShape::QuickSphere | CollisionShape::Sphere => {
            ray_sphere(ray, &object.transformed_bounding_sphere())
        }
        CollisionShape::Obb(_) => object.transformed_obb()?.intersect_ray(ray),
        CollisionShape::Bones => object
            .bone_spheres
            .iter()
            .filter_map(|sphere| ray_sphere(ray, sphere))
            .min_by(f32::total_cmp),
        CollisionShape::Perfect(tree) => {
            // cheap reject before descending the triangle tree
            ray_sphere(ray, &object.transformed_bounding_sphere())?;
            tree.intersect_ray(&to_object_space(object, ray))
        }
        CollisionShape::ConvexHull(hull) => {
            ray_convex_hull(&to_object_space(object, ray), hull, Vec3::ZERO)
        }
    }
}

/// Rigid inverse of the object's placement; distances along the ray are preserved
fn to_object_space(object: &GameObject, ray: &Ray) -> Ray {
    let placement = Mat4::from_translation(object.position) * Mat4::from_rotation_y(object.rotation_y);
    ray.transform(&placement.inverse())
}
