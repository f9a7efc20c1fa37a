//! Ray type and operations

use crate::core::types::{Vec3, Mat4};
use super::aabb::Aabb;

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Precomputed 1/direction for fast AABB intersection
    pub inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray (direction should be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: Vec3::new(
                1.0 / direction.x,
                1.0 / direction.y,
                1.0 / direction.z,
            ),
        }
    }

    /// Ray from `start` towards `end`, with the segment length as second value
    pub fn between(start: Vec3, end: Vec3) -> (Self, f32) {
        let delta = end - start;
        let length = delta.length();
        let direction = if length > 0.0 { delta / length } else { Vec3::X };
        (Self::new(start, direction), length)
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray-AABB intersection using slab method
    /// Returns Some((t_near, t_far)) if intersection, None otherwise
    pub fn intersects_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let t1 = (aabb.min - self.origin) * self.inv_direction;
        let t2 = (aabb.max - self.origin) * self.inv_direction;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let t_near = t_min.x.max(t_min.y).max(t_min.z);
        let t_far = t_max.x.min(t_max.y).min(t_max.z);

        if t_near <= t_far && t_far >= 0.0 {
            Some((t_near.max(0.0), t_far))
        } else {
            None
        }
    }

    /// Slab test restricted to `[0, max_distance]`
    pub fn hits_aabb_within(&self, aabb: &Aabb, max_distance: f32) -> bool {
        matches!(self.intersects_aabb(aabb), Some((t_near, _)) if t_near <= max_distance)
    }

    /// Transform ray by matrix
    pub fn transform(&self, matrix: &Mat4) -> Ray {
        let new_origin = matrix.transform_point3(self.origin);
        let new_direction = matrix.transform_vector3(self.direction).normalize();
        Ray::new(new_origin, new_direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_box() -> Aabb {
        // a depth-6 node of the default world octree
        Aabb::from_center_half_extent(Vec3::new(2162.5, 62.5, 2037.5), Vec3::splat(62.5))
    }

    #[test]
    fn test_between_normalizes() {
        let (ray, len) = Ray::between(Vec3::new(2000.0, 10.0, 2000.0), Vec3::new(2000.0, 10.0, 2004.0));
        assert!((len - 4.0).abs() < 1e-6);
        assert_eq!(ray.direction, Vec3::Z);
        assert_eq!(ray.at(len), Vec3::new(2000.0, 10.0, 2004.0));

        // degenerate segment still yields a usable ray
        let (ray, len) = Ray::between(Vec3::ONE, Vec3::ONE);
        assert_eq!(len, 0.0);
        assert_eq!(ray.direction, Vec3::X);
    }

    #[test]
    fn test_slab_entry_and_exit() {
        let ray = Ray::new(Vec3::new(2000.0, 62.5, 2037.5), Vec3::X);
        let (t_near, t_far) = ray.intersects_aabb(&node_box()).unwrap();
        assert!((t_near - 100.0).abs() < 1e-3);
        assert!((t_far - 225.0).abs() < 1e-3);

        let above = Ray::new(Vec3::new(2000.0, 200.0, 2037.5), Vec3::X);
        assert!(above.intersects_aabb(&node_box()).is_none());

        let away = Ray::new(Vec3::new(2000.0, 62.5, 2037.5), Vec3::NEG_X);
        assert!(away.intersects_aabb(&node_box()).is_none());
    }

    #[test]
    fn test_origin_inside_node() {
        let ray = Ray::new(Vec3::new(2162.5, 62.5, 2037.5), Vec3::new(0.0, 0.6, 0.8));
        let (t_near, t_far) = ray.intersects_aabb(&node_box()).unwrap();
        assert_eq!(t_near, 0.0);
        assert!(t_far > 0.0);
        assert!(ray.hits_aabb_within(&node_box(), 0.0));
    }

    #[test]
    fn test_query_distance_limit() {
        let ray = Ray::new(Vec3::new(2000.0, 62.5, 2037.5), Vec3::X);
        assert!(ray.hits_aabb_within(&node_box(), 100.0));
        assert!(!ray.hits_aabb_within(&node_box(), 99.0));
    }

    #[test]
    fn test_rigid_transform_keeps_distances() {
        let world_ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::X);
        let to_local = (Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2))
        .inverse();
        let local = world_ray.transform(&to_local);

        // world point 3 units along maps to the local point 3 units along
        let expected = to_local.transform_point3(world_ray.at(3.0));
        assert!((local.at(3.0) - expected).length() < 1e-4);
        assert!((local.direction.length() - 1.0).abs() < 1e-6);
    }
}
