//! Oriented bounding box

use crate::core::types::{Mat4, Vec3};
use super::aabb::Aabb;
use super::ray::Ray;

/// Box with orthonormal axes, stored as center, axes and half extents
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    pub center: Vec3,
    pub axes: [Vec3; 3],
    pub half_extents: Vec3,
}

impl Obb {
    pub fn new(center: Vec3, axes: [Vec3; 3], half_extents: Vec3) -> Self {
        Self { center, axes, half_extents }
    }

    /// Local box rotated by `rotation_y` around +Y and placed at `position`
    pub fn from_local_aabb(aabb: &Aabb, position: Vec3, rotation_y: f32) -> Self {
        let rotation = Mat4::from_rotation_y(rotation_y);
        let axes = [
            rotation.transform_vector3(Vec3::X),
            rotation.transform_vector3(Vec3::Y),
            rotation.transform_vector3(Vec3::Z),
        ];
        Self {
            center: position + rotation.transform_vector3(aabb.center()),
            axes,
            half_extents: aabb.half_extent(),
        }
    }

    /// Express a world point in box space
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        let d = p - self.center;
        Vec3::new(d.dot(self.axes[0]), d.dot(self.axes[1]), d.dot(self.axes[2]))
    }

    /// Transform the ray into box space and slab-test the equivalent AABB.
    /// Returns the entry distance along the original ray.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let local_origin = self.to_local(ray.origin);
        let local_direction = Vec3::new(
            ray.direction.dot(self.axes[0]),
            ray.direction.dot(self.axes[1]),
            ray.direction.dot(self.axes[2]),
        );
        let local = Ray::new(local_origin, local_direction);
        let aabb = Aabb::from_center_half_extent(Vec3::ZERO, self.half_extents);
        local.intersects_aabb(&aabb).map(|(t_near, _)| t_near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_aligned_matches_aabb() {
        let local = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let obb = Obb::from_local_aabb(&local, Vec3::new(10.0, 0.0, 0.0), 0.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = obb.intersect_ray(&ray).unwrap();
        assert!((t - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotated_box() {
        // 4x1x1 box rotated a quarter turn: long side now along Z
        let local = Aabb::new(Vec3::new(-2.0, -0.5, -0.5), Vec3::new(2.0, 0.5, 0.5));
        let obb = Obb::from_local_aabb(&local, Vec3::ZERO, std::f32::consts::FRAC_PI_2);

        let along_z = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::Z);
        let t = obb.intersect_ray(&along_z).unwrap();
        assert!((t - 8.0).abs() < 1e-3);

        // would hit the unrotated long side, misses the rotated box
        let offset = Ray::new(Vec3::new(1.5, 0.0, -10.0), Vec3::Z);
        assert!(obb.intersect_ray(&offset).is_none());
    }
}
