//! Bounding sphere

use crate::core::types::Vec3;

/// Sphere used as the primary bounding volume of objects and sectors
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere around a set of points: centroid plus farthest distance.
    /// Not minimal, but always enclosing.
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let center = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0f32, f32::max);
        Self { center, radius }
    }

    /// Same sphere moved by `offset`
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            center: self.center + offset,
            radius: self.radius,
        }
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.center.distance_squared(p) <= self.radius * self.radius
    }

    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let r = self.radius + other.radius;
        self.center.distance_squared(other.center) <= r * r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_encloses() {
        let points = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
        ];
        let sphere = BoundingSphere::from_points(&points);
        for p in points {
            assert!(sphere.contains_point(p));
        }
    }

    #[test]
    fn test_translated() {
        let s = BoundingSphere::new(Vec3::ONE, 2.0).translated(Vec3::X);
        assert_eq!(s.center, Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(s.radius, 2.0);
    }

    #[test]
    fn test_intersects() {
        let a = BoundingSphere::new(Vec3::ZERO, 1.0);
        assert!(a.intersects(&BoundingSphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0)));
        assert!(!a.intersects(&BoundingSphere::new(Vec3::new(3.0, 0.0, 0.0), 1.0)));
    }
}
