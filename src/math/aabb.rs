//! Axis-aligned bounding box

use crate::core::types::Vec3;
use super::sphere::BoundingSphere;

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create AABB from center and half-extents
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Create AABB from a corner point and its dimensions, as authored for regions
    pub fn from_point_dimensions(point: Vec3, dimensions: Vec3) -> Self {
        Self::new(point.min(point + dimensions), point.max(point + dimensions))
    }

    /// Smallest AABB enclosing all points. Returns None for an empty set.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Aabb::new(first, first);
        for p in iter {
            aabb.expand(p);
        }
        Some(aabb)
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get half-extents
    pub fn half_extent(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Corner selected by a 3-bit mask (bit set = max on that axis)
    pub fn corner(&self, mask: usize) -> Vec3 {
        Vec3::new(
            if mask & 1 != 0 { self.max.x } else { self.min.x },
            if mask & 2 != 0 { self.max.y } else { self.min.y },
            if mask & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    /// Check if point is inside AABB
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if a sphere lies entirely inside the box
    pub fn contains_sphere(&self, sphere: &BoundingSphere) -> bool {
        let r = Vec3::splat(sphere.radius);
        (sphere.center - r).cmpge(self.min).all() && (sphere.center + r).cmple(self.max).all()
    }

    /// Check if two AABBs intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Per-axis gap between the box and a point (zero where the point is within the slab)
    pub fn axis_distance(&self, p: Vec3) -> Vec3 {
        (self.min - p).max(p - self.max).max(Vec3::ZERO)
    }

    /// Expand AABB to include point
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Return merged AABB containing both
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z)
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }
}
