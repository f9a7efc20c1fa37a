//! Convex polygons, triangles and convex hulls built from authoring meshes

use serde::{Deserialize, Serialize};

use crate::core::types::{Mat4, Vec3};
use super::aabb::Aabb;
use super::frustum::Plane;
use super::sphere::BoundingSphere;

/// Slack used by point-in-hull tests so points on a face count as inside
pub const HULL_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.a.min(self.b).min(self.c), self.a.max(self.b).max(self.c))
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.a + offset, self.b + offset, self.c + offset)
    }
}

/// Planar convex polygon with counter-clockwise winding seen from outside
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vec3>,
    #[serde(default)]
    pub normal: Vec3,
}

impl Polygon {
    /// Create a polygon, deriving its normal with Newell's method
    pub fn new(vertices: Vec<Vec3>) -> Self {
        let normal = newell_normal(&vertices);
        Self { vertices, normal }
    }

    /// Recompute the normal if it was not authored
    pub fn with_normal(mut self) -> Self {
        if self.normal.length_squared() < 1e-12 {
            self.normal = newell_normal(&self.vertices);
        }
        self
    }

    /// Fan triangulation
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        let v = &self.vertices;
        (2..v.len()).map(move |i| Triangle::new(v[0], v[i - 1], v[i]))
    }

    /// Apply a rigid transform to vertices and normal
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| matrix.transform_point3(*v)).collect(),
            normal: matrix.transform_vector3(self.normal).normalize_or_zero(),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| *v + offset).collect(),
            normal: self.normal,
        }
    }

    /// Supporting plane of the polygon
    pub fn plane(&self) -> Plane {
        let origin = self.vertices.first().copied().unwrap_or(Vec3::ZERO);
        Plane::from_point_normal(origin, self.normal)
    }
}

fn newell_normal(vertices: &[Vec3]) -> Vec3 {
    let mut n = Vec3::ZERO;
    for (i, cur) in vertices.iter().enumerate() {
        let next = vertices[(i + 1) % vertices.len()];
        n.x += (cur.y - next.y) * (cur.z + next.z);
        n.y += (cur.z - next.z) * (cur.x + next.x);
        n.z += (cur.x - next.x) * (cur.y + next.y);
    }
    n.normalize_or_zero()
}

/// Rotation used by authoring data: only the y angle (radians) around +Y is honored
pub fn y_rotation(angle: f32) -> Mat4 {
    Mat4::from_rotation_y(angle)
}

/// Convex volume described by its outward-facing faces
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvexHull {
    pub polygons: Vec<Polygon>,
    planes: Vec<Plane>,
}

impl ConvexHull {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let planes = polygons
            .iter()
            .filter(|p| !p.vertices.is_empty() && p.normal != Vec3::ZERO)
            .map(Polygon::plane)
            .collect();
        Self { polygons, planes }
    }

    /// Axis-aligned box as a hull, used for tests and simple rooms
    pub fn from_aabb(aabb: &Aabb) -> Self {
        let c = |mask| aabb.corner(mask);
        let quads = [
            [c(0b000), c(0b100), c(0b110), c(0b010)], // -x
            [c(0b001), c(0b011), c(0b111), c(0b101)], // +x
            [c(0b000), c(0b001), c(0b101), c(0b100)], // -y
            [c(0b010), c(0b110), c(0b111), c(0b011)], // +y
            [c(0b000), c(0b010), c(0b011), c(0b001)], // -z
            [c(0b100), c(0b101), c(0b111), c(0b110)], // +z
        ];
        Self::new(quads.into_iter().map(|q| Polygon::new(q.to_vec())).collect())
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Half-space test against every face
    pub fn contains_point(&self, p: Vec3) -> bool {
        !self.planes.is_empty()
            && self.planes.iter().all(|plane| plane.distance_to_point(p) <= HULL_EPSILON)
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.polygons.iter().flat_map(|p| p.vertices.iter().copied())
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        let vertices: Vec<Vec3> = self.vertices().collect();
        BoundingSphere::from_points(&vertices)
    }

    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices())
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.polygons.iter().flat_map(Polygon::triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newell_normal() {
        let quad = Polygon::new(vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ]);
        assert!((quad.normal - Vec3::Z).length() < 1e-6);
        assert_eq!(quad.triangles().count(), 2);
    }

    #[test]
    fn test_box_hull_faces_outward() {
        let hull = ConvexHull::from_aabb(&Aabb::new(Vec3::ZERO, Vec3::splat(2.0)));
        let center = Vec3::ONE;
        for polygon in &hull.polygons {
            let face_center = polygon.vertices.iter().copied().sum::<Vec3>() / 4.0;
            assert!((face_center - center).dot(polygon.normal) > 0.0);
        }
    }

    #[test]
    fn test_hull_contains_point() {
        let hull = ConvexHull::from_aabb(&Aabb::new(Vec3::ZERO, Vec3::splat(2.0)));
        assert!(hull.contains_point(Vec3::ONE));
        assert!(hull.contains_point(Vec3::new(2.0, 1.0, 1.0)));
        assert!(!hull.contains_point(Vec3::new(2.5, 1.0, 1.0)));
        assert!(!ConvexHull::default().contains_point(Vec3::ZERO));
    }

    #[test]
    fn test_rotated_polygon() {
        let poly = Polygon::new(vec![Vec3::ZERO, Vec3::Y, Vec3::new(0.0, 1.0, 1.0), Vec3::Z]);
        let rotated = poly.transformed(&y_rotation(std::f32::consts::FRAC_PI_2));
        // +X normal rotated a quarter turn around Y faces -Z
        assert!((poly.normal - Vec3::X).length() < 1e-5);
        assert!((rotated.normal - Vec3::NEG_Z).length() < 1e-5);
    }
}
