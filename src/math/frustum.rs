//! View frustum for culling
//!
//! Planes are stored relative to the eye position: every test subtracts the
//! eye from the query point first, so large world coordinates do not eat the
//! float precision of the plane distances.

use crate::core::types::{Vec3, Vec4, Mat4};
use super::aabb::Aabb;
use super::sphere::BoundingSphere;

/// A plane defined by normal and distance from origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Plane through `point` facing `normal`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self { normal, distance: -normal.dot(point) }
    }

    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// Plane coefficients as (a, b, c, d)
    pub fn to_vec4(&self) -> Vec4 {
        self.normal.extend(self.distance)
    }
}

/// View frustum with 6 planes (Left, Right, Bottom, Top, Near, Far)
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    /// Eye-relative planes
    pub planes: [Plane; 6],
    /// Per plane, corner mask of the AABB vertex farthest along the normal
    p_vertex: [usize; 6],
    eye: Vec3,
}

impl Frustum {
    /// Extract frustum planes from a world-space view-projection matrix
    /// (Gribb/Hartmann) and rebase them on `eye`.
    pub fn from_view_projection(vp: &Mat4, eye: Vec3) -> Self {
        let m = vp.to_cols_array_2d();
        let row = |r: usize| Vec4::new(m[0][r], m[1][r], m[2][r], m[3][r]);

        let raw = [
            row(3) + row(0), // left
            row(3) - row(0), // right
            row(3) + row(1), // bottom
            row(3) - row(1), // top
            row(3) + row(2), // near
            row(3) - row(2), // far
        ];

        let mut planes = [Plane::new(Vec3::ZERO, 0.0); 6];
        for (plane, r) in planes.iter_mut().zip(raw) {
            let world = Self::normalize_plane(r);
            *plane = Plane::new(world.normal, world.distance + world.normal.dot(eye));
        }

        Self::from_planes(planes, eye)
    }

    /// Build from planes that are already relative to `eye`
    pub fn from_planes(planes: [Plane; 6], eye: Vec3) -> Self {
        let mut p_vertex = [0usize; 6];
        for (mask, plane) in p_vertex.iter_mut().zip(planes.iter()) {
            *mask = (plane.normal.x >= 0.0) as usize
                | ((plane.normal.y >= 0.0) as usize) << 1
                | ((plane.normal.z >= 0.0) as usize) << 2;
        }
        Self { planes, p_vertex, eye }
    }

    fn normalize_plane(plane: Vec4) -> Plane {
        let normal = plane.truncate();
        let len = normal.length();
        if len > 0.0 {
            Plane::new(normal / len, plane.w / len)
        } else {
            Plane::new(Vec3::ZERO, plane.w)
        }
    }

    /// Eye position the planes are relative to
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Check if point is inside frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        let p = point - self.eye;
        self.planes.iter().all(|plane| plane.distance_to_point(p) >= 0.0)
    }

    /// Sphere test: rejected only when fully behind one plane
    pub fn test_sphere(&self, sphere: &BoundingSphere) -> bool {
        let c = sphere.center - self.eye;
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(c) >= -sphere.radius)
    }

    /// Check if AABB intersects frustum (conservative test).
    /// A box that contains the eye is always accepted.
    pub fn test_aabb(&self, aabb: &Aabb) -> bool {
        if aabb.contains_point(self.eye) {
            return true;
        }

        for (plane, &mask) in self.planes.iter().zip(self.p_vertex.iter()) {
            // If the p-vertex is outside, the whole box is outside
            let p = aabb.corner(mask) - self.eye;
            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }

    /// Triangle test: rejected only if all three vertices are outside the same plane
    pub fn test_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> bool {
        let (a, b, c) = (a - self.eye, b - self.eye, c - self.eye);
        !self.planes.iter().any(|plane| {
            plane.distance_to_point(a) < 0.0
                && plane.distance_to_point(b) < 0.0
                && plane.distance_to_point(c) < 0.0
        })
    }
}
