//! Narrow-phase intersection primitives

use crate::core::types::Vec3;
use super::polygon::{ConvexHull, Triangle};
use super::ray::Ray;
use super::sphere::BoundingSphere;

const EPSILON: f32 = 1e-7;

/// Ray against sphere. Returns the entry distance, 0 if the origin is inside.
pub fn ray_sphere(ray: &Ray, sphere: &BoundingSphere) -> Option<f32> {
    let m = ray.origin - sphere.center;
    let b = m.dot(ray.direction);
    let c = m.length_squared() - sphere.radius * sphere.radius;

    // origin outside and pointing away
    if c > 0.0 && b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    Some((-b - discriminant.sqrt()).max(0.0))
}

/// Two-sided Möller–Trumbore ray/triangle test
pub fn ray_triangle(ray: &Ray, tri: &Triangle) -> Option<f32> {
    let e1 = tri.b - tri.a;
    let e2 = tri.c - tri.a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - tri.a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Segment `p -> q` against the quad `a b c d`, split as triangles `abc` and `acd`.
/// Returns the intersection point.
pub fn segment_quad(p: Vec3, q: Vec3, a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Option<Vec3> {
    let (ray, length) = Ray::between(p, q);
    if length <= 0.0 {
        return None;
    }

    [Triangle::new(a, b, c), Triangle::new(a, c, d)]
        .iter()
        .filter_map(|tri| ray_triangle(&ray, tri))
        .filter(|t| *t <= length)
        .min_by(|x, y| x.total_cmp(y))
        .map(|t| ray.at(t))
}

/// Ray against a convex hull by clipping the parametric range with each face.
/// `offset` is added to the hull (hulls are stored in local space).
pub fn ray_convex_hull(ray: &Ray, hull: &ConvexHull, offset: Vec3) -> Option<f32> {
    let origin = ray.origin - offset;
    let mut t_enter = 0.0f32;
    let mut t_exit = f32::INFINITY;

    if hull.planes().is_empty() {
        return None;
    }

    for plane in hull.planes() {
        let denom = plane.normal.dot(ray.direction);
        let dist = plane.distance_to_point(origin);
        if denom.abs() < EPSILON {
            if dist > 0.0 {
                return None;
            }
            continue;
        }

        let t = -dist / denom;
        if denom < 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }

        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

/// Closest point on a triangle to `p` (Ericson, Real-Time Collision Detection 5.1.5)
pub fn closest_point_on_triangle(p: Vec3, tri: &Triangle) -> Vec3 {
    let (a, b, c) = (tri.a, tri.b, tri.c);
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

pub fn sphere_triangle(sphere: &BoundingSphere, tri: &Triangle) -> bool {
    let closest = closest_point_on_triangle(sphere.center, tri);
    closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;

    fn floor_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        )
    }

    #[test]
    fn test_ray_sphere() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0);
        let t = ray_sphere(&Ray::new(Vec3::ZERO, Vec3::Z), &sphere).unwrap();
        assert!((t - 8.0).abs() < 1e-4);
        assert!(ray_sphere(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), &sphere).is_none());
        assert!(ray_sphere(&Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::Z), &sphere).is_none());
        let inside = ray_sphere(&Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::X), &sphere);
        assert_eq!(inside, Some(0.0));
    }

    #[test]
    fn test_ray_triangle_both_sides() {
        let tri = floor_triangle();
        let down = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        assert!((ray_triangle(&down, &tri).unwrap() - 5.0).abs() < 1e-5);
        let up = Ray::new(Vec3::new(0.0, -3.0, 0.0), Vec3::Y);
        assert!((ray_triangle(&up, &tri).unwrap() - 3.0).abs() < 1e-5);
        let outside = Ray::new(Vec3::new(3.0, 5.0, 0.0), Vec3::NEG_Y);
        assert!(ray_triangle(&outside, &tri).is_none());
        let parallel = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(ray_triangle(&parallel, &tri).is_none());
    }

    #[test]
    fn test_segment_quad() {
        let (a, b, c, d) = (
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
        );
        let hit = segment_quad(Vec3::new(0.75, 5.0, 0.25), Vec3::new(0.75, -5.0, 0.25), a, b, c, d).unwrap();
        assert!((hit - Vec3::new(0.75, 1.0, 0.25)).length() < 1e-4);

        // segment ends before reaching the quad
        assert!(segment_quad(Vec3::new(0.5, 5.0, 0.5), Vec3::new(0.5, 2.0, 0.5), a, b, c, d).is_none());
    }

    #[test]
    fn test_ray_convex_hull() {
        let hull = ConvexHull::from_aabb(&Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)));
        let ray = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::X);
        let t = ray_convex_hull(&ray, &hull, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        assert!((t - 14.0).abs() < 1e-4);

        let miss = Ray::new(Vec3::new(-10.0, 3.0, 0.0), Vec3::X);
        assert!(ray_convex_hull(&miss, &hull, Vec3::ZERO).is_none());

        let from_inside = Ray::new(Vec3::ZERO, Vec3::Y);
        assert_eq!(ray_convex_hull(&from_inside, &hull, Vec3::ZERO), Some(0.0));
    }

    #[test]
    fn test_sphere_triangle() {
        let tri = floor_triangle();
        assert!(sphere_triangle(&BoundingSphere::new(Vec3::new(0.0, 0.5, 0.0), 0.75), &tri));
        assert!(!sphere_triangle(&BoundingSphere::new(Vec3::new(0.0, 1.0, 0.0), 0.75), &tri));
        // near a vertex region
        assert!(sphere_triangle(&BoundingSphere::new(Vec3::new(-1.5, 0.0, -1.5), 0.75), &tri));
    }
}
