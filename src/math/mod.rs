//! Mathematical utilities and bounding volumes

pub mod aabb;
pub mod sphere;
pub mod ray;
pub mod frustum;
pub mod obb;
pub mod polygon;
pub mod intersect;

pub use aabb::Aabb;
pub use sphere::BoundingSphere;
pub use ray::Ray;
pub use frustum::{Plane, Frustum};
pub use obb::Obb;
pub use polygon::{ConvexHull, Polygon, Triangle};
