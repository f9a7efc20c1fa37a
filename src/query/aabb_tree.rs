//! AABB tree over exact triangles, used by `CollisionShape::Perfect`

use crate::math::intersect::ray_triangle;
use crate::math::{Aabb, Polygon, Ray, Triangle};

#[derive(Clone, Debug)]
pub enum AabbTreeKind {
    Leaf(Triangle),
    Inner { left: usize, right: usize },
}

#[derive(Clone, Debug)]
pub struct AabbTreeNode {
    pub aabb: Aabb,
    pub kind: AabbTreeKind,
}

/// Binary tree with one triangle per leaf; node 0 is the root
#[derive(Clone, Debug, Default)]
pub struct AabbTree {
    nodes: Vec<AabbTreeNode>,
}

impl AabbTree {
    /// Median split along the longest axis of the triangle centroids
    pub fn build(triangles: &[Triangle]) -> Self {
        let mut tree = Self { nodes: Vec::with_capacity(triangles.len() * 2) };
        if !triangles.is_empty() {
            let mut work: Vec<Triangle> = triangles.to_vec();
            tree.build_node(&mut work);
        }
        tree
    }

    pub fn from_polygons(polygons: &[Polygon]) -> Self {
        let triangles: Vec<Triangle> = polygons.iter().flat_map(Polygon::triangles).collect();
        Self::build(&triangles)
    }

    fn build_node(&mut self, triangles: &mut [Triangle]) -> usize {
        let index = self.nodes.len();

        if let [tri] = triangles {
            self.nodes.push(AabbTreeNode { aabb: tri.aabb(), kind: AabbTreeKind::Leaf(*tri) });
            return index;
        }

        let aabb = triangles
            .iter()
            .map(Triangle::aabb)
            .reduce(|a, b| a.merged(&b))
            .unwrap_or_default();
        let centroids = Aabb::from_points(triangles.iter().map(Triangle::centroid)).unwrap_or(aabb);
        let axis = centroids.longest_axis();
        triangles.sort_by(|a, b| a.centroid()[axis].total_cmp(&b.centroid()[axis]));

        // reserve the slot, children are filled in below
        self.nodes.push(AabbTreeNode {
            aabb,
            kind: AabbTreeKind::Inner { left: 0, right: 0 },
        });

        let mid = triangles.len() / 2;
        let (lo, hi) = triangles.split_at_mut(mid);
        let left = self.build_node(lo);
        let right = self.build_node(hi);
        self.nodes[index].kind = AabbTreeKind::Inner { left, right };
        index
    }

    pub fn aabb(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| n.aabb)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Closest triangle hit along the ray
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut best: Option<f32> = None;
        let mut stack = Vec::with_capacity(32);
        if !self.nodes.is_empty() {
            stack.push(0usize);
        }

        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            match ray.intersects_aabb(&node.aabb) {
                Some((t_near, _)) if best.is_none_or(|b| t_near <= b) => {}
                _ => continue,
            }

            match &node.kind {
                AabbTreeKind::Leaf(tri) => {
                    if let Some(t) = ray_triangle(ray, tri) {
                        if best.is_none_or(|b| t < b) {
                            best = Some(t);
                        }
                    }
                }
                AabbTreeKind::Inner { left, right } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        best
    }
}
