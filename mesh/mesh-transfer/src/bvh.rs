//! Bounding Volume Hierarchy for closest-point and ray queries.
//!
//! This module provides a BVH over the triangles of an [`IndexedMesh`],
//! answering nearest-surface-point and first-ray-hit queries in roughly
//! O(log n) instead of testing every triangle.

// Mesh processing uses u32 indices; casts are safe for practical mesh sizes.
#![allow(clippy::cast_possible_truncation)]

use mesh_types::{Aabb, IndexedMesh, Triangle};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

/// Default maximum number of triangles per leaf.
pub const DEFAULT_MAX_LEAF_SIZE: usize = 8;

/// Parallel-ray threshold, also the tolerance for hits just behind the origin.
const RAY_EPSILON: f64 = 1e-10;

/// BVH node containing either leaf triangles or child nodes.
#[derive(Debug)]
pub enum BvhNode {
    /// Leaf node containing triangle indices.
    Leaf {
        /// Bounding box of all triangles in this leaf.
        bbox: Aabb,
        /// Triangle indices stored in this leaf.
        triangles: SmallVec<[u32; 8]>,
    },
    /// Internal node with two children.
    Internal {
        /// Bounding box of all triangles in this subtree.
        bbox: Aabb,
        /// Left child node.
        left: Box<Self>,
        /// Right child node.
        right: Box<Self>,
    },
}

impl BvhNode {
    /// Get the bounding box of this node.
    #[must_use]
    pub const fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Closest point on the indexed surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestHit {
    /// The point on the surface.
    pub point: Point3<f64>,
    /// Index of the triangle the point lies on.
    pub triangle: u32,
    /// Squared distance from the query point.
    pub distance_squared: f64,
}

/// First intersection of a ray with the indexed surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Intersection point.
    pub point: Point3<f64>,
    /// Index of the triangle that was hit.
    pub triangle: u32,
    /// Distance along the (normalized) ray direction.
    pub distance: f64,
}

/// Bounding Volume Hierarchy for triangle meshes.
///
/// Read-only once built.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Point3};
/// use mesh_transfer::Bvh;
///
/// let mesh = IndexedMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// );
///
/// let bvh = Bvh::build(&mesh, 8);
/// let hit = bvh.nearest(&Point3::new(0.25, 0.25, 2.0)).unwrap();
/// assert_eq!(hit.triangle, 0);
/// assert!((hit.distance_squared - 4.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Bvh {
    root: Option<BvhNode>,
    triangles: Vec<Triangle>,
}

impl Bvh {
    /// Build a BVH from a mesh.
    ///
    /// # Arguments
    ///
    /// * `mesh` - The mesh to build the BVH for
    /// * `max_leaf_size` - Maximum triangles per leaf node
    #[must_use]
    pub fn build(mesh: &IndexedMesh, max_leaf_size: usize) -> Self {
        let triangles: Vec<Triangle> = mesh.triangles().collect();
        if triangles.is_empty() {
            return Self {
                root: None,
                triangles,
            };
        }

        let boxes: Vec<(u32, Aabb)> = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| (i as u32, Aabb::from_triangle(tri)))
            .collect();

        let indices: Vec<usize> = (0..boxes.len()).collect();
        let root = Self::build_recursive(&boxes, indices, max_leaf_size.max(1));

        Self {
            root: Some(root),
            triangles,
        }
    }

    fn build_recursive(boxes: &[(u32, Aabb)], indices: Vec<usize>, max_leaf_size: usize) -> BvhNode {
        let mut bbox = Aabb::empty();
        for &i in &indices {
            bbox.merge(&boxes[i].1);
        }

        if indices.len() <= max_leaf_size {
            let triangles: SmallVec<[u32; 8]> = indices.iter().map(|&i| boxes[i].0).collect();
            return BvhNode::Leaf { bbox, triangles };
        }

        // Median split along the longest axis
        let axis = bbox.longest_axis();
        let mut sorted = indices;
        sorted.sort_by(|&a, &b| {
            let ca = boxes[a].1.center()[axis];
            let cb = boxes[b].1.center()[axis];
            ca.total_cmp(&cb)
        });

        let right_indices = sorted.split_off(sorted.len() / 2);
        let left = Self::build_recursive(boxes, sorted, max_leaf_size);
        let right = Self::build_recursive(boxes, right_indices, max_leaf_size);

        BvhNode::Internal {
            bbox,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of indexed triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the BVH indexes no triangles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Corners of an indexed triangle.
    #[must_use]
    pub fn triangle(&self, index: u32) -> Option<&Triangle> {
        self.triangles.get(index as usize)
    }

    /// Closest point on any indexed triangle.
    ///
    /// Returns `None` only when the BVH is empty. Ties keep the triangle
    /// visited first.
    #[must_use]
    pub fn nearest(&self, point: &Point3<f64>) -> Option<NearestHit> {
        let root = self.root.as_ref()?;
        let mut best: Option<NearestHit> = None;
        let mut best_dist = f64::INFINITY;
        let mut stack: Vec<(&BvhNode, f64)> = vec![(root, root.bbox().distance_squared_to(point))];

        while let Some((node, box_dist)) = stack.pop() {
            if box_dist > best_dist {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    for &t in triangles {
                        let tri = &self.triangles[t as usize];
                        let candidate = tri.closest_point(point);
                        let d = (candidate - point).norm_squared();
                        if d < best_dist {
                            best_dist = d;
                            best = Some(NearestHit {
                                point: candidate,
                                triangle: t,
                                distance_squared: d,
                            });
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    let dl = left.bbox().distance_squared_to(point);
                    let dr = right.bbox().distance_squared_to(point);
                    // Push the farther child first so the nearer one is popped next
                    let (left, right) = (left.as_ref(), right.as_ref());
                    if dl <= dr {
                        stack.push((right, dr));
                        stack.push((left, dl));
                    } else {
                        stack.push((left, dl));
                        stack.push((right, dr));
                    }
                }
            }
        }

        best
    }

    /// First triangle hit by a ray from `origin` along `direction`.
    ///
    /// `direction` need not be normalized; a zero direction never hits.
    /// Hits at the origin itself (distance zero) are reported.
    #[must_use]
    pub fn ray_cast(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<RayHit> {
        let root = self.root.as_ref()?;
        let dir = direction.try_normalize(f64::EPSILON)?;
        let inv_dir = dir.map(|d| 1.0 / d);

        let mut best: Option<RayHit> = None;
        let mut best_t = f64::INFINITY;
        let mut stack: Vec<&BvhNode> = vec![root];

        while let Some(node) = stack.pop() {
            let Some(entry) = node.bbox().ray_entry(origin, &inv_dir) else {
                continue;
            };
            if entry > best_t {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    for &t in triangles {
                        let tri = &self.triangles[t as usize];
                        if let Some(dist) = ray_triangle_intersect(origin, &dir, tri) {
                            if dist < best_t {
                                best_t = dist;
                                best = Some(RayHit {
                                    point: origin + dir * dist,
                                    triangle: t,
                                    distance: dist,
                                });
                            }
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        best
    }
}

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the ray parameter of the hit, or `None` if the ray misses, runs
/// parallel to the triangle, or the hit lies behind the origin.
#[must_use]
pub fn ray_triangle_intersect(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    tri: &Triangle,
) -> Option<f64> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    // Ray is parallel to triangle
    if a.abs() < RAY_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t >= -RAY_EPSILON).then_some(t.max(0.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A 10×10 grid of unit quads in the z=0 plane (200 triangles).
    fn grid() -> IndexedMesh {
        let n = 10_u32;
        let mut mesh = IndexedMesh::new();
        for y in 0..=n {
            for x in 0..=n {
                mesh.positions
                    .push(Point3::new(f64::from(x), f64::from(y), 0.0));
            }
        }
        for y in 0..n {
            for x in 0..n {
                let i = y * (n + 1) + x;
                mesh.faces.push([i, i + 1, i + n + 2]);
                mesh.faces.push([i, i + n + 2, i + n + 1]);
            }
        }
        mesh
    }

    fn brute_force_nearest(mesh: &IndexedMesh, p: &Point3<f64>) -> f64 {
        mesh.triangles()
            .map(|t| (t.closest_point(p) - p).norm_squared())
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn empty_mesh_has_no_hits() {
        let bvh = Bvh::build(&IndexedMesh::new(), 8);
        assert!(bvh.is_empty());
        assert!(bvh.nearest(&Point3::origin()).is_none());
        assert!(bvh
            .ray_cast(&Point3::origin(), &Vector3::z())
            .is_none());
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mesh = grid();
        let bvh = Bvh::build(&mesh, 4);
        assert_eq!(bvh.triangle_count(), 200);
        for p in [
            Point3::new(3.3, 4.7, 1.0),
            Point3::new(-2.0, 5.0, 0.5),
            Point3::new(12.0, 12.0, -3.0),
            Point3::new(7.5, 0.1, 0.0),
        ] {
            let hit = bvh.nearest(&p).unwrap();
            assert_relative_eq!(hit.distance_squared, brute_force_nearest(&mesh, &p), epsilon = 1e-9);
            let tri = bvh.triangle(hit.triangle).unwrap();
            assert_relative_eq!((tri.closest_point(&p) - hit.point).norm(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn ray_hits_plane_from_both_sides() {
        let bvh = Bvh::build(&grid(), DEFAULT_MAX_LEAF_SIZE);
        let down = bvh
            .ray_cast(&Point3::new(2.3, 2.6, 3.0), &Vector3::new(0.0, 0.0, -2.0))
            .unwrap();
        assert_relative_eq!(down.distance, 3.0, epsilon = 1e-12);
        assert_relative_eq!(down.point.z, 0.0, epsilon = 1e-12);

        // Pointing away from the plane misses
        assert!(bvh
            .ray_cast(&Point3::new(2.3, 2.6, 3.0), &Vector3::z())
            .is_none());
    }

    #[test]
    fn ray_from_surface_point_hits_at_zero() {
        let bvh = Bvh::build(&grid(), DEFAULT_MAX_LEAF_SIZE);
        let hit = bvh
            .ray_cast(&Point3::new(4.25, 6.5, 0.0), &Vector3::z())
            .unwrap();
        assert_relative_eq!(hit.distance, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_direction_never_hits() {
        let bvh = Bvh::build(&grid(), DEFAULT_MAX_LEAF_SIZE);
        assert!(bvh
            .ray_cast(&Point3::new(1.0, 1.0, 1.0), &Vector3::zeros())
            .is_none());
    }
}
