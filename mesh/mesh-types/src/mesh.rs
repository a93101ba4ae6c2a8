//! Indexed triangle mesh.

use crate::{Aabb, Triangle};
use nalgebra::{Matrix4, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// This is the triangulated working copy that spatial queries run against.
/// Positions and faces are stored separately, with faces referencing
/// positions by index.
///
/// # Winding Order
///
/// Faces use **counter-clockwise (CCW) winding** when viewed from outside.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Point3};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
/// mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
/// mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,

    /// Triangle faces as indices into `positions`.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from positions and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(positions: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self { positions, faces }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// A mesh without faces cannot be sampled.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Resolve a face into a [`Triangle`].
    ///
    /// Returns `None` if the face index is out of bounds.
    #[must_use]
    pub fn triangle(&self, face_index: usize) -> Option<Triangle> {
        self.faces
            .get(face_index)
            .map(|&face| self.triangle_of(face))
    }

    /// Iterate over all triangles with resolved positions.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&face| self.triangle_of(face))
    }

    fn triangle_of(&self, [i0, i1, i2]: [u32; 3]) -> Triangle {
        Triangle::new(
            self.positions[i0 as usize],
            self.positions[i1 as usize],
            self.positions[i2 as usize],
        )
    }

    /// Bounding box of all positions.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let mut bbox = Aabb::empty();
        for p in &self.positions {
            bbox.expand_to_include(p);
        }
        bbox
    }

    /// Apply an affine transform (homogeneous 4×4) to every position.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for p in &mut self.positions {
            *p = matrix.transform_point(p);
        }
    }

    /// Area-weighted vertex normals.
    ///
    /// Vertices that belong to no (non-degenerate) face get a zero vector.
    #[must_use]
    pub fn vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.positions.len()];
        for &face in &self.faces {
            // Unnormalized cross product is already weighted by twice the area
            let n = self.triangle_of(face).normal_unnormalized();
            for idx in face {
                normals[idx as usize] += n;
            }
        }
        for n in &mut normals {
            let len = n.norm();
            if len > f64::EPSILON {
                *n /= len;
            } else {
                *n = Vector3::zeros();
            }
        }
        normals
    }

    /// Total surface area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }
}
