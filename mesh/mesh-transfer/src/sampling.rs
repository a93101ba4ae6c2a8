//! Triangulated working copies of host surfaces.
//!
//! Spatial queries never run against the host surface directly. A
//! [`SamplingSurface`] holds a triangulated copy, optionally moved to world
//! space or flattened into UV space, plus the map from working vertices back
//! to surface vertices.

// Mesh processing uses u32 indices; casts are safe for practical mesh sizes.
#![allow(clippy::cast_possible_truncation)]

use mesh_types::{IndexedMesh, Point3, SurfaceAccess, Vector3};
use tracing::{debug, warn};

use crate::error::{Role, TransferError, TransferResult};

/// How a [`SamplingSurface`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingOptions {
    /// Fan-triangulate polygons with more than three corners.
    pub triangulate: bool,
    /// Apply the surface's world transform.
    pub world_space: bool,
    /// Lay the surface out at its UV coordinates (`z = 0`).
    pub uv_space: bool,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            world_space: false,
            uv_space: false,
        }
    }
}

/// A triangulated working copy of a surface.
#[derive(Debug, Clone)]
pub struct SamplingSurface {
    mesh: IndexedMesh,
    vertex_map: Vec<u32>,
    normals: Vec<Vector3<f64>>,
    surface_positions: Vec<Point3<f64>>,
    surface_vertex_count: usize,
    skipped_polygons: usize,
    uv_space: bool,
}

impl SamplingSurface {
    /// Build the working copy of `surface`.
    ///
    /// Polygons with fewer than three corners are ignored. Without
    /// triangulation only polygons that already are triangles are kept.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::MissingUvLayer`] when `uv_space` is requested
    /// for a surface without UVs.
    pub fn build<S>(surface: &S, options: SamplingOptions, role: Role) -> TransferResult<Self>
    where
        S: SurfaceAccess + ?Sized,
    {
        let polygons = surface.polygons();
        let mut skipped_polygons = 0;

        let (mut mesh, vertex_map) = if options.uv_space {
            let layer = surface
                .uv_layer()
                .ok_or(TransferError::MissingUvLayer { role })?;
            let positions: Vec<Point3<f64>> = layer
                .uvs
                .iter()
                .map(|&[u, v]| Point3::new(u, v, 0.0))
                .collect();
            let vertex_map: Vec<u32> = polygons.iter().flatten().copied().collect();
            (IndexedMesh::from_parts(positions, Vec::new()), vertex_map)
        } else {
            let vertex_map = (0..surface.vertex_count() as u32).collect();
            (
                IndexedMesh::from_parts(surface.positions().to_vec(), Vec::new()),
                vertex_map,
            )
        };

        let mut corner = 0_u32;
        for polygon in polygons {
            let n = polygon.len() as u32;
            // In UV space faces reference corners, otherwise vertices
            let index = |k: u32| {
                if options.uv_space {
                    corner + k
                } else {
                    polygon[k as usize]
                }
            };
            if n < 3 || (n > 3 && !options.triangulate) {
                skipped_polygons += 1;
            } else {
                for k in 1..n - 1 {
                    mesh.faces.push([index(0), index(k), index(k + 1)]);
                }
            }
            corner += n;
        }

        if skipped_polygons > 0 {
            warn!(
                role = %role,
                skipped = skipped_polygons,
                "Polygons left out of the sampling surface"
            );
        }

        let mut surface_positions = surface.positions().to_vec();
        if options.world_space && !options.uv_space {
            let matrix = surface.world_transform();
            mesh.transform(matrix);
            for p in &mut surface_positions {
                *p = matrix.transform_point(p);
            }
        }

        let normals = mesh.vertex_normals();

        debug!(
            role = %role,
            vertices = mesh.vertex_count(),
            triangles = mesh.face_count(),
            uv_space = options.uv_space,
            world_space = options.world_space,
            "Built sampling surface"
        );

        Ok(Self {
            mesh,
            vertex_map,
            normals,
            surface_positions,
            surface_vertex_count: surface.vertex_count(),
            skipped_polygons,
            uv_space: options.uv_space,
        })
    }

    /// The triangulated copy.
    #[must_use]
    pub const fn mesh(&self) -> &IndexedMesh {
        &self.mesh
    }

    /// Surface vertex of each working vertex.
    #[must_use]
    pub fn vertex_map(&self) -> &[u32] {
        &self.vertex_map
    }

    /// Area-weighted normals of the working vertices.
    ///
    /// Zero for vertices without adjacent triangles.
    #[must_use]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Surface vertex positions in the sampling coordinate system.
    ///
    /// Equal to the working positions outside UV space.
    #[must_use]
    pub fn surface_positions(&self) -> &[Point3<f64>] {
        &self.surface_positions
    }

    /// Number of working vertices.
    #[must_use]
    pub fn working_vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Number of vertices of the surface this copy was built from.
    #[must_use]
    pub const fn surface_vertex_count(&self) -> usize {
        self.surface_vertex_count
    }

    /// Polygons that were not indexed.
    #[must_use]
    pub const fn skipped_polygons(&self) -> usize {
        self.skipped_polygons
    }

    /// Whether the copy lives in UV space.
    #[must_use]
    pub const fn is_uv_space(&self) -> bool {
        self.uv_space
    }
}
