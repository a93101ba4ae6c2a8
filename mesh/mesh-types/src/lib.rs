//! Core surface types for attribute transfer.
//!
//! This crate provides the data model shared by the transfer algorithms:
//!
//! - [`MeshSurface`] - A polygonal surface as the host stores it, with
//!   selection, weight maps, shape keys, a UV layer and a world transform
//! - [`SurfaceAccess`] - Read/write accessor trait over host surfaces
//! - [`WeightMap`] - A named sparse per-vertex scalar map (vertex group)
//! - [`BlendShape`] / [`ShapeKeys`] - Alternate position arrays (morph targets)
//! - [`IndexedMesh`] - A triangulated working copy for spatial queries
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Host application plugins
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system**. Face winding is
//! **counter-clockwise (CCW) when viewed from outside**.
//!
//! # Example
//!
//! ```
//! use mesh_types::{MeshSurface, Point3, SurfaceAccess, WeightMap};
//!
//! let mut surface = MeshSurface::from_triangles(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.5, 1.0, 0.0),
//!     ],
//!     &[[0, 1, 2]],
//! )
//! .unwrap();
//!
//! surface.set_weight_map("tip", &[0.0, 0.0, 1.0]).unwrap();
//! assert_eq!(surface.weight_map("tip"), Some(vec![0.0, 0.0, 1.0]));
//! assert_eq!(surface.vertex_count(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod error;
mod mesh;
mod shape;
mod surface;
mod traits;
mod triangle;
mod weights;

pub use bounds::Aabb;
pub use error::{SurfaceError, SurfaceResult};
pub use mesh::IndexedMesh;
pub use shape::{BlendShape, ShapeKeys, REFERENCE_SHAPE_NAME};
pub use surface::{MeshSurface, UvLayer};
pub use traits::SurfaceAccess;
pub use triangle::{Triangle, ZERO_AREA_EPSILON};
pub use weights::WeightMap;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector3};
