//! Surface-projection attribute transfer between meshes.
//!
//! This crate moves per-vertex attributes from a source mesh onto a target
//! mesh whose topology may differ. Every target vertex is projected onto the
//! source surface once; the hit triangle and its barycentric weights then
//! carry any attribute across:
//!
//! - **Positions**: replace the target vertices or store them as a shape
//! - **Weight maps**: named per-vertex scalars (vertex groups)
//! - **Blend shapes**: transferred as deltas from the reference shape
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Search Methods
//!
//! | Method | Correspondence | Notes |
//! |--------|----------------|-------|
//! | Closest | Nearest point on the source | Default |
//! | Raycast | Along the vertex normal, then against it | Misses keep their value |
//! | Topology | Vertex index | Vertex counts must match |
//! | UV Space | Nearest point in the UV layout | Both meshes need UVs |
//!
//! # Quick Start
//!
//! ```
//! use mesh_transfer::{Scene, TransferParams, TransferRequest};
//! use mesh_types::{BlendShape, MeshSurface, Point3, ShapeKeys, SurfaceAccess, Vector3};
//!
//! let positions = vec![
//!     Point3::new(-1.0, -1.0, 0.0),
//!     Point3::new(1.0, -1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut body = MeshSurface::from_triangles(positions.clone(), &[[0, 1, 2]]).unwrap();
//! let smile: Vec<_> = positions.iter().map(|p| p + Vector3::z()).collect();
//! let mut keys = ShapeKeys::with_reference(positions.clone());
//! keys.push(BlendShape::new("smile", smile));
//! body.set_shape_keys(keys).unwrap();
//!
//! // A single vertex hovering over the middle of the body
//! let marker = MeshSurface::new(vec![Point3::new(0.0, 0.0, 0.5)], vec![]).unwrap();
//!
//! let mut scene = Scene::new();
//! scene.insert_mesh("body", body);
//! scene.insert_mesh("marker", marker);
//!
//! let request = TransferRequest::new(
//!     Some("body".to_string()),
//!     "marker".to_string(),
//!     TransferParams::blend_shapes(),
//! );
//! let output = request.run(&mut scene).unwrap();
//! assert_eq!(output.written, vec!["smile".to_string()]);
//!
//! let marker = scene.mesh("marker").unwrap();
//! let smile = marker.shape_keys().unwrap().get("smile").unwrap();
//! assert!((smile.positions[0].z - 1.5).abs() < 1e-9);
//! ```
//!
//! # Masking
//!
//! A target weight map (optionally inverted) and the target selection limit
//! how much of each transfer reaches a vertex. A mask of zero leaves the
//! vertex exactly as it was.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bvh;
mod correspondence;
mod engine;
mod error;
mod mask;
mod params;
mod projection;
mod request;
mod result;
mod sampling;
mod scene;
mod snap;

pub use bvh::{ray_triangle_intersect, Bvh, BvhNode, NearestHit, RayHit, DEFAULT_MAX_LEAF_SIZE};
pub use correspondence::{
    provider_for, ClosestPoint, CorrespondenceProvider, ProjectionCache, Raycast,
    PARALLEL_THRESHOLD,
};
pub use engine::{AttributeTransfer, Correspondence};
pub use error::{Role, TransferError, TransferResult};
pub use mask::VertexMask;
pub use params::{
    AttributeKind, ObjectSpace, PositionOutput, SearchMethod, TransferParams,
    DEFAULT_POSITION_SHAPE_NAME,
};
pub use projection::{Barycentric, Interpolate, ProjectionRecord, ProjectionResult};
pub use request::{MeshProvider, ReentrancyFlag, ReentrancyGuard, TransferRequest};
pub use result::TransferOutput;
pub use sampling::{SamplingOptions, SamplingSurface};
pub use scene::{Scene, SceneObject};
pub use snap::VertexSnapper;
