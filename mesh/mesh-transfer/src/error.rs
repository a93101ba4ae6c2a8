//! Error types for attribute transfer.

use std::fmt;

use mesh_types::SurfaceError;
use thiserror::Error;

/// Which side of a transfer an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The object attributes are read from.
    Source,
    /// The object attributes are written to.
    Target,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Errors that abort a transfer before anything is written.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    /// No source object was picked, or it no longer exists.
    #[error("no source object")]
    MissingSource,

    /// The target object does not exist.
    #[error("target object does not exist")]
    MissingTarget,

    /// The source or target is not a mesh.
    #[error("{role} object is not a mesh")]
    NotAMesh {
        /// Offending side.
        role: Role,
    },

    /// Index-matched transfer between surfaces with different vertex counts.
    #[error(
        "topology transfer requires identical vertex counts (source: {source_vertices}, target: {target_vertices})"
    )]
    TopologyMismatch {
        /// Vertex count of the source surface.
        source_vertices: usize,
        /// Vertex count of the target surface.
        target_vertices: usize,
    },

    /// The weight map named as mask does not exist on the target.
    #[error("mask weight map '{0}' not found on target")]
    MaskWeightMapNotFound(String),

    /// UV-space search on a surface without a UV layer.
    #[error("{role} surface has no UV layer")]
    MissingUvLayer {
        /// Offending side.
        role: Role,
    },

    /// A world transform that cannot be inverted.
    #[error("{role} world transform is not invertible")]
    SingularTransform {
        /// Offending side.
        role: Role,
    },

    /// A position shape would overwrite the target's reference shape.
    #[error("shape '{0}' is the target's reference shape")]
    ReferenceShapeName(String),

    /// A transfer was started while another one on the same request was running.
    #[error("a transfer is already in progress")]
    Reentrant,

    /// Writing back to the target surface failed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;
