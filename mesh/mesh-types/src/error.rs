//! Error types for surface attribute access.

use thiserror::Error;

/// Result type for surface writes.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Errors raised when a write would break a surface invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SurfaceError {
    /// A per-vertex (or per-corner) array does not match the surface size.
    #[error("{attribute} has {actual} entries, expected {expected}")]
    LengthMismatch {
        /// Name of the attribute being written.
        attribute: String,
        /// Required number of entries.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },

    /// A vertex index does not refer to a vertex of the surface.
    #[error("vertex index {index} out of range (surface has {vertex_count} vertices)")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The number of vertices in the surface.
        vertex_count: usize,
    },
}

impl SurfaceError {
    pub(crate) fn length(attribute: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            attribute: attribute.into(),
            expected,
            actual,
        }
    }
}
