//! Transfer result and statistics.
//!
//! This module provides the [`TransferOutput`] struct returned by
//! [`TransferRequest::run`](crate::TransferRequest::run).

use crate::params::AttributeKind;

/// Result of a transfer request.
///
/// # Examples
///
/// ```
/// use mesh_transfer::{AttributeKind, TransferOutput};
///
/// let mut output = TransferOutput::new(AttributeKind::WeightMaps, 4);
/// output.written.push("arm".to_string());
/// output.missed_vertices = 1;
///
/// assert!(output.wrote_anything());
/// assert!(output.has_misses());
/// println!("{}", output.summary());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutput {
    /// Attribute kind that was transferred.
    pub attribute: AttributeKind,
    /// Names of the weight maps or blend shapes written.
    ///
    /// For position transfers this holds the shape name when positions were
    /// stored as a shape, and is empty when they replaced the vertices.
    pub written: Vec<String>,
    /// Number of target vertices.
    pub vertices: usize,
    /// Target vertices that found no source surface and kept their fallback.
    pub missed_vertices: usize,
    /// Target vertices that landed on a zero-area source triangle.
    pub degenerate_vertices: usize,
}

impl TransferOutput {
    /// Creates an empty result.
    #[must_use]
    pub const fn new(attribute: AttributeKind, vertices: usize) -> Self {
        Self {
            attribute,
            written: Vec::new(),
            vertices,
            missed_vertices: 0,
            degenerate_vertices: 0,
        }
    }

    /// Whether any named attribute was written.
    #[must_use]
    pub fn wrote_anything(&self) -> bool {
        !self.written.is_empty()
    }

    /// Whether any target vertex fell back to its original value.
    #[must_use]
    pub const fn has_misses(&self) -> bool {
        self.missed_vertices > 0 || self.degenerate_vertices > 0
    }

    /// Returns a one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "TransferOutput: {:?}, {} written, {} vertices, {} missed, {} degenerate",
            self.attribute,
            self.written.len(),
            self.vertices,
            self.missed_vertices,
            self.degenerate_vertices
        )
    }
}
