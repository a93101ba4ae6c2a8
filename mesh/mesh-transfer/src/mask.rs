//! Per-vertex mask limiting how much of a transfer reaches each target vertex.

use mesh_types::{Point3, SurfaceAccess};

use crate::error::{TransferError, TransferResult};
use crate::params::TransferParams;

/// Per-target-vertex blend factor in `[0, 1]`.
///
/// The product of the selection factor (when restricted to the selection)
/// and the mask weight-map factor (optionally inverted). A factor that is
/// not requested contributes `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexMask {
    factors: Vec<f64>,
}

impl VertexMask {
    /// A mask that lets everything through.
    #[must_use]
    pub fn full(vertex_count: usize) -> Self {
        Self {
            factors: vec![1.0; vertex_count],
        }
    }

    /// Build the mask requested by `params` from the target surface.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::MaskWeightMapNotFound`] if the named mask
    /// weight map does not exist on the target.
    pub fn build<S>(target: &S, params: &TransferParams) -> TransferResult<Self>
    where
        S: SurfaceAccess + ?Sized,
    {
        let mut mask = Self::full(target.vertex_count());

        if let Some(name) = &params.mask_weight_map {
            let weights = target
                .weight_map(name)
                .ok_or_else(|| TransferError::MaskWeightMapNotFound(name.clone()))?;
            for (factor, w) in mask.factors.iter_mut().zip(weights) {
                let w = w.clamp(0.0, 1.0);
                *factor *= if params.invert_mask { 1.0 - w } else { w };
            }
        }

        if params.restrict_to_selection {
            for (factor, &selected) in mask.factors.iter_mut().zip(target.selection()) {
                if !selected {
                    *factor = 0.0;
                }
            }
        }

        Ok(mask)
    }

    /// Build from explicit factors, clamped to `[0, 1]`.
    #[must_use]
    pub fn from_factors(factors: Vec<f64>) -> Self {
        Self {
            factors: factors.into_iter().map(|f| f.clamp(0.0, 1.0)).collect(),
        }
    }

    /// Factor of a vertex (`1.0` past the end).
    #[must_use]
    pub fn factor(&self, vertex: usize) -> f64 {
        self.factors.get(vertex).copied().unwrap_or(1.0)
    }

    /// All factors.
    #[must_use]
    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Whether every factor is exactly one.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_full(&self) -> bool {
        self.factors.iter().all(|&f| f == 1.0)
    }

    /// `original + (candidate - original) * factor`.
    #[must_use]
    pub fn blend_scalar(&self, vertex: usize, original: f64, candidate: f64) -> f64 {
        original + (candidate - original) * self.factor(vertex)
    }

    /// Point version of [`VertexMask::blend_scalar`].
    #[must_use]
    pub fn blend_point(
        &self,
        vertex: usize,
        original: &Point3<f64>,
        candidate: &Point3<f64>,
    ) -> Point3<f64> {
        original + (candidate - original) * self.factor(vertex)
    }
}
