//! Host-facing transfer requests.
//!
//! A [`TransferRequest`] names a source and a target object in a host scene
//! reached through [`MeshProvider`], validates them, and drives one
//! [`AttributeTransfer`] to completion.

use std::borrow::Borrow;
use std::cell::Cell;
use std::rc::Rc;

use mesh_types::{ShapeKeys, SurfaceAccess};
use tracing::{debug, info};

use crate::engine::AttributeTransfer;
use crate::error::{Role, TransferError, TransferResult};
use crate::params::{AttributeKind, PositionOutput, TransferParams};
use crate::result::TransferOutput;

/// Object lookup in a host scene.
pub trait MeshProvider {
    /// Key identifying an object (for example `str` for named objects).
    type Object: ?Sized;
    /// Surface type of mesh objects.
    type Surface: SurfaceAccess + Clone;

    /// Whether the object exists.
    fn contains(&self, object: &Self::Object) -> bool;

    /// Whether the object exists and is a mesh.
    fn is_mesh(&self, object: &Self::Object) -> bool;

    /// Base surface of a mesh object.
    fn surface(&self, object: &Self::Object) -> Option<&Self::Surface>;

    /// Mutable base surface of a mesh object.
    fn surface_mut(&mut self, object: &Self::Object) -> Option<&mut Self::Surface>;

    /// Surface with deformations applied. Defaults to a copy of the base
    /// surface.
    fn evaluated_surface(&self, object: &Self::Object) -> Option<Self::Surface> {
        self.surface(object).cloned()
    }
}

/// Shared "transfer in progress" flag.
///
/// Clone it into host callbacks that may trigger a transfer while another is
/// running; [`TransferRequest::run`] rejects re-entrant calls.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyFlag(Rc<Cell<bool>>);

impl ReentrancyFlag {
    /// A lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transfer is running.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.get()
    }

    /// Raise the flag until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Reentrant`] if the flag is already raised.
    pub fn raise(&self) -> TransferResult<ReentrancyGuard> {
        if self.0.replace(true) {
            return Err(TransferError::Reentrant);
        }
        Ok(ReentrancyGuard(Rc::clone(&self.0)))
    }
}

/// Lowers a [`ReentrancyFlag`] when dropped.
#[derive(Debug)]
pub struct ReentrancyGuard(Rc<Cell<bool>>);

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// One transfer from a source object to a target object.
///
/// # Example
///
/// ```
/// use mesh_transfer::{Scene, TransferParams, TransferRequest};
/// use mesh_types::{MeshSurface, Point3, SurfaceAccess};
///
/// let tri = MeshSurface::from_triangles(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     &[[0, 1, 2]],
/// )
/// .unwrap();
///
/// let mut scene = Scene::new();
/// let mut body = tri.clone();
/// body.set_weight_map("spine", &[1.0, 1.0, 1.0]).unwrap();
/// scene.insert_mesh("body", body);
/// scene.insert_mesh("shirt", tri);
///
/// let request = TransferRequest::new(
///     Some("body".to_string()),
///     "shirt".to_string(),
///     TransferParams::weight_maps(),
/// );
/// let output = request.run(&mut scene).unwrap();
///
/// assert_eq!(output.written, vec!["spine".to_string()]);
/// assert!(scene.mesh("shirt").unwrap().is_dirty());
/// ```
#[derive(Debug, Clone)]
pub struct TransferRequest<K> {
    source: Option<K>,
    target: K,
    params: TransferParams,
    flag: ReentrancyFlag,
}

impl<K> TransferRequest<K> {
    /// Create a request with its own re-entrancy flag.
    #[must_use]
    pub fn new(source: Option<K>, target: K, params: TransferParams) -> Self {
        Self {
            source,
            target,
            params,
            flag: ReentrancyFlag::new(),
        }
    }

    /// Share `flag` with other requests or host callbacks.
    #[must_use]
    pub fn with_flag(mut self, flag: ReentrancyFlag) -> Self {
        self.flag = flag;
        self
    }

    /// The request's re-entrancy flag.
    #[must_use]
    pub const fn flag(&self) -> &ReentrancyFlag {
        &self.flag
    }

    /// The request parameters.
    #[must_use]
    pub const fn params(&self) -> &TransferParams {
        &self.params
    }

    /// Run the transfer against `provider`.
    ///
    /// Every precondition is checked before the target is written. For blend
    /// shape transfers the target's active shape index is restored afterwards.
    ///
    /// # Errors
    ///
    /// - [`TransferError::Reentrant`] while another run holds the flag
    /// - [`TransferError::MissingSource`] / [`TransferError::MissingTarget`]
    /// - [`TransferError::NotAMesh`] for non-mesh objects
    /// - any error from [`AttributeTransfer::new`] or from writing the target
    pub fn run<P>(&self, provider: &mut P) -> TransferResult<TransferOutput>
    where
        P: MeshProvider,
        K: Borrow<P::Object>,
    {
        let _guard = self.flag.raise()?;

        let source_key: &P::Object = self
            .source
            .as_ref()
            .ok_or(TransferError::MissingSource)?
            .borrow();
        let target_key: &P::Object = self.target.borrow();
        check_object(provider, source_key, Role::Source)?;
        check_object(provider, target_key, Role::Target)?;

        info!(
            attribute = ?self.params.attribute,
            method = ?self.params.search_method,
            space = ?self.params.space,
            "Running transfer request"
        );

        // Owned snapshot so source and target may be the same object
        let source = if self.params.use_deformed_source {
            provider.evaluated_surface(source_key)
        } else {
            provider.surface(source_key).cloned()
        }
        .ok_or(TransferError::NotAMesh { role: Role::Source })?;

        let mut engine = if self.params.use_deformed_target {
            let view = provider
                .evaluated_surface(target_key)
                .ok_or(TransferError::NotAMesh { role: Role::Target })?;
            AttributeTransfer::new(&source, &view, &self.params)?
        } else {
            let base = provider
                .surface(target_key)
                .ok_or(TransferError::NotAMesh { role: Role::Target })?;
            AttributeTransfer::new(&source, base, &self.params)?
        };

        let target = provider
            .surface_mut(target_key)
            .ok_or(TransferError::NotAMesh { role: Role::Target })?;
        let mut output = TransferOutput::new(self.params.attribute, target.vertex_count());
        let active_index = target.shape_keys().map(ShapeKeys::active_index);

        let changed = match self.params.attribute {
            AttributeKind::Positions => {
                let mode = &self.params.position_output;
                engine.transfer_positions(target, mode)?;
                if let PositionOutput::ShapeKey { name, .. } = mode {
                    output.written.push(name.clone());
                }
                true
            }
            AttributeKind::WeightMaps => {
                output.written = engine
                    .transfer_weight_maps(target, self.params.weight_map_names.as_deref())?;
                output.wrote_anything()
            }
            AttributeKind::BlendShapes => {
                output.written = engine.transfer_blend_shapes(
                    target,
                    self.params.shape_names.as_deref(),
                    self.params.exclude_muted,
                )?;
                if let Some(index) = active_index {
                    target.set_active_shape_index(index);
                }
                output.wrote_anything()
            }
        };

        if changed {
            target.mark_dirty();
        }

        output.missed_vertices = engine.correspondence().missed_vertices();
        output.degenerate_vertices = engine.correspondence().degenerate_vertices();

        debug!(
            written = output.written.len(),
            missed = output.missed_vertices,
            degenerate = output.degenerate_vertices,
            "Transfer request finished"
        );

        Ok(output)
    }
}

fn check_object<P: MeshProvider>(provider: &P, object: &P::Object, role: Role) -> TransferResult<()> {
    if !provider.contains(object) {
        return Err(match role {
            Role::Source => TransferError::MissingSource,
            Role::Target => TransferError::MissingTarget,
        });
    }
    if !provider.is_mesh(object) {
        return Err(TransferError::NotAMesh { role });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn flag_rejects_second_raise() {
        let flag = ReentrancyFlag::new();
        let guard = flag.raise().unwrap();
        assert!(flag.is_raised());

        let shared = flag.clone();
        assert!(matches!(shared.raise(), Err(TransferError::Reentrant)));

        drop(guard);
        assert!(!flag.is_raised());
        assert!(shared.raise().is_ok());
    }
}
