//! Accessor trait over host surfaces.

use nalgebra::{Matrix4, Point3};

use crate::error::SurfaceResult;
use crate::shape::{BlendShape, ShapeKeys};
use crate::surface::{MeshSurface, UvLayer};

/// Read and write access to a host surface.
///
/// This trait is the only way transfer algorithms touch a surface, so any
/// host representation can be plugged in. Lookups of names that do not exist
/// return `None` rather than an error.
pub trait SurfaceAccess {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Local-space vertex positions.
    fn positions(&self) -> &[Point3<f64>];

    /// Polygons as vertex index lists.
    fn polygons(&self) -> &[Vec<u32>];

    /// Per-vertex selection flags.
    fn selection(&self) -> &[bool];

    /// Local-to-world transform.
    fn world_transform(&self) -> &Matrix4<f64>;

    /// Active UV layer, if any.
    fn uv_layer(&self) -> Option<&UvLayer>;

    /// Names of all weight maps with their locked flag, in storage order.
    fn weight_map_names(&self) -> Vec<(String, bool)>;

    /// Dense copy of the named weight map (unassigned vertices read as `0.0`).
    fn weight_map(&self, name: &str) -> Option<Vec<f64>>;

    /// Shape-key block, if the surface has one.
    fn shape_keys(&self) -> Option<&ShapeKeys>;

    /// Mutable shape-key block for slider, value and mute edits.
    fn shape_keys_mut(&mut self) -> Option<&mut ShapeKeys>;

    /// Positions of the reference shape, or the vertex positions when the
    /// surface has no shape keys.
    fn reference_positions(&self) -> &[Point3<f64>] {
        match self.shape_keys() {
            Some(keys) => &keys.reference().positions,
            None => self.positions(),
        }
    }

    /// Overwrite vertex positions.
    ///
    /// # Errors
    ///
    /// Fails if `positions` does not have one entry per vertex.
    fn set_positions(&mut self, positions: Vec<Point3<f64>>) -> SurfaceResult<()>;

    /// Write a dense weight map, creating it if absent.
    ///
    /// # Errors
    ///
    /// Fails if `weights` does not have one entry per vertex.
    fn set_weight_map(&mut self, name: &str, weights: &[f64]) -> SurfaceResult<()>;

    /// Write a blend shape, creating it (and the reference shape) if absent.
    ///
    /// # Errors
    ///
    /// Fails if `positions` does not have one entry per vertex.
    fn set_blend_shape(
        &mut self,
        name: &str,
        positions: Vec<Point3<f64>>,
    ) -> SurfaceResult<&mut BlendShape>;

    /// Change the active shape. No-op without shape keys.
    fn set_active_shape_index(&mut self, index: usize);

    /// Tell the host that the surface data changed.
    fn mark_dirty(&mut self);
}

impl SurfaceAccess for MeshSurface {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    fn polygons(&self) -> &[Vec<u32>] {
        &self.polygons
    }

    fn selection(&self) -> &[bool] {
        &self.selection
    }

    fn world_transform(&self) -> &Matrix4<f64> {
        &self.world_transform
    }

    fn uv_layer(&self) -> Option<&UvLayer> {
        self.uv_layer.as_ref()
    }

    fn weight_map_names(&self) -> Vec<(String, bool)> {
        self.weight_maps
            .iter()
            .map(|m| (m.name.clone(), m.locked))
            .collect()
    }

    fn weight_map(&self, name: &str) -> Option<Vec<f64>> {
        self.weight_map_ref(name)
            .map(|m| m.to_dense(self.positions.len()))
    }

    fn shape_keys(&self) -> Option<&ShapeKeys> {
        self.shape_keys.as_ref()
    }

    fn shape_keys_mut(&mut self) -> Option<&mut ShapeKeys> {
        self.shape_keys.as_mut()
    }

    fn set_positions(&mut self, positions: Vec<Point3<f64>>) -> SurfaceResult<()> {
        self.write_positions(positions)
    }

    fn set_weight_map(&mut self, name: &str, weights: &[f64]) -> SurfaceResult<()> {
        self.write_weight_map(name, weights)
    }

    fn set_blend_shape(
        &mut self,
        name: &str,
        positions: Vec<Point3<f64>>,
    ) -> SurfaceResult<&mut BlendShape> {
        self.write_blend_shape(name, positions)
    }

    fn set_active_shape_index(&mut self, index: usize) {
        if let Some(keys) = self.shape_keys.as_mut() {
            keys.set_active_index(index);
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
