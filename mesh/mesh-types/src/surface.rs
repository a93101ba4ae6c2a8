//! Polygonal host-side surface with selection, weight maps, shape keys and UVs.

use nalgebra::{Matrix4, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SurfaceError, SurfaceResult};
use crate::shape::{BlendShape, ShapeKeys};
use crate::weights::WeightMap;

/// One UV coordinate per polygon corner, corners in polygon order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UvLayer {
    /// Layer name.
    pub name: String,
    /// Corner UVs, flattened over all polygons.
    pub uvs: Vec<[f64; 2]>,
}

impl UvLayer {
    /// Create a named layer from flattened corner UVs.
    #[must_use]
    pub fn new(name: impl Into<String>, uvs: Vec<[f64; 2]>) -> Self {
        Self {
            name: name.into(),
            uvs,
        }
    }
}

/// A polygonal surface as the host application stores it.
///
/// Vertex positions are in local (object) space; `world_transform` maps them
/// to world space. Polygons have three or more corners. Every per-vertex array
/// (selection, shape positions) has exactly `vertex_count` entries and every
/// weight-map index is below `vertex_count`.
///
/// # Example
///
/// ```
/// use mesh_types::{MeshSurface, Point3, SurfaceAccess};
///
/// let surface = MeshSurface::new(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(1.0, 1.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![vec![0, 1, 2, 3]],
/// )
/// .unwrap();
///
/// assert_eq!(surface.vertex_count(), 4);
/// assert_eq!(surface.corner_count(), 4);
/// assert!(surface.weight_map("missing").is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshSurface {
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) polygons: Vec<Vec<u32>>,
    pub(crate) selection: Vec<bool>,
    pub(crate) weight_maps: Vec<WeightMap>,
    pub(crate) shape_keys: Option<ShapeKeys>,
    pub(crate) uv_layer: Option<UvLayer>,
    pub(crate) world_transform: Matrix4<f64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) dirty: bool,
}

impl MeshSurface {
    /// Create a surface from positions and polygons.
    ///
    /// Nothing is selected, there are no weight maps, shape keys or UVs, and
    /// the world transform is the identity.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::IndexOutOfRange`] if a polygon references a
    /// vertex that does not exist.
    pub fn new(positions: Vec<Point3<f64>>, polygons: Vec<Vec<u32>>) -> SurfaceResult<Self> {
        let vertex_count = positions.len();
        if let Some(&index) = polygons
            .iter()
            .flatten()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(SurfaceError::IndexOutOfRange {
                index: index as usize,
                vertex_count,
            });
        }
        Ok(Self {
            selection: vec![false; vertex_count],
            positions,
            polygons,
            weight_maps: Vec::new(),
            shape_keys: None,
            uv_layer: None,
            world_transform: Matrix4::identity(),
            dirty: false,
        })
    }

    /// Create a surface from triangles.
    ///
    /// # Errors
    ///
    /// Same as [`MeshSurface::new`].
    pub fn from_triangles(
        positions: Vec<Point3<f64>>,
        triangles: &[[u32; 3]],
    ) -> SurfaceResult<Self> {
        Self::new(positions, triangles.iter().map(|t| t.to_vec()).collect())
    }

    /// Set the local-to-world transform.
    #[must_use]
    pub fn with_world_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.world_transform = transform;
        self
    }

    /// Replace the local-to-world transform.
    pub fn set_world_transform(&mut self, transform: Matrix4<f64>) {
        self.world_transform = transform;
    }

    /// Total number of polygon corners.
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.polygons.iter().map(Vec::len).sum()
    }

    /// Replace the whole selection.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::LengthMismatch`] unless `selection` has one
    /// flag per vertex.
    pub fn set_selection(&mut self, selection: Vec<bool>) -> SurfaceResult<()> {
        if selection.len() != self.positions.len() {
            return Err(SurfaceError::length(
                "selection",
                self.positions.len(),
                selection.len(),
            ));
        }
        self.selection = selection;
        Ok(())
    }

    /// Select or deselect a single vertex.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::IndexOutOfRange`] for an unknown vertex.
    pub fn select(&mut self, vertex: usize, selected: bool) -> SurfaceResult<()> {
        let vertex_count = self.positions.len();
        let slot = self
            .selection
            .get_mut(vertex)
            .ok_or(SurfaceError::IndexOutOfRange {
                index: vertex,
                vertex_count,
            })?;
        *slot = selected;
        Ok(())
    }

    /// Add a weight map, replacing any map with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::IndexOutOfRange`] if the map assigns a vertex
    /// that does not exist.
    pub fn add_weight_map(&mut self, map: WeightMap) -> SurfaceResult<()> {
        let vertex_count = self.positions.len();
        if let Some(max) = map.max_vertex() {
            if max as usize >= vertex_count {
                return Err(SurfaceError::IndexOutOfRange {
                    index: max as usize,
                    vertex_count,
                });
            }
        }
        match self.weight_maps.iter_mut().find(|m| m.name == map.name) {
            Some(existing) => *existing = map,
            None => self.weight_maps.push(map),
        }
        Ok(())
    }

    /// Borrow a weight map by name.
    #[must_use]
    pub fn weight_map_ref(&self, name: &str) -> Option<&WeightMap> {
        self.weight_maps.iter().find(|m| m.name == name)
    }

    /// Install a shape-key block.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::LengthMismatch`] if any shape does not have
    /// one position per vertex.
    pub fn set_shape_keys(&mut self, keys: ShapeKeys) -> SurfaceResult<()> {
        let vertex_count = self.positions.len();
        let reference = keys.reference();
        if let Some(bad) = std::iter::once(reference)
            .chain(keys.shapes())
            .find(|s| s.positions.len() != vertex_count)
        {
            return Err(SurfaceError::length(
                format!("shape '{}'", bad.name),
                vertex_count,
                bad.positions.len(),
            ));
        }
        self.shape_keys = Some(keys);
        Ok(())
    }

    /// Install a UV layer.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::LengthMismatch`] unless the layer has one UV
    /// per polygon corner.
    pub fn set_uv_layer(&mut self, layer: UvLayer) -> SurfaceResult<()> {
        let corners = self.corner_count();
        if layer.uvs.len() != corners {
            return Err(SurfaceError::length(
                format!("uv layer '{}'", layer.name),
                corners,
                layer.uvs.len(),
            ));
        }
        self.uv_layer = Some(layer);
        Ok(())
    }

    /// Whether the surface was written since the last [`MeshSurface::clear_dirty`].
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reset the dirty flag.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn check_positions(&self, attribute: &str, positions: &[Point3<f64>]) -> SurfaceResult<()> {
        if positions.len() == self.positions.len() {
            Ok(())
        } else {
            Err(SurfaceError::length(
                attribute,
                self.positions.len(),
                positions.len(),
            ))
        }
    }

    pub(crate) fn write_positions(&mut self, positions: Vec<Point3<f64>>) -> SurfaceResult<()> {
        self.check_positions("positions", &positions)?;
        self.positions = positions;
        Ok(())
    }

    pub(crate) fn write_weight_map(&mut self, name: &str, weights: &[f64]) -> SurfaceResult<()> {
        if weights.len() != self.positions.len() {
            return Err(SurfaceError::length(
                format!("weight map '{name}'"),
                self.positions.len(),
                weights.len(),
            ));
        }
        match self.weight_maps.iter_mut().find(|m| m.name == name) {
            Some(map) => map.assign_dense(weights),
            None => self.weight_maps.push(WeightMap::from_dense(name, weights)),
        }
        Ok(())
    }

    pub(crate) fn write_blend_shape(
        &mut self,
        name: &str,
        positions: Vec<Point3<f64>>,
    ) -> SurfaceResult<&mut BlendShape> {
        self.check_positions(&format!("shape '{name}'"), &positions)?;
        let keys = self
            .shape_keys
            .get_or_insert_with(|| ShapeKeys::with_reference(self.positions.clone()));
        Ok(keys.upsert(name, positions))
    }
}
