//! Blend shapes (shape keys) and the ordered block that owns them.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Conventional name of the reference shape.
pub const REFERENCE_SHAPE_NAME: &str = "Basis";

/// A named alternate vertex-position array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlendShape {
    /// Shape name, unique within a block.
    pub name: String,
    /// Displaced positions, aligned 1:1 with the surface vertices.
    pub positions: Vec<Point3<f64>>,
    /// Lower bound of the slider.
    pub slider_min: f64,
    /// Upper bound of the slider.
    pub slider_max: f64,
    /// Current blend value.
    pub value: f64,
    /// Muted shapes do not contribute to the evaluated mesh.
    pub muted: bool,
}

impl BlendShape {
    /// Create a shape with default slider range `[0, 1]` and value `0`.
    #[must_use]
    pub fn new(name: impl Into<String>, positions: Vec<Point3<f64>>) -> Self {
        Self {
            name: name.into(),
            positions,
            slider_min: 0.0,
            slider_max: 1.0,
            value: 0.0,
            muted: false,
        }
    }

    /// Set the slider range.
    #[must_use]
    pub const fn with_slider_range(mut self, min: f64, max: f64) -> Self {
        self.slider_min = min;
        self.slider_max = max;
        self
    }

    /// Set the current value.
    #[must_use]
    pub const fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Set the muted flag.
    #[must_use]
    pub const fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }
}

/// Ordered blend shapes of one surface.
///
/// The first shape is the reference pose and is never itself transferred.
/// `active_index` is the host's currently selected shape.
///
/// # Example
///
/// ```
/// use mesh_types::{BlendShape, ShapeKeys, Point3};
///
/// let rest = vec![Point3::origin()];
/// let mut keys = ShapeKeys::with_reference(rest.clone());
/// keys.push(BlendShape::new("smile", vec![Point3::new(0.0, 0.0, 1.0)]));
///
/// assert_eq!(keys.reference().name, "Basis");
/// assert_eq!(keys.names(), vec!["Basis", "smile"]);
/// assert!(keys.get("smile").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeKeys {
    reference: BlendShape,
    shapes: Vec<BlendShape>,
    active_index: usize,
}

impl ShapeKeys {
    /// Create a block holding only the reference shape.
    #[must_use]
    pub fn with_reference(positions: Vec<Point3<f64>>) -> Self {
        Self {
            reference: BlendShape::new(REFERENCE_SHAPE_NAME, positions),
            shapes: Vec::new(),
            active_index: 0,
        }
    }

    /// The reference (rest) shape.
    #[must_use]
    pub const fn reference(&self) -> &BlendShape {
        &self.reference
    }

    /// Mutable access to the reference shape.
    pub fn reference_mut(&mut self) -> &mut BlendShape {
        &mut self.reference
    }

    /// Shapes other than the reference, in order.
    pub fn shapes(&self) -> impl Iterator<Item = &BlendShape> {
        self.shapes.iter()
    }

    /// Number of shapes including the reference.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len() + 1
    }

    /// Always false: a block has at least its reference.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// All names, reference first.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.reference.name.as_str())
            .chain(self.shapes.iter().map(|s| s.name.as_str()))
            .collect()
    }

    /// Look up a shape by name (the reference included).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BlendShape> {
        if self.reference.name == name {
            return Some(&self.reference);
        }
        self.shapes.iter().find(|s| s.name == name)
    }

    /// Mutable lookup by name (the reference included).
    pub fn get_mut(&mut self, name: &str) -> Option<&mut BlendShape> {
        if self.reference.name == name {
            return Some(&mut self.reference);
        }
        self.shapes.iter_mut().find(|s| s.name == name)
    }

    /// Position of the named shape in [`ShapeKeys::names`] order.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if self.reference.name == name {
            return Some(0);
        }
        self.shapes.iter().position(|s| s.name == name).map(|i| i + 1)
    }

    /// Mutable iteration over non-reference shapes.
    pub fn shapes_mut(&mut self) -> impl Iterator<Item = &mut BlendShape> {
        self.shapes.iter_mut()
    }

    /// Append a shape, replacing an existing one of the same name in place.
    pub fn push(&mut self, shape: BlendShape) -> &mut BlendShape {
        let index = match self.shapes.iter().position(|s| s.name == shape.name) {
            Some(i) => {
                self.shapes[i] = shape;
                i
            }
            None => {
                self.shapes.push(shape);
                self.shapes.len() - 1
            }
        };
        &mut self.shapes[index]
    }

    /// Set the positions of the named shape, creating it if absent.
    ///
    /// Slider range, value and mute state of an existing shape are kept.
    pub fn upsert(&mut self, name: &str, positions: Vec<Point3<f64>>) -> &mut BlendShape {
        if self.reference.name == name {
            self.reference.positions = positions;
            return &mut self.reference;
        }
        let index = match self.shapes.iter().position(|s| s.name == name) {
            Some(i) => {
                self.shapes[i].positions = positions;
                i
            }
            None => {
                self.shapes.push(BlendShape::new(name, positions));
                self.shapes.len() - 1
            }
        };
        &mut self.shapes[index]
    }

    /// Index of the active shape (0 is the reference).
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active_index
    }

    /// Change the active shape; out-of-range indices are clamped to the last shape.
    pub fn set_active_index(&mut self, index: usize) {
        self.active_index = index.min(self.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> ShapeKeys {
        let mut keys = ShapeKeys::with_reference(vec![Point3::origin(); 2]);
        keys.push(BlendShape::new("a", vec![Point3::new(1.0, 0.0, 0.0); 2]));
        keys.push(BlendShape::new("b", vec![Point3::new(0.0, 1.0, 0.0); 2]));
        keys
    }

    #[test]
    fn push_replaces_same_name() {
        let mut keys = keys();
        keys.push(BlendShape::new("a", vec![Point3::new(2.0, 0.0, 0.0); 2]).with_value(0.5));
        assert_eq!(keys.len(), 3);
        let a = keys.get("a");
        assert_eq!(a.map(|s| s.value), Some(0.5));
        assert_eq!(keys.names(), vec!["Basis", "a", "b"]);
    }

    #[test]
    fn active_index_is_clamped() {
        let mut keys = keys();
        keys.set_active_index(2);
        assert_eq!(keys.active_index(), 2);
        keys.set_active_index(99);
        assert_eq!(keys.active_index(), 2);
    }

    #[test]
    fn upsert_keeps_slider_state() {
        let mut keys = keys();
        if let Some(a) = keys.get_mut("a") {
            a.slider_max = 2.0;
            a.value = 0.3;
        }
        let a = keys.upsert("a", vec![Point3::new(3.0, 0.0, 0.0); 2]);
        assert!((a.slider_max - 2.0).abs() < f64::EPSILON);
        assert!((a.value - 0.3).abs() < f64::EPSILON);
        assert_eq!(keys.upsert("c", vec![Point3::origin(); 2]).name, "c");
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn reference_is_found_by_name() {
        let keys = keys();
        assert!(keys.get(REFERENCE_SHAPE_NAME).is_some());
        assert_eq!(keys.index_of(REFERENCE_SHAPE_NAME), Some(0));
        assert_eq!(keys.index_of("b"), Some(2));
        assert_eq!(keys.index_of("zz"), None);
        assert_eq!(keys.shapes().count(), 2);
    }
}
