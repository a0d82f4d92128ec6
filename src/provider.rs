//! Shape providers: read-only, random-access views over geometry
//! collections.
//!
//! The index never owns raw geometry collections directly; it goes through
//! a [`ShapeProvider`], a thin adaptor that any mapping-like input (a
//! vector, a hash map, a tabular column) can implement. Providers must be
//! effectively immutable for the lifetime of an index built over them.

use std::collections::HashMap;

use derive_more::Display;
use geo::Geometry;
use serde::{Deserialize, Serialize};

/// Stable, opaque identifier of a shape within one provider.
///
/// Ids order results deterministically: ties on exact distance are broken
/// by ascending `ShapeId`.
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[display(fmt = "#{}", _0)]
pub struct ShapeId(pub u64);

/// Uniform read-only view over a collection of geometries.
///
/// `get` is expected O(1); `ids` must yield each id exactly once, in a
/// deterministic order (index builds and join outputs follow it).
pub trait ShapeProvider {
    /// Number of shapes in the collection.
    fn len(&self) -> usize;

    /// Resolves an id to its geometry.
    fn get(&self, id: ShapeId) -> Option<&Geometry<f64>>;

    /// Iterates over all ids.
    fn ids(&self) -> Box<dyn Iterator<Item = ShapeId> + '_>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vector-backed provider: ids are positions in the input order.
#[derive(Debug, Clone, Default)]
pub struct ShapeCollection {
    shapes: Vec<Geometry<f64>>,
}

impl ShapeCollection {
    pub fn from_geometries(shapes: Vec<Geometry<f64>>) -> Self {
        ShapeCollection { shapes }
    }
}

impl ShapeProvider for ShapeCollection {
    fn len(&self) -> usize {
        self.shapes.len()
    }

    fn get(&self, id: ShapeId) -> Option<&Geometry<f64>> {
        self.shapes.get(id.0 as usize)
    }

    fn ids(&self) -> Box<dyn Iterator<Item = ShapeId> + '_> {
        Box::new((0..self.shapes.len() as u64).map(ShapeId))
    }
}

/// Hash-map-backed provider for callers with their own id space.
///
/// Iteration order is ascending by id, so builds over the same map are
/// reproducible.
#[derive(Debug, Clone, Default)]
pub struct MappedShapes {
    shapes: HashMap<ShapeId, Geometry<f64>>,
    order: Vec<ShapeId>,
}

impl MappedShapes {
    pub fn from_map(shapes: HashMap<ShapeId, Geometry<f64>>) -> Self {
        let mut order: Vec<ShapeId> = shapes.keys().copied().collect();
        order.sort_unstable();
        MappedShapes { shapes, order }
    }
}

impl ShapeProvider for MappedShapes {
    fn len(&self) -> usize {
        self.shapes.len()
    }

    fn get(&self, id: ShapeId) -> Option<&Geometry<f64>> {
        self.shapes.get(&id)
    }

    fn ids(&self) -> Box<dyn Iterator<Item = ShapeId> + '_> {
        Box::new(self.order.iter().copied())
    }
}

impl<P: ShapeProvider> ShapeProvider for &P {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, id: ShapeId) -> Option<&Geometry<f64>> {
        (**self).get(id)
    }

    fn ids(&self) -> Box<dyn Iterator<Item = ShapeId> + '_> {
        (**self).ids()
    }
}
