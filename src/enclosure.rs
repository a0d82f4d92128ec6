//! Enclosures: conservative geometric summaries used by the index.
//!
//! Every index node carries an enclosure that contains all shapes below it.
//! Two variants are supported, axis-aligned rectangles and bounding
//! spheres, and both expose the same capability set: `combine` to grow an
//! enclosure over another, and `min_distance` as a sound lower bound on
//! the distance to any enclosed geometry. The variants are interchangeable
//! at the index level; `BuildParams::enclosure_kind` selects one per build.

use serde::{Deserialize, Serialize};

use crate::rectangle::Rect;
use crate::sphere::Sphere;

/// Outward growth applied by [`Enclosure::combine`] so that accumulated
/// floating-point error can never shrink an enclosure below its contents.
const COMBINE_EPSILON: f64 = 1e-9;

/// Which enclosure variant an index is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnclosureKind {
    #[default]
    Rect,
    Sphere,
}

/// A conservative summary of one or more shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Enclosure {
    Rect(Rect),
    Sphere(Sphere),
}

impl Enclosure {
    /// Builds the enclosure of the given kind around a bounding rectangle.
    pub fn from_rect(rect: Rect, kind: EnclosureKind) -> Self {
        match kind {
            EnclosureKind::Rect => Enclosure::Rect(rect),
            EnclosureKind::Sphere => Enclosure::Sphere(Sphere::from_rect(&rect)),
        }
    }

    /// Smallest same-variant enclosure containing both inputs, grown
    /// outward by a small epsilon.
    ///
    /// Mixing variants is not an error: the result falls back to a
    /// rectangle covering both, which stays conservative.
    pub fn combine(&self, other: &Enclosure) -> Enclosure {
        match (self, other) {
            (Enclosure::Rect(a), Enclosure::Rect(b)) => {
                Enclosure::Rect(a.union(b).expand(COMBINE_EPSILON))
            }
            (Enclosure::Sphere(a), Enclosure::Sphere(b)) => {
                Enclosure::Sphere(a.union(b).expand(COMBINE_EPSILON))
            }
            (a, b) => Enclosure::Rect(
                a.bounding_rect()
                    .union(&b.bounding_rect())
                    .expand(COMBINE_EPSILON),
            ),
        }
    }

    /// Lower bound on the distance from anything inside this enclosure to
    /// a geometry summarised by `query_bbox`.
    ///
    /// The query side is measured through its bounding rectangle, which
    /// contains the query geometry, so the bound stays sound.
    pub fn min_distance(&self, query_bbox: &Rect) -> f64 {
        match self {
            Enclosure::Rect(rect) => rect.min_distance(query_bbox),
            Enclosure::Sphere(sphere) => sphere.min_distance(query_bbox),
        }
    }

    /// Upper bound on the distance from anything inside this enclosure to
    /// a geometry summarised by `query_bbox`. Dual of `min_distance`.
    pub fn max_distance(&self, query_bbox: &Rect) -> f64 {
        match self {
            Enclosure::Rect(rect) => rect.max_distance(query_bbox),
            Enclosure::Sphere(sphere) => sphere.max_distance(query_bbox),
        }
    }

    /// Returns true if this enclosure overlaps the query rectangle.
    pub fn intersects_rect(&self, window: &Rect) -> bool {
        match self {
            Enclosure::Rect(rect) => rect.intersects(window),
            Enclosure::Sphere(sphere) => sphere.intersects_rect(window),
        }
    }

    /// Centre point of the enclosure.
    pub fn center(&self) -> [f64; 2] {
        match self {
            Enclosure::Rect(rect) => rect.center(),
            Enclosure::Sphere(sphere) => sphere.center,
        }
    }

    /// The smallest rectangle containing this enclosure.
    pub fn bounding_rect(&self) -> Rect {
        match self {
            Enclosure::Rect(rect) => *rect,
            Enclosure::Sphere(sphere) => sphere.bounding_rect(),
        }
    }

    /// Returns true if `other`'s bounding rectangle lies within this
    /// enclosure's bounding rectangle. Used by structure validation.
    pub fn contains(&self, other: &Enclosure) -> bool {
        self.bounding_rect().contains(&other.bounding_rect())
    }
}
