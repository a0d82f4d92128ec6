//! Boundary to the external geometry library.
//!
//! The index treats shapes as opaque: all it ever asks of a geometry is its
//! bounding rectangle and the exact Euclidean distance to another geometry.
//! Both are answered here via the `geo` crate, so the rest of the crate
//! never touches geometry internals.
//!
//! Distances are planar Euclidean. `geo` implements pairwise distances for
//! points, line strings and polygons; every other variant is decomposed
//! into those three (lines become two-point line strings, rects and
//! triangles become polygons, multi-geometries and collections fold the
//! minimum over their parts).

use std::borrow::Cow;

use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::euclidean_distance::EuclideanDistance;
use geo::{Geometry, LineString, Point, Polygon};

use crate::error::{Result, SpindexError};
use crate::rectangle::Rect;

/// Computes the bounding rectangle of a geometry.
///
/// Fails on empty geometries (no bounding box) and on non-finite
/// coordinates, which the index refuses to host.
pub fn bbox_of(geometry: &Geometry<f64>) -> Result<Rect> {
    let rect = geometry
        .bounding_rect()
        .ok_or(SpindexError::EmptyGeometry)?;
    let bbox = Rect {
        min: [rect.min().x, rect.min().y],
        max: [rect.max().x, rect.max().y],
    };
    if !bbox.is_finite() {
        return Err(SpindexError::NonFiniteGeometry);
    }
    Ok(bbox)
}

/// One of the three geometry kinds `geo` can measure pairwise.
enum SimpleGeometry<'a> {
    Point(Point<f64>),
    LineString(Cow<'a, LineString<f64>>),
    Polygon(Cow<'a, Polygon<f64>>),
}

/// Decomposes a geometry into measurable parts.
fn flatten<'a>(geometry: &'a Geometry<f64>, out: &mut Vec<SimpleGeometry<'a>>) {
    match geometry {
        Geometry::Point(p) => out.push(SimpleGeometry::Point(*p)),
        Geometry::Line(l) => out.push(SimpleGeometry::LineString(Cow::Owned(
            LineString::from(vec![l.start, l.end]),
        ))),
        Geometry::LineString(ls) => {
            out.push(SimpleGeometry::LineString(Cow::Borrowed(ls)))
        }
        Geometry::Polygon(poly) => out.push(SimpleGeometry::Polygon(Cow::Borrowed(poly))),
        Geometry::Rect(r) => {
            out.push(SimpleGeometry::Polygon(Cow::Owned(r.to_polygon())))
        }
        Geometry::Triangle(t) => {
            out.push(SimpleGeometry::Polygon(Cow::Owned(t.to_polygon())))
        }
        Geometry::MultiPoint(mp) => {
            for p in mp.iter() {
                out.push(SimpleGeometry::Point(*p));
            }
        }
        Geometry::MultiLineString(mls) => {
            for ls in mls.iter() {
                out.push(SimpleGeometry::LineString(Cow::Borrowed(ls)));
            }
        }
        Geometry::MultiPolygon(mp) => {
            for poly in mp.iter() {
                out.push(SimpleGeometry::Polygon(Cow::Borrowed(poly)));
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                flatten(g, out);
            }
        }
    }
}

fn simple_distance(a: &SimpleGeometry<'_>, b: &SimpleGeometry<'_>) -> f64 {
    use SimpleGeometry::*;
    match (a, b) {
        (Point(p), Point(q)) => p.euclidean_distance(q),
        (Point(p), LineString(ls)) => p.euclidean_distance(ls.as_ref()),
        (Point(p), Polygon(poly)) => p.euclidean_distance(poly.as_ref()),
        (LineString(ls), Point(q)) => ls.as_ref().euclidean_distance(q),
        (LineString(la), LineString(lb)) => la.as_ref().euclidean_distance(lb.as_ref()),
        (LineString(ls), Polygon(poly)) => ls.as_ref().euclidean_distance(poly.as_ref()),
        (Polygon(poly), Point(q)) => poly.as_ref().euclidean_distance(q),
        (Polygon(poly), LineString(ls)) => poly.as_ref().euclidean_distance(ls.as_ref()),
        (Polygon(pa), Polygon(pb)) => pa.as_ref().euclidean_distance(pb.as_ref()),
    }
}

/// Exact shortest Euclidean distance between two geometries.
///
/// Symmetric, non-negative, zero for overlapping geometries (a point
/// inside a polygon is at distance zero). A geometry with no measurable
/// parts is infinitely far from everything.
pub fn geometry_distance(a: &Geometry<f64>, b: &Geometry<f64>) -> f64 {
    let mut left = Vec::new();
    flatten(a, &mut left);
    let mut right = Vec::new();
    flatten(b, &mut right);

    let mut best = f64::INFINITY;
    for pa in &left {
        for pb in &right {
            let d = simple_distance(pa, pb);
            if d == 0.0 {
                return 0.0;
            }
            best = best.min(d);
        }
    }
    best
}
