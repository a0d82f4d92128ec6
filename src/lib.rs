//! # spindex — true k-nearest-neighbour spatial queries and joins
//!
//! An in-memory spatial index over heterogeneous 2D geometries (points,
//! lines, polygons, multi-geometries) answering *true* kNN queries: results
//! are ranked by the exact shortest Euclidean distance between geometries,
//! not by centroid or bounding-box distance.
//!
//! ## Main features
//!
//! - Bulk-built bounding-volume hierarchy using divisive k-means
//!   partitioning, immutable after build
//! - Interchangeable rectangle and sphere enclosures
//! - Lazy best-first candidate streams with sound lower bounds
//! - Exact kNN refinement with deterministic tie-breaking
//! - Lazy nearest-neighbour joins between two shape collections
//!
//! ## Usage
//!
//! ### Point queries
//! ```rust
//! use geo::{Geometry, Point};
//! use spindex::{BuildParams, Index, ShapeCollection, ShapeId};
//!
//! let shapes = ShapeCollection::from_geometries(vec![
//!     Geometry::Point(Point::new(0.0, 0.0)),
//!     Geometry::Point(Point::new(1.0, 0.0)),
//!     Geometry::Point(Point::new(5.0, 5.0)),
//! ]);
//! let index = Index::build(shapes, BuildParams::default()).unwrap();
//!
//! let query = Geometry::Point(Point::new(0.9, 0.0));
//! let nearest = index.true_knn(&query, 2).unwrap();
//! assert_eq!(nearest[0].0, ShapeId(1));
//! assert_eq!(nearest[1].0, ShapeId(0));
//! ```
//!
//! ### Joins
//! ```rust
//! use geo::{Geometry, Point};
//! use spindex::{st_join, BuildParams, Index, JoinHow, ShapeCollection};
//!
//! let left = ShapeCollection::from_geometries(vec![
//!     Geometry::Point(Point::new(0.0, 0.0)),
//! ]);
//! let right = ShapeCollection::from_geometries(vec![
//!     Geometry::Point(Point::new(2.0, 0.0)),
//!     Geometry::Point(Point::new(9.0, 9.0)),
//! ]);
//! let index = Index::build(right, BuildParams::default()).unwrap();
//!
//! for row in st_join(&left, &index, 1, JoinHow::Left) {
//!     let row = row.unwrap();
//!     assert_eq!(row.matches[0].1, 2.0);
//! }
//! ```
//!
//! The index is immutable once built, so a shared reference can serve
//! queries from many threads; all query state lives in the streams each
//! caller owns.

pub mod algorithms;
pub mod enclosure;
pub mod error;
pub mod geometry;
pub mod index;
pub mod provider;
pub mod rectangle;
pub mod sphere;

pub use algorithms::{st_join, ApproxNearest, JoinHow, JoinRow, StJoin};
pub use enclosure::{Enclosure, EnclosureKind};
pub use error::{Result, SpindexError};
pub use geometry::{bbox_of, geometry_distance};
pub use index::{BuildParams, Index, IndexStats};
pub use provider::{MappedShapes, ShapeCollection, ShapeId, ShapeProvider};
pub use rectangle::Rect;
pub use sphere::Sphere;
