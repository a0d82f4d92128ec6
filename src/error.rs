//! Error types for index building and querying.

use thiserror::Error;

use crate::provider::ShapeId;

/// Errors surfaced by `spindex` operations.
///
/// Building is all-or-nothing: a single shape with a degenerate bounding box
/// fails the whole build rather than producing an index that silently skips
/// shapes. Query streams return an error from `next()` and then stay
/// exhausted.
#[derive(Debug, Error)]
pub enum SpindexError {
    /// A build or query parameter is outside its documented range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    /// The geometry has no bounding box (empty geometry).
    #[error("cannot compute bounding box for empty geometry")]
    EmptyGeometry,

    /// The geometry's bounding box contains NaN or infinite coordinates.
    /// The index cannot host non-finite enclosures.
    #[error("geometry bounding box has non-finite coordinates")]
    NonFiniteGeometry,

    /// A provider returned an id from `ids()` that `get()` does not resolve.
    #[error("shape provider does not resolve id {id}")]
    UnknownShape { id: ShapeId },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, SpindexError>;
