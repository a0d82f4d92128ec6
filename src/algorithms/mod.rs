// Query algorithms over a built index, split by concern:
// - nearest: lazy best-first traversal yielding lower-bound candidates
// - knn: exact refinement of the candidate stream
// - join: per-left-shape kNN join driver

pub mod join;
pub mod knn;
pub mod nearest;

pub use join::{st_join, JoinHow, JoinRow, StJoin};
pub use nearest::ApproxNearest;
