//! True k-nearest-neighbour refinement.
//!
//! The approximate stream hands out candidates ordered by lower-bound
//! distance; this module promotes them to an exact ranked answer. A
//! bounded best-k buffer keeps the k best exact distances seen so far;
//! as soon as the next candidate's lower bound exceeds the worst confirmed
//! distance, no unseen shape can improve the answer and the loop stops.
//!
//! Soundness rests on the enclosure lower bounds and the non-decreasing
//! yield order of the traversal. Ranking is lexicographic on
//! `(exact_distance, ShapeId)` so ties are deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geo::Geometry;
use tracing::trace;

use crate::algorithms::nearest::ApproxNearest;
use crate::geometry::geometry_distance;
use crate::provider::{ShapeId, ShapeProvider};

/// Best-k buffer entry, ordered worst-first so the buffer is a max-heap on
/// `(distance, id)`.
#[derive(Debug, Clone, Copy)]
struct BestEntry {
    distance: f64,
    id: ShapeId,
}

impl BestEntry {
    fn key(&self) -> (f64, ShapeId) {
        (self.distance, self.id)
    }
}

impl PartialEq for BestEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BestEntry {}

impl PartialOrd for BestEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BestEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Drains candidates from `stream`, computes exact distances, and returns
/// the `k` nearest `(id, distance)` pairs sorted ascending.
///
/// # Arguments
///
/// * `provider` - resolves candidate ids to geometries
/// * `query` - the target geometry
/// * `stream` - candidates in non-decreasing lower-bound order
/// * `k` - number of neighbours requested
/// * `max_candidates` - optional cap on how many candidates are examined
///
/// # Returns
///
/// At most `k` entries sorted by exact distance, ties by ascending id.
pub(crate) fn refine<P: ShapeProvider>(
    provider: &P,
    query: &Geometry<f64>,
    stream: ApproxNearest<'_>,
    k: usize,
    max_candidates: Option<usize>,
) -> Vec<(ShapeId, f64)> {
    if k == 0 {
        return Vec::new();
    }

    let mut best: BinaryHeap<BestEntry> = BinaryHeap::with_capacity(k + 1);
    let mut examined = 0usize;

    for (id, lower_bound) in stream {
        if best.len() == k {
            // Lower bounds only grow from here: the buffer is final.
            let worst = best.peek().expect("buffer is non-empty");
            if lower_bound > worst.distance {
                break;
            }
        }
        if let Some(cap) = max_candidates {
            if examined >= cap {
                break;
            }
        }

        let Some(geometry) = provider.get(id) else {
            continue;
        };
        let distance = geometry_distance(query, geometry);
        examined += 1;

        let candidate = BestEntry { distance, id };
        if best.len() < k {
            best.push(candidate);
        } else {
            let worst = best.peek().expect("buffer is non-empty");
            if candidate.key() < worst.key() {
                best.pop();
                best.push(candidate);
            }
        }
    }

    trace!(k, examined, "refined candidate stream");

    best.into_sorted_vec()
        .into_iter()
        .map(|entry| (entry.id, entry.distance))
        .collect()
}
