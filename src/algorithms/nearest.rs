//! Lazy approximate-nearest traversal over the index.
//!
//! This module implements a best-first branch-and-bound traversal using a
//! priority queue (min-heap) over index nodes and shape entries, ordered
//! by the lower-bound distance of their enclosures to the query.
//!
//! ## Algorithm Overview
//!
//! 1. Push the root with the lower-bound distance of its enclosure
//! 2. Loop:
//!    - Pop the entry with the minimum lower bound
//!    - If it is a shape, yield `(id, lower_bound)`
//!    - If it is a node, push its entries with their own lower bounds
//!
//! The heap invariant makes the yielded lower bounds non-decreasing, every
//! shape is yielded at most once, and a full drain yields every shape in
//! the subtree. The iterator owns all traversal state, so dropping it
//! mid-stream releases everything immediately.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::index::node::{Entry, Node};
use crate::provider::ShapeId;
use crate::rectangle::Rect;

/// Entry in the traversal priority queue.
///
/// Either an index node still to be expanded or a shape ready to be
/// yielded. `seq` is the insertion order, used as the final tie-breaker so
/// the traversal is fully deterministic.
#[derive(Debug)]
enum QueueEntry<'a> {
    Node {
        lower_bound: f64,
        seq: u64,
        node: &'a Node,
    },
    Shape {
        lower_bound: f64,
        seq: u64,
        id: ShapeId,
    },
}

impl QueueEntry<'_> {
    fn lower_bound(&self) -> f64 {
        match self {
            QueueEntry::Node { lower_bound, .. } => *lower_bound,
            QueueEntry::Shape { lower_bound, .. } => *lower_bound,
        }
    }

    /// Nodes sort before shapes at equal lower bound, so a region is
    /// expanded before an equally-distant candidate is yielded.
    fn kind_rank(&self) -> u8 {
        match self {
            QueueEntry::Node { .. } => 0,
            QueueEntry::Shape { .. } => 1,
        }
    }

    fn seq(&self) -> u64 {
        match self {
            QueueEntry::Node { seq, .. } => *seq,
            QueueEntry::Shape { seq, .. } => *seq,
        }
    }
}

impl PartialEq for QueueEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry<'_> {}

impl PartialOrd for QueueEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse every component so the smallest
        // lower bound (then nodes first, then insertion order) pops first.
        other
            .lower_bound()
            .partial_cmp(&self.lower_bound())
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.kind_rank().cmp(&self.kind_rank()))
            .then_with(|| other.seq().cmp(&self.seq()))
    }
}

/// Pull-driven stream of `(ShapeId, lower_bound_distance)` pairs in
/// non-decreasing order of lower bound.
///
/// Created by `Index::approx_nearest`. The lower bound is measured from
/// the stored enclosures to the query's bounding rectangle; it is not the
/// exact distance.
pub struct ApproxNearest<'a> {
    heap: BinaryHeap<QueueEntry<'a>>,
    query_bbox: Rect,
    seq: u64,
}

impl<'a> ApproxNearest<'a> {
    pub(crate) fn new(root: Option<&'a Node>, query_bbox: Rect) -> Self {
        let mut stream = ApproxNearest {
            heap: BinaryHeap::new(),
            query_bbox,
            seq: 0,
        };
        if let Some(node) = root {
            let lower_bound = node.enclosure.min_distance(&stream.query_bbox);
            stream.push_node(lower_bound, node);
        }
        stream
    }

    fn push_node(&mut self, lower_bound: f64, node: &'a Node) {
        self.heap.push(QueueEntry::Node {
            lower_bound,
            seq: self.seq,
            node,
        });
        self.seq += 1;
    }

    fn push_shape(&mut self, lower_bound: f64, id: ShapeId) {
        self.heap.push(QueueEntry::Shape {
            lower_bound,
            seq: self.seq,
            id,
        });
        self.seq += 1;
    }
}

impl Iterator for ApproxNearest<'_> {
    type Item = (ShapeId, f64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.heap.pop()? {
                QueueEntry::Shape {
                    lower_bound, id, ..
                } => return Some((id, lower_bound)),
                QueueEntry::Node { node, .. } => {
                    for entry in &node.entries {
                        let lower_bound =
                            entry.enclosure().min_distance(&self.query_bbox);
                        match entry {
                            Entry::Shape { id, .. } => self.push_shape(lower_bound, *id),
                            Entry::Child { node, .. } => self.push_node(lower_bound, node),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enclosure::Enclosure;
    use crate::index::build::{build_tree, ShapeRecord};
    use crate::index::params::BuildParams;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn build_grid(n: usize, params: &BuildParams) -> Node {
        let records: Vec<ShapeRecord> = (0..n)
            .map(|i| {
                let x = (i % 17) as f64 * 2.5;
                let y = (i / 17) as f64 * 1.5;
                ShapeRecord {
                    id: ShapeId(i as u64),
                    enclosure: Enclosure::from_rect(
                        Rect::from_point(x, y),
                        params.enclosure_kind,
                    ),
                    centroid: [x, y],
                }
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(params.rng_seed);
        build_tree(records, params, &mut rng)
    }

    #[test]
    fn test_empty_stream() {
        let mut stream = ApproxNearest::new(None, Rect::from_point(0.0, 0.0));
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_yields_every_shape_once() {
        let params = BuildParams {
            leaf_capacity: 4,
            max_fanout: 4,
            ..BuildParams::default()
        };
        let root = build_grid(120, &params);
        let stream = ApproxNearest::new(Some(&root), Rect::from_point(10.0, 3.0));

        let mut seen = HashSet::new();
        let mut count = 0;
        for (id, _) in stream {
            assert!(seen.insert(id), "{} yielded twice", id);
            count += 1;
        }
        assert_eq!(count, 120);
    }

    #[test]
    fn test_lower_bounds_are_non_decreasing() {
        let params = BuildParams {
            leaf_capacity: 4,
            max_fanout: 4,
            ..BuildParams::default()
        };
        let root = build_grid(120, &params);

        for &(qx, qy) in &[(0.0, 0.0), (20.0, 5.0), (-3.0, 40.0)] {
            let stream = ApproxNearest::new(Some(&root), Rect::from_point(qx, qy));
            let mut previous = 0.0f64;
            for (_, lb) in stream {
                assert!(
                    lb >= previous,
                    "lower bound went down: {} after {}",
                    lb,
                    previous
                );
                previous = lb;
            }
        }
    }

    #[test]
    fn test_first_candidate_is_the_enclosing_cell() {
        let params = BuildParams::default();
        let root = build_grid(60, &params);
        // Query exactly at shape 0's position: its lower bound is ~0.
        let mut stream = ApproxNearest::new(Some(&root), Rect::from_point(0.0, 0.0));
        let (_, lb) = stream.next().unwrap();
        assert!(lb.abs() < 1e-6);
    }

    #[test]
    fn test_lower_bound_never_exceeds_point_distance() {
        let params = BuildParams {
            leaf_capacity: 4,
            ..BuildParams::default()
        };
        let root = build_grid(120, &params);
        let (qx, qy) = (7.3, 4.1);
        let stream = ApproxNearest::new(Some(&root), Rect::from_point(qx, qy));
        for (id, lb) in stream {
            let i = id.0 as usize;
            let x = (i % 17) as f64 * 2.5;
            let y = (i / 17) as f64 * 1.5;
            let exact = f64::hypot(x - qx, y - qy);
            assert!(
                lb <= exact + 1e-9,
                "lower bound {} above exact distance {} for {}",
                lb,
                exact,
                id
            );
        }
    }
}
