//! Bulk index construction: divisive hierarchical clustering via k-means.
//!
//! The tree is built top-down. At each step the shape set is partitioned
//! into up to `max_fanout` clusters of nearby centroids, and each cluster
//! becomes a child subtree. Seeding is a deterministic k-means++ variant
//! driven by a seeded RNG, so two builds with the same parameters produce
//! the same tree.
//!
//! ## Partitioning step
//!
//! 1. Pick `max_fanout` seed centroids: the medoid of a bounded sample
//!    first, then repeatedly the centroid farthest from all chosen seeds.
//! 2. Run at most `kmeans_max_iters` Lloyd rounds: assign each shape to
//!    its nearest seed (ties to the smaller cluster index), move seeds to
//!    their cluster means, stop early once assignments are stable.
//! 3. Balance guard: an empty cluster is re-seeded from the most distant
//!    pair inside the largest cluster. After `max_fanout` failed attempts
//!    the step falls back to a balanced partition in centroid sort order.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::index::sample;
use tracing::trace;

use crate::enclosure::Enclosure;
use crate::index::node::{Entry, Node};
use crate::index::params::BuildParams;
use crate::provider::ShapeId;

/// Per-shape build record, precomputed once from the provider.
#[derive(Debug, Clone)]
pub(crate) struct ShapeRecord {
    pub id: ShapeId,
    pub enclosure: Enclosure,
    pub centroid: [f64; 2],
}

/// Sample bound for the medoid search of the first seed.
const KMEANS_SAMPLE_SIZE: usize = 64;

/// Builds the whole tree over a non-empty record set.
pub(crate) fn build_tree(
    records: Vec<ShapeRecord>,
    params: &BuildParams,
    rng: &mut StdRng,
) -> Node {
    debug_assert!(!records.is_empty());
    build_node(records, params, rng)
}

fn build_node(records: Vec<ShapeRecord>, params: &BuildParams, rng: &mut StdRng) -> Node {
    // A set too small to honour min_fanout becomes an (oversized) leaf;
    // fan-out bounds apply to index nodes only.
    if records.len() <= params.leaf_capacity || records.len() < params.min_fanout {
        let entries = records
            .into_iter()
            .map(|r| Entry::Shape {
                enclosure: r.enclosure,
                id: r.id,
            })
            .collect();
        return Node::new_leaf(entries);
    }

    let clusters = partition(records, params, rng);
    let children = clusters
        .into_iter()
        .map(|cluster| build_node(cluster, params, rng))
        .collect();
    Node::new_index(children)
}

/// Splits `records` into between 2 and `max_fanout` non-empty clusters.
fn partition(
    records: Vec<ShapeRecord>,
    params: &BuildParams,
    rng: &mut StdRng,
) -> Vec<Vec<ShapeRecord>> {
    let b = params.max_fanout.min(records.len());
    let centroids: Vec<[f64; 2]> = records.iter().map(|r| r.centroid).collect();

    let mut seeds = seed_centroids(&centroids, b, rng);
    let mut assignment = assign(&centroids, &seeds);

    // Lloyd rounds with early stop on a stable assignment.
    for _ in 0..params.kmeans_max_iters {
        update_means(&centroids, &assignment, &mut seeds);
        let next = assign(&centroids, &seeds);
        if next == assignment {
            break;
        }
        assignment = next;
    }

    // Balance guard: no cluster may end up empty.
    let mut reseeds = 0;
    loop {
        let sizes = cluster_sizes(&assignment, b);
        let Some(empty_idx) = sizes.iter().position(|&s| s == 0) else {
            break;
        };
        if reseeds >= params.max_fanout {
            trace!(clusters = b, reseeds, "k-means degenerate, balanced fallback");
            return balanced_partition(records, b);
        }
        reseeds += 1;

        let largest_idx = argmax(&sizes);
        let members: Vec<usize> = (0..centroids.len())
            .filter(|&i| assignment[i] == largest_idx)
            .collect();
        if members.len() < 2 {
            // Nothing left to split: every remaining cluster is a singleton.
            return balanced_partition(records, b);
        }
        let (a, c) = farthest_pair(&centroids, &members);
        seeds[largest_idx] = centroids[a];
        seeds[empty_idx] = centroids[c];
        assignment = assign(&centroids, &seeds);
    }

    trace!(shapes = records.len(), clusters = b, reseeds, "partitioned");

    let mut groups: Vec<Vec<ShapeRecord>> = (0..b).map(|_| Vec::new()).collect();
    for (record, cluster) in records.into_iter().zip(assignment) {
        groups[cluster].push(record);
    }
    groups
}

/// Deterministic k-means++-style seeding.
fn seed_centroids(centroids: &[[f64; 2]], b: usize, rng: &mut StdRng) -> Vec<[f64; 2]> {
    // First seed: medoid of a bounded sample.
    let sample_idx: Vec<usize> = if centroids.len() > KMEANS_SAMPLE_SIZE {
        sample(rng, centroids.len(), KMEANS_SAMPLE_SIZE).into_vec()
    } else {
        (0..centroids.len()).collect()
    };
    let mut first = sample_idx[0];
    let mut first_cost = f64::INFINITY;
    for &i in &sample_idx {
        let cost: f64 = sample_idx
            .iter()
            .map(|&j| sq_dist(centroids[i], centroids[j]))
            .sum();
        if cost < first_cost {
            first_cost = cost;
            first = i;
        }
    }

    let mut seeds = vec![centroids[first]];
    // Each further seed maximises the distance to its nearest chosen seed.
    while seeds.len() < b {
        let mut best = 0;
        let mut best_d = -1.0;
        for (i, c) in centroids.iter().enumerate() {
            let d = seeds
                .iter()
                .map(|s| sq_dist(*c, *s))
                .fold(f64::INFINITY, f64::min);
            if d > best_d {
                best_d = d;
                best = i;
            }
        }
        seeds.push(centroids[best]);
    }
    seeds
}

/// Assigns every centroid to its nearest seed; ties go to the smaller
/// cluster index.
fn assign(centroids: &[[f64; 2]], seeds: &[[f64; 2]]) -> Vec<usize> {
    centroids
        .iter()
        .map(|c| {
            let mut best = 0;
            let mut best_d = f64::INFINITY;
            for (k, s) in seeds.iter().enumerate() {
                let d = sq_dist(*c, *s);
                if d < best_d {
                    best_d = d;
                    best = k;
                }
            }
            best
        })
        .collect()
}

/// Moves every seed to the mean of its cluster. Empty clusters keep their
/// previous seed.
fn update_means(centroids: &[[f64; 2]], assignment: &[usize], seeds: &mut [[f64; 2]]) {
    let mut sums = vec![[0.0f64; 2]; seeds.len()];
    let mut counts = vec![0usize; seeds.len()];
    for (c, &k) in centroids.iter().zip(assignment) {
        sums[k][0] += c[0];
        sums[k][1] += c[1];
        counts[k] += 1;
    }
    for (k, seed) in seeds.iter_mut().enumerate() {
        if counts[k] > 0 {
            *seed = [sums[k][0] / counts[k] as f64, sums[k][1] / counts[k] as f64];
        }
    }
}

fn cluster_sizes(assignment: &[usize], b: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; b];
    for &k in assignment {
        sizes[k] += 1;
    }
    sizes
}

/// Index of the first maximum.
fn argmax(values: &[usize]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Exact most distant pair among `members` (indices into `centroids`).
fn farthest_pair(centroids: &[[f64; 2]], members: &[usize]) -> (usize, usize) {
    let mut best = (members[0], members[1]);
    let mut best_d = -1.0;
    for (i, &a) in members.iter().enumerate() {
        for &c in &members[i + 1..] {
            let d = sq_dist(centroids[a], centroids[c]);
            if d > best_d {
                best_d = d;
                best = (a, c);
            }
        }
    }
    best
}

/// Last-resort partition: sort by centroid then id, chunk into `b`
/// near-equal groups.
fn balanced_partition(mut records: Vec<ShapeRecord>, b: usize) -> Vec<Vec<ShapeRecord>> {
    records.sort_by(|a, c| {
        a.centroid[0]
            .partial_cmp(&c.centroid[0])
            .unwrap_or(Ordering::Equal)
            .then(
                a.centroid[1]
                    .partial_cmp(&c.centroid[1])
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.id.cmp(&c.id))
    });

    let n = records.len();
    let q = n / b;
    let r = n % b;
    let mut groups = Vec::with_capacity(b);
    let mut iter = records.into_iter();
    for i in 0..b {
        let take = q + usize::from(i < r);
        groups.push(iter.by_ref().take(take).collect());
    }
    groups
}

fn sq_dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
