//! The bounding-volume-hierarchy index and its query surface.

use geo::Geometry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::algorithms::knn::refine;
use crate::algorithms::nearest::ApproxNearest;
use crate::enclosure::Enclosure;
use crate::error::{Result, SpindexError};
use crate::geometry::bbox_of;
use crate::index::build::{build_tree, ShapeRecord};
use crate::index::node::{Entry, Node, NodeType};
use crate::index::params::BuildParams;
use crate::provider::{ShapeId, ShapeProvider};
use crate::rectangle::Rect;

/// Structural counters of a built index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub shapes: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
}

/// Immutable spatial index over a shape provider.
///
/// Built once with [`Index::build`]; afterwards the tree never changes, so
/// shared references can be queried from independent threads, each holding
/// its own query state.
#[derive(Debug)]
pub struct Index<P: ShapeProvider> {
    provider: P,
    root: Option<Box<Node>>,
    params: BuildParams,
    shape_count: usize,
}

impl<P: ShapeProvider> Index<P> {
    /// Bulk-builds an index over every shape of `provider`.
    ///
    /// An empty provider yields an empty index, not an error. A shape with
    /// an empty or non-finite bounding box fails the build.
    pub fn build(provider: P, params: BuildParams) -> Result<Self> {
        params.validate()?;

        let mut records = Vec::with_capacity(provider.len());
        for id in provider.ids() {
            let geometry = provider
                .get(id)
                .ok_or(SpindexError::UnknownShape { id })?;
            let bbox = bbox_of(geometry)?;
            records.push(ShapeRecord {
                id,
                enclosure: Enclosure::from_rect(bbox, params.enclosure_kind),
                centroid: bbox.center(),
            });
        }

        let shape_count = records.len();
        let root = if records.is_empty() {
            None
        } else {
            let mut rng = StdRng::seed_from_u64(params.rng_seed);
            Some(Box::new(build_tree(records, &params, &mut rng)))
        };

        let index = Index {
            provider,
            root,
            params,
            shape_count,
        };
        let stats = index.stats();
        debug!(
            shapes = stats.shapes,
            nodes = stats.nodes,
            leaves = stats.leaves,
            depth = stats.depth,
            "index built"
        );
        Ok(index)
    }

    /// Number of indexed shapes.
    pub fn len(&self) -> usize {
        self.shape_count
    }

    pub fn is_empty(&self) -> bool {
        self.shape_count == 0
    }

    /// Tree depth: 0 for an empty index, 1 for a single leaf root.
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |node| node.level + 1)
    }

    /// Build parameters the index was created with.
    pub fn params(&self) -> &BuildParams {
        &self.params
    }

    /// The underlying shape provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Opens a lazy stream of `(ShapeId, lower_bound_distance)` candidates
    /// in non-decreasing lower-bound order.
    pub fn approx_nearest(&self, query: &Geometry<f64>) -> Result<ApproxNearest<'_>> {
        let query_bbox = bbox_of(query)?;
        Ok(ApproxNearest::new(self.root.as_deref(), query_bbox))
    }

    /// Exact k-nearest neighbours of `query`, sorted by exact distance
    /// ascending, ties by ascending id.
    pub fn true_knn(&self, query: &Geometry<f64>, k: usize) -> Result<Vec<(ShapeId, f64)>> {
        self.true_knn_capped(query, k, None)
    }

    /// [`Index::true_knn`] with a cap on how many candidates are examined.
    /// With a cap the answer may be incomplete; without one it is exact.
    pub fn true_knn_capped(
        &self,
        query: &Geometry<f64>,
        k: usize,
        max_candidates: Option<usize>,
    ) -> Result<Vec<(ShapeId, f64)>> {
        let stream = self.approx_nearest(query)?;
        Ok(refine(&self.provider, query, stream, k, max_candidates))
    }

    /// Rank-ordered lazy variant of [`Index::true_knn`].
    ///
    /// Refinement cannot confirm its first answer before the termination
    /// bound fires, so the iterator buffers the full top-k internally and
    /// then yields one entry per pull.
    pub fn true_knn_lazy(
        &self,
        query: &Geometry<f64>,
        k: usize,
    ) -> Result<impl Iterator<Item = (ShapeId, f64)> + '_> {
        let result = self.true_knn(query, k)?;
        Ok(result.into_iter())
    }

    /// Ids whose enclosures intersect the query window. This is the
    /// enclosure-level candidate filter: actual geometries may still miss
    /// the window.
    pub fn approx_intersects(&self, window: &Rect) -> Vec<ShapeId> {
        let mut out = Vec::new();
        if let Some(root) = self.root.as_deref() {
            collect_intersecting(root, window, &mut out);
        }
        out
    }

    /// Walks the tree and counts its structure.
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            shapes: self.shape_count,
            nodes: 0,
            leaves: 0,
            depth: self.depth(),
        };
        if let Some(root) = self.root.as_deref() {
            count_nodes(root, &mut stats);
        }
        stats
    }

    /// Checks the structural invariants: every entry enclosure inside its
    /// node enclosure (recursively), and the leaves partitioning the
    /// provider's id set. Returns human-readable violations; an empty
    /// vector means the structure is sound.
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut seen: Vec<ShapeId> = Vec::with_capacity(self.shape_count);
        if let Some(root) = self.root.as_deref() {
            validate_node(root, &mut violations, &mut seen);
        }

        seen.sort_unstable();
        if seen.windows(2).any(|w| w[0] == w[1]) {
            violations.push("a shape id appears in more than one leaf".to_string());
        }
        let mut expected: Vec<ShapeId> = self.provider.ids().collect();
        expected.sort_unstable();
        if seen != expected {
            violations.push(format!(
                "leaves hold {} ids, provider has {}",
                seen.len(),
                expected.len()
            ));
        }
        violations
    }

    /// Exports the node hierarchy as pretty-printed JSON for inspection.
    pub fn export_to_json(&self) -> std::result::Result<String, serde_json::Error> {
        let visualization = TreeVisualization {
            root: self.root.as_deref().map(visualize_node),
            params: self.params.clone(),
        };
        serde_json::to_string_pretty(&visualization)
    }
}

fn collect_intersecting(node: &Node, window: &Rect, out: &mut Vec<ShapeId>) {
    if !node.enclosure.intersects_rect(window) {
        return;
    }
    for entry in &node.entries {
        match entry {
            Entry::Shape { enclosure, id } => {
                if enclosure.intersects_rect(window) {
                    out.push(*id);
                }
            }
            Entry::Child { node, .. } => collect_intersecting(node, window, out),
        }
    }
}

fn count_nodes(node: &Node, stats: &mut IndexStats) {
    stats.nodes += 1;
    if node.is_leaf_node() {
        stats.leaves += 1;
    }
    for entry in &node.entries {
        if let Some(child) = entry.child() {
            count_nodes(child, stats);
        }
    }
}

fn validate_node(node: &Node, violations: &mut Vec<String>, seen: &mut Vec<ShapeId>) {
    for entry in &node.entries {
        if !node.enclosure.contains(entry.enclosure()) {
            violations.push(format!(
                "entry enclosure escapes its level-{} node",
                node.level
            ));
        }
        match entry {
            Entry::Shape { id, .. } => {
                if !node.is_leaf_node() {
                    violations.push("shape entry in an index node".to_string());
                }
                seen.push(*id);
            }
            Entry::Child { node: child, .. } => {
                if node.is_leaf_node() {
                    violations.push("child entry in a leaf node".to_string());
                }
                validate_node(child, violations, seen);
            }
        }
    }
    if node.entries.is_empty() {
        violations.push(format!("empty node at level {}", node.level));
    }
}

/// JSON rendering of the tree, for debugging and front-end visualisation.
#[derive(Debug, Serialize, Deserialize)]
struct TreeVisualization {
    root: Option<NodeVisualization>,
    params: BuildParams,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeVisualization {
    enclosure: Enclosure,
    node_type: NodeType,
    level: usize,
    shapes: Vec<ShapeId>,
    children: Vec<NodeVisualization>,
}

fn visualize_node(node: &Node) -> NodeVisualization {
    let mut shapes = Vec::new();
    let mut children = Vec::new();
    for entry in &node.entries {
        match entry {
            Entry::Shape { id, .. } => shapes.push(*id),
            Entry::Child { node, .. } => children.push(visualize_node(node)),
        }
    }
    NodeVisualization {
        enclosure: node.enclosure,
        node_type: node.node_type.clone(),
        level: node.level,
        shapes,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enclosure::EnclosureKind;
    use crate::provider::ShapeCollection;
    use geo::Point;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, seed: u64) -> ShapeCollection {
        let mut rng = StdRng::seed_from_u64(seed);
        ShapeCollection::from_geometries(
            (0..n)
                .map(|_| {
                    Geometry::Point(Point::new(
                        rng.gen_range(0.0..100.0),
                        rng.gen_range(0.0..100.0),
                    ))
                })
                .collect(),
        )
    }

    #[test]
    fn test_build_empty_provider() {
        let index =
            Index::build(ShapeCollection::default(), BuildParams::default()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.depth(), 0);
        assert!(index.validate().is_empty());
        let stats = index.stats();
        assert_eq!(stats.nodes, 0);
        assert_eq!(stats.leaves, 0);
    }

    #[test]
    fn test_build_rejects_invalid_params() {
        let params = BuildParams {
            max_fanout: 1,
            ..BuildParams::default()
        };
        let result = Index::build(random_points(10, 0), params);
        assert!(matches!(
            result,
            Err(SpindexError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_build_rejects_non_finite_shapes() {
        let provider = ShapeCollection::from_geometries(vec![
            Geometry::Point(Point::new(0.0, 0.0)),
            Geometry::Point(Point::new(f64::NAN, 1.0)),
        ]);
        let result = Index::build(provider, BuildParams::default());
        assert!(matches!(result, Err(SpindexError::NonFiniteGeometry)));
    }

    #[test]
    fn test_structure_is_valid_after_build() {
        for kind in [EnclosureKind::Rect, EnclosureKind::Sphere] {
            let params = BuildParams {
                leaf_capacity: 4,
                max_fanout: 4,
                enclosure_kind: kind,
                ..BuildParams::default()
            };
            let index = Index::build(random_points(500, 42), params).unwrap();
            let violations = index.validate();
            assert!(violations.is_empty(), "violations: {:?}", violations);

            let stats = index.stats();
            assert_eq!(stats.shapes, 500);
            assert!(stats.leaves >= 1);
            assert!(stats.depth >= 2);
        }
    }

    #[test]
    fn test_depth_stays_logarithmic() {
        let params = BuildParams {
            leaf_capacity: 8,
            max_fanout: 16,
            min_fanout: 2,
            ..BuildParams::default()
        };
        let index = Index::build(random_points(2000, 9), params).unwrap();
        // With fan-out at least 2 the depth is bounded by log2(n) plus the
        // leaf level and slack for uneven splits.
        assert!(index.depth() <= 16, "depth {} too deep", index.depth());
    }

    #[test]
    fn test_deterministic_build() {
        let params = BuildParams {
            leaf_capacity: 4,
            rng_seed: 5,
            ..BuildParams::default()
        };
        let a = Index::build(random_points(400, 1), params.clone()).unwrap();
        let b = Index::build(random_points(400, 1), params).unwrap();
        assert_eq!(a.export_to_json().unwrap(), b.export_to_json().unwrap());
    }

    #[test]
    fn test_query_with_nan_geometry_fails() {
        let index = Index::build(random_points(10, 0), BuildParams::default()).unwrap();
        let query = Geometry::Point(Point::new(f64::NAN, 0.0));
        assert!(index.approx_nearest(&query).is_err());
        assert!(index.true_knn(&query, 3).is_err());
    }

    #[test]
    fn test_true_knn_lazy_matches_eager() {
        let index = Index::build(random_points(200, 2), BuildParams::default()).unwrap();
        let query = Geometry::Point(Point::new(50.0, 50.0));
        let eager = index.true_knn(&query, 6).unwrap();
        let lazy: Vec<_> = index.true_knn_lazy(&query, 6).unwrap().collect();
        assert_eq!(eager, lazy);
    }

    #[test]
    fn test_approx_intersects_finds_enclosure_overlaps() {
        let provider = ShapeCollection::from_geometries(vec![
            Geometry::Point(Point::new(1.0, 1.0)),
            Geometry::Point(Point::new(50.0, 50.0)),
            Geometry::Point(Point::new(2.0, 2.0)),
        ]);
        let index = Index::build(provider, BuildParams::default()).unwrap();

        let mut hits = index.approx_intersects(&Rect::new(0.0, 0.0, 3.0, 3.0));
        hits.sort_unstable();
        assert_eq!(hits, vec![ShapeId(0), ShapeId(2)]);

        let empty = index.approx_intersects(&Rect::new(100.0, 100.0, 110.0, 110.0));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_export_to_json_mentions_structure() {
        let index = Index::build(random_points(50, 3), BuildParams::default()).unwrap();
        let json = index.export_to_json().unwrap();
        assert!(json.contains("\"node_type\""));
        assert!(json.contains("\"leaf_capacity\": 8"));
    }
}
