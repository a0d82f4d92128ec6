//! Nearest-neighbour spatial joins.
//!
//! A join runs one true-kNN refinement per left geometry against an index
//! built over the right side, and yields one record per left shape. The
//! join is a pull-driven stream: consuming one output triggers exactly one
//! refinement pass, and dropping the stream releases everything.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpindexError};
use crate::index::tree::Index;
use crate::provider::{ShapeId, ShapeProvider};

/// Join semantics for left shapes without matches.
///
/// A left shape can only come up empty when the right side is empty;
/// `Inner` drops such records, `Left` keeps them with an empty match list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinHow {
    Inner,
    Left,
}

/// One join output: a left shape and its ordered top-k matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRow {
    pub left_id: ShapeId,
    /// `(right_id, exact_distance)` pairs, nearest first.
    pub matches: Vec<(ShapeId, f64)>,
}

/// Lazy join stream, created by [`st_join`].
///
/// Yields rows in left iteration order. A failed `next()` (a left shape
/// with a degenerate geometry) leaves the stream exhausted.
pub struct StJoin<'a, L: ShapeProvider, R: ShapeProvider> {
    left: &'a L,
    right: &'a Index<R>,
    left_ids: Box<dyn Iterator<Item = ShapeId> + 'a>,
    k: usize,
    how: JoinHow,
    failed: bool,
}

impl<L: ShapeProvider, R: ShapeProvider> Iterator for StJoin<'_, L, R> {
    type Item = Result<JoinRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let left_id = self.left_ids.next()?;
            let Some(geometry) = self.left.get(left_id) else {
                self.failed = true;
                return Some(Err(SpindexError::UnknownShape { id: left_id }));
            };
            match self.right.true_knn(geometry, self.k) {
                Ok(matches) => {
                    if matches.is_empty() && self.how == JoinHow::Inner {
                        continue;
                    }
                    return Some(Ok(JoinRow { left_id, matches }));
                }
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

/// True k-nearest-neighbour join of `left` against an index over the right
/// side.
///
/// For each left shape, in `left.ids()` order, the `k` nearest right
/// shapes by exact distance are computed and yielded as one [`JoinRow`].
///
/// Self-joins are supported by passing the index's own provider as `left`;
/// the identity match is not excluded, so ask for `k + 1` neighbours and
/// drop the self match.
pub fn st_join<'a, L: ShapeProvider, R: ShapeProvider>(
    left: &'a L,
    right: &'a Index<R>,
    k: usize,
    how: JoinHow,
) -> StJoin<'a, L, R> {
    StJoin {
        left,
        right,
        left_ids: left.ids(),
        k,
        how,
        failed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::geometry_distance;
    use crate::index::params::BuildParams;
    use crate::provider::ShapeCollection;
    use geo::{Geometry, Point};
    use rand::rngs::StdRng;
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

    fn brute_force_knn<P: ShapeProvider>(
        provider: &P,
        query: &Geometry<f64>,
        k: usize,
    ) -> Vec<(ShapeId, f64)> {
        let mut all: Vec<(ShapeId, f64)> = provider
            .ids()
            .map(|id| (id, geometry_distance(query, provider.get(id).unwrap())))
            .collect();
        all.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        all.truncate(k);
        all
    }

    #[test]
    fn test_join_matches_brute_force_per_row() {
        let left = random_points(100, 21);
        let right = random_points(1000, 22);
        let index = Index::build(&right, BuildParams::default()).unwrap();

        let rows: Vec<JoinRow> = st_join(&left, &index, 5, JoinHow::Left)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 100);

        for row in &rows {
            let query = left.get(row.left_id).unwrap();
            let expected = brute_force_knn(&right, query, 5);
            assert_eq!(row.matches, expected, "row {}", row.left_id);
        }
    }

    #[test]
    fn test_join_emits_left_order() {
        let left = random_points(20, 5);
        let right = random_points(50, 6);
        let index = Index::build(&right, BuildParams::default()).unwrap();

        let ids: Vec<ShapeId> = st_join(&left, &index, 1, JoinHow::Left)
            .map(|row| row.unwrap().left_id)
            .collect();
        let expected: Vec<ShapeId> = left.ids().collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_inner_join_drops_empty_rows() {
        let left = random_points(4, 1);
        let empty_right = ShapeCollection::default();
        let index = Index::build(&empty_right, BuildParams::default()).unwrap();

        let inner: Vec<_> = st_join(&left, &index, 3, JoinHow::Inner).collect();
        assert!(inner.is_empty());

        let outer: Vec<JoinRow> = st_join(&left, &index, 3, JoinHow::Left)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(outer.len(), 4);
        assert!(outer.iter().all(|row| row.matches.is_empty()));
    }

    #[test]
    fn test_join_is_lazy() {
        let left = random_points(1000, 2);
        let right = random_points(100, 3);
        let index = Index::build(&right, BuildParams::default()).unwrap();

        // Taking two rows must not refine the remaining 998.
        let rows: Vec<_> = st_join(&left, &index, 2, JoinHow::Left)
            .take(2)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_self_join_keeps_identity_match() {
        let shapes = random_points(30, 8);
        let index = Index::build(&shapes, BuildParams::default()).unwrap();

        for row in st_join(index.provider(), &index, 2, JoinHow::Left) {
            let row = row.unwrap();
            // The nearest neighbour of a shape is itself at distance zero;
            // the documented idiom is to ask for k + 1 and drop it.
            assert_eq!(row.matches[0].0, row.left_id);
            assert_eq!(row.matches[0].1, 0.0);
        }
    }

    #[test]
    fn test_failed_row_exhausts_stream() {
        let left = ShapeCollection::from_geometries(vec![
            Geometry::Point(Point::new(f64::NAN, 0.0)),
            Geometry::Point(Point::new(1.0, 1.0)),
        ]);
        let right = random_points(10, 4);
        let index = Index::build(&right, BuildParams::default()).unwrap();

        let mut stream = st_join(&left, &index, 1, JoinHow::Left);
        assert!(matches!(stream.next(), Some(Err(_))));
        assert!(stream.next().is_none(), "stream must stay terminal");
    }
}
