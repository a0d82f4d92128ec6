use serde::{Deserialize, Serialize};

use crate::enclosure::EnclosureKind;
use crate::error::{Result, SpindexError};

/// Index build configuration.
///
/// All fields have sensible defaults; `validate` is called by
/// `Index::build` before any work happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildParams {
    /// Maximum number of shapes a leaf may own.
    #[serde(default = "default_leaf_capacity")]
    pub leaf_capacity: usize,

    /// Maximum number of children of an index node, and the number of
    /// clusters targeted by each partitioning step.
    #[serde(default = "default_max_fanout")]
    pub max_fanout: usize,

    /// Minimum number of children of a non-root index node.
    #[serde(default = "default_min_fanout")]
    pub min_fanout: usize,

    /// Maximum number of Lloyd re-assignment rounds per partitioning step.
    #[serde(default = "default_kmeans_max_iters")]
    pub kmeans_max_iters: usize,

    /// Enclosure variant used throughout the tree.
    #[serde(default)]
    pub enclosure_kind: EnclosureKind,

    /// Seed for the deterministic k-means++ sampling. Two builds over the
    /// same provider with the same parameters produce the same tree.
    #[serde(default)]
    pub rng_seed: u64,
}

fn default_leaf_capacity() -> usize {
    8
}

fn default_max_fanout() -> usize {
    16
}

fn default_min_fanout() -> usize {
    2
}

fn default_kmeans_max_iters() -> usize {
    8
}

impl Default for BuildParams {
    fn default() -> Self {
        BuildParams {
            leaf_capacity: default_leaf_capacity(),
            max_fanout: default_max_fanout(),
            min_fanout: default_min_fanout(),
            kmeans_max_iters: default_kmeans_max_iters(),
            enclosure_kind: EnclosureKind::default(),
            rng_seed: 0,
        }
    }
}

impl BuildParams {
    /// Checks every parameter against its documented range.
    pub fn validate(&self) -> Result<()> {
        if self.leaf_capacity < 1 {
            return Err(SpindexError::InvalidParameter {
                name: "leaf_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_fanout < 2 {
            return Err(SpindexError::InvalidParameter {
                name: "max_fanout",
                reason: "must be at least 2".to_string(),
            });
        }
        if self.min_fanout < 1 {
            return Err(SpindexError::InvalidParameter {
                name: "min_fanout",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_fanout > self.max_fanout {
            return Err(SpindexError::InvalidParameter {
                name: "min_fanout",
                reason: format!(
                    "must not exceed max_fanout ({} > {})",
                    self.min_fanout, self.max_fanout
                ),
            });
        }
        Ok(())
    }
}
