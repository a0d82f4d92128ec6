use serde::{Deserialize, Serialize};

use crate::enclosure::Enclosure;
use crate::provider::ShapeId;

/// Index node type.
///
/// Distinguishes the two node roles so they cannot be confused: leaves own
/// shape entries, index nodes own child nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeType {
    /// Leaf node: owns a set of shape ids.
    Leaf,
    /// Index node: owns child nodes and navigates towards leaves.
    Index,
}

/// Node entry.
///
/// Each entry carries the enclosure of its content:
/// - `Shape` entries hold a shape id and its enclosure, in leaves only.
/// - `Child` entries hold a subtree and its enclosure, in index nodes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Entry {
    /// A shape owned by a leaf.
    Shape { enclosure: Enclosure, id: ShapeId },

    /// A subtree referenced by an index node.
    Child {
        enclosure: Enclosure,
        node: Box<Node>,
    },
}

impl Entry {
    /// Enclosure of the entry's content.
    pub fn enclosure(&self) -> &Enclosure {
        match self {
            Entry::Shape { enclosure, .. } => enclosure,
            Entry::Child { enclosure, .. } => enclosure,
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Entry::Shape { .. })
    }

    /// Shape id, for `Shape` entries.
    pub fn id(&self) -> Option<ShapeId> {
        match self {
            Entry::Shape { id, .. } => Some(*id),
            Entry::Child { .. } => None,
        }
    }

    /// Child node, for `Child` entries.
    pub fn child(&self) -> Option<&Node> {
        match self {
            Entry::Shape { .. } => None,
            Entry::Child { node, .. } => Some(node),
        }
    }
}

/// A node of the bounding-volume hierarchy.
///
/// The tree is bulk-built and immutable afterwards; nodes are constructed
/// once with their final entries and enclosure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Enclosure containing every shape in this subtree.
    pub enclosure: Enclosure,

    /// Entries; `Shape` entries in leaves, `Child` entries in index nodes.
    pub entries: Vec<Entry>,

    pub node_type: NodeType,

    /// Level in the tree: leaves are 0, the root is highest.
    pub level: usize,
}

impl Node {
    /// Builds a leaf node over shape entries. The node enclosure is the
    /// combination of the entries' enclosures.
    pub fn new_leaf(entries: Vec<Entry>) -> Self {
        assert!(!entries.is_empty(), "Leaf node must own at least one shape");
        debug_assert!(entries.iter().all(Entry::is_shape));
        let enclosure = combine_entries(&entries);
        Node {
            enclosure,
            entries,
            node_type: NodeType::Leaf,
            level: 0,
        }
    }

    /// Builds an index node over child nodes, one level above the deepest
    /// child.
    pub fn new_index(children: Vec<Node>) -> Self {
        assert!(
            !children.is_empty(),
            "Index node must have at least one child"
        );
        let level = children.iter().map(|c| c.level).max().unwrap_or(0) + 1;
        let entries: Vec<Entry> = children
            .into_iter()
            .map(|node| Entry::Child {
                enclosure: node.enclosure,
                node: Box::new(node),
            })
            .collect();
        let enclosure = combine_entries(&entries);
        Node {
            enclosure,
            entries,
            node_type: NodeType::Index,
            level,
        }
    }

    pub fn is_leaf_node(&self) -> bool {
        matches!(self.node_type, NodeType::Leaf)
    }

    pub fn is_index_node(&self) -> bool {
        matches!(self.node_type, NodeType::Index)
    }
}

/// Combined enclosure of a non-empty entry list.
fn combine_entries(entries: &[Entry]) -> Enclosure {
    let mut iter = entries.iter();
    let first = *iter
        .next()
        .expect("combine_entries requires at least one entry")
        .enclosure();
    iter.fold(first, |acc, entry| acc.combine(entry.enclosure()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rectangle::Rect;

    fn shape_entry(id: u64, x0: f64, y0: f64, x1: f64, y1: f64) -> Entry {
        Entry::Shape {
            enclosure: Enclosure::Rect(Rect::new(x0, y0, x1, y1)),
            id: ShapeId(id),
        }
    }

    #[test]
    fn test_leaf_creation() {
        let leaf = Node::new_leaf(vec![
            shape_entry(1, 0.0, 0.0, 5.0, 5.0),
            shape_entry(2, 3.0, 3.0, 8.0, 8.0),
        ]);
        assert!(leaf.is_leaf_node());
        assert!(!leaf.is_index_node());
        assert_eq!(leaf.level, 0);
        assert_eq!(leaf.entries.len(), 2);

        let bbox = leaf.enclosure.bounding_rect();
        assert!(bbox.contains(&Rect::new(0.0, 0.0, 8.0, 8.0)));
    }

    #[test]
    fn test_index_node_levels() {
        let leaf_a = Node::new_leaf(vec![shape_entry(1, 0.0, 0.0, 1.0, 1.0)]);
        let leaf_b = Node::new_leaf(vec![shape_entry(2, 4.0, 4.0, 5.0, 5.0)]);
        let parent = Node::new_index(vec![leaf_a, leaf_b]);

        assert!(parent.is_index_node());
        assert_eq!(parent.level, 1);
        assert_eq!(parent.entries.len(), 2);
        for entry in &parent.entries {
            assert!(!entry.is_shape());
            assert!(parent.enclosure.contains(entry.enclosure()));
        }

        let root = Node::new_index(vec![parent]);
        assert_eq!(root.level, 2);
    }

    #[test]
    fn test_entry_accessors() {
        let shape = shape_entry(42, 0.0, 0.0, 1.0, 1.0);
        assert!(shape.is_shape());
        assert_eq!(shape.id(), Some(ShapeId(42)));
        assert!(shape.child().is_none());

        let leaf = Node::new_leaf(vec![shape_entry(1, 0.0, 0.0, 1.0, 1.0)]);
        let child = Entry::Child {
            enclosure: leaf.enclosure,
            node: Box::new(leaf),
        };
        assert!(!child.is_shape());
        assert_eq!(child.id(), None);
        assert!(child.child().is_some());
    }
}
