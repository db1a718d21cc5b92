//! Row and document tree data model
//!
//! Rows are flat query results: an entity identifier plus an ordered
//! mapping from alias to field value. The transform turns each row into
//! a tree of [`Node`]s, and consolidation folds the trees sharing an
//! entity id into one. All maps are insertion-ordered so element order
//! in the encoded record follows first appearance in the source rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single field value from a query row: one string, or an ordered
/// sequence of strings for a multi-valued relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    pub fn single(value: impl Into<String>) -> Self {
        FieldValue::Single(value.into())
    }

    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::Multi(values.into_iter().map(Into::into).collect())
    }
}

/// Ordered mapping from raw field id to value, before field mapping.
pub type RawRow = IndexMap<String, FieldValue>;

/// Ordered mapping from alias to value, after field mapping.
pub type Row = IndexMap<String, FieldValue>;

/// One flat query result row with the entity it describes.
///
/// Several rows may share an `id` when the entity has multi-valued
/// relations; consolidation folds them back together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRow {
    pub id: String,
    pub fields: RawRow,
}

/// Text content of an element together with its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Leaf {
    pub text: String,
    pub attributes: IndexMap<String, String>,
}

impl Leaf {
    /// Leaf with text and no attributes.
    pub fn text(text: impl Into<String>) -> Self {
        Leaf {
            text: text.into(),
            attributes: IndexMap::new(),
        }
    }
}

/// Ordered mapping from child tag to node.
pub type NodeMap = IndexMap<String, Node>;

/// One element of the output tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Element text with attributes.
    Leaf(Leaf),
    /// Repeated sibling elements under the same tag, in order.
    List(Vec<Node>),
    /// Nested child elements, ordered by first insertion.
    Map(NodeMap),
}

impl Node {
    pub fn leaf(text: impl Into<String>) -> Self {
        Node::Leaf(Leaf::text(text))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf(_) => NodeKind::Leaf,
            Node::List(_) => NodeKind::List,
            Node::Map(_) => NodeKind::Map,
        }
    }

    /// Whether this node already carries `text` as a leaf, either
    /// directly or as one of its list siblings. Scoped to this node
    /// only, never a deep scan.
    pub fn contains_text(&self, text: &str) -> bool {
        match self {
            Node::Leaf(leaf) => leaf.text == text,
            Node::List(items) => items.iter().any(|item| match item {
                Node::Leaf(leaf) => leaf.text == text,
                _ => false,
            }),
            Node::Map(_) => false,
        }
    }
}

/// Shape of a node, used in shape-conflict diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    List,
    Map,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Leaf => "leaf",
            NodeKind::List => "list",
            NodeKind::Map => "map",
        };
        f.write_str(name)
    }
}

/// A fully assembled per-entity record, ready for encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root element tag from the active metadata format.
    pub root_tag: String,
    /// Root element attributes (namespace declarations, schemaLocation).
    pub root_attributes: IndexMap<String, String>,
    /// Consolidated content tree.
    pub content: NodeMap,
}
