//! Row-to-tree transformation
//!
//! Builds one row's alias/value mapping into a [`NodeMap`]. The build
//! runs in two strictly ordered passes: values first, attributes second,
//! so the result never depends on where an attribute alias sits relative
//! to its value alias within the row.

use indexmap::map::Entry;

use crate::alias;
use crate::error::AssembleError;
use crate::tree::{FieldValue, Leaf, Node, NodeMap, Row};

/// Build one row into a tree.
///
/// Pass 1 writes every value alias: a sequence value becomes a
/// [`Node::List`] of leaves in element order, a scalar becomes a single
/// [`Node::Leaf`]. Pass 2 binds every attribute alias onto the tag it
/// names, creating an empty-text leaf for a tag that carried no value.
/// Tag order in the result is first-insertion order across both passes.
pub fn transform(row: &Row) -> Result<NodeMap, AssembleError> {
    let mut output = NodeMap::new();

    for (alias, value) in row {
        let resolved = alias::resolve(alias)?;
        if resolved.attr.is_some() {
            continue;
        }

        let node = match value {
            FieldValue::Multi(items) => {
                Node::List(items.iter().map(|item| Node::leaf(item.clone())).collect())
            }
            FieldValue::Single(text) => Node::leaf(text.clone()),
        };
        output.insert(resolved.tag.to_string(), node);
    }

    for (alias, value) in row {
        let resolved = alias::resolve(alias)?;
        let Some(attr) = resolved.attr else {
            continue;
        };

        apply_attribute(&mut output, resolved.tag, attr, value);
    }

    Ok(output)
}

/// Bind one attribute value onto the node under `tag`.
///
/// On a list, a scalar value broadcasts to every sibling and a sequence
/// value applies positionally, leaving siblings past the end of the
/// sequence untouched. On a leaf (or an absent tag) the value is set
/// directly, taking the first element of a sequence.
fn apply_attribute(output: &mut NodeMap, tag: &str, attr: &str, value: &FieldValue) {
    match output.entry(tag.to_string()) {
        Entry::Occupied(mut slot) => match slot.get_mut() {
            Node::List(items) => {
                for (position, item) in items.iter_mut().enumerate() {
                    let attr_value = match value {
                        FieldValue::Multi(values) => match values.get(position) {
                            Some(v) => v.clone(),
                            None => continue,
                        },
                        FieldValue::Single(v) => v.clone(),
                    };
                    if let Node::Leaf(leaf) = item {
                        leaf.attributes.insert(attr.to_string(), attr_value);
                    }
                }
            }
            Node::Leaf(leaf) => {
                if let Some(attr_value) = scalar_value(value) {
                    leaf.attributes.insert(attr.to_string(), attr_value);
                }
            }
            // Attributes attach to leaves; rows never produce a map here
            Node::Map(_) => {}
        },
        Entry::Vacant(slot) => {
            if let Some(attr_value) = scalar_value(value) {
                let mut leaf = Leaf::default();
                leaf.attributes.insert(attr.to_string(), attr_value);
                slot.insert(Node::Leaf(leaf));
            }
        }
    }
}

fn scalar_value(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Single(v) => Some(v.clone()),
        FieldValue::Multi(values) => values.first().cloned(),
    }
}
