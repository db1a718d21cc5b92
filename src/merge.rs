//! Per-entity record consolidation
//!
//! Folds the per-row trees sharing an entity identifier into one tree.
//! The first row seen for an id is the baseline; each later row is
//! reduced to a structural diff against the baseline and the diff is
//! merged in. Containment checks during diff are scoped to the immediate
//! siblings under the same tag, so a value repeated elsewhere in the
//! tree is not mistaken for a duplicate.

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::warn;

use crate::error::Diagnostic;
use crate::tree::{Node, NodeMap};

/// Consolidate rows into one tree per entity id, in arrival order.
///
/// The result depends on row order: the first row for an id fixes the
/// baseline, and later values append after existing ones.
pub fn consolidate(
    rows: Vec<(String, NodeMap)>,
    diagnostics: &mut Vec<Diagnostic>,
) -> IndexMap<String, NodeMap> {
    let mut records: IndexMap<String, NodeMap> = IndexMap::new();

    for (entity_id, tree) in rows {
        match records.entry(entity_id) {
            Entry::Occupied(mut slot) => {
                let delta = diff_map(&tree, slot.get());
                let entity_id = slot.key().clone();
                merge_map(slot.get_mut(), delta, &entity_id, diagnostics);
            }
            Entry::Vacant(slot) => {
                slot.insert(tree);
            }
        }
    }

    records
}

/// Structural diff: what `new` adds over `baseline`.
///
/// A tag absent from the baseline is kept whole. Where both sides nest,
/// the diff recurses and keeps only non-empty remainders. A leaf is kept
/// only if its text is not already among the baseline's siblings under
/// that tag.
pub fn diff_map(new: &NodeMap, baseline: &NodeMap) -> NodeMap {
    let mut difference = NodeMap::new();

    for (tag, node) in new {
        let Some(base) = baseline.get(tag) else {
            difference.insert(tag.clone(), node.clone());
            continue;
        };

        if let Some(kept) = diff_node(node, base) {
            difference.insert(tag.clone(), kept);
        }
    }

    difference
}

fn diff_node(node: &Node, base: &Node) -> Option<Node> {
    match (node, base) {
        (Node::Map(new_children), Node::Map(base_children)) => {
            let inner = diff_map(new_children, base_children);
            (!inner.is_empty()).then_some(Node::Map(inner))
        }
        (Node::List(items), base) => {
            let kept: Vec<Node> = items
                .iter()
                .filter(|item| match item {
                    Node::Leaf(leaf) => !base.contains_text(&leaf.text),
                    _ => true,
                })
                .cloned()
                .collect();
            (!kept.is_empty()).then_some(Node::List(kept))
        }
        (Node::Leaf(leaf), base) => (!base.contains_text(&leaf.text)).then(|| node.clone()),
        // Shape changed from scalar to nested; keep it whole and let
        // merge resolve the conflict.
        (Node::Map(_), _) => Some(node.clone()),
    }
}

/// Merge a diff into the baseline, in place.
///
/// Lists concatenate baseline-then-diff, maps recurse, and a leaf at a
/// key both sides hold is overridden by the diff. Incompatible shapes
/// keep the richer side and record a [`Diagnostic::ShapeConflict`].
pub fn merge_map(
    baseline: &mut NodeMap,
    diff: NodeMap,
    entity_id: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (tag, incoming) in diff {
        let merged = match baseline.get(&tag) {
            Some(existing) => merge_node(existing, incoming, entity_id, &tag, diagnostics),
            None => incoming,
        };
        // Re-inserting an existing key keeps its position in order
        baseline.insert(tag, merged);
    }
}

fn merge_node(
    existing: &Node,
    incoming: Node,
    entity_id: &str,
    tag: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Node {
    match (existing, incoming) {
        (Node::Map(base_children), Node::Map(new_children)) => {
            let mut merged = base_children.clone();
            merge_map(&mut merged, new_children, entity_id, diagnostics);
            Node::Map(merged)
        }
        (Node::List(base_items), Node::List(new_items)) => {
            let mut items = base_items.clone();
            items.extend(new_items);
            Node::List(items)
        }
        (Node::Leaf(_), incoming @ Node::Leaf(_)) => incoming,
        (existing @ Node::Leaf(_), incoming) => {
            // Diff side is nested, baseline is scalar: nested wins.
            record_conflict(entity_id, tag, &incoming, existing, diagnostics);
            incoming
        }
        (existing, incoming) => {
            // Baseline is nested; keep it, drop the incoming side.
            record_conflict(entity_id, tag, existing, &incoming, diagnostics);
            existing.clone()
        }
    }
}

fn record_conflict(
    entity_id: &str,
    tag: &str,
    kept: &Node,
    discarded: &Node,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let diagnostic = Diagnostic::ShapeConflict {
        entity_id: entity_id.to_string(),
        tag: tag.to_string(),
        kept: kept.kind(),
        discarded: discarded.kind(),
    };
    warn!(entity_id, tag, "{diagnostic}");
    diagnostics.push(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform;
    use crate::tree::{FieldValue, Leaf, NodeKind, Row};

    fn row(entries: &[(&str, FieldValue)]) -> Row {
        entries
            .iter()
            .map(|(alias, value)| (alias.to_string(), value.clone()))
            .collect()
    }

    fn tree(entries: &[(&str, FieldValue)]) -> NodeMap {
        transform(&row(entries)).unwrap()
    }

    #[test]
    fn test_single_row_consolidates_to_its_own_tree() {
        let built = tree(&[
            ("title", FieldValue::single("A")),
            ("subject", FieldValue::multi(["x", "y"])),
        ]);

        let mut diagnostics = Vec::new();
        let records = consolidate(vec![("1".to_string(), built.clone())], &mut diagnostics);

        assert_eq!(records.get("1"), Some(&built));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_duplicate_list_value_not_reintroduced() {
        let first = tree(&[("creator", FieldValue::multi(["Alice"]))]);
        let second = tree(&[("creator", FieldValue::multi(["Alice", "Bob"]))]);

        let mut diagnostics = Vec::new();
        let records = consolidate(
            vec![("1".to_string(), first), ("1".to_string(), second)],
            &mut diagnostics,
        );

        assert_eq!(
            records.get("1").unwrap().get("creator"),
            Some(&Node::List(vec![Node::leaf("Alice"), Node::leaf("Bob")]))
        );
    }

    #[test]
    fn test_merge_is_order_sensitive() {
        let a = || tree(&[("subject", FieldValue::multi(["a"]))]);
        let b = || tree(&[("subject", FieldValue::multi(["b"]))]);

        let mut diagnostics = Vec::new();
        let forward = consolidate(
            vec![("1".to_string(), a()), ("1".to_string(), b())],
            &mut diagnostics,
        );
        let reverse = consolidate(
            vec![("1".to_string(), b()), ("1".to_string(), a())],
            &mut diagnostics,
        );

        // Same leaves, opposite order: the baseline's values stay first
        assert_eq!(
            forward.get("1").unwrap().get("subject"),
            Some(&Node::List(vec![Node::leaf("a"), Node::leaf("b")]))
        );
        assert_eq!(
            reverse.get("1").unwrap().get("subject"),
            Some(&Node::List(vec![Node::leaf("b"), Node::leaf("a")]))
        );
    }

    #[test]
    fn test_repeated_scalar_keeps_baseline_attributes() {
        let first = tree(&[
            ("title", FieldValue::single("A")),
            ("title#lang", FieldValue::single("en")),
        ]);
        let second = tree(&[
            ("title", FieldValue::single("A")),
            ("subject", FieldValue::multi(["x"])),
        ]);

        let mut diagnostics = Vec::new();
        let records = consolidate(
            vec![("1".to_string(), first), ("1".to_string(), second)],
            &mut diagnostics,
        );

        let record = records.get("1").unwrap();
        let Some(Node::Leaf(title)) = record.get("title") else {
            panic!("expected leaf");
        };
        assert_eq!(title.text, "A");
        assert_eq!(title.attributes.get("lang"), Some(&"en".to_string()));
        assert_eq!(
            record.get("subject"),
            Some(&Node::List(vec![Node::leaf("x")]))
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_new_scalar_overrides_baseline_leaf() {
        let first = tree(&[("date", FieldValue::single("2001"))]);
        let second = tree(&[("date", FieldValue::single("2002"))]);

        let mut diagnostics = Vec::new();
        let records = consolidate(
            vec![("1".to_string(), first), ("1".to_string(), second)],
            &mut diagnostics,
        );

        assert_eq!(records.get("1").unwrap().get("date"), Some(&Node::leaf("2002")));
    }

    #[test]
    fn test_containment_is_scoped_to_the_same_tag() {
        let first = tree(&[("title", FieldValue::single("x"))]);
        let second = tree(&[("subject", FieldValue::multi(["x"]))]);

        let mut diagnostics = Vec::new();
        let records = consolidate(
            vec![("1".to_string(), first), ("1".to_string(), second)],
            &mut diagnostics,
        );

        // "x" under title must not suppress "x" under subject
        assert_eq!(
            records.get("1").unwrap().get("subject"),
            Some(&Node::List(vec![Node::leaf("x")]))
        );
    }

    #[test]
    fn test_leaf_vs_list_conflict_prefers_richer_shape() {
        let mut baseline = NodeMap::new();
        baseline.insert("note".to_string(), Node::leaf("scalar"));

        let mut diff = NodeMap::new();
        diff.insert(
            "note".to_string(),
            Node::List(vec![Node::leaf("a"), Node::leaf("b")]),
        );

        let mut diagnostics = Vec::new();
        merge_map(&mut baseline, diff, "1", &mut diagnostics);

        assert_eq!(
            baseline.get("note"),
            Some(&Node::List(vec![Node::leaf("a"), Node::leaf("b")]))
        );
        assert_eq!(
            diagnostics,
            vec![Diagnostic::ShapeConflict {
                entity_id: "1".to_string(),
                tag: "note".to_string(),
                kept: NodeKind::List,
                discarded: NodeKind::Leaf,
            }]
        );
    }

    #[test]
    fn test_list_vs_leaf_conflict_keeps_baseline_list() {
        let mut baseline = NodeMap::new();
        baseline.insert(
            "note".to_string(),
            Node::List(vec![Node::leaf("a"), Node::leaf("b")]),
        );

        let mut diff = NodeMap::new();
        diff.insert(
            "note".to_string(),
            Node::Leaf(Leaf {
                text: "c".to_string(),
                attributes: [("type".to_string(), "x".to_string())].into_iter().collect(),
            }),
        );

        let mut diagnostics = Vec::new();
        merge_map(&mut baseline, diff, "1", &mut diagnostics);

        assert_eq!(
            baseline.get("note"),
            Some(&Node::List(vec![Node::leaf("a"), Node::leaf("b")]))
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics[0],
            Diagnostic::ShapeConflict {
                kept: NodeKind::List,
                discarded: NodeKind::Leaf,
                ..
            }
        ));
    }

    #[test]
    fn test_nested_map_merge_recurses() {
        let mut inner_base = NodeMap::new();
        inner_base.insert("namePart".to_string(), Node::leaf("Doe"));
        let mut baseline = NodeMap::new();
        baseline.insert("name".to_string(), Node::Map(inner_base));

        let mut inner_new = NodeMap::new();
        inner_new.insert("namePart".to_string(), Node::leaf("Doe"));
        inner_new.insert("role".to_string(), Node::leaf("author"));
        let mut new = NodeMap::new();
        new.insert("name".to_string(), Node::Map(inner_new));

        let delta = diff_map(&new, &baseline);
        let mut diagnostics = Vec::new();
        merge_map(&mut baseline, delta, "1", &mut diagnostics);

        let Some(Node::Map(name)) = baseline.get("name") else {
            panic!("expected map");
        };
        // The duplicate namePart was excluded by the diff; role was added
        assert_eq!(name.get("namePart"), Some(&Node::leaf("Doe")));
        assert_eq!(name.get("role"), Some(&Node::leaf("author")));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_end_to_end_consolidation() {
        let first = tree(&[
            ("title", FieldValue::single("A")),
            ("title#lang", FieldValue::single("en")),
        ]);
        let second = tree(&[
            ("title", FieldValue::single("A")),
            ("subject", FieldValue::multi(["x"])),
        ]);

        let mut diagnostics = Vec::new();
        let records = consolidate(
            vec![("1".to_string(), first), ("1".to_string(), second)],
            &mut diagnostics,
        );

        let record = records.get("1").unwrap();
        assert_eq!(record.len(), 2);
        let Some(Node::Leaf(title)) = record.get("title") else {
            panic!("expected leaf");
        };
        assert_eq!(
            (title.text.as_str(), title.attributes.get("lang")),
            ("A", Some(&"en".to_string()))
        );
        assert_eq!(
            record.get("subject"),
            Some(&Node::List(vec![Node::leaf("x")]))
        );
    }
}
