//! XML encoding of assembled documents
//!
//! Renders a [`Document`] through the `quick-xml` event writer. The
//! element contract mirrors what the tree model stores: a leaf carries
//! attributes and text on one element, a list emits repeated siblings
//! under the same tag, and a map nests child elements to any depth.
//! Escaping of text and attribute values is handled by the writer.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::AssembleError;
use crate::tree::{Document, Leaf, Node, NodeMap};

/// Encode one document to an XML string.
///
/// `indent` adds two-space indentation for human-facing output; wire
/// output stays compact.
pub fn encode_document(document: &Document, indent: bool) -> Result<String, AssembleError> {
    let mut writer = if indent {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };

    let mut root = BytesStart::new(document.root_tag.as_str());
    for (name, value) in &document.root_attributes {
        root.push_attribute((name.as_str(), value.as_str()));
    }
    writer
        .write_event(Event::Start(root))
        .map_err(to_xml_error)?;

    write_children(&mut writer, &document.content)?;

    writer
        .write_event(Event::End(BytesEnd::new(document.root_tag.as_str())))
        .map_err(to_xml_error)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| AssembleError::Xml(format!("produced invalid UTF-8: {e}")))
}

fn write_children<W: std::io::Write>(
    writer: &mut Writer<W>,
    children: &NodeMap,
) -> Result<(), AssembleError> {
    for (tag, node) in children {
        write_node(writer, tag, node)?;
    }
    Ok(())
}

fn write_node<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    node: &Node,
) -> Result<(), AssembleError> {
    match node {
        Node::Leaf(leaf) => write_leaf(writer, tag, leaf),
        Node::List(items) => {
            for item in items {
                write_node(writer, tag, item)?;
            }
            Ok(())
        }
        Node::Map(children) => {
            writer
                .write_event(Event::Start(BytesStart::new(tag)))
                .map_err(to_xml_error)?;
            write_children(writer, children)?;
            writer
                .write_event(Event::End(BytesEnd::new(tag)))
                .map_err(to_xml_error)?;
            Ok(())
        }
    }
}

fn write_leaf<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    leaf: &Leaf,
) -> Result<(), AssembleError> {
    let mut start = BytesStart::new(tag);
    for (name, value) in &leaf.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if leaf.text.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(to_xml_error)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(to_xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(&leaf.text)))
        .map_err(to_xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(to_xml_error)?;
    Ok(())
}

fn to_xml_error(error: impl std::fmt::Display) -> AssembleError {
    AssembleError::Xml(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeMap;
    use indexmap::IndexMap;

    fn document(content: NodeMap) -> Document {
        Document {
            root_tag: "oai_dc:dc".to_string(),
            root_attributes: [(
                "xmlns:dc".to_string(),
                "http://purl.org/dc/elements/1.1/".to_string(),
            )]
            .into_iter()
            .collect(),
            content,
        }
    }

    #[test]
    fn test_leaf_with_text_and_attributes() {
        let mut content = NodeMap::new();
        content.insert(
            "dc:title".to_string(),
            Node::Leaf(Leaf {
                text: "Hello".to_string(),
                attributes: [("xml:lang".to_string(), "en".to_string())]
                    .into_iter()
                    .collect(),
            }),
        );

        let xml = encode_document(&document(content), false).unwrap();
        assert_eq!(
            xml,
            "<oai_dc:dc xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
             <dc:title xml:lang=\"en\">Hello</dc:title></oai_dc:dc>"
        );
    }

    #[test]
    fn test_list_renders_repeated_siblings() {
        let mut content = NodeMap::new();
        content.insert(
            "dc:subject".to_string(),
            Node::List(vec![Node::leaf("a"), Node::leaf("b")]),
        );

        let xml = encode_document(&document(content), false).unwrap();
        assert!(xml.contains("<dc:subject>a</dc:subject><dc:subject>b</dc:subject>"));
    }

    #[test]
    fn test_empty_leaf_renders_empty_element() {
        let mut content = NodeMap::new();
        content.insert(
            "dc:relation".to_string(),
            Node::Leaf(Leaf {
                text: String::new(),
                attributes: [("href".to_string(), "urn:x".to_string())]
                    .into_iter()
                    .collect(),
            }),
        );

        let xml = encode_document(&document(content), false).unwrap();
        assert!(xml.contains("<dc:relation href=\"urn:x\"/>"));
    }

    #[test]
    fn test_nested_map_renders_container() {
        let mut inner = NodeMap::new();
        inner.insert("title".to_string(), Node::leaf("Hello"));
        let mut content = NodeMap::new();
        content.insert("titleInfo".to_string(), Node::Map(inner));

        let xml = encode_document(&document(content), false).unwrap();
        assert!(xml.contains("<titleInfo><title>Hello</title></titleInfo>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut content = NodeMap::new();
        content.insert(
            "dc:title".to_string(),
            Node::leaf("Bread & <Butter>"),
        );

        let xml = encode_document(&document(content), false).unwrap();
        assert!(xml.contains("Bread &amp; &lt;Butter&gt;"));
    }

    #[test]
    fn test_indented_output() {
        let mut content = NodeMap::new();
        content.insert("dc:title".to_string(), Node::leaf("Hello"));

        let xml = encode_document(&document(content), true).unwrap();
        assert!(xml.contains("\n  <dc:title>"));
    }

    #[test]
    fn test_root_without_attributes() {
        let doc = Document {
            root_tag: "mods".to_string(),
            root_attributes: IndexMap::new(),
            content: NodeMap::new(),
        };

        let xml = encode_document(&doc, false).unwrap();
        assert_eq!(xml, "<mods></mods>");
    }
}
