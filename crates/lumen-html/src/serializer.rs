//! HTML Serialization (innerHTML/outerHTML)
//!
//! Renders DOM nodes back to canonical HTML text:
//! - attribute values always double-quoted
//! - void elements as a bare start tag
//! - explicit end tags everywhere else
//! - no escaping inside raw text elements

use lumen_dom::{DomTree, ElementData, Namespace, NodeData, NodeId};

use crate::self_closing::VOID_ELEMENTS;

/// Elements whose text children are emitted verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// HTML serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSerializer;

impl HtmlSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_children(tree, node_id, &mut output);
        output
    }

    /// Serialize outerHTML of a node (including the node itself)
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node_id, &mut output);
        output
    }

    /// Serialize a node and its descendants
    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match node.data() {
            NodeData::Document | NodeData::Fragment => {
                self.serialize_children(tree, node_id, output);
            }
            NodeData::Element(elem) => {
                let tag = elem.qualified_name();

                output.push('<');
                output.push_str(&tag);
                for attr in elem.attrs().iter() {
                    output.push(' ');
                    push_attribute_name(&attr.namespace, attr.prefix.as_deref(), &attr.local_name, output);
                    output.push_str("=\"");
                    escape_attribute(&attr.value, output);
                    output.push('"');
                }
                output.push('>');

                if elem.is_html() && VOID_ELEMENTS.contains(&elem.local_name()) {
                    return;
                }

                self.serialize_children(tree, node_id, output);

                output.push_str("</");
                output.push_str(&tag);
                output.push('>');
            }
            NodeData::Text(text) => {
                let raw = node
                    .parent()
                    .and_then(|parent| tree.element(parent))
                    .is_some_and(is_raw_text);
                if raw {
                    output.push_str(text);
                } else {
                    escape_text(text, output);
                }
            }
            NodeData::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
            NodeData::Doctype { name, .. } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
        }
    }

    fn serialize_children(&self, tree: &DomTree, parent_id: NodeId, output: &mut String) {
        for &child_id in tree.children(parent_id) {
            self.serialize_node(tree, child_id, output);
        }
    }
}

fn is_raw_text(elem: &ElementData) -> bool {
    elem.is_html() && RAW_TEXT_ELEMENTS.contains(&elem.local_name())
}

/// Serialized attribute name: well-known namespaces get their fixed prefix
fn push_attribute_name(namespace: &Namespace, prefix: Option<&str>, local: &str, output: &mut String) {
    match namespace {
        Namespace::None => {}
        Namespace::Xml => output.push_str("xml:"),
        Namespace::Xmlns if local != "xmlns" => output.push_str("xmlns:"),
        Namespace::Xmlns => {}
        Namespace::XLink => output.push_str("xlink:"),
        _ => {
            if let Some(prefix) = prefix {
                output.push_str(prefix);
                output.push(':');
            }
        }
    }
    output.push_str(local);
}

/// Escape text content for HTML
fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

/// Utility: Get innerHTML of an element
pub fn get_inner_html(tree: &DomTree, node_id: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(tree, node_id)
}

/// Utility: Get outerHTML of an element
pub fn get_outer_html(tree: &DomTree, node_id: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(tree, node_id)
}
