//! DOM Node
//!
//! Nodes live in the [`DomTree`](crate::DomTree) arena and link to each
//! other through [`NodeId`] handles: one optional parent, an ordered list
//! of owned children.

use std::collections::HashMap;
use std::fmt;

use crate::attributes::NamedNodeMap;
use crate::script::ScriptState;
use crate::NodeId;

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (None when detached or for the document node)
    pub(crate) parent: Option<NodeId>,
    /// Children in document order
    pub(crate) children: Vec<NodeId>,
    /// Node-specific data
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    /// Parent node, if attached
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in document order
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Node-specific payload
    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// DOM `nodeType`
    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::Doctype { .. } => NodeType::DocumentType,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::Fragment => NodeType::DocumentFragment,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Whether the node may hold children at all
    pub(crate) fn can_have_children(&self) -> bool {
        matches!(
            self.data,
            NodeData::Document | NodeData::Element(_) | NodeData::Fragment
        )
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// DOCTYPE
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
    /// Document fragment (detached container)
    Fragment,
}

/// DOM `nodeType` codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
}

/// Element and attribute namespaces
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    /// No namespace
    #[default]
    None,
    Html,
    Svg,
    MathMl,
    XLink,
    Xml,
    Xmlns,
    Other(String),
}

impl Namespace {
    pub const HTML_URI: &'static str = "http://www.w3.org/1999/xhtml";
    pub const SVG_URI: &'static str = "http://www.w3.org/2000/svg";
    pub const MATHML_URI: &'static str = "http://www.w3.org/1998/Math/MathML";
    pub const XLINK_URI: &'static str = "http://www.w3.org/1999/xlink";
    pub const XML_URI: &'static str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS_URI: &'static str = "http://www.w3.org/2000/xmlns/";

    /// Map a namespace URI; the empty string means no namespace
    pub fn from_uri(uri: &str) -> Self {
        match uri {
            "" => Self::None,
            Self::HTML_URI => Self::Html,
            Self::SVG_URI => Self::Svg,
            Self::MATHML_URI => Self::MathMl,
            Self::XLINK_URI => Self::XLink,
            Self::XML_URI => Self::Xml,
            Self::XMLNS_URI => Self::Xmlns,
            other => Self::Other(other.to_string()),
        }
    }

    /// Map an optional namespace URI (`null` and `""` both mean none)
    pub fn from_option(uri: Option<&str>) -> Self {
        uri.map_or(Self::None, Self::from_uri)
    }

    /// Namespace URI, `None` for no namespace
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Html => Some(Self::HTML_URI),
            Self::Svg => Some(Self::SVG_URI),
            Self::MathMl => Some(Self::MATHML_URI),
            Self::XLink => Some(Self::XLINK_URI),
            Self::Xml => Some(Self::XML_URI),
            Self::Xmlns => Some(Self::XMLNS_URI),
            Self::Other(uri) => Some(uri),
        }
    }
}

/// Qualified element name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualName {
    pub ns: Namespace,
    pub prefix: Option<String>,
    pub local: String,
}

impl QualName {
    pub fn new(ns: Namespace, prefix: Option<String>, local: impl Into<String>) -> Self {
        Self {
            ns,
            prefix,
            local: local.into(),
        }
    }

    /// HTML-namespace name without prefix
    pub fn html(local: impl Into<String>) -> Self {
        Self::new(Namespace::Html, None, local)
    }

    /// `prefix:local`, or just `local`
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name (qualified)
    pub(crate) name: QualName,
    /// Attributes in insertion order
    pub(crate) attrs: NamedNodeMap,
    /// Expando properties, disjoint from attributes
    pub(crate) properties: HashMap<String, String>,
    /// Execution bookkeeping, present on `<script>` elements only
    pub(crate) script: Option<ScriptState>,
}

impl ElementData {
    pub fn new(name: QualName) -> Self {
        Self {
            name,
            attrs: NamedNodeMap::new(),
            properties: HashMap::new(),
            script: None,
        }
    }

    /// Qualified name
    #[inline]
    pub fn name(&self) -> &QualName {
        &self.name
    }

    /// Attribute map
    #[inline]
    pub fn attrs(&self) -> &NamedNodeMap {
        &self.attrs
    }

    /// Script bookkeeping for `<script>` elements
    #[inline]
    pub fn script_state(&self) -> Option<&ScriptState> {
        self.script.as_ref()
    }

    /// Element is in the HTML namespace
    #[inline]
    pub fn is_html(&self) -> bool {
        self.name.ns == Namespace::Html
    }

    /// HTML element with the given local name
    #[inline]
    pub fn is_html_named(&self, local: &str) -> bool {
        self.is_html() && self.name.local == local
    }

    /// DOM `localName`
    #[inline]
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// DOM `prefix`; always `None` for HTML-namespace elements
    pub fn prefix(&self) -> Option<&str> {
        if self.is_html() {
            None
        } else {
            self.name.prefix.as_deref()
        }
    }

    /// DOM `namespaceURI`
    #[inline]
    pub fn namespace_uri(&self) -> Option<&str> {
        self.name.ns.uri()
    }

    /// Qualified name as authored (`prefix:local`)
    pub fn qualified_name(&self) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}:{}", self.name.local),
            None => self.name.local.clone(),
        }
    }

    /// DOM `tagName`: qualified name, uppercased for HTML elements
    pub fn tag_name(&self) -> String {
        let qualified = self.qualified_name();
        if self.is_html() {
            qualified.to_ascii_uppercase()
        } else {
            qualified
        }
    }

    /// Raw attribute value by qualified name (no case folding)
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get_attribute(name)
    }

    /// Attribute value in no namespace
    pub fn get_attr_local(&self, local: &str) -> Option<&str> {
        self.attrs
            .get_named_item_ns(&Namespace::None, local)
            .map(|a| a.value.as_str())
    }
}
