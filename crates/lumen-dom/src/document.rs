//! Document - High-level document API
//!
//! The document owns the tree and every piece of state hanging off it:
//! quirks mode, browser profile, the id index, the live collection cache
//! and the script scheduler.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::attributes::Attr;
use crate::collection::{CollectionFilter, HtmlCollection, NodeList};
use crate::id_index::IdIndex;
use crate::node::{ElementData, Namespace, NodeData, QualName};
use crate::operations::{DomError, DomResult, NodeOperations};
use crate::profile::BrowserProfile;
use crate::query_cache::{CollectionKey, QueryCache};
use crate::script::{ScriptOrigin, ScriptScheduler, ScriptState};
use crate::selector::SelectorList;
use crate::tree::DomTree;
use crate::NodeId;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Document compatibility mode, chosen from the doctype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    #[default]
    NoQuirks,
}

/// Result of `document.all[name]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllNamedItem {
    Element(NodeId),
    /// Several elements share the id/name
    Collection(HtmlCollection),
}

/// HTML Document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    url: String,
    mode: QuirksMode,
    profile: BrowserProfile,
    pub(crate) ids: IdIndex,
    cache: RefCell<QueryCache>,
    /// Bumped on every structural or attribute mutation
    generation: u64,
    instance: u64,
    pub(crate) scripts: ScriptScheduler,
}

impl Document {
    /// Create a document with an `html`/`head`/`body` skeleton
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty(url);
        let html = doc.tree.create_element(QualName::html("html"));
        let head = doc.tree.create_element(QualName::html("head"));
        let body = doc.tree.create_element(QualName::html("body"));
        doc.tree.append(NodeId::ROOT, html);
        doc.tree.append(html, head);
        doc.tree.append(html, body);
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            mode: QuirksMode::NoQuirks,
            profile: BrowserProfile::default(),
            ids: IdIndex::default(),
            cache: RefCell::new(QueryCache::default()),
            generation: 0,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            scripts: ScriptScheduler::default(),
        }
    }

    /// Replace the browser profile
    pub fn with_profile(mut self, profile: BrowserProfile) -> Self {
        self.set_profile(profile);
        self
    }

    pub fn set_profile(&mut self, profile: BrowserProfile) {
        tracing::debug!("document profile set to {}", profile.name);
        self.profile = profile;
        self.touch();
    }

    pub fn profile(&self) -> &BrowserProfile {
        &self.profile
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.mode
    }

    /// Set the compatibility mode; collections re-evaluate under the new mode
    pub fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.mode = mode;
        self.touch();
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Mutation counter; changes whenever the tree or an attribute does
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn instance_id(&self) -> u64 {
        self.instance
    }

    pub(crate) fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Access the DOM tree (read-only; mutate through the document)
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Node handle check
    pub(crate) fn check(&self, id: NodeId) -> DomResult<()> {
        if self.tree.get(id).is_some() {
            Ok(())
        } else {
            Err(DomError::InvalidNode(id))
        }
    }

    /// Element data of `id`
    pub fn element(&self, id: NodeId) -> DomResult<&ElementData> {
        match self.tree.get(id) {
            None => Err(DomError::InvalidNode(id)),
            Some(node) => node.as_element().ok_or(DomError::WrongNodeType(id)),
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        self.check(id)?;
        self.tree.element_mut(id).ok_or(DomError::WrongNodeType(id))
    }

    /// Get the root element (`<html>`)
    pub fn document_element(&self) -> Option<NodeId> {
        self.tree
            .children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|&c| self.tree.element(c).is_some())
    }

    fn html_child(&self, names: &[&str]) -> Option<NodeId> {
        let html = self.document_element()?;
        self.tree.children(html).iter().copied().find(|&c| {
            self.tree
                .element(c)
                .is_some_and(|e| names.iter().any(|n| e.is_html_named(n)))
        })
    }

    /// Get `<head>`
    pub fn head(&self) -> Option<NodeId> {
        self.html_child(&["head"])
    }

    /// Get `<body>` (or `<frameset>`)
    pub fn body(&self) -> Option<NodeId> {
        self.html_child(&["body", "frameset"])
    }

    /// Text of the first `<title>`, whitespace stripped and collapsed
    pub fn title(&self) -> String {
        let Some(title) = self
            .tree
            .descendants(NodeId::ROOT)
            .find(|&id| self.tree.element(id).is_some_and(|e| e.is_html_named("title")))
        else {
            return String::new();
        };
        let text = self.tree.text_content(title);
        crate::classlist::split_tokens(&text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    // ---- factories ----

    /// `createElement`: validated, lowercased HTML element
    pub fn create_element(&mut self, local_name: &str) -> DomResult<NodeId> {
        validate_name(local_name)?;
        let name = QualName::html(local_name.to_ascii_lowercase());
        Ok(self.create_parsed_element(name, Vec::new(), ScriptOrigin::Node))
    }

    /// `createElementNS`
    pub fn create_element_ns(&mut self, namespace: Option<&str>, qualified_name: &str) -> DomResult<NodeId> {
        let (ns, prefix, local) = validate_and_extract(namespace, qualified_name)?;
        Ok(self.create_parsed_element(QualName::new(ns, prefix, local), Vec::new(), ScriptOrigin::Node))
    }

    /// Element built by a parser: no name validation, attributes as given
    pub fn create_parsed_element(&mut self, name: QualName, attrs: Vec<Attr>, origin: ScriptOrigin) -> NodeId {
        let mut data = ElementData::new(name);
        for attr in attrs {
            data.attrs.set_named_item(attr);
        }
        if data.is_html_named("script") {
            data.script = Some(ScriptState::new(origin));
        }
        self.tree.create_element_data(data)
    }

    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.tree.create_text(text)
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.tree.create_comment(text)
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.tree.create_fragment()
    }

    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.tree.create_doctype(name, public_id, system_id)
    }

    // ---- queries ----

    /// Get element by ID (exact, case-sensitive; `None` for "")
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.ids.first(&self.tree, id)
    }

    fn collection(&self, root: NodeId, filter: CollectionFilter) -> HtmlCollection {
        self.cache
            .borrow_mut()
            .get_or_create(CollectionKey { root, filter })
    }

    /// Live `getElementsByTagName` under `root`
    pub fn get_elements_by_tag_name(&self, root: NodeId, name: &str) -> HtmlCollection {
        self.collection(root, CollectionFilter::TagName(name.to_string()))
    }

    /// Live `getElementsByTagNameNS` under `root`
    pub fn get_elements_by_tag_name_ns(
        &self,
        root: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> HtmlCollection {
        self.collection(
            root,
            CollectionFilter::TagNameNs {
                namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
                local: local_name.to_string(),
            },
        )
    }

    /// Live `getElementsByName` under `root`
    pub fn get_elements_by_name(&self, root: NodeId, name: &str) -> HtmlCollection {
        self.collection(root, CollectionFilter::Name(name.to_string()))
    }

    /// Live `getElementsByClassName` under `root`
    pub fn get_elements_by_class_name(&self, root: NodeId, class_names: &str) -> HtmlCollection {
        self.collection(root, CollectionFilter::ClassNames(class_names.to_string()))
    }

    /// Live element children of `node` (`children`)
    pub fn element_children(&self, node: NodeId) -> HtmlCollection {
        self.collection(node, CollectionFilter::Children)
    }

    /// `document.all[name]`: one element, or a collection when ids/names collide
    pub fn all_named_item(&self, name: &str) -> Option<AllNamedItem> {
        let collection = self.collection(NodeId::ROOT, CollectionFilter::NamedAll(name.to_string()));
        match collection.length(self) {
            0 => None,
            1 => collection.item(self, 0).map(AllNamedItem::Element),
            _ => Some(AllNamedItem::Collection(collection)),
        }
    }

    /// First descendant of `root` matching `selector`
    pub fn query_selector(&self, root: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        self.check(root)?;
        let list = SelectorList::parse(selector)?;
        let quirks = self.mode == QuirksMode::Quirks;
        Ok(self
            .tree
            .descendants(root)
            .find(|&id| list.matches(&self.tree, id, quirks)))
    }

    /// Static list of descendants of `root` matching `selector`
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> DomResult<NodeList> {
        self.check(root)?;
        let list = SelectorList::parse(selector)?;
        let quirks = self.mode == QuirksMode::Quirks;
        Ok(NodeList::from_vec(
            self.tree
                .descendants(root)
                .filter(|&id| list.matches(&self.tree, id, quirks))
                .collect(),
        ))
    }

    /// Whether `node` is reachable from the document node
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.is_connected(node)
    }

    /// DOM `nodeName`
    pub fn node_name(&self, node: NodeId) -> DomResult<String> {
        let node_ref = self.tree.get(node).ok_or(DomError::InvalidNode(node))?;
        Ok(match node_ref.data() {
            NodeData::Document => "#document".to_string(),
            NodeData::Doctype { name, .. } => name.clone(),
            NodeData::Element(elem) => elem.tag_name(),
            NodeData::Text(_) => "#text".to_string(),
            NodeData::Comment(_) => "#comment".to_string(),
            NodeData::Fragment => "#document-fragment".to_string(),
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.'
}

/// XML `Name` production, as `createElement` and `setAttribute` check it
pub(crate) fn validate_name(name: &str) -> DomResult<()> {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start(first) && chars.all(is_name_char) => Ok(()),
        _ => Err(DomError::InvalidCharacter(name.to_string())),
    }
}

/// Split and check a qualified name against a namespace
pub(crate) fn validate_and_extract(
    namespace: Option<&str>,
    qualified_name: &str,
) -> DomResult<(Namespace, Option<String>, String)> {
    let ns = Namespace::from_option(namespace);
    validate_name(qualified_name)?;

    let (prefix, local) = match qualified_name.split_once(':') {
        Some((prefix, local)) => {
            if prefix.is_empty() || local.is_empty() || local.contains(':') {
                return Err(DomError::InvalidCharacter(qualified_name.to_string()));
            }
            (Some(prefix.to_string()), local.to_string())
        }
        None => (None, qualified_name.to_string()),
    };

    let namespace_error = || DomError::Namespace(format!("{qualified_name:?} in {:?}", ns.uri()));
    if prefix.is_some() && ns == Namespace::None {
        return Err(namespace_error());
    }
    if prefix.as_deref() == Some("xml") && ns != Namespace::Xml {
        return Err(namespace_error());
    }
    let is_xmlns = qualified_name == "xmlns" || prefix.as_deref() == Some("xmlns");
    if is_xmlns != (ns == Namespace::Xmlns) {
        return Err(namespace_error());
    }
    Ok((ns, prefix, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = Document::new("about:blank");
        let html = doc.document_element().unwrap();
        assert_eq!(doc.tree().parent(doc.head().unwrap()), Some(html));
        assert_eq!(doc.tree().parent(doc.body().unwrap()), Some(html));
        assert_eq!(doc.title(), "");
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::empty("about:blank");
        assert!(doc.document_element().is_none());
        assert!(doc.body().is_none());
    }

    #[test]
    fn test_create_element_lowercases() {
        let mut doc = Document::default();
        let div = doc.create_element("DiV").unwrap();
        assert_eq!(doc.element(div).unwrap().local_name(), "div");
        assert_eq!(doc.node_name(div).unwrap(), "DIV");
    }

    #[test]
    fn test_create_element_rejects_bad_names() {
        let mut doc = Document::default();
        for bad in ["", "1a", "a b", "<p>"] {
            assert!(matches!(doc.create_element(bad), Err(DomError::InvalidCharacter(_))));
        }
    }

    #[test]
    fn test_validate_and_extract() {
        let (ns, prefix, local) = validate_and_extract(Some(Namespace::SVG_URI), "svg:rect").unwrap();
        assert_eq!(ns, Namespace::Svg);
        assert_eq!(prefix.as_deref(), Some("svg"));
        assert_eq!(local, "rect");

        assert!(matches!(validate_and_extract(None, "a:b"), Err(DomError::Namespace(_))));
        assert!(matches!(
            validate_and_extract(Some(Namespace::HTML_URI), "xml:lang"),
            Err(DomError::Namespace(_))
        ));
        assert!(matches!(
            validate_and_extract(Some(Namespace::HTML_URI), "xmlns"),
            Err(DomError::Namespace(_))
        ));
        assert!(matches!(validate_and_extract(None, "a::b"), Err(DomError::InvalidCharacter(_))));
        assert!(validate_and_extract(Some(Namespace::XMLNS_URI), "xmlns:x").is_ok());
    }

    #[test]
    fn test_title_collapses_whitespace() {
        let mut doc = Document::new("about:blank");
        let head = doc.head().unwrap();
        let title = doc.create_element("title").unwrap();
        let text = doc.create_text_node("  Hello \n  world ");
        doc.append_child(title, text).unwrap();
        doc.append_child(head, title).unwrap();
        assert_eq!(doc.title(), "Hello world");
    }

    #[test]
    fn test_query_selector() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let a = doc.create_element("p").unwrap();
        let b = doc.create_element("p").unwrap();
        doc.set_attribute(b, "class", "x").unwrap();
        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();

        assert_eq!(doc.query_selector(NodeId::ROOT, "p.x").unwrap(), Some(b));
        let all = doc.query_selector_all(NodeId::ROOT, "body > p").unwrap();
        assert_eq!(all.length(), 2);
        assert!(doc.query_selector(NodeId::ROOT, "p[").is_err());

        // static: later mutations do not show up
        let c = doc.create_element("p").unwrap();
        doc.append_child(body, c).unwrap();
        assert_eq!(all.length(), 2);
    }
}
