//! Live collections
//!
//! `HTMLCollection` handles returned by `getElementsByTagName`,
//! `getElementsByName`, `getElementsByClassName` and friends. A handle
//! stores only its (root, filter) key; contents are computed from the
//! current tree when read, memoised until the next mutation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::classlist::{split_tokens, DOMTokenList};
use crate::document::{Document, QuirksMode};
use crate::node::{ElementData, Namespace};
use crate::query_cache::CollectionKey;
use crate::NodeId;

/// What a live collection selects
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionFilter {
    /// `getElementsByTagName`; `*` matches everything
    TagName(String),
    /// `getElementsByTagNameNS`; `Some("*")`/`"*"` are wildcards
    TagNameNs {
        namespace: Option<String>,
        local: String,
    },
    /// `getElementsByName`
    Name(String),
    /// `getElementsByClassName`, whitespace-separated tokens (AND)
    ClassNames(String),
    /// Element children of the root
    Children,
    /// Elements whose id or name equals the value (`document.all[name]`)
    NamedAll(String),
}

#[derive(Debug)]
pub(crate) struct CollectionState {
    key: CollectionKey,
    /// (document instance, generation) the snapshot was taken at
    snapshot: RefCell<Option<((u64, u64), Rc<[NodeId]>)>>,
}

/// Live, ordered view over a subtree
///
/// Equality is identity: two handles are equal only if they are the same
/// collection object.
#[derive(Debug, Clone)]
pub struct HtmlCollection {
    state: Rc<CollectionState>,
}

impl PartialEq for HtmlCollection {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for HtmlCollection {}

impl HtmlCollection {
    pub(crate) fn new(key: CollectionKey) -> Self {
        Self {
            state: Rc::new(CollectionState {
                key,
                snapshot: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn from_state(state: Rc<CollectionState>) -> Self {
        Self { state }
    }

    pub(crate) fn downgrade(&self) -> Weak<CollectionState> {
        Rc::downgrade(&self.state)
    }

    /// Root the collection is scoped to
    pub fn root(&self) -> NodeId {
        self.state.key.root
    }

    /// Filter the collection applies
    pub fn filter(&self) -> &CollectionFilter {
        &self.state.key.filter
    }

    fn elements(&self, doc: &Document) -> Rc<[NodeId]> {
        let stamp = (doc.instance_id(), doc.generation());
        if let Some((taken, nodes)) = self.state.snapshot.borrow().as_ref() {
            if *taken == stamp {
                return Rc::clone(nodes);
            }
        }
        let nodes: Rc<[NodeId]> = doc.evaluate_collection(&self.state.key).into();
        tracing::trace!(
            "re-evaluated {:?} under {}: {} elements",
            self.state.key.filter,
            self.state.key.root,
            nodes.len()
        );
        *self.state.snapshot.borrow_mut() = Some((stamp, Rc::clone(&nodes)));
        nodes
    }

    /// Current number of matching elements
    pub fn length(&self, doc: &Document) -> usize {
        self.elements(doc).len()
    }

    /// Element at `index` in document order
    pub fn item(&self, doc: &Document, index: usize) -> Option<NodeId> {
        self.elements(doc).get(index).copied()
    }

    /// First element whose id is `key`, else first HTML element named `key`
    pub fn named_item(&self, doc: &Document, key: &str) -> Option<NodeId> {
        if key.is_empty() {
            return None;
        }
        let elements = self.elements(doc);
        let tree = doc.tree();
        elements
            .iter()
            .copied()
            .find(|&id| tree.element(id).and_then(|e| e.get_attr_local("id")) == Some(key))
            .or_else(|| {
                elements.iter().copied().find(|&id| {
                    tree.element(id)
                        .is_some_and(|e| e.is_html() && e.get_attr_local("name") == Some(key))
                })
            })
    }

    /// Current contents
    pub fn to_vec(&self, doc: &Document) -> Vec<NodeId> {
        self.elements(doc).to_vec()
    }

    /// Iterate the contents as of this call. To mutate while walking, loop
    /// on `item(i)` and re-read `length` each step.
    pub fn iter(&self, doc: &Document) -> impl Iterator<Item = NodeId> {
        let elements = self.elements(doc);
        (0..elements.len()).map(move |i| elements[i])
    }
}

/// Static node list (`querySelectorAll`, `childNodes` snapshots)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeList {
    nodes: Vec<NodeId>,
}

impl NodeList {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn from_vec(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    pub fn length(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }
}

/// A filter resolved against the document mode and profile
enum Matcher<'a> {
    Nothing,
    All,
    TagName { lowered: String, exact: &'a str },
    TagNameNs {
        namespace: Option<Namespace>,
        local: Option<&'a str>,
    },
    Name(&'a str),
    Classes { tokens: Vec<&'a str>, ignore_case: bool },
    Named(&'a str),
}

impl<'a> Matcher<'a> {
    fn compile(filter: &'a CollectionFilter, doc: &Document) -> Self {
        match filter {
            CollectionFilter::TagName(name) if name == "*" => Self::All,
            CollectionFilter::TagName(name) => Self::TagName {
                lowered: name.to_ascii_lowercase(),
                exact: name,
            },
            CollectionFilter::TagNameNs { namespace, local } => Self::TagNameNs {
                namespace: match namespace.as_deref() {
                    Some("*") => None,
                    other => Some(Namespace::from_option(other)),
                },
                local: (local != "*").then_some(local.as_str()),
            },
            CollectionFilter::Name(value) => {
                if value.is_empty() && !doc.profile().matches_empty_name(doc.quirks_mode()) {
                    Self::Nothing
                } else {
                    Self::Name(value)
                }
            }
            CollectionFilter::ClassNames(classes) => {
                let tokens: Vec<&str> = split_tokens(classes).collect();
                if tokens.is_empty() {
                    Self::Nothing
                } else {
                    Self::Classes {
                        tokens,
                        ignore_case: doc.quirks_mode() == QuirksMode::Quirks,
                    }
                }
            }
            CollectionFilter::Children => Self::All,
            CollectionFilter::NamedAll(name) if name.is_empty() => Self::Nothing,
            CollectionFilter::NamedAll(name) => Self::Named(name),
        }
    }

    fn matches(&self, elem: &ElementData) -> bool {
        match self {
            Self::Nothing => false,
            Self::All => true,
            Self::TagName { lowered, exact } => {
                let qualified = elem.qualified_name();
                if elem.is_html() {
                    qualified == *lowered
                } else {
                    qualified == *exact
                }
            }
            Self::TagNameNs { namespace, local } => {
                namespace.as_ref().is_none_or(|ns| &elem.name().ns == ns)
                    && local.is_none_or(|l| elem.local_name() == l)
            }
            Self::Name(value) => elem.is_html() && elem.get_attr_local("name") == Some(*value),
            Self::Classes { tokens, ignore_case } => {
                let Some(class) = elem.get_attr_local("class") else {
                    return false;
                };
                let own = DOMTokenList::from_string(class);
                tokens.iter().all(|wanted| {
                    if *ignore_case {
                        own.contains_ignore_case(wanted)
                    } else {
                        own.contains(wanted)
                    }
                })
            }
            Self::Named(name) => {
                elem.get_attr_local("id") == Some(*name)
                    || (elem.is_html() && elem.get_attr_local("name") == Some(*name))
            }
        }
    }
}

impl Document {
    /// Compute a collection's contents from the current tree
    pub(crate) fn evaluate_collection(&self, key: &CollectionKey) -> Vec<NodeId> {
        let matcher = Matcher::compile(&key.filter, self);
        if matches!(matcher, Matcher::Nothing) {
            return Vec::new();
        }
        let tree = self.tree();
        let matches = |id: &NodeId| tree.element(*id).is_some_and(|e| matcher.matches(e));
        match key.filter {
            CollectionFilter::Children => {
                tree.children(key.root).iter().copied().filter(matches).collect()
            }
            _ => tree.descendants(key.root).filter(matches).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_list() {
        let list = NodeList::from_vec(vec![NodeId(1), NodeId(2), NodeId(3)]);

        assert_eq!(list.length(), 3);
        assert_eq!(list.item(0), Some(NodeId(1)));
        assert_eq!(list.item(3), None);
    }

    #[test]
    fn test_class_filter_and_semantics() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        for class in ["foo", "foo red", "red", "red  foo\tbar"] {
            let div = doc.create_element("div").unwrap();
            doc.set_attribute(div, "class", class).unwrap();
            crate::NodeOperations::append_child(&mut doc, body, div).unwrap();
        }

        let both = doc.get_elements_by_class_name(NodeId::ROOT, "red foo");
        assert_eq!(both.length(&doc), 2);
        let none = doc.get_elements_by_class_name(NodeId::ROOT, "  ");
        assert_eq!(none.length(&doc), 0);
    }

    #[test]
    fn test_snapshot_reused_until_mutation() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let divs = doc.get_elements_by_tag_name(NodeId::ROOT, "div");
        assert_eq!(divs.length(&doc), 0);

        let div = doc.create_element("div").unwrap();
        crate::NodeOperations::append_child(&mut doc, body, div).unwrap();
        assert_eq!(divs.length(&doc), 1);
        assert_eq!(divs.item(&doc, 0), Some(div));
    }
}
