//! Lumen DOM - Document Object Model
//!
//! Arena-backed node tree with live collections, attribute/property
//! synchronisation and a script connection hook.
//!
//! All state hangs off an explicit [`Document`]; nodes are addressed by
//! [`NodeId`] handles into its arena.

mod attributes;
mod classlist;
mod collection;
mod document;
mod element_api;
mod id_index;
mod mutation;
mod node;
mod operations;
mod profile;
mod query_cache;
mod script;
mod selector;
mod tree;

pub use attributes::{Attr, NamedNodeMap};
pub use classlist::DOMTokenList;
pub use collection::{CollectionFilter, HtmlCollection, NodeList};
pub use document::{AllNamedItem, Document, QuirksMode};
pub use node::{ElementData, Namespace, Node, NodeData, NodeType, QualName};
pub use operations::{AdjacentPosition, DomError, DomResult, NodeOperations};
pub use profile::{BrowserProfile, DetachedPolicy, EmptyNameMatching, SelfClosingPolicy};
pub use script::{PendingScript, ScriptError, ScriptHost, ScriptOrigin, ScriptScope, ScriptState};
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document node of every tree
    pub const ROOT: NodeId = NodeId(0);

    /// Arena index of this node
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
