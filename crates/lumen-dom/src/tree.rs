//! DOM Tree (arena-based allocation)
//!
//! Raw structural primitives. Nothing here updates the id index, bumps the
//! document generation or schedules scripts; [`Document`](crate::Document)
//! layers that bookkeeping on top.

use std::cmp::Ordering;

use crate::node::{ElementData, Node, NodeData, QualName};
use crate::NodeId;

/// Arena-based DOM tree. Slot 0 is always the document node.
///
/// Slots are never reclaimed: a removed or replaced node keeps its slot
/// (a `NodeId` held by a caller must stay valid), so every innerHTML or
/// outerHTML assignment grows the arena by the nodes it parses. Memory is
/// returned when the whole [`Document`](crate::Document) is dropped.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Element data of `id`, if it is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: QualName) -> NodeId {
        self.push(NodeData::Element(ElementData::new(name)))
    }

    /// Create a detached element from prepared data
    pub fn create_element_data(&mut self, data: ElementData) -> NodeId {
        self.push(NodeData::Element(data))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    /// Create an empty fragment
    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::Fragment)
    }

    /// Create a doctype node
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.push(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        })
    }

    /// Clone a node's payload into a new detached node (children are not copied)
    pub(crate) fn clone_shallow(&mut self, id: NodeId) -> Option<NodeId> {
        let mut data = self.get(id)?.data.clone();
        if let NodeData::Element(elem) = &mut data {
            elem.properties.clear();
        }
        Some(self.push(data))
    }

    /// Parent of `id`
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of `id` in order (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Position of `child` among its parent's children
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Detach `id` from its parent; no-op when already detached
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Insert `child` into `parent` at `index` (clamped), detaching it first
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let Some(p) = self.get_mut(parent) else {
            return;
        };
        let index = index.min(p.children.len());
        p.children.insert(index, child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Append `child` as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.insert_at(parent, usize::MAX, child);
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether `id` is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    /// Pre-order descendants of `root`, excluding `root`
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(root).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// `root` followed by its pre-order descendants
    pub fn inclusive_descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(root).chain(self.descendants(root))
    }

    /// Ancestor chain of `id` from the top down, including `id`
    fn path_from_top(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Tree-order comparison of two nodes sharing a root
    pub fn tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let pa = self.path_from_top(a);
        let pb = self.path_from_top(b);
        let common = pa.iter().zip(&pb).take_while(|(x, y)| x == y).count();
        match (pa.get(common), pb.get(common)) {
            // `a` is an ancestor of `b`
            (None, _) => Ordering::Less,
            (_, None) => Ordering::Greater,
            (Some(&ca), Some(&cb)) => {
                if common == 0 {
                    // different roots: arena order keeps it total
                    return pa[0].cmp(&pb[0]);
                }
                let parent = pa[common - 1];
                let ia = self.index_of(parent, ca);
                let ib = self.index_of(parent, cb);
                ia.cmp(&ib)
            }
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(t)) | Some(NodeData::Comment(t)) => t.clone(),
            Some(_) => self
                .descendants(id)
                .filter_map(|d| self.get(d).and_then(Node::as_text))
                .collect(),
            None => String::new(),
        }
    }
}

/// Pre-order traversal
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let html = tree.create_element(QualName::html("html"));
        let a = tree.create_element(QualName::html("a"));
        let b = tree.create_element(QualName::html("b"));
        let t = tree.create_text("x");
        tree.append(tree.root(), html);
        tree.append(html, a);
        tree.append(a, t);
        tree.append(html, b);
        (tree, html, a, b, t)
    }

    #[test]
    fn test_descendants_pre_order() {
        let (tree, html, a, b, t) = sample();
        let order: Vec<_> = tree.descendants(NodeId::ROOT).collect();
        assert_eq!(order, vec![html, a, t, b]);
        assert_eq!(tree.descendants(a).collect::<Vec<_>>(), vec![t]);
    }

    #[test]
    fn test_insert_moves_node() {
        let (mut tree, html, a, b, t) = sample();
        tree.append(b, t);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[t]);
        assert_eq!(tree.parent(t), Some(b));
        assert_eq!(tree.children(html), &[a, b]);
    }

    #[test]
    fn test_detach_keeps_subtree() {
        let (mut tree, _html, a, _b, t) = sample();
        tree.detach(a);
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.children(a), &[t]);
        assert!(!tree.is_connected(t));
    }

    #[test]
    fn test_tree_order() {
        let (tree, html, a, b, t) = sample();
        assert_eq!(tree.tree_order(a, b), Ordering::Less);
        assert_eq!(tree.tree_order(t, b), Ordering::Less);
        assert_eq!(tree.tree_order(html, t), Ordering::Less);
        assert_eq!(tree.tree_order(b, a), Ordering::Greater);
    }

    #[test]
    fn test_text_content() {
        let (tree, html, ..) = sample();
        assert_eq!(tree.text_content(html), "x");
    }

    #[test]
    fn test_empty_operations() {
        let tree = DomTree::new();
        assert!(tree.get(NodeId(999)).is_none());
        assert!(tree.children(NodeId(999)).is_empty());
        assert_eq!(tree.descendants(NodeId(999)).count(), 0);
    }
}
