//! Tree mutations with document bookkeeping
//!
//! Every mutation funnels through `insert_nodes`/`remove_node`, which keep
//! the id index current, bump the generation that live collections key
//! their snapshots on, and queue `<script>` elements that become connected.

use crate::node::{Node, NodeData};
use crate::operations::{AdjacentPosition, DomError, DomResult, NodeOperations};
use crate::profile::DetachedPolicy;
use crate::script::{is_javascript_type, PendingScript, ScriptError, ScriptHost, ScriptScope};
use crate::{Document, NodeId, NodeList};

impl Document {
    /// DOM "ensure pre-insertion validity", plus the replace variant
    fn validate_insertion(
        &self,
        parent: NodeId,
        node: NodeId,
        child: Option<NodeId>,
        replacing: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_node = self.tree().get(parent).ok_or(DomError::InvalidNode(parent))?;
        let node_ref = self.tree().get(node).ok_or(DomError::InvalidNode(node))?;

        if !parent_node.can_have_children() {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if self.tree().is_inclusive_ancestor(node, parent) {
            return Err(DomError::HierarchyRequest("node is an ancestor of the parent"));
        }
        if let Some(child) = child {
            self.check(child)?;
            if self.tree().parent(child) != Some(parent) {
                return Err(DomError::NotFound("reference node is not a child of this node"));
            }
        }

        match node_ref.data() {
            NodeData::Document => {
                return Err(DomError::HierarchyRequest("cannot insert a document"));
            }
            NodeData::Doctype { .. } if !matches!(parent_node.data(), NodeData::Document) => {
                return Err(DomError::HierarchyRequest("doctype outside a document"));
            }
            NodeData::Text(_) if matches!(parent_node.data(), NodeData::Document) => {
                return Err(DomError::HierarchyRequest("text directly under the document"));
            }
            _ => {}
        }

        if matches!(parent_node.data(), NodeData::Document) {
            let incoming: Vec<&Node> = match node_ref.data() {
                NodeData::Fragment => self
                    .tree()
                    .children(node)
                    .iter()
                    .filter_map(|&c| self.tree().get(c))
                    .collect(),
                _ => vec![node_ref],
            };
            if incoming.iter().any(|n| n.is_text()) {
                return Err(DomError::HierarchyRequest("text directly under the document"));
            }
            let new_elements = incoming.iter().filter(|n| n.is_element()).count();
            let existing = self
                .tree()
                .children(parent)
                .iter()
                .filter(|&&c| Some(c) != replacing && c != node)
                .filter(|&&c| self.tree().element(c).is_some())
                .count();
            if new_elements + existing > 1 {
                return Err(DomError::HierarchyRequest("document already has an element"));
            }
        }
        Ok(())
    }

    /// Insert `node` (or a fragment's children) before `child`.
    /// Caller has validated.
    fn insert_nodes(&mut self, parent: NodeId, node: NodeId, child: Option<NodeId>) {
        // insertBefore(x, x) inserts before x's next sibling
        let mut reference = child;
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }

        let nodes: Vec<NodeId> = if matches!(self.tree().get(node).map(Node::data), Some(NodeData::Fragment)) {
            let children = self.tree().children(node).to_vec();
            for &c in &children {
                self.tree_mut().detach(c);
            }
            children
        } else {
            if self.tree().parent(node).is_some() {
                self.remove_node(node);
            }
            vec![node]
        };

        let mut index = reference
            .and_then(|r| self.tree().index_of(parent, r))
            .unwrap_or(usize::MAX);
        for &n in &nodes {
            self.tree_mut().insert_at(parent, index, n);
            index = index.saturating_add(1);
        }
        self.touch();
        tracing::trace!("inserted {} node(s) into {}", nodes.len(), parent);

        if self.is_connected(parent) {
            for &n in &nodes {
                self.connected(n);
            }
            // children changed on a connected, not-yet-started script
            self.queue_script(parent);
        }
        self.run_pending_scripts();
    }

    /// Detach `node` from its parent, unindexing if it was connected
    fn remove_node(&mut self, node: NodeId) {
        let was_connected = self.is_connected(node);
        self.tree_mut().detach(node);
        self.touch();
        if was_connected {
            let subtree: Vec<NodeId> = self.tree().inclusive_descendants(node).collect();
            for id in subtree {
                if let Some(value) = self.tree().element(id).and_then(|e| e.get_attr_local("id")) {
                    let value = value.to_string();
                    self.ids.remove(&value, id);
                }
            }
        }
    }

    /// Bookkeeping for a subtree that just became connected
    fn connected(&mut self, root: NodeId) {
        let subtree: Vec<NodeId> = self.tree().inclusive_descendants(root).collect();
        for id in subtree {
            if let Some(value) = self.tree().element(id).and_then(|e| e.get_attr_local("id")) {
                let value = value.to_string();
                self.ids.insert(&value, id);
            }
            self.queue_script(id);
        }
    }

    /// "Prepare the script element": queue it if it is ready to run
    fn queue_script(&mut self, id: NodeId) {
        if !self.scripts.is_active() {
            return;
        }
        let Some(elem) = self.tree().element(id) else {
            return;
        };
        let Some(state) = elem.script_state().copied() else {
            return;
        };
        if state.already_started || !self.is_connected(id) {
            return;
        }
        let has_src = elem.get_attr_local("src").is_some();
        if !has_src && !is_javascript_type(elem.get_attr_local("type")) {
            return;
        }
        let source: String = self
            .tree()
            .children(id)
            .iter()
            .filter_map(|&c| self.tree().get(c).and_then(Node::as_text))
            .collect();
        if !has_src && source.is_empty() {
            return;
        }

        if let Some(script) = self.tree_mut().element_mut(id).and_then(|e| e.script.as_mut()) {
            script.already_started = true;
        }
        if has_src {
            tracing::debug!("skipping external script {}", id);
            return;
        }
        tracing::trace!("queued script {} ({:?})", id, state.origin);
        self.scripts.pending.push_back(PendingScript {
            element: Some(id),
            source,
            scope: state.origin.scope(),
        });
    }

    /// Run queued scripts until the queue is empty. Re-entrant calls made
    /// by a running script return at once; the outer drain picks up what
    /// they queued.
    pub fn run_pending_scripts(&mut self) {
        if self.scripts.draining {
            return;
        }
        let Some(mut host) = self.scripts.host.take() else {
            self.scripts.pending.clear();
            return;
        };
        self.scripts.draining = true;
        self.drain_with(host.as_mut());
        self.scripts.draining = false;
        if self.scripts.host.is_none() {
            self.scripts.host = Some(host);
        }
    }

    fn drain_with(&mut self, host: &mut dyn ScriptHost) {
        while let Some(script) = self.scripts.pending.pop_front() {
            if let Err(err) = host.execute(self, &script) {
                let element = script.element.map_or_else(|| "-".to_string(), |e| e.to_string());
                tracing::warn!("script {} failed: {}", element, err);
            }
        }
    }

    /// Install the host that runs connected scripts
    pub fn set_script_host(&mut self, host: impl ScriptHost + 'static) {
        self.scripts.host = Some(Box::new(host));
    }

    /// Remove the installed host, if any
    pub fn take_script_host(&mut self) -> Option<Box<dyn ScriptHost>> {
        self.scripts.host.take()
    }

    pub fn has_script_host(&self) -> bool {
        self.scripts.is_active()
    }

    /// Run `source` in the global scope of the installed host, as a caller
    /// outside any script element would. Errors are returned, not logged.
    pub fn execute_script(&mut self, source: &str) -> Result<(), ScriptError> {
        let Some(mut host) = self.scripts.host.take() else {
            return Err(ScriptError::NoHost);
        };
        let script = PendingScript {
            element: None,
            source: source.to_string(),
            scope: ScriptScope::Global,
        };
        let outer = self.scripts.draining;
        self.scripts.draining = true;
        let result = host.execute(self, &script);
        self.drain_with(host.as_mut());
        self.scripts.draining = outer;
        if self.scripts.host.is_none() {
            self.scripts.host = Some(host);
        }
        result
    }

    // ---- adjacent insertion ----

    /// Where `insertAdjacent*` at `position` inserts: (parent, reference).
    /// `Ok(None)` when the profile turns a parentless insertion into a no-op.
    pub fn adjacent_insertion_point(
        &self,
        target: NodeId,
        position: AdjacentPosition,
    ) -> DomResult<Option<(NodeId, Option<NodeId>)>> {
        self.check(target)?;
        if !position.needs_parent() {
            let reference = match position {
                AdjacentPosition::AfterBegin => self.first_child(target),
                _ => None,
            };
            return Ok(Some((target, reference)));
        }

        let Some(parent) = self.tree().parent(target) else {
            return match self.profile().detached_adjacent {
                DetachedPolicy::Ignore => {
                    tracing::warn!("{:?} insertion on parentless {} ignored", position, target);
                    Ok(None)
                }
                DetachedPolicy::Error => Err(DomError::InvalidState("target has no parent")),
            };
        };
        if parent == NodeId::ROOT {
            return Err(DomError::NoModificationAllowed(
                "cannot insert next to the document element".to_string(),
            ));
        }
        let reference = match position {
            AdjacentPosition::BeforeBegin => Some(target),
            _ => self.next_sibling(target),
        };
        Ok(Some((parent, reference)))
    }

    /// `insertAdjacentElement`; returns the inserted element, `None` on a no-op
    pub fn insert_adjacent_element(
        &mut self,
        target: NodeId,
        position: &str,
        element: NodeId,
    ) -> DomResult<Option<NodeId>> {
        let position: AdjacentPosition = position.parse()?;
        self.element(element)?;
        let Some((parent, reference)) = self.adjacent_insertion_point(target, position)? else {
            return Ok(None);
        };
        self.insert_before(parent, element, reference)?;
        Ok(Some(element))
    }

    /// `insertAdjacentText`
    pub fn insert_adjacent_text(&mut self, target: NodeId, position: &str, text: &str) -> DomResult<()> {
        let position: AdjacentPosition = position.parse()?;
        let Some((parent, reference)) = self.adjacent_insertion_point(target, position)? else {
            return Ok(());
        };
        let node = self.create_text_node(text);
        self.insert_before(parent, node, reference)?;
        Ok(())
    }

    /// Remove every child of `parent`
    pub fn remove_all_children(&mut self, parent: NodeId) -> DomResult<()> {
        self.check(parent)?;
        let children = self.tree().children(parent).to_vec();
        for child in children {
            self.remove_node(child);
        }
        Ok(())
    }

    // ---- navigation ----

    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.tree().parent(node)
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.tree().children(node).first().copied()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.tree().children(node).last().copied()
    }

    fn sibling(&self, node: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.tree().parent(node)?;
        let index = self.tree().index_of(parent, node)?;
        let target = index.checked_add_signed(offset)?;
        self.tree().children(parent).get(target).copied()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.sibling(node, 1)
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.sibling(node, -1)
    }

    /// Snapshot of `childNodes`
    pub fn child_nodes(&self, node: NodeId) -> NodeList {
        NodeList::from_vec(self.tree().children(node).to_vec())
    }

    /// `node.contains(other)`
    pub fn contains(&self, node: NodeId, other: NodeId) -> bool {
        self.tree().is_inclusive_ancestor(node, other)
    }

    /// `textContent`; `None` for the document and doctypes
    pub fn text_content(&self, node: NodeId) -> Option<String> {
        match self.tree().get(node)?.data() {
            NodeData::Document | NodeData::Doctype { .. } => None,
            _ => Some(self.tree().text_content(node)),
        }
    }

    /// Set `textContent`: character data is replaced in place, containers
    /// lose their children and gain one text node
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        self.check(node)?;
        let is_container = {
            let tree = self.tree_mut();
            match tree.get_mut(node).map(|n| &mut n.data) {
                Some(NodeData::Text(data)) | Some(NodeData::Comment(data)) => {
                    *data = text.to_string();
                    false
                }
                Some(NodeData::Element(_)) | Some(NodeData::Fragment) => true,
                _ => return Ok(()),
            }
        };
        if !is_container {
            self.touch();
            if let Some(parent) = self.tree().parent(node) {
                self.queue_script(parent);
                self.run_pending_scripts();
            }
            return Ok(());
        }
        self.remove_all_children(node)?;
        if !text.is_empty() {
            let child = self.create_text_node(text);
            self.insert_nodes(node, child, None);
        }
        Ok(())
    }
}

impl NodeOperations for Document {
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.check(parent)?;
        self.check(child)?;
        if self.tree().parent(child) != Some(parent) {
            return Err(DomError::NotFound("node is not a child of this node"));
        }
        self.remove_node(child);
        Ok(child)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.validate_insertion(parent, new_child, ref_child, None)?;
        self.insert_nodes(parent, new_child, ref_child);
        Ok(new_child)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId> {
        self.validate_insertion(parent, new_child, Some(old_child), Some(old_child))?;
        if new_child == old_child {
            return Ok(old_child);
        }
        let mut reference = self.next_sibling(old_child);
        if reference == Some(new_child) {
            reference = self.next_sibling(new_child);
        }
        self.remove_node(old_child);
        self.insert_nodes(parent, new_child, reference);
        Ok(old_child)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId> {
        let copy = self
            .tree_mut()
            .clone_shallow(node)
            .ok_or(DomError::InvalidNode(node))?;
        if deep {
            let children = self.tree().children(node).to_vec();
            for child in children {
                let child_copy = self.clone_node(child, true)?;
                self.tree_mut().append(copy, child_copy);
            }
        }
        Ok(copy)
    }

    fn normalize(&mut self, node: NodeId) -> DomResult<()> {
        self.check(node)?;
        let containers: Vec<NodeId> = self
            .tree()
            .inclusive_descendants(node)
            .filter(|&id| !self.tree().children(id).is_empty())
            .collect();

        let mut changed = false;
        for container in containers {
            let mut kept_text: Option<NodeId> = None;
            for child in self.tree().children(container).to_vec() {
                let Some(text) = self.tree().get(child).and_then(Node::as_text).map(str::to_string) else {
                    kept_text = None;
                    continue;
                };
                if text.is_empty() {
                    self.tree_mut().detach(child);
                    changed = true;
                } else if let Some(target) = kept_text {
                    if let Some(NodeData::Text(data)) = self.tree_mut().get_mut(target).map(|n| &mut n.data) {
                        data.push_str(&text);
                    }
                    self.tree_mut().detach(child);
                    changed = true;
                } else {
                    kept_text = Some(child);
                }
            }
        }
        if changed {
            self.touch();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc_with_body() -> (Document, NodeId) {
        let doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        (doc, body)
    }

    fn recorder(doc: &mut Document) -> Rc<RefCell<Vec<(String, ScriptScope)>>> {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ran);
        doc.set_script_host(move |_: &mut Document, script: &PendingScript| -> Result<(), ScriptError> {
            sink.borrow_mut().push((script.source.clone(), script.scope));
            Ok(())
        });
        ran
    }

    fn script(doc: &mut Document, source: &str) -> NodeId {
        let script = doc.create_element("script").unwrap();
        let text = doc.create_text_node(source);
        doc.append_child(script, text).unwrap();
        script
    }

    #[test]
    fn test_append_and_remove() {
        let (mut doc, body) = doc_with_body();
        let div = doc.create_element("div").unwrap();

        doc.append_child(body, div).unwrap();
        assert_eq!(doc.parent_node(div), Some(body));

        doc.remove_child(body, div).unwrap();
        assert_eq!(doc.parent_node(div), None);
        assert_eq!(
            doc.remove_child(body, div),
            Err(DomError::NotFound("node is not a child of this node"))
        );
    }

    #[test]
    fn test_insert_before_and_null_reference() {
        let (mut doc, body) = doc_with_body();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        let c = doc.create_element("i").unwrap();

        doc.insert_before(body, a, None).unwrap();
        doc.insert_before(body, b, Some(a)).unwrap();
        doc.insert_before(body, c, Some(a)).unwrap();
        assert_eq!(doc.tree().children(body), &[b, c, a]);

        // reordering within the same parent
        doc.insert_before(body, a, Some(b)).unwrap();
        assert_eq!(doc.tree().children(body), &[a, b, c]);
        doc.insert_before(body, b, Some(b)).unwrap();
        assert_eq!(doc.tree().children(body), &[a, b, c]);
    }

    #[test]
    fn test_replace_child() {
        let (mut doc, body) = doc_with_body();
        let old = doc.create_element("p").unwrap();
        let new = doc.create_element("div").unwrap();
        let stray = doc.create_element("span").unwrap();
        doc.append_child(body, old).unwrap();

        assert!(matches!(doc.replace_child(body, new, stray), Err(DomError::NotFound(_))));
        assert_eq!(doc.replace_child(body, new, old), Ok(old));
        assert_eq!(doc.tree().children(body), &[new]);
        assert_eq!(doc.parent_node(old), None);
    }

    #[test]
    fn test_hierarchy_errors() {
        let (mut doc, body) = doc_with_body();
        let div = doc.create_element("div").unwrap();
        let text = doc.create_text_node("t");
        doc.append_child(body, div).unwrap();

        let html = doc.document_element().unwrap();
        assert!(matches!(doc.append_child(div, html), Err(DomError::HierarchyRequest(_))));
        assert!(matches!(doc.append_child(text, div), Err(DomError::HierarchyRequest(_))));
        assert!(matches!(doc.append_child(div, NodeId::ROOT), Err(DomError::HierarchyRequest(_))));
        let second = doc.create_element("html").unwrap();
        assert!(matches!(
            doc.append_child(NodeId::ROOT, second),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(doc.append_child(div, NodeId(9999)), Err(DomError::InvalidNode(_))));
    }

    #[test]
    fn test_fragment_insertion_empties_fragment() {
        let (mut doc, body) = doc_with_body();
        let frag = doc.create_document_fragment();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.append_child(frag, a).unwrap();
        doc.append_child(frag, b).unwrap();

        doc.append_child(body, frag).unwrap();
        assert_eq!(doc.tree().children(body), &[a, b]);
        assert!(doc.tree().children(frag).is_empty());
    }

    #[test]
    fn test_detached_node_keeps_subtree() {
        let (mut doc, body) = doc_with_body();
        let div = doc.create_element("div").unwrap();
        let child = doc.create_text_node("kept");
        doc.append_child(div, child).unwrap();
        doc.append_child(body, div).unwrap();

        doc.remove_child(body, div).unwrap();
        assert_eq!(doc.text_content(div).as_deref(), Some("kept"));
    }

    #[test]
    fn test_id_index_follows_connection() {
        let (mut doc, body) = doc_with_body();
        let div = doc.create_element("div").unwrap();
        doc.set_attribute(div, "id", "x").unwrap();
        assert_eq!(doc.get_element_by_id("x"), None);

        doc.append_child(body, div).unwrap();
        assert_eq!(doc.get_element_by_id("x"), Some(div));
        assert_eq!(doc.get_element_by_id("X"), None);
        assert_eq!(doc.get_element_by_id(""), None);

        doc.remove_child(body, div).unwrap();
        assert_eq!(doc.get_element_by_id("x"), None);
    }

    #[test]
    fn test_duplicate_ids_first_in_tree_order() {
        let (mut doc, body) = doc_with_body();
        let a = doc.create_element("p").unwrap();
        let b = doc.create_element("p").unwrap();
        doc.set_attribute(a, "id", "dup").unwrap();
        doc.set_attribute(b, "id", "dup").unwrap();
        doc.append_child(body, b).unwrap();
        doc.insert_before(body, a, Some(b)).unwrap();
        assert_eq!(doc.get_element_by_id("dup"), Some(a));
    }

    #[test]
    fn test_adjacent_positions() {
        let (mut doc, body) = doc_with_body();
        let target = doc.create_element("div").unwrap();
        let inner = doc.create_element("span").unwrap();
        doc.append_child(target, inner).unwrap();
        doc.append_child(body, target).unwrap();

        let before = doc.create_element("p").unwrap();
        let after = doc.create_element("p").unwrap();
        let first = doc.create_element("b").unwrap();
        let last = doc.create_element("i").unwrap();
        doc.insert_adjacent_element(target, "BeforeBegin", before).unwrap();
        doc.insert_adjacent_element(target, "afterend", after).unwrap();
        doc.insert_adjacent_element(target, "afterBegin", first).unwrap();
        doc.insert_adjacent_element(target, "BEFOREEND", last).unwrap();
        doc.insert_adjacent_text(target, "beforeend", "tail").unwrap();

        assert_eq!(doc.tree().children(body), &[before, target, after]);
        assert_eq!(&doc.tree().children(target)[..3], &[first, inner, last]);
        assert_eq!(doc.text_content(target).as_deref(), Some("tail"));

        assert!(matches!(
            doc.insert_adjacent_text(target, "inside", "x"),
            Err(DomError::Syntax(_))
        ));
    }

    #[test]
    fn test_adjacent_on_detached_follows_profile() {
        let (mut doc, _) = doc_with_body();
        let detached = doc.create_element("div").unwrap();
        let other = doc.create_element("p").unwrap();
        assert!(matches!(
            doc.insert_adjacent_element(detached, "beforebegin", other),
            Err(DomError::InvalidState(_))
        ));

        let mut doc = Document::new("about:blank").with_profile(crate::BrowserProfile::legacy());
        let detached = doc.create_element("div").unwrap();
        let other = doc.create_element("p").unwrap();
        assert_eq!(doc.insert_adjacent_element(detached, "afterend", other), Ok(None));
        assert_eq!(doc.parent_node(other), None);
    }

    #[test]
    fn test_adjacent_next_to_document_element() {
        let (mut doc, _) = doc_with_body();
        let html = doc.document_element().unwrap();
        assert!(matches!(
            doc.insert_adjacent_text(html, "beforebegin", "x"),
            Err(DomError::NoModificationAllowed(_))
        ));
    }

    #[test]
    fn test_clone_node() {
        let (mut doc, body) = doc_with_body();
        let div = doc.create_element("div").unwrap();
        doc.set_attribute(div, "class", "a").unwrap();
        doc.set_property(div, "custom", "x").unwrap();
        let text = doc.create_text_node("hi");
        doc.append_child(div, text).unwrap();
        doc.append_child(body, div).unwrap();

        let shallow = doc.clone_node(div, false).unwrap();
        assert!(doc.tree().children(shallow).is_empty());
        assert_eq!(doc.get_attribute(shallow, "class").unwrap(), Some("a"));
        assert_eq!(doc.get_property(shallow, "custom").unwrap(), None);

        let deep = doc.clone_node(div, true).unwrap();
        assert_eq!(doc.text_content(deep).as_deref(), Some("hi"));
        assert_eq!(doc.parent_node(deep), None);
    }

    #[test]
    fn test_normalize() {
        let (mut doc, body) = doc_with_body();
        let p = doc.create_element("p").unwrap();
        for part in ["a", "", "b"] {
            let t = doc.create_text_node(part);
            doc.append_child(p, t).unwrap();
        }
        let br = doc.create_element("br").unwrap();
        doc.append_child(p, br).unwrap();
        let t = doc.create_text_node("c");
        doc.append_child(p, t).unwrap();
        doc.append_child(body, p).unwrap();

        doc.normalize(p).unwrap();
        assert_eq!(doc.tree().children(p).len(), 3);
        assert_eq!(doc.text_content(p).as_deref(), Some("abc"));
    }

    #[test]
    fn test_set_text_content() {
        let (mut doc, body) = doc_with_body();
        let p = doc.create_element("p").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.append_child(p, b).unwrap();
        doc.append_child(body, p).unwrap();

        doc.set_text_content(p, "plain").unwrap();
        assert_eq!(doc.tree().children(p).len(), 1);
        assert_eq!(doc.text_content(p).as_deref(), Some("plain"));
        doc.set_text_content(p, "").unwrap();
        assert!(doc.tree().children(p).is_empty());
        assert_eq!(doc.text_content(NodeId::ROOT), None);
    }

    #[test]
    fn test_script_runs_once_on_connection() {
        let (mut doc, body) = doc_with_body();
        let ran = recorder(&mut doc);
        let s = script(&mut doc, "go()");

        doc.append_child(body, s).unwrap();
        doc.remove_child(body, s).unwrap();
        doc.append_child(body, s).unwrap();

        assert_eq!(&*ran.borrow(), &[("go()".to_string(), ScriptScope::Global)]);
    }

    #[test]
    fn test_nested_script_runs_when_ancestor_connects() {
        let (mut doc, body) = doc_with_body();
        let ran = recorder(&mut doc);
        let div = doc.create_element("div").unwrap();
        let s = script(&mut doc, "nested()");
        doc.append_child(div, s).unwrap();
        assert!(ran.borrow().is_empty());

        doc.append_child(body, div).unwrap();
        assert_eq!(ran.borrow().len(), 1);
    }

    #[test]
    fn test_empty_script_runs_once_text_arrives() {
        let (mut doc, body) = doc_with_body();
        let ran = recorder(&mut doc);
        let s = doc.create_element("script").unwrap();
        doc.append_child(body, s).unwrap();
        assert!(ran.borrow().is_empty());

        doc.set_text_content(s, "late()").unwrap();
        assert_eq!(ran.borrow()[0].0, "late()");
    }

    #[test]
    fn test_non_javascript_and_external_scripts_skipped() {
        let (mut doc, body) = doc_with_body();
        let ran = recorder(&mut doc);
        let template = script(&mut doc, "<b>not js</b>");
        doc.set_attribute(template, "type", "text/template").unwrap();
        let external = script(&mut doc, "inline()");
        doc.set_attribute(external, "src", "x.js").unwrap();

        doc.append_child(body, template).unwrap();
        doc.append_child(body, external).unwrap();
        assert!(ran.borrow().is_empty());
    }

    #[test]
    fn test_scripts_connected_by_scripts_run_before_return() {
        let (mut doc, body) = doc_with_body();
        let ran = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ran);
        doc.set_script_host(move |doc: &mut Document, script: &PendingScript| -> Result<(), ScriptError> {
            sink.borrow_mut().push(script.source.clone());
            if script.source == "outer" {
                let body = doc.body().ok_or(ScriptError::Runtime("no body".into()))?;
                let inner = doc.create_element("script").map_err(|e| ScriptError::Runtime(e.to_string()))?;
                let text = doc.create_text_node("inner");
                doc.append_child(inner, text).map_err(|e| ScriptError::Runtime(e.to_string()))?;
                doc.append_child(body, inner).map_err(|e| ScriptError::Runtime(e.to_string()))?;
                sink.borrow_mut().push("after append".to_string());
            }
            Ok(())
        });

        let s = script(&mut doc, "outer");
        doc.append_child(body, s).unwrap();
        assert_eq!(&*ran.borrow(), &["outer", "after append", "inner"]);
        assert!(doc.has_script_host());
    }

    #[test]
    fn test_script_error_does_not_fail_mutation() {
        let (mut doc, body) = doc_with_body();
        doc.set_script_host(|_: &mut Document, _: &PendingScript| -> Result<(), ScriptError> {
            Err(ScriptError::Runtime("boom".into()))
        });
        let s = script(&mut doc, "throw 1");
        assert_eq!(doc.append_child(body, s), Ok(s));
        assert_eq!(doc.parent_node(s), Some(body));
    }

    #[test]
    fn test_no_host_leaves_scripts_unstarted() {
        let (mut doc, body) = doc_with_body();
        let s = script(&mut doc, "later()");
        doc.append_child(body, s).unwrap();
        doc.remove_child(body, s).unwrap();

        let ran = recorder(&mut doc);
        doc.append_child(body, s).unwrap();
        assert_eq!(ran.borrow().len(), 1);
        assert_eq!(doc.execute_script("x"), Ok(()));
        assert_eq!(ran.borrow()[1], ("x".to_string(), ScriptScope::Global));

        doc.take_script_host();
        assert_eq!(doc.execute_script("x"), Err(ScriptError::NoHost));
    }
}
