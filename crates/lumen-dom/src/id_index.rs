//! Id index for `getElementById`
//!
//! Maps an `id` value to every connected element carrying it. Duplicates
//! are tolerated; lookups return the first in tree order.

use std::collections::HashMap;

use crate::tree::DomTree;
use crate::NodeId;

#[derive(Debug, Clone, Default)]
pub(crate) struct IdIndex {
    map: HashMap<String, Vec<NodeId>>,
}

impl IdIndex {
    pub(crate) fn insert(&mut self, id: &str, node: NodeId) {
        if id.is_empty() {
            return;
        }
        let entry = self.map.entry(id.to_string()).or_default();
        if !entry.contains(&node) {
            entry.push(node);
        }
    }

    pub(crate) fn remove(&mut self, id: &str, node: NodeId) {
        if let Some(entry) = self.map.get_mut(id) {
            entry.retain(|&n| n != node);
            if entry.is_empty() {
                self.map.remove(id);
            }
        }
    }

    /// First element with `id` in tree order
    pub(crate) fn first(&self, tree: &DomTree, id: &str) -> Option<NodeId> {
        let entry = self.map.get(id)?;
        match entry.as_slice() {
            [] => None,
            [only] => Some(*only),
            many => many
                .iter()
                .copied()
                .min_by(|&a, &b| tree.tree_order(a, b)),
        }
    }

    /// Number of elements sharing `id`
    #[cfg(test)]
    pub(crate) fn count(&self, id: &str) -> usize {
        self.map.get(id).map_or(0, Vec::len)
    }
}
