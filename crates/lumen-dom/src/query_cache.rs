//! Live collection cache
//!
//! Keyed by (root, filter). Entries hold weak handles: while any caller
//! keeps a collection alive, asking again for the same key hands back the
//! same collection; once every handle is dropped the key builds a new one.

use std::collections::HashMap;
use std::rc::Weak;

use crate::collection::{CollectionFilter, CollectionState, HtmlCollection};
use crate::NodeId;

/// Cache key for live collections
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CollectionKey {
    /// Root node for query
    pub root: NodeId,
    pub filter: CollectionFilter,
}

#[derive(Debug)]
pub(crate) struct QueryCache {
    entries: HashMap<CollectionKey, Weak<CollectionState>>,
    /// Sweep dead entries once this many accumulate
    sweep_threshold: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(64)
    }
}

impl QueryCache {
    pub(crate) fn new(sweep_threshold: usize) -> Self {
        Self {
            entries: HashMap::new(),
            sweep_threshold,
        }
    }

    /// Live handle for `key`, reusing one a caller still holds
    pub(crate) fn get_or_create(&mut self, key: CollectionKey) -> HtmlCollection {
        if let Some(existing) = self.entries.get(&key).and_then(Weak::upgrade) {
            return HtmlCollection::from_state(existing);
        }
        if self.entries.len() >= self.sweep_threshold {
            self.sweep();
        }
        let collection = HtmlCollection::new(key.clone());
        self.entries.insert(key, collection.downgrade());
        collection
    }

    /// Drop entries nobody holds any more
    pub(crate) fn sweep(&mut self) {
        self.entries.retain(|_, weak| weak.strong_count() > 0);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
