//! Element Attributes
//!
//! Attribute storage: get, set, remove, has, in insertion order. Names are
//! unique per (namespace, local name); case folding for HTML elements is
//! the caller's job (see `element_api.rs`).

use crate::node::Namespace;

/// Single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub namespace: Namespace,
    pub prefix: Option<String>,
    pub local_name: String,
    pub value: String,
}

impl Attr {
    /// Attribute in no namespace
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::None,
            prefix: None,
            local_name: name.into(),
            value: value.into(),
        }
    }

    /// Namespaced attribute
    pub fn with_ns(
        namespace: Namespace,
        prefix: Option<String>,
        local_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            prefix,
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    /// Qualified name (`prefix:local`)
    pub fn name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local_name),
            None => self.local_name.clone(),
        }
    }

    fn has_name(&self, qualified: &str) -> bool {
        match &self.prefix {
            Some(prefix) => qualified
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .is_some_and(|local| local == self.local_name),
            None => self.local_name == qualified,
        }
    }

    pub fn is_id(&self) -> bool {
        self.namespace == Namespace::None && self.local_name == "id"
    }
}

/// Named node map (attribute collection)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedNodeMap {
    attributes: Vec<Attr>,
}

impl NamedNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of attributes
    pub fn length(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Get attribute by index
    pub fn item(&self, index: usize) -> Option<&Attr> {
        self.attributes.get(index)
    }

    /// Get the first attribute whose qualified name matches
    pub fn get_named_item(&self, name: &str) -> Option<&Attr> {
        self.attributes.iter().find(|a| a.has_name(name))
    }

    /// Get attribute by namespace and local name
    pub fn get_named_item_ns(&self, namespace: &Namespace, local_name: &str) -> Option<&Attr> {
        self.attributes
            .iter()
            .find(|a| &a.namespace == namespace && a.local_name == local_name)
    }

    /// Get attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.get_named_item(name).map(|a| a.value.as_str())
    }

    /// Insert or replace by (namespace, local name), returning the old attribute
    pub fn set_named_item(&mut self, attr: Attr) -> Option<Attr> {
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.namespace == attr.namespace && a.local_name == attr.local_name)
        {
            Some(std::mem::replace(existing, attr))
        } else {
            self.attributes.push(attr);
            None
        }
    }

    /// Set attribute by qualified name; an existing match keeps its slot.
    /// Returns the previous value.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Option<String> {
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.has_name(name)) {
            Some(std::mem::replace(&mut existing.value, value.to_string()))
        } else {
            self.attributes.push(Attr::new(name, value));
            None
        }
    }

    /// Change the value of (namespace, local name), appending if absent.
    /// Returns the previous value.
    pub(crate) fn set_value_ns(
        &mut self,
        namespace: Namespace,
        prefix: Option<String>,
        local_name: &str,
        value: &str,
    ) -> Option<String> {
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.namespace == namespace && a.local_name == local_name)
        {
            return Some(std::mem::replace(&mut existing.value, value.to_string()));
        }
        self.attributes
            .push(Attr::with_ns(namespace, prefix, local_name, value));
        None
    }

    /// Remove attribute by qualified name
    pub fn remove_named_item(&mut self, name: &str) -> Option<Attr> {
        let index = self.attributes.iter().position(|a| a.has_name(name))?;
        Some(self.attributes.remove(index))
    }

    /// Remove attribute by namespace and local name
    pub fn remove_named_item_ns(&mut self, namespace: &Namespace, local_name: &str) -> Option<Attr> {
        let index = self
            .attributes
            .iter()
            .position(|a| &a.namespace == namespace && a.local_name == local_name)?;
        Some(self.attributes.remove(index))
    }

    /// Check if attribute exists
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_named_item(name).is_some()
    }

    /// Get attribute names
    pub fn get_attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(Attr::name).collect()
    }

    /// Iterate over attributes
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }
}
