//! Element attribute and property API
//!
//! Attribute reads/writes on HTML elements fold the name to ASCII
//! lowercase; other namespaces match it exactly. Reflected properties
//! (`className`, `id`, `name`) read and write the backing attribute. Any
//! other property lands in the element's expando bag and never touches
//! the attribute map.

use std::borrow::Cow;

use crate::attributes::Attr;
use crate::classlist::{is_ascii_whitespace, DOMTokenList};
use crate::document::{validate_and_extract, validate_name};
use crate::node::{ElementData, Namespace, NodeType};
use crate::operations::{DomError, DomResult};
use crate::{Document, NodeId};

fn fold_name<'a>(elem: &ElementData, name: &'a str) -> Cow<'a, str> {
    if elem.is_html() && name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

fn validate_token(token: &str) -> DomResult<()> {
    if token.is_empty() {
        return Err(DomError::Syntax("empty token".to_string()));
    }
    if token.contains(is_ascii_whitespace) {
        return Err(DomError::InvalidCharacter(token.to_string()));
    }
    Ok(())
}

impl Document {
    /// Bookkeeping after an attribute write on `element`
    fn attribute_changed(&mut self, element: NodeId, is_id: bool, old: Option<&str>, new: Option<&str>) {
        self.touch();
        if is_id && self.is_connected(element) {
            if let Some(old) = old {
                self.ids.remove(old, element);
            }
            if let Some(new) = new {
                self.ids.insert(new, element);
            }
        }
        tracing::trace!("attributes of {} changed", element);
    }

    // ---- by qualified name ----

    /// `getAttribute`
    pub fn get_attribute(&self, element: NodeId, name: &str) -> DomResult<Option<&str>> {
        let elem = self.element(element)?;
        let name = fold_name(elem, name);
        Ok(elem.attrs.get_attribute(&name))
    }

    /// `setAttribute`; the name is validated and, on HTML elements, lowercased
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> DomResult<()> {
        validate_name(name)?;
        let elem = self.element_mut(element)?;
        let name = fold_name(elem, name).into_owned();
        let old = elem.attrs.set_attribute(&name, value);
        let is_id = elem.attrs.get_named_item(&name).is_some_and(Attr::is_id);
        self.attribute_changed(element, is_id, old.as_deref(), Some(value));
        Ok(())
    }

    /// `removeAttribute`; absent attributes are not an error
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> DomResult<()> {
        let elem = self.element_mut(element)?;
        let name = fold_name(elem, name).into_owned();
        if let Some(attr) = elem.attrs.remove_named_item(&name) {
            self.attribute_changed(element, attr.is_id(), Some(attr.value.as_str()), None);
        }
        Ok(())
    }

    /// `hasAttribute`
    pub fn has_attribute(&self, element: NodeId, name: &str) -> DomResult<bool> {
        Ok(self.get_attribute(element, name)?.is_some())
    }

    /// `toggleAttribute`; returns whether the attribute is now present
    pub fn toggle_attribute(&mut self, element: NodeId, name: &str, force: Option<bool>) -> DomResult<bool> {
        validate_name(name)?;
        let present = self.has_attribute(element, name)?;
        match (present, force) {
            (true, Some(true)) | (false, Some(false)) => Ok(present),
            (true, _) => {
                self.remove_attribute(element, name)?;
                Ok(false)
            }
            (false, _) => {
                self.set_attribute(element, name, "")?;
                Ok(true)
            }
        }
    }

    /// `getAttributeNames`, in insertion order
    pub fn get_attribute_names(&self, element: NodeId) -> DomResult<Vec<String>> {
        Ok(self.element(element)?.attrs.get_attribute_names())
    }

    /// `hasAttributes`
    pub fn has_attributes(&self, element: NodeId) -> DomResult<bool> {
        Ok(!self.element(element)?.attrs.is_empty())
    }

    // ---- namespaced ----

    /// `getAttributeNS`
    pub fn get_attribute_ns(&self, element: NodeId, namespace: Option<&str>, local_name: &str) -> DomResult<Option<&str>> {
        let ns = Namespace::from_option(namespace);
        Ok(self
            .element(element)?
            .attrs
            .get_named_item_ns(&ns, local_name)
            .map(|a| a.value.as_str()))
    }

    /// `setAttributeNS`
    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> DomResult<()> {
        let (ns, prefix, local) = validate_and_extract(namespace, qualified_name)?;
        let is_id = ns == Namespace::None && local == "id";
        let elem = self.element_mut(element)?;
        let old = elem.attrs.set_value_ns(ns, prefix, &local, value);
        self.attribute_changed(element, is_id, old.as_deref(), Some(value));
        Ok(())
    }

    /// `removeAttributeNS`
    pub fn remove_attribute_ns(&mut self, element: NodeId, namespace: Option<&str>, local_name: &str) -> DomResult<()> {
        let ns = Namespace::from_option(namespace);
        let elem = self.element_mut(element)?;
        if let Some(attr) = elem.attrs.remove_named_item_ns(&ns, local_name) {
            self.attribute_changed(element, attr.is_id(), Some(attr.value.as_str()), None);
        }
        Ok(())
    }

    /// `hasAttributeNS`
    pub fn has_attribute_ns(&self, element: NodeId, namespace: Option<&str>, local_name: &str) -> DomResult<bool> {
        Ok(self.get_attribute_ns(element, namespace, local_name)?.is_some())
    }

    // ---- attribute nodes ----

    /// `getAttributeNode` (a copy of the stored attribute)
    pub fn get_attribute_node(&self, element: NodeId, name: &str) -> DomResult<Option<Attr>> {
        let elem = self.element(element)?;
        let name = fold_name(elem, name);
        Ok(elem.attrs.get_named_item(&name).cloned())
    }

    /// `getAttributeNodeNS`
    pub fn get_attribute_node_ns(&self, element: NodeId, namespace: Option<&str>, local_name: &str) -> DomResult<Option<Attr>> {
        let ns = Namespace::from_option(namespace);
        Ok(self.element(element)?.attrs.get_named_item_ns(&ns, local_name).cloned())
    }

    /// `setAttributeNode`: replaces by (namespace, local name), returning
    /// the attribute it displaced
    pub fn set_attribute_node(&mut self, element: NodeId, attr: Attr) -> DomResult<Option<Attr>> {
        validate_name(&attr.local_name)?;
        let is_id = attr.is_id();
        let value = attr.value.clone();
        let elem = self.element_mut(element)?;
        let old = elem.attrs.set_named_item(attr);
        self.attribute_changed(element, is_id, old.as_ref().map(|a| a.value.as_str()), Some(value.as_str()));
        Ok(old)
    }

    /// `removeAttributeNode`; `NotFound` unless `attr` is on the element
    pub fn remove_attribute_node(&mut self, element: NodeId, attr: &Attr) -> DomResult<Attr> {
        let elem = self.element_mut(element)?;
        let present = elem
            .attrs
            .get_named_item_ns(&attr.namespace, &attr.local_name)
            .is_some_and(|a| a == attr);
        if !present {
            return Err(DomError::NotFound("attribute is not on this element"));
        }
        let removed = elem
            .attrs
            .remove_named_item_ns(&attr.namespace, &attr.local_name)
            .ok_or(DomError::NotFound("attribute is not on this element"))?;
        self.attribute_changed(element, removed.is_id(), Some(removed.value.as_str()), None);
        Ok(removed)
    }

    // ---- reflected properties ----

    /// `className`; trimmed of ASCII whitespace when the profile says so
    pub fn class_name(&self, element: NodeId) -> DomResult<String> {
        let raw = self.element(element)?.get_attr_local("class").unwrap_or("");
        Ok(if self.profile().trim_class_name {
            raw.trim_matches(is_ascii_whitespace).to_string()
        } else {
            raw.to_string()
        })
    }

    /// `className = value`: writes `class` verbatim
    pub fn set_class_name(&mut self, element: NodeId, value: &str) -> DomResult<()> {
        self.set_attribute(element, "class", value)
    }

    pub fn id(&self, element: NodeId) -> DomResult<String> {
        Ok(self.element(element)?.get_attr_local("id").unwrap_or("").to_string())
    }

    pub fn set_id(&mut self, element: NodeId, value: &str) -> DomResult<()> {
        self.set_attribute(element, "id", value)
    }

    pub fn name(&self, element: NodeId) -> DomResult<String> {
        Ok(self.element(element)?.get_attr_local("name").unwrap_or("").to_string())
    }

    pub fn set_name(&mut self, element: NodeId, value: &str) -> DomResult<()> {
        self.set_attribute(element, "name", value)
    }

    /// Read a script-visible property
    pub fn get_property(&self, element: NodeId, name: &str) -> DomResult<Option<String>> {
        match name {
            "className" => self.class_name(element).map(Some),
            "id" => self.id(element).map(Some),
            "name" => self.name(element).map(Some),
            _ => {
                let elem = self.element(element)?;
                if let Some(value) = elem.properties.get(name) {
                    return Ok(Some(value.clone()));
                }
                // event handlers set in markup show through until overwritten
                if name.len() > 2 && name.starts_with("on") {
                    return Ok(elem.get_attr_local(&name.to_ascii_lowercase()).map(str::to_string));
                }
                Ok(None)
            }
        }
    }

    /// Write a script-visible property. Reflected names write their
    /// attribute; everything else, event handlers included, is an expando.
    pub fn set_property(&mut self, element: NodeId, name: &str, value: &str) -> DomResult<()> {
        match name {
            "className" => self.set_class_name(element, value),
            "id" => self.set_id(element, value),
            "name" => self.set_name(element, value),
            _ => {
                self.element_mut(element)?
                    .properties
                    .insert(name.to_string(), value.to_string());
                Ok(())
            }
        }
    }

    /// `delete element[name]` for expandos; returns whether one existed
    pub fn remove_property(&mut self, element: NodeId, name: &str) -> DomResult<bool> {
        Ok(self.element_mut(element)?.properties.remove(name).is_some())
    }

    // ---- classList ----

    /// Snapshot of `classList`
    pub fn class_list(&self, element: NodeId) -> DomResult<DOMTokenList> {
        Ok(DOMTokenList::from_string(
            self.element(element)?.get_attr_local("class").unwrap_or(""),
        ))
    }

    /// Apply `f` to the class list and write the result back to `class`
    fn update_class_list<R>(&mut self, element: NodeId, f: impl FnOnce(&mut DOMTokenList) -> R) -> DomResult<R> {
        let had_class = self.element(element)?.get_attr_local("class").is_some();
        let mut list = self.class_list(element)?;
        let result = f(&mut list);
        if had_class || !list.is_empty() {
            self.set_attribute(element, "class", &list.value())?;
        }
        Ok(result)
    }

    pub fn class_list_contains(&self, element: NodeId, token: &str) -> DomResult<bool> {
        Ok(self.class_list(element)?.contains(token))
    }

    /// `classList.add`
    pub fn class_list_add(&mut self, element: NodeId, tokens: &[&str]) -> DomResult<()> {
        tokens.iter().try_for_each(|t| validate_token(t))?;
        self.update_class_list(element, |list| list.add(tokens))
    }

    /// `classList.remove`
    pub fn class_list_remove(&mut self, element: NodeId, tokens: &[&str]) -> DomResult<()> {
        tokens.iter().try_for_each(|t| validate_token(t))?;
        self.update_class_list(element, |list| list.remove(tokens))
    }

    /// `classList.toggle`; returns whether the token is now present
    pub fn class_list_toggle(&mut self, element: NodeId, token: &str, force: Option<bool>) -> DomResult<bool> {
        validate_token(token)?;
        self.update_class_list(element, |list| list.toggle(token, force))
    }

    /// `classList.replace`; returns whether `old` was present
    pub fn class_list_replace(&mut self, element: NodeId, old: &str, new: &str) -> DomResult<bool> {
        validate_token(old)?;
        validate_token(new)?;
        if !self.class_list_contains(element, old)? {
            return Ok(false);
        }
        self.update_class_list(element, |list| list.replace(old, new))
    }

    // ---- name facets ----

    /// `tagName`
    pub fn tag_name(&self, element: NodeId) -> DomResult<String> {
        Ok(self.element(element)?.tag_name())
    }

    /// `localName`
    pub fn local_name(&self, element: NodeId) -> DomResult<&str> {
        Ok(self.element(element)?.local_name())
    }

    /// `namespaceURI`
    pub fn namespace_uri(&self, element: NodeId) -> DomResult<Option<&str>> {
        Ok(self.element(element)?.namespace_uri())
    }

    /// `prefix`
    pub fn prefix(&self, element: NodeId) -> DomResult<Option<&str>> {
        Ok(self.element(element)?.prefix())
    }

    /// `nodeType`
    pub fn node_type(&self, node: NodeId) -> DomResult<NodeType> {
        self.tree()
            .get(node)
            .map(|n| n.node_type())
            .ok_or(DomError::InvalidNode(node))
    }
}
