//! Markup mutators
//!
//! `innerHTML`, `outerHTML` and `insertAdjacentHTML` on top of the
//! fragment parser and the document's mutation primitives. Everything
//! inserted here goes through `append_child`/`insert_before`/`replace_child`,
//! so live collections, the id index and script execution follow along.

use lumen_dom::{
    AdjacentPosition, DetachedPolicy, Document, DomError, NodeData, NodeId, NodeOperations,
    QualName,
};

use crate::parser::{parse_fragment, parse_fragment_in};
use crate::serializer::HtmlSerializer;
use crate::HtmlError;

/// Tags whose own `outerHTML` cannot be replaced
const OUTER_HTML_READ_ONLY: &[&str] = &[
    "body", "caption", "col", "colgroup", "head", "html", "tbody", "td", "tfoot", "th", "thead",
    "tr",
];

/// Markup-based reads and writes on a [`Document`]
pub trait MarkupExt {
    /// Serialized children of `node`
    fn inner_html(&self, node: NodeId) -> Result<String, HtmlError>;

    /// Serialized `node` including itself
    fn outer_html(&self, node: NodeId) -> Result<String, HtmlError>;

    /// Replace the children of `node` with parsed `markup`
    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), HtmlError>;

    /// Replace `node` itself with parsed `markup`
    fn set_outer_html(&mut self, node: NodeId, markup: &str) -> Result<(), HtmlError>;

    /// Parse `markup` and insert it at `position` relative to `node`
    fn insert_adjacent_html(&mut self, node: NodeId, position: &str, markup: &str) -> Result<(), HtmlError>;
}

impl MarkupExt for Document {
    fn inner_html(&self, node: NodeId) -> Result<String, HtmlError> {
        self.tree().get(node).ok_or(DomError::InvalidNode(node))?;
        Ok(HtmlSerializer::new().serialize_inner(self.tree(), node))
    }

    fn outer_html(&self, node: NodeId) -> Result<String, HtmlError> {
        self.tree().get(node).ok_or(DomError::InvalidNode(node))?;
        Ok(HtmlSerializer::new().serialize_outer(self.tree(), node))
    }

    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), HtmlError> {
        let target = self.tree().get(node).ok_or(DomError::InvalidNode(node))?;
        if !matches!(target.data(), NodeData::Element(_) | NodeData::Fragment) {
            return Err(DomError::WrongNodeType(node).into());
        }
        tracing::debug!("innerHTML set on {}", node);

        let fragment = parse_fragment(self, markup, node)?;
        self.remove_all_children(node)?;
        self.append_child(node, fragment)?;
        Ok(())
    }

    fn set_outer_html(&mut self, node: NodeId, markup: &str) -> Result<(), HtmlError> {
        let element = self.element(node)?;
        if element.is_html() && OUTER_HTML_READ_ONLY.contains(&element.local_name()) {
            return Err(DomError::NoModificationAllowed(format!(
                "outerHTML of <{}> is read-only",
                element.local_name()
            ))
            .into());
        }

        let Some(parent) = self.parent_node(node) else {
            return match self.profile().detached_outer_html {
                DetachedPolicy::Ignore => {
                    tracing::warn!("outerHTML set on parentless {} ignored", node);
                    Ok(())
                }
                DetachedPolicy::Error => Err(DomError::InvalidState("element has no parent").into()),
            };
        };
        if parent == NodeId::ROOT {
            return Err(DomError::NoModificationAllowed(
                "cannot replace the document element".to_string(),
            )
            .into());
        }
        tracing::debug!("outerHTML set on {}", node);

        let fragment = parse_fragment(self, markup, parent)?;
        self.replace_child(parent, fragment, node)?;
        if self.profile().outer_html_clears_replaced {
            self.remove_all_children(node)?;
        }
        Ok(())
    }

    fn insert_adjacent_html(&mut self, node: NodeId, position: &str, markup: &str) -> Result<(), HtmlError> {
        let position: AdjacentPosition = position.parse()?;
        let Some((parent, reference)) = self.adjacent_insertion_point(node, position)? else {
            return Ok(());
        };
        tracing::debug!("insertAdjacentHTML {:?} on {}", position, node);

        let context = if position.needs_parent() { parent } else { node };
        let context_name = match self.tree().get(context).map(|n| n.data()) {
            Some(NodeData::Element(elem)) if !elem.is_html_named("html") => elem.name().clone(),
            _ => QualName::html("body"),
        };
        let fragment = parse_fragment_in(self, markup, &context_name)?;
        self.insert_before(parent, fragment, reference)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_dom::BrowserProfile;

    fn doc_with(markup: &str) -> (Document, NodeId) {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        doc.set_inner_html(body, markup).unwrap();
        (doc, body)
    }

    #[test]
    fn test_inner_html_round_trip() {
        let (doc, body) = doc_with("<p class=a>x<br/>y</p>");
        assert_eq!(doc.inner_html(body).unwrap(), "<p class=\"a\">x<br>y</p>");
    }

    #[test]
    fn test_outer_html_replaces() {
        let (mut doc, body) = doc_with("<div id='old'><span>kept</span></div>");
        let old = doc.get_element_by_id("old").unwrap();
        doc.set_outer_html(old, "<p id='new'>a</p><p>b</p>").unwrap();

        assert_eq!(doc.inner_html(body).unwrap(), "<p id=\"new\">a</p><p>b</p>");
        assert_eq!(doc.get_element_by_id("old"), None);
        assert!(doc.get_element_by_id("new").is_some());
        // the replaced element keeps its children under the modern profile
        assert_eq!(doc.inner_html(old).unwrap(), "<span>kept</span>");
    }

    #[test]
    fn test_outer_html_clears_replaced_under_legacy() {
        let (mut doc, _) = doc_with("<div id='old'><span>gone</span></div>");
        doc.set_profile(BrowserProfile::legacy());
        let old = doc.get_element_by_id("old").unwrap();
        doc.set_outer_html(old, "<p></p>").unwrap();
        assert_eq!(doc.inner_html(old).unwrap(), "");
    }

    #[test]
    fn test_outer_html_read_only_tags() {
        let (mut doc, _) = doc_with("<table><tbody id='tb'><tr><td>1</td></tr></tbody></table>");
        let tbody = doc.get_element_by_id("tb").unwrap();
        let err = doc.set_outer_html(tbody, "test").unwrap_err();
        assert!(matches!(err, HtmlError::Dom(DomError::NoModificationAllowed(_))));
    }

    #[test]
    fn test_outer_html_detached_policy() {
        let mut doc = Document::new("about:blank");
        let div = doc.create_element("div").unwrap();
        doc.set_outer_html(div, "<p></p>").unwrap();

        doc.set_profile(BrowserProfile::legacy());
        let err = doc.set_outer_html(div, "<p></p>").unwrap_err();
        assert_eq!(err, HtmlError::Dom(DomError::InvalidState("element has no parent")));
    }

    #[test]
    fn test_insert_adjacent_positions() {
        let (mut doc, body) = doc_with("<div id='t'>mid</div>");
        let target = doc.get_element_by_id("t").unwrap();
        doc.insert_adjacent_html(target, "beforebegin", "<i>1</i>").unwrap();
        doc.insert_adjacent_html(target, "afterbegin", "<i>2</i>").unwrap();
        doc.insert_adjacent_html(target, "beforeend", "<i>3</i>").unwrap();
        doc.insert_adjacent_html(target, "afterend", "<i>4</i>").unwrap();

        assert_eq!(
            doc.inner_html(body).unwrap(),
            "<i>1</i><div id=\"t\"><i>2</i>mid<i>3</i></div><i>4</i>"
        );
    }

    #[test]
    fn test_insert_adjacent_bad_position() {
        let (mut doc, body) = doc_with("");
        let err = doc.insert_adjacent_html(body, "inside", "x").unwrap_err();
        assert!(matches!(err, HtmlError::Dom(DomError::Syntax(_))));
    }

    #[test]
    fn test_insert_adjacent_next_to_document_element() {
        let mut doc = Document::new("about:blank");
        let html = doc.document_element().unwrap();
        let err = doc.insert_adjacent_html(html, "afterend", "<p></p>").unwrap_err();
        assert!(matches!(err, HtmlError::Dom(DomError::NoModificationAllowed(_))));
    }

    #[test]
    fn test_set_inner_html_on_text_rejected() {
        let mut doc = Document::new("about:blank");
        let text = doc.create_text_node("t");
        let err = doc.set_inner_html(text, "<b></b>").unwrap_err();
        assert_eq!(err, HtmlError::Dom(DomError::WrongNodeType(text)));
    }
}
