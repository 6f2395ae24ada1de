//! Browser profile
//!
//! Policies that differ between browser families. Everything that the
//! engine must not hard-code one way lives here.

use serde::{Deserialize, Serialize};

use crate::document::QuirksMode;

/// Does `getElementsByName("")` match elements with an empty `name`?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyNameMatching {
    Never,
    Always,
    /// Only when the document is in quirks mode
    QuirksOnly,
}

/// What to do when an operation needs a parent the node does not have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetachedPolicy {
    /// Silently do nothing
    Ignore,
    /// Fail with an error
    Error,
}

/// How `<div/>` on a non-void element is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelfClosingPolicy {
    /// Explicit empty element, siblings are not swallowed
    Xhtml,
    /// Self-closing flag ignored, element stays open
    Html5,
}

/// Browser-divergent behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserProfile {
    /// Profile name, for logs
    pub name: String,
    pub empty_name_matching: EmptyNameMatching,
    /// `beforebegin`/`afterend` insertion on a parentless node
    pub detached_adjacent: DetachedPolicy,
    /// `outerHTML` assignment on a parentless node
    pub detached_outer_html: DetachedPolicy,
    /// Whether the node replaced through `outerHTML` loses its children
    pub outer_html_clears_replaced: bool,
    pub self_closing: SelfClosingPolicy,
    /// `className` getter trims leading/trailing ASCII whitespace
    pub trim_class_name: bool,
}

impl BrowserProfile {
    /// Current evergreen behaviour
    pub fn modern() -> Self {
        Self {
            name: "modern".to_string(),
            empty_name_matching: EmptyNameMatching::Never,
            detached_adjacent: DetachedPolicy::Error,
            detached_outer_html: DetachedPolicy::Ignore,
            outer_html_clears_replaced: false,
            self_closing: SelfClosingPolicy::Xhtml,
            trim_class_name: true,
        }
    }

    /// Older engines: permissive empty names, silent no-ops, HTML5 self-closing
    pub fn legacy() -> Self {
        Self {
            name: "legacy".to_string(),
            empty_name_matching: EmptyNameMatching::QuirksOnly,
            detached_adjacent: DetachedPolicy::Ignore,
            detached_outer_html: DetachedPolicy::Error,
            outer_html_clears_replaced: true,
            self_closing: SelfClosingPolicy::Html5,
            trim_class_name: false,
        }
    }

    /// Resolve the empty-name policy against a document mode
    pub fn matches_empty_name(&self, mode: QuirksMode) -> bool {
        match self.empty_name_matching {
            EmptyNameMatching::Never => false,
            EmptyNameMatching::Always => true,
            EmptyNameMatching::QuirksOnly => mode == QuirksMode::Quirks,
        }
    }
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self::modern()
    }
}
