//! Script connection hook
//!
//! A `<script>` element runs once, when it first becomes connected to the
//! document. The DOM crate only decides *when* and *in which scope*; the
//! installed [`ScriptHost`] does the running.

use std::collections::VecDeque;
use std::fmt;

use crate::{Document, NodeId};

/// Where a script element came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOrigin {
    /// Initial document parse
    Parser,
    /// Fragment parsing (innerHTML, outerHTML, insertAdjacentHTML)
    Markup,
    /// Built with `create_element`
    Node,
}

impl ScriptOrigin {
    /// Scope a script of this origin runs in
    pub fn scope(self) -> ScriptScope {
        match self {
            Self::Markup => ScriptScope::Isolated,
            Self::Parser | Self::Node => ScriptScope::Global,
        }
    }
}

/// Declaration visibility of an executed script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptScope {
    /// Declarations become globals visible to later callers
    Global,
    /// Declarations stay local to the script
    Isolated,
}

/// Per-element execution bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptState {
    pub origin: ScriptOrigin,
    pub already_started: bool,
}

impl ScriptState {
    pub fn new(origin: ScriptOrigin) -> Self {
        Self {
            origin,
            already_started: false,
        }
    }
}

/// A script queued for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingScript {
    /// Originating element; `None` for caller-supplied source
    pub element: Option<NodeId>,
    pub source: String,
    pub scope: ScriptScope,
}

/// Script errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("script error: {0}")]
    Runtime(String),

    #[error("no script host installed")]
    NoHost,
}

/// Executes script source on behalf of a document
pub trait ScriptHost {
    /// Run `script`. The host may mutate `document` re-entrantly.
    fn execute(&mut self, document: &mut Document, script: &PendingScript) -> Result<(), ScriptError>;
}

impl<F> ScriptHost for F
where
    F: FnMut(&mut Document, &PendingScript) -> Result<(), ScriptError>,
{
    fn execute(&mut self, document: &mut Document, script: &PendingScript) -> Result<(), ScriptError> {
        self(document, script)
    }
}

/// Whether a `type` attribute value denotes classic JavaScript
pub(crate) fn is_javascript_type(type_attr: Option<&str>) -> bool {
    let Some(value) = type_attr else {
        return true;
    };
    let value = value.trim_matches(crate::classlist::is_ascii_whitespace);
    if value.is_empty() {
        return true;
    }
    const JS_TYPES: &[&str] = &[
        "text/javascript",
        "application/javascript",
        "application/ecmascript",
        "application/x-javascript",
        "text/ecmascript",
        "text/jscript",
    ];
    JS_TYPES.iter().any(|t| value.eq_ignore_ascii_case(t))
}

/// Queue plus the host slot. The host is taken out while it runs so it can
/// receive `&mut Document`.
#[derive(Default)]
pub(crate) struct ScriptScheduler {
    pub(crate) host: Option<Box<dyn ScriptHost>>,
    pub(crate) pending: VecDeque<PendingScript>,
    pub(crate) draining: bool,
}

impl ScriptScheduler {
    /// A host is installed or currently running
    pub(crate) fn is_active(&self) -> bool {
        self.host.is_some() || self.draining
    }
}

impl fmt::Debug for ScriptScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptScheduler")
            .field("host", &self.host.is_some())
            .field("pending", &self.pending.len())
            .field("draining", &self.draining)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_scope() {
        assert_eq!(ScriptOrigin::Markup.scope(), ScriptScope::Isolated);
        assert_eq!(ScriptOrigin::Node.scope(), ScriptScope::Global);
        assert_eq!(ScriptOrigin::Parser.scope(), ScriptScope::Global);
    }

    #[test]
    fn test_javascript_types() {
        assert!(is_javascript_type(None));
        assert!(is_javascript_type(Some("")));
        assert!(is_javascript_type(Some(" Text/JavaScript ")));
        assert!(!is_javascript_type(Some("text/template")));
        assert!(!is_javascript_type(Some("module")));
    }
}
