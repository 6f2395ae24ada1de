//! Lumen HTML Parser
//!
//! HTML5 document and fragment parsing built on html5ever, plus the
//! serializer and the markup-based mutators (`innerHTML`, `outerHTML`,
//! `insertAdjacentHTML`).

mod doctype;
mod markup;
mod parser;
mod self_closing;
mod serializer;

pub use doctype::{ClassifyDoctype, DoctypeToken, StandardClassifier};
pub use markup::MarkupExt;
pub use parser::{parse_fragment, HtmlParser};
pub use self_closing::expand_self_closing;
pub use serializer::{get_inner_html, get_outer_html, HtmlSerializer};

pub use lumen_dom::{Document, DomError, NodeId};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// HTML layer errors. Markup itself never fails to parse; errors come
/// from the tree operations the markup feeds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HtmlError {
    #[error(transparent)]
    Dom(#[from] DomError),
}
