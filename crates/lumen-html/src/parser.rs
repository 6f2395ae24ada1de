//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts the result into a [`Document`].
//! Documents are built detached and connected in one step, so scripts
//! found by the parser run against the complete tree.

use std::borrow::Cow;

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::QuirksMode as TreeBuilderQuirks;
use html5ever::{LocalName, Namespace as HtmlNamespace, ParseOpts};
use lumen_dom::{
    Attr, BrowserProfile, Document, DomError, Namespace, NodeData, NodeId, NodeOperations,
    QualName, QuirksMode, ScriptOrigin, SelfClosingPolicy,
};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::doctype::{ClassifyDoctype, DoctypeToken, StandardClassifier};
use crate::self_closing::expand_self_closing;
use crate::HtmlError;

/// HTML5 parser
pub struct HtmlParser {
    profile: BrowserProfile,
    classifier: Box<dyn ClassifyDoctype>,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            profile: BrowserProfile::default(),
            classifier: Box::new(StandardClassifier),
        }
    }

    /// Profile given to the documents this parser creates
    pub fn with_profile(mut self, profile: BrowserProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Replace the doctype classifier
    pub fn with_classifier(mut self, classifier: impl ClassifyDoctype + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, HtmlError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, HtmlError> {
        let mut document = Document::empty(url).with_profile(self.profile.clone());
        self.load(&mut document, html)?;
        Ok(document)
    }

    /// Replace the whole content of `document` with the parsed `html`.
    /// A script host installed on the document sees parser-inserted
    /// scripts run once the new tree is connected.
    ///
    /// The classifier decides the document mode, and the tree is built in
    /// that mode: when html5ever's own doctype heuristics disagree, the
    /// markup is parsed again with the classifier's mode forced.
    pub fn load(&self, document: &mut Document, html: &str) -> Result<(), HtmlError> {
        tracing::debug!("Parsing HTML document: {}", document.url());

        let markup = prepare(document.profile(), html);
        let dom = html5ever::parse_document(RcDom::default(), ParseOpts::default())
            .one(StrTendril::from(markup.as_ref()));

        let top_level: Vec<Handle> = dom.document.children.borrow().iter().cloned().collect();
        let doctype = top_level.iter().enumerate().find_map(|(index, handle)| match &handle.data {
            RcNodeData::Doctype { name, public_id, system_id } => {
                Some((index, DoctypeToken::new(name, public_id, system_id)))
            }
            _ => None,
        });
        let mode = self.classifier.classify(doctype.as_ref().map(|(_, token)| token));
        tracing::debug!("Document mode {:?}", mode);

        let top_level = if dom.quirks_mode.get() == tree_builder_mode(mode) {
            top_level
        } else {
            tracing::debug!("Rebuilding tree in {:?} mode", mode);
            let forced = parse_in_mode(&markup, mode);
            let mut nodes: Vec<Handle> = forced.document.children.borrow().iter().cloned().collect();
            // the doctype was cut from the markup; put it back where it stood
            if let Some((index, _)) = doctype {
                nodes.insert(index.min(nodes.len()), top_level[index].clone());
            }
            nodes
        };

        document.remove_all_children(NodeId::ROOT)?;
        document.set_quirks_mode(mode);

        for handle in &top_level {
            if let Some(node) = convert_node(document, handle, ScriptOrigin::Parser)? {
                document.append_child(NodeId::ROOT, node)?;
            }
        }

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(())
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the profile's self-closing policy to raw markup
fn prepare<'a>(profile: &BrowserProfile, markup: &'a str) -> Cow<'a, str> {
    match profile.self_closing {
        SelfClosingPolicy::Xhtml => expand_self_closing(markup),
        SelfClosingPolicy::Html5 => Cow::Borrowed(markup),
    }
}

/// html5ever's mode for a document mode
fn tree_builder_mode(mode: QuirksMode) -> TreeBuilderQuirks {
    match mode {
        QuirksMode::Quirks => TreeBuilderQuirks::Quirks,
        QuirksMode::LimitedQuirks => TreeBuilderQuirks::LimitedQuirks,
        QuirksMode::NoQuirks => TreeBuilderQuirks::NoQuirks,
    }
}

/// Tree builder options that start, and stay, in `mode`
fn opts_in_mode(mode: QuirksMode) -> ParseOpts {
    let mut opts = ParseOpts::default();
    opts.tree_builder.quirks_mode = tree_builder_mode(mode);
    opts
}

/// Build a document tree in `mode` regardless of the doctype. The doctype
/// is cut from the markup, and `iframe_srcdoc` stops a missing doctype
/// from switching the builder to quirks.
fn parse_in_mode(markup: &str, mode: QuirksMode) -> RcDom {
    let mut opts = opts_in_mode(mode);
    opts.tree_builder.iframe_srcdoc = true;
    let markup = strip_doctype(markup);
    html5ever::parse_document(RcDom::default(), opts).one(StrTendril::from(markup.as_ref()))
}

/// Remove a leading `<!DOCTYPE ...>`, looking past a BOM, whitespace and
/// comments the way the initial insertion mode does
fn strip_doctype(markup: &str) -> Cow<'_, str> {
    let mut pos = 0;
    let bytes = markup.as_bytes();
    if markup.starts_with('\u{feff}') {
        pos = '\u{feff}'.len_utf8();
    }
    loop {
        while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t' | b'\n' | b'\x0C' | b'\r') {
            pos += 1;
        }
        let rest = &markup[pos..];
        if rest.starts_with("<!--") {
            match rest[4..].find("-->") {
                Some(end) => pos += 4 + end + 3,
                None => return Cow::Borrowed(markup),
            }
            continue;
        }
        let is_doctype = rest
            .get(..9)
            .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
        if !is_doctype {
            return Cow::Borrowed(markup);
        }
        let end = rest.find('>').map_or(markup.len(), |gt| pos + gt + 1);
        let mut out = String::with_capacity(markup.len());
        out.push_str(&markup[..pos]);
        out.push_str(&markup[end..]);
        return Cow::Owned(out);
    }
}

/// Parse `markup` as the children of `context` and return a detached
/// document fragment holding the result. Scripts inside are marked as
/// markup-inserted.
pub fn parse_fragment(document: &mut Document, markup: &str, context: NodeId) -> Result<NodeId, HtmlError> {
    let context_node = document.tree().get(context).ok_or(DomError::InvalidNode(context))?;
    let context_name = match context_node.data() {
        NodeData::Element(elem) => elem.name().clone(),
        _ => QualName::html("body"),
    };
    parse_fragment_in(document, markup, &context_name)
}

/// Fragment parsing against an explicit context element name
pub(crate) fn parse_fragment_in(
    document: &mut Document,
    markup: &str,
    context_name: &QualName,
) -> Result<NodeId, HtmlError> {
    tracing::debug!("Parsing fragment in <{}> context", context_name);

    let html_name = html5ever::QualName::new(
        None,
        HtmlNamespace::from(context_name.ns.uri().unwrap_or_default()),
        LocalName::from(context_name.local.as_str()),
    );
    let markup = prepare(document.profile(), markup);
    // fragments are built in the mode of the document they land in
    let opts = opts_in_mode(document.quirks_mode());
    let dom = html5ever::parse_fragment(RcDom::default(), opts, html_name, Vec::new(), true)
        .one(StrTendril::from(markup.as_ref()));

    let fragment = document.create_document_fragment();
    // document -> synthetic <html> -> fragment content
    let root = dom.document.children.borrow().first().cloned();
    if let Some(root) = root {
        for child in root.children.borrow().iter() {
            if let Some(node) = convert_node(document, child, ScriptOrigin::Markup)? {
                document.append_child(fragment, node)?;
            }
        }
    }
    Ok(fragment)
}

/// Convert an RcDom node into a detached subtree of `document`
fn convert_node(document: &mut Document, handle: &Handle, origin: ScriptOrigin) -> Result<Option<NodeId>, HtmlError> {
    let id = match &handle.data {
        RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => return Ok(None),
        RcNodeData::Doctype { name, public_id, system_id } => {
            return Ok(Some(document.create_doctype(name, public_id, system_id)));
        }
        RcNodeData::Text { contents } => {
            return Ok(Some(document.create_text_node(&contents.borrow())));
        }
        RcNodeData::Comment { contents } => {
            return Ok(Some(document.create_comment(contents)));
        }
        RcNodeData::Element { name, attrs, template_contents, .. } => {
            let qname = QualName::new(
                Namespace::from_uri(&name.ns),
                name.prefix.as_ref().map(|p| p.to_string()),
                name.local.to_string(),
            );
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| {
                    Attr::with_ns(
                        Namespace::from_uri(&attr.name.ns),
                        attr.name.prefix.as_ref().map(|p| p.to_string()),
                        attr.name.local.to_string(),
                        attr.value.to_string(),
                    )
                })
                .collect();
            let id = document.create_parsed_element(qname, attrs, origin);

            // template contents become ordinary children
            if let Some(contents) = template_contents.borrow().as_ref() {
                convert_children(document, contents, id, origin)?;
            }
            id
        }
    };
    convert_children(document, handle, id, origin)?;
    Ok(Some(id))
}

fn convert_children(document: &mut Document, handle: &Handle, parent: NodeId, origin: ScriptOrigin) -> Result<(), HtmlError> {
    for child in handle.children.borrow().iter() {
        if let Some(node) = convert_node(document, child, origin)? {
            document.append_child(parent, node)?;
        }
    }
    Ok(())
}
