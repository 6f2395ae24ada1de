//! Live collection tests for lumen-dom
//!
//! Collections are obtained once and read again after each mutation,
//! without calling the accessor a second time.

use lumen_dom::{
    AllNamedItem, Attr, BrowserProfile, Document, EmptyNameMatching, Namespace, NodeId,
    NodeOperations, QualName, QuirksMode, ScriptOrigin,
};

fn img(doc: &mut Document, name: &str) -> NodeId {
    let img = doc.create_element("img").unwrap();
    doc.set_attribute(img, "name", name).unwrap();
    img
}

fn body(doc: &Document) -> NodeId {
    doc.body().unwrap()
}

// ============================================================================
// LIVENESS
// ============================================================================

#[test]
fn test_by_name_append_child() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let first = img(&mut doc, "image1");
    doc.append_child(body, first).unwrap();

    let images = doc.get_elements_by_name(NodeId::ROOT, "image1");
    assert_eq!(images.length(&doc), 1);

    let second = img(&mut doc, "image1");
    doc.append_child(body, second).unwrap();
    assert_eq!(images.length(&doc), 2);
    assert_eq!(images.item(&doc, 1), Some(second));
}

#[test]
fn test_by_name_each_mutation_kind() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let anchor = doc.create_element("div").unwrap();
    doc.append_child(body, anchor).unwrap();
    let images = doc.get_elements_by_name(NodeId::ROOT, "image1");
    assert_eq!(images.length(&doc), 0);

    let a = img(&mut doc, "image1");
    doc.insert_before(body, a, Some(anchor)).unwrap();
    assert_eq!(images.length(&doc), 1);

    let b = img(&mut doc, "image1");
    let placeholder = doc.create_element("span").unwrap();
    doc.append_child(body, placeholder).unwrap();
    doc.replace_child(body, b, placeholder).unwrap();
    assert_eq!(images.length(&doc), 2);

    let c = doc.create_element("img").unwrap();
    doc.append_child(body, c).unwrap();
    doc.set_attribute(c, "name", "image1").unwrap();
    assert_eq!(images.length(&doc), 3);

    let d = doc.create_element("img").unwrap();
    doc.append_child(body, d).unwrap();
    doc.set_attribute_node(d, Attr::new("name", "image1")).unwrap();
    assert_eq!(images.length(&doc), 4);

    let e = doc.create_element("img").unwrap();
    doc.append_child(body, e).unwrap();
    doc.set_attribute_ns(e, None, "name", "image1").unwrap();
    assert_eq!(images.length(&doc), 5);

    let f = doc.create_element("img").unwrap();
    doc.append_child(body, f).unwrap();
    doc.set_name(f, "image1").unwrap();
    assert_eq!(images.length(&doc), 6);

    doc.remove_child(body, a).unwrap();
    doc.set_attribute(b, "name", "other").unwrap();
    assert_eq!(images.length(&doc), 4);
    assert_eq!(
        images.length(&doc),
        doc.get_elements_by_name(NodeId::ROOT, "image1").length(&doc)
    );
}

#[test]
fn test_mutation_inside_iteration() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    for _ in 0..4 {
        let p = doc.create_element("p").unwrap();
        doc.append_child(body, p).unwrap();
    }
    let paragraphs = doc.get_elements_by_tag_name(NodeId::ROOT, "p");

    // removing while walking: re-read length every step
    while paragraphs.length(&doc) > 0 {
        let Some(first) = paragraphs.item(&doc, 0) else { break };
        doc.remove_child(body, first).unwrap();
    }
    assert_eq!(paragraphs.length(&doc), 0);
}

#[test]
fn test_element_root_excludes_root_itself() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let outer = doc.create_element("div").unwrap();
    let inner = doc.create_element("div").unwrap();
    doc.append_child(outer, inner).unwrap();
    doc.append_child(body, outer).unwrap();

    let under_outer = doc.get_elements_by_tag_name(outer, "div");
    assert_eq!(under_outer.to_vec(&doc), vec![inner]);
    let all = doc.get_elements_by_tag_name(NodeId::ROOT, "div");
    assert_eq!(all.to_vec(&doc), vec![outer, inner]);
}

#[test]
fn test_element_children_collection() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let kids = doc.element_children(body);
    let text = doc.create_text_node("t");
    doc.append_child(body, text).unwrap();
    assert_eq!(kids.length(&doc), 0);

    let p = doc.create_element("p").unwrap();
    doc.append_child(body, p).unwrap();
    assert_eq!(kids.to_vec(&doc), vec![p]);
}

// ============================================================================
// IDENTITY
// ============================================================================

#[test]
fn test_same_query_same_collection() {
    let doc = Document::new("about:blank");
    let body = body(&doc);

    let a = doc.get_elements_by_tag_name(NodeId::ROOT, "*");
    let b = doc.get_elements_by_tag_name(NodeId::ROOT, "*");
    assert_eq!(a, b);

    assert_ne!(
        doc.get_elements_by_tag_name(NodeId::ROOT, "script"),
        doc.get_elements_by_tag_name(body, "script")
    );
    assert_ne!(
        doc.get_elements_by_tag_name(NodeId::ROOT, "script"),
        doc.get_elements_by_tag_name(NodeId::ROOT, "div")
    );
    assert_ne!(
        doc.get_elements_by_tag_name(NodeId::ROOT, "div"),
        doc.get_elements_by_class_name(NodeId::ROOT, "div")
    );
}

// ============================================================================
// MATCHING RULES
// ============================================================================

#[test]
fn test_tag_name_case_rules() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let div = doc.create_element("div").unwrap();
    let colon = doc.create_parsed_element(QualName::html("ns1:ele"), Vec::new(), ScriptOrigin::Parser);
    let svg = doc.create_element_ns(Some(Namespace::SVG_URI), "linearGradient").unwrap();
    for node in [div, colon, svg] {
        doc.append_child(body, node).unwrap();
    }

    assert_eq!(doc.get_elements_by_tag_name(NodeId::ROOT, "DIV").to_vec(&doc), vec![div]);
    assert_eq!(doc.get_elements_by_tag_name(NodeId::ROOT, "ns1:ele").to_vec(&doc), vec![colon]);
    assert_eq!(doc.get_elements_by_tag_name(NodeId::ROOT, "ele").length(&doc), 0);
    assert_eq!(doc.get_elements_by_tag_name(NodeId::ROOT, "linearGradient").to_vec(&doc), vec![svg]);
    assert_eq!(doc.get_elements_by_tag_name(NodeId::ROOT, "lineargradient").length(&doc), 0);
}

#[test]
fn test_tag_name_ns_wildcards() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let svg = doc.create_element_ns(Some(Namespace::SVG_URI), "svg").unwrap();
    let rect = doc.create_element_ns(Some(Namespace::SVG_URI), "rect").unwrap();
    doc.append_child(svg, rect).unwrap();
    doc.append_child(body, svg).unwrap();

    let in_svg = doc.get_elements_by_tag_name_ns(NodeId::ROOT, Some(Namespace::SVG_URI), "*");
    assert_eq!(in_svg.to_vec(&doc), vec![svg, rect]);
    let any_rect = doc.get_elements_by_tag_name_ns(NodeId::ROOT, Some("*"), "rect");
    assert_eq!(any_rect.to_vec(&doc), vec![rect]);
    let html_rect = doc.get_elements_by_tag_name_ns(NodeId::ROOT, Some(Namespace::HTML_URI), "rect");
    assert_eq!(html_rect.length(&doc), 0);
}

#[test]
fn test_class_names_and_semantics() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let mut nodes = Vec::new();
    for class in ["foo", "red", "foo red", "red\tfoo extra", "FOO RED"] {
        let el = doc.create_element("span").unwrap();
        doc.set_attribute(el, "class", class).unwrap();
        doc.append_child(body, el).unwrap();
        nodes.push(el);
    }

    let both = doc.get_elements_by_class_name(NodeId::ROOT, " red  foo ");
    assert_eq!(both.to_vec(&doc), vec![nodes[2], nodes[3]]);

    doc.set_quirks_mode(QuirksMode::Quirks);
    assert_eq!(both.to_vec(&doc), vec![nodes[2], nodes[3], nodes[4]]);
}

#[test]
fn test_empty_name_policy() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let empty = img(&mut doc, "");
    doc.append_child(body, empty).unwrap();

    let by_empty = doc.get_elements_by_name(NodeId::ROOT, "");
    assert_eq!(by_empty.length(&doc), 0);

    let mut profile = BrowserProfile::modern();
    profile.empty_name_matching = EmptyNameMatching::QuirksOnly;
    doc.set_profile(profile);
    assert_eq!(by_empty.length(&doc), 0);
    doc.set_quirks_mode(QuirksMode::Quirks);
    assert_eq!(by_empty.to_vec(&doc), vec![empty]);
}

#[test]
fn test_by_name_ignores_foreign_elements() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let svg = doc.create_element_ns(Some(Namespace::SVG_URI), "svg").unwrap();
    doc.set_attribute(svg, "name", "x").unwrap();
    doc.append_child(body, svg).unwrap();
    assert_eq!(doc.get_elements_by_name(NodeId::ROOT, "x").length(&doc), 0);
}

#[test]
fn test_named_item() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let named = img(&mut doc, "pic");
    let with_id = doc.create_element("img").unwrap();
    doc.set_id(with_id, "pic").unwrap();
    doc.append_child(body, named).unwrap();
    doc.append_child(body, with_id).unwrap();

    let images = doc.get_elements_by_tag_name(NodeId::ROOT, "img");
    assert_eq!(images.named_item(&doc, "pic"), Some(with_id));
    assert_eq!(images.named_item(&doc, ""), None);
}

#[test]
fn test_document_all_named_item() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let first = doc.create_element("div").unwrap();
    doc.set_id(first, "Item").unwrap();
    doc.append_child(body, first).unwrap();

    assert_eq!(doc.all_named_item("Item"), Some(AllNamedItem::Element(first)));
    assert_eq!(doc.all_named_item("missing"), None);

    let second = doc.create_element("div").unwrap();
    doc.set_id(second, "Item").unwrap();
    doc.append_child(body, second).unwrap();
    match doc.all_named_item("Item") {
        Some(AllNamedItem::Collection(items)) => {
            assert_eq!(items.to_vec(&doc), vec![first, second]);
        }
        other => panic!("expected a collection, got {other:?}"),
    }
}

// ============================================================================
// STATIC LISTS
// ============================================================================

#[test]
fn test_query_selector_all_is_static() {
    let mut doc = Document::new("about:blank");
    let body = body(&doc);
    let p = doc.create_element("p").unwrap();
    doc.append_child(body, p).unwrap();

    let snapshot = doc.query_selector_all(NodeId::ROOT, "p").unwrap();
    let live = doc.get_elements_by_tag_name(NodeId::ROOT, "p");
    let q = doc.create_element("p").unwrap();
    doc.append_child(body, q).unwrap();

    assert_eq!(snapshot.length(), 1);
    assert_eq!(live.length(&doc), 2);
}
