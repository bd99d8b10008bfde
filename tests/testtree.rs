//! Document parsing and tree accessor tests over the fixtures in `test/`.

use xpave::{Document, DocumentError, DocumentKind};

const NOTE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><note><to>Tove</to><from>Jani</from><heading>Reminder</heading><body>Don't forget me this weekend!</body></note>";

fn opf_doc() -> Document {
    Document::read_file("test/epub.opf", DocumentKind::Xml, None).unwrap()
}

fn html_doc() -> Document {
    Document::read_file("test/hello.html", DocumentKind::Html, None).unwrap()
}

fn note_doc() -> Document {
    Document::read_str(NOTE, DocumentKind::Xml).unwrap()
}

#[test]
fn root_tag() {
    assert_eq!(opf_doc().root().tag().as_deref(), Some("package"));
    assert_eq!(html_doc().root().tag().as_deref(), Some("html"));
    assert_eq!(note_doc().root().tag().as_deref(), Some("note"));
}

#[test]
fn child_count() {
    assert_eq!(opf_doc().root().children().count(), 3);
    assert_eq!(html_doc().root().children().count(), 2);
    assert_eq!(note_doc().root().children().count(), 4);
}

#[test]
fn first_child() {
    assert_eq!(
        opf_doc().root().first_child().and_then(|n| n.tag()).as_deref(),
        Some("metadata")
    );
    assert_eq!(
        html_doc().root().first_child().and_then(|n| n.tag()).as_deref(),
        Some("head")
    );
    assert_eq!(
        note_doc().root().first_child().and_then(|n| n.tag()).as_deref(),
        Some("to")
    );
}

#[test]
fn child_at_index() {
    assert_eq!(
        opf_doc().root().child_at(1).and_then(|n| n.tag()).as_deref(),
        Some("manifest")
    );
    assert_eq!(
        html_doc().root().child_at(1).and_then(|n| n.tag()).as_deref(),
        Some("body")
    );
    assert_eq!(
        note_doc().root().child_at(1).and_then(|n| n.tag()).as_deref(),
        Some("from")
    );
    assert!(note_doc().root().child_at(4).is_none());
}

#[test]
fn prev_sibling() {
    let doc = note_doc();
    let root = doc.root();
    assert_eq!(root.child_at(1).and_then(|n| n.prev_sibling()), root.first_child());
    assert!(root.first_child().unwrap().prev_sibling().is_none());
}

#[test]
fn next_sibling() {
    let doc = note_doc();
    let root = doc.root();
    assert_eq!(root.child_at(0).and_then(|n| n.next_sibling()), root.child_at(1));
    assert!(root.child_at(3).unwrap().next_sibling().is_none());
}

#[test]
fn content() {
    let doc = opf_doc();
    let contributor = doc.root().first("//dc:contributor").unwrap().unwrap();
    assert_eq!(
        contributor.content().as_deref(),
        Some("O’Reilly Production Services")
    );

    let doc = html_doc();
    let p = doc.root().first("//p").unwrap().unwrap();
    assert_eq!(p.content().as_deref(), Some("Hello, World"));
}

#[test]
fn raw_content() {
    let doc = opf_doc();
    let contributor = doc.root().first("//dc:contributor").unwrap().unwrap();
    assert_eq!(
        contributor.raw_content().as_deref(),
        Some("<dc:contributor>O’Reilly Production Services</dc:contributor>")
    );

    let doc = html_doc();
    let p = doc.root().first("//p").unwrap().unwrap();
    assert_eq!(
        p.raw_content().as_deref(),
        Some(r#"<p class="foo" id="bar"><span>Hello, World</span></p>"#)
    );
}

#[test]
fn inner_raw_content() {
    let doc = opf_doc();
    let contributor = doc.root().first("//dc:contributor").unwrap().unwrap();
    assert_eq!(
        contributor.inner_raw_content().as_deref(),
        Some("O’Reilly Production Services")
    );

    let doc = html_doc();
    let p = doc.root().first("//p").unwrap().unwrap();
    assert_eq!(
        p.inner_raw_content().as_deref(),
        Some("<span>Hello, World</span>")
    );
}

#[test]
fn mixed_inner_raw_content() {
    let doc = Document::read_file("test/atom.xml", DocumentKind::Xml, None).unwrap();
    doc.register_namespace("atom", "http://www.w3.org/2005/Atom");
    let name = doc.root().first("//atom:author/atom:name").unwrap().unwrap();
    assert_eq!(
        name.raw_content().as_deref(),
        Some("<name>John <last>Doe</last></name>")
    );
    assert_eq!(name.inner_raw_content().as_deref(), Some("John <last>Doe</last>"));
}

#[test]
fn parent() {
    let doc = opf_doc();
    let contributor = doc.root().first("//dc:contributor").unwrap().unwrap();
    assert_eq!(contributor.parent().and_then(|n| n.tag()).as_deref(), Some("metadata"));
    assert!(doc.root().parent().is_none());
}

#[test]
fn attributes_in_document_order() {
    let doc = opf_doc();
    let title = doc.root().first("//dc:title").unwrap().unwrap();
    let attrs = title.attributes().collect::<Vec<_>>();
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs[0].name, "id");
    assert_eq!(attrs[0].value.as_deref(), Some("pub-title"));

    let doc = html_doc();
    let p = doc.root().first("//p").unwrap().unwrap();
    let attrs = p.attributes().collect::<Vec<_>>();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs[0].name, "class");
    assert_eq!(attrs[0].value.as_deref(), Some("foo"));
    assert_eq!(attrs[1].name, "id");
    assert_eq!(attrs[1].value.as_deref(), Some("bar"));
}

#[test]
fn qualified_attribute_names() {
    let doc = Document::read_file("test/attrns.xml", DocumentKind::Xml, None).unwrap();
    doc.register_namespace("w3", "http://www.w3.org");
    let good = doc.root().first("/w3:x/w3:good[2]").unwrap().unwrap();
    let attrs = good.attributes().collect::<Vec<_>>();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs[0].name, "a");
    assert_eq!(attrs[0].value.as_deref(), Some("1"));
    assert_eq!(attrs[1].name, "n1:a");
    assert_eq!(attrs[1].value.as_deref(), Some("2"));
}

#[test]
fn attribute_value() {
    let doc = html_doc();
    let p = doc.root().first("//p").unwrap().unwrap();
    assert_eq!(p.attribute("class").as_deref(), Some("foo"));
    assert_eq!(p.attribute("id").as_deref(), Some("bar"));
    assert!(p.attribute("missing").is_none());

    let doc = opf_doc();
    let id = doc.root().first("//dc:identifier").unwrap().unwrap();
    assert_eq!(id.attribute("id").as_deref(), Some("pub-identifier"));
    assert_eq!(id.attribute("mock:id").as_deref(), Some("mock"));
    assert!(id.attribute("nosuch:id").is_none());
}

#[test]
fn attribute_value_in_namespace() {
    let doc = Document::read_file("test/attrns.xml", DocumentKind::Xml, None).unwrap();
    doc.register_namespace("w3", "http://www.w3.org");
    let good = doc.root().first("/w3:x/w3:good[2]").unwrap().unwrap();
    // The plain lookup sees the unprefixed attribute, the namespaced
    // lookup the `n1:a` one.
    assert_eq!(good.attribute("a").as_deref(), Some("1"));
    assert_eq!(good.attribute_ns("a", "http://www.w3.org").as_deref(), Some("2"));
    assert!(good.attribute_ns("b", "http://www.w3.org").is_none());
}

#[test]
fn node_kind_predicates() {
    let doc = note_doc();
    let to = doc.root().first_child().unwrap();
    assert!(to.is_element());
    assert!(!to.is_text());
    assert!(doc.root().is_element());
}

#[test]
fn unlink_detaches_node() {
    let doc = note_doc();
    let from = doc.root().child_at(1).unwrap();
    from.unlink();
    assert_eq!(doc.root().children().count(), 3);
    assert_eq!(
        doc.root().child_at(1).and_then(|n| n.tag()).as_deref(),
        Some("heading")
    );
}

#[test]
fn document_accessors() {
    let doc = note_doc();
    assert_eq!(doc.kind(), DocumentKind::Xml);
    assert_eq!(doc.data(), NOTE.as_bytes());
    assert_eq!(doc.encoding(), Some("UTF-8"));

    let doc = html_doc();
    assert_eq!(doc.kind(), DocumentKind::Html);
    assert!(doc.encoding().is_none());

    let node = doc.root().first("//p").unwrap().unwrap();
    assert_eq!(node.document().kind(), DocumentKind::Html);
}

#[test]
fn encoding_labels_are_canonicalized() {
    let doc = Document::read_memory(NOTE.as_bytes(), DocumentKind::Xml, Some("utf8")).unwrap();
    assert_eq!(doc.encoding(), Some("UTF-8"));

    let err = Document::read_memory(NOTE.as_bytes(), DocumentKind::Xml, Some("no-such-charset"))
        .unwrap_err();
    assert!(matches!(err, DocumentError::InvalidEncoding(label) if label == "no-such-charset"));
}

#[test]
fn parse_failures() {
    let err = Document::read_str("not xml at all", DocumentKind::Xml).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidSourceData));

    let err = Document::read_str("<open><unclosed></open>", DocumentKind::Xml).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidSourceData));

    let err = Document::read_file("test/no-such-file.xml", DocumentKind::Xml, None).unwrap_err();
    assert!(matches!(err, DocumentError::Io(_)));
}

#[test]
fn html_parsing_recovers_from_arbitrary_text() {
    // The same input that fails as XML parses as HTML, wrapped in a
    // recovered tree.
    let doc = Document::read_str("not xml at all", DocumentKind::Html).unwrap();
    assert_eq!(doc.root().tag().as_deref(), Some("html"));
    assert_eq!(doc.root().content().as_deref(), Some("not xml at all"));
}

#[test]
fn html_without_elements_has_no_root() {
    let err = Document::read_str("<!-- nothing here -->", DocumentKind::Html).unwrap_err();
    assert!(matches!(err, DocumentError::NoRootElement));
}

#[test]
fn document_equality_is_tree_identity() {
    let doc = note_doc();
    assert_eq!(doc, doc);
    // Same bytes, separate parse: a distinct tree, so a distinct document.
    assert_ne!(doc, note_doc());
}

#[test]
fn parse_fixture_sweep() {
    let mut seen = 0;
    for entry in glob::glob("test/*").unwrap() {
        let entry = entry.unwrap();
        let kind = match entry.extension().and_then(|ext| ext.to_str()) {
            Some("html") => DocumentKind::Html,
            _ => DocumentKind::Xml,
        };
        let doc = Document::read_file(&entry, kind, None)
            .unwrap_or_else(|e| panic!("failed to parse {}: {e}", entry.display()));
        assert!(doc.root().is_element(), "no element root in {}", entry.display());
        seen += 1;
    }
    assert_eq!(seen, 6);
}
