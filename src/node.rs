//! Provide read-oriented handles into a parsed document tree.

use exml::tree::{NodeCommon, XmlElementType, XmlGenericNodePtr};

use crate::{
    document::{Document, DocumentKind},
    error::XPathError,
    query::{self, EvalResult},
};

/// A lightweight handle to one node of a [`Document`] tree.
///
/// Handles are `Copy` and borrow the document, so any number of them can
/// coexist and none can outlive the tree. All accessors read the tree as
/// it currently is; after [`unlink`](Node::unlink) the detached subtree
/// is no longer reachable through navigation but existing handles into
/// it stay valid until the document is dropped.
#[derive(Clone, Copy)]
pub struct Node<'doc> {
    doc: &'doc Document,
    node: XmlGenericNodePtr,
}

/// A single attribute of an element node.
///
/// `name` carries the `prefix:local` form when the attribute is
/// namespaced, matching what the document source spelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl<'doc> Node<'doc> {
    pub(crate) fn new(doc: &'doc Document, node: XmlGenericNodePtr) -> Node<'doc> {
        Node { doc, node }
    }

    pub(crate) fn ptr(&self) -> XmlGenericNodePtr {
        self.node
    }

    /// The name of this node. Elements report their tag, text nodes
    /// report `"text"`.
    pub fn tag(&self) -> Option<String> {
        self.node.name().map(|name| name.into_owned())
    }

    /// The text carried by this node: the literal text of a text node,
    /// or the concatenated descendant text of an element. Entity
    /// references are substituted.
    #[doc(alias = "xmlNodeGetContent")]
    pub fn content(&self) -> Option<String> {
        self.node.get_content()
    }

    /// The markup of this node and its subtree, serialized back to a
    /// string. Text nodes yield their literal text. XML nodes serialize
    /// without extra indentation; nodes of an HTML document go through
    /// the HTML serializer, so void elements and friends come out in
    /// HTML form.
    #[doc(alias = "xmlNodeDump")]
    pub fn raw_content(&self) -> Option<String> {
        if self.is_text() {
            return self.node.get_content();
        }
        let mut buf = vec![];
        match self.doc.kind() {
            DocumentKind::Xml => unsafe {
                self.node
                    .dump_memory(&mut buf, Some(self.doc.doc_ptr()), 0, 0);
            },
            DocumentKind::Html => unsafe {
                self.node.dump_file(&mut buf, Some(self.doc.doc_ptr()));
            },
        }
        String::from_utf8(buf).ok().filter(|s| !s.is_empty())
    }

    /// The serialized markup of this node's children, concatenated and
    /// trimmed of surrounding whitespace. `None` if no child serializes.
    pub fn inner_raw_content(&self) -> Option<String> {
        let mut pieces = self.children().filter_map(|child| child.raw_content());
        let mut joined = pieces.next()?;
        for piece in pieces {
            joined.push_str(&piece);
        }
        Some(joined.trim().to_owned())
    }

    /// All attributes of this node in document order.
    ///
    /// Enumeration runs over the attribute axis of the underlying XPath
    /// engine, which also supplies the qualified names.
    pub fn attributes(&self) -> Attributes {
        let nodes = query::raw_select(*self, "@*");
        let mut items = Vec::with_capacity(nodes.len());
        for (i, attr) in nodes.into_iter().enumerate() {
            let name = query::raw_string(*self, &format!("name(@*[{}])", i + 1))
                .filter(|name| !name.is_empty())
                .or_else(|| attr.name().map(|name| name.into_owned()));
            let Some(name) = name else {
                continue;
            };
            items.push(Attribute {
                name,
                value: attr.get_content(),
            });
        }
        Attributes {
            inner: items.into_iter(),
        }
    }

    /// Look up an attribute value by name.
    ///
    /// A plain name matches the attribute regardless of namespace, the
    /// way `xmlGetProp` does. A `prefix:local` name resolves the prefix
    /// against the declarations in scope at this node and matches only
    /// the attribute in that namespace.
    #[doc(alias = "xmlGetProp")]
    pub fn attribute(&self, name: &str) -> Option<String> {
        if let Some((prefix, local)) = name.split_once(':') {
            let ns = self.node.search_ns(Some(self.doc.doc_ptr()), Some(prefix))?;
            let href = ns.href()?;
            self.node.get_ns_prop(local, Some(href.as_ref()))
        } else {
            self.node.get_prop(name)
        }
    }

    /// Look up an attribute value by local name and namespace URI.
    #[doc(alias = "xmlGetNsProp")]
    pub fn attribute_ns(&self, name: &str, uri: &str) -> Option<String> {
        self.node.get_ns_prop(name, Some(uri))
    }

    /// The parent element, or `None` at the top of the tree.
    pub fn parent(&self) -> Option<Node<'doc>> {
        self.node
            .parent()
            .filter(|parent| matches!(parent.element_type(), XmlElementType::XmlElementNode))
            .map(|parent| Node::new(self.doc, parent))
    }

    /// An iterator over the direct children of this node, in document
    /// order. Text children count; whitespace-only text between
    /// elements was already dropped at parse time.
    pub fn children(&self) -> Children<'doc> {
        Children {
            cursor: self.first_child(),
        }
    }

    /// The first child of this node.
    pub fn first_child(&self) -> Option<Node<'doc>> {
        self.node
            .children()
            .map(|child| Node::new(self.doc, child))
    }

    /// The `index`-th child (zero-based). Out of range is `None`.
    pub fn child_at(&self, index: usize) -> Option<Node<'doc>> {
        self.children().nth(index)
    }

    /// The sibling immediately before this node.
    pub fn prev_sibling(&self) -> Option<Node<'doc>> {
        self.node.prev().map(|prev| Node::new(self.doc, prev))
    }

    /// The sibling immediately after this node.
    pub fn next_sibling(&self) -> Option<Node<'doc>> {
        self.node.next().map(|next| Node::new(self.doc, next))
    }

    /// The document this handle belongs to.
    pub fn document(&self) -> &'doc Document {
        self.doc
    }

    pub fn is_element(&self) -> bool {
        matches!(self.node.element_type(), XmlElementType::XmlElementNode)
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self.node.element_type(),
            XmlElementType::XmlTextNode | XmlElementType::XmlCDATASectionNode
        )
    }

    /// Detach this node and its subtree from the tree.
    ///
    /// The subtree is not freed; the document reclaims it on drop.
    /// Handles into the detached subtree keep working, it just no longer
    /// appears in navigation or query results of the remaining tree.
    #[doc(alias = "xmlUnlinkNode")]
    pub fn unlink(&self) {
        let mut node = self.node;
        node.unlink();
    }

    /// Evaluate `xpath` with this node as the context node and return
    /// all matching element nodes in document order.
    ///
    /// Prefixes are resolved automatically (in-scope declarations, the
    /// registry of [`Document::register_namespace`], then a namespace-axis
    /// search); a prefix that resolves nowhere is
    /// [`XPathError::UnresolvedPrefix`]. Scalar results and node-sets
    /// whose first entry is not an element come back as an empty vector,
    /// as do malformed expressions.
    pub fn select(&self, xpath: &str) -> Result<Vec<Node<'doc>>, XPathError> {
        query::select(*self, xpath)
    }

    /// Like [`select`](Node::select), but stops at the first match.
    pub fn first(&self, xpath: &str) -> Result<Option<Node<'doc>>, XPathError> {
        query::first(*self, xpath)
    }

    /// Evaluate `expr` for a scalar result. Boolean, number and string
    /// results map onto [`EvalResult`]; node-sets and failed evaluations
    /// are `None`.
    pub fn eval(&self, expr: &str) -> Result<Option<EvalResult>, XPathError> {
        query::eval(*self, expr)
    }
}

impl PartialEq for Node<'_> {
    /// Two handles are equal when they point at the same node of the
    /// same document.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.node == other.node
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").field("tag", &self.tag()).finish()
    }
}

/// Iterator over the direct children of a node. See [`Node::children`].
pub struct Children<'doc> {
    cursor: Option<Node<'doc>>,
}

impl<'doc> Iterator for Children<'doc> {
    type Item = Node<'doc>;

    fn next(&mut self) -> Option<Node<'doc>> {
        let current = self.cursor?;
        self.cursor = current.next_sibling();
        Some(current)
    }
}

/// Iterator over the attributes of a node. See [`Node::attributes`].
pub struct Attributes {
    inner: std::vec::IntoIter<Attribute>,
}

impl Iterator for Attributes {
    type Item = Attribute;

    fn next(&mut self) -> Option<Attribute> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Attributes {}
