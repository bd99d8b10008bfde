//! Provide the owning container for parsed XML/HTML document trees.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use encoding_rs::Encoding;
use exml::{
    libxml::{
        htmlparser::{HtmlParserOption, html_read_memory},
        parser::XmlParserOption,
    },
    parser::xml_read_memory,
    tree::{XmlDocPtr, XmlNodePtr, xml_free_doc},
};

use crate::{error::DocumentError, node::Node};

/// The markup dialect a [`Document`] is parsed as.
///
/// XML parsing is strict: malformed input is a construction error.
/// HTML parsing recovers from arbitrary input the way browsers do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Xml,
    Html,
}

/// A parsed XML or HTML document.
///
/// The document owns the underlying tree and frees it on drop. Every
/// [`Node`] handed out borrows the document, so handles cannot outlive
/// the tree they point into.
///
/// The only state that changes after construction is the namespace
/// registry: explicit registrations through
/// [`register_namespace`](Document::register_namespace) and the default
/// namespace discovered lazily by the first query that needs it.
///
/// A `Document` is neither `Send` nor `Sync`; share one across threads
/// only behind external synchronization.
pub struct Document {
    data: Vec<u8>,
    kind: DocumentKind,
    encoding: Option<String>,
    doc: XmlDocPtr,
    root: XmlNodePtr,
    namespaces: RefCell<HashMap<String, String>>,
    default_ns: RefCell<Option<(String, String)>>,
}

impl Document {
    /// Parse a document held in memory.
    ///
    /// `encoding` is an optional charset label (`"UTF-8"`, `"shift_jis"`,
    /// ...) describing the source bytes; `None` lets the parser detect
    /// the encoding itself. A label no charset handler recognizes fails
    /// with [`DocumentError::InvalidEncoding`] before any parsing starts.
    ///
    /// XML input that cannot be parsed fails with
    /// [`DocumentError::InvalidSourceData`]; input that parses to a tree
    /// without a root element fails with [`DocumentError::NoRootElement`].
    /// HTML parsing is permissive and reaches the root check only for
    /// degenerate input such as an empty buffer.
    #[doc(alias = "xmlReadMemory")]
    #[doc(alias = "htmlReadMemory")]
    pub fn read_memory(
        bytes: impl Into<Vec<u8>>,
        kind: DocumentKind,
        encoding: Option<&str>,
    ) -> Result<Document, DocumentError> {
        let data = bytes.into();
        // Canonicalize the label so the parser sees a name it understands.
        let encoding = match encoding {
            Some(label) => Some(
                Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| DocumentError::InvalidEncoding(label.to_owned()))?
                    .name()
                    .to_owned(),
            ),
            None => None,
        };
        let doc = unsafe {
            match kind {
                DocumentKind::Xml => xml_read_memory(
                    data.clone(),
                    None,
                    encoding.as_deref(),
                    XmlParserOption::XmlParseNoblanks as i32,
                ),
                DocumentKind::Html => html_read_memory(
                    data.clone(),
                    None,
                    encoding.as_deref(),
                    HtmlParserOption::HtmlParseRecover as i32
                        | HtmlParserOption::HtmlParseNoblanks as i32
                        | HtmlParserOption::HtmlParseNowarning as i32
                        | HtmlParserOption::HtmlParseNoerror as i32,
                ),
            }
        }
        .ok_or(DocumentError::InvalidSourceData)?;
        let Some(root) = (unsafe { doc.get_root_element() }) else {
            unsafe { xml_free_doc(doc) };
            return Err(DocumentError::NoRootElement);
        };
        Ok(Document {
            data,
            kind,
            encoding,
            doc,
            root,
            namespaces: RefCell::new(HashMap::new()),
            default_ns: RefCell::new(None),
        })
    }

    /// Parse a document from a string. The source is taken as UTF-8.
    pub fn read_str(source: &str, kind: DocumentKind) -> Result<Document, DocumentError> {
        Self::read_memory(source.as_bytes(), kind, Some("UTF-8"))
    }

    /// Read and parse a document from a file.
    ///
    /// I/O failures surface as [`DocumentError::Io`]; everything else
    /// behaves as [`read_memory`](Document::read_memory).
    #[doc(alias = "xmlReadFile")]
    pub fn read_file(
        path: impl AsRef<Path>,
        kind: DocumentKind,
        encoding: Option<&str>,
    ) -> Result<Document, DocumentError> {
        let data = fs::read(path)?;
        Self::read_memory(data, kind, encoding)
    }

    /// Bind `prefix` to a namespace URI for all later queries on this
    /// document.
    ///
    /// An explicit binding persists for the document's lifetime. It is
    /// consulted whenever a query prefix is not declared in the tree
    /// itself, which makes it the way to address default namespaces
    /// under a prefix of your choosing.
    pub fn register_namespace(&self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces
            .borrow_mut()
            .insert(prefix.into(), uri.into());
    }

    /// The root element of the document.
    #[doc(alias = "xmlDocGetRootElement")]
    pub fn root(&self) -> Node<'_> {
        Node::new(self, self.root.into())
    }

    /// The dialect this document was parsed as.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The canonicalized encoding label the document was parsed with,
    /// if one was requested.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// The raw source bytes the document was parsed from.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn doc_ptr(&self) -> XmlDocPtr {
        self.doc
    }

    pub(crate) fn root_ptr(&self) -> XmlNodePtr {
        self.root
    }

    pub(crate) fn registered_uri(&self, prefix: &str) -> Option<String> {
        self.namespaces.borrow().get(prefix).cloned()
    }

    pub(crate) fn default_ns(&self) -> Option<(String, String)> {
        self.default_ns.borrow().clone()
    }

    pub(crate) fn set_default_ns(&self, prefix: String, uri: String) {
        *self.default_ns.borrow_mut() = Some((prefix, uri));
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        unsafe {
            xml_free_doc(self.doc);
        }
    }
}

impl PartialEq for Document {
    /// Documents are equal when they were built from the same bytes at
    /// the same kind and encoding and share the same underlying tree.
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
            && self.kind == other.kind
            && self.encoding == other.encoding
            && self.doc == other.doc
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("kind", &self.kind)
            .field("encoding", &self.encoding)
            .field("data_len", &self.data.len())
            .finish()
    }
}
