//! Ergonomic XPath navigation over XML and HTML documents.
//!
//! [`Document`] parses a byte buffer into a tree and owns it for its
//! whole lifetime; [`Node`] handles borrow from their document and
//! expose tag, content, attribute and sibling accessors alongside
//! XPath selection. Prefixed queries work without manual registration:
//! namespace bindings are collected from the document on every query,
//! and queries against documents with a default namespace are
//! rewritten to use a synthesized prefix for it.

pub mod document;
pub mod error;
mod namespace;
pub mod node;
pub mod query;
mod rewrite;

pub use document::{Document, DocumentKind};
pub use error::{DocumentError, XPathError};
pub use node::{Attribute, Attributes, Children, Node};
pub use query::EvalResult;
