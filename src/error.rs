//! Provide error types for document construction and XPath processing.

use std::fmt::{self, Display};
use std::io;

/// Errors raised while building a [`Document`](crate::Document).
///
/// Construction is the only fallible phase of the crate that reports
/// through `Result`; query failures surface as empty results instead.
#[derive(Debug)]
pub enum DocumentError {
    /// The source bytes could not be parsed as the requested document kind.
    InvalidSourceData,
    /// The requested encoding label is not recognized by any charset handler.
    InvalidEncoding(String),
    /// Parsing succeeded but the tree has no root element.
    NoRootElement,
    /// Reading the source file failed.
    Io(io::Error),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSourceData => {
                write!(f, "source data cannot be parsed as the requested document kind")
            }
            Self::InvalidEncoding(label) => write!(f, "unsupported encoding label `{label}`"),
            Self::NoRootElement => write!(f, "document has no root element"),
            Self::Io(err) => write!(f, "failed to read source: {err}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DocumentError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Errors raised while preparing an XPath evaluation.
///
/// An expression that simply matches nothing is not an error; the single
/// variant signals a caller configuration mistake that no resolution
/// strategy could repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathError {
    /// A namespace prefix used in the expression could not be resolved
    /// against the tree, the document registry, or the namespace axis.
    UnresolvedPrefix(String),
}

impl Display for XPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedPrefix(prefix) => write!(
                f,
                "cannot find namespace URI for `{prefix}`, register it with Document::register_namespace"
            ),
        }
    }
}

impl std::error::Error for XPathError {}
