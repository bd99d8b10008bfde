//! Provide namespace-prefix discovery and registration for XPath queries.
//!
//! The underlying XPath engine resolves prefixes strictly against the
//! bindings registered on the evaluation context. This module fills that
//! context before each query: declarations carried by the context node,
//! the document's explicit registry, declarations found elsewhere in the
//! tree, and a synthesized binding for a default (prefix-less) namespace.

use std::{ffi::CString, sync::LazyLock};

use exml::{
    tree::{XmlGenericNodePtr, XmlNodePtr, xml_new_ns},
    xpath::{
        XmlXPathContextPtr, internals::xml_xpath_register_ns, xml_xpath_eval,
        xml_xpath_free_object,
    },
};
use fancy_regex::Regex;

use crate::{error::XPathError, node::Node};

/// A word run directly before a colon and another word character.
/// `child::x` does not match (the axis colon pair protects itself), but
/// a prefix inside a string literal does; the scan is lexical on purpose.
static PREFIX_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+):\w").unwrap());

/// Collect the distinct namespace prefixes `xpath` mentions, in order of
/// first appearance.
pub(crate) fn scan_prefixes(xpath: &str) -> Vec<String> {
    let mut prefixes = vec![];
    for captures in PREFIX_PATTERN.captures_iter(xpath).flatten() {
        let prefix = &captures[1];
        if !prefixes.iter().any(|known| known == prefix) {
            prefixes.push(prefix.to_owned());
        }
    }
    prefixes
}

/// Derive a usable prefix for a default-namespace URI: its last
/// non-empty path segment, or a base64 rendering of the whole URI when
/// it has no segment at all.
pub(crate) fn synthetic_prefix(uri: &str) -> String {
    uri.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(|segment| segment.to_owned())
        .unwrap_or_else(|| base64(uri.as_bytes()))
}

/// Resolve every prefix `xpath` uses and register the bindings into
/// `ctxt` so the following evaluation can look them up.
///
/// Resolution sources, in order:
/// 1. namespace declarations attached to the context node itself; a
///    default declaration met here for the first time gets a synthetic
///    prefix, becomes the document's remembered default namespace, and
///    is also written into the tree root as a real declaration;
/// 2. for prefixes still open: an in-scope declaration found from the
///    root, then the document's explicit registry, then the namespace
///    axis of the engine itself (persisted at the root when it hits).
///
/// A prefix that all sources miss is an [`XPathError::UnresolvedPrefix`].
pub(crate) unsafe fn register_query_namespaces(
    ctxt: XmlXPathContextPtr,
    node: Node<'_>,
    xpath: &str,
) -> Result<(), XPathError> {
    unsafe {
        let document = node.document();
        let mut pending = scan_prefixes(xpath);

        if let Ok(element) = XmlNodePtr::try_from(node.ptr()) {
            let mut decl = element.ns_def;
            while let Some(ns) = decl {
                match ns.prefix() {
                    Some(prefix) if !prefix.is_empty() => {
                        xml_xpath_register_ns(ctxt, &prefix, ns.href().as_deref());
                        pending.retain(|p| p.as_str() != &*prefix);
                    }
                    _ => {
                        if let Some((prefix, uri)) = document.default_ns() {
                            // Keep every context on the first default
                            // namespace this document discovered.
                            xml_xpath_register_ns(ctxt, &prefix, Some(&uri));
                            pending.retain(|p| *p != prefix);
                        } else if let Some(href) = ns.href().filter(|href| !href.is_empty()) {
                            let prefix = synthetic_prefix(&href);
                            xml_xpath_register_ns(ctxt, &prefix, Some(&href));
                            declare_at_root(node, &href, &prefix);
                            pending.retain(|p| *p != prefix);
                            document.set_default_ns(prefix, href.into_owned());
                        }
                    }
                }
                decl = ns.next;
            }
        }

        for prefix in &pending {
            let root = XmlGenericNodePtr::from(document.root_ptr());
            if let Some(ns) = root.search_ns(Some(document.doc_ptr()), Some(prefix)) {
                xml_xpath_register_ns(ctxt, prefix, ns.href().as_deref());
                continue;
            }

            if let Some(uri) = document.registered_uri(prefix) {
                xml_xpath_register_ns(ctxt, prefix, Some(&uri));
                continue;
            }

            // Last resort: ask the engine's namespace axis, which sees
            // declarations anywhere in the tree.
            let obj = xml_xpath_eval(&format!("string(//namespace::{prefix})"), ctxt);
            if !obj.is_null() {
                let uri = (*obj).stringval.clone();
                xml_xpath_free_object(obj);
                if let Some(uri) = uri.filter(|uri| !uri.is_empty()) {
                    xml_xpath_register_ns(ctxt, prefix, Some(&uri));
                    declare_at_root(node, &uri, prefix);
                    continue;
                }
            }

            return Err(XPathError::UnresolvedPrefix(prefix.clone()));
        }

        Ok(())
    }
}

/// Write `xmlns:prefix="href"` onto the document root so the binding
/// survives into later tree searches and serializations.
unsafe fn declare_at_root(node: Node<'_>, href: &str, prefix: &str) {
    let Ok(href) = CString::new(href) else {
        return;
    };
    unsafe {
        xml_new_ns(
            Some(node.document().root_ptr()),
            href.as_ptr() as _,
            Some(prefix),
        );
    }
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b = [chunk[0], *chunk.get(1).unwrap_or(&0), *chunk.get(2).unwrap_or(&0)];
        let n = u32::from_be_bytes([0, b[0], b[1], b[2]]);
        out.push(BASE64_ALPHABET[(n >> 18) as usize & 0x3f] as char);
        out.push(BASE64_ALPHABET[(n >> 12) as usize & 0x3f] as char);
        out.push(if chunk.len() > 1 {
            BASE64_ALPHABET[(n >> 6) as usize & 0x3f] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64_ALPHABET[n as usize & 0x3f] as char
        } else {
            '='
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_prefixes_in_order() {
        assert_eq!(
            scan_prefixes("//dc:title | //dc:creator/opf:meta"),
            vec!["dc".to_owned(), "opf".to_owned()]
        );
    }

    #[test]
    fn scan_ignores_axis_separators() {
        assert!(scan_prefixes("/descendant::note/child::to").is_empty());
    }

    #[test]
    fn scan_overmatches_literals_by_design() {
        assert_eq!(scan_prefixes("//*[contains(., 'a:b')]"), vec!["a".to_owned()]);
    }

    #[test]
    fn synthetic_prefix_prefers_last_segment() {
        assert_eq!(synthetic_prefix("http://www.w3.org/2005/Atom"), "Atom");
        assert_eq!(synthetic_prefix("http://www.w3.org/1999/xhtml/"), "xhtml");
    }

    #[test]
    fn synthetic_prefix_falls_back_to_base64() {
        assert_eq!(synthetic_prefix("///"), base64(b"///"));
    }

    #[test]
    fn base64_pads_tail_chunks() {
        assert_eq!(base64(b""), "");
        assert_eq!(base64(b"f"), "Zg==");
        assert_eq!(base64(b"fo"), "Zm8=");
        assert_eq!(base64(b"foo"), "Zm9v");
        assert_eq!(base64(b"foobar"), "Zm9vYmFy");
    }
}
