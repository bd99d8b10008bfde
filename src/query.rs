//! Provide XPath evaluation over document trees.
//!
//! Every query acquires a transient evaluation context, points it at
//! the caller's node, lets the resolver register namespace bindings,
//! applies the default-namespace rewrite, and evaluates. Context and
//! result objects are released on every exit path by RAII guards.

use exml::{
    tree::{NodeCommon, XmlElementType, XmlGenericNodePtr},
    xpath::{
        XmlXPathContextPtr, XmlXPathObjectPtr, XmlXPathObjectType, xml_xpath_eval,
        xml_xpath_free_context, xml_xpath_free_object, xml_xpath_new_context,
    },
};

use crate::{error::XPathError, namespace, node::Node, rewrite};

/// A scalar XPath evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    Bool(bool),
    Double(f64),
    Str(String),
}

struct Context(XmlXPathContextPtr);

impl Context {
    /// Build a context for the node's document with the node as the
    /// context node. `None` only on allocation failure.
    fn new(node: Node<'_>) -> Option<Context> {
        let ctxt = unsafe { xml_xpath_new_context(Some(node.document().doc_ptr())) };
        if ctxt.is_null() {
            return None;
        }
        unsafe {
            (*ctxt).node = Some(node.ptr());
        }
        Some(Context(ctxt))
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        unsafe {
            xml_xpath_free_context(self.0);
        }
    }
}

struct Object(XmlXPathObjectPtr);

impl Drop for Object {
    fn drop(&mut self) {
        unsafe {
            xml_xpath_free_object(self.0);
        }
    }
}

pub(crate) fn select<'doc>(
    node: Node<'doc>,
    xpath: &str,
) -> Result<Vec<Node<'doc>>, XPathError> {
    collect(node, xpath, false)
}

pub(crate) fn first<'doc>(
    node: Node<'doc>,
    xpath: &str,
) -> Result<Option<Node<'doc>>, XPathError> {
    Ok(collect(node, xpath, true)?.into_iter().next())
}

fn collect<'doc>(
    node: Node<'doc>,
    xpath: &str,
    first_only: bool,
) -> Result<Vec<Node<'doc>>, XPathError> {
    unsafe {
        let Some(ctxt) = Context::new(node) else {
            return Ok(vec![]);
        };
        namespace::register_query_namespaces(ctxt.0, node, xpath)?;
        let xpath = match node.document().default_ns() {
            Some((prefix, _)) => rewrite::apply_default_prefix(xpath, &prefix),
            None => xpath.to_owned(),
        };
        let obj = xml_xpath_eval(&xpath, ctxt.0);
        if obj.is_null() {
            return Ok(vec![]);
        }
        let obj = Object(obj);
        if !matches!((*obj.0).typ, XmlXPathObjectType::XPathNodeset) {
            return Ok(vec![]);
        }
        let Some(set) = (*obj.0).nodesetval.as_deref() else {
            return Ok(vec![]);
        };
        let Some(&head) = set.node_tab.first() else {
            return Ok(vec![]);
        };
        // Only element results are surfaced; a set led by anything else
        // (text, attribute, namespace nodes) stays out of reach.
        if !matches!(head.element_type(), XmlElementType::XmlElementNode) {
            return Ok(vec![]);
        }
        let take = if first_only { 1 } else { set.node_tab.len() };
        Ok(set.node_tab[..take]
            .iter()
            .map(|&found| Node::new(node.document(), found))
            .collect())
    }
}

pub(crate) fn eval(node: Node<'_>, expr: &str) -> Result<Option<EvalResult>, XPathError> {
    unsafe {
        let Some(ctxt) = Context::new(node) else {
            return Ok(None);
        };
        namespace::register_query_namespaces(ctxt.0, node, expr)?;
        let expr = match node.document().default_ns() {
            Some((prefix, _)) => rewrite::apply_default_prefix(expr, &prefix),
            None => expr.to_owned(),
        };
        let obj = xml_xpath_eval(&expr, ctxt.0);
        if obj.is_null() {
            return Ok(None);
        }
        let obj = Object(obj);
        let result = match (*obj.0).typ {
            XmlXPathObjectType::XPathBoolean => Some(EvalResult::Bool((*obj.0).boolval)),
            XmlXPathObjectType::XPathNumber => Some(EvalResult::Double((*obj.0).floatval)),
            XmlXPathObjectType::XPathString => (*obj.0).stringval.clone().map(EvalResult::Str),
            _ => None,
        };
        Ok(result)
    }
}

/// Evaluate `expr` without namespace resolution or rewriting and return
/// the raw node-set. Used for axes that never carry prefixes, like the
/// attribute axis behind [`Node::attributes`].
pub(crate) fn raw_select(node: Node<'_>, expr: &str) -> Vec<XmlGenericNodePtr> {
    unsafe {
        let Some(ctxt) = Context::new(node) else {
            return vec![];
        };
        let obj = xml_xpath_eval(expr, ctxt.0);
        if obj.is_null() {
            return vec![];
        }
        let obj = Object(obj);
        match (*obj.0).typ {
            XmlXPathObjectType::XPathNodeset => (*obj.0)
                .nodesetval
                .as_deref()
                .map(|set| set.node_tab.clone())
                .unwrap_or_default(),
            _ => vec![],
        }
    }
}

/// Evaluate `expr` without namespace resolution or rewriting and return
/// its string result.
pub(crate) fn raw_string(node: Node<'_>, expr: &str) -> Option<String> {
    unsafe {
        let ctxt = Context::new(node)?;
        let obj = xml_xpath_eval(expr, ctxt.0);
        if obj.is_null() {
            return None;
        }
        let obj = Object(obj);
        match (*obj.0).typ {
            XmlXPathObjectType::XPathString => (*obj.0).stringval.clone(),
            _ => None,
        }
    }
}
