//! Provide default-namespace rewriting of XPath expressions.
//!
//! XPath has no notion of a default namespace: an unprefixed element
//! test only matches elements in no namespace at all. When a document
//! declares `xmlns="uri"`, naive queries like `//entry` therefore come
//! back empty. Once the resolver has synthesized a prefix for that
//! default namespace, this module rewrites the unprefixed element tests
//! of an expression to carry it.
//!
//! The rewriting is lexical, on `|`- and `/`-separated pieces of the
//! expression text, not on a parsed syntax tree. Attribute steps,
//! namespace-axis steps, wildcard-only tests and names that already
//! carry a prefix are left alone.

use std::sync::LazyLock;

use fancy_regex::{Captures, Regex};

/// Name test behind an axis marker, except the attribute and namespace
/// axes. The closer keeps the rewrite inside one test.
static AXIS_STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<!attribute)(?<!namespace)(::)([a-z*][\w\-.]*)([=\s\[\]]|$)").unwrap()
});

/// Bare name test at the start of a step or behind an opening paren.
static LEADING_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\()([a-z*][\w\-.]*)([\)\[]|$)").unwrap());

/// Bare name test used inside a predicate, e.g. `entry[title]`.
static PREDICATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\[)([a-z*][\w\-.]*)([\]=])").unwrap());

/// Rewrite the unprefixed element tests of `xpath` to carry `prefix`.
pub(crate) fn apply_default_prefix(xpath: &str, prefix: &str) -> String {
    xpath
        .split('|')
        .map(|path| {
            path.split('/')
                .map(|step| rewrite_step(step, prefix))
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn rewrite_step(step: &str, prefix: &str) -> String {
    if step.is_empty() {
        return String::new();
    }
    // An explicit axis names its test right after `::`; predicates of
    // such steps are left as written.
    if step.contains("::") {
        return AXIS_STEP
            .replace_all(step, |caps: &Captures| prefix_name(caps, prefix))
            .into_owned();
    }
    let rewritten = LEADING_NAME.replace_all(step, |caps: &Captures| prefix_name(caps, prefix));
    PREDICATE_NAME
        .replace_all(&rewritten, |caps: &Captures| prefix_name(caps, prefix))
        .into_owned()
}

fn prefix_name(caps: &Captures, prefix: &str) -> String {
    let name = &caps[2];
    // `*` alone means "any element"; prefixing it would narrow the
    // match to one namespace.
    if name == "*" {
        caps[0].to_owned()
    } else {
        format!("{}{}:{}{}", &caps[1], prefix, name, &caps[3])
    }
}
