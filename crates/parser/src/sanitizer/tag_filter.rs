//! Removes denied elements together with everything inside them.

use quill_security::SanitizerPolicy;

use crate::adapter::{Selector, TreeAdapter};

/// Removes every element whose local name is denied, in any namespace and at
/// any depth. Children are never promoted. Returns the number of matched
/// elements, including ones nested inside another removed element.
pub fn remove_denied_tags<A: TreeAdapter>(
    adapter: &A,
    tree: &A::Tree,
    policy: &SanitizerPolicy,
) -> usize {
    let selector = Selector::any_of(policy.denied_tags());
    let matched = adapter.find_all(tree, &selector);

    for node in &matched {
        if let Some(tag) = adapter.tag_name(node) {
            tracing::debug!("🚫 Removing <{}> and its subtree", tag);
        }
        adapter.remove(node);
    }

    matched.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::DomAdapter;
    use crate::OutputMode;
    use crate::Sanitized;

    fn filtered(markup: &str) -> (String, usize) {
        let adapter = DomAdapter::default();
        let tree = adapter.parse(markup).unwrap();
        let removed = remove_denied_tags(&adapter, &tree, &SanitizerPolicy::standard());
        match adapter.serialize(tree, OutputMode::Html).unwrap() {
            Sanitized::Html(html) => (html, removed),
            Sanitized::Fragment(_) => unreachable!(),
        }
    }

    #[test]
    fn test_denied_subtree_is_destroyed() {
        let (html, removed) =
            filtered("<p>a</p><form><div><span><b>deep</b></span></div></form><p>b</p>");
        assert_eq!(html, "<p>a</p><p>b</p>");
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_nested_denied_tags_are_counted() {
        let (html, removed) = filtered("<object><embed><p>x</p></object>ok");
        assert_eq!(html, "ok");
        assert_eq!(removed, 2);
    }

    #[test]
    fn test_case_and_namespace_variants() {
        let (html, removed) = filtered("<SCRIPT>x</SCRIPT><svg><script>y</script></svg>");
        assert_eq!(html, "<svg></svg>");
        assert_eq!(removed, 2);
    }

    #[test]
    fn test_allowed_tags_untouched() {
        let (html, removed) = filtered("<em>fine</em>");
        assert_eq!(html, "<em>fine</em>");
        assert_eq!(removed, 0);
    }
}
