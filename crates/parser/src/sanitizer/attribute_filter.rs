//! Strips attributes the policy does not allow, URI attributes that carry a
//! script scheme, and every event handler binding.

use std::fmt;

use quill_security::SanitizerPolicy;

use crate::adapter::{AttributeEntry, Selector, TreeAdapter};

/// Why an attribute was stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripReason {
    /// Neither attribute allowlist accepts the name
    NotAllowed,
    /// An allowed URI attribute whose value uses a dangerous scheme
    DangerousUri,
}

impl fmt::Display for StripReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StripReason::NotAllowed => write!(f, "not allowed"),
            StripReason::DangerousUri => write!(f, "dangerous URI"),
        }
    }
}

/// Decision for a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeVerdict {
    Keep,
    Strip(StripReason),
}

impl AttributeVerdict {
    pub fn judge(policy: &SanitizerPolicy, name: &str, value: &str) -> Self {
        if !policy.is_allowed_attribute(name) {
            AttributeVerdict::Strip(StripReason::NotAllowed)
        } else if policy.is_uri_bearing(name) && policy.is_dangerous_uri_value(value) {
            AttributeVerdict::Strip(StripReason::DangerousUri)
        } else {
            AttributeVerdict::Keep
        }
    }

    pub fn is_strip(&self) -> bool {
        matches!(self, AttributeVerdict::Strip(_))
    }
}

/// Counts from one attribute filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub attributes_stripped: usize,
    pub handlers_cleared: usize,
}

/// Runs the attribute filter over every element of the tree.
///
/// Verdicts for an element are all taken from its attribute list before any
/// of them is removed.
pub fn filter_attributes<A: TreeAdapter>(
    adapter: &A,
    tree: &A::Tree,
    policy: &SanitizerPolicy,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for node in adapter.find_all(tree, &Selector::Universal) {
        let verdicts: Vec<(AttributeEntry, AttributeVerdict)> = adapter
            .attributes(&node)
            .into_iter()
            .map(|entry| {
                let verdict = AttributeVerdict::judge(policy, &entry.name, &entry.value);
                (entry, verdict)
            })
            .collect();

        for (entry, verdict) in verdicts {
            let reason = match verdict {
                AttributeVerdict::Strip(reason) => reason,
                AttributeVerdict::Keep => continue,
            };
            tracing::debug!("🚫 Stripping attribute {} ({})", entry.name, reason);
            adapter.remove_attribute(&node, &entry.name);
            outcome.attributes_stripped += 1;

            if policy.is_event_handler_attribute(&entry.name)
                && adapter.clear_live_handler(&node, &entry.name)
            {
                outcome.handlers_cleared += 1;
            }
        }

        // Bindings installed without a matching attribute
        for name in adapter.live_handlers(&node) {
            if policy.is_event_handler_attribute(&name) && adapter.clear_live_handler(&node, &name) {
                tracing::debug!("🚫 Clearing live handler {}", name);
                outcome.handlers_cleared += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::DomAdapter;
    use crate::dom::{Attribute, Fragment, HandlerBinding, Node};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_verdicts() {
        let policy = SanitizerPolicy::standard();
        assert_eq!(AttributeVerdict::judge(&policy, "class", "x"), AttributeVerdict::Keep);
        assert_eq!(
            AttributeVerdict::judge(&policy, "onclick", "x()"),
            AttributeVerdict::Strip(StripReason::NotAllowed)
        );
        assert_eq!(
            AttributeVerdict::judge(&policy, "href", " JavaScript:alert(1)"),
            AttributeVerdict::Strip(StripReason::DangerousUri)
        );
        assert_eq!(
            AttributeVerdict::judge(&policy, "title", "javascript:alert(1)"),
            AttributeVerdict::Keep
        );
        assert!(AttributeVerdict::judge(&policy, "srcx", "a").is_strip());
    }

    #[test]
    fn test_filter_on_parsed_tree() {
        let adapter = DomAdapter::default();
        let tree = adapter
            .parse(r#"<a href="vbscript:x" class="c" onmouseover="y()" formaction="z">t</a>"#)
            .unwrap();
        let outcome = filter_attributes(&adapter, &tree, &SanitizerPolicy::standard());
        assert_eq!(outcome.attributes_stripped, 3);
        assert_eq!(tree.to_html().unwrap(), r#"<a class="c">t</a>"#);
    }

    #[test]
    fn test_live_handlers_cleared() {
        let adapter = DomAdapter::default();
        let node = Node::create_html_element("p", vec![Attribute::new("onclick", "x()")]);
        Node::bind_handler(&node, "onclick", HandlerBinding::new(|_| {})).unwrap();
        Node::bind_handler(&node, "onfocus", HandlerBinding::new(|_| {})).unwrap();
        let tree = adapter.adopt(Fragment::from_nodes(vec![node.clone()]));

        let outcome = filter_attributes(&adapter, &tree, &SanitizerPolicy::standard());
        assert_eq!(
            outcome,
            FilterOutcome {
                attributes_stripped: 1,
                handlers_cleared: 2,
            }
        );
        assert!(adapter.live_handlers(&node).is_empty());
        assert!(adapter.attributes(&node).is_empty());
    }
}
