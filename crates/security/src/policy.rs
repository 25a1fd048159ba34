//! Defines the sanitizer policy and its builder.
//!
//! The policy holds the three mechanisms the sanitizer reconciles: the tag
//! denylist, the attribute allowlists, and the dangerous-scheme denylist for
//! URI-bearing attributes. A policy is immutable once built and can be shared
//! between threads behind an `Arc`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{SecurityError, SecurityResult};
use crate::matcher::{NameMatcher, NameRule, SchemeMatcher};

/// Immutable sanitization policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizerPolicy {
    denied_tags: HashSet<String>,
    html_attributes: NameMatcher,
    svg_attributes: NameMatcher,
    uri_attributes: HashSet<String>,
    dangerous_schemes: SchemeMatcher,
    event_handler_prefix: String,
}

impl SanitizerPolicy {
    /// The built-in tables.
    pub fn standard() -> Self {
        Self {
            denied_tags: lowercase_set(defaults::DENIED_TAGS),
            html_attributes: NameMatcher::from_trusted(defaults::HTML_ATTRIBUTES),
            svg_attributes: NameMatcher::from_trusted(defaults::SVG_ATTRIBUTES),
            uri_attributes: lowercase_set(defaults::URI_ATTRIBUTES),
            dangerous_schemes: SchemeMatcher::from_trusted(defaults::DANGEROUS_SCHEMES),
            event_handler_prefix: defaults::EVENT_HANDLER_PREFIX.to_string(),
        }
    }

    pub fn builder() -> SanitizerPolicyBuilder {
        SanitizerPolicyBuilder::new()
    }

    /// Loads policy tables from JSON. Missing tables fall back to the
    /// built-in ones.
    pub fn from_json(json: &str) -> SecurityResult<Self> {
        let tables: PolicyTables = serde_json::from_str(json)?;
        tables.into_policy()
    }

    /// Dumps the policy as JSON tables.
    pub fn to_json(&self) -> SecurityResult<String> {
        Ok(serde_json::to_string_pretty(&self.tables())?)
    }

    /// True if elements with this tag name must be removed with their subtree.
    pub fn is_denied_tag(&self, name: &str) -> bool {
        self.denied_tags.contains(&name.to_ascii_lowercase())
    }

    /// True if either the HTML or the SVG allowlist accepts the whole name.
    pub fn is_allowed_attribute(&self, name: &str) -> bool {
        self.html_attributes.matches(name) || self.svg_attributes.matches(name)
    }

    /// True if the attribute's value is followed or loaded as a URI.
    pub fn is_uri_bearing(&self, name: &str) -> bool {
        self.uri_attributes.contains(&name.to_ascii_lowercase())
    }

    /// True if the value starts with a denied scheme.
    pub fn is_dangerous_uri_value(&self, value: &str) -> bool {
        self.dangerous_schemes.matches_value(value)
    }

    /// True for inline event handler names: the prefix followed by at least
    /// one non-whitespace character, and nothing but non-whitespace after it.
    pub fn is_event_handler_attribute(&self, name: &str) -> bool {
        is_handler_name(&self.event_handler_prefix, &name.to_ascii_lowercase())
    }

    /// Denied tag names, sorted.
    pub fn denied_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.denied_tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn event_handler_prefix(&self) -> &str {
        &self.event_handler_prefix
    }

    /// The policy in table form.
    pub fn tables(&self) -> PolicyTables {
        let mut uri_attributes: Vec<String> = self.uri_attributes.iter().cloned().collect();
        uri_attributes.sort();

        PolicyTables {
            denied_tags: self.denied_tags().into_iter().map(str::to_string).collect(),
            html_attributes: self.html_attributes.rules().iter().map(NameRule::to_entry).collect(),
            svg_attributes: self.svg_attributes.rules().iter().map(NameRule::to_entry).collect(),
            uri_attributes,
            dangerous_schemes: self.dangerous_schemes.schemes(),
            event_handler_prefix: self.event_handler_prefix.clone(),
        }
    }
}

impl Default for SanitizerPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

fn lowercase_set(entries: &[&str]) -> HashSet<String> {
    entries.iter().map(|entry| entry.to_ascii_lowercase()).collect()
}

fn is_handler_name(prefix: &str, lowered: &str) -> bool {
    lowered.len() > prefix.len()
        && lowered.starts_with(prefix)
        && !lowered[prefix.len()..].chars().any(char::is_whitespace)
}

/// Serializable form of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTables {
    pub denied_tags: Vec<String>,
    pub html_attributes: Vec<String>,
    pub svg_attributes: Vec<String>,
    pub uri_attributes: Vec<String>,
    pub dangerous_schemes: Vec<String>,
    pub event_handler_prefix: String,
}

impl Default for PolicyTables {
    fn default() -> Self {
        fn owned(entries: &[&str]) -> Vec<String> {
            entries.iter().map(|entry| entry.to_string()).collect()
        }

        Self {
            denied_tags: owned(defaults::DENIED_TAGS),
            html_attributes: owned(defaults::HTML_ATTRIBUTES),
            svg_attributes: owned(defaults::SVG_ATTRIBUTES),
            uri_attributes: owned(defaults::URI_ATTRIBUTES),
            dangerous_schemes: owned(defaults::DANGEROUS_SCHEMES),
            event_handler_prefix: defaults::EVENT_HANDLER_PREFIX.to_string(),
        }
    }
}

impl PolicyTables {
    /// Validates the tables and builds the policy.
    pub fn into_policy(self) -> SecurityResult<SanitizerPolicy> {
        SanitizerPolicyBuilder::new()
            .deny_tags(self.denied_tags)
            .allow_html_attributes(self.html_attributes)
            .allow_svg_attributes(self.svg_attributes)
            .uri_attributes(self.uri_attributes)
            .dangerous_schemes(self.dangerous_schemes)
            .event_handler_prefix(self.event_handler_prefix)
            .build()
    }
}

/// Builder for creating SanitizerPolicy instances.
///
/// Starts empty; use [`SanitizerPolicyBuilder::standard`] to extend the
/// built-in tables instead.
#[derive(Debug, Default, Clone)]
pub struct SanitizerPolicyBuilder {
    denied_tags: Vec<String>,
    html_attributes: Vec<String>,
    svg_attributes: Vec<String>,
    uri_attributes: Vec<String>,
    dangerous_schemes: Vec<String>,
    event_handler_prefix: Option<String>,
}

impl SanitizerPolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder preloaded with the built-in tables.
    pub fn standard() -> Self {
        let tables = PolicyTables::default();
        Self {
            denied_tags: tables.denied_tags,
            html_attributes: tables.html_attributes,
            svg_attributes: tables.svg_attributes,
            uri_attributes: tables.uri_attributes,
            dangerous_schemes: tables.dangerous_schemes,
            event_handler_prefix: Some(tables.event_handler_prefix),
        }
    }

    /// Adds tags to the denylist. Input is converted to lowercase.
    pub fn deny_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.denied_tags.extend(tags.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Adds rules to the HTML attribute allowlist.
    pub fn allow_html_attributes<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.html_attributes.extend(rules.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Adds rules to the SVG attribute allowlist.
    pub fn allow_svg_attributes<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.svg_attributes.extend(rules.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Marks attributes as URI-bearing.
    pub fn uri_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.uri_attributes.extend(names.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Adds schemes that must never appear in a URI-bearing value.
    pub fn dangerous_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dangerous_schemes.extend(schemes.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Sets the event handler prefix. Defaults to `on`.
    pub fn event_handler_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.event_handler_prefix = Some(prefix.into());
        self
    }

    /// Constructs the final SanitizerPolicy.
    /// Performs validation on the configured rules.
    pub fn build(self) -> SecurityResult<SanitizerPolicy> {
        let event_handler_prefix = self
            .event_handler_prefix
            .unwrap_or_else(|| defaults::EVENT_HANDLER_PREFIX.to_string())
            .trim()
            .to_ascii_lowercase();
        if event_handler_prefix.is_empty() {
            return Err(SecurityError::InvalidConfiguration(
                "event handler prefix cannot be empty".to_string(),
            ));
        }
        if let NameRule::Prefix(_) = NameRule::parse(&event_handler_prefix)? {
            return Err(SecurityError::InvalidConfiguration(
                "event handler prefix is already a prefix; drop the trailing '*'".to_string(),
            ));
        }

        let denied_tags = exact_names(&self.denied_tags)?;
        let uri_attributes = exact_names(&self.uri_attributes)?;

        let mut html_attributes = NameMatcher::new();
        let mut svg_attributes = NameMatcher::new();
        for (matcher, rules) in [
            (&mut html_attributes, &self.html_attributes),
            (&mut svg_attributes, &self.svg_attributes),
        ] {
            for raw in rules {
                let rule = NameRule::parse(raw)?;
                if admits_handlers(&rule, &event_handler_prefix) {
                    return Err(SecurityError::InvalidRule {
                        rule: raw.clone(),
                        reason: "allowlist rule would admit inline event handlers".to_string(),
                    });
                }
                matcher.insert(rule);
            }
        }

        let dangerous_schemes = SchemeMatcher::from_schemes(&self.dangerous_schemes)?;
        if dangerous_schemes.is_empty() && !uri_attributes.is_empty() {
            log::warn!("sanitizer policy has URI-bearing attributes but no dangerous schemes");
        }

        log::debug!(
            "built sanitizer policy: {} denied tags, {} html rules, {} svg rules, {} uri attributes",
            denied_tags.len(),
            html_attributes.len(),
            svg_attributes.len(),
            uri_attributes.len()
        );

        Ok(SanitizerPolicy {
            denied_tags,
            html_attributes,
            svg_attributes,
            uri_attributes,
            dangerous_schemes,
            event_handler_prefix,
        })
    }
}

fn exact_names(entries: &[String]) -> SecurityResult<HashSet<String>> {
    let mut names = HashSet::new();
    for raw in entries {
        match NameRule::parse(raw)? {
            NameRule::Exact(name) => {
                names.insert(name);
            }
            NameRule::Prefix(_) => {
                return Err(SecurityError::InvalidRule {
                    rule: raw.clone(),
                    reason: "wildcards are only supported in attribute allowlists".to_string(),
                });
            }
        }
    }
    Ok(names)
}

fn admits_handlers(rule: &NameRule, prefix: &str) -> bool {
    match rule {
        NameRule::Exact(name) => is_handler_name(prefix, name),
        NameRule::Prefix(start) => start.starts_with(prefix) || prefix.starts_with(start.as_str()),
    }
}
