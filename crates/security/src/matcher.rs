//! Name and scheme matchers backing the policy tables.
//!
//! A [`NameMatcher`] is an exact-match set plus a list of prefix-wildcard
//! rules. Rules are written the way they appear in the tables: `class` must
//! equal the whole attribute name, `data-*` accepts any name that starts with
//! `data-` and has at least one more character. Nothing else is a prefix
//! match, so `classx`, `srcx` or `onclick2` never ride on a listed name.
//!
//! Every comparison is ASCII case-insensitive.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::error::{SecurityError, SecurityResult};

lazy_static! {
    static ref RULE_NAME: Regex =
        Regex::new(r"^[a-z_][a-z0-9_.:\-]*$").expect("rule name pattern is valid");
    static ref SCHEME_NAME: Regex =
        Regex::new(r"^[a-z][a-z0-9+.\-]*$").expect("scheme pattern is valid");
}

/// A single allow rule for tag or attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameRule {
    /// The whole name must equal this string.
    Exact(String),
    /// The name must start with this string and be strictly longer.
    Prefix(String),
}

impl NameRule {
    /// Parses a table entry. A trailing `*` turns the entry into a prefix rule.
    pub fn parse(rule: &str) -> SecurityResult<Self> {
        let lowered = rule.trim().to_ascii_lowercase();
        let (body, wildcard) = match lowered.strip_suffix('*') {
            Some(body) => (body, true),
            None => (lowered.as_str(), false),
        };

        if body.is_empty() {
            let reason = if wildcard {
                "a bare wildcard would match every name"
            } else {
                "empty rule"
            };
            return Err(SecurityError::InvalidRule {
                rule: rule.to_string(),
                reason: reason.to_string(),
            });
        }

        if !RULE_NAME.is_match(body) {
            return Err(SecurityError::InvalidRule {
                rule: rule.to_string(),
                reason: "not a valid tag or attribute name".to_string(),
            });
        }

        Ok(Self::classify(body, wildcard))
    }

    /// Classifies a built-in table entry without validation.
    fn trusted(entry: &str) -> Self {
        let lowered = entry.to_ascii_lowercase();
        match lowered.strip_suffix('*') {
            Some(body) => Self::classify(body, true),
            None => Self::classify(&lowered, false),
        }
    }

    fn classify(body: &str, wildcard: bool) -> Self {
        if wildcard {
            NameRule::Prefix(body.to_string())
        } else {
            NameRule::Exact(body.to_string())
        }
    }

    /// Checks an already lowercased name against this rule.
    pub fn matches(&self, lowered: &str) -> bool {
        match self {
            NameRule::Exact(name) => name == lowered,
            NameRule::Prefix(prefix) => {
                lowered.len() > prefix.len() && lowered.starts_with(prefix.as_str())
            }
        }
    }

    /// Table form of the rule, `data-*` style for prefixes.
    pub fn to_entry(&self) -> String {
        match self {
            NameRule::Exact(name) => name.clone(),
            NameRule::Prefix(prefix) => format!("{}*", prefix),
        }
    }
}

/// Exact set plus prefix-wildcard rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMatcher {
    exact: HashSet<String>,
    prefixes: Vec<String>,
}

impl NameMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matcher from table entries, validating each one.
    pub fn from_rules<I, S>(rules: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::new();
        for rule in rules {
            matcher.insert(NameRule::parse(rule.as_ref())?);
        }
        Ok(matcher)
    }

    /// Builds a matcher from the built-in tables.
    pub(crate) fn from_trusted(entries: &[&str]) -> Self {
        let mut matcher = Self::new();
        for entry in entries {
            matcher.insert(NameRule::trusted(entry));
        }
        matcher
    }

    pub fn insert(&mut self, rule: NameRule) {
        match rule {
            NameRule::Exact(name) => {
                self.exact.insert(name);
            }
            NameRule::Prefix(prefix) => {
                if !self.prefixes.contains(&prefix) {
                    self.prefixes.push(prefix);
                }
            }
        }
    }

    /// True if `name` equals an exact entry or extends a prefix entry.
    pub fn matches(&self, name: &str) -> bool {
        let lowered = name.to_ascii_lowercase();
        self.exact.contains(&lowered)
            || self
                .prefixes
                .iter()
                .any(|prefix| lowered.len() > prefix.len() && lowered.starts_with(prefix.as_str()))
    }

    /// All rules, sorted so table dumps are stable.
    pub fn rules(&self) -> Vec<NameRule> {
        let mut rules: Vec<NameRule> = self
            .exact
            .iter()
            .cloned()
            .map(NameRule::Exact)
            .chain(self.prefixes.iter().cloned().map(NameRule::Prefix))
            .collect();
        rules.sort_by_key(|rule| rule.to_entry());
        rules
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Set of URI schemes that must never appear in a URI-bearing value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeMatcher {
    schemes: HashSet<String>,
}

impl SchemeMatcher {
    /// Builds a matcher, rejecting names that cannot be URI schemes.
    pub fn from_schemes<I, S>(schemes: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for scheme in schemes {
            let raw = scheme.as_ref();
            let lowered = raw.trim().trim_end_matches(':').to_ascii_lowercase();
            if !SCHEME_NAME.is_match(&lowered) {
                return Err(SecurityError::InvalidRule {
                    rule: raw.to_string(),
                    reason: "not a valid URI scheme".to_string(),
                });
            }
            set.insert(lowered);
        }
        Ok(Self { schemes: set })
    }

    pub(crate) fn from_trusted(schemes: &[&str]) -> Self {
        Self {
            schemes: schemes.iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.schemes.contains(&scheme.to_ascii_lowercase())
    }

    /// True if `value` starts with one of the schemes once the obfuscation a
    /// browser URL parser ignores is removed.
    pub fn matches_value(&self, value: &str) -> bool {
        if let Some(scheme) = leading_scheme(value) {
            if self.schemes.contains(&scheme) {
                return true;
            }
        }

        match Url::parse(value) {
            Ok(url) => self.schemes.contains(url.scheme()),
            Err(_) => false,
        }
    }

    /// Schemes in sorted order.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.schemes.iter().cloned().collect();
        schemes.sort();
        schemes
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

/// Lowercased scheme of `value`: leading controls and spaces are skipped and
/// tab, CR and LF are dropped wherever they occur.
fn leading_scheme(value: &str) -> Option<String> {
    let mut scheme = String::new();
    for c in value.trim_start_matches(|c: char| c <= ' ').chars() {
        match c {
            '\t' | '\n' | '\r' => continue,
            ':' => return if scheme.is_empty() { None } else { Some(scheme) },
            c if c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.') => {
                scheme.push(c.to_ascii_lowercase())
            }
            _ => return None,
        }
    }
    None
}
