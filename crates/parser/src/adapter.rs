//! The tree interface the sanitizer works against, and the adapter for
//! Quill's own DOM.

use std::str::FromStr;

use crate::config::ParserConfig;
use crate::dom::{Dom, Fragment, Node, NodeHandle};
use crate::error::{ParserError, ParserResult};
use crate::{html, OutputMode, Sanitized};

/// An attribute as seen through a [`TreeAdapter`]: the name as written in
/// markup (`xlink:href`) and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    pub name: String,
    pub value: String,
}

impl AttributeEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Which elements a [`TreeAdapter::find_all`] call selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every element
    Universal,
    /// Elements whose local name is in the list (lowercase)
    AnyOf(Vec<String>),
}

impl Selector {
    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Selector::AnyOf(
            names
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }

    /// Whether an element with this local name is selected.
    pub fn matches(&self, local_name: &str) -> bool {
        match self {
            Selector::Universal => true,
            Selector::AnyOf(names) => names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(local_name)),
        }
    }
}

/// Parses `*` or a comma separated tag list such as `"script, iframe"`.
impl FromStr for Selector {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "*" {
            return Ok(Selector::Universal);
        }
        let names: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        let valid = names.iter().all(|name| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
        });
        if !valid {
            return Err(ParserError::InvalidSelector(s.to_string()));
        }
        Ok(Selector::any_of(names))
    }
}

/// The operations the sanitizer needs from a markup tree.
///
/// Implementations own parsing and serialization; the sanitizer only finds,
/// removes and edits nodes.
pub trait TreeAdapter {
    /// A whole working tree
    type Tree;
    /// A handle to one node of a tree
    type Node: Clone;
    /// The caller facing tree form, accepted as input and returned as output
    type Fragment;

    /// Parse markup text into a tree.
    fn parse(&self, markup: &str) -> ParserResult<Self::Tree>;

    /// Take ownership of a caller supplied fragment as a tree.
    fn adopt(&self, fragment: Self::Fragment) -> Self::Tree;

    /// All elements matching `selector`, in document order, root excluded.
    fn find_all(&self, tree: &Self::Tree, selector: &Selector) -> Vec<Self::Node>;

    /// Local name of an element node.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    /// Detach a node and its subtree. Removing a detached node is a no-op.
    fn remove(&self, node: &Self::Node);

    /// Attributes of an element, in document order.
    fn attributes(&self, node: &Self::Node) -> Vec<AttributeEntry>;

    /// Remove the attribute named exactly as reported by `attributes`.
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    /// Names of the live handler bindings on an element.
    fn live_handlers(&self, node: &Self::Node) -> Vec<String>;

    /// Drop a live handler binding. Returns whether one existed.
    fn clear_live_handler(&self, node: &Self::Node, name: &str) -> bool;

    /// Turn the tree into the requested output.
    fn serialize(&self, tree: Self::Tree, mode: OutputMode) -> ParserResult<Sanitized<Self::Fragment>>;
}

/// [`TreeAdapter`] over Quill's DOM, parsing with html5ever.
#[derive(Debug, Clone, Default)]
pub struct DomAdapter {
    config: ParserConfig,
}

impl DomAdapter {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

impl TreeAdapter for DomAdapter {
    type Tree = Dom;
    type Node = NodeHandle;
    type Fragment = Fragment;

    fn parse(&self, markup: &str) -> ParserResult<Dom> {
        html::parse_fragment(markup, &self.config)
    }

    fn adopt(&self, fragment: Fragment) -> Dom {
        fragment.into_dom()
    }

    fn find_all(&self, tree: &Dom, selector: &Selector) -> Vec<NodeHandle> {
        tree.descendants()
            .into_iter()
            .filter(|handle| {
                handle
                    .read()
                    .ok()
                    .and_then(|node| node.tag_name().map(|tag| selector.matches(tag)))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn tag_name(&self, node: &NodeHandle) -> Option<String> {
        node.read().ok()?.tag_name().map(str::to_string)
    }

    fn remove(&self, node: &NodeHandle) {
        Node::detach(node);
    }

    fn attributes(&self, node: &NodeHandle) -> Vec<AttributeEntry> {
        node.read()
            .ok()
            .and_then(|guard| {
                guard.element_attributes().map(|attrs| {
                    attrs
                        .iter()
                        .map(|attr| AttributeEntry::new(attr.qualified_name(), attr.value.clone()))
                        .collect()
                })
            })
            .unwrap_or_default()
    }

    fn remove_attribute(&self, node: &NodeHandle, name: &str) {
        if let Ok(mut guard) = node.write() {
            if let Some(element) = guard.as_element_mut() {
                element.remove_attribute(name);
            }
        }
    }

    fn live_handlers(&self, node: &NodeHandle) -> Vec<String> {
        node.read()
            .ok()
            .and_then(|guard| {
                guard
                    .as_element()
                    .map(|element| element.live_handlers.keys().cloned().collect())
            })
            .unwrap_or_default()
    }

    fn clear_live_handler(&self, node: &NodeHandle, name: &str) -> bool {
        node.write()
            .ok()
            .and_then(|mut guard| guard.as_element_mut().map(|element| element.clear_handler(name)))
            .unwrap_or(false)
    }

    fn serialize(&self, tree: Dom, mode: OutputMode) -> ParserResult<Sanitized<Fragment>> {
        match mode {
            OutputMode::Html => tree.to_html().map(Sanitized::Html),
            OutputMode::Fragment => Ok(Sanitized::Fragment(tree.into_fragment())),
        }
    }
}
