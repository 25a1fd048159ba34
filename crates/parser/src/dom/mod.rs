//! The Document Object Model (DOM) representation for Quill.
//!
//! This module defines the core structures like Node, Element, and Attribute,
//! the working tree the sanitizer edits ([`Dom`]) and the tree handed back to
//! callers ([`Fragment`]).

pub mod error;
pub mod metrics;
pub mod node;

pub use error::DomError;
pub use metrics::DomMetrics;
pub use node::{Attribute, Element, HandlerBinding, Node, NodeData, NodeHandle};

use std::sync::Arc;

use crate::error::ParserResult;

/// A tree owned by one sanitization call.
#[derive(Debug)]
pub struct Dom {
    /// Container whose children are the content.
    root: NodeHandle,
    /// Metrics collected during the parsing and DOM construction process.
    metrics: Arc<DomMetrics>,
}

impl Dom {
    /// Creates a new, empty DOM with a root document node.
    pub fn new() -> Self {
        Self::from_root(Node::create_new(NodeData::Document), Arc::new(DomMetrics::new()))
    }

    /// Wraps an existing container node.
    pub fn from_root(root: NodeHandle, metrics: Arc<DomMetrics>) -> Self {
        Self { root, metrics }
    }

    /// Get the root handle.
    pub fn root(&self) -> NodeHandle {
        self.root.clone()
    }

    pub fn metrics(&self) -> &DomMetrics {
        &self.metrics
    }

    /// Top level content nodes.
    pub fn children(&self) -> Vec<NodeHandle> {
        Node::children_of(&self.root)
    }

    /// Every node below the root in document order.
    pub fn descendants(&self) -> Vec<NodeHandle> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeHandle> = self.children().into_iter().rev().collect();
        while let Some(handle) = stack.pop() {
            stack.extend(Node::children_of(&handle).into_iter().rev());
            result.push(handle);
        }
        result
    }

    /// Find elements by tag name, case-insensitively.
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeHandle> {
        self.descendants()
            .into_iter()
            .filter(|handle| {
                handle
                    .read()
                    .ok()
                    .and_then(|node| node.tag_name().map(|tag| tag.eq_ignore_ascii_case(tag_name)))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Count total elements in DOM
    pub fn count_elements(&self) -> usize {
        self.descendants()
            .iter()
            .filter(|handle| handle.read().map(|node| node.is_element()).unwrap_or(false))
            .count()
    }

    /// Concatenated text of all text nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for handle in self.descendants() {
            if let Ok(node) = handle.read() {
                if let NodeData::Text(content) = &node.data {
                    text.push_str(content);
                }
            }
        }
        text
    }

    /// Depth of the deepest node, counting top level content as depth 1.
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeHandle, usize)> =
            self.children().into_iter().map(|child| (child, 1)).collect();
        while let Some((handle, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(Node::children_of(&handle).into_iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    /// Serializes the content (not the root itself) as HTML.
    pub fn to_html(&self) -> ParserResult<String> {
        crate::html::serialize_children(&self.root)
    }

    /// Hands the content over as a fragment.
    pub fn into_fragment(self) -> Fragment {
        Fragment { root: self.root }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// A detached sequence of nodes, the tree form of sanitizer input and output.
#[derive(Debug)]
pub struct Fragment {
    root: NodeHandle,
}

impl Fragment {
    pub fn new() -> Self {
        Self {
            root: Node::create_new(NodeData::Document),
        }
    }

    /// Builds a fragment out of nodes, detaching them from wherever they are.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeHandle>,
    {
        let fragment = Self::new();
        for node in nodes {
            fragment.append(node);
        }
        fragment
    }

    pub fn append(&self, node: NodeHandle) {
        Node::append_child(&self.root, node);
    }

    pub fn children(&self) -> Vec<NodeHandle> {
        Node::children_of(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.children().is_empty()
    }

    pub fn to_html(&self) -> ParserResult<String> {
        crate::html::serialize_children(&self.root)
    }

    /// Turns the fragment into a working tree.
    pub fn into_dom(self) -> Dom {
        Dom::from_root(self.root, Arc::new(DomMetrics::new()))
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dom() -> Dom {
        let dom = Dom::new();
        let div = Node::create_html_element("div", vec![]);
        let p = Node::create_html_element("P", vec![]);
        Node::append_text(&p, "hello");
        Node::append_child(&div, p);
        Node::append_child(&dom.root(), div);
        Node::append_text(&dom.root(), " world");
        dom
    }

    #[test]
    fn test_descendants_in_document_order() {
        let dom = sample_dom();
        let tags: Vec<String> = dom
            .descendants()
            .iter()
            .map(|handle| {
                let node = handle.read().unwrap();
                node.tag_name().map(str::to_string).unwrap_or_else(|| "#text".to_string())
            })
            .collect();
        assert_eq!(tags, vec!["div", "P", "#text", "#text"]);
    }

    #[test]
    fn test_queries() {
        let dom = sample_dom();
        assert_eq!(dom.get_elements_by_tag_name("p").len(), 1);
        assert_eq!(dom.count_elements(), 2);
        assert_eq!(dom.text_content(), "hello world");
        assert_eq!(dom.max_depth(), 3);
    }

    #[test]
    fn test_fragment_round_trip() {
        let span = Node::create_html_element("span", vec![]);
        Node::append_text(&span, "x");
        let fragment = Fragment::from_nodes(vec![span.clone()]);
        assert!(!fragment.is_empty());
        assert!(Node::parent_of(&span).is_some());

        let dom = fragment.into_dom();
        assert_eq!(dom.children().len(), 1);
        assert_eq!(dom.to_html().unwrap(), "<span>x</span>");
    }
}
