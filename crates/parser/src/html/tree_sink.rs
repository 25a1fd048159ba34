//! Implementation of html5ever's TreeSink trait for building Quill's DOM.
//!
//! Comments and processing instructions are created on request of the tree
//! builder but never attached, so they are gone before any filter runs.

use std::borrow::Cow;
use std::sync::Arc;

use html5ever::{
    namespace_url, ns,
    tendril::StrTendril,
    tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink},
    Attribute as HtmlAttribute, ExpandedName, LocalName, QualName,
};

use crate::dom::{Attribute, Dom, DomMetrics, Node, NodeData, NodeHandle};

lazy_static::lazy_static! {
    static ref NON_ELEMENT_NAME: QualName =
        QualName::new(None, ns!(html), LocalName::from("#non-element"));
}

/// Handle given to html5ever. Element names are kept outside the node lock so
/// `elem_name` can hand out borrows.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    node: NodeHandle,
    name: Option<QualName>,
    annotation_xml_integration_point: bool,
}

impl SinkHandle {
    fn plain(node: NodeHandle) -> Self {
        Self {
            node,
            name: None,
            annotation_xml_integration_point: false,
        }
    }

    fn is_discarded(&self) -> bool {
        self.node
            .read()
            .map(|node| {
                matches!(
                    node.data,
                    NodeData::Comment(_) | NodeData::ProcessingInstruction { .. }
                )
            })
            .unwrap_or(true)
    }
}

/// The TreeSink implementation for Quill.
pub struct HtmlTreeSink {
    /// The document being built.
    document: NodeHandle,
    /// Document quirks mode.
    quirks_mode: QuirksMode,
    /// Metrics for the document being built
    metrics: Arc<DomMetrics>,
}

impl HtmlTreeSink {
    pub fn new(metrics: Arc<DomMetrics>) -> Self {
        HtmlTreeSink {
            document: Node::create_new(NodeData::Document),
            quirks_mode: QuirksMode::NoQuirks,
            metrics,
        }
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    fn convert_attributes(attrs: Vec<HtmlAttribute>) -> Vec<Attribute> {
        attrs.into_iter().map(Attribute::from).collect()
    }
}

impl TreeSink for HtmlTreeSink {
    type Output = Dom;
    type Handle = SinkHandle;

    fn finish(self) -> Self::Output {
        Dom::from_root(self.document, self.metrics)
    }

    fn parse_error(&mut self, msg: Cow<'static, str>) {
        self.metrics.increment_parse_errors();
        tracing::trace!("html parse error: {}", msg);
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    fn get_document(&mut self) -> Self::Handle {
        SinkHandle::plain(self.document.clone())
    }

    // Template contents live directly under the template element.
    fn get_template_contents(&mut self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Arc::ptr_eq(&x.node, &y.node)
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> ExpandedName<'a> {
        match &target.name {
            Some(name) => name.expanded(),
            None => NON_ELEMENT_NAME.expanded(),
        }
    }

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<HtmlAttribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        self.metrics.increment_elements_created();
        let node = Node::create_element(name.clone(), Self::convert_attributes(attrs));
        SinkHandle {
            node,
            name: Some(name),
            annotation_xml_integration_point: flags.mathml_annotation_xml_integration_point,
        }
    }

    fn create_comment(&mut self, text: StrTendril) -> Self::Handle {
        SinkHandle::plain(Node::create_new(NodeData::Comment(text.to_string())))
    }

    fn create_pi(&mut self, target: StrTendril, data: StrTendril) -> Self::Handle {
        SinkHandle::plain(Node::create_new(NodeData::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        }))
    }

    fn append(&mut self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(handle) => {
                if handle.is_discarded() {
                    self.metrics.increment_comments_discarded();
                    return;
                }
                Node::append_child(&parent.node, handle.node);
            }
            NodeOrText::AppendText(text) => {
                self.metrics.add_text_content(text.len());
                Node::append_text(&parent.node, &text);
            }
        }
    }

    fn append_before_sibling(&mut self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        match new_node {
            NodeOrText::AppendNode(handle) => {
                if handle.is_discarded() {
                    self.metrics.increment_comments_discarded();
                    return;
                }
                Node::insert_before(&sibling.node, handle.node);
            }
            NodeOrText::AppendText(text) => {
                self.metrics.add_text_content(text.len());
                Node::insert_text_before(&sibling.node, &text);
            }
        }
    }

    fn append_based_on_parent_node(
        &mut self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if Node::parent_of(&element.node).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &mut self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // Fragments carry no doctype.
    }

    fn add_attrs_if_missing(&mut self, target: &Self::Handle, attrs: Vec<HtmlAttribute>) {
        if let Ok(mut node_guard) = target.node.write() {
            if let Some(current_attrs) = node_guard.element_attributes_mut() {
                for attr in Self::convert_attributes(attrs) {
                    if !current_attrs.iter().any(|existing| existing.name == attr.name) {
                        current_attrs.push(attr);
                    }
                }
            }
        }
    }

    fn remove_from_parent(&mut self, target: &Self::Handle) {
        Node::detach(&target.node);
    }

    fn reparent_children(&mut self, node: &Self::Handle, new_parent: &Self::Handle) {
        Node::reparent_children(&node.node, &new_parent.node);
    }

    fn is_mathml_annotation_xml_integration_point(&self, handle: &Self::Handle) -> bool {
        handle.annotation_xml_integration_point
    }
}

/// Create a new HtmlTreeSink for parsing
pub fn create_html_sink(metrics: Arc<DomMetrics>) -> HtmlTreeSink {
    HtmlTreeSink::new(metrics)
}
