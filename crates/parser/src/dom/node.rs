//! Defines the core Node structure and the tree edits the parser and the
//! sanitizer perform on it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use html5ever::{namespace_url, ns, Attribute as HtmlAttribute, LocalName, QualName};

use crate::dom::error::DomError;

/// Represents a single attribute (name-value pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl From<HtmlAttribute> for Attribute {
    fn from(attr: HtmlAttribute) -> Self {
        Attribute {
            name: attr.name,
            value: attr.value.to_string(),
        }
    }
}

impl Attribute {
    /// Creates an attribute with no namespace.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }

    /// The name as written in markup: `xlink:href` for prefixed attributes.
    pub fn qualified_name(&self) -> String {
        match &self.name.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name.local),
            None => self.name.local.to_string(),
        }
    }
}

/// A runtime event callback attached to an element by the host, separate
/// from any `on*` attribute in the markup.
#[derive(Clone)]
pub struct HandlerBinding(Arc<dyn Fn(&str) + Send + Sync>);

impl HandlerBinding {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// Fires the callback with the event name.
    pub fn invoke(&self, event: &str) {
        (self.0)(event)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerBinding(..)")
    }
}

/// Represents an HTML element within the DOM.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: QualName,
    pub attributes: Vec<Attribute>,
    /// Live handler bindings keyed by lowercased event attribute name.
    pub live_handlers: BTreeMap<String, HandlerBinding>,
}

impl Element {
    pub fn new(name: QualName, attributes: Vec<Attribute>) -> Self {
        Self {
            name,
            attributes,
            live_handlers: BTreeMap::new(),
        }
    }

    /// Helper to get the local name as a string slice.
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// Value of the attribute with this qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.qualified_name() == name)
            .map(|attr| attr.value.as_str())
    }

    /// Removes the attribute if present. Returns whether anything was removed.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|attr| attr.qualified_name() != name);
        self.attributes.len() != before
    }

    pub fn bind_handler(&mut self, name: &str, binding: HandlerBinding) {
        self.live_handlers.insert(name.to_ascii_lowercase(), binding);
    }

    /// Drops the live binding for `name`. Returns whether one existed.
    pub fn clear_handler(&mut self, name: &str) -> bool {
        self.live_handlers.remove(&name.to_ascii_lowercase()).is_some()
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerBinding> {
        self.live_handlers.get(&name.to_ascii_lowercase())
    }
}

/// Represents the different types of nodes in the DOM
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The document or fragment root
    Document,
    /// An HTML element
    Element(Element),
    /// A text node
    Text(String),
    /// A comment node
    Comment(String),
    /// A processing instruction
    ProcessingInstruction { target: String, data: String },
}

// Type alias for node handles
pub type NodeHandle = Arc<RwLock<Node>>;

/// Represents a node in the DOM tree.
#[derive(Debug)]
pub struct Node {
    /// The actual node data
    pub data: NodeData,
    /// Back link to the parent, empty for roots and detached nodes
    pub parent: Option<Weak<RwLock<Node>>>,
    /// Child nodes
    pub children: Vec<NodeHandle>,
}

impl Node {
    /// Create a new node with the given data
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a new node and wrap it in Arc<RwLock>
    pub fn create_new(data: NodeData) -> NodeHandle {
        Arc::new(RwLock::new(Self::new(data)))
    }

    /// Create a detached element node
    pub fn create_element(name: QualName, attributes: Vec<Attribute>) -> NodeHandle {
        Self::create_new(NodeData::Element(Element::new(name, attributes)))
    }

    /// Create a detached HTML element node from a tag name
    pub fn create_html_element(tag_name: &str, attributes: Vec<Attribute>) -> NodeHandle {
        Self::create_element(QualName::new(None, ns!(html), LocalName::from(tag_name)), attributes)
    }

    /// Create a detached text node
    pub fn create_text(text: impl Into<String>) -> NodeHandle {
        Self::create_new(NodeData::Text(text.into()))
    }

    /// Check if this node is an element
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.data {
            NodeData::Element(elem) => Some(elem),
            _ => None,
        }
    }

    /// Tag name if this node is an element
    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(Element::local_name)
    }

    /// Get element attributes if this is an element node
    pub fn element_attributes(&self) -> Option<&Vec<Attribute>> {
        self.as_element().map(|elem| &elem.attributes)
    }

    /// Get mutable element attributes if this is an element node
    pub fn element_attributes_mut(&mut self) -> Option<&mut Vec<Attribute>> {
        self.as_element_mut().map(|elem| &mut elem.attributes)
    }

    /// Binds a live handler on an element node.
    pub fn bind_handler(handle: &NodeHandle, name: &str, binding: HandlerBinding) -> Result<(), DomError> {
        let mut node = handle
            .write()
            .map_err(|_| DomError::InvalidOperation("node lock poisoned".to_string()))?;
        match node.as_element_mut() {
            Some(element) => {
                element.bind_handler(name, binding);
                Ok(())
            }
            None => Err(DomError::NotAnElement(name.to_string())),
        }
    }

    /// Parent handle, if the node is attached and the parent is alive.
    pub fn parent_of(handle: &NodeHandle) -> Option<NodeHandle> {
        handle
            .read()
            .ok()
            .and_then(|node| node.parent.as_ref().and_then(Weak::upgrade))
    }

    /// Snapshot of the children of a node.
    pub fn children_of(handle: &NodeHandle) -> Vec<NodeHandle> {
        handle
            .read()
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Detaches a node, with its whole subtree, from its parent.
    /// Detaching a node that has no parent is a no-op.
    pub fn detach(handle: &NodeHandle) {
        if let Some(parent) = Self::parent_of(handle) {
            if let Ok(mut parent_node) = parent.write() {
                parent_node.children.retain(|child| !Arc::ptr_eq(child, handle));
            }
        }
        if let Ok(mut node) = handle.write() {
            node.parent = None;
        }
    }

    fn set_parent(child: &NodeHandle, parent: &NodeHandle) {
        if let Ok(mut node) = child.write() {
            node.parent = Some(Arc::downgrade(parent));
        }
    }

    /// Appends a child node to a parent node, detaching it first.
    pub fn append_child(parent: &NodeHandle, child: NodeHandle) {
        Self::detach(&child);
        Self::set_parent(&child, parent);
        if let Ok(mut parent_node) = parent.write() {
            parent_node.children.push(child);
        }
    }

    /// Appends text, merging with a trailing text node.
    pub fn append_text(parent: &NodeHandle, text: &str) {
        if let Ok(mut parent_node) = parent.write() {
            if let Some(last) = parent_node.children.last() {
                if let Ok(mut last_node) = last.write() {
                    if let NodeData::Text(existing) = &mut last_node.data {
                        existing.push_str(text);
                        return;
                    }
                }
            }
            let text_node = Node::create_text(text);
            if let Ok(mut node) = text_node.write() {
                node.parent = Some(Arc::downgrade(parent));
            }
            parent_node.children.push(text_node);
        }
    }

    /// Inserts a node before a sibling. Does nothing if the sibling has no
    /// parent.
    pub fn insert_before(sibling: &NodeHandle, new_node: NodeHandle) {
        let parent = match Self::parent_of(sibling) {
            Some(parent) => parent,
            None => return,
        };
        Self::detach(&new_node);
        Self::set_parent(&new_node, &parent);
        if let Ok(mut parent_node) = parent.write() {
            let index = parent_node
                .children
                .iter()
                .position(|child| Arc::ptr_eq(child, sibling))
                .unwrap_or(parent_node.children.len());
            parent_node.children.insert(index, new_node);
        };
    }

    /// Inserts text before a sibling, merging with a preceding text node.
    pub fn insert_text_before(sibling: &NodeHandle, text: &str) {
        let parent = match Self::parent_of(sibling) {
            Some(parent) => parent,
            None => return,
        };
        if let Ok(mut parent_node) = parent.write() {
            let index = match parent_node
                .children
                .iter()
                .position(|child| Arc::ptr_eq(child, sibling))
            {
                Some(index) => index,
                None => return,
            };
            if index > 0 {
                if let Ok(mut previous) = parent_node.children[index - 1].write() {
                    if let NodeData::Text(existing) = &mut previous.data {
                        existing.push_str(text);
                        return;
                    }
                }
            }
            let text_node = Node::create_text(text);
            if let Ok(mut node) = text_node.write() {
                node.parent = Some(Arc::downgrade(&parent));
            }
            parent_node.children.insert(index, text_node);
        };
    }

    /// Moves all children from one node to the end of another.
    pub fn reparent_children(source: &NodeHandle, target: &NodeHandle) {
        let moved = match source.write() {
            Ok(mut source_node) => std::mem::take(&mut source_node.children),
            Err(_) => return,
        };
        for child in &moved {
            Self::set_parent(child, target);
        }
        if let Ok(mut target_node) = target.write() {
            target_node.children.extend(moved);
        }
    }
}

// Untrusted input can nest arbitrarily deep, so subtrees are torn down
// with an explicit stack instead of recursive drops.
impl Drop for Node {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(handle) = stack.pop() {
            if let Ok(lock) = Arc::try_unwrap(handle) {
                let mut node = lock.into_inner().unwrap_or_else(PoisonError::into_inner);
                stack.append(&mut node.children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html5ever::local_name;

    fn text_of(handle: &NodeHandle) -> String {
        match &handle.read().unwrap().data {
            NodeData::Text(text) => text.clone(),
            other => panic!("expected text node, got {:?}", other),
        }
    }

    #[test]
    fn test_element_creation() {
        let node = Node::create_html_element("div", vec![Attribute::new("class", "x")]);
        let node_guard = node.read().unwrap();
        let element = node_guard.as_element().expect("Expected Element node");
        assert_eq!(element.local_name(), "div");
        assert_eq!(element.name.local, local_name!("div"));
        assert_eq!(element.attribute("class"), Some("x"));
    }

    #[test]
    fn test_qualified_attribute_names() {
        let plain = Attribute::new("href", "#");
        assert_eq!(plain.qualified_name(), "href");

        let xlink = Attribute {
            name: QualName::new(
                Some(html5ever::Prefix::from("xlink")),
                ns!(xlink),
                local_name!("href"),
            ),
            value: "#a".to_string(),
        };
        assert_eq!(xlink.qualified_name(), "xlink:href");
    }

    #[test]
    fn test_append_and_detach() {
        let parent = Node::create_html_element("div", vec![]);
        let child = Node::create_html_element("span", vec![]);
        Node::append_child(&parent, child.clone());

        assert_eq!(Node::children_of(&parent).len(), 1);
        assert!(Arc::ptr_eq(&Node::parent_of(&child).unwrap(), &parent));

        Node::detach(&child);
        assert!(Node::children_of(&parent).is_empty());
        assert!(Node::parent_of(&child).is_none());

        // Detaching twice is harmless
        Node::detach(&child);
        assert!(Node::children_of(&parent).is_empty());
    }

    #[test]
    fn test_text_merging() {
        let parent = Node::create_html_element("p", vec![]);
        Node::append_text(&parent, "a");
        Node::append_text(&parent, "b");
        let children = Node::children_of(&parent);
        assert_eq!(children.len(), 1);
        assert_eq!(text_of(&children[0]), "ab");

        let marker = Node::create_html_element("br", vec![]);
        Node::append_child(&parent, marker.clone());
        Node::insert_text_before(&marker, "c");
        let children = Node::children_of(&parent);
        assert_eq!(children.len(), 2);
        assert_eq!(text_of(&children[0]), "abc");
    }

    #[test]
    fn test_insert_before_and_reparent() {
        let parent = Node::create_html_element("ul", vec![]);
        let second = Node::create_html_element("li", vec![]);
        Node::append_child(&parent, second.clone());
        let first = Node::create_html_element("ol", vec![]);
        Node::insert_before(&second, first.clone());

        let children = Node::children_of(&parent);
        assert!(Arc::ptr_eq(&children[0], &first));
        assert!(Arc::ptr_eq(&children[1], &second));

        let target = Node::create_html_element("div", vec![]);
        Node::reparent_children(&parent, &target);
        assert!(Node::children_of(&parent).is_empty());
        assert_eq!(Node::children_of(&target).len(), 2);
        assert!(Arc::ptr_eq(&Node::parent_of(&first).unwrap(), &target));
    }

    #[test]
    fn test_live_handlers() {
        let fired = Arc::new(RwLock::new(Vec::new()));
        let sink = fired.clone();
        let node = Node::create_html_element("p", vec![]);
        let binding = HandlerBinding::new(move |event| sink.write().unwrap().push(event.to_string()));
        Node::bind_handler(&node, "OnClick", binding).unwrap();
        {
            let guard = node.read().unwrap();
            guard.as_element().unwrap().handler("onclick").unwrap().invoke("click");
        }
        assert_eq!(*fired.read().unwrap(), vec!["click".to_string()]);
        let cleared = node.write().unwrap().as_element_mut().unwrap().clear_handler("onclick");
        assert!(cleared);

        let text = Node::create_text("hi");
        let err = Node::bind_handler(&text, "onclick", HandlerBinding::new(|_| {})).unwrap_err();
        assert!(matches!(err, DomError::NotAnElement(_)));
    }
}
