//! Writes a DOM subtree back out through html5ever's HTML serializer.

use std::collections::VecDeque;
use std::io;

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::{local_name, namespace_url, ns};
use markup5ever::serialize::{Serialize, Serializer, TraversalScope};
use markup5ever::QualName;

use crate::dom::{NodeData, NodeHandle};
use crate::error::{ParserError, ParserResult};

enum SerializeOp {
    Open(NodeHandle),
    Close(QualName),
}

/// The parser drops a single newline right after the start tag of these
/// elements, so one has to be written back for text that begins with one.
fn eats_leading_newline(name: &QualName) -> bool {
    name.ns == ns!(html)
        && matches!(
            name.local,
            local_name!("pre") | local_name!("listing") | local_name!("textarea")
        )
}

fn starts_with_newline(handle: &NodeHandle) -> io::Result<bool> {
    let node = handle.read().map_err(|_| poisoned())?;
    Ok(matches!(&node.data, NodeData::Text(text) if text.starts_with('\n')))
}

/// A node handle that html5ever can serialize.
pub struct SerializableHandle(NodeHandle);

impl From<NodeHandle> for SerializableHandle {
    fn from(handle: NodeHandle) -> Self {
        SerializableHandle(handle)
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "node lock poisoned")
}

impl Serialize for SerializableHandle {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let mut ops = VecDeque::new();
        match traversal_scope {
            TraversalScope::IncludeNode => ops.push_back(SerializeOp::Open(self.0.clone())),
            TraversalScope::ChildrenOnly(_) => {
                let node = self.0.read().map_err(|_| poisoned())?;
                ops.extend(node.children.iter().cloned().map(SerializeOp::Open));
            }
        }

        while let Some(op) = ops.pop_front() {
            match op {
                SerializeOp::Open(handle) => {
                    let node = handle.read().map_err(|_| poisoned())?;
                    match &node.data {
                        NodeData::Element(element) => {
                            serializer.start_elem(
                                element.name.clone(),
                                element
                                    .attributes
                                    .iter()
                                    .map(|attr| (&attr.name, attr.value.as_str())),
                            )?;
                            if eats_leading_newline(&element.name) {
                                if let Some(first) = node.children.first() {
                                    if starts_with_newline(first)? {
                                        serializer.write_text("\n")?;
                                    }
                                }
                            }
                            ops.reserve(node.children.len() + 1);
                            ops.push_front(SerializeOp::Close(element.name.clone()));
                            for child in node.children.iter().rev() {
                                ops.push_front(SerializeOp::Open(child.clone()));
                            }
                        }
                        NodeData::Document => {
                            for child in node.children.iter().rev() {
                                ops.push_front(SerializeOp::Open(child.clone()));
                            }
                        }
                        NodeData::Text(text) => serializer.write_text(text)?,
                        NodeData::Comment(text) => serializer.write_comment(text)?,
                        NodeData::ProcessingInstruction { target, data } => {
                            serializer.write_processing_instruction(target, data)?
                        }
                    }
                }
                SerializeOp::Close(name) => serializer.end_elem(name)?,
            }
        }

        Ok(())
    }
}

/// Serializes the children of `root` as HTML text.
pub fn serialize_children(root: &NodeHandle) -> ParserResult<String> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    serialize(&mut bytes, &SerializableHandle::from(root.clone()), opts)
        .map_err(|e| ParserError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ParserError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Attribute, Node};

    #[test]
    fn test_escaping_and_void_elements() {
        let root = Node::create_new(NodeData::Document);
        let p = Node::create_html_element("p", vec![Attribute::new("title", "a\"b")]);
        Node::append_text(&p, "1 < 2 & 3");
        Node::append_child(&root, p);
        Node::append_child(&root, Node::create_html_element("br", vec![]));

        assert_eq!(
            serialize_children(&root).unwrap(),
            "<p title=\"a&quot;b\">1 &lt; 2 &amp; 3</p><br>"
        );
    }

    #[test]
    fn test_leading_newline_in_pre_is_preserved() {
        let root = Node::create_new(NodeData::Document);
        let pre = Node::create_html_element("pre", vec![]);
        Node::append_text(&pre, "\nx");
        Node::append_child(&root, pre);
        let listing = Node::create_html_element("listing", vec![]);
        Node::append_text(&listing, "y\n");
        Node::append_child(&root, listing);

        assert_eq!(
            serialize_children(&root).unwrap(),
            "<pre>\n\nx</pre><listing>y\n</listing>"
        );
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let root = Node::create_new(NodeData::Document);
        let mut current = root.clone();
        for _ in 0..10_000 {
            let child = Node::create_html_element("b", vec![]);
            Node::append_child(&current, child.clone());
            current = child;
        }
        let html = serialize_children(&root).unwrap();
        assert_eq!(html.len(), 10_000 * "<b></b>".len());
    }
}
