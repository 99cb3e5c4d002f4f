//! Render the arena back to markup through html5ever's serializer.

use std::io;

use html5ever::QualName;
use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};

use super::arena::{Dom, NodeData, NodeId};
use crate::error::Result;

/// A subtree handle the html5ever serializer can walk.
struct SerializableNode<'a> {
    dom: &'a Dom,
    id: NodeId,
}

enum SerializeOp {
    Open(NodeId),
    Close(QualName),
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let mut ops = match traversal_scope {
            TraversalScope::IncludeNode => vec![SerializeOp::Open(self.id)],
            TraversalScope::ChildrenOnly(_) => self.child_ops(self.id),
        };

        while let Some(op) = ops.pop() {
            match op {
                SerializeOp::Open(id) => {
                    let Some(node) = self.dom.get(id) else {
                        continue;
                    };
                    match &node.data {
                        NodeData::Element { name, attrs } => {
                            serializer.start_elem(
                                (**name).clone(),
                                attrs.iter().map(|a| (&a.name, a.value.as_str())),
                            )?;
                            ops.push(SerializeOp::Close((**name).clone()));
                            ops.extend(self.child_ops(id));
                        }
                        NodeData::Text(text) => serializer.write_text(text)?,
                        NodeData::Comment(text) => serializer.write_comment(text)?,
                        NodeData::Doctype { name } => serializer.write_doctype(name)?,
                        NodeData::Document => ops.extend(self.child_ops(id)),
                    }
                }
                SerializeOp::Close(name) => serializer.end_elem(name)?,
            }
        }
        Ok(())
    }
}

impl SerializableNode<'_> {
    /// Open operations for every child, reversed for the pop order.
    fn child_ops(&self, id: NodeId) -> Vec<SerializeOp> {
        let mut ops: Vec<_> = self.dom.children(id).map(SerializeOp::Open).collect();
        ops.reverse();
        ops
    }
}

/// Serialize the children of `root` (not `root` itself) to markup text.
pub fn serialize_children(dom: &Dom, root: NodeId) -> Result<String> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    serialize(&mut bytes, &SerializableNode { dom, id: root }, opts)?;
    Ok(String::from_utf8(bytes)?)
}
