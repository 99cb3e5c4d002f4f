//! Text extraction and text-node lookups.

use super::arena::{Dom, NodeData, NodeId};

/// Flattened text content of a subtree.
///
/// Line breaks contribute `\n` and non-breaking spaces become plain spaces.
/// The editor marks a bare space with an attribute-less, childless `span`,
/// which contributes a single space.
pub fn flattened_text(dom: &Dom, root: NodeId) -> String {
    let mut out = String::new();
    push_text(dom, root, &mut out);
    out
}

fn push_text(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Text(text) => out.extend(text.chars().map(|c| if c == '\u{a0}' { ' ' } else { c })),
        NodeData::Element { name, attrs } => match name.local.as_ref() {
            "br" => out.push('\n'),
            "span" if attrs.is_empty() && node.first_child.is_none() => out.push(' '),
            _ => {
                for child in dom.children(id) {
                    push_text(dom, child, out);
                }
            }
        },
        NodeData::Document => {
            for child in dom.children(id) {
                push_text(dom, child, out);
            }
        }
        NodeData::Comment(_) | NodeData::Doctype { .. } => {}
    }
}

/// Every text node at or below `root`, in document order.
pub fn text_nodes(dom: &Dom, root: NodeId) -> Vec<NodeId> {
    dom.descendants(root).filter(|&id| dom.is_text(id)).collect()
}

/// Last text node below `root` whose content is not blank.
pub fn last_text_node(dom: &Dom, root: NodeId) -> Option<NodeId> {
    text_nodes(dom, root)
        .into_iter()
        .rev()
        .find(|&id| dom.text(id).is_some_and(|t| !t.trim().is_empty()))
}

/// Sibling just before `id`, stepping out of inline ancestors when `id`
/// opens one. `None` at the start of the enclosing block.
pub fn prev_in_block(dom: &Dom, id: NodeId) -> Option<NodeId> {
    let mut node = id;
    loop {
        if let Some(prev) = dom.prev_sibling(node) {
            return Some(prev);
        }
        let parent = dom.parent(node)?;
        if dom.parent_block(parent) == parent {
            return None;
        }
        node = parent;
    }
}

/// Sibling just after `id`, stepping out of inline ancestors when `id`
/// closes one. `None` at the end of the enclosing block.
pub fn next_in_block(dom: &Dom, id: NodeId) -> Option<NodeId> {
    let mut node = id;
    loop {
        if let Some(next) = dom.next_sibling(node) {
            return Some(next);
        }
        let parent = dom.parent(node)?;
        if dom.parent_block(parent) == parent {
            return None;
        }
        node = parent;
    }
}
