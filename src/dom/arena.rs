//! Arena-based DOM for editor exports.
//!
//! Nodes live in a contiguous vector and link to each other by index. Parent
//! links are plain indices, never ownership: a node belongs to exactly one
//! parent's child list, and moving it means detaching it first. Detached
//! nodes stay in the arena until the whole `Dom` is dropped.

use html5ever::{LocalName, QualName, ns};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    fn option(self) -> Option<NodeId> {
        self.is_some().then_some(self)
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and attributes. The name is boxed so references
    /// handed to the parser stay put when the arena reallocates.
    Element {
        name: Box<QualName>,
        attrs: Vec<Attribute>,
    },
    /// Text content.
    Text(String),
    /// Comment (kept so the serializer can round-trip it).
    Comment(String),
    /// Document type declaration.
    Doctype { name: String },
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Build an attribute in the null namespace.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }

    /// Local name of the attribute.
    pub fn key(&self) -> &str {
        self.name.local.as_ref()
    }
}

/// A node in the arena DOM.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Tags that own the inline content inside them.
const BLOCK_TAGS: &[&str] = &["p", "div", "li", "td", "th"];

/// Arena-based DOM tree.
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Dom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a detached element from a parsed qualified name.
    pub fn create_qualified(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element {
            name: Box::new(name),
            attrs,
        }))
    }

    /// Create a detached HTML element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_qualified(html_name(tag), Vec::new())
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text.into())))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self, name: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype { name }))
    }

    /// Append a detached child to the end of a parent's children.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if last_child.is_some() {
            if let Some(last_node) = self.get_mut(last_child) {
                last_node.next_sibling = child;
            }
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a detached node immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let parent = self.get(sibling).map(|n| n.parent).unwrap_or(NodeId::NONE);
        let prev = self
            .get(sibling)
            .map(|n| n.prev_sibling)
            .unwrap_or(NodeId::NONE);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Unlink a node from its parent and siblings.
    ///
    /// The node keeps its own children, so a detached subtree can be
    /// re-attached elsewhere. Detaching a node with no parent is a no-op.
    pub fn detach(&mut self, target: NodeId) -> NodeId {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return target,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
        target
    }

    /// Remove `child` from `parent` and hand it back for reuse.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        debug_assert_eq!(self.parent(child), Some(parent), "not a child of parent");
        self.detach(child)
    }

    /// Move every child of `old_parent`, in order, to the end of `new_parent`.
    pub fn reparent_children(&mut self, old_parent: NodeId, new_parent: NodeId) {
        while let Some(child) = self.first_child(old_parent) {
            self.detach(child);
            self.append(new_parent, child);
        }
    }

    /// Move every child of `node` to just before `node`, in order.
    pub fn hoist_children(&mut self, node: NodeId) {
        while let Some(child) = self.first_child(node) {
            self.detach(child);
            self.insert_before(node, child);
        }
    }

    /// Replace `old` with the detached node `new` at the same position.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Detach and discard every child of a node.
    pub fn remove_all_children(&mut self, node: NodeId) {
        while let Some(child) = self.first_child(node) {
            self.detach(child);
        }
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child) {
            if let NodeData::Text(ref mut existing) = last.data {
                existing.push_str(text);
                return;
            }
        }

        let text_node = self.create_text(text);
        self.append(parent, text_node);
    }

    /// Get the number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the DOM is empty (only has document root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Iterate over a node and all its descendants in document order.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            root,
            next: root.option(),
        }
    }

    /// Find the first node matching a predicate (document order).
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(self.document)
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    /// Find element by tag name (first match).
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| match &node.data {
            NodeData::Element { name, .. } => name.local.as_ref() == tag,
            _ => false,
        })
    }

    /// Find the element under `root` whose `id` attribute equals `id`.
    pub fn find_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root)
            .find(|&n| self.get_attr(n, "id") == Some(id))
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    dom: &'a Dom,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let node = self.dom.get(current)?;

        self.next = if node.first_child.is_some() {
            Some(node.first_child)
        } else {
            // Climb until a next sibling exists, never leaving the subtree
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break None;
                }
                let n = self.dom.get(cursor)?;
                if n.next_sibling.is_some() {
                    break Some(n.next_sibling);
                }
                cursor = n.parent;
                if cursor.is_none() {
                    break None;
                }
            }
        };
        Some(current)
    }
}

/// Structural navigation.
impl Dom {
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.option())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.option())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.option())
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.option())
    }

    /// Nearest following sibling that is an element.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(sib) = current {
            if self.is_element(sib) {
                return Some(sib);
            }
            current = self.next_sibling(sib);
        }
        None
    }

    /// Nearest preceding sibling that is an element.
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.prev_sibling(id);
        while let Some(sib) = current {
            if self.is_element(sib) {
                return Some(sib);
            }
            current = self.prev_sibling(sib);
        }
        None
    }

    /// Number of direct children.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// True when `id` has no siblings at all, text nodes included.
    pub fn is_only_child(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| n.prev_sibling.is_none() && n.next_sibling.is_none())
    }

    /// Nearest block-level container at or above `id`.
    ///
    /// Falls back to the topmost ancestor when no block tag is found.
    pub fn parent_block(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            if self.tag(current).is_some_and(|t| BLOCK_TAGS.contains(&t)) {
                return current;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// True when `id` is `root` or sits somewhere beneath it.
    pub fn is_attached_to(&self, id: NodeId, root: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }
}

/// Convenience methods for element nodes.
impl Dom {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Get element's qualified name.
    pub fn qual_name(&self, id: NodeId) -> Option<&QualName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&**name),
            _ => None,
        })
    }

    /// Tag name as a string slice.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element_name(id).map(|n| n.as_ref())
    }

    /// Check whether `id` is an element with the given tag.
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    /// Rename an element in place, keeping attributes and children.
    pub fn rename(&mut self, id: NodeId, tag: &str) {
        if let Some(Node {
            data: NodeData::Element { name, .. },
            ..
        }) = self.get_mut(id)
        {
            **name = html_name(tag);
        }
    }

    /// Attributes of an element (empty for other nodes).
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Mutable attribute list of an element.
    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attribute>> {
        self.get_mut(id).and_then(|n| match &mut n.data {
            NodeData::Element { attrs, .. } => Some(attrs),
            _ => None,
        })
    }

    /// Get the first attribute value with this name.
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.key() == attr_name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, overwriting the first existing one of that name.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(attrs) = self.attrs_mut(id) {
            match attrs.iter_mut().find(|a| a.key() == attr_name) {
                Some(attr) => attr.value = value,
                None => attrs.push(Attribute::new(attr_name, value)),
            }
        }
    }

    /// Drop every attribute of an element.
    pub fn clear_attrs(&mut self, id: NodeId) {
        if let Some(attrs) = self.attrs_mut(id) {
            attrs.clear();
        }
    }

    /// Whitespace-separated class tokens.
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.get_attr(id, "class")
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    /// Check if node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Check if node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Get content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Get mutable content of a text node.
    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        self.get_mut(id).and_then(|n| match &mut n.data {
            NodeData::Text(s) => Some(s),
            _ => None,
        })
    }
}

/// Qualified name for an HTML element.
pub fn html_name(tag: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(dom: &mut Dom, parent: NodeId, tag: &str) -> NodeId {
        let id = dom.create_element(tag);
        dom.append(parent, id);
        id
    }

    fn tags(dom: &Dom, parent: NodeId) -> Vec<String> {
        dom.children(parent)
            .map(|c| match dom.tag(c) {
                Some(t) => t.to_string(),
                None => format!("#{}", dom.text(c).unwrap_or("")),
            })
            .collect()
    }

    #[test]
    fn test_append_children() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let parent = element(&mut dom, doc, "div");
        let child1 = element(&mut dom, parent, "p");
        let child2 = element(&mut dom, parent, "p");

        let children: Vec<_> = dom.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
        assert_eq!(dom.parent(child1), Some(parent));
        assert_eq!(dom.next_sibling(child1), Some(child2));
        assert_eq!(dom.prev_sibling(child2), Some(child1));
    }

    #[test]
    fn test_remove_child_returns_node() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let parent = element(&mut dom, doc, "div");
        let a = element(&mut dom, parent, "a");
        let b = element(&mut dom, parent, "b");
        let i = element(&mut dom, parent, "i");

        let removed = dom.remove_child(parent, b);
        assert_eq!(removed, b);
        assert_eq!(tags(&dom, parent), vec!["a", "i"]);
        assert_eq!(dom.parent(b), None);
        assert_eq!(dom.next_sibling(a), Some(i));

        // Reuse the removed node elsewhere
        dom.insert_before(a, b);
        assert_eq!(tags(&dom, parent), vec!["b", "a", "i"]);
    }

    #[test]
    fn test_reparent_into_fresh_parent() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let old = element(&mut dom, doc, "p");
        element(&mut dom, old, "em");
        dom.append_text(old, "tail");
        let fresh = dom.create_element("blockquote");

        dom.reparent_children(old, fresh);
        assert_eq!(tags(&dom, fresh), vec!["em", "#tail"]);
        assert_eq!(dom.child_count(old), 0);
    }

    #[test]
    fn test_reparent_into_populated_parent() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let target = element(&mut dom, doc, "blockquote");
        dom.append_text(target, "one");
        let br = dom.create_element("br");
        dom.append(target, br);
        let old = element(&mut dom, doc, "p");
        dom.append_text(old, "two");
        element(&mut dom, old, "code");

        dom.reparent_children(old, target);
        assert_eq!(tags(&dom, target), vec!["#one", "br", "#two", "code"]);
        assert_eq!(dom.first_child(old), None);
        assert_eq!(dom.last_child(old), None);
    }

    #[test]
    fn test_remove_all_children() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let td = element(&mut dom, doc, "td");
        element(&mut dom, td, "strong");
        dom.append_text(td, "x");

        dom.remove_all_children(td);
        assert_eq!(dom.child_count(td), 0);
    }

    #[test]
    fn test_descendants_stay_in_subtree() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let first = element(&mut dom, doc, "div");
        let inner = element(&mut dom, first, "p");
        let second = element(&mut dom, doc, "div");

        let sub: Vec<_> = dom.descendants(first).collect();
        assert_eq!(sub, vec![first, inner]);

        let all: Vec<_> = dom.descendants(doc).collect();
        assert_eq!(all, vec![doc, first, inner, second]);
    }

    #[test]
    fn test_parent_block() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let li = element(&mut dom, doc, "li");
        let b = element(&mut dom, li, "b");
        let i = element(&mut dom, b, "i");

        assert_eq!(dom.parent_block(i), li);
        assert_eq!(dom.parent_block(li), li);
    }

    #[test]
    fn test_element_siblings_skip_text() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let p = element(&mut dom, doc, "p");
        let a = element(&mut dom, p, "a");
        dom.append_text(p, " and ");
        let b = element(&mut dom, p, "b");

        assert_eq!(dom.next_element_sibling(a), Some(b));
        assert_eq!(dom.prev_element_sibling(b), Some(a));
        assert_eq!(dom.prev_element_sibling(a), None);
    }

    #[test]
    fn test_attributes() {
        let mut dom = Dom::new();
        let a = dom.create_element("a");
        dom.set_attr(a, "href", "#x");
        dom.set_attr(a, "class", "c1  title");

        assert_eq!(dom.get_attr(a, "href"), Some("#x"));
        assert_eq!(dom.classes(a).collect::<Vec<_>>(), vec!["c1", "title"]);

        dom.set_attr(a, "href", "#y");
        assert_eq!(dom.attrs(a).len(), 2);
        assert_eq!(dom.get_attr(a, "href"), Some("#y"));

        dom.rename(a, "span");
        assert!(dom.is_tag(a, "span"));
        dom.clear_attrs(a);
        assert!(dom.attrs(a).is_empty());
    }

    #[test]
    fn test_find_by_id() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let div = element(&mut dom, doc, "div");
        let anchor = element(&mut dom, div, "a");
        dom.set_attr(anchor, "id", "cmnt1");

        assert_eq!(dom.find_by_id(doc, "cmnt1"), Some(anchor));
        assert_eq!(dom.find_by_id(doc, "cmnt2"), None);
    }
}
