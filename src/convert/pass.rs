//! Pass identities and tree traversal shared by the passes.

use std::fmt;

use crate::dom::{Dom, NodeId};

/// One rewrite step of the conversion pipeline.
///
/// The set is closed and the order is fixed: later passes rely on the shape
/// earlier ones leave behind (header promotion expects unwrapped cells, the
/// code-block merge expects spans already turned into `code`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Title,
    FrontMatter,
    Images,
    Spans,
    BlockquotePre,
    Blockquote,
    CodeBlock,
    Tables,
    Attributes,
    RemoveEmpty,
    Unsmart,
    NarrowTags,
    Punctuation,
    LinkRelative,
    InsecureLinks,
    AddClass,
}

impl Pass {
    /// Every pass, in execution order.
    pub const PIPELINE: [Pass; 16] = [
        Pass::Title,
        Pass::FrontMatter,
        Pass::Images,
        Pass::Spans,
        Pass::BlockquotePre,
        Pass::Blockquote,
        Pass::CodeBlock,
        Pass::Tables,
        Pass::Attributes,
        Pass::RemoveEmpty,
        Pass::Unsmart,
        Pass::NarrowTags,
        Pass::Punctuation,
        Pass::LinkRelative,
        Pass::InsecureLinks,
        Pass::AddClass,
    ];

    /// Stable name used in logs and configuration.
    pub fn name(self) -> &'static str {
        match self {
            Pass::Title => "title",
            Pass::FrontMatter => "front-matter",
            Pass::Images => "images",
            Pass::Spans => "spans",
            Pass::BlockquotePre => "blockquote-pre",
            Pass::Blockquote => "blockquote",
            Pass::CodeBlock => "code-block",
            Pass::Tables => "tables",
            Pass::Attributes => "attributes",
            Pass::RemoveEmpty => "remove-empty-tags",
            Pass::Unsmart => "unsmart-code",
            Pass::NarrowTags => "narrow-tags",
            Pass::Punctuation => "check-punc",
            Pass::LinkRelative => "link-relative",
            Pass::InsecureLinks => "insecure-links",
            Pass::AddClass => "add-class",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Walk the subtree bottom-up and call visitor at each parent.
///
/// Children are visited before their parent, so a visitor that removes
/// nodes sees the effect of removals further down (empty containers cascade).
pub fn walk_bottom_up<F>(dom: &mut Dom, root: NodeId, mut visitor: F)
where
    F: FnMut(&mut Dom, NodeId),
{
    walk_children(dom, root, &mut visitor);
}

fn walk_children<F>(dom: &mut Dom, parent_id: NodeId, visitor: &mut F)
where
    F: FnMut(&mut Dom, NodeId),
{
    // 1. Recurse into children first (bottom-up)
    let mut child_opt = dom.first_child(parent_id);
    while let Some(child_id) = child_opt {
        walk_children(dom, child_id, visitor);
        child_opt = dom.next_sibling(child_id);
    }
    // 2. Visit this parent after children
    visitor(dom, parent_id);
}

/// Visit each child of `parent` in order, capturing the next sibling first
/// so the visitor may detach or replace the current node.
pub fn for_each_child<F>(dom: &mut Dom, parent: NodeId, mut visitor: F)
where
    F: FnMut(&mut Dom, NodeId),
{
    let mut cursor = dom.first_child(parent);
    while let Some(current) = cursor {
        cursor = dom.next_sibling(current);
        visitor(dom, current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_pipeline_names_are_unique() {
        let mut names: Vec<_> = Pass::PIPELINE.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Pass::PIPELINE.len());
    }

    #[test]
    fn test_walk_bottom_up_order() {
        let mut dom = parse_html("<div><p><b>x</b></p><i>y</i></div>");
        let div = dom.find_by_tag("div").unwrap();

        let mut seen = Vec::new();
        walk_bottom_up(&mut dom, div, |dom, id| {
            if let Some(tag) = dom.tag(id) {
                seen.push(tag.to_string());
            }
        });
        assert_eq!(seen, vec!["b", "p", "i", "div"]);
    }

    #[test]
    fn test_for_each_child_survives_detach() {
        let mut dom = parse_html("<p><b>1</b><i>2</i><b>3</b></p>");
        let p = dom.find_by_tag("p").unwrap();

        for_each_child(&mut dom, p, |dom, child| {
            if dom.is_tag(child, "b") {
                dom.detach(child);
            }
        });
        let left: Vec<_> = dom.children(p).filter_map(|c| dom.tag(c)).collect();
        assert_eq!(left, vec!["i"]);
    }
}
