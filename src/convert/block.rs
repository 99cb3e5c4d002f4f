//! Block reconstructor: runs of indented or code-only paragraphs merge into
//! one `blockquote` or `pre` block.
//!
//! A run is strictly adjacent siblings. Anything else between two candidates
//! (another element, even a whitespace text node) closes the open block, and
//! the next candidate starts a new one.

use tracing::debug;

use crate::dom::{Dom, NodeId};
use crate::style::classify_node;

/// Indented paragraphs holding only a `code` element become `blockquote > pre`.
///
/// ```html
/// <p style="margin-left:36pt"><code>line 1</code></p>
/// <p style="margin-left:36pt"><code>line 2</code></p>
/// ```
///
/// becomes `<blockquote><pre>line 1\nline 2</pre></blockquote>`.
pub fn merge_blockquote_pre(dom: &mut Dom, root: NodeId) {
    merge_runs(dom, root, |dom, p| {
        if !is_indented_paragraph(dom, p) {
            return Candidate::No;
        }
        match sole_code_child(dom, p) {
            Some(_) => Candidate::Yes,
            None => Candidate::No,
        }
    }, |dom, p| {
        let Some(code) = sole_code_child(dom, p) else {
            return None;
        };
        dom.rename(p, "blockquote");
        dom.clear_attrs(p);
        dom.rename(code, "pre");
        Some(code)
    }, |dom, pre, p| {
        dom.append_text(pre, "\n");
        if let Some(code) = sole_code_child(dom, p) {
            dom.reparent_children(code, pre);
        }
    });
}

/// Runs of indented paragraphs become one `blockquote`, lines separated by
/// `br`.
pub fn merge_blockquotes(dom: &mut Dom, root: NodeId) {
    merge_runs(dom, root, |dom, p| {
        if is_indented_paragraph(dom, p) {
            Candidate::Yes
        } else {
            Candidate::No
        }
    }, |dom, p| {
        dom.rename(p, "blockquote");
        dom.clear_attrs(p);
        Some(p)
    }, |dom, quote, p| {
        let br = dom.create_element("br");
        dom.append(quote, br);
        dom.reparent_children(p, quote);
    });
}

/// Paragraphs holding only a `code` element become `pre > code`; adjacent
/// ones join with newlines.
///
/// Inside table cells and list items the inline code is left alone.
pub fn merge_code_blocks(dom: &mut Dom, root: NodeId) {
    merge_runs(dom, root, |dom, p| {
        if !dom.is_tag(p, "p") || sole_code_child(dom, p).is_none() {
            return Candidate::No;
        }
        let in_cell = dom
            .parent(p)
            .and_then(|parent| dom.tag(parent))
            .is_some_and(|tag| matches!(tag, "td" | "th" | "li"));
        if in_cell {
            Candidate::Skip
        } else {
            Candidate::Yes
        }
    }, |dom, p| {
        let code = sole_code_child(dom, p)?;
        dom.rename(p, "pre");
        dom.clear_attrs(p);
        Some(code)
    }, |dom, code, p| {
        dom.append_text(code, "\n");
        if let Some(line) = sole_code_child(dom, p) {
            dom.reparent_children(line, code);
        }
    });
}

/// How a sibling relates to the run being built.
enum Candidate {
    /// Starts or continues a run.
    Yes,
    /// Closes the run.
    No,
    /// Matches the shape but must be left as is; also closes the run.
    Skip,
}

/// Walk every child list under `root` and merge adjacent candidates.
///
/// `open` converts the first paragraph of a run in place and returns the
/// node later lines are merged into; `extend` merges one more paragraph into
/// that node, after which the emptied paragraph is removed.
fn merge_runs<C, O, E>(dom: &mut Dom, root: NodeId, classify: C, open: O, extend: E)
where
    C: Fn(&Dom, NodeId) -> Candidate,
    O: Fn(&mut Dom, NodeId) -> Option<NodeId>,
    E: Fn(&mut Dom, NodeId, NodeId),
{
    let parents: Vec<NodeId> = dom
        .descendants(root)
        .filter(|&id| dom.is_element(id) || id == root)
        .collect();

    for parent in parents {
        let mut target: Option<NodeId> = None;
        let mut cursor = dom.first_child(parent);
        while let Some(current) = cursor {
            cursor = dom.next_sibling(current);
            match classify(dom, current) {
                Candidate::Yes => match target {
                    Some(into) => {
                        extend(dom, into, current);
                        dom.remove_child(parent, current);
                        debug!(parent = parent.0, "merged paragraph into block");
                    }
                    None => target = open(dom, current),
                },
                Candidate::No | Candidate::Skip => target = None,
            }
        }
    }
}

fn is_indented_paragraph(dom: &Dom, id: NodeId) -> bool {
    dom.is_tag(id, "p") && classify_node(dom, id).indented
}

/// The `code` element that is the only child node of `p`, text included.
fn sole_code_child(dom: &Dom, p: NodeId) -> Option<NodeId> {
    let code = dom.first_child(p)?;
    (dom.is_tag(code, "code") && dom.is_only_child(code)).then_some(code)
}
