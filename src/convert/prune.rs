//! Empty-tag removal.

use tracing::debug;

use super::pass::{for_each_child, walk_bottom_up};
use crate::dom::{Dom, NodeId, Selector};

/// Remove matching elements in post-order (cascading).
///
/// Formatting artifacts nest, so removal must cascade:
/// - `<p><em><span></span></em></p>`
/// - Step 1: Visit span, it's empty, delete
/// - Step 2: Visit em, now empty, delete
/// - Step 3: Visit p, now empty, delete
///
/// `selector` decides what counts; the default is `:empty` on anchors,
/// paragraphs, emphasis, bold, spans and divisions.
pub fn prune_empty(dom: &mut Dom, root: NodeId, selector: &Selector) {
    walk_bottom_up(dom, root, |dom, parent| {
        for_each_child(dom, parent, |dom, child| {
            if selector.matches(dom, child) {
                debug!(tag = dom.tag(child).unwrap_or_default(), "removed empty tag");
                dom.remove_child(parent, child);
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REMOVE_EMPTY_SELECTOR;
    use crate::dom::{content_root, parse_html, serialize_children};
    use pretty_assertions::assert_eq;

    fn run(html: &str) -> String {
        let mut dom = parse_html(html);
        let root = content_root(&dom);
        let selector = Selector::compile(REMOVE_EMPTY_SELECTOR).unwrap();
        prune_empty(&mut dom, root, &selector);
        serialize_children(&dom, root).unwrap()
    }

    #[test]
    fn test_prune_cascades() {
        assert_eq!(run("<p><em><span></span></em></p><p>kept</p>"), "<p>kept</p>");
    }

    #[test]
    fn test_preserves_void_and_text() {
        assert_eq!(
            run("<p><br></p><p> </p><div><img src=x></div>"),
            "<p><br></p><p> </p><div><img src=\"x\"></div>"
        );
    }

    #[test]
    fn test_unlisted_tags_survive() {
        assert_eq!(run("<h1></h1><ul><li></li></ul>"), "<h1></h1><ul><li></li></ul>");
    }

    #[test]
    fn test_idempotent() {
        let once = run("<div><p><a href=x></a></p><b></b>x</div>");
        assert_eq!(once, "<div>x</div>");
        assert_eq!(run(&once), once);
    }
}
