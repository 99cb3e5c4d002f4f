//! Attribute sanitizer.

use std::collections::HashSet;

use crate::dom::{Attribute, Dom, NodeId};

/// Strip every attribute under `root` except the few that carry meaning:
///
/// * `href`
/// * `colspan` / `rowspan`, unless `"1"` (the editor writes them on every cell)
/// * `id` on headings and rules, the targets of internal links
/// * `src` and `alt` on images
///
/// Only the first occurrence of each kept name survives.
pub fn sanitize_attributes(dom: &mut Dom, root: NodeId) {
    let elements: Vec<NodeId> = dom
        .descendants(root)
        .filter(|&id| dom.is_element(id))
        .collect();

    for id in elements {
        let keeps_id = dom
            .tag(id)
            .is_some_and(|tag| matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "hr"));
        let is_img = dom.is_tag(id, "img");
        let Some(attrs) = dom.attrs_mut(id) else {
            continue;
        };
        let mut seen = HashSet::new();
        attrs.retain(|attr: &Attribute| {
            let keep = match attr.key() {
                "href" => true,
                "colspan" | "rowspan" => attr.value != "1",
                "id" => keeps_id,
                "src" | "alt" => is_img,
                _ => false,
            };
            keep && seen.insert(attr.key().to_string())
        });
    }
}
