//! Table normalizer: cell unwrapping and header promotion.

use tracing::debug;

use crate::dom::{Dom, NodeId, flattened_text};
use crate::style::classify_node;

/// Clean up tables under `root`.
///
/// The editor wraps every cell's content in a paragraph and never emits
/// `thead`/`th`; bold cells are the only header signal.
pub fn normalize_tables(dom: &mut Dom, root: NodeId) {
    unwrap_cells(dom, root);

    let tables: Vec<NodeId> = dom
        .descendants(root)
        .filter(|&id| dom.is_tag(id, "table"))
        .collect();
    for table in tables {
        promote_headers(dom, table);
    }
}

/// `<td><p>x</p></td>` becomes `<td>x</td>` when the paragraph is the only
/// child node of the cell.
fn unwrap_cells(dom: &mut Dom, root: NodeId) {
    let paragraphs: Vec<NodeId> = dom
        .descendants(root)
        .filter(|&id| {
            dom.is_tag(id, "p")
                && dom.is_only_child(id)
                && dom.parent(id).is_some_and(|cell| dom.is_tag(cell, "td"))
        })
        .collect();

    for p in paragraphs {
        let Some(cell) = dom.parent(p) else {
            continue;
        };
        dom.remove_child(cell, p);
        dom.reparent_children(p, cell);
    }
}

fn promote_headers(dom: &mut Dom, table: NodeId) {
    let Some(tbody) = dom
        .children(table)
        .find(|&c| dom.is_element(c))
        .filter(|&c| dom.is_tag(c, "tbody"))
    else {
        return;
    };

    if let Some(first_row) = first_element_child(dom, tbody)
        && dom.is_tag(first_row, "tr")
        && has_bold(dom, first_row)
    {
        let cells: Vec<NodeId> = dom.children(first_row).filter(|&c| dom.is_element(c)).collect();
        for cell in cells {
            make_header_cell(dom, cell);
        }
        let thead = dom.create_element("thead");
        dom.remove_child(tbody, first_row);
        dom.append(thead, first_row);
        dom.insert_before(tbody, thead);
        debug!("promoted first row to thead");
    }

    let rows: Vec<NodeId> = dom.children(tbody).filter(|&r| dom.is_tag(r, "tr")).collect();
    for row in rows {
        if let Some(cell) = first_element_child(dom, row)
            && dom.is_tag(cell, "td")
            && has_bold(dom, cell)
        {
            make_header_cell(dom, cell);
        }
    }
}

fn first_element_child(dom: &Dom, id: NodeId) -> Option<NodeId> {
    dom.children(id).find(|&c| dom.is_element(c))
}

/// Bold markup anywhere below `id`: `b`/`strong`, or an unconverted styled
/// element.
fn has_bold(dom: &Dom, id: NodeId) -> bool {
    dom.descendants(id)
        .skip(1)
        .any(|d| dom.is_tag(d, "b") || dom.is_tag(d, "strong") || classify_node(dom, d).bold)
}

/// Rename to `th` and replace the content with its flattened text.
fn make_header_cell(dom: &mut Dom, cell: NodeId) {
    let text = flattened_text(dom, cell);
    dom.rename(cell, "th");
    dom.remove_all_children(cell);
    let text = dom.create_text(text);
    dom.append(cell, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{content_root, parse_html, serialize_children};
    use pretty_assertions::assert_eq;

    fn run(html: &str) -> String {
        let mut dom = parse_html(html);
        let root = content_root(&dom);
        normalize_tables(&mut dom, root);
        serialize_children(&dom, root).unwrap()
    }

    #[test]
    fn test_cell_paragraph_unwrapped() {
        assert_eq!(
            run("<table><tr><td><p>a <i>b</i></p></td><td><p>x</p><p>y</p></td></tr></table>"),
            "<table><tbody><tr><td>a <i>b</i></td><td><p>x</p><p>y</p></td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_bold_first_row_becomes_thead() {
        assert_eq!(
            run("<table><tr><td><p><strong>Name</strong></p></td><td><p><em><strong>Age</strong></em></p></td></tr>\
                 <tr><td><p>Ann</p></td><td><p>3</p></td></tr></table>"),
            "<table><thead><tr><th>Name</th><th>Age</th></tr></thead>\
             <tbody><tr><td>Ann</td><td>3</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_bold_row_labels() {
        assert_eq!(
            run("<table><tr><td>k</td><td>v</td></tr><tr><td><b>r</b></td><td>w <b>!</b></td></tr></table>"),
            "<table><tbody><tr><td>k</td><td>v</td></tr><tr><th>r</th><td>w <b>!</b></td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_styled_bold_counts() {
        assert_eq!(
            run(r#"<table><tr><td><span style="font-weight:700">H</span></td></tr><tr><td>v</td></tr></table>"#),
            "<table><thead><tr><th>H</th></tr></thead><tbody><tr><td>v</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_plain_table_untouched() {
        let html = "<table><tbody><tr><td>a</td></tr></tbody></table>";
        assert_eq!(run(html), html);
    }
}
