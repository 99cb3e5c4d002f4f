//! Document-level extraction: title paragraphs and the front-matter block.

use tracing::{debug, info, warn};

use super::unsmart::unsmart;
use crate::dom::{Dom, NodeId, flattened_text, selector};
use crate::error::Result;
use crate::meta::{FrontMatterBlock, MetaFormat};

/// How many leading children may precede the opening delimiter.
const LOOKAHEAD: usize = 5;

/// Title and subtitle captured from their styled paragraphs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

/// Remove the first title and subtitle paragraphs, keeping their text.
pub fn extract_headline(dom: &mut Dom, root: NodeId) -> Result<Headline> {
    Ok(Headline {
        title: take_paragraph(dom, root, "p[class~=title]")?,
        subtitle: take_paragraph(dom, root, "p[class~=subtitle]")?,
    })
}

fn take_paragraph(dom: &mut Dom, root: NodeId, pattern: &str) -> Result<Option<String>> {
    let Some(p) = selector::cached(pattern)?.match_first(dom, root) else {
        return Ok(None);
    };
    let text = flattened_text(dom, p).trim().to_string();
    dom.detach(p);
    debug!(pattern, %text, "extracted paragraph");
    Ok((!text.is_empty()).then_some(text))
}

/// Find, remove, and return the front-matter block at the top of `root`.
///
/// The block opens with a paragraph reading exactly `---`, `+++` or `{`, or
/// with a horizontal rule (standing for `---`), among the first few children.
/// It closes at the matching delimiter. A missing opening or closing
/// delimiter means there is no front matter and the tree is left untouched.
pub fn extract_front_matter(dom: &mut Dom, root: NodeId) -> Option<FrontMatterBlock> {
    let Some((start, format)) = find_opening(dom, root) else {
        info!("no front matter found");
        return None;
    };

    let mut raw = format!("{}\n", format.opening());
    let mut cursor = dom.next_sibling(start);
    let mut end = None;
    while let Some(current) = cursor {
        cursor = dom.next_sibling(current);
        if is_blank_text(dom, current) {
            continue;
        }
        if dom.is_tag(current, "hr") {
            if format == MetaFormat::Yaml {
                raw.push_str("---\n");
                end = Some(current);
            }
            break;
        }
        if !dom.is_tag(current, "p") {
            break;
        }
        let text = flattened_text(dom, current);
        raw.push_str(&text);
        raw.push('\n');
        if text.trim() == format.closing() {
            end = Some(current);
            break;
        }
    }

    let Some(end) = end else {
        warn!(%format, "front matter has no closing delimiter");
        return None;
    };

    let mut cursor = Some(start);
    while let Some(current) = cursor {
        cursor = dom.next_sibling(current);
        dom.detach(current);
        if current == end {
            break;
        }
    }

    Some(FrontMatterBlock {
        format,
        raw: unsmart(&raw),
    })
}

fn find_opening(dom: &Dom, root: NodeId) -> Option<(NodeId, MetaFormat)> {
    let elements = dom.children(root).filter(|&child| dom.is_element(child));
    for child in elements.take(LOOKAHEAD) {
        if dom.is_tag(child, "hr") {
            return Some((child, MetaFormat::Yaml));
        }
        if !dom.is_tag(child, "p") {
            continue;
        }
        let text = flattened_text(dom, child);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        return MetaFormat::from_opening(text).map(|format| (child, format));
    }
    None
}

fn is_blank_text(dom: &Dom, id: NodeId) -> bool {
    dom.text(id).is_some_and(|t| t.trim().is_empty())
}
