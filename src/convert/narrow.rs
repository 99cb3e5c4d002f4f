//! Narrow-tag whitespace fixing.
//!
//! Inline tags must not start or end with whitespace: `<a href="x"> link </a>`
//! renders an underlined space. Whitespace is moved outside the tag instead,
//! and tags left holding only whitespace are removed.

use tracing::debug;

use crate::dom::{Dom, NodeId, Selector, flattened_text, next_in_block, prev_in_block, text_nodes};
use crate::error::{Result, ValidationError};

/// Characters a link's visible text must not end with.
const BAD_ANCHOR_ENDINGS: &[char] = &['.', ',', '!', '?', ':', ';'];

/// Trim whitespace at the edges of every element matching `selector`.
///
/// # Errors
///
/// Fails with [`ValidationError::AnchorEnding`] when a link's text ends in
/// sentence punctuation, which belongs outside the link.
pub fn narrow_tags(dom: &mut Dom, root: NodeId, selector: &Selector) -> Result<()> {
    for tag in selector.match_all(dom, root) {
        // An earlier blank tag may have taken this one with it
        if !dom.is_attached_to(tag, root) {
            continue;
        }

        let texts = text_nodes(dom, tag);
        if is_blank(dom, tag, &texts) {
            debug!(tag = dom.tag(tag).unwrap_or_default(), "removed blank tag");
            space_before(dom, tag);
            dom.detach(tag);
            continue;
        }

        let (Some(&first), Some(&last)) = (texts.first(), texts.last()) else {
            continue;
        };

        if trim_text(dom, first, str::trim_start) {
            debug!(tag = dom.tag(tag).unwrap_or_default(), "trimmed left");
            space_before(dom, tag);
        }
        if trim_text(dom, last, str::trim_end) {
            debug!(tag = dom.tag(tag).unwrap_or_default(), "trimmed right");
            space_after(dom, tag);
        }

        if dom.is_tag(tag, "a") {
            check_anchor_ending(dom, tag, last)?;
        }
    }
    Ok(())
}

/// No visible text and nothing else worth keeping (images).
fn is_blank(dom: &Dom, tag: NodeId, texts: &[NodeId]) -> bool {
    texts
        .iter()
        .all(|&t| dom.text(t).is_none_or(|s| s.trim().is_empty()))
        && !dom.descendants(tag).any(|d| dom.is_tag(d, "img"))
}

/// Apply `trim` to a text node; true when anything was removed.
fn trim_text(dom: &mut Dom, id: NodeId, trim: fn(&str) -> &str) -> bool {
    let Some(text) = dom.text_mut(id) else {
        return false;
    };
    let trimmed = trim(text);
    if trimmed.len() == text.len() {
        return false;
    }
    *text = trimmed.to_string();
    true
}

/// Separate `tag` from whatever precedes it. A neighbouring text node gets
/// the space; next to another element a new text node is inserted, so the
/// space never lands inside a different inline tag.
fn space_before(dom: &mut Dom, tag: NodeId) {
    let Some(prev) = prev_in_block(dom, tag) else {
        return;
    };
    if dom.is_text(prev) {
        ensure_trailing_space(dom, prev);
    } else if let Some(after) = dom.next_sibling(prev) {
        let space = dom.create_text(" ");
        dom.insert_before(after, space);
    }
}

fn space_after(dom: &mut Dom, tag: NodeId) {
    let Some(next) = next_in_block(dom, tag) else {
        return;
    };
    if dom.is_text(next) {
        ensure_leading_space(dom, next);
    } else {
        let space = dom.create_text(" ");
        dom.insert_before(next, space);
    }
}

fn ensure_trailing_space(dom: &mut Dom, id: NodeId) {
    if let Some(text) = dom.text_mut(id)
        && !text.ends_with(char::is_whitespace)
    {
        text.push(' ');
    }
}

fn ensure_leading_space(dom: &mut Dom, id: NodeId) {
    if let Some(text) = dom.text_mut(id)
        && !text.starts_with(char::is_whitespace)
    {
        text.insert(0, ' ');
    }
}

fn check_anchor_ending(dom: &Dom, anchor: NodeId, last: NodeId) -> Result<()> {
    let Some(ending) = dom.text(last).and_then(|t| t.chars().last()) else {
        return Ok(());
    };
    if BAD_ANCHOR_ENDINGS.contains(&ending) {
        return Err(ValidationError::AnchorEnding {
            tag: "a".to_string(),
            text: flattened_text(dom, anchor),
            ending,
        }
        .into());
    }
    Ok(())
}
