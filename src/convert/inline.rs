//! Inline normalizer: styled `span` wrappers become semantic tags.
//!
//! The editor wraps every run of text in a `span` carrying an inline style,
//! and every link in a `span` of its own:
//!
//! ```html
//! <span style="font-weight:700;font-style:italic">hi</span>
//! <span class="c4"><a href="https://www.google.com/url?q=...&sa=D">x</a></span>
//! ```
//!
//! become
//!
//! ```html
//! <em><strong>hi</strong></em>
//! <a href="...">x</a>
//! ```

use std::collections::HashSet;

use percent_encoding::percent_decode_str;
use tracing::debug;

use super::pass::{for_each_child, walk_bottom_up};
use crate::dom::{Dom, NodeId, flattened_text};
use crate::style::classify_node;

const REDIRECT_PREFIX: &str = "https://www.google.com/url?q=";
const TRACKING_SUFFIX: &str = "&sa=";

/// Collapse span wrappers under `root` and normalize non-breaking spaces.
pub fn normalize_spans(dom: &mut Dom, root: NodeId) {
    let mut fixed_links = HashSet::new();

    // Post-order: nested wrappers collapse from the inside out in one walk
    walk_bottom_up(dom, root, |dom, parent| {
        for_each_child(dom, parent, |dom, child| {
            if !dom.is_tag(child, "span") {
                return;
            }
            if let Some(link) = link_in_wrapper(dom, child) {
                unwrap_link(dom, child, link, &mut fixed_links);
            } else if is_text_wrapper(dom, child) {
                replace_text_wrapper(dom, child);
            }
        });
    });

    replace_nbsp(dom, root);
}

/// The anchor inside a span that holds nothing else.
fn link_in_wrapper(dom: &Dom, span: NodeId) -> Option<NodeId> {
    let link = dom.first_child(span)?;
    (dom.is_only_child(link) && dom.is_tag(link, "a")).then_some(link)
}

fn unwrap_link(dom: &mut Dom, span: NodeId, link: NodeId, fixed: &mut HashSet<NodeId>) {
    // An anchor hoisted out of two nested wrappers is decoded once
    if fixed.insert(link)
        && let Some(href) = dom.get_attr(link, "href")
    {
        let clean = clean_href(href);
        debug!(from = href, to = %clean, "rewrote link");
        dom.set_attr(link, "href", clean);
    }
    dom.detach(link);
    dom.replace(span, link);
}

/// Strip the editor's redirect wrapper and tracking suffix from a link.
///
/// The target is percent-decoded once, since the serializer encodes again on
/// output. A target that does not decode cleanly is kept as it was.
pub fn clean_href(href: &str) -> String {
    let mut value = href.strip_prefix(REDIRECT_PREFIX).unwrap_or(href);
    if let Some(idx) = value.rfind(TRACKING_SUFFIX) {
        value = &value[..idx];
    }
    query_unescape(value).unwrap_or_else(|| value.to_string())
}

/// Decode a query-string component: `+` is a space and every `%` must start
/// a two-digit hex escape.
fn query_unescape(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while let Some(offset) = memchr::memchr(b'%', &bytes[i..]) {
        let at = i + offset;
        let escape = bytes.get(at + 1..at + 3)?;
        if !escape.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        i = at + 3;
    }

    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// A span whose children are only text and line breaks.
fn is_text_wrapper(dom: &Dom, span: NodeId) -> bool {
    dom.children(span)
        .all(|child| dom.is_text(child) || dom.is_tag(child, "br"))
}

fn replace_text_wrapper(dom: &mut Dom, span: NodeId) {
    let text = flattened_text(dom, span);
    if text.is_empty() {
        // Stray formatting marker; whatever container held it is pruned later
        dom.detach(span);
        return;
    }

    let facts = classify_node(dom, span);
    let mut node = dom.create_text(text);
    // Innermost first, so `em` ends up outermost
    for (on, tag) in [
        (facts.monospace, "code"),
        (facts.strikethrough, "del"),
        (facts.underline, "u"),
        (facts.bold, "strong"),
        (facts.italic, "em"),
    ] {
        if on {
            let wrapper = dom.create_element(tag);
            dom.append(wrapper, node);
            node = wrapper;
        }
    }
    dom.replace(span, node);
}

/// Replace every non-breaking space in text nodes under `root`.
pub fn replace_nbsp(dom: &mut Dom, root: NodeId) {
    let texts: Vec<NodeId> = dom
        .descendants(root)
        .filter(|&id| dom.text(id).is_some_and(|t| t.contains('\u{a0}')))
        .collect();
    for id in texts {
        if let Some(text) = dom.text_mut(id) {
            *text = text.replace('\u{a0}', " ");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{content_root, parse_html, serialize_children};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// True when nothing under `root` is left for this pass to rewrite.
    fn is_normalized(dom: &Dom, root: NodeId) -> bool {
        dom.descendants(root).all(|id| {
            let stale_span = dom.is_tag(id, "span")
                && (link_in_wrapper(dom, id).is_some() || is_text_wrapper(dom, id));
            let nbsp = dom.text(id).is_some_and(|t| t.contains('\u{a0}'));
            !stale_span && !nbsp
        })
    }

    fn normalize(html: &str) -> String {
        let mut dom = parse_html(html);
        let root = content_root(&dom);
        normalize_spans(&mut dom, root);
        serialize_children(&dom, root).unwrap()
    }

    #[test]
    fn test_bold_span_becomes_strong() {
        assert_eq!(
            normalize(r#"<p><span style="font-weight:700">hi</span></p>"#),
            "<p><strong>hi</strong></p>"
        );
    }

    #[test]
    fn test_wrapper_nesting_order() {
        assert_eq!(
            normalize(
                r#"<p><span style="font-family:&quot;Consolas&quot;;text-decoration:line-through;font-weight:700;font-style:italic;text-decoration:underline">x</span></p>"#
            ),
            "<p><em><strong><u><del><code>x</code></del></u></strong></em></p>"
        );
    }

    #[test]
    fn test_plain_span_becomes_text() {
        assert_eq!(
            normalize(r#"<p><span class="c1">a<br>b</span></p>"#),
            "<p>a\nb</p>"
        );
    }

    #[test]
    fn test_empty_styled_span_dropped() {
        assert_eq!(
            normalize(r#"<p>x<span style="font-weight:700"></span></p>"#),
            "<p>x</p>"
        );
    }

    #[test]
    fn test_bare_span_is_space() {
        assert_eq!(normalize("<p>a<span></span>b</p>"), "<p>a b</p>");
    }

    #[test]
    fn test_link_wrapper_unwrapped() {
        assert_eq!(
            normalize(
                r#"<p><span class="c2"><a href="https://www.google.com/url?q=https%3A%2F%2Fexample.com%2Fx&amp;sa=D&amp;ust=1">x</a></span></p>"#
            ),
            r#"<p><a href="https://example.com/x">x</a></p>"#
        );
    }

    #[test]
    fn test_nested_spans_collapse() {
        assert_eq!(
            normalize(r#"<p><span class="o"><span class="i"><a href="/a%2520b">x</a></span></span></p>"#),
            r#"<p><a href="/a%20b">x</a></p>"#
        );
    }

    #[test]
    fn test_mixed_span_is_kept() {
        assert_eq!(
            normalize(r#"<p><span class="c"><img src="a.png"></span></p>"#),
            r#"<p><span class="c"><img src="a.png"></span></p>"#
        );
    }

    #[test]
    fn test_nbsp_replaced_everywhere() {
        assert_eq!(normalize("<p>a\u{a0}b<b>c\u{a0}</b></p>"), "<p>a b<b>c </b></p>");
    }

    #[test]
    fn test_clean_href() {
        assert_eq!(
            clean_href("https://www.google.com/url?q=https%3A%2F%2Fexample.com%2Fx&sa=D"),
            "https://example.com/x"
        );
        assert_eq!(clean_href("https://example.com/a+b"), "https://example.com/a b");
        assert_eq!(clean_href("https://example.com/100%"), "https://example.com/100%");
        assert_eq!(clean_href("#heading=h.1"), "#heading=h.1");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(
            words in prop::collection::vec("[a-z]{0,4}", 1..5),
            styles in prop::collection::vec(prop::sample::select(vec![
                "", "font-weight:700", "font-style:italic", "font-family:Consolas",
                "text-decoration:underline", "margin-left:36pt",
            ]), 1..5),
        ) {
            let mut html = String::from("<p>");
            for (word, style) in words.iter().zip(styles.iter().cycle()) {
                html.push_str(&format!(r#"<span style="{style}">{word}&nbsp;</span>"#));
                html.push_str(&format!(r#"<span><span class="x"><a href="/{word}">{word}</a></span></span>"#));
            }
            html.push_str("</p>");

            let mut dom = parse_html(&html);
            let root = content_root(&dom);
            normalize_spans(&mut dom, root);
            prop_assert!(is_normalized(&dom, root));
            let once = serialize_children(&dom, root).unwrap();

            normalize_spans(&mut dom, root);
            let twice = serialize_children(&dom, root).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
