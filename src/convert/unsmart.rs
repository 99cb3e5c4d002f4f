//! Typography normalization for machine-readable text.
//!
//! Editors substitute curly quotes, dashes and ellipses as you type. Inside
//! code spans and front matter those substitutions break the content.

use tracing::debug;

use crate::dom::{Dom, NodeId, Selector, text_nodes};

/// Replace smart punctuation with plain ASCII.
pub fn unsmart(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{a0}' => out.push(' '),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2026}' => out.push_str("..."),
            '\u{2010}' | '\u{2011}' => out.push('-'),
            '\u{2012}' | '\u{2013}' => out.push_str("--"),
            '\u{2014}' => out.push_str("---"),
            other => out.push(other),
        }
    }
    out
}

/// Unsmart every text node inside elements matching `selector`.
pub fn unsmart_matches(dom: &mut Dom, root: NodeId, selector: &Selector) {
    for element in selector.match_all(dom, root) {
        for id in text_nodes(dom, element) {
            let Some(text) = dom.text_mut(id) else {
                continue;
            };
            let plain = unsmart(text);
            if plain != *text {
                debug!(before = %text, after = %plain, "unsmartened");
                *text = plain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{content_root, parse_html, serialize_children};
    use proptest::prelude::*;

    #[test]
    fn test_unsmart_table() {
        assert_eq!(
            unsmart("\u{201c}a\u{201d} \u{2018}b\u{2019}\u{2026} x\u{2013}y\u{2014}z\u{2011}w\u{a0}"),
            "\"a\" 'b'... x--y---z-w "
        );
    }

    #[test]
    fn test_only_matching_elements() {
        let mut dom = parse_html("<p>\u{201c}q\u{201d} <code>\u{201c}q\u{201d}</code> <kbd><b>\u{2014}</b></kbd></p>");
        let root = content_root(&dom);
        unsmart_matches(&mut dom, root, &Selector::compile("code,var,kbd").unwrap());

        assert_eq!(
            serialize_children(&dom, root).unwrap(),
            "<p>\u{201c}q\u{201d} <code>\"q\"</code> <kbd><b>---</b></kbd></p>"
        );
    }

    proptest! {
        #[test]
        fn prop_unsmart_is_idempotent(s in "\\PC{0,40}") {
            let once = unsmart(&s);
            prop_assert_eq!(unsmart(&once), once);
        }
    }
}
