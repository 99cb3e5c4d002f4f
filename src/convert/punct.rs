//! Paragraph ending checks.

use tracing::debug;

use crate::dom::{Dom, NodeId, Selector, flattened_text, text_nodes};
use crate::error::{Result, ValidationError};

const QUOTES: &[char] = &['"', '\u{201d}'];
const TERMINALS: &[char] = &['.', '?', '!', ':', '\u{2026}'];

fn is_terminal(c: char) -> bool {
    // `}` closes a shortcode, which renders its own ending
    TERMINALS.contains(&c) || c == '}'
}

/// Verify every paragraph matching `selector` ends in punctuation.
///
/// Leading whitespace of the first text node and trailing whitespace of the
/// last non-blank one are trimmed on the way. Paragraphs without text
/// (images, rules) are skipped.
///
/// # Errors
///
/// [`ValidationError::ParagraphEnding`] for the first offending paragraph.
pub fn check_punctuation(dom: &mut Dom, root: NodeId, selector: &Selector) -> Result<()> {
    for p in selector.match_all(dom, root) {
        let texts = text_nodes(dom, p);
        let Some(&last) = texts
            .iter()
            .rev()
            .find(|&&t| dom.text(t).is_some_and(|s| !s.trim().is_empty()))
        else {
            continue;
        };

        if let Some(&first) = texts.first()
            && let Some(text) = dom.text_mut(first)
        {
            let trimmed = text.trim_start();
            if trimmed.len() != text.len() {
                *text = trimmed.to_string();
            }
        }

        let Some(text) = dom.text_mut(last) else {
            continue;
        };
        let trimmed = text.trim_end();
        if trimmed.len() != text.len() {
            *text = trimmed.to_string();
        }

        let mut tail = text.chars().rev();
        let Some(ending) = tail.next() else {
            continue;
        };
        if let Some(reason) = ending_problem(ending, tail.next()) {
            let text = flattened_text(dom, p);
            debug!(text = %text, reason, "bad paragraph ending");
            return Err(ValidationError::ParagraphEnding {
                text,
                reason: reason.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn ending_problem(last: char, before: Option<char>) -> Option<&'static str> {
    if QUOTES.contains(&last) {
        return match before {
            Some(c) if is_terminal(c) => None,
            _ => Some("ending quote is missing punctuation"),
        };
    }
    if !is_terminal(last) {
        return Some("does not end with any punctuation");
    }
    if let Some(c) = before
        && QUOTES.contains(&c)
    {
        return Some("punctuation outside quote");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PUNCT_SELECTOR;
    use crate::dom::{content_root, parse_html, serialize_children};
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    fn run(html: &str) -> Result<String> {
        let mut dom = parse_html(html);
        let root = content_root(&dom);
        check_punctuation(&mut dom, root, &Selector::compile(PUNCT_SELECTOR).unwrap())?;
        serialize_children(&dom, root)
    }

    fn reason(html: &str) -> String {
        match run(html).unwrap_err() {
            Error::Validation(ValidationError::ParagraphEnding { reason, .. }) => reason,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_accepted_endings() {
        for html in [
            "<p>foo.</p>",
            "<p>foo?</p>",
            "<p>foo!</p>",
            "<p>Steps:</p>",
            "<p>and so\u{2026}</p>",
            "<p>\u{201c}foo.\u{201d}</p>",
            "<p>He said \"stop!\"</p>",
            "<p>{{< figure src=\"x\" >}}</p>",
            "<p><b>foo.</b></p>",
        ] {
            assert!(run(html).is_ok(), "{html}");
        }
    }

    #[test]
    fn test_missing_punctuation() {
        assert_eq!(reason("<p>foo</p>"), "does not end with any punctuation");
    }

    #[test]
    fn test_punctuation_outside_quote() {
        assert_eq!(reason("<p>\u{201c}foo\u{201d}.</p>"), "punctuation outside quote");
    }

    #[test]
    fn test_quote_without_punctuation() {
        assert_eq!(reason("<p>a \"foo\"</p>"), "ending quote is missing punctuation");
    }

    #[test]
    fn test_skips_textless_paragraphs() {
        assert!(run(r#"<p><img src="x.png"></p><p> </p>"#).is_ok());
    }

    #[test]
    fn test_trims_edges() {
        assert_eq!(
            run("<p>  foo <em>bar.</em> \n</p>").unwrap(),
            "<p>foo <em>bar.</em> \n</p>"
        );
    }

    #[test]
    fn test_error_carries_paragraph_text() {
        match run("<p>ok.</p><p>not <b>ok</b></p>").unwrap_err() {
            Error::Validation(ValidationError::ParagraphEnding { text, .. }) => {
                assert_eq!(text, "not ok");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
