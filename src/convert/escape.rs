//! Post-serialization unescaping of Hugo shortcodes and character references.
//!
//! The serializer escapes text, so a shortcode typed into the document as
//! `{{< youtube "id" >}}` comes out as `{{&lt; youtube "id" &gt;}}`, and a
//! literal `&#37;` comes out as `&amp;#37;`. Only those spans are decoded;
//! escaped markup elsewhere in the page must stay escaped.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static SHORTCODE_ANGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{&lt;.*?&gt;\}\}").unwrap());

static SHORTCODE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{%.*?%\}\}").unwrap());

/// `&#37;` escaped a second time.
static CHAR_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&amp;#[0-9]+;").unwrap());

fn decode(caps: &Captures<'_>) -> String {
    html_escape::decode_html_entities(&caps[0]).into_owned()
}

fn replace_all<'a>(re: &Regex, text: Cow<'a, str>) -> Cow<'a, str> {
    let replaced = match re.replace_all(&text, decode) {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    };
    replaced.map_or(text, Cow::Owned)
}

/// Decode escaped shortcodes and double-escaped numeric references.
pub fn unescape_fixups(html: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(html);
    if memchr::memmem::find(html.as_bytes(), b"{{").is_some() {
        out = replace_all(&SHORTCODE_ANGLE, out);
        out = replace_all(&SHORTCODE_PERCENT, out);
    }
    if memchr::memmem::find(out.as_bytes(), b"&amp;#").is_some() {
        out = replace_all(&CHAR_REF, out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_angle_shortcode() {
        assert_eq!(
            unescape_fixups(r#"<p>{{&lt; youtube "x" &gt;}}</p>"#),
            r#"<p>{{< youtube "x" >}}</p>"#
        );
    }

    #[test]
    fn test_percent_shortcode() {
        assert_eq!(
            unescape_fixups("<p>{{% note &amp; more %}}</p>"),
            "<p>{{% note & more %}}</p>"
        );
    }

    #[test]
    fn test_each_shortcode_decoded_separately() {
        assert_eq!(
            unescape_fixups("{{&lt; a &gt;}} &lt;b&gt; {{&lt; c &gt;}}"),
            "{{< a >}} &lt;b&gt; {{< c >}}"
        );
    }

    #[test]
    fn test_double_escaped_reference() {
        assert_eq!(unescape_fixups("<p>100&amp;#37;</p>"), "<p>100&#37;</p>");
    }

    #[test]
    fn test_other_escapes_untouched() {
        let html = "<p>&lt;div&gt; &amp;amp; &amp;lt;</p>";
        assert!(matches!(unescape_fixups(html), Cow::Borrowed(_)));
        assert_eq!(unescape_fixups(html), html);
    }
}
