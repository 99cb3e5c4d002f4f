//! Link rewriting and link policy.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::dom::{Dom, NodeId, selector};
use crate::error::{Result, ValidationError};

/// Make links under `prefix` site-relative.
///
/// `https://example.com/blog/post` becomes `/blog/post` with a prefix of
/// `https://example.com`. A link to the prefix itself becomes `/`.
pub fn link_relative(dom: &mut Dom, root: NodeId, prefix: &str) -> Result<()> {
    for anchor in selector::cached("a[href]")?.match_all(dom, root) {
        let Some(rest) = dom
            .get_attr(anchor, "href")
            .and_then(|href| href.strip_prefix(prefix))
        else {
            continue;
        };
        let relative = if rest.is_empty() { "/" } else { rest }.to_string();
        debug!(href = %relative, "made link relative");
        dom.set_attr(anchor, "href", relative);
    }
    Ok(())
}

/// Reject plain `http:` links unless their URL contains an allowed fragment.
///
/// # Errors
///
/// [`ValidationError::InsecureLinks`] listing each distinct offending URL.
pub fn check_insecure(dom: &Dom, root: NodeId, allow: &[String]) -> Result<()> {
    let mut insecure = BTreeSet::new();
    for anchor in selector::cached(r#"a[href^="http:"]"#)?.match_all(dom, root) {
        let Some(href) = dom.get_attr(anchor, "href") else {
            continue;
        };
        if !allow.iter().any(|host| href.contains(host.as_str())) {
            insecure.insert(href.to_string());
        }
    }

    if insecure.is_empty() {
        return Ok(());
    }
    for link in &insecure {
        warn!(%link, "insecure link");
    }
    Err(ValidationError::InsecureLinks {
        count: insecure.len(),
        links: insecure.into_iter().collect(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{content_root, parse_html, serialize_children};
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_link_relative() {
        let mut dom = parse_html(concat!(
            r#"<a href="https://example.com/blog/x">a</a>"#,
            r#"<a href="https://example.com">b</a>"#,
            r#"<a href="https://other.org/example.com">c</a>"#,
        ));
        let root = content_root(&dom);
        link_relative(&mut dom, root, "https://example.com").unwrap();

        assert_eq!(
            serialize_children(&dom, root).unwrap(),
            concat!(
                r#"<a href="/blog/x">a</a>"#,
                r#"<a href="/">b</a>"#,
                r#"<a href="https://other.org/example.com">c</a>"#,
            )
        );
    }

    #[test]
    fn test_secure_links_pass() {
        let dom = parse_html(r#"<a href="https://a.org">a</a><a href="/local">b</a>"#);
        assert!(check_insecure(&dom, content_root(&dom), &[]).is_ok());
    }

    #[test]
    fn test_insecure_links_reported_once() {
        let dom = parse_html(concat!(
            r#"<a href="http://b.org/">b</a>"#,
            r#"<a href="http://a.org/">a</a>"#,
            r#"<a href="http://b.org/">again</a>"#,
        ));
        match check_insecure(&dom, content_root(&dom), &[]).unwrap_err() {
            Error::Validation(ValidationError::InsecureLinks { count, links }) => {
                assert_eq!(count, 2);
                assert_eq!(links, vec!["http://a.org/", "http://b.org/"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_allow_list() {
        let dom = parse_html(r#"<a href="http://legacy.example.net/page">x</a>"#);
        let allow = vec!["legacy.example.net".to_string()];
        assert!(check_insecure(&dom, content_root(&dom), &allow).is_ok());
    }
}
