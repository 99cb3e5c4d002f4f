//! Image unwrapping and comment-to-alt-text resolution.
//!
//! The editor exports an image as `<p><span><img></span></p>`. Authors put
//! alt text in a comment on the image, exported as a superscript marker
//! next to it and a definition at the end of the document:
//!
//! ```html
//! <p><span><img src="..."></span><sup><a href="#cmnt1" id="cmnt_ref1">[a]</a></sup></p>
//! ...
//! <div><p><a href="#cmnt_ref1" id="cmnt1">[a]</a><span>A diagram of the pipeline</span></p></div>
//! ```

use tracing::{debug, warn};

use crate::dom::{Dom, NodeId, flattened_text, selector};
use crate::error::Result;

pub fn resolve_images(dom: &mut Dom, root: NodeId) -> Result<()> {
    let markers = selector::cached("sup>a")?;

    // One span may wrap several images; unwrap each span once
    let mut spans: Vec<NodeId> = Vec::new();
    for img in selector::cached("p>span>img")?.match_all(dom, root) {
        if let Some(span) = dom.parent(img)
            && !spans.contains(&span)
        {
            spans.push(span);
        }
    }

    for span in spans {
        let Some(p) = dom.parent(span) else {
            continue;
        };
        if !dom.is_tag(span, "span") || !dom.is_tag(p, "p") {
            continue;
        }
        let Some(img) = dom.children(span).filter(|&c| dom.is_tag(c, "img")).last() else {
            continue;
        };
        dom.hoist_children(span);
        dom.detach(span);

        for marker in markers.match_all(dom, p) {
            let Some(target) = dom
                .get_attr(marker, "href")
                .and_then(|href| href.strip_prefix('#'))
                .filter(|id| !id.is_empty())
                .map(str::to_string)
            else {
                continue;
            };

            let Some(anchor) = dom.find_by_id(root, &target) else {
                warn!(id = %target, "comment anchor not found");
                continue;
            };

            let alt = dom
                .next_sibling(anchor)
                .map(|text| flattened_text(dom, text))
                .unwrap_or_default();
            let alt = alt.trim();
            debug!(id = %target, alt, "resolved image comment");
            dom.set_attr(img, "alt", alt);

            if let Some(definition) = dom.parent(anchor) {
                dom.detach(definition);
            }
            if let Some(sup) = dom.parent(marker) {
                dom.detach(sup);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{content_root, parse_html, serialize_children};
    use pretty_assertions::assert_eq;

    fn run(html: &str) -> String {
        let mut dom = parse_html(html);
        let root = content_root(&dom);
        resolve_images(&mut dom, root).unwrap();
        serialize_children(&dom, root).unwrap()
    }

    #[test]
    fn test_span_unwrapped() {
        assert_eq!(
            run(r#"<p><span class="c1"><img src="a.png"> </span></p>"#),
            r#"<p><img src="a.png"> </p>"#
        );
    }

    #[test]
    fn test_comment_becomes_alt() {
        assert_eq!(
            run(concat!(
                r##"<p><span><img src="a.png"></span><sup><a href="#cmnt1" id="cmnt_ref1">[a]</a></sup></p>"##,
                r#"<p>Text.</p>"#,
                r##"<div><p><a href="#cmnt_ref1" id="cmnt1">[a]</a><span class="c2">A diagram</span></p></div>"##,
            )),
            r#"<p><img src="a.png" alt="A diagram"></p><p>Text.</p><div></div>"#
        );
    }

    #[test]
    fn test_missing_anchor_is_ignored() {
        assert_eq!(
            run(r##"<p><span><img src="a.png"></span><sup><a href="#cmnt9">[a]</a></sup></p>"##),
            r##"<p><img src="a.png"><sup><a href="#cmnt9">[a]</a></sup></p>"##
        );
    }

    #[test]
    fn test_span_with_two_images() {
        assert_eq!(
            run(concat!(
                r#"<p>Intro.</p>"#,
                r#"<p><span><img src="a.png"><img src="b.png"></span></p>"#,
                r##"<p>Footnote here<sup><a href="#ftnt1" id="ftnt_ref1">[1]</a></sup>.</p>"##,
                r##"<div><p><a href="#ftnt_ref1" id="ftnt1">[1]</a><span>Note text.</span></p></div>"##,
            )),
            concat!(
                r#"<p>Intro.</p>"#,
                r#"<p><img src="a.png"><img src="b.png"></p>"#,
                r##"<p>Footnote here<sup><a href="#ftnt1" id="ftnt_ref1">[1]</a></sup>.</p>"##,
                r##"<div><p><a href="#ftnt_ref1" id="ftnt1">[1]</a><span>Note text.</span></p></div>"##,
            )
        );
    }

    #[test]
    fn test_comment_goes_to_last_image_of_span() {
        assert_eq!(
            run(concat!(
                r##"<p><span><img src="a.png"><img src="b.png"></span><sup><a href="#cmnt1">[a]</a></sup></p>"##,
                r##"<div><p><a id="cmnt1">[a]</a><span>Both</span></p></div>"##,
            )),
            r#"<p><img src="a.png"><img src="b.png" alt="Both"></p><div></div>"#
        );
    }
}
