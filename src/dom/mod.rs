//! Tree model for editor exports.
//!
//! Markup is parsed by html5ever into an arena ([`Dom`]), rewritten in place
//! by the conversion passes, and rendered back with html5ever's serializer.
//!
//! # Example
//!
//! ```
//! use gdoc2hugo::dom::{content_root, parse_html, serialize_children, Selector};
//!
//! let dom = parse_html(r#"<p class="c1 title">Hello</p><p>World.</p>"#);
//! let root = content_root(&dom);
//!
//! let title = Selector::compile("p[class~=title]").unwrap();
//! assert!(title.match_first(&dom, root).is_some());
//!
//! let html = serialize_children(&dom, root).unwrap();
//! assert_eq!(html, r#"<p class="c1 title">Hello</p><p>World.</p>"#);
//! ```

mod arena;
mod element_ref;
pub mod selector;
mod serialize;
mod text;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, Descendants, Dom, Node, NodeData, NodeId, html_name};
pub use element_ref::{DocSelectors, ElementRef};
pub use selector::Selector;
pub use serialize::serialize_children;
pub use text::{flattened_text, last_text_node, next_in_block, prev_in_block, text_nodes};
pub use tree_sink::DomSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

/// Parse a document or fragment into an arena.
///
/// html5ever recovers from every malformed input the way a browser would, so
/// parsing itself never fails.
pub fn parse_html(html: &str) -> Dom {
    let sink = DomSink::new();
    let result = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    result.into_dom()
}

/// The node the pipeline operates under: the first `body`, else the document.
pub fn content_root(dom: &Dom) -> NodeId {
    dom.find_by_tag("body").unwrap_or_else(|| dom.document())
}
