//! The conversion pipeline.
//!
//! A [`Converter`] holds everything that is fixed per site: compiled
//! selectors, the link policy, and the front-matter decoder. It is immutable
//! once built and can be shared across threads; each call parses its own tree.
//!
//! ```
//! use gdoc2hugo::Converter;
//!
//! let converter = Converter::new().unwrap();
//! let out = converter
//!     .convert(r#"<html><body><p class="c1 title">Hello</p><p><span style="font-weight:700">Bold</span> move.</p></body></html>"#)
//!     .unwrap();
//!
//! assert_eq!(out.html, "<p><strong>Bold</strong> move.</p>");
//! assert_eq!(out.meta.get("title").and_then(|v| v.as_str()), Some("Hello"));
//! ```

mod add_class;
mod attrs;
mod block;
mod escape;
mod front_matter;
mod image;
mod inline;
mod links;
mod narrow;
mod pass;
mod prune;
mod punct;
mod table;
mod unsmart;

pub use add_class::add_class;
pub use attrs::sanitize_attributes;
pub use block::{merge_blockquote_pre, merge_blockquotes, merge_code_blocks};
pub use escape::unescape_fixups;
pub use front_matter::{Headline, extract_front_matter, extract_headline};
pub use image::resolve_images;
pub use inline::{clean_href, normalize_spans, replace_nbsp};
pub use links::{check_insecure, link_relative};
pub use narrow::narrow_tags;
pub use pass::{Pass, for_each_child, walk_bottom_up};
pub use prune::prune_empty;
pub use punct::check_punctuation;
pub use table::normalize_tables;
pub use unsmart::{unsmart, unsmart_matches};

use std::sync::Arc;

use tracing::debug_span;

use crate::config::{Config, Toggle};
use crate::dom::{Dom, NodeId, Selector, content_root, parse_html, selector, serialize_children};
use crate::error::{Error, Result};
use crate::meta::{DocumentRecord, FrontMatter, MetaDecoder, MetaFormat, MetaValue, SerdeDecoder};

/// Markup and metadata produced from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Page body, without `html`/`head`/`body` wrappers.
    pub html: String,
    /// Front matter plus title and subtitle when the block did not set them.
    pub meta: FrontMatter,
}

/// A conversion merged with the document's store record, ready to write.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub html: String,
    pub meta: FrontMatter,
}

impl Page {
    /// The content file: front matter in `format`, then the markup.
    pub fn render(&self, format: MetaFormat) -> Result<String> {
        let mut out = self.meta.to_block(format)?;
        out.push_str(&self.html);
        out.push('\n');
        Ok(out)
    }
}

/// Runs the fixed pass pipeline over editor exports.
pub struct Converter {
    remove_empty: Option<Arc<Selector>>,
    unsmart: Option<Arc<Selector>>,
    narrow_tags: Option<Arc<Selector>>,
    check_punc: Option<Arc<Selector>>,
    link_relative: Option<String>,
    allow_insecure: Option<Vec<String>>,
    add_class: Vec<(Arc<Selector>, String)>,
    decoder: Box<dyn MetaDecoder>,
}

impl Converter {
    /// A converter with every lint enabled and the default selectors.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Compile a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selector`] for the first pattern that does not parse.
    pub fn with_config(config: Config) -> Result<Self> {
        let add_class = config
            .add_class
            .into_iter()
            .map(|rule| -> Result<_> { Ok((selector::cached(&rule.selector)?, rule.classes)) })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            remove_empty: compile_toggle(&config.remove_empty)?,
            unsmart: compile_toggle(&config.unsmart)?,
            narrow_tags: compile_toggle(&config.narrow_tags)?,
            check_punc: compile_toggle(&config.check_punc)?,
            link_relative: config.link_relative,
            allow_insecure: config.check_insecure.then_some(config.allow_insecure),
            add_class,
            decoder: Box::new(SerdeDecoder),
        })
    }

    /// Replace the front-matter decoder.
    pub fn with_decoder(mut self, decoder: impl MetaDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Convert an exported document.
    ///
    /// # Errors
    ///
    /// Fails on undecodable front matter and on any lint violation; no
    /// partial output is produced.
    pub fn convert(&self, html: &str) -> Result<Conversion> {
        let mut dom = parse_html(html);
        let root = content_root(&dom);
        let meta = self.convert_dom(&mut dom, root)?;

        let rendered = serialize_children(&dom, root)?;
        let html = unescape_fixups(&rendered).trim().to_string();
        Ok(Conversion { html, meta })
    }

    /// Convert raw export bytes, which must be UTF-8.
    pub fn convert_bytes(&self, bytes: &[u8]) -> Result<Conversion> {
        let (text, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
        if malformed {
            return Err(Error::Markup("input is not valid UTF-8".to_string()));
        }
        self.convert(&text)
    }

    /// Run every pass over an already parsed tree and return its metadata.
    pub fn convert_dom(&self, dom: &mut Dom, root: NodeId) -> Result<FrontMatter> {
        let mut headline = Headline::default();
        let mut meta = FrontMatter::new();

        for pass in Pass::PIPELINE {
            let _span = debug_span!("pass", name = pass.name()).entered();
            match pass {
                Pass::Title => headline = extract_headline(dom, root)?,
                Pass::FrontMatter => {
                    if let Some(block) = extract_front_matter(dom, root) {
                        meta = self.decoder.decode(&block)?;
                    }
                    if let Some(title) = headline.title.take() {
                        meta.fill("title", title);
                    }
                    if let Some(subtitle) = headline.subtitle.take() {
                        meta.fill("description", subtitle);
                    }
                }
                Pass::Images => resolve_images(dom, root)?,
                Pass::Spans => normalize_spans(dom, root),
                Pass::BlockquotePre => merge_blockquote_pre(dom, root),
                Pass::Blockquote => merge_blockquotes(dom, root),
                Pass::CodeBlock => merge_code_blocks(dom, root),
                Pass::Tables => normalize_tables(dom, root),
                Pass::Attributes => sanitize_attributes(dom, root),
                Pass::RemoveEmpty => {
                    if let Some(selector) = &self.remove_empty {
                        prune_empty(dom, root, selector);
                    }
                }
                Pass::Unsmart => {
                    if let Some(selector) = &self.unsmart {
                        unsmart_matches(dom, root, selector);
                    }
                }
                Pass::NarrowTags => {
                    if let Some(selector) = &self.narrow_tags {
                        narrow_tags(dom, root, selector)?;
                    }
                }
                Pass::Punctuation => {
                    if let Some(selector) = &self.check_punc {
                        check_punctuation(dom, root, selector)?;
                    }
                }
                Pass::LinkRelative => {
                    if let Some(prefix) = &self.link_relative {
                        link_relative(dom, root, prefix)?;
                    }
                }
                Pass::InsecureLinks => {
                    if let Some(allow) = &self.allow_insecure {
                        check_insecure(dom, root, allow)?;
                    }
                }
                Pass::AddClass => {
                    for (selector, classes) in &self.add_class {
                        add_class(dom, root, selector, classes);
                    }
                }
            }
        }
        Ok(meta)
    }

    /// Convert and merge in the store record.
    ///
    /// Record values only fill keys the document left unset. The page must
    /// end up with a `date`; `date-year`, `date-month` and `date-day` are
    /// derived from it for date-based permalinks.
    ///
    /// # Errors
    ///
    /// Everything [`Converter::convert`] fails on, plus [`Error::Metadata`]
    /// when no date is available.
    pub fn to_page(&self, html: &str, record: &DocumentRecord) -> Result<Page> {
        let Conversion { html, mut meta } = self.convert(html)?;
        meta.merge_absent(record.to_meta());

        let date = meta
            .get("date")
            .and_then(MetaValue::as_date)
            .copied()
            .ok_or_else(|| Error::Metadata {
                format: "page".to_string(),
                message: "no date in front matter or document record".to_string(),
            })?;
        meta.insert("date-year", date.format("%Y").to_string());
        meta.insert("date-month", date.format("%Y/%m").to_string());
        meta.insert("date-day", date.format("%Y/%m/%d").to_string());

        Ok(Page { html, meta })
    }
}

fn compile_toggle(toggle: &Toggle) -> Result<Option<Arc<Selector>>> {
    if !toggle.enabled {
        return Ok(None);
    }
    selector::cached(&toggle.selector).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bad_selector_fails_at_setup() {
        let config = Config::parse("narrow-tags \"p >\"").unwrap();
        assert!(matches!(
            Converter::with_config(config),
            Err(Error::Selector { .. })
        ));
    }

    #[test]
    fn test_disabled_lint_is_skipped() {
        let html = "<p>no ending</p>";
        assert!(matches!(
            Converter::new().unwrap().convert(html),
            Err(Error::Validation(ValidationError::ParagraphEnding { .. }))
        ));

        let config = Config::parse("disable check-punc").unwrap();
        let out = Converter::with_config(config).unwrap().convert(html).unwrap();
        assert_eq!(out.html, "<p>no ending</p>");
    }

    #[test]
    fn test_insecure_links_toggle() {
        let html = r#"<p><a href="http://a.org/">a</a> b.</p>"#;
        assert!(Converter::new().unwrap().convert(html).is_err());

        let config = Config::parse("disable insecure-links").unwrap();
        assert!(Converter::with_config(config).unwrap().convert(html).is_ok());

        let config = Config::parse("allow-insecure a.org").unwrap();
        assert!(Converter::with_config(config).unwrap().convert(html).is_ok());
    }

    #[test]
    fn test_convert_bytes_rejects_invalid_utf8() {
        let converter = Converter::new().unwrap();
        assert!(matches!(
            converter.convert_bytes(b"<p>\xff\xfe</p>"),
            Err(Error::Markup(_))
        ));
        assert_eq!(converter.convert_bytes("<p>ok.</p>".as_bytes()).unwrap().html, "<p>ok.</p>");
    }

    #[test]
    fn test_page_render() {
        let record = DocumentRecord {
            created: crate::meta::parse_date("2020-02-03"),
            ..Default::default()
        };
        let page = Converter::new().unwrap().to_page("<p>Hi.</p>", &record).unwrap();
        let rendered = page.render(MetaFormat::Json).unwrap();

        assert!(rendered.starts_with('{'));
        assert!(rendered.contains(r#""date-day": "2020/02/03""#));
        assert!(rendered.ends_with("}\n<p>Hi.</p>\n"));
    }

    #[test]
    fn test_custom_decoder() {
        struct Fixed;
        impl MetaDecoder for Fixed {
            fn decode(&self, _block: &crate::meta::FrontMatterBlock) -> Result<FrontMatter> {
                let mut meta = FrontMatter::new();
                meta.insert("title", "From decoder");
                Ok(meta)
            }
        }

        let converter = Converter::new().unwrap().with_decoder(Fixed);
        let out = converter
            .convert(r#"<p class="title">Ignored</p><p>---</p><p>x: 1</p><p>---</p><p>Body.</p>"#)
            .unwrap();
        assert_eq!(out.meta.get("title"), Some(&MetaValue::from("From decoder")));
        assert_eq!(out.html, "<p>Body.</p>");
    }
}
