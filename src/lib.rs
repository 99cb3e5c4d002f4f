//! # gdoc2hugo
//!
//! Turns word-processor HTML exports into clean markup for a static site
//! generator.
//!
//! ## Features
//!
//! - Collapses styled `<span>` soup into `em`, `strong`, `u`, `del` and `code`
//! - Rebuilds blockquotes, code blocks and table headers from indentation,
//!   monospace runs and bold cells
//! - Extracts YAML, TOML or JSON front matter typed at the top of the document
//! - Lints spacing around inline tags, paragraph punctuation and `http:` links
//! - Keeps Hugo shortcodes typed into the document intact
//!
//! ## Quick Start
//!
//! ```
//! use gdoc2hugo::{Converter, DocumentRecord};
//!
//! let export = concat!(
//!     "<html><body>",
//!     "<p>---</p><p>title: \u{201c}Hello\u{201d}</p><p>date: 2018-03-04</p><p>---</p>",
//!     r#"<p style="margin-left:36pt">A quote.</p>"#,
//!     "</body></html>",
//! );
//!
//! let converter = Converter::new().unwrap();
//! let page = converter.to_page(export, &DocumentRecord::default()).unwrap();
//!
//! assert_eq!(page.html, "<blockquote>A quote.</blockquote>");
//! assert_eq!(page.meta.get("title").and_then(|v| v.as_str()), Some("Hello"));
//! assert_eq!(page.meta.get("date-month").and_then(|v| v.as_str()), Some("2018/03"));
//! ```
//!
//! ## Configuration
//!
//! Site-wide settings come from a small command script:
//!
//! ```
//! use gdoc2hugo::{Config, Converter};
//!
//! let config = Config::parse(r#"
//! add-class table "table table-sm"
//! link-relative "https://example.com"
//! disable check-punc
//! "#).unwrap();
//! let converter = Converter::with_config(config).unwrap();
//! ```

pub mod config;
pub mod convert;
pub mod dom;
pub mod error;
pub mod meta;
pub mod style;

pub use config::Config;
pub use convert::{Conversion, Converter, Page, Pass};
pub use error::{Error, Result, ValidationError};
pub use meta::{DocumentRecord, FrontMatter, MetaDecoder, MetaFormat, MetaValue, SerdeDecoder};
pub use style::{StyleFacts, classify};
