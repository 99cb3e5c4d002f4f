//! Inline style classification.
//!
//! The editor emits formatting only as inline `style` attributes with a
//! stable, minified shape (`font-weight:700`, no spaces). Classification is
//! literal substring containment against a fixed set of markers; there is no
//! cascade and no unit parsing.

use crate::dom::{Dom, NodeId};

const INDENT: &str = "margin-left:36pt";
const BOLD: &str = "font-weight:700";
const ITALIC: &str = "font-style:italic";
const UNDERLINE: &str = "text-decoration:underline";
const STRIKETHROUGH: &str = "text-decoration:line-through";

/// Monospace font families offered by the editor.
pub const MONOSPACE_FONTS: &[&str] = &[
    "Anonymous Pro",
    "Consolas",
    "Courier",
    "Cousine",
    "Cutive Mono",
    "Fira Mono",
    "Inconsolata",
    "Nova Mono",
    "Overpass Mono",
    "Oxygen Mono",
    "PT Mono",
    "Roboto Mono",
    "Share Tech Mono",
    "Source Code Pro",
    "Space Mono",
    "Ubuntu Mono",
    "VT323",
];

/// Formatting facts derived from one style attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleFacts {
    pub indented: bool,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub monospace: bool,
}

impl StyleFacts {
    /// True when no inline formatting applies.
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline || self.strikethrough || self.monospace)
    }
}

/// Classify an inline style string.
pub fn classify(style: &str) -> StyleFacts {
    StyleFacts {
        indented: style.contains(INDENT),
        bold: style.contains(BOLD),
        italic: style.contains(ITALIC),
        underline: style.contains(UNDERLINE),
        strikethrough: style.contains(STRIKETHROUGH),
        monospace: MONOSPACE_FONTS.iter().any(|font| style.contains(font)),
    }
}

/// Classify the `style` attribute of an element (plain facts when absent).
pub fn classify_node(dom: &Dom, id: NodeId) -> StyleFacts {
    dom.get_attr(id, "style").map(classify).unwrap_or_default()
}
