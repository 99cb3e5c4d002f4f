//! Error types for gdoc2hugo operations.

use thiserror::Error;

/// Errors that can occur while converting a document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Malformed markup: {0}")]
    Markup(String),

    #[error("Invalid selector {pattern:?}: {message}")]
    Selector { pattern: String, message: String },

    #[error("Invalid configuration on line {line}: {message}")]
    Config { line: usize, message: String },

    #[error("Invalid {format} front matter: {message}")]
    Metadata { format: String, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Lint failures that point at a spot in the source document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("tag <{tag}> {text:?} has ending {ending:?}")]
    AnchorEnding {
        tag: String,
        text: String,
        ending: char,
    },

    #[error("paragraph {text:?}: {reason}")]
    ParagraphEnding { text: String, reason: String },

    #[error("found {count} insecure links: {}", links.join(", "))]
    InsecureLinks { count: usize, links: Vec<String> },
}

pub type Result<T> = std::result::Result<T, Error>;
