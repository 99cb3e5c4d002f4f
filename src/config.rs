//! Conversion settings and the line-oriented command grammar that sets them.
//!
//! ```text
//! # comments run to end of line
//! add-class table "table table-sm"
//! add-class "div:has(img)" "container pl-0"
//! link-relative "https://www.example.com"
//! allow-insecure intranet.example.com legacy.example.org
//! remove-empty-tags
//! unsmart-code "code, kbd"
//! narrow-tags
//! check-punc
//! disable insecure-links
//! ```
//!
//! Words are split on whitespace; double quotes group a word and `\"` or
//! `\\` escape inside them.

use crate::error::{Error, Result};

/// Default selector for empty-tag removal.
pub const REMOVE_EMPTY_SELECTOR: &str =
    "a:empty,p:empty,em:empty,i:empty,strong:empty,b:empty,span:empty,div:empty";
/// Default selector for typography normalization.
pub const UNSMART_SELECTOR: &str = "code,var,kbd";
/// Default selector for narrow-tag whitespace fixing.
pub const NARROW_SELECTOR: &str = "p a[href],p code,p i,p b,p strong,p em,p span";
/// Default selector for punctuation checking.
pub const PUNCT_SELECTOR: &str = "p";

/// A class list added to every element matching a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRule {
    pub selector: String,
    pub classes: String,
}

/// An optional pass with an overridable selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub enabled: bool,
    pub selector: String,
}

impl Toggle {
    fn on(selector: &str) -> Self {
        Self {
            enabled: true,
            selector: selector.to_string(),
        }
    }
}

/// Everything that varies between sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub add_class: Vec<ClassRule>,
    /// Absolute prefix stripped from matching links.
    pub link_relative: Option<String>,
    /// Host fragments exempt from the insecure-link check.
    pub allow_insecure: Vec<String>,
    pub check_insecure: bool,
    pub remove_empty: Toggle,
    pub unsmart: Toggle,
    pub narrow_tags: Toggle,
    pub check_punc: Toggle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            add_class: Vec::new(),
            link_relative: None,
            allow_insecure: Vec::new(),
            check_insecure: true,
            remove_empty: Toggle::on(REMOVE_EMPTY_SELECTOR),
            unsmart: Toggle::on(UNSMART_SELECTOR),
            narrow_tags: Toggle::on(NARROW_SELECTOR),
            check_punc: Toggle::on(PUNCT_SELECTOR),
        }
    }
}

impl Config {
    /// Parse a command script on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown commands, wrong argument counts,
    /// and unterminated quotes. Selector patterns are not compiled here.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let words = split_words(line).map_err(|message| Error::Config {
                line: line_no,
                message,
            })?;
            let Some((command, args)) = words.split_first() else {
                continue;
            };
            config
                .apply(command, args)
                .map_err(|message| Error::Config {
                    line: line_no,
                    message,
                })?;
        }
        Ok(config)
    }

    fn apply(&mut self, command: &str, args: &[String]) -> std::result::Result<(), String> {
        match command {
            "add-class" => {
                let [selector, classes] = exact::<2>(command, args)?;
                self.add_class.push(ClassRule { selector, classes });
            }
            "link-relative" => {
                let [prefix] = exact::<1>(command, args)?;
                if prefix.is_empty() {
                    return Err("link-relative: prefix is empty".to_string());
                }
                self.link_relative = Some(prefix);
            }
            "allow-insecure" => {
                if args.is_empty() {
                    return Err("allow-insecure: expected at least one host".to_string());
                }
                self.allow_insecure.extend(args.iter().cloned());
            }
            "disable" => {
                let [name] = exact::<1>(command, args)?;
                if name == "insecure-links" {
                    self.check_insecure = false;
                } else {
                    self.toggle_mut(&name)
                        .ok_or_else(|| format!("disable: unknown pass {name:?}"))?
                        .enabled = false;
                }
            }
            name => {
                let toggle = self
                    .toggle_mut(name)
                    .ok_or_else(|| format!("command {name:?} not found"))?;
                toggle.enabled = true;
                match args {
                    [] => {}
                    [selector] => toggle.selector = selector.clone(),
                    _ => return Err(format!("{name}: expected at most one selector")),
                }
            }
        }
        Ok(())
    }

    fn toggle_mut(&mut self, name: &str) -> Option<&mut Toggle> {
        match name {
            "remove-empty-tags" => Some(&mut self.remove_empty),
            "unsmart-code" => Some(&mut self.unsmart),
            "narrow-tags" => Some(&mut self.narrow_tags),
            "check-punc" => Some(&mut self.check_punc),
            _ => None,
        }
    }
}

fn exact<const N: usize>(command: &str, args: &[String]) -> std::result::Result<[String; N], String> {
    <[String; N]>::try_from(args.to_vec())
        .map_err(|_| format!("{command}: expected {N} argument(s), got {}", args.len()))
}

/// Split a line into words, honouring double quotes and `#` comments.
fn split_words(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            break;
        }

        let mut word = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => word.push(escaped),
                        None => return Err("unterminated quote".to_string()),
                    },
                    Some(other) => word.push(other),
                    None => return Err("unterminated quote".to_string()),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
        }
        words.push(word);
    }
    Ok(words)
}
