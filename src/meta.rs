//! Front matter values and decoding.
//!
//! The converter only captures the raw front-matter text; turning it into
//! values is the job of a [`MetaDecoder`]. [`SerdeDecoder`] is the default
//! and understands the three formats the static site generator accepts,
//! chosen by the opening delimiter:
//!
//! | Delimiter | Format |
//! |-----------|--------|
//! | `---`     | YAML   |
//! | `+++`     | TOML   |
//! | `{`       | JSON   |

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// Serialization format of a front-matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaFormat {
    Yaml,
    Toml,
    Json,
}

impl MetaFormat {
    /// Format announced by an opening delimiter line.
    pub fn from_opening(line: &str) -> Option<Self> {
        match line {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            "{" => Some(Self::Json),
            _ => None,
        }
    }

    /// Delimiter that opens a block of this format.
    pub fn opening(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
            Self::Json => "{",
        }
    }

    /// Delimiter that closes a block of this format.
    pub fn closing(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
            Self::Json => "}",
        }
    }
}

impl fmt::Display for MetaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        })
    }
}

/// Raw front-matter text captured from a document, delimiters included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatterBlock {
    pub format: MetaFormat,
    pub raw: String,
}

impl FrontMatterBlock {
    /// The block with its delimiter lines removed (JSON keeps its braces).
    pub fn body(&self) -> &str {
        if self.format == MetaFormat::Json {
            return &self.raw;
        }
        let opening = self.format.opening();
        let rest = self.raw.trim();
        let rest = rest.strip_prefix(opening).unwrap_or(rest);
        rest.strip_suffix(self.format.closing()).unwrap_or(rest)
    }
}

/// A single front-matter value.
///
/// Serializes as the bare value; dates as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Date(DateTime<FixedOffset>),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    /// Build a string value, promoting date-shaped strings to [`MetaValue::Date`].
    pub fn from_text(text: &str) -> Self {
        parse_date(text).map_or_else(|| Self::String(text.to_string()), Self::Date)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for MetaValue {
    fn from(d: DateTime<Tz>) -> Self {
        Self::Date(d.fixed_offset())
    }
}

/// Parse RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS`, and bare dates.
///
/// Values without an offset are taken as UTC.
pub fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(text) {
        return Some(d);
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&d).fixed_offset());
    }
    let day = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?).fixed_offset())
}

/// Front-matter map with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrontMatter {
    values: BTreeMap<String, MetaValue>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Set a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Set a value only if the key is not present yet.
    ///
    /// Returns `true` when the value was stored.
    pub fn fill(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> bool {
        let key = key.into();
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, value.into());
        true
    }

    /// Fill every key of `other` that is absent here.
    pub fn merge_absent(&mut self, other: FrontMatter) {
        for (key, value) in other.values {
            self.values.entry(key).or_insert(value);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Render as a delimited block, ready to prepend to page content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metadata`] when a value cannot be expressed in
    /// `format` (TOML has no null, for instance).
    pub fn to_block(&self, format: MetaFormat) -> Result<String> {
        let error = |message: String| Error::Metadata {
            format: format.to_string(),
            message,
        };
        match format {
            MetaFormat::Yaml => {
                let body = serde_yaml::to_string(self).map_err(|e| error(e.to_string()))?;
                Ok(format!("---\n{body}---\n"))
            }
            MetaFormat::Toml => {
                let body = toml::to_string(self).map_err(|e| error(e.to_string()))?;
                Ok(format!("+++\n{body}+++\n"))
            }
            MetaFormat::Json => {
                let body = serde_json::to_string_pretty(self).map_err(|e| error(e.to_string()))?;
                Ok(format!("{body}\n"))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, MetaValue)> for FrontMatter {
    fn from_iter<I: IntoIterator<Item = (String, MetaValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Turns a captured front-matter block into values.
pub trait MetaDecoder: Send + Sync {
    /// # Errors
    ///
    /// Returns [`Error::Metadata`] when the block is not valid in its format.
    fn decode(&self, block: &FrontMatterBlock) -> Result<FrontMatter>;
}

/// Decoder backed by serde_yaml, toml and serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeDecoder;

impl MetaDecoder for SerdeDecoder {
    fn decode(&self, block: &FrontMatterBlock) -> Result<FrontMatter> {
        let body = block.body();
        if body.trim().is_empty() {
            return Ok(FrontMatter::new());
        }

        let error = |message: String| Error::Metadata {
            format: block.format.to_string(),
            message,
        };

        let value = match block.format {
            MetaFormat::Yaml => {
                let value: serde_yaml::Value =
                    serde_yaml::from_str(body).map_err(|e| error(e.to_string()))?;
                from_yaml(value)
            }
            MetaFormat::Toml => {
                let table: toml::Table = toml::from_str(body).map_err(|e| error(e.to_string()))?;
                from_toml(toml::Value::Table(table))
            }
            MetaFormat::Json => {
                let value: serde_json::Value =
                    serde_json::from_str(body).map_err(|e| error(e.to_string()))?;
                from_json(value)
            }
        };

        match value {
            MetaValue::Map(map) => Ok(map.into_iter().collect()),
            other => Err(error(format!("expected a map at top level, got {other:?}"))),
        }
    }
}

fn from_yaml(value: serde_yaml::Value) -> MetaValue {
    use serde_yaml::Value;
    match value {
        Value::Null => MetaValue::String(String::new()),
        Value::Bool(b) => MetaValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => MetaValue::Integer(i),
            None => MetaValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => MetaValue::from_text(&s),
        Value::Sequence(items) => MetaValue::List(items.into_iter().map(from_yaml).collect()),
        Value::Mapping(map) => MetaValue::Map(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), from_yaml(v)))
                .collect(),
        ),
        Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn from_toml(value: toml::Value) -> MetaValue {
    use toml::Value;
    match value {
        Value::String(s) => MetaValue::from_text(&s),
        Value::Integer(i) => MetaValue::Integer(i),
        Value::Float(f) => MetaValue::Float(f),
        Value::Boolean(b) => MetaValue::Bool(b),
        Value::Datetime(dt) => {
            let text = dt.to_string();
            parse_date(&text).map_or(MetaValue::String(text), MetaValue::Date)
        }
        Value::Array(items) => MetaValue::List(items.into_iter().map(from_toml).collect()),
        Value::Table(table) => {
            MetaValue::Map(table.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
    }
}

fn from_json(value: serde_json::Value) -> MetaValue {
    use serde_json::Value;
    match value {
        Value::Null => MetaValue::String(String::new()),
        Value::Bool(b) => MetaValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => MetaValue::Integer(i),
            None => MetaValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => MetaValue::from_text(&s),
        Value::Array(items) => MetaValue::List(items.into_iter().map(from_json).collect()),
        Value::Object(map) => {
            MetaValue::Map(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

/// Metadata the document store keeps about a file.
#[derive(Debug, Clone, Default)]
pub struct DocumentRecord {
    pub created: Option<DateTime<FixedOffset>>,
    pub modified: Option<DateTime<FixedOffset>>,
    pub description: Option<String>,
}

impl DocumentRecord {
    /// Record fields under the keys the site generator expects.
    pub fn to_meta(&self) -> FrontMatter {
        let mut meta = FrontMatter::new();
        if let Some(created) = self.created {
            meta.insert("date", created);
        }
        if let Some(modified) = self.modified {
            meta.insert("lastmod", modified);
        }
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            meta.insert("description", description);
        }
        meta
    }
}
