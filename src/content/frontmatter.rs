//! Front-matter parsing
//!
//! Markdown files may open with a `---` delimited YAML block. The block is
//! decoded into a generic mapping first and then validated field by field
//! into [`Metadata`], so a mistyped field is dropped instead of failing
//! the whole file.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Opening and closing delimiter of a metadata block
const DELIMITER: &str = "---";

/// YAML document end marker, accepted as a closing delimiter
const DOCUMENT_END: &str = "...";

/// Errors raised while decoding a metadata block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataParseError {
    #[error("metadata block is missing its closing delimiter")]
    Unterminated,

    #[error("invalid YAML in metadata block: {0}")]
    Yaml(String),

    #[error("invalid JSON metadata: {0}")]
    Json(String),

    #[error("metadata must be a key/value mapping")]
    NotAMapping,
}

/// Front-matter data from a post or project entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Inline stylesheet captured from an HTML entry
    pub styles: Option<String>,
    /// Additional custom fields, in authored order
    pub extra: IndexMap<String, Value>,
}

impl Metadata {
    /// Validate a decoded mapping into metadata.
    ///
    /// Known keys with an unusable type are logged and dropped; unknown keys
    /// are kept in `extra`.
    pub fn from_mapping(mapping: IndexMap<String, Value>) -> Self {
        let mut meta = Metadata::default();

        for (key, value) in mapping {
            match key.as_str() {
                "title" => meta.title = scalar_string(&key, value),
                "date" => meta.date = scalar_string(&key, value),
                "description" => meta.description = scalar_string(&key, value),
                "styles" => meta.styles = scalar_string(&key, value),
                "tags" => meta.tags = string_list(value),
                _ => {
                    meta.extra.insert(key, value);
                }
            }
        }

        meta
    }

    /// Decode a YAML block into metadata
    pub fn from_yaml(block: &str) -> Result<Self, MetadataParseError> {
        if block.trim().is_empty() {
            return Ok(Metadata::default());
        }

        let value: Value =
            serde_yaml::from_str(block).map_err(|e| MetadataParseError::Yaml(e.to_string()))?;

        match value {
            Value::Null => Ok(Metadata::default()),
            Value::Mapping(mapping) => Ok(Self::from_mapping(string_keys(mapping))),
            _ => Err(MetadataParseError::NotAMapping),
        }
    }

    /// Decode a JSON object into metadata
    pub fn from_json(text: &str) -> Result<Self, MetadataParseError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| MetadataParseError::Json(e.to_string()))?;

        if !value.is_object() {
            return Err(MetadataParseError::NotAMapping);
        }

        match serde_yaml::to_value(value) {
            Ok(Value::Mapping(mapping)) => Ok(Self::from_mapping(string_keys(mapping))),
            Ok(_) => Err(MetadataParseError::NotAMapping),
            Err(e) => Err(MetadataParseError::Json(e.to_string())),
        }
    }

    /// Serialize back into a delimited block, including the trailing newline
    pub fn to_frontmatter(&self) -> String {
        let mut mapping = Mapping::new();

        let fields = [
            ("title", &self.title),
            ("date", &self.date),
            ("description", &self.description),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                mapping.insert(Value::from(key), Value::from(value.as_str()));
            }
        }
        if !self.tags.is_empty() {
            let tags = self.tags.iter().map(|t| Value::from(t.as_str())).collect();
            mapping.insert(Value::from("tags"), Value::Sequence(tags));
        }
        if let Some(styles) = &self.styles {
            mapping.insert(Value::from("styles"), Value::from(styles.as_str()));
        }
        for (key, value) in &self.extra {
            mapping.insert(Value::from(key.as_str()), value.clone());
        }

        if mapping.is_empty() {
            return format!("{DELIMITER}\n{DELIMITER}\n");
        }

        let yaml = serde_yaml::to_string(&mapping).unwrap_or_default();
        format!("{DELIMITER}\n{yaml}{DELIMITER}\n")
    }

    /// Parse the date string into a timestamp
    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

/// Parse front-matter from a markdown blob.
///
/// Returns `(metadata, body)`. A blob without an opening delimiter yields
/// empty metadata and the whole blob as body.
pub fn parse(content: &str) -> Result<(Metadata, &str), MetadataParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    match split_block(content)? {
        Some((block, body)) => Ok((Metadata::from_yaml(block)?, body)),
        None => Ok((Metadata::default(), content)),
    }
}

/// Split a blob into its raw metadata block and body
fn split_block(content: &str) -> Result<Option<(&str, &str)>, MetadataParseError> {
    let Some(rest) = strip_opening_line(content) else {
        return Ok(None);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == DELIMITER || trimmed == DOCUMENT_END {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Some((block, body)));
        }
        offset += line.len();
    }

    Err(MetadataParseError::Unterminated)
}

fn strip_opening_line(content: &str) -> Option<&str> {
    let (first, rest) = match content.find('\n') {
        Some(pos) => (&content[..pos], &content[pos + 1..]),
        None => (content, ""),
    };

    (first.trim_end() == DELIMITER).then_some(rest)
}

fn string_keys(mapping: Mapping) -> IndexMap<String, Value> {
    mapping
        .into_iter()
        .filter_map(|(key, value)| match key {
            Value::String(key) => Some((key, value)),
            Value::Number(n) => Some((n.to_string(), value)),
            Value::Bool(b) => Some((b.to_string(), value)),
            other => {
                tracing::warn!("Ignoring metadata entry with non-scalar key: {:?}", other);
                None
            }
        })
        .collect()
}

fn scalar_string(key: &str, value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => {
            tracing::warn!("Ignoring metadata field `{}` with unexpected value: {:?}", key, other);
            None
        }
    }
}

/// Tags may be a single string or a list of strings
fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s],
        Value::Sequence(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                other => {
                    tracing::warn!("Ignoring non-string tag: {:?}", other);
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!("Ignoring tags with unexpected value: {:?}", other);
            Vec::new()
        }
    }
}

/// Parse a date string in various formats
pub fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    // RFC 3339 / ISO 8601 with offset, compared in UTC
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.naive_utc())
}
