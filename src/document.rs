//! A concrete value tree standing in for the output of a generic
//! structured-document parser (YAML/JSON). The metadata loader only ever
//! walks a [`Document`]; it never touches raw bytes.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

/// A parsed document value.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Sequence(Vec<Document>),
    Mapping(IndexMap<String, Document>),
}

impl Document {
    /// Returns true if this is [`Document::Null`] or an empty mapping/sequence.
    pub fn is_blank(&self) -> bool {
        match self {
            Document::Null => true,
            Document::Mapping(m) => m.is_empty(),
            Document::Sequence(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Document>> {
        match self {
            Document::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Reduces a date-time scalar to its date component; strings and dates
    /// pass through unchanged. Returns `None` for any other variant.
    pub fn as_removal_date_field(&self) -> Option<RemovalDateField> {
        match self {
            Document::Date(d) => Some(RemovalDateField::Date(*d)),
            Document::DateTime(dt) => Some(RemovalDateField::Date(dt.date())),
            Document::String(s) => Some(RemovalDateField::Text(s.clone())),
            _ => None,
        }
    }
}

/// The normalized shape of a `removal_date` field after date-time reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalDateField {
    Date(NaiveDate),
    Text(String),
}

#[cfg(feature = "yaml-fixtures")]
mod yaml_adapter {
    use super::*;

    /// Converts a `serde_yaml::Value` into a [`Document`], the bridge between
    /// actual YAML bytes (read from a bundle's `meta/runtime.yml`, or typed
    /// inline in a test) and the parser-agnostic tree the loader walks.
    /// Dates/date-times are recognized the way an implicit-resolver YAML
    /// parser would: an unquoted scalar matching `YYYY-MM-DD` or
    /// `YYYY-MM-DD HH:MM:SS` is promoted.
    impl From<serde_yaml::Value> for Document {
        fn from(value: serde_yaml::Value) -> Self {
            use serde_yaml::Value;
            match value {
                Value::Null => Document::Null,
                Value::Bool(b) => Document::Bool(b),
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Document::Int(i)
                    } else {
                        Document::Float(n.as_f64().unwrap_or_default())
                    }
                }
                Value::String(s) => parse_scalar_string(s),
                Value::Sequence(seq) => {
                    Document::Sequence(seq.into_iter().map(Document::from).collect())
                }
                Value::Mapping(map) => {
                    let mut out = IndexMap::new();
                    for (k, v) in map {
                        if let Value::String(key) = k {
                            out.insert(key, Document::from(v));
                        }
                    }
                    Document::Mapping(out)
                }
                Value::Tagged(t) => Document::from(t.value),
            }
        }
    }

    fn parse_scalar_string(s: String) -> Document {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
            return Document::DateTime(dt);
        }
        if let Ok(d) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            return Document::Date(d);
        }
        Document::String(s)
    }
}
