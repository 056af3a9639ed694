//! Deprecation and tombstone annotations.

use crate::document::{Document, RemovalDateField};
use crate::error::CatalogError;
use chrono::NaiveDate;

/// A deprecation or tombstone annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemovalRecord {
    pub warning_text: Option<String>,
    pub removal_version: Option<String>,
    pub removal_date: Option<RemovalDate>,
}

/// `removal_date` is either a calendar date (the common case, produced when
/// the source document's parser resolves an unquoted ISO date/date-time
/// scalar) or free-form text (when the document quoted the value, or used a
/// non-date string outright).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalDate {
    Date(NaiveDate),
    Text(String),
}

impl RemovalRecord {
    /// Loads a `RemovalRecord` from a document mapping, applying the same
    /// shape rules for deprecation and tombstone entries: `warning_text` and
    /// `removal_version` must be strings if present, `removal_date` must be
    /// a date, date-time (reduced to its date), or string if present.
    pub fn load(
        doc: &Document,
        path: &str,
        plugin_type: &str,
        plugin: &str,
    ) -> Result<RemovalRecord, CatalogError> {
        let mapping = doc.as_mapping().ok_or_else(|| {
            CatalogError::metadata_shape(
                path,
                plugin_type,
                plugin,
                "expected a mapping for removal data",
            )
        })?;

        let warning_text = match mapping.get("warning_text") {
            Some(Document::String(s)) => Some(s.clone()),
            Some(Document::Null) | None => None,
            Some(_) => {
                return Err(CatalogError::metadata_shape(
                    format!("{path}.warning_text"),
                    plugin_type,
                    plugin,
                    "warning_text must be a string",
                ))
            }
        };

        let removal_version = match mapping.get("removal_version") {
            Some(Document::String(s)) => Some(s.clone()),
            Some(Document::Null) | None => None,
            Some(_) => {
                return Err(CatalogError::metadata_shape(
                    format!("{path}.removal_version"),
                    plugin_type,
                    plugin,
                    "removal_version must be a string",
                ))
            }
        };

        let removal_date = match mapping.get("removal_date") {
            None | Some(Document::Null) => None,
            Some(other) => match other.as_removal_date_field() {
                Some(RemovalDateField::Date(d)) => Some(RemovalDate::Date(d)),
                Some(RemovalDateField::Text(s)) => Some(RemovalDate::Text(s)),
                None => {
                    return Err(CatalogError::metadata_shape(
                        format!("{path}.removal_date"),
                        plugin_type,
                        plugin,
                        "removal_date must be a date or a string",
                    ))
                }
            },
        };

        Ok(RemovalRecord {
            warning_text,
            removal_version,
            removal_date,
        })
    }
}
