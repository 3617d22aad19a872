//! # Stored Site Format
//!
//! The persisted record keeps each structured field as its own JSON string so
//! a store can diff or patch one field without touching the others.
//!
//! ```text
//! { "name": "Demo", "version": "1",
//!   "context": "{\"namespace\":\"demo\",...}",
//!   "pages": "{\"/\":{...}}", "pageOrder": "[\"/\"]",
//!   "history": "{\"commands\":[...],\"cursor\":3}", ... }
//! ```

use crate::document::SiteDocument;
use crate::history::CommandHistory;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sitebuilder_model::Site;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Format tag this build reads and writes
pub const FORMAT_VERSION: &str = "1";

pub type SerializeResult<T> = Result<T, SerializeError>;

#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("Stored site has version {found}, expected {expected}")]
    VersionMismatch { expected: String, found: String },

    #[error("Malformed field `{field}`: {source}")]
    Json {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed timestamp `{value}`: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSite {
    pub name: String,
    pub version: String,
    pub defaults: String,
    pub context: String,
    pub pages: String,
    #[serde(rename = "pageOrder")]
    pub page_order: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_id: Option<String>,
}

impl StoredSite {
    pub fn updated_at(&self) -> SerializeResult<Option<DateTime<Utc>>> {
        self.updated_at.as_deref().map(parse_timestamp).transpose()
    }
}

fn encode<T: Serialize>(field: &'static str, value: &T) -> SerializeResult<String> {
    serde_json::to_string(value).map_err(|source| SerializeError::Json { field, source })
}

fn decode<T: for<'de> Deserialize<'de>>(field: &'static str, raw: &str) -> SerializeResult<T> {
    serde_json::from_str(raw).map_err(|source| SerializeError::Json { field, source })
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_timestamp(value: &str) -> SerializeResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|source| SerializeError::Timestamp {
            value: value.to_string(),
            source,
        })
}

#[instrument(skip(document), fields(site = %document.site.name))]
pub fn serialize_document(document: &SiteDocument) -> SerializeResult<StoredSite> {
    let site = &document.site;
    let history = if document.history == CommandHistory::default() {
        None
    } else {
        Some(encode("history", &document.history)?)
    };

    Ok(StoredSite {
        name: site.name.clone(),
        version: site.version.clone(),
        defaults: encode("defaults", &site.defaults)?,
        context: encode("context", &site.context)?,
        pages: encode("pages", &site.pages)?,
        page_order: encode("pageOrder", &site.page_order)?,
        editor: site.editor.as_ref().map(|e| encode("editor", e)).transpose()?,
        history,
        updated_at: site.updated_at.as_ref().map(format_timestamp),
        content_updated_at: site.content_updated_at.as_ref().map(format_timestamp),
        preview_id: site.preview_id.clone(),
    })
}

/// Rebuild a document from its stored form.
///
/// The stored version must equal `expected_version`; a mismatch is reported
/// before any field is decoded.
#[instrument(skip(stored), fields(site = %stored.name, version = %stored.version))]
pub fn deserialize_document(
    stored: &StoredSite,
    expected_version: &str,
) -> SerializeResult<SiteDocument> {
    if stored.version != expected_version {
        return Err(SerializeError::VersionMismatch {
            expected: expected_version.to_string(),
            found: stored.version.clone(),
        });
    }

    let site = Site {
        name: stored.name.clone(),
        version: stored.version.clone(),
        context: decode("context", &stored.context)?,
        defaults: decode("defaults", &stored.defaults)?,
        pages: decode("pages", &stored.pages)?,
        page_order: decode("pageOrder", &stored.page_order)?,
        editor: stored.editor.as_deref().map(|e| decode("editor", e)).transpose()?,
        updated_at: stored.updated_at()?,
        content_updated_at: stored
            .content_updated_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?,
        preview_id: stored.preview_id.clone(),
    };
    let history = match &stored.history {
        Some(raw) => decode("history", raw)?,
        None => CommandHistory::default(),
    };

    Ok(SiteDocument { site, history })
}

/// Restore a stored site, or start a blank one when it is missing or
/// cannot be read. The error that forced the fallback is returned alongside.
pub fn restore_or_scratch(
    stored: Option<&StoredSite>,
    expected_version: &str,
    namespace: &str,
) -> (SiteDocument, Option<SerializeError>) {
    let Some(stored) = stored else {
        info!("No stored site, starting from scratch");
        return (SiteDocument::scratch("Untitled", namespace, expected_version), None);
    };
    match deserialize_document(stored, expected_version) {
        Ok(document) => (document, None),
        Err(error) => {
            warn!(%error, "Could not restore site, starting from scratch");
            let scratch = SiteDocument::scratch(&stored.name, namespace, expected_version);
            (scratch, Some(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_structured_fields_are_json_strings() {
        let document = SiteDocument::scratch("Demo", "demo", FORMAT_VERSION);
        let stored = serialize_document(&document).unwrap();

        assert_eq!(stored.page_order, r#"["/"]"#);
        assert!(stored.history.is_none());
        let json = serde_json::to_value(&stored).unwrap();
        assert!(json["context"].is_string());
        assert!(json.get("pageOrder").is_some());
    }

    #[test]
    fn test_timestamps_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(250);
        let text = format_timestamp(&at);
        assert_eq!(text, "2024-03-09T12:30:05.250Z");
        assert_eq!(parse_timestamp(&text).unwrap(), at);
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(SerializeError::Timestamp { .. })
        ));
    }

    #[test]
    fn test_version_mismatch_is_reported() {
        let document = SiteDocument::scratch("Demo", "demo", "0");
        let stored = serialize_document(&document).unwrap();
        match deserialize_document(&stored, FORMAT_VERSION) {
            Err(SerializeError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, FORMAT_VERSION);
                assert_eq!(found, "0");
            }
            other => panic!("expected version mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_malformed_field_names_the_field() {
        let document = SiteDocument::scratch("Demo", "demo", FORMAT_VERSION);
        let mut stored = serialize_document(&document).unwrap();
        stored.pages = "{".to_string();
        assert!(matches!(
            deserialize_document(&stored, FORMAT_VERSION),
            Err(SerializeError::Json { field: "pages", .. })
        ));
    }
}
