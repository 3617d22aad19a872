//! # Site Store
//!
//! Persistence collaborator. The edit session talks to storage only through
//! [`SiteStore`]; the medium behind it is up to the implementation.
//!
//! - [`MemorySiteStore`]: keeps the stored record in memory (tests, previews)
//! - [`FileSiteStore`]: one pretty-printed JSON file per site

use crate::document::SiteDocument;
use crate::serializer::{
    deserialize_document, serialize_document, SerializeError, StoredSite,
};
use chrono::{DateTime, Utc};
use sitebuilder_model::EditorState;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error("Store has no site yet")]
    NotInitialized,
}

/// Outcome of a restore. `document` is `None` when nothing is stored or the
/// stored copy is the one the caller already has; `error` explains a failure.
#[derive(Debug, Default)]
pub struct StoreRestore {
    pub document: Option<SiteDocument>,
    pub error: Option<StoreError>,
}

impl StoreRestore {
    fn from_stored(stored: Option<&StoredSite>, update_key: Option<&str>, version: &str) -> Self {
        let Some(stored) = stored else {
            return Self::default();
        };
        if update_key.is_some() && stored.updated_at.as_deref() == update_key {
            debug!(?update_key, "Stored site unchanged");
            return Self::default();
        }
        match deserialize_document(stored, version) {
            Ok(document) => Self {
                document: Some(document),
                error: None,
            },
            Err(error) => Self {
                document: None,
                error: Some(error.into()),
            },
        }
    }
}

pub trait SiteStore {
    fn initialize(&mut self) -> StoreResult<()>;

    /// Write the whole document. `immediate` marks saves that bypassed the
    /// debounce (navigation away, explicit save).
    fn save(&mut self, document: &SiteDocument, immediate: bool) -> StoreResult<()>;

    /// Write only the editor UI state
    fn save_editor(&mut self, editor: &EditorState) -> StoreResult<()>;

    /// Load the stored document. Passing the `updated_at` of the copy already
    /// held skips decoding when the store has nothing newer.
    fn restore(&self, update_key: Option<&str>) -> StoreRestore;

    /// Timestamp of the last write to the store, by anyone
    fn last_write(&self) -> StoreResult<Option<DateTime<Utc>>>;
}

/// True when storage was written after the local copy was loaded or saved
pub fn is_stale(local: Option<DateTime<Utc>>, stored: Option<DateTime<Utc>>) -> bool {
    match (local, stored) {
        (Some(local), Some(stored)) => stored > local,
        (None, Some(_)) => true,
        (_, None) => false,
    }
}

fn with_editor(stored: &mut StoredSite, editor: &EditorState) -> StoreResult<()> {
    stored.editor = Some(serde_json::to_string(editor)?);
    Ok(())
}

#[derive(Debug)]
pub struct MemorySiteStore {
    stored: Option<StoredSite>,
    format_version: String,
    pub saves: usize,
    pub immediate_saves: usize,
    pub editor_saves: usize,
}

impl MemorySiteStore {
    pub fn new(format_version: impl Into<String>) -> Self {
        Self {
            stored: None,
            format_version: format_version.into(),
            saves: 0,
            immediate_saves: 0,
            editor_saves: 0,
        }
    }

    /// Start with a record already in storage
    pub fn with_stored(mut self, stored: StoredSite) -> Self {
        self.stored = Some(stored);
        self
    }

    pub fn stored(&self) -> Option<&StoredSite> {
        self.stored.as_ref()
    }

    /// Replace the stored record, as another session writing would
    pub fn overwrite(&mut self, stored: StoredSite) {
        self.stored = Some(stored);
    }
}

impl SiteStore for MemorySiteStore {
    fn initialize(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn save(&mut self, document: &SiteDocument, immediate: bool) -> StoreResult<()> {
        self.stored = Some(serialize_document(document)?);
        self.saves += 1;
        if immediate {
            self.immediate_saves += 1;
        }
        Ok(())
    }

    fn save_editor(&mut self, editor: &EditorState) -> StoreResult<()> {
        let stored = self.stored.as_mut().ok_or(StoreError::NotInitialized)?;
        with_editor(stored, editor)?;
        self.editor_saves += 1;
        Ok(())
    }

    fn restore(&self, update_key: Option<&str>) -> StoreRestore {
        StoreRestore::from_stored(self.stored.as_ref(), update_key, &self.format_version)
    }

    fn last_write(&self) -> StoreResult<Option<DateTime<Utc>>> {
        match &self.stored {
            Some(stored) => Ok(stored.updated_at()?),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileSiteStore {
    path: PathBuf,
    format_version: String,
}

impl FileSiteStore {
    pub fn new(path: impl Into<PathBuf>, format_version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format_version: format_version.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StoreResult<Option<StoredSite>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, stored: &StoredSite) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(stored)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SiteStore for FileSiteStore {
    fn initialize(&mut self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    #[instrument(skip(self, document), fields(path = %self.path.display()))]
    fn save(&mut self, document: &SiteDocument, immediate: bool) -> StoreResult<()> {
        self.write(&serialize_document(document)?)?;
        debug!(immediate, "Saved site");
        Ok(())
    }

    fn save_editor(&mut self, editor: &EditorState) -> StoreResult<()> {
        let mut stored = self.read()?.ok_or(StoreError::NotInitialized)?;
        with_editor(&mut stored, editor)?;
        self.write(&stored)
    }

    fn restore(&self, update_key: Option<&str>) -> StoreRestore {
        match self.read() {
            Ok(stored) => StoreRestore::from_stored(stored.as_ref(), update_key, &self.format_version),
            Err(error) => StoreRestore {
                document: None,
                error: Some(error),
            },
        }
    }

    fn last_write(&self) -> StoreResult<Option<DateTime<Utc>>> {
        match self.read()? {
            Some(stored) => Ok(stored.updated_at()?),
            None => Ok(None),
        }
    }
}
