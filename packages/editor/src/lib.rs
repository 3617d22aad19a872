//! # Sitebuilder Editor
//!
//! Command engine and persistence for site documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Site, SiteContext, component tree    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: commands + history + persistence    │
//! │  - Apply / undo / redo typed commands       │
//! │  - Group and coalesce undo steps            │
//! │  - Serialize to the stored record format    │
//! │  - Debounced saves, staleness checks        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ style / behavior: resolved views            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sitebuilder_editor::{AddComponent, EditSession, EditorConfig, MemorySiteStore};
//!
//! let mut session = EditSession::open(MemorySiteStore::new("1"), EditorConfig::default())?;
//! let root = session.site().page("/").unwrap().root_id.clone();
//! session.push(AddComponent::new(root, ComponentTemplate::new("Box", Tag::Div)).into())?;
//! session.undo()?;
//! session.save_now()?;
//! ```

pub mod commands;
mod config;
mod document;
mod errors;
mod history;
mod scheduler;
mod serializer;
mod session;
mod store;

pub use commands::*;
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::SiteDocument;
pub use errors::{EditorError, EditorResult};
pub use history::{AppendOutcome, CommandHistory};
pub use scheduler::SaveScheduler;
pub use serializer::{
    deserialize_document, format_timestamp, parse_timestamp, restore_or_scratch,
    serialize_document, SerializeError, SerializeResult, StoredSite, FORMAT_VERSION,
};
pub use session::EditSession;
pub use store::{
    is_stale, FileSiteStore, MemorySiteStore, SiteStore, StoreError, StoreRestore, StoreResult,
};
