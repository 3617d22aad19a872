//! Error types for the editor

use crate::commands::CommandError;
use crate::serializer::SerializeError;
use crate::store::StoreError;
use sitebuilder_behavior::BehaviorError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] SerializeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Behavior error: {0}")]
    Behavior(#[from] BehaviorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored site was changed by another session; reload before saving")]
    Stale,

    #[error("Document has no editor state")]
    NoEditorState,

    #[error("Unknown {kind}: {id}")]
    NotFound { kind: &'static str, id: String },
}
