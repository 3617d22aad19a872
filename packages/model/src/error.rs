use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Component has no parent: {0}")]
    NoParent(String),

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Component {child} is not listed under its parent {parent}")]
    InconsistentParent { child: String, parent: String },

    #[error("Duplicate id: {0}")]
    DuplicateId(String),
}
