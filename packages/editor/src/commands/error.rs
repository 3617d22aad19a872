use sitebuilder_model::ModelError;
use thiserror::Error;

pub type CommandResult<T> = Result<T, CommandError>;

/// A command whose preconditions do not hold.
///
/// These are construction mistakes by the caller. The history never swallows
/// them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{command} has not been applied: missing recorded {field}")]
    MissingPreImage {
        command: &'static str,
        field: &'static str,
    },

    #[error("Cannot remove root component {0} without force")]
    CannotRemoveRoot(String),

    #[error("Moving {node} under {parent} would create a cycle")]
    CycleDetected { node: String, parent: String },

    #[error("Expected {expected} at the recorded position, found {found}")]
    PositionMismatch { expected: String, found: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Key already exists: {0}")]
    KeyExists(String),

    #[error("Style mixin not found: {0}")]
    MixinNotFound(String),

    #[error("Mixin {mixin} already applied to {component}")]
    MixinAlreadyApplied { component: String, mixin: String },

    #[error("Mixin {mixin} not applied to {component}")]
    MixinNotApplied { component: String, mixin: String },

    #[error("Override selector {selector} not found on {component}")]
    OverrideSelectorNotFound { component: String, selector: String },

    #[error("Override selector {selector} already exists on {component}")]
    OverrideExists { component: String, selector: String },

    #[error("Override selector {selector} is not a descendant of {component}")]
    InvalidOverrideTarget { component: String, selector: String },

    #[error("Breakpoint not found: {0}")]
    BreakpointNotFound(String),

    #[error("Cannot remove the default breakpoint {0}")]
    CannotRemoveDefaultBreakpoint(String),

    #[error("Behavior not found: {0}")]
    BehaviorNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Page already exists: {0}")]
    PageExists(String),

    #[error("Cannot remove the last page")]
    CannotRemoveLastPage,

    #[error("Site has no editor state")]
    NoEditorState,
}

impl CommandError {
    pub fn missing(command: &'static str, field: &'static str) -> Self {
        Self::MissingPreImage { command, field }
    }
}
