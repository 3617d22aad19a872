use thiserror::Error;

pub type ScriptResult<T> = Result<T, ScriptError>;
pub type BehaviorResult<T> = Result<T, BehaviorError>;

/// Failure while compiling or running a behavior script
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Unexpected character at {pos}")]
    Lex { pos: usize },

    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Cannot assign to '{0}'")]
    InvalidAssignment(String),

    #[error("'{0}' is already declared in this scope")]
    AlreadyDeclared(String),

    #[error("{function} expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Nesting deeper than {limit} levels at {pos}")]
    NestingTooDeep { pos: usize, limit: usize },

    #[error("Step limit of {0} exceeded")]
    StepLimitExceeded(usize),
}

impl ScriptError {
    pub fn unexpected_token(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BehaviorError {
    #[error("Behavior not found: {0}")]
    NotFound(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Behavior {behavior_id} failed: {source}")]
    Script {
        behavior_id: String,
        #[source]
        source: ScriptError,
    },

    #[error("Behavior {behavior_id} failed: {message}")]
    Native {
        behavior_id: String,
        message: String,
    },

    #[error("Could not build behavior context: {0}")]
    Context(String),
}

impl BehaviorError {
    pub fn script(behavior_id: impl Into<String>, source: ScriptError) -> Self {
        Self::Script {
            behavior_id: behavior_id.into(),
            source,
        }
    }

    pub fn native(behavior_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Native {
            behavior_id: behavior_id.into(),
            message: message.into(),
        }
    }
}
