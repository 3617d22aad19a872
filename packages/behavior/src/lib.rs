//! # Sitebuilder Behavior
//!
//! Resolves behavior ids to something callable and runs the behaviors bound
//! to component events.
//!
//! Native behaviors are plain Rust functions registered in
//! [`BuiltinBehaviors`]. User-authored behaviors are small scripts, lexed with
//! logos and parsed into an [`ast::Script`], then run by the sandboxed
//! [`Interpreter`] with nothing in scope beyond the helper capabilities and
//! read-only views of the site, component and event.

pub mod ast;
pub mod builtins;
pub mod dispatch;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod value;

pub use builtins::{BehaviorArgs, BuiltinBehaviors, NativeBehavior, NativeFn};
pub use dispatch::{dispatch_event, DispatchReport, EventPhase, RuntimeState};
pub use error::{BehaviorError, BehaviorResult, ScriptError, ScriptResult};
pub use interpreter::{BehaviorContext, BehaviorHelpers, Interpreter, DEFAULT_STEP_LIMIT};
pub use parser::{parse_script, Parser, MAX_NESTING};
pub use resolver::{
    merge_args, resolve_behavior, resolve_behavior_function, BehaviorFunction, CompiledBehavior,
    ResolvedBehavior,
};
