//! Behavior lookup and compilation.
//!
//! Lookup follows the same two tiers as mixins and reusable components: ids in
//! the site's namespace come from the site's behavior registry, `builtin-b-*`
//! ids from [`BuiltinBehaviors`]; anything else is not found.

use crate::ast::Script;
use crate::builtins::{BehaviorArgs, BuiltinBehaviors, NativeBehavior};
use crate::error::{BehaviorError, BehaviorResult};
use crate::interpreter::{BehaviorContext, BehaviorHelpers, Interpreter, DEFAULT_STEP_LIMIT};
use crate::parser::parse_script;
use serde_json::Value;
use sitebuilder_model::{id_scope, Behavior, BehaviorArg, IdScope, SiteContext};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub enum ResolvedBehavior<'a> {
    Native(&'a NativeBehavior),
    Authored(&'a Behavior),
}

impl<'a> ResolvedBehavior<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            ResolvedBehavior::Native(b) => &b.id,
            ResolvedBehavior::Authored(b) => &b.id,
        }
    }

    pub fn args(&self) -> &'a [BehaviorArg] {
        match self {
            ResolvedBehavior::Native(b) => &b.args,
            ResolvedBehavior::Authored(b) => &b.args,
        }
    }
}

pub fn resolve_behavior<'a>(
    context: &'a SiteContext,
    builtins: &'a BuiltinBehaviors,
    behavior_id: &str,
) -> Option<ResolvedBehavior<'a>> {
    let found = match id_scope(&context.namespace, behavior_id) {
        IdScope::Local => context.behaviors.get(behavior_id).map(ResolvedBehavior::Authored),
        IdScope::Builtin => builtins.get(behavior_id).map(ResolvedBehavior::Native),
        IdScope::External => None,
    };
    if found.is_none() {
        warn!(behavior_id, "Behavior not found");
    }
    found
}

/// Compiled user-authored behavior
#[derive(Debug, Clone)]
pub struct CompiledBehavior {
    pub id: String,
    pub script: Script,
    pub step_limit: usize,
}

/// Something that can be invoked as `(helpers, {site, component, event}, args)`
#[derive(Debug, Clone)]
pub enum BehaviorFunction<'a> {
    Native(&'a NativeBehavior),
    Script(CompiledBehavior),
}

impl<'a> BehaviorFunction<'a> {
    pub fn call(
        &self,
        helpers: &mut dyn BehaviorHelpers,
        context: &BehaviorContext<'_>,
        args: &BehaviorArgs,
    ) -> BehaviorResult<()> {
        match self {
            BehaviorFunction::Native(native) => native.call(helpers, context, args),
            BehaviorFunction::Script(compiled) => {
                let args = Value::Object(args.clone().into_iter().collect());
                Interpreter::new(helpers, context, &args)
                    .with_step_limit(compiled.step_limit)
                    .run(&compiled.script)
                    .map_err(|e| BehaviorError::script(&compiled.id, e))
            }
        }
    }
}

/// Native behaviors pass through; authored source is parsed once here
pub fn resolve_behavior_function(behavior: ResolvedBehavior<'_>) -> BehaviorResult<BehaviorFunction<'_>> {
    match behavior {
        ResolvedBehavior::Native(native) => Ok(BehaviorFunction::Native(native)),
        ResolvedBehavior::Authored(authored) => {
            let script = parse_script(&authored.code)
                .map_err(|e| BehaviorError::script(&authored.id, e))?;
            debug!(behavior_id = %authored.id, statements = script.body.len(), "Compiled behavior");
            Ok(BehaviorFunction::Script(CompiledBehavior {
                id: authored.id.clone(),
                script,
                step_limit: DEFAULT_STEP_LIMIT,
            }))
        }
    }
}

/// Declared defaults overlaid with the arguments bound on the event
pub fn merge_args(declared: &[BehaviorArg], bound: &BehaviorArgs) -> BehaviorArgs {
    let mut args: BehaviorArgs = declared
        .iter()
        .map(|arg| (arg.name.clone(), arg.default_value.clone()))
        .collect();
    args.extend(bound.iter().map(|(k, v)| (k.clone(), v.clone())));
    args
}
