//! Native behaviors shipped with the builder.
//!
//! These live outside any site and are never serialized; sites refer to them
//! by `builtin-b-<n>` ids.

use crate::error::{BehaviorError, BehaviorResult};
use crate::interpreter::{BehaviorContext, BehaviorHelpers};
use crate::value::is_truthy;
use serde_json::Value;
use sitebuilder_model::id::{format_id, IdKind};
use sitebuilder_model::{BehaviorArg, BUILTIN_NAMESPACE};
use std::collections::BTreeMap;
use std::fmt;

pub type BehaviorArgs = BTreeMap<String, Value>;

pub type NativeFn =
    fn(&mut dyn BehaviorHelpers, &BehaviorContext<'_>, &BehaviorArgs) -> Result<(), String>;

#[derive(Clone)]
pub struct NativeBehavior {
    pub id: String,
    pub name: String,
    pub args: Vec<BehaviorArg>,
    pub function: NativeFn,
}

impl fmt::Debug for NativeBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBehavior")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl NativeBehavior {
    pub fn call(
        &self,
        helpers: &mut dyn BehaviorHelpers,
        context: &BehaviorContext<'_>,
        args: &BehaviorArgs,
    ) -> BehaviorResult<()> {
        (self.function)(helpers, context, args).map_err(|message| BehaviorError::native(&self.id, message))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuiltinBehaviors {
    behaviors: BTreeMap<String, NativeBehavior>,
}

impl BuiltinBehaviors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, behavior: NativeBehavior) {
        self.behaviors.insert(behavior.id.clone(), behavior);
    }

    pub fn get(&self, id: &str) -> Option<&NativeBehavior> {
        self.behaviors.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.behaviors.keys().map(String::as_str)
    }

    pub fn with_defaults() -> Self {
        let mut builtins = Self::new();
        let stock: [(&str, &[(&str, Value)], NativeFn); 4] = [
            ("No-op", &[], noop),
            ("Set State", &[("key", Value::Null), ("value", Value::Null)], set_state_from_args),
            ("Toggle State", &[("key", Value::Null)], toggle_state),
            ("Mark Input", &[("value", Value::Bool(true))], mark_input),
        ];
        for (n, (name, args, function)) in stock.into_iter().enumerate() {
            builtins.register(NativeBehavior {
                id: format_id(BUILTIN_NAMESPACE, IdKind::Behavior, &n.to_string()),
                name: name.to_string(),
                args: args
                    .iter()
                    .map(|(arg, default_value)| BehaviorArg {
                        name: arg.to_string(),
                        default_value: default_value.clone(),
                    })
                    .collect(),
                function,
            });
        }
        builtins
    }
}

fn key_arg(args: &BehaviorArgs) -> Result<&str, String> {
    args.get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing string argument 'key'".to_string())
}

fn noop(_: &mut dyn BehaviorHelpers, _: &BehaviorContext<'_>, _: &BehaviorArgs) -> Result<(), String> {
    Ok(())
}

fn set_state_from_args(
    helpers: &mut dyn BehaviorHelpers,
    _: &BehaviorContext<'_>,
    args: &BehaviorArgs,
) -> Result<(), String> {
    let key = key_arg(args)?;
    helpers.set_state(key, args.get("value").cloned().unwrap_or(Value::Null));
    Ok(())
}

fn toggle_state(
    helpers: &mut dyn BehaviorHelpers,
    _: &BehaviorContext<'_>,
    args: &BehaviorArgs,
) -> Result<(), String> {
    let key = key_arg(args)?;
    let current = helpers.get_state(key);
    helpers.set_state(key, Value::Bool(!is_truthy(&current)));
    Ok(())
}

fn mark_input(
    helpers: &mut dyn BehaviorHelpers,
    _: &BehaviorContext<'_>,
    args: &BehaviorArgs,
) -> Result<(), String> {
    helpers.set_is_input(args.get("value").map(is_truthy).unwrap_or(true));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ids() {
        let builtins = BuiltinBehaviors::with_defaults();
        let ids: Vec<&str> = builtins.ids().collect();
        assert_eq!(ids, vec!["builtin-b-0", "builtin-b-1", "builtin-b-2", "builtin-b-3"]);
        assert_eq!(builtins.get("builtin-b-2").unwrap().name, "Toggle State");
        assert_eq!(builtins.get("builtin-b-1").unwrap().args.len(), 2);
    }
}
