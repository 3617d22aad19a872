//! # Behavior Script Interpreter
//!
//! Runs a parsed [`Script`] inside a closed scope. The only names a script can
//! see are:
//!
//! - `site`, `component`, `event`: read-only JSON views of the behavior context
//! - `args`: the merged behavior arguments
//! - `getState(key)`, `setState(key, value)`, `setIsInput(flag)`: the helper
//!   capabilities, routed through [`BehaviorHelpers`]
//! - local `let` bindings
//!
//! Every executed statement and helper call counts against a step limit, so a
//! script cannot run unbounded.

use crate::ast::*;
use crate::error::{ScriptError, ScriptResult};
use crate::value::{display_value, is_truthy, number_value, type_name, values_equal};
use serde_json::Value;
use sitebuilder_model::{Component, Site};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_STEP_LIMIT: usize = 10_000;

const RESERVED: [&str; 4] = ["site", "component", "event", "args"];

/// Capabilities a behavior may use to touch runtime state
pub trait BehaviorHelpers {
    fn get_state(&self, key: &str) -> Value;
    fn set_state(&mut self, key: &str, value: Value);
    fn set_is_input(&mut self, is_input: bool);
}

/// What a behavior is invoked on
pub struct BehaviorContext<'a> {
    pub site: &'a Site,
    pub component: &'a Component,
    pub event: &'a Value,
}

enum Flow {
    Continue,
    Return,
}

pub struct Interpreter<'a, 'ctx> {
    helpers: &'a mut dyn BehaviorHelpers,
    context: &'a BehaviorContext<'ctx>,
    args: &'a Value,
    scopes: Vec<BTreeMap<String, Value>>,
    steps: usize,
    step_limit: usize,
    site_view: Option<Value>,
    component_view: Option<Value>,
}

impl<'a, 'ctx> Interpreter<'a, 'ctx> {
    pub fn new(
        helpers: &'a mut dyn BehaviorHelpers,
        context: &'a BehaviorContext<'ctx>,
        args: &'a Value,
    ) -> Self {
        Self {
            helpers,
            context,
            args,
            scopes: vec![BTreeMap::new()],
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            site_view: None,
            component_view: None,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn run(&mut self, script: &Script) -> ScriptResult<()> {
        self.exec_statements(&script.body)?;
        debug!(steps = self.steps, "Behavior script finished");
        Ok(())
    }

    fn step(&mut self) -> ScriptResult<()> {
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(ScriptError::StepLimitExceeded(self.step_limit));
        }
        Ok(())
    }

    fn exec_statements(&mut self, statements: &[Stmt]) -> ScriptResult<Flow> {
        for statement in statements {
            if let Flow::Return = self.exec_statement(statement)? {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Continue)
    }

    fn exec_block(&mut self, statements: &[Stmt]) -> ScriptResult<Flow> {
        self.scopes.push(BTreeMap::new());
        let result = self.exec_statements(statements);
        self.scopes.pop();
        result
    }

    fn exec_statement(&mut self, statement: &Stmt) -> ScriptResult<Flow> {
        self.step()?;
        match statement {
            Stmt::Let { name, value } => {
                if RESERVED.contains(&name.as_str()) {
                    return Err(ScriptError::InvalidAssignment(name.clone()));
                }
                let value = self.evaluate(value)?;
                let scope = self
                    .scopes
                    .last_mut()
                    .ok_or_else(|| ScriptError::InvalidAssignment(name.clone()))?;
                if scope.contains_key(name) {
                    return Err(ScriptError::AlreadyDeclared(name.clone()));
                }
                scope.insert(name.clone(), value);
            }
            Stmt::Assign { name, value } => {
                let value = self.evaluate(value)?;
                let slot = self
                    .scopes
                    .iter_mut()
                    .rev()
                    .find_map(|scope| scope.get_mut(name))
                    .ok_or_else(|| ScriptError::InvalidAssignment(name.clone()))?;
                *slot = value;
            }
            Stmt::Expr(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.evaluate(condition)?;
                let branch = if is_truthy(&condition) {
                    then_branch
                } else {
                    else_branch
                };
                return self.exec_block(branch);
            }
            Stmt::Return => return Ok(Flow::Return),
        }
        Ok(Flow::Continue)
    }

    fn evaluate(&mut self, expr: &Expr) -> ScriptResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Ident(name) => self.lookup(name),

            Expr::Member { object, property } => {
                let object = self.evaluate(object)?;
                member(&object, property)
            }

            Expr::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                match (&object, &index) {
                    (Value::Null, _) => Err(ScriptError::type_error(format!(
                        "Cannot index null with {}",
                        display_value(&index)
                    ))),
                    (Value::Array(items), Value::Number(n)) => Ok(n
                        .as_u64()
                        .and_then(|i| items.get(i as usize))
                        .cloned()
                        .unwrap_or(Value::Null)),
                    (_, Value::String(key)) => member(&object, key),
                    _ => Ok(Value::Null),
                }
            }

            Expr::Call {
                function,
                arguments,
            } => {
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }
                self.call(function, values)
            }

            Expr::Unary { operator, operand } => {
                let value = self.evaluate(operand)?;
                match operator {
                    UnaryOp::Not => Ok(Value::Bool(!is_truthy(&value))),
                    UnaryOp::Negate => match value.as_f64() {
                        Some(n) => Ok(number_value(-n)),
                        None => Err(ScriptError::type_error(format!(
                            "Cannot negate {}",
                            type_name(&value)
                        ))),
                    },
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                match operator {
                    BinaryOp::And if !is_truthy(&left) => return Ok(left),
                    BinaryOp::Or if is_truthy(&left) => return Ok(left),
                    BinaryOp::And | BinaryOp::Or => return self.evaluate(right),
                    _ => {}
                }
                let right = self.evaluate(right)?;
                binary_op(*operator, &left, &right)
            }
        }
    }

    fn lookup(&mut self, name: &str) -> ScriptResult<Value> {
        if let Some(value) = self.scopes.iter().rev().find_map(|scope| scope.get(name)) {
            return Ok(value.clone());
        }
        match name {
            "site" => {
                if self.site_view.is_none() {
                    self.site_view = Some(to_view(self.context.site)?);
                }
                Ok(self.site_view.clone().unwrap_or(Value::Null))
            }
            "component" => {
                if self.component_view.is_none() {
                    self.component_view = Some(to_view(self.context.component)?);
                }
                Ok(self.component_view.clone().unwrap_or(Value::Null))
            }
            "event" => Ok(self.context.event.clone()),
            "args" => Ok(self.args.clone()),
            _ => Err(ScriptError::UnknownIdentifier(name.to_string())),
        }
    }

    fn call(&mut self, function: &str, arguments: Vec<Value>) -> ScriptResult<Value> {
        self.step()?;
        match function {
            "getState" => {
                let [key] = expect_args::<1>(function, arguments)?;
                let key = state_key(function, &key)?;
                Ok(self.helpers.get_state(key))
            }
            "setState" => {
                let [key, value] = expect_args::<2>(function, arguments)?;
                let key = state_key(function, &key)?;
                self.helpers.set_state(key, value);
                Ok(Value::Null)
            }
            "setIsInput" => {
                let [flag] = expect_args::<1>(function, arguments)?;
                self.helpers.set_is_input(is_truthy(&flag));
                Ok(Value::Null)
            }
            _ => Err(ScriptError::UnknownFunction(function.to_string())),
        }
    }
}

fn to_view<T: serde::Serialize>(value: &T) -> ScriptResult<Value> {
    serde_json::to_value(value).map_err(|e| ScriptError::type_error(e.to_string()))
}

fn expect_args<const N: usize>(function: &str, arguments: Vec<Value>) -> ScriptResult<[Value; N]> {
    let found = arguments.len();
    arguments.try_into().map_err(|_| ScriptError::Arity {
        function: function.to_string(),
        expected: N,
        found,
    })
}

fn state_key<'v>(function: &str, key: &'v Value) -> ScriptResult<&'v str> {
    key.as_str().ok_or_else(|| {
        ScriptError::type_error(format!(
            "{} expects a string key, got {}",
            function,
            type_name(key)
        ))
    })
}

fn member(object: &Value, property: &str) -> ScriptResult<Value> {
    match object {
        Value::Null => Err(ScriptError::type_error(format!(
            "Cannot read property '{}' of null",
            property
        ))),
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Null)),
        Value::Array(items) if property == "length" => Ok(Value::from(items.len())),
        Value::String(s) if property == "length" => Ok(Value::from(s.chars().count())),
        _ => Ok(Value::Null),
    }
}

fn binary_op(operator: BinaryOp, left: &Value, right: &Value) -> ScriptResult<Value> {
    let invalid = || {
        ScriptError::type_error(format!(
            "Invalid operands for {}: {} and {}",
            operator.symbol(),
            type_name(left),
            type_name(right)
        ))
    };

    match operator {
        BinaryOp::Equals => Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::NotEquals => Ok(Value::Bool(!values_equal(left, right))),

        BinaryOp::Add => match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
                "{}{}",
                display_value(left),
                display_value(right)
            ))),
            _ => {
                let (a, b) = numbers(left, right).ok_or_else(invalid)?;
                Ok(number_value(a + b))
            }
        },

        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => {
            let (a, b) = numbers(left, right).ok_or_else(invalid)?;
            match operator {
                BinaryOp::Subtract => Ok(number_value(a - b)),
                BinaryOp::Multiply => Ok(number_value(a * b)),
                BinaryOp::Divide | BinaryOp::Modulo if b == 0.0 => Err(ScriptError::DivisionByZero),
                BinaryOp::Divide => Ok(number_value(a / b)),
                _ => Ok(number_value(a % b)),
            }
        }

        BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => a.partial_cmp(b),
                _ => {
                    let (a, b) = numbers(left, right).ok_or_else(invalid)?;
                    a.partial_cmp(&b)
                }
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match operator {
                BinaryOp::LessThan => ordering.is_lt(),
                BinaryOp::LessThanOrEqual => ordering.is_le(),
                BinaryOp::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }

        // Short-circuited in the caller
        BinaryOp::And | BinaryOp::Or => Err(invalid()),
    }
}

fn numbers(left: &Value, right: &Value) -> Option<(f64, f64)> {
    Some((left.as_f64()?, right.as_f64()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_script;
    use serde_json::json;
    use sitebuilder_model::Tag;

    #[derive(Default)]
    struct RecordingHelpers {
        state: BTreeMap<String, Value>,
        is_input: Option<bool>,
    }

    impl BehaviorHelpers for RecordingHelpers {
        fn get_state(&self, key: &str) -> Value {
            self.state.get(key).cloned().unwrap_or(Value::Null)
        }

        fn set_state(&mut self, key: &str, value: Value) {
            self.state.insert(key.to_string(), value);
        }

        fn set_is_input(&mut self, is_input: bool) {
            self.is_input = Some(is_input);
        }
    }

    fn run(source: &str, args: Value, event: Value) -> (RecordingHelpers, ScriptResult<()>) {
        let site = Site::new("Demo", "demo", "1");
        let component = Component::new("demo-c-7", "Toggle", Tag::Button);
        let context = BehaviorContext {
            site: &site,
            component: &component,
            event: &event,
        };
        let mut helpers = RecordingHelpers::default();
        let script = parse_script(source).unwrap();
        let result = Interpreter::new(&mut helpers, &context, &args).run(&script);
        (helpers, result)
    }

    #[test]
    fn test_toggle_state() {
        let (helpers, result) = run(
            r#"
            let open = getState("open");
            setState("open", !open);
            setState("label", "Menu " + component.id);
            "#,
            json!({}),
            json!(null),
        );
        result.unwrap();
        assert_eq!(helpers.state["open"], json!(true));
        assert_eq!(helpers.state["label"], json!("Menu demo-c-7"));
    }

    #[test]
    fn test_args_event_and_arithmetic() {
        let (helpers, result) = run(
            r#"
            let total = args.base * 2 + event.detail.amount;
            if total >= 10 {
                setState("total", total);
                setIsInput(true);
            } else {
                setState("total", 0);
            }
            setState("site", site.name);
            "#,
            json!({ "base": 3 }),
            json!({ "detail": { "amount": 4 } }),
        );
        result.unwrap();
        assert_eq!(helpers.state["total"], json!(10));
        assert_eq!(helpers.state["site"], json!("Demo"));
        assert_eq!(helpers.is_input, Some(true));
    }

    #[test]
    fn test_return_stops_execution() {
        let (helpers, result) = run(
            r#"
            setState("a", 1);
            if true { return; }
            setState("b", 2);
            "#,
            json!({}),
            json!(null),
        );
        result.unwrap();
        assert!(helpers.state.contains_key("a"));
        assert!(!helpers.state.contains_key("b"));
    }

    #[test]
    fn test_block_scoping() {
        let (_, result) = run("if true { let x = 1; } setState(\"x\", x);", json!({}), json!(null));
        assert_eq!(result, Err(ScriptError::UnknownIdentifier("x".to_string())));

        let (helpers, result) = run(
            "let x = 1; if true { x = x + 1; } setState(\"x\", x);",
            json!({}),
            json!(null),
        );
        result.unwrap();
        assert_eq!(helpers.state["x"], json!(2));
    }

    #[test]
    fn test_sandbox_rejects_ambient_names() {
        let (_, result) = run("fetch(\"http://example.com\");", json!({}), json!(null));
        assert_eq!(result, Err(ScriptError::UnknownFunction("fetch".to_string())));

        let (_, result) = run("let w = window;", json!({}), json!(null));
        assert_eq!(result, Err(ScriptError::UnknownIdentifier("window".to_string())));

        let (_, result) = run("site = 1;", json!({}), json!(null));
        assert_eq!(result, Err(ScriptError::InvalidAssignment("site".to_string())));

        let (_, result) = run("let args = 1;", json!({}), json!(null));
        assert_eq!(result, Err(ScriptError::InvalidAssignment("args".to_string())));
    }

    #[test]
    fn test_runtime_type_errors() {
        let (_, result) = run("let x = event.target;", json!({}), json!(null));
        assert!(matches!(result, Err(ScriptError::TypeError(_))));

        let (_, result) = run("let x = 1 / 0;", json!({}), json!(null));
        assert_eq!(result, Err(ScriptError::DivisionByZero));

        let (_, result) = run("getState(1);", json!({}), json!(null));
        assert!(matches!(result, Err(ScriptError::TypeError(_))));

        let (_, result) = run("setState(\"a\");", json!({}), json!(null));
        assert!(matches!(result, Err(ScriptError::Arity { expected: 2, found: 1, .. })));
    }

    #[test]
    fn test_step_limit() {
        let site = Site::new("Demo", "demo", "1");
        let component = Component::new("demo-c-1", "Box", Tag::Div);
        let event = Value::Null;
        let context = BehaviorContext {
            site: &site,
            component: &component,
            event: &event,
        };
        let args = json!({});
        let mut helpers = RecordingHelpers::default();
        let script = parse_script("setState(\"a\", 1); setState(\"b\", 2); setState(\"c\", 3);").unwrap();

        let result = Interpreter::new(&mut helpers, &context, &args)
            .with_step_limit(4)
            .run(&script);
        assert_eq!(result, Err(ScriptError::StepLimitExceeded(4)));
    }
}
