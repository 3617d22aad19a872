//! Event dispatch.
//!
//! Behaviors bound to one event run in list order, each to completion before
//! the next starts. A behavior that cannot be found or fails is logged and
//! recorded in the report; the remaining behaviors still run.

use crate::builtins::BuiltinBehaviors;
use crate::error::{BehaviorError, BehaviorResult};
use crate::interpreter::{BehaviorContext, BehaviorHelpers};
use crate::resolver::{merge_args, resolve_behavior, resolve_behavior_function};
use serde_json::Value;
use sitebuilder_model::{ComponentEvent, Site};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// Runtime component state that behaviors read and write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeState {
    pub component_state: BTreeMap<String, BTreeMap<String, Value>>,
    /// Components a behavior has flagged as accepting user input
    pub input_components: BTreeSet<String>,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the editor's persisted per-component state
    pub fn from_site(site: &Site) -> Self {
        Self {
            component_state: site
                .editor
                .as_ref()
                .map(|e| e.component_state.clone())
                .unwrap_or_default(),
            input_components: BTreeSet::new(),
        }
    }

    pub fn get(&self, component_id: &str, key: &str) -> Option<&Value> {
        self.component_state.get(component_id)?.get(key)
    }

    pub fn is_input(&self, component_id: &str) -> bool {
        self.input_components.contains(component_id)
    }
}

/// Helpers bound to one component
struct ComponentHelpers<'s> {
    state: &'s mut RuntimeState,
    component_id: &'s str,
}

impl BehaviorHelpers for ComponentHelpers<'_> {
    fn get_state(&self, key: &str) -> Value {
        self.state
            .get(self.component_id, key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn set_state(&mut self, key: &str, value: Value) {
        self.state
            .component_state
            .entry(self.component_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn set_is_input(&mut self, is_input: bool) {
        if is_input {
            self.state.input_components.insert(self.component_id.to_string());
        } else {
            self.state.input_components.remove(self.component_id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// Live site events
    Runtime,
    /// Events wired only inside the editor canvas
    Editor,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub ran: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<BehaviorError>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

#[instrument(skip(site, builtins, state, event), fields(site = %site.name))]
pub fn dispatch_event(
    site: &Site,
    builtins: &BuiltinBehaviors,
    state: &mut RuntimeState,
    phase: EventPhase,
    component_id: &str,
    event_name: &str,
    event: &Value,
) -> BehaviorResult<DispatchReport> {
    let component = site
        .context
        .component(component_id)
        .ok_or_else(|| BehaviorError::ComponentNotFound(component_id.to_string()))?;

    let events = match phase {
        EventPhase::Runtime => &component.events,
        EventPhase::Editor => &component.editor_events,
    };
    let mut report = DispatchReport::default();
    let Some(ComponentEvent { behaviors, .. }) = events.get(event_name) else {
        debug!(component_id, event_name, "No behaviors bound");
        return Ok(report);
    };

    let context = BehaviorContext {
        site,
        component,
        event,
    };

    for binding in behaviors {
        let Some(resolved) = resolve_behavior(&site.context, builtins, &binding.behavior_id) else {
            report.skipped.push(binding.behavior_id.clone());
            continue;
        };

        let args = merge_args(resolved.args(), &binding.args);
        let mut helpers = ComponentHelpers {
            state: &mut *state,
            component_id,
        };
        let result = resolve_behavior_function(resolved)
            .and_then(|function| function.call(&mut helpers, &context, &args));

        match result {
            Ok(()) => report.ran.push(binding.behavior_id.clone()),
            Err(error) => {
                warn!(behavior_id = %binding.behavior_id, %error, "Behavior failed");
                report.failed.push(error);
            }
        }
    }

    debug!(
        ran = report.ran.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Dispatched event"
    );
    Ok(report)
}
