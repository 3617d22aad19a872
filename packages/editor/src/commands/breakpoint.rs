//! Breakpoint commands

use super::{recorded, CommandError, CommandOp, CommandResult};
use serde::{Deserialize, Serialize};
use sitebuilder_model::{default_breakpoint, id, Breakpoint, PseudoStyle, Site};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointProps {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
}

impl BreakpointProps {
    pub fn new(name: impl Into<String>, min_width: Option<u32>, max_width: Option<u32>) -> Self {
        Self {
            name: name.into(),
            min_width,
            max_width,
        }
    }

    fn of(breakpoint: &Breakpoint) -> Self {
        Self {
            name: breakpoint.name.clone(),
            min_width: breakpoint.min_width,
            max_width: breakpoint.max_width,
        }
    }

    fn write_to(&self, breakpoint: &mut Breakpoint) {
        breakpoint.name = self.name.clone();
        breakpoint.min_width = self.min_width;
        breakpoint.max_width = self.max_width;
    }
}

fn breakpoint_mut<'a>(site: &'a mut Site, breakpoint_id: &str) -> CommandResult<&'a mut Breakpoint> {
    site.context
        .breakpoints
        .get_mut(breakpoint_id)
        .ok_or_else(|| CommandError::BreakpointNotFound(breakpoint_id.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBreakpoint {
    #[serde(flatten)]
    pub props: BreakpointProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakpoint_id: Option<String>,
}

impl AddBreakpoint {
    pub fn new(props: BreakpointProps) -> Self {
        Self {
            props,
            breakpoint_id: None,
        }
    }
}

impl CommandOp for AddBreakpoint {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let breakpoint_id = match &self.breakpoint_id {
            Some(existing) if site.context.breakpoints.contains_key(existing) => {
                return Err(sitebuilder_model::ModelError::DuplicateId(existing.clone()).into());
            }
            Some(existing) => existing.clone(),
            None => id::breakpoint_id(&mut site.context),
        };

        let mut breakpoint = Breakpoint {
            id: breakpoint_id.clone(),
            name: String::new(),
            min_width: None,
            max_width: None,
        };
        self.props.write_to(&mut breakpoint);
        site.context.breakpoints.insert(breakpoint_id.clone(), breakpoint);
        self.breakpoint_id = Some(breakpoint_id);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let breakpoint_id = recorded(&self.breakpoint_id, "AddBreakpoint", "breakpointId")?;
        site.context
            .breakpoints
            .remove(breakpoint_id)
            .ok_or_else(|| CommandError::BreakpointNotFound(breakpoint_id.clone()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBreakpoint {
    pub breakpoint_id: String,
    pub new: BreakpointProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<BreakpointProps>,
}

impl EditBreakpoint {
    pub fn new(breakpoint_id: impl Into<String>, new: BreakpointProps) -> Self {
        Self {
            breakpoint_id: breakpoint_id.into(),
            new,
            old: None,
        }
    }
}

impl CommandOp for EditBreakpoint {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let breakpoint = breakpoint_mut(site, &self.breakpoint_id)?;
        self.old = Some(BreakpointProps::of(breakpoint));
        self.new.write_to(breakpoint);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let old = recorded(&self.old, "EditBreakpoint", "old")?;
        old.write_to(breakpoint_mut(site, &self.breakpoint_id)?);
        Ok(())
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.breakpoint_id == next.breakpoint_id
    }

    fn merge(&mut self, next: Self) {
        self.new = next.new;
    }
}

/// Declarations an override held for the removed breakpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSlice {
    pub component_id: String,
    pub selector: String,
    pub style: PseudoStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedBreakpoint {
    pub breakpoint: Breakpoint,
    /// component id -> declarations at this breakpoint
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, PseudoStyle>,
    /// mixin id -> declarations at this breakpoint
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mixins: BTreeMap<String, PseudoStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideSlice>,
    /// Active breakpoint before the editor was moved off the removed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_breakpoint: Option<String>,
}

/// Delete a breakpoint and every declaration keyed by it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBreakpoint {
    pub breakpoint_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<RemovedBreakpoint>,
}

impl RemoveBreakpoint {
    pub fn new(breakpoint_id: impl Into<String>) -> Self {
        Self {
            breakpoint_id: breakpoint_id.into(),
            removed: None,
        }
    }
}

impl CommandOp for RemoveBreakpoint {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let id = self.breakpoint_id.as_str();
        let breakpoint = site
            .context
            .breakpoints
            .get(id)
            .ok_or_else(|| CommandError::BreakpointNotFound(id.to_string()))?;
        if breakpoint.is_default() {
            return Err(CommandError::CannotRemoveDefaultBreakpoint(id.to_string()));
        }
        let breakpoint = site
            .context
            .breakpoints
            .remove(id)
            .ok_or_else(|| CommandError::BreakpointNotFound(id.to_string()))?;

        let mut custom = BTreeMap::new();
        let mut overrides = Vec::new();
        for component in site.context.components.values_mut() {
            if let Some(style) = component.style.custom.remove(id) {
                custom.insert(component.id.clone(), style);
            }
            for (selector, raw) in component.style.overrides.iter_mut() {
                if let Some(style) = raw.remove(id) {
                    overrides.push(OverrideSlice {
                        component_id: component.id.clone(),
                        selector: selector.clone(),
                        style,
                    });
                }
            }
        }

        let mut mixins = BTreeMap::new();
        for mixin in site.context.styles.values_mut() {
            if let Some(style) = mixin.breakpoints.remove(id) {
                mixins.insert(mixin.id.clone(), style);
            }
        }

        let fallback = default_breakpoint(&site.context.breakpoints).map(|bp| bp.id.clone());
        let mut active_breakpoint = None;
        if let (Some(editor), Some(fallback)) = (site.editor.as_mut(), fallback) {
            if editor.active_breakpoint == id {
                active_breakpoint = Some(std::mem::replace(&mut editor.active_breakpoint, fallback));
            }
        }

        self.removed = Some(RemovedBreakpoint {
            breakpoint,
            custom,
            mixins,
            overrides,
            active_breakpoint,
        });
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let removed = recorded(&self.removed, "RemoveBreakpoint", "removed")?;
        let id = &self.breakpoint_id;
        site.context
            .breakpoints
            .insert(id.clone(), removed.breakpoint.clone());

        for (component_id, style) in &removed.custom {
            if let Some(component) = site.context.component_mut(component_id) {
                component.style.custom.insert(id.clone(), style.clone());
            }
        }
        for slice in &removed.overrides {
            if let Some(component) = site.context.component_mut(&slice.component_id) {
                if let Some(raw) = component.style.overrides.get_mut(&slice.selector) {
                    raw.insert(id.clone(), slice.style.clone());
                }
            }
        }
        for (mixin_id, style) in &removed.mixins {
            if let Some(mixin) = site.context.styles.get_mut(mixin_id) {
                mixin.breakpoints.insert(id.clone(), style.clone());
            }
        }
        if let (Some(previous), Some(editor)) = (&removed.active_breakpoint, site.editor.as_mut()) {
            editor.active_breakpoint = previous.clone();
        }
        Ok(())
    }
}
