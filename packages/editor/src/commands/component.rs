//! Component commands: tree structure, props, inputs, events, custom marking.

use super::effects::{
    ancestor_overrides, detach_subtree, drop_overrides, ensure_ids_unused, restore_overrides,
    restore_subtree, sync_custom_children, CustomDelta, OrphanedOverride, RemovedSubtree,
    SelectionChange,
};
use super::keyed::KeyedValue;
use super::{component, component_mut, editor_mut, recorded, CommandError, CommandOp, CommandResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitebuilder_model::traverse::{ancestors, iter_subtree};
use sitebuilder_model::tree::{
    attach_child, child_at, detach_child, insert_template, remove_subtree, would_create_cycle,
};
use sitebuilder_model::{
    Component, ComponentEvent, ComponentInput, ComponentTemplate, ModelError, Site, Tag,
};
use std::collections::BTreeSet;

/// Insert a template subtree. Ids are assigned on first apply and written
/// back into `template`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddComponent {
    pub parent_id: String,
    /// Position among the parent's children; `None` appends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub template: ComponentTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "CustomDelta::is_empty")]
    pub custom: CustomDelta,
}

impl AddComponent {
    pub fn new(parent_id: impl Into<String>, template: ComponentTemplate) -> Self {
        Self {
            parent_id: parent_id.into(),
            index: None,
            template,
            component_id: None,
            custom: CustomDelta::default(),
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl CommandOp for AddComponent {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let parent = site
            .context
            .component(&self.parent_id)
            .ok_or_else(|| ModelError::ParentNotFound(self.parent_id.clone()))?;
        if let Some(index) = self.index {
            let len = parent.children.len();
            if index > len {
                return Err(ModelError::IndexOutOfBounds { index, len }.into());
            }
        }
        ensure_ids_unused(&site.context, &self.template)?;

        let id = insert_template(&mut site.context, &mut self.template, &self.parent_id, self.index)?;
        self.custom = sync_custom_children(&mut site.context, &id);
        self.component_id = Some(id);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let id = recorded(&self.component_id, "AddComponent", "componentId")?;
        detach_child(&mut site.context, id)?;
        remove_subtree(&mut site.context, id)?;
        self.custom.revert(&mut site.context);
        Ok(())
    }
}

/// Remove a component and everything below it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveComponent {
    pub component_id: String,
    /// Allow removing a parentless (root) component
    #[serde(default)]
    pub force: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<RemovedSubtree>,
}

impl RemoveComponent {
    pub fn new(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            force: false,
            removed: None,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

impl CommandOp for RemoveComponent {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        if component(site, &self.component_id)?.parent_id.is_none() && !self.force {
            return Err(CommandError::CannotRemoveRoot(self.component_id.clone()));
        }
        self.removed = Some(detach_subtree(site, &self.component_id)?);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let removed = recorded(&self.removed, "RemoveComponent", "removed")?;
        restore_subtree(site, removed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub parent_id: String,
    pub index: usize,
}

impl Position {
    pub fn new(parent_id: impl Into<String>, index: usize) -> Self {
        Self {
            parent_id: parent_id.into(),
            index,
        }
    }
}

/// Relocate the child at `from` to `to`.
///
/// `to.index` is interpreted after the child has been taken out of `from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveComponent {
    pub from: Position,
    pub to: Position,
    /// Selection to apply once moved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionChange>,
    #[serde(default, skip_serializing_if = "CustomDelta::is_empty")]
    pub custom: CustomDelta,
    /// Overrides held by former ancestors that no longer contain the node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphaned_overrides: Vec<OrphanedOverride>,
}

impl MoveComponent {
    pub fn new(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            selected_component_id: None,
            component_id: None,
            selection: None,
            custom: CustomDelta::default(),
            orphaned_overrides: Vec::new(),
        }
    }

    pub fn selecting(mut self, component_id: impl Into<String>) -> Self {
        self.selected_component_id = Some(component_id.into());
        self
    }
}

impl CommandOp for MoveComponent {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let id = child_at(&site.context, &self.from.parent_id, self.from.index)?;
        if would_create_cycle(&site.context, &id, &self.to.parent_id) {
            return Err(CommandError::CycleDetected {
                node: id,
                parent: self.to.parent_id.clone(),
            });
        }

        let target = site
            .context
            .component(&self.to.parent_id)
            .ok_or_else(|| ModelError::ParentNotFound(self.to.parent_id.clone()))?;
        let len = target.children.len() - usize::from(self.to.parent_id == self.from.parent_id);
        if self.to.index > len {
            return Err(ModelError::IndexOutOfBounds {
                index: self.to.index,
                len,
            }
            .into());
        }
        if self.selected_component_id.is_some() && site.editor.is_none() {
            return Err(CommandError::NoEditorState);
        }

        let moved: BTreeSet<String> = iter_subtree(&site.context, &id)
            .map(|c| c.id.clone())
            .collect();
        let mut kept: BTreeSet<&str> = ancestors(&site.context, &self.to.parent_id)
            .map(|a| a.id.as_str())
            .collect();
        kept.insert(self.to.parent_id.as_str());
        let orphaned = ancestor_overrides(&site.context, &id, &moved, |owner| kept.contains(owner));

        detach_child(&mut site.context, &id)?;
        attach_child(&mut site.context, &self.to.parent_id, &id, Some(self.to.index))?;
        drop_overrides(&mut site.context, &orphaned);
        self.orphaned_overrides = orphaned;
        self.custom = sync_custom_children(&mut site.context, &id);

        if let Some(selected) = &self.selected_component_id {
            let editor = editor_mut(site)?;
            self.selection = Some(SelectionChange {
                previous: editor.selected_component_id.replace(selected.clone()),
            });
        }
        self.component_id = Some(id);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let id = recorded(&self.component_id, "MoveComponent", "componentId")?;
        let found = child_at(&site.context, &self.to.parent_id, self.to.index)?;
        if &found != id {
            return Err(CommandError::PositionMismatch {
                expected: id.clone(),
                found,
            });
        }

        self.custom.revert(&mut site.context);
        detach_child(&mut site.context, id)?;
        attach_child(&mut site.context, &self.from.parent_id, id, Some(self.from.index))?;
        restore_overrides(&mut site.context, &self.orphaned_overrides);
        if let Some(selection) = &self.selection {
            selection.restore(site)?;
        }
        Ok(())
    }
}

/// Display properties of a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProps {
    pub name: String,
    pub tag: Tag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ComponentProps {
    pub fn of(component: &Component) -> Self {
        Self {
            name: component.name.clone(),
            tag: component.tag,
            content: component.content.clone(),
        }
    }

    fn write_to(&self, component: &mut Component) {
        component.name = self.name.clone();
        component.tag = self.tag;
        component.content = self.content.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditComponent {
    pub component_id: String,
    pub new: ComponentProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<ComponentProps>,
}

impl EditComponent {
    pub fn new(component_id: impl Into<String>, new: ComponentProps) -> Self {
        Self {
            component_id: component_id.into(),
            new,
            old: None,
        }
    }
}

impl CommandOp for EditComponent {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let component = component_mut(site, &self.component_id)?;
        self.old = Some(ComponentProps::of(component));
        self.new.write_to(component);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let old = recorded(&self.old, "EditComponent", "old")?;
        old.write_to(component_mut(site, &self.component_id)?);
        Ok(())
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.component_id == next.component_id
    }

    fn merge(&mut self, next: Self) {
        self.new = next.new;
    }
}

macro_rules! keyed_component_command {
    ($(#[$meta:meta])* $name:ident, $value:ty, $field:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub component_id: String,
            #[serde(flatten)]
            pub entry: KeyedValue<$value>,
        }

        impl $name {
            pub fn new(component_id: impl Into<String>, entry: KeyedValue<$value>) -> Self {
                Self {
                    component_id: component_id.into(),
                    entry,
                }
            }
        }

        impl CommandOp for $name {
            fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
                let component = component_mut(site, &self.component_id)?;
                self.entry.apply_to(&mut component.$field)
            }

            fn undo(&self, site: &mut Site) -> CommandResult<()> {
                let component = component_mut(site, &self.component_id)?;
                self.entry.undo_on(&mut component.$field)
            }

            fn can_merge(&self, next: &Self) -> bool {
                self.component_id == next.component_id && self.entry.can_merge(&next.entry)
            }

            fn merge(&mut self, next: Self) {
                self.entry.merge(next.entry);
            }
        }
    };
}

keyed_component_command!(
    /// Declare, edit, rename or drop a component input parameter
    SetComponentInput,
    ComponentInput,
    inputs
);
keyed_component_command!(
    /// Bind behaviors to a live-site event
    SetComponentEvent,
    ComponentEvent,
    events
);
keyed_component_command!(
    /// Bind behaviors to an editor-canvas event
    SetComponentEditorEvent,
    ComponentEvent,
    editor_events
);

/// Per-component editor state value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetComponentState {
    pub component_id: String,
    #[serde(flatten)]
    pub entry: KeyedValue<Value>,
}

impl SetComponentState {
    pub fn new(component_id: impl Into<String>, entry: KeyedValue<Value>) -> Self {
        Self {
            component_id: component_id.into(),
            entry,
        }
    }

    fn with_state<F>(&self, site: &mut Site, edit: F) -> CommandResult<()>
    where
        F: FnOnce(&mut std::collections::BTreeMap<String, Value>) -> CommandResult<()>,
    {
        component(site, &self.component_id)?;
        let editor = editor_mut(site)?;
        let state = editor
            .component_state
            .entry(self.component_id.clone())
            .or_default();
        let result = edit(state);
        if state.is_empty() {
            editor.component_state.remove(&self.component_id);
        }
        result
    }
}

impl CommandOp for SetComponentState {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let mut entry = self.entry.clone();
        self.with_state(site, |state| entry.apply_to(state))?;
        self.entry = entry;
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        self.with_state(site, |state| self.entry.undo_on(state))
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.component_id == next.component_id && self.entry.can_merge(&next.entry)
    }

    fn merge(&mut self, next: Self) {
        self.entry.merge(next.entry);
    }
}

/// Mark or unmark a component as a user-made reusable (custom) component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCustomComponent {
    pub component_id: String,
    pub custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<bool>,
    #[serde(default, skip_serializing_if = "CustomDelta::is_empty")]
    pub delta: CustomDelta,
}

impl SetCustomComponent {
    pub fn new(component_id: impl Into<String>, custom: bool) -> Self {
        Self {
            component_id: component_id.into(),
            custom,
            previous: None,
            delta: CustomDelta::default(),
        }
    }
}

fn set_membership(site: &mut Site, id: &str, custom: bool) {
    if custom {
        site.context.custom_components.insert(id.to_string());
    } else {
        site.context.custom_components.remove(id);
    }
}

impl CommandOp for SetCustomComponent {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        component(site, &self.component_id)?;
        self.previous = Some(site.context.custom_components.contains(&self.component_id));
        set_membership(site, &self.component_id, self.custom);
        self.delta = sync_custom_children(&mut site.context, &self.component_id);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let previous = *recorded(&self.previous, "SetCustomComponent", "previous")?;
        self.delta.revert(&mut site.context);
        set_membership(site, &self.component_id, previous);
        Ok(())
    }
}
