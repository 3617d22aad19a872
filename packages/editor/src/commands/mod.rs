//! # Commands
//!
//! Every edit to a [`Site`] is a [`Command`]: plain data tagged by type,
//! serialized as `{ "type": ..., "data": ... }`.
//!
//! ## Contract
//!
//! - `apply` mutates the site and records whatever `undo` will need
//!   (assigned ids, removed subtrees, previous values) back into the command.
//! - `undo` reads only the recorded data and restores the site to its
//!   pre-apply state.
//! - Applying again after an undo reuses the recorded ids, so redo yields the
//!   same document as the first apply.
//! - Preconditions are checked before anything is mutated; a failing command
//!   leaves the site untouched.
//!
//! Continuous edits (dragging a slider, typing into a field) coalesce through
//! [`Command::can_merge`] / [`Command::merge`]: the merged command keeps the
//! earlier command's "old" half and takes the later command's "new" half.

mod behavior;
mod breakpoint;
mod component;
mod effects;
mod error;
mod group;
mod keyed;
mod site;
mod style;

pub use behavior::{AddBehavior, BehaviorProps, EditBehavior, RemoveBehavior};
pub use breakpoint::{
    AddBreakpoint, BreakpointProps, EditBreakpoint, OverrideSlice, RemoveBreakpoint,
    RemovedBreakpoint,
};
pub use component::{
    AddComponent, ComponentProps, EditComponent, MoveComponent, Position, RemoveComponent,
    SetComponentEditorEvent, SetComponentEvent, SetComponentInput, SetComponentState,
    SetCustomComponent,
};
pub use effects::{CustomDelta, OrphanedOverride, RemovedSubtree, SelectionChange};
pub use error::{CommandError, CommandResult};
pub use group::Group;
pub use keyed::KeyedValue;
pub use site::{
    AddPage, EditPage, PageProps, RemovePage, RemovedPage, SelectComponent, SetDefaultsHead,
    SetThemeFont, SetThemeVariable, SetTranslations, Translations,
};
pub use style::{
    AddMixinToComponent, AddOverrideStyle, AddStyleMixin, EditOverrideStyle, EditStyleMixin,
    MixinProps, MixinReference, RemoveMixinFromComponent, RemoveOverrideStyle, RemoveStyleMixin,
    RemovedMixin, SetCustomStyle, StyleKey,
};

use serde::{Deserialize, Serialize};
use sitebuilder_model::{Component, EditorState, ModelError, Site};

/// One undoable edit
pub trait CommandOp {
    /// Mutate the site, recording the pre-image needed by [`CommandOp::undo`]
    fn apply(&mut self, site: &mut Site) -> CommandResult<()>;

    /// Reverse a previous apply
    fn undo(&self, site: &mut Site) -> CommandResult<()>;

    /// True if `next` edits the same target and can be folded into `self`
    fn can_merge(&self, _next: &Self) -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Fold `next` into `self`. Only called after `can_merge` returned true.
    fn merge(&mut self, _next: Self)
    where
        Self: Sized,
    {
    }
}

macro_rules! command_set {
    ($($variant:ident),* $(,)?) => {
        /// Closed set of edits; see the module docs for the contract
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "data", rename_all = "camelCase")]
        pub enum Command {
            $($variant($variant),)*
        }

        impl Command {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Command::$variant(_) => stringify!($variant),)*
                }
            }

            pub fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
                match self {
                    $(Command::$variant(op) => op.apply(site),)*
                }
            }

            pub fn undo(&self, site: &mut Site) -> CommandResult<()> {
                match self {
                    $(Command::$variant(op) => op.undo(site),)*
                }
            }

            /// Mergeable-with-previous predicate
            pub fn can_merge(&self, next: &Command) -> bool {
                match (self, next) {
                    $((Command::$variant(a), Command::$variant(b)) => a.can_merge(b),)*
                    _ => false,
                }
            }

            pub fn merge(&mut self, next: Command) {
                match (self, next) {
                    $((Command::$variant(a), Command::$variant(b)) => a.merge(b),)*
                    _ => {}
                }
            }
        }

        $(
            impl From<$variant> for Command {
                fn from(op: $variant) -> Self {
                    Command::$variant(op)
                }
            }
        )*
    };
}

command_set! {
    AddComponent,
    RemoveComponent,
    MoveComponent,
    EditComponent,
    SetComponentInput,
    SetComponentEvent,
    SetComponentEditorEvent,
    SetComponentState,
    SetCustomComponent,
    SetCustomStyle,
    AddStyleMixin,
    RemoveStyleMixin,
    EditStyleMixin,
    AddMixinToComponent,
    RemoveMixinFromComponent,
    AddOverrideStyle,
    EditOverrideStyle,
    RemoveOverrideStyle,
    AddBreakpoint,
    EditBreakpoint,
    RemoveBreakpoint,
    AddBehavior,
    EditBehavior,
    RemoveBehavior,
    SetTranslations,
    SetThemeVariable,
    SetThemeFont,
    AddPage,
    RemovePage,
    EditPage,
    SetDefaultsHead,
    SelectComponent,
    Group,
}

impl Command {
    pub fn group(commands: Vec<Command>) -> Self {
        Command::Group(Group::new(commands))
    }
}

pub(crate) fn component<'a>(site: &'a Site, id: &str) -> CommandResult<&'a Component> {
    site.context
        .component(id)
        .ok_or_else(|| ModelError::ComponentNotFound(id.to_string()).into())
}

pub(crate) fn component_mut<'a>(site: &'a mut Site, id: &str) -> CommandResult<&'a mut Component> {
    site.context
        .component_mut(id)
        .ok_or_else(|| ModelError::ComponentNotFound(id.to_string()).into())
}

pub(crate) fn editor_mut(site: &mut Site) -> CommandResult<&mut EditorState> {
    site.editor.as_mut().ok_or(CommandError::NoEditorState)
}

/// Recorded data, or the error undo raises when apply never ran
pub(crate) fn recorded<'a, T>(
    value: &'a Option<T>,
    command: &'static str,
    field: &'static str,
) -> CommandResult<&'a T> {
    value.as_ref().ok_or(CommandError::missing(command, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_as_type_and_data() {
        let command = Command::from(SetTranslations::new(
            "vi",
            Some([("test".to_string(), "xin chào".to_string())].into_iter().collect()),
        ));
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["type"], json!("setTranslations"));
        assert_eq!(value["data"]["code"], json!("vi"));
        assert_eq!(value["data"]["newTranslations"]["test"], json!("xin chào"));

        let back: Command = serde_json::from_value(value).unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn test_merge_requires_same_variant() {
        let a = Command::from(SelectComponent::new(Some("s-c-1".to_string())));
        let b = Command::from(SetTranslations::new("en", None));
        assert!(!a.can_merge(&b));
        assert_eq!(a.name(), "SelectComponent");
    }
}
