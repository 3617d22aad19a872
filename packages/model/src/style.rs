//! Style data shared by components, mixins and overrides.
//!
//! All three carry a [`RawStyle`]: breakpoint id -> pseudo-class -> property -> value.
//! Empty inner levels are pruned on removal so that two styles holding the same
//! declarations compare equal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Style state qualifier layered on top of the default declarations
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PseudoClass {
    #[default]
    Default,
    Hover,
    Focus,
    FocusVisible,
    FocusWithin,
    Active,
    Visited,
    Checked,
    Disabled,
}

impl PseudoClass {
    pub fn is_default(self) -> bool {
        self == PseudoClass::Default
    }

    /// Selector suffix for CSS emission (empty for the default state)
    pub fn selector_suffix(self) -> &'static str {
        match self {
            PseudoClass::Default => "",
            PseudoClass::Hover => ":hover",
            PseudoClass::Focus => ":focus",
            PseudoClass::FocusVisible => ":focus-visible",
            PseudoClass::FocusWithin => ":focus-within",
            PseudoClass::Active => ":active",
            PseudoClass::Visited => ":visited",
            PseudoClass::Checked => ":checked",
            PseudoClass::Disabled => ":disabled",
        }
    }
}

pub type StyleProperties = BTreeMap<String, String>;
pub type PseudoStyle = BTreeMap<PseudoClass, StyleProperties>;
pub type RawStyle = BTreeMap<String, PseudoStyle>;

/// One declaration addressed by breakpoint, pseudo-class and property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleEntry {
    pub breakpoint_id: String,
    #[serde(default)]
    pub pseudo_class: PseudoClass,
    pub property: String,
    pub value: String,
}

impl StyleEntry {
    pub fn new(
        breakpoint_id: impl Into<String>,
        pseudo_class: PseudoClass,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            breakpoint_id: breakpoint_id.into(),
            pseudo_class,
            property: property.into(),
            value: value.into(),
        }
    }

    /// Same slot (breakpoint, pseudo-class, property), value ignored
    pub fn same_key(&self, other: &StyleEntry) -> bool {
        self.breakpoint_id == other.breakpoint_id
            && self.pseudo_class == other.pseudo_class
            && self.property == other.property
    }
}

pub fn get_entry<'a>(
    raw: &'a RawStyle,
    breakpoint_id: &str,
    pseudo_class: PseudoClass,
    property: &str,
) -> Option<&'a String> {
    raw.get(breakpoint_id)?.get(&pseudo_class)?.get(property)
}

/// Insert or replace a declaration, returning the previous value
pub fn set_entry(raw: &mut RawStyle, entry: &StyleEntry) -> Option<String> {
    raw.entry(entry.breakpoint_id.clone())
        .or_default()
        .entry(entry.pseudo_class)
        .or_default()
        .insert(entry.property.clone(), entry.value.clone())
}

/// Remove a declaration, pruning levels left empty
pub fn remove_entry(
    raw: &mut RawStyle,
    breakpoint_id: &str,
    pseudo_class: PseudoClass,
    property: &str,
) -> Option<String> {
    let pseudo_style = raw.get_mut(breakpoint_id)?;
    let properties = pseudo_style.get_mut(&pseudo_class)?;
    let removed = properties.remove(property);

    if properties.is_empty() {
        pseudo_style.remove(&pseudo_class);
    }
    if pseudo_style.is_empty() {
        raw.remove(breakpoint_id);
    }

    removed
}

/// Style attached to a single component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStyle {
    /// Declarations owned by the component itself
    #[serde(default)]
    pub custom: RawStyle,

    /// Referenced mixin ids, lowest precedence first
    #[serde(default)]
    pub mixins: Vec<String>,

    /// Styles pushed onto descendants, keyed by descendant component id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, RawStyle>,
}

/// Named, reusable bag of declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleMixin {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub breakpoints: RawStyle,
}
