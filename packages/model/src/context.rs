use crate::breakpoint::Breakpoint;
use crate::component::Component;
use crate::style::StyleMixin;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSource {
    #[default]
    Native,
    Google,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeFont {
    pub name: String,
    #[serde(default)]
    pub source: FontSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// Values substituted for `${name}` placeholders in style values
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub fonts: BTreeMap<String, ThemeFont>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorArg {
    pub name: String,
    #[serde(default)]
    pub default_value: Value,
}

/// User-authored behavior. Builtin (native) behaviors are not stored in a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Behavior {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<BehaviorArg>,
}

/// Registries and counters shared by every page of one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContext {
    pub namespace: String,
    pub next_id: u64,
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
    #[serde(default)]
    pub styles: BTreeMap<String, StyleMixin>,
    /// Emission order of mixins
    #[serde(default)]
    pub style_order: Vec<String>,
    #[serde(default)]
    pub behaviors: BTreeMap<String, Behavior>,
    #[serde(default)]
    pub custom_components: BTreeSet<String>,
    /// Descendants of custom components (not themselves custom roots)
    #[serde(default)]
    pub custom_children: BTreeSet<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub breakpoints: BTreeMap<String, Breakpoint>,
    /// locale code -> translation key -> text
    #[serde(default)]
    pub i18n: BTreeMap<String, BTreeMap<String, String>>,
}

impl SiteContext {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next_id: 0,
            components: BTreeMap::new(),
            styles: BTreeMap::new(),
            style_order: Vec::new(),
            behaviors: BTreeMap::new(),
            custom_components: BTreeSet::new(),
            custom_children: BTreeSet::new(),
            theme: Theme::default(),
            breakpoints: BTreeMap::new(),
            i18n: BTreeMap::new(),
        }
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    /// Inside a custom component, either as its root or as a descendant
    pub fn is_in_custom_component(&self, id: &str) -> bool {
        self.custom_components.contains(id) || self.custom_children.contains(id)
    }
}
