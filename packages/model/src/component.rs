//! Component nodes.
//!
//! Components live in a flat table on the site context; tree edges are ids.
//! `parent_id` is a lookup aid only and must agree with the parent's
//! `children` list.

use crate::style::ComponentStyle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    #[default]
    Div,
    Span,
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    A,
    Button,
    Img,
    Input,
    Textarea,
    Form,
    Label,
    Section,
    Header,
    Footer,
    Nav,
    Main,
    Article,
    Ul,
    Ol,
    Li,
    Svg,
    Video,
    Iframe,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::Span => "span",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::A => "a",
            Tag::Button => "button",
            Tag::Img => "img",
            Tag::Input => "input",
            Tag::Textarea => "textarea",
            Tag::Form => "form",
            Tag::Label => "label",
            Tag::Section => "section",
            Tag::Header => "header",
            Tag::Footer => "footer",
            Tag::Nav => "nav",
            Tag::Main => "main",
            Tag::Article => "article",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Svg => "svg",
            Tag::Video => "video",
            Tag::Iframe => "iframe",
        }
    }

    /// Void elements cannot hold children or text
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Img | Tag::Input)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    String,
    Number,
    Boolean,
    Color,
    Url,
}

/// Parameter exposed by a component (e.g. `src` on an image)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInput {
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ComponentInput {
    pub fn current(&self) -> &Value {
        self.value.as_ref().unwrap_or(&self.default_value)
    }
}

/// One behavior invocation bound to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBehavior {
    pub behavior_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, Value>,
}

/// Behaviors run, in order, when the named event fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentEvent {
    pub name: String,
    #[serde(default)]
    pub behaviors: Vec<EventBehavior>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    pub tag: Tag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub style: ComponentStyle,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, ComponentInput>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<String, ComponentEvent>,
    /// Events that only fire inside the editor canvas
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub editor_events: BTreeMap<String, ComponentEvent>,
    /// Reusable component this one was instantiated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Component {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tag: Tag) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tag,
            content: None,
            children: Vec::new(),
            parent_id: None,
            style: ComponentStyle::default(),
            inputs: BTreeMap::new(),
            events: BTreeMap::new(),
            editor_events: BTreeMap::new(),
            source_id: None,
        }
    }
}

/// Owned, nested copy of a component subtree.
///
/// Used both to create components (ids are `None` until first apply, then
/// recorded) and to keep the pre-image of a removed subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub tag: Tag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub style: ComponentStyle,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, ComponentInput>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<String, ComponentEvent>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub editor_events: BTreeMap<String, ComponentEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default)]
    pub children: Vec<ComponentTemplate>,
}

impl ComponentTemplate {
    pub fn new(name: impl Into<String>, tag: Tag) -> Self {
        Self {
            id: None,
            name: name.into(),
            tag,
            content: None,
            style: ComponentStyle::default(),
            inputs: BTreeMap::new(),
            events: BTreeMap::new(),
            editor_events: BTreeMap::new(),
            source_id: None,
            children: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_child(mut self, child: ComponentTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// Forget every recorded id so the template can be instantiated afresh
    pub fn clear_ids(&mut self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.id = None;
            stack.extend(node.children.iter_mut());
        }
    }

    /// Recorded ids in pre-order
    pub fn ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(id) = &node.id {
                out.push(id.clone());
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Build a detached component from this node, without children
    pub(crate) fn to_component(&self, id: String, parent_id: Option<String>) -> Component {
        Component {
            id,
            name: self.name.clone(),
            tag: self.tag,
            content: self.content.clone(),
            children: Vec::new(),
            parent_id,
            style: self.style.clone(),
            inputs: self.inputs.clone(),
            events: self.events.clone(),
            editor_events: self.editor_events.clone(),
            source_id: self.source_id.clone(),
        }
    }
}
