//! # Site
//!
//! The document edited in one session: a [`SiteContext`] shared by every
//! page, an ordered set of pages each owning one component subtree, site-wide
//! defaults and the (optional) editor UI state.

use crate::breakpoint::Breakpoint;
use crate::component::{Component, Tag};
use crate::context::SiteContext;
use crate::id::{self, BUILTIN_NAMESPACE, IdKind};
use crate::style::PseudoClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Id of the catch-all breakpoint every new site starts with
pub fn default_breakpoint_id() -> String {
    id::format_id(BUILTIN_NAMESPACE, IdKind::Breakpoint, "0")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadTagKind {
    Base,
    Meta,
    Link,
    Script,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadTag {
    pub kind: HeadTagKind,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<HeadTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub name: String,
    pub route: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub head: PageHead,
    pub root_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDefaults {
    #[serde(default)]
    pub head: PageHead,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

/// Editor UI state persisted alongside the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub active_page: String,
    pub active_breakpoint: String,
    #[serde(default)]
    pub active_pseudo_class: PseudoClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_component_id: Option<String>,
    /// Per-component editor state (expanded tree nodes, preview values, ...)
    #[serde(default)]
    pub component_state: BTreeMap<String, BTreeMap<String, Value>>,
}

impl EditorState {
    pub fn new(active_page: impl Into<String>, active_breakpoint: impl Into<String>) -> Self {
        Self {
            active_page: active_page.into(),
            active_breakpoint: active_breakpoint.into(),
            active_pseudo_class: PseudoClass::Default,
            selected_component_id: None,
            component_state: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub name: String,
    pub version: String,
    pub context: SiteContext,
    #[serde(default)]
    pub defaults: SiteDefaults,
    #[serde(default)]
    pub pages: BTreeMap<String, Page>,
    /// Routes, in navigation order
    #[serde(default)]
    pub page_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_id: Option<String>,
}

impl Site {
    /// Blank scratch site: one catch-all breakpoint and a home page at `/`
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let mut context = SiteContext::new(namespace);

        let default_bp = Breakpoint {
            id: default_breakpoint_id(),
            name: "Desktop".to_string(),
            min_width: None,
            max_width: None,
        };
        context.breakpoints.insert(default_bp.id.clone(), default_bp);

        let root_id = id::component_id(&mut context);
        context
            .components
            .insert(root_id.clone(), Component::new(root_id.clone(), "Root", Tag::Div));

        let home = Page {
            name: "Home".to_string(),
            route: "/".to_string(),
            public: true,
            head: PageHead::default(),
            root_id,
        };

        let mut pages = BTreeMap::new();
        pages.insert(home.route.clone(), home);

        Self {
            name: name.into(),
            version: version.into(),
            context,
            defaults: SiteDefaults::default(),
            pages,
            page_order: vec!["/".to_string()],
            editor: Some(EditorState::new("/", default_breakpoint_id())),
            updated_at: None,
            content_updated_at: None,
            preview_id: None,
        }
    }

    pub fn page(&self, route: &str) -> Option<&Page> {
        self.pages.get(route)
    }

    /// Equality that ignores the id counter.
    ///
    /// Undoing a creation never gives ids back, so an undone site matches its
    /// earlier self in everything but `next_id`.
    pub fn same_content(&self, other: &Site) -> bool {
        if self.context.next_id == other.context.next_id {
            return self == other;
        }
        let mut normalized = other.clone();
        normalized.context.next_id = self.context.next_id;
        *self == normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_site_has_home_page() {
        let site = Site::new("Demo", "demo", "1");

        assert_eq!(site.page_order, vec!["/"]);
        let home = site.page("/").unwrap();
        assert_eq!(home.root_id, "demo-c-0");
        assert!(site.context.components.contains_key("demo-c-0"));
        assert_eq!(site.context.next_id, 1);
        assert!(site.context.breakpoints[&default_breakpoint_id()].is_default());
    }

    #[test]
    fn test_same_content_ignores_counter() {
        let a = Site::new("Demo", "demo", "1");
        let mut b = a.clone();
        b.context.next_id += 10;
        assert!(a.same_content(&b));

        b.name = "Other".to_string();
        assert!(!a.same_content(&b));
    }
}
