//! Site-level commands: translations, theme, pages, head defaults, selection.

use super::effects::{detach_subtree, ensure_ids_unused, restore_subtree, RemovedSubtree, SelectionChange};
use super::keyed::KeyedValue;
use super::{component, editor_mut, recorded, CommandError, CommandOp, CommandResult};
use serde::{Deserialize, Serialize};
use sitebuilder_model::tree::{insert_root_template, remove_subtree};
use sitebuilder_model::{ComponentTemplate, ModelError, Page, PageHead, Site, Tag, ThemeFont};
use std::collections::BTreeMap;

pub type Translations = BTreeMap<String, String>;

/// Replace (or drop, when `new_translations` is `None`) one locale's table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTranslations {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_translations: Option<Translations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_translations: Option<Translations>,
}

impl SetTranslations {
    pub fn new(code: impl Into<String>, new_translations: Option<Translations>) -> Self {
        Self {
            code: code.into(),
            new_translations,
            old_translations: None,
        }
    }
}

fn write_locale(site: &mut Site, code: &str, table: Option<&Translations>) -> Option<Translations> {
    match table {
        Some(table) => site.context.i18n.insert(code.to_string(), table.clone()),
        None => site.context.i18n.remove(code),
    }
}

impl CommandOp for SetTranslations {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        self.old_translations = write_locale(site, &self.code, self.new_translations.as_ref());
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        write_locale(site, &self.code, self.old_translations.as_ref());
        Ok(())
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.code == next.code
    }

    fn merge(&mut self, next: Self) {
        self.new_translations = next.new_translations;
    }
}

/// Theme variable substituted into `${name}` placeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetThemeVariable {
    pub entry: KeyedValue<String>,
}

impl SetThemeVariable {
    pub fn new(entry: KeyedValue<String>) -> Self {
        Self { entry }
    }
}

impl CommandOp for SetThemeVariable {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        self.entry.apply_to(&mut site.context.theme.variables)
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        self.entry.undo_on(&mut site.context.theme.variables)
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.entry.can_merge(&next.entry)
    }

    fn merge(&mut self, next: Self) {
        self.entry.merge(next.entry);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetThemeFont {
    pub entry: KeyedValue<ThemeFont>,
}

impl SetThemeFont {
    pub fn new(entry: KeyedValue<ThemeFont>) -> Self {
        Self { entry }
    }
}

impl CommandOp for SetThemeFont {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        self.entry.apply_to(&mut site.context.theme.fonts)
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        self.entry.undo_on(&mut site.context.theme.fonts)
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.entry.can_merge(&next.entry)
    }

    fn merge(&mut self, next: Self) {
        self.entry.merge(next.entry);
    }
}

fn default_root() -> ComponentTemplate {
    ComponentTemplate::new("Root", Tag::Div)
}

/// Create a page with its own root tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPage {
    pub name: String,
    pub route: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub head: PageHead,
    /// Root tree; ids are recorded on first apply
    #[serde(default = "default_root")]
    pub root: ComponentTemplate,
    /// Position in the page order; `None` appends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl AddPage {
    pub fn new(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
            public: true,
            head: PageHead::default(),
            root: default_root(),
            index: None,
        }
    }
}

impl CommandOp for AddPage {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        if site.pages.contains_key(&self.route) {
            return Err(CommandError::PageExists(self.route.clone()));
        }
        let len = site.page_order.len();
        let index = self.index.unwrap_or(len);
        if index > len {
            return Err(ModelError::IndexOutOfBounds { index, len }.into());
        }
        ensure_ids_unused(&site.context, &self.root)?;

        let root_id = insert_root_template(&mut site.context, &mut self.root)?;
        site.pages.insert(
            self.route.clone(),
            Page {
                name: self.name.clone(),
                route: self.route.clone(),
                public: self.public,
                head: self.head.clone(),
                root_id,
            },
        );
        site.page_order.insert(index, self.route.clone());
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let root_id = recorded(&self.root.id, "AddPage", "root.id")?;
        site.pages
            .remove(&self.route)
            .ok_or_else(|| CommandError::PageNotFound(self.route.clone()))?;
        site.page_order.retain(|route| route != &self.route);
        remove_subtree(&mut site.context, root_id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedPage {
    pub page: Page,
    pub order_index: usize,
    pub tree: RemovedSubtree,
    /// Active page before the editor was moved off the removed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovePage {
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<RemovedPage>,
}

impl RemovePage {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            removed: None,
        }
    }
}

impl CommandOp for RemovePage {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let page = site
            .pages
            .get(&self.route)
            .ok_or_else(|| CommandError::PageNotFound(self.route.clone()))?
            .clone();
        if site.pages.len() == 1 {
            return Err(CommandError::CannotRemoveLastPage);
        }

        let tree = detach_subtree(site, &page.root_id)?;
        site.pages.remove(&self.route);
        let order_index = site
            .page_order
            .iter()
            .position(|route| route == &self.route)
            .unwrap_or(site.page_order.len());
        if order_index < site.page_order.len() {
            site.page_order.remove(order_index);
        }

        let fallback = site.page_order.first().cloned();
        let mut active_page = None;
        if let (Some(editor), Some(fallback)) = (site.editor.as_mut(), fallback) {
            if editor.active_page == self.route {
                active_page = Some(std::mem::replace(&mut editor.active_page, fallback));
            }
        }

        self.removed = Some(RemovedPage {
            page,
            order_index,
            tree,
            active_page,
        });
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let removed = recorded(&self.removed, "RemovePage", "removed")?;
        if site.pages.contains_key(&self.route) {
            return Err(CommandError::PageExists(self.route.clone()));
        }

        restore_subtree(site, &removed.tree)?;
        site.pages.insert(self.route.clone(), removed.page.clone());
        let index = removed.order_index.min(site.page_order.len());
        site.page_order.insert(index, self.route.clone());
        if let (Some(previous), Some(editor)) = (&removed.active_page, site.editor.as_mut()) {
            editor.active_page = previous.clone();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProps {
    pub name: String,
    pub route: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub head: PageHead,
}

impl PageProps {
    pub fn of(page: &Page) -> Self {
        Self {
            name: page.name.clone(),
            route: page.route.clone(),
            public: page.public,
            head: page.head.clone(),
        }
    }
}

/// Edit page metadata; a changed route re-keys the page everywhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPage {
    pub route: String,
    pub new: PageProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<PageProps>,
}

impl EditPage {
    pub fn new(route: impl Into<String>, new: PageProps) -> Self {
        Self {
            route: route.into(),
            new,
            old: None,
        }
    }
}

/// Move the page at `from` to `props`, re-keying when the route changes
fn write_page(site: &mut Site, from: &str, props: &PageProps) -> CommandResult<()> {
    if from != props.route && site.pages.contains_key(&props.route) {
        return Err(CommandError::PageExists(props.route.clone()));
    }
    let mut page = site
        .pages
        .remove(from)
        .ok_or_else(|| CommandError::PageNotFound(from.to_string()))?;
    page.name = props.name.clone();
    page.route = props.route.clone();
    page.public = props.public;
    page.head = props.head.clone();
    site.pages.insert(props.route.clone(), page);

    if from != props.route {
        for route in site.page_order.iter_mut().filter(|r| r.as_str() == from) {
            *route = props.route.clone();
        }
        if let Some(editor) = site.editor.as_mut() {
            if editor.active_page == from {
                editor.active_page = props.route.clone();
            }
        }
    }
    Ok(())
}

impl CommandOp for EditPage {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let old = site
            .pages
            .get(&self.route)
            .map(PageProps::of)
            .ok_or_else(|| CommandError::PageNotFound(self.route.clone()))?;
        write_page(site, &self.route, &self.new)?;
        self.old = Some(old);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let old = recorded(&self.old, "EditPage", "old")?;
        write_page(site, &self.new.route, old)
    }

    fn can_merge(&self, next: &Self) -> bool {
        next.route == self.new.route
    }

    fn merge(&mut self, next: Self) {
        self.new = next.new;
    }
}

/// Site-wide head tags applied to every page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDefaultsHead {
    pub head: PageHead,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageHead>,
}

impl SetDefaultsHead {
    pub fn new(head: PageHead) -> Self {
        Self { head, previous: None }
    }
}

impl CommandOp for SetDefaultsHead {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        self.previous = Some(std::mem::replace(&mut site.defaults.head, self.head.clone()));
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        site.defaults.head = recorded(&self.previous, "SetDefaultsHead", "previous")?.clone();
        Ok(())
    }

    fn can_merge(&self, _next: &Self) -> bool {
        true
    }

    fn merge(&mut self, next: Self) {
        self.head = next.head;
    }
}

/// Change the editor selection as an undoable step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionChange>,
}

impl SelectComponent {
    pub fn new(component_id: Option<String>) -> Self {
        Self {
            component_id,
            selection: None,
        }
    }
}

impl CommandOp for SelectComponent {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        if let Some(id) = &self.component_id {
            component(site, id)?;
        }
        let editor = editor_mut(site)?;
        let previous = std::mem::replace(&mut editor.selected_component_id, self.component_id.clone());
        self.selection = Some(SelectionChange { previous });
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        recorded(&self.selection, "SelectComponent", "selection")?.restore(site)
    }
}
