//! Style commands: custom declarations, mixins and override styles.

use super::{component, component_mut, recorded, CommandError, CommandOp, CommandResult};
use serde::{Deserialize, Serialize};
use sitebuilder_model::style::{remove_entry, set_entry};
use sitebuilder_model::traverse::is_descendant;
use sitebuilder_model::{id, ModelError, PseudoClass, RawStyle, Site, StyleEntry, StyleMixin};

/// Address of one declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleKey {
    pub breakpoint_id: String,
    #[serde(default)]
    pub pseudo_class: PseudoClass,
    pub property: String,
}

impl StyleKey {
    pub fn new(
        breakpoint_id: impl Into<String>,
        pseudo_class: PseudoClass,
        property: impl Into<String>,
    ) -> Self {
        Self {
            breakpoint_id: breakpoint_id.into(),
            pseudo_class,
            property: property.into(),
        }
    }

    /// Write `value` (or remove when `None`), returning what was there
    fn write(&self, raw: &mut RawStyle, value: Option<&String>) -> Option<String> {
        match value {
            Some(value) => set_entry(
                raw,
                &StyleEntry::new(
                    self.breakpoint_id.clone(),
                    self.pseudo_class,
                    self.property.clone(),
                    value.clone(),
                ),
            ),
            None => remove_entry(raw, &self.breakpoint_id, self.pseudo_class, &self.property),
        }
    }
}

fn ensure_breakpoint(site: &Site, breakpoint_id: &str) -> CommandResult<()> {
    if site.context.breakpoints.contains_key(breakpoint_id) {
        Ok(())
    } else {
        Err(CommandError::BreakpointNotFound(breakpoint_id.to_string()))
    }
}

/// Set or clear one declaration of a component's own style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCustomStyle {
    pub component_id: String,
    #[serde(flatten)]
    pub key: StyleKey,
    /// `None` removes the declaration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

impl SetCustomStyle {
    pub fn new(component_id: impl Into<String>, key: StyleKey, value: Option<String>) -> Self {
        Self {
            component_id: component_id.into(),
            key,
            value,
            previous: None,
        }
    }
}

impl CommandOp for SetCustomStyle {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        ensure_breakpoint(site, &self.key.breakpoint_id)?;
        let component = component_mut(site, &self.component_id)?;
        self.previous = self.key.write(&mut component.style.custom, self.value.as_ref());
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let component = component_mut(site, &self.component_id)?;
        self.key.write(&mut component.style.custom, self.previous.as_ref());
        Ok(())
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.component_id == next.component_id && self.key == next.key
    }

    fn merge(&mut self, next: Self) {
        self.value = next.value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStyleMixin {
    pub name: String,
    #[serde(default)]
    pub breakpoints: RawStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixin_id: Option<String>,
}

impl AddStyleMixin {
    pub fn new(name: impl Into<String>, breakpoints: RawStyle) -> Self {
        Self {
            name: name.into(),
            breakpoints,
            mixin_id: None,
        }
    }
}

impl CommandOp for AddStyleMixin {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let context = &mut site.context;
        let mixin_id = match &self.mixin_id {
            Some(existing) if context.styles.contains_key(existing) => {
                return Err(ModelError::DuplicateId(existing.clone()).into());
            }
            Some(existing) => existing.clone(),
            None => id::style_id(context),
        };

        context.styles.insert(
            mixin_id.clone(),
            StyleMixin {
                id: mixin_id.clone(),
                name: self.name.clone(),
                breakpoints: self.breakpoints.clone(),
            },
        );
        context.style_order.push(mixin_id.clone());
        self.mixin_id = Some(mixin_id);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let mixin_id = recorded(&self.mixin_id, "AddStyleMixin", "mixinId")?;
        site.context
            .styles
            .remove(mixin_id)
            .ok_or_else(|| CommandError::MixinNotFound(mixin_id.clone()))?;
        site.context.style_order.retain(|id| id != mixin_id);
        Ok(())
    }
}

/// Where a removed mixin was referenced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixinReference {
    pub component_id: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedMixin {
    pub mixin: StyleMixin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<MixinReference>,
}

/// Delete a mixin and every reference to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveStyleMixin {
    pub mixin_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<RemovedMixin>,
}

impl RemoveStyleMixin {
    pub fn new(mixin_id: impl Into<String>) -> Self {
        Self {
            mixin_id: mixin_id.into(),
            removed: None,
        }
    }
}

impl CommandOp for RemoveStyleMixin {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let context = &mut site.context;
        let mixin = context
            .styles
            .remove(&self.mixin_id)
            .ok_or_else(|| CommandError::MixinNotFound(self.mixin_id.clone()))?;
        let order_index = context.style_order.iter().position(|id| id == &self.mixin_id);
        if let Some(index) = order_index {
            context.style_order.remove(index);
        }

        let mut references = Vec::new();
        for component in context.components.values_mut() {
            let original = std::mem::take(&mut component.style.mixins);
            for (index, entry) in original.into_iter().enumerate() {
                if entry == self.mixin_id {
                    references.push(MixinReference {
                        component_id: component.id.clone(),
                        index,
                    });
                } else {
                    component.style.mixins.push(entry);
                }
            }
        }

        self.removed = Some(RemovedMixin {
            mixin,
            order_index,
            references,
        });
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let removed = recorded(&self.removed, "RemoveStyleMixin", "removed")?;
        let context = &mut site.context;
        if context.styles.contains_key(&self.mixin_id) {
            return Err(ModelError::DuplicateId(self.mixin_id.clone()).into());
        }

        context.styles.insert(self.mixin_id.clone(), removed.mixin.clone());
        match removed.order_index {
            Some(index) if index <= context.style_order.len() => {
                context.style_order.insert(index, self.mixin_id.clone())
            }
            _ => context.style_order.push(self.mixin_id.clone()),
        }
        for reference in &removed.references {
            if let Some(component) = context.component_mut(&reference.component_id) {
                let index = reference.index.min(component.style.mixins.len());
                component.style.mixins.insert(index, self.mixin_id.clone());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixinProps {
    pub name: String,
    #[serde(default)]
    pub breakpoints: RawStyle,
}

impl MixinProps {
    fn of(mixin: &StyleMixin) -> Self {
        Self {
            name: mixin.name.clone(),
            breakpoints: mixin.breakpoints.clone(),
        }
    }

    fn write_to(&self, mixin: &mut StyleMixin) {
        mixin.name = self.name.clone();
        mixin.breakpoints = self.breakpoints.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditStyleMixin {
    pub mixin_id: String,
    pub new: MixinProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<MixinProps>,
}

impl EditStyleMixin {
    pub fn new(mixin_id: impl Into<String>, new: MixinProps) -> Self {
        Self {
            mixin_id: mixin_id.into(),
            new,
            old: None,
        }
    }

    fn mixin_mut<'a>(&self, site: &'a mut Site) -> CommandResult<&'a mut StyleMixin> {
        site.context
            .styles
            .get_mut(&self.mixin_id)
            .ok_or_else(|| CommandError::MixinNotFound(self.mixin_id.clone()))
    }
}

impl CommandOp for EditStyleMixin {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let mixin = self.mixin_mut(site)?;
        let old = MixinProps::of(mixin);
        self.new.write_to(mixin);
        self.old = Some(old);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let old = recorded(&self.old, "EditStyleMixin", "old")?;
        old.write_to(self.mixin_mut(site)?);
        Ok(())
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.mixin_id == next.mixin_id
    }

    fn merge(&mut self, next: Self) {
        self.new = next.new;
    }
}

/// Reference a mixin from a component's mixin list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMixinToComponent {
    pub component_id: String,
    pub mixin_id: String,
    /// Position in the mixin list; `None` appends (highest precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl AddMixinToComponent {
    pub fn new(component_id: impl Into<String>, mixin_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            mixin_id: mixin_id.into(),
            index: None,
        }
    }
}

impl CommandOp for AddMixinToComponent {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let component = component_mut(site, &self.component_id)?;
        let mixins = &mut component.style.mixins;
        if mixins.contains(&self.mixin_id) {
            return Err(CommandError::MixinAlreadyApplied {
                component: self.component_id.clone(),
                mixin: self.mixin_id.clone(),
            });
        }
        let len = mixins.len();
        let index = self.index.unwrap_or(len);
        if index > len {
            return Err(ModelError::IndexOutOfBounds { index, len }.into());
        }
        mixins.insert(index, self.mixin_id.clone());
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let component = component_mut(site, &self.component_id)?;
        let before = component.style.mixins.len();
        component.style.mixins.retain(|id| id != &self.mixin_id);
        if component.style.mixins.len() == before {
            return Err(CommandError::MixinNotApplied {
                component: self.component_id.clone(),
                mixin: self.mixin_id.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMixinFromComponent {
    pub component_id: String,
    pub mixin_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl RemoveMixinFromComponent {
    pub fn new(component_id: impl Into<String>, mixin_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            mixin_id: mixin_id.into(),
            index: None,
        }
    }
}

impl CommandOp for RemoveMixinFromComponent {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let component = component_mut(site, &self.component_id)?;
        let index = component
            .style
            .mixins
            .iter()
            .position(|id| id == &self.mixin_id)
            .ok_or_else(|| CommandError::MixinNotApplied {
                component: self.component_id.clone(),
                mixin: self.mixin_id.clone(),
            })?;
        component.style.mixins.remove(index);
        self.index = Some(index);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let index = *recorded(&self.index, "RemoveMixinFromComponent", "index")?;
        let component = component_mut(site, &self.component_id)?;
        let len = component.style.mixins.len();
        if index > len {
            return Err(ModelError::IndexOutOfBounds { index, len }.into());
        }
        component.style.mixins.insert(index, self.mixin_id.clone());
        Ok(())
    }
}

/// Start overriding a descendant's style from `component_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOverrideStyle {
    pub component_id: String,
    pub selector: String,
    #[serde(default)]
    pub style: RawStyle,
}

impl AddOverrideStyle {
    pub fn new(component_id: impl Into<String>, selector: impl Into<String>, style: RawStyle) -> Self {
        Self {
            component_id: component_id.into(),
            selector: selector.into(),
            style,
        }
    }
}

impl CommandOp for AddOverrideStyle {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        component(site, &self.component_id)?;
        if !is_descendant(&site.context, &self.component_id, &self.selector) {
            return Err(CommandError::InvalidOverrideTarget {
                component: self.component_id.clone(),
                selector: self.selector.clone(),
            });
        }
        let overrides = &mut component_mut(site, &self.component_id)?.style.overrides;
        if overrides.contains_key(&self.selector) {
            return Err(CommandError::OverrideExists {
                component: self.component_id.clone(),
                selector: self.selector.clone(),
            });
        }
        overrides.insert(self.selector.clone(), self.style.clone());
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        component_mut(site, &self.component_id)?
            .style
            .overrides
            .remove(&self.selector)
            .ok_or_else(|| CommandError::OverrideSelectorNotFound {
                component: self.component_id.clone(),
                selector: self.selector.clone(),
            })?;
        Ok(())
    }
}

fn override_mut<'a>(site: &'a mut Site, component_id: &str, selector: &str) -> CommandResult<&'a mut RawStyle> {
    component_mut(site, component_id)?
        .style
        .overrides
        .get_mut(selector)
        .ok_or_else(|| CommandError::OverrideSelectorNotFound {
            component: component_id.to_string(),
            selector: selector.to_string(),
        })
}

/// Set or clear one declaration inside an existing override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOverrideStyle {
    pub component_id: String,
    pub selector: String,
    #[serde(flatten)]
    pub key: StyleKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

impl EditOverrideStyle {
    pub fn new(
        component_id: impl Into<String>,
        selector: impl Into<String>,
        key: StyleKey,
        value: Option<String>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            selector: selector.into(),
            key,
            value,
            previous: None,
        }
    }
}

impl CommandOp for EditOverrideStyle {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        ensure_breakpoint(site, &self.key.breakpoint_id)?;
        let raw = override_mut(site, &self.component_id, &self.selector)?;
        self.previous = self.key.write(raw, self.value.as_ref());
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let raw = override_mut(site, &self.component_id, &self.selector)?;
        self.key.write(raw, self.previous.as_ref());
        Ok(())
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.component_id == next.component_id && self.selector == next.selector && self.key == next.key
    }

    fn merge(&mut self, next: Self) {
        self.value = next.value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOverrideStyle {
    pub component_id: String,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<RawStyle>,
}

impl RemoveOverrideStyle {
    pub fn new(component_id: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            selector: selector.into(),
            style: None,
        }
    }
}

impl CommandOp for RemoveOverrideStyle {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let style = component_mut(site, &self.component_id)?
            .style
            .overrides
            .remove(&self.selector)
            .ok_or_else(|| CommandError::OverrideSelectorNotFound {
                component: self.component_id.clone(),
                selector: self.selector.clone(),
            })?;
        self.style = Some(style);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let style = recorded(&self.style, "RemoveOverrideStyle", "style")?;
        component_mut(site, &self.component_id)?
            .style
            .overrides
            .insert(self.selector.clone(), style.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::AddComponent;
    use sitebuilder_model::style::get_entry;
    use sitebuilder_model::{default_breakpoint_id, ComponentTemplate, Tag};

    fn site_with_card() -> (Site, String, String) {
        let mut site = Site::new("Demo", "demo", "1");
        let root = site.page("/").unwrap().root_id.clone();
        let mut add = AddComponent::new(
            root.clone(),
            ComponentTemplate::new("Card", Tag::Div).with_child(ComponentTemplate::new("Title", Tag::H2)),
        );
        add.apply(&mut site).unwrap();
        let card = add.component_id.unwrap();
        let title = add.template.children[0].id.clone().unwrap();
        (site, card, title)
    }

    fn width() -> StyleKey {
        StyleKey::new(default_breakpoint_id(), PseudoClass::Default, "width")
    }

    #[test]
    fn test_custom_style_set_and_clear() {
        let (mut site, card, _) = site_with_card();
        let before = site.clone();

        let mut set = SetCustomStyle::new(card.clone(), width(), Some("50%".to_string()));
        set.apply(&mut site).unwrap();
        let custom = &site.context.component(&card).unwrap().style.custom;
        assert_eq!(
            get_entry(custom, &default_breakpoint_id(), PseudoClass::Default, "width"),
            Some(&"50%".to_string())
        );

        set.undo(&mut site).unwrap();
        assert_eq!(site, before);
    }

    #[test]
    fn test_custom_style_unknown_breakpoint() {
        let (mut site, card, _) = site_with_card();
        let mut set = SetCustomStyle::new(
            card,
            StyleKey::new("demo-bp-99", PseudoClass::Hover, "color"),
            Some("red".to_string()),
        );
        assert_eq!(
            set.apply(&mut site),
            Err(CommandError::BreakpointNotFound("demo-bp-99".to_string()))
        );
    }

    #[test]
    fn test_remove_mixin_restores_references_in_place() {
        let (mut site, card, title) = site_with_card();
        let mut add = AddStyleMixin::new("Rounded", RawStyle::new());
        add.apply(&mut site).unwrap();
        let mixin_id = add.mixin_id.clone().unwrap();

        for (component, mixin) in [(&card, "builtin-m-0"), (&card, mixin_id.as_str()), (&title, mixin_id.as_str())] {
            AddMixinToComponent::new(component.clone(), mixin).apply(&mut site).unwrap();
        }
        let before = site.clone();

        let mut remove = RemoveStyleMixin::new(mixin_id.clone());
        remove.apply(&mut site).unwrap();
        assert!(site.context.styles.is_empty());
        assert_eq!(site.context.component(&card).unwrap().style.mixins, vec!["builtin-m-0"]);

        remove.undo(&mut site).unwrap();
        assert_eq!(site, before);
    }

    #[test]
    fn test_mixin_added_twice() {
        let (mut site, card, _) = site_with_card();
        AddMixinToComponent::new(card.clone(), "builtin-m-1").apply(&mut site).unwrap();
        assert!(matches!(
            AddMixinToComponent::new(card, "builtin-m-1").apply(&mut site),
            Err(CommandError::MixinAlreadyApplied { .. })
        ));
    }

    #[test]
    fn test_override_requires_descendant_selector() {
        let (mut site, card, title) = site_with_card();
        assert!(matches!(
            AddOverrideStyle::new(title.clone(), card.clone(), RawStyle::new()).apply(&mut site),
            Err(CommandError::InvalidOverrideTarget { .. })
        ));

        let mut edit = EditOverrideStyle::new(card.clone(), title.clone(), width(), Some("10px".to_string()));
        assert_eq!(
            edit.apply(&mut site),
            Err(CommandError::OverrideSelectorNotFound {
                component: card.clone(),
                selector: title.clone()
            })
        );

        let before = site.clone();
        let mut add = AddOverrideStyle::new(card.clone(), title.clone(), RawStyle::new());
        add.apply(&mut site).unwrap();
        edit.apply(&mut site).unwrap();
        edit.undo(&mut site).unwrap();
        add.undo(&mut site).unwrap();
        assert_eq!(site, before);
    }
}
