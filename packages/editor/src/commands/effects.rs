//! # Structural side effects
//!
//! Removing or relocating a subtree touches registries outside the tree:
//!
//! - ancestors may hold override styles targeting removed nodes
//! - the children-of-custom set must follow nodes in and out of custom
//!   components
//! - the editor selection may point into the removed subtree
//!
//! Each effect is recorded so undo can put it back exactly.

use super::{editor_mut, CommandResult};
use serde::{Deserialize, Serialize};
use sitebuilder_model::traverse::{ancestors, iter_subtree};
use sitebuilder_model::tree::{
    detach_child, remove_subtree, restore_components, snapshot_components,
};
use sitebuilder_model::{Component, ComponentTemplate, ModelError, RawStyle, Site, SiteContext};
use std::collections::BTreeSet;
use tracing::debug;

/// Membership changes made to `custom_children`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDelta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
}

impl CustomDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub(crate) fn revert(&self, context: &mut SiteContext) {
        for id in &self.added {
            context.custom_children.remove(id);
        }
        for id in &self.removed {
            context.custom_children.insert(id.clone());
        }
    }
}

/// A node is a child-of-custom when any strict ancestor is a custom component
pub(crate) fn sync_custom_children(context: &mut SiteContext, root_id: &str) -> CustomDelta {
    let ids: Vec<String> = iter_subtree(context, root_id).map(|c| c.id.clone()).collect();
    let mut delta = CustomDelta::default();

    for id in ids {
        let inside = ancestors(context, &id).any(|a| context.custom_components.contains(&a.id));
        let listed = context.custom_children.contains(&id);
        if inside && !listed {
            context.custom_children.insert(id.clone());
            delta.added.push(id);
        } else if !inside && listed {
            context.custom_children.remove(&id);
            delta.removed.push(id);
        }
    }
    delta
}

/// Override style on an ancestor that targeted a removed node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedOverride {
    pub owner_id: String,
    pub selector: String,
    pub style: RawStyle,
}

/// Overrides held by ancestors of `root_id` whose selector is in `ids`.
/// Owners for which `keep` holds are skipped.
pub(crate) fn ancestor_overrides<F>(
    context: &SiteContext,
    root_id: &str,
    ids: &BTreeSet<String>,
    keep: F,
) -> Vec<OrphanedOverride>
where
    F: Fn(&str) -> bool,
{
    let mut found = Vec::new();
    for ancestor in ancestors(context, root_id).filter(|a| !keep(a.id.as_str())) {
        for (selector, style) in &ancestor.style.overrides {
            if ids.contains(selector) {
                found.push(OrphanedOverride {
                    owner_id: ancestor.id.clone(),
                    selector: selector.clone(),
                    style: style.clone(),
                });
            }
        }
    }
    found
}

pub(crate) fn drop_overrides(context: &mut SiteContext, orphans: &[OrphanedOverride]) {
    for orphan in orphans {
        if let Some(owner) = context.component_mut(&orphan.owner_id) {
            owner.style.overrides.remove(&orphan.selector);
        }
    }
}

pub(crate) fn restore_overrides(context: &mut SiteContext, orphans: &[OrphanedOverride]) {
    for orphan in orphans {
        if let Some(owner) = context.component_mut(&orphan.owner_id) {
            owner
                .style
                .overrides
                .insert(orphan.selector.clone(), orphan.style.clone());
        }
    }
}

/// Editor selection as it was before a command changed it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

impl SelectionChange {
    pub(crate) fn restore(&self, site: &mut Site) -> CommandResult<()> {
        editor_mut(site)?.selected_component_id = self.previous.clone();
        Ok(())
    }
}

/// Everything needed to put a removed subtree back.
///
/// `nodes` is flat and in pre-order; the first entry is the subtree root and
/// carries the parent it goes back under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedSubtree {
    #[serde(default)]
    pub index: usize,
    pub nodes: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_components: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_children: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphaned_overrides: Vec<OrphanedOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionChange>,
}

/// Unlink and drop a subtree together with its side effects
pub(crate) fn detach_subtree(site: &mut Site, root_id: &str) -> CommandResult<RemovedSubtree> {
    let context = &site.context;
    let nodes = snapshot_components(context, root_id)?;
    let ids: BTreeSet<String> = nodes.iter().map(|node| node.id.clone()).collect();

    let custom_components: Vec<String> = ids
        .iter()
        .filter(|id| context.custom_components.contains(*id))
        .cloned()
        .collect();
    let custom_children: Vec<String> = ids
        .iter()
        .filter(|id| context.custom_children.contains(*id))
        .cloned()
        .collect();

    let orphaned_overrides = ancestor_overrides(context, root_id, &ids, |_| false);

    let selection = site
        .editor
        .as_ref()
        .and_then(|e| e.selected_component_id.as_ref())
        .filter(|selected| ids.contains(*selected))
        .map(|selected| SelectionChange {
            previous: Some(selected.clone()),
        });

    let index = match nodes.first().and_then(|root| root.parent_id.as_ref()) {
        Some(_) => detach_child(&mut site.context, root_id)?.1,
        None => 0,
    };
    remove_subtree(&mut site.context, root_id)?;

    for id in &custom_components {
        site.context.custom_components.remove(id);
    }
    for id in &custom_children {
        site.context.custom_children.remove(id);
    }
    drop_overrides(&mut site.context, &orphaned_overrides);
    if selection.is_some() {
        if let Some(editor) = site.editor.as_mut() {
            editor.selected_component_id = None;
        }
    }

    debug!(
        root_id,
        removed = ids.len(),
        orphaned_overrides = orphaned_overrides.len(),
        "Detached subtree"
    );

    Ok(RemovedSubtree {
        index,
        nodes,
        custom_components,
        custom_children,
        orphaned_overrides,
        selection,
    })
}

/// Recorded template ids must not collide with live components
pub(crate) fn ensure_ids_unused(context: &SiteContext, template: &ComponentTemplate) -> CommandResult<()> {
    match template.ids().into_iter().find(|id| context.components.contains_key(id)) {
        Some(id) => Err(ModelError::DuplicateId(id).into()),
        None => Ok(()),
    }
}

/// Reinsert a subtree under its recorded ids, parent and index
pub(crate) fn restore_subtree(site: &mut Site, removed: &RemovedSubtree) -> CommandResult<()> {
    restore_components(&mut site.context, &removed.nodes, removed.index)?;

    site.context
        .custom_components
        .extend(removed.custom_components.iter().cloned());
    site.context
        .custom_children
        .extend(removed.custom_children.iter().cloned());
    restore_overrides(&mut site.context, &removed.orphaned_overrides);
    if let Some(selection) = &removed.selection {
        selection.restore(site)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitebuilder_model::tree::insert_template;
    use sitebuilder_model::{StyleEntry, Tag};
    use sitebuilder_model::style::set_entry;

    #[test]
    fn test_detach_records_and_restores_overrides() {
        let mut site = Site::new("Demo", "demo", "1");
        let root = site.page("/").unwrap().root_id.clone();
        let mut card = ComponentTemplate::new("Card", Tag::Div)
            .with_child(ComponentTemplate::new("Title", Tag::H1).with_content("Hi"));
        let card_id = insert_template(&mut site.context, &mut card, &root, None).unwrap();
        let title_id = card.children[0].id.clone().unwrap();

        let mut style = RawStyle::new();
        set_entry(
            &mut style,
            &StyleEntry::new("builtin-bp-0", Default::default(), "color", "red"),
        );
        site.context
            .component_mut(&root)
            .unwrap()
            .style
            .overrides
            .insert(title_id.clone(), style);
        site.context.custom_components.insert(card_id.clone());
        site.context.custom_children.insert(title_id.clone());
        site.editor.as_mut().unwrap().selected_component_id = Some(title_id.clone());
        let before = site.clone();

        let removed = detach_subtree(&mut site, &card_id).unwrap();
        assert_eq!(removed.orphaned_overrides.len(), 1);
        assert!(site.context.component(&root).unwrap().style.overrides.is_empty());
        assert!(site.context.custom_children.is_empty());
        assert_eq!(site.editor.as_ref().unwrap().selected_component_id, None);

        restore_subtree(&mut site, &removed).unwrap();
        assert_eq!(site, before);
    }

    #[test]
    fn test_sync_follows_custom_ancestors() {
        let mut site = Site::new("Demo", "demo", "1");
        let root = site.page("/").unwrap().root_id.clone();
        let mut box_template = ComponentTemplate::new("Box", Tag::Div)
            .with_child(ComponentTemplate::new("Inner", Tag::Span));
        let box_id = insert_template(&mut site.context, &mut box_template, &root, None).unwrap();
        let inner_id = box_template.children[0].id.clone().unwrap();

        site.context.custom_components.insert(root.clone());
        let delta = sync_custom_children(&mut site.context, &box_id);
        assert_eq!(delta.added, vec![box_id.clone(), inner_id.clone()]);

        site.context.custom_components.remove(&root);
        let delta = sync_custom_children(&mut site.context, &box_id);
        assert_eq!(delta.removed.len(), 2);
        delta.revert(&mut site.context);
        assert!(site.context.custom_children.contains(&inner_id));
    }
}
