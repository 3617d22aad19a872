//! Structural edits on the component table.
//!
//! These keep `children` and `parent_id` consistent; callers handle
//! registries that reference components (custom sets, overrides).

use crate::component::{Component, ComponentTemplate};
use crate::context::SiteContext;
use crate::error::{ModelError, ModelResult};
use crate::id;
use crate::traverse::{is_descendant, iter_subtree};
use std::collections::HashMap;

/// Insert `child_id` under `parent_id`. `None` appends.
pub fn attach_child(
    context: &mut SiteContext,
    parent_id: &str,
    child_id: &str,
    index: Option<usize>,
) -> ModelResult<usize> {
    if !context.components.contains_key(child_id) {
        return Err(ModelError::ComponentNotFound(child_id.to_string()));
    }
    let parent = context
        .component_mut(parent_id)
        .ok_or_else(|| ModelError::ParentNotFound(parent_id.to_string()))?;

    let len = parent.children.len();
    let index = index.unwrap_or(len);
    if index > len {
        return Err(ModelError::IndexOutOfBounds { index, len });
    }
    parent.children.insert(index, child_id.to_string());

    if let Some(child) = context.component_mut(child_id) {
        child.parent_id = Some(parent_id.to_string());
    }
    Ok(index)
}

/// Unlink a component from its parent, returning `(parent_id, index)`
pub fn detach_child(context: &mut SiteContext, child_id: &str) -> ModelResult<(String, usize)> {
    let parent_id = context
        .component(child_id)
        .ok_or_else(|| ModelError::ComponentNotFound(child_id.to_string()))?
        .parent_id
        .clone()
        .ok_or_else(|| ModelError::NoParent(child_id.to_string()))?;

    let parent = context
        .component_mut(&parent_id)
        .ok_or_else(|| ModelError::ParentNotFound(parent_id.clone()))?;
    let index = parent
        .children
        .iter()
        .position(|c| c == child_id)
        .ok_or_else(|| ModelError::InconsistentParent {
            child: child_id.to_string(),
            parent: parent_id.clone(),
        })?;
    parent.children.remove(index);

    if let Some(child) = context.component_mut(child_id) {
        child.parent_id = None;
    }
    Ok((parent_id, index))
}

/// Child id at `index` of `parent_id`
pub fn child_at(context: &SiteContext, parent_id: &str, index: usize) -> ModelResult<String> {
    let parent = context
        .component(parent_id)
        .ok_or_else(|| ModelError::ParentNotFound(parent_id.to_string()))?;
    parent
        .children
        .get(index)
        .cloned()
        .ok_or(ModelError::IndexOutOfBounds {
            index,
            len: parent.children.len(),
        })
}

/// True when moving `node_id` under `new_parent_id` would put it inside itself
pub fn would_create_cycle(context: &SiteContext, node_id: &str, new_parent_id: &str) -> bool {
    node_id == new_parent_id || is_descendant(context, node_id, new_parent_id)
}

/// Materialize a template under `parent_id`.
///
/// Nodes without an id get a fresh one from the counter and the id is written
/// back into the template; nodes with a recorded id reuse it.
pub fn insert_template(
    context: &mut SiteContext,
    template: &mut ComponentTemplate,
    parent_id: &str,
    index: Option<usize>,
) -> ModelResult<String> {
    let parent = context
        .component(parent_id)
        .ok_or_else(|| ModelError::ParentNotFound(parent_id.to_string()))?;
    let len = parent.children.len();
    if let Some(index) = index {
        if index > len {
            return Err(ModelError::IndexOutOfBounds { index, len });
        }
    }

    let root_id = materialize(context, template, Some(parent_id.to_string()))?;
    let parent = context
        .component_mut(parent_id)
        .ok_or_else(|| ModelError::ParentNotFound(parent_id.to_string()))?;
    parent.children.insert(index.unwrap_or(len), root_id.clone());
    Ok(root_id)
}

/// Materialize a template as a parentless tree (a page root)
pub fn insert_root_template(
    context: &mut SiteContext,
    template: &mut ComponentTemplate,
) -> ModelResult<String> {
    materialize(context, template, None)
}

fn materialize(
    context: &mut SiteContext,
    template: &mut ComponentTemplate,
    parent_id: Option<String>,
) -> ModelResult<String> {
    let root_id = place(context, template, parent_id)?;

    let mut stack: Vec<(&mut ComponentTemplate, String)> = template
        .children
        .iter_mut()
        .rev()
        .map(|child| (child, root_id.clone()))
        .collect();
    while let Some((node, parent_id)) = stack.pop() {
        let component_id = place(context, node, Some(parent_id.clone()))?;
        if let Some(parent) = context.component_mut(&parent_id) {
            parent.children.push(component_id.clone());
        }
        stack.extend(
            node.children
                .iter_mut()
                .rev()
                .map(|child| (child, component_id.clone())),
        );
    }
    Ok(root_id)
}

/// Add one template node to the table, without children
fn place(
    context: &mut SiteContext,
    node: &mut ComponentTemplate,
    parent_id: Option<String>,
) -> ModelResult<String> {
    let component_id = match &node.id {
        Some(id) => id.clone(),
        None => {
            let id = id::component_id(context);
            node.id = Some(id.clone());
            id
        }
    };
    if context.components.contains_key(&component_id) {
        return Err(ModelError::DuplicateId(component_id));
    }
    let component = node.to_component(component_id.clone(), parent_id);
    context.components.insert(component_id.clone(), component);
    Ok(component_id)
}

/// Deep copy of a subtree as a nested template, children in order
pub fn snapshot_subtree(context: &SiteContext, id: &str) -> ModelResult<ComponentTemplate> {
    if !context.components.contains_key(id) {
        return Err(ModelError::ComponentNotFound(id.to_string()));
    }

    // Reverse pre-order visits every node after all of its descendants.
    let order: Vec<&Component> = iter_subtree(context, id).collect();
    let mut built: HashMap<&str, ComponentTemplate> = HashMap::with_capacity(order.len());
    for component in order.into_iter().rev() {
        let children = component
            .children
            .iter()
            .filter_map(|child_id| built.remove(child_id.as_str()))
            .collect();
        built.insert(
            component.id.as_str(),
            ComponentTemplate {
                id: Some(component.id.clone()),
                name: component.name.clone(),
                tag: component.tag,
                content: component.content.clone(),
                style: component.style.clone(),
                inputs: component.inputs.clone(),
                events: component.events.clone(),
                editor_events: component.editor_events.clone(),
                source_id: component.source_id.clone(),
                children,
            },
        );
    }
    built
        .remove(id)
        .ok_or_else(|| ModelError::ComponentNotFound(id.to_string()))
}

/// Flat copy of a subtree in pre-order.
///
/// Each entry keeps its `parent_id` and `children`, so the list can be put
/// back with [`restore_components`] without rebuilding any nesting.
pub fn snapshot_components(context: &SiteContext, id: &str) -> ModelResult<Vec<Component>> {
    if !context.components.contains_key(id) {
        return Err(ModelError::ComponentNotFound(id.to_string()));
    }
    Ok(iter_subtree(context, id).cloned().collect())
}

/// Reinsert a flat snapshot. The first entry is the subtree root; it is
/// linked under its recorded parent at `index`.
pub fn restore_components(
    context: &mut SiteContext,
    nodes: &[Component],
    index: usize,
) -> ModelResult<()> {
    let Some(root) = nodes.first() else {
        return Ok(());
    };
    if let Some(id) = nodes
        .iter()
        .map(|node| &node.id)
        .find(|id| context.components.contains_key(*id))
    {
        return Err(ModelError::DuplicateId(id.clone()));
    }
    if let Some(parent_id) = &root.parent_id {
        let parent = context
            .component(parent_id)
            .ok_or_else(|| ModelError::ParentNotFound(parent_id.clone()))?;
        let len = parent.children.len();
        if index > len {
            return Err(ModelError::IndexOutOfBounds { index, len });
        }
    }

    for node in nodes {
        context.components.insert(node.id.clone(), node.clone());
    }
    if let Some(parent_id) = &root.parent_id {
        if let Some(parent) = context.component_mut(parent_id) {
            parent.children.insert(index, root.id.clone());
        }
    }
    Ok(())
}

/// Drop a subtree from the table. The root must already be detached.
pub fn remove_subtree(context: &mut SiteContext, id: &str) -> ModelResult<Vec<String>> {
    if !context.components.contains_key(id) {
        return Err(ModelError::ComponentNotFound(id.to_string()));
    }
    let mut removed = Vec::new();
    let mut stack = vec![id.to_string()];
    while let Some(next) = stack.pop() {
        if let Some(component) = context.components.remove(&next) {
            stack.extend(component.children.into_iter().rev());
            removed.push(next);
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Tag;

    fn context_with_root() -> SiteContext {
        let mut context = SiteContext::new("t");
        let root = id::component_id(&mut context);
        context
            .components
            .insert(root.clone(), Component::new(root, "Root", Tag::Div));
        context
    }

    #[test]
    fn test_insert_records_ids_and_reuses_them() {
        let mut context = context_with_root();
        let mut template = ComponentTemplate::new("Card", Tag::Div)
            .with_child(ComponentTemplate::new("Title", Tag::H2))
            .with_child(ComponentTemplate::new("Body", Tag::P));

        let id = insert_template(&mut context, &mut template, "t-c-0", None).unwrap();
        assert_eq!(id, "t-c-1");
        assert_eq!(template.ids(), vec!["t-c-1", "t-c-2", "t-c-3"]);
        assert_eq!(context.components["t-c-1"].children, vec!["t-c-2", "t-c-3"]);
        assert_eq!(
            context.components["t-c-3"].parent_id.as_deref(),
            Some("t-c-1")
        );

        detach_child(&mut context, "t-c-1").unwrap();
        remove_subtree(&mut context, "t-c-1").unwrap();
        let counter = context.next_id;

        insert_template(&mut context, &mut template, "t-c-0", None).unwrap();
        assert_eq!(context.next_id, counter);
        assert!(context.components.contains_key("t-c-3"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut context = context_with_root();
        let mut template = ComponentTemplate::new("List", Tag::Ul)
            .with_child(ComponentTemplate::new("A", Tag::Li).with_content("a"))
            .with_child(ComponentTemplate::new("B", Tag::Li).with_content("b"));
        let id = insert_template(&mut context, &mut template, "t-c-0", None).unwrap();

        let snapshot = snapshot_subtree(&context, &id).unwrap();
        assert_eq!(snapshot, template);
    }

    #[test]
    fn test_detach_and_cycle_checks() {
        let mut context = context_with_root();
        let mut template =
            ComponentTemplate::new("Outer", Tag::Div).with_child(ComponentTemplate::new("Inner", Tag::Div));
        insert_template(&mut context, &mut template, "t-c-0", None).unwrap();

        assert!(would_create_cycle(&context, "t-c-1", "t-c-2"));
        assert!(would_create_cycle(&context, "t-c-1", "t-c-1"));
        assert!(!would_create_cycle(&context, "t-c-2", "t-c-0"));

        assert!(matches!(
            detach_child(&mut context, "t-c-0"),
            Err(ModelError::NoParent(_))
        ));
        assert_eq!(
            detach_child(&mut context, "t-c-2").unwrap(),
            ("t-c-1".to_string(), 0)
        );
        assert!(matches!(
            attach_child(&mut context, "t-c-1", "t-c-2", Some(3)),
            Err(ModelError::IndexOutOfBounds { index: 3, len: 0 })
        ));
    }

    #[test]
    fn test_materialize_keeps_preorder_ids_and_child_order() {
        let mut context = context_with_root();
        let mut template = ComponentTemplate::new("Grid", Tag::Div)
            .with_child(
                ComponentTemplate::new("Row", Tag::Div)
                    .with_child(ComponentTemplate::new("A", Tag::Span))
                    .with_child(ComponentTemplate::new("B", Tag::Span)),
            )
            .with_child(ComponentTemplate::new("Footer", Tag::Footer));
        insert_template(&mut context, &mut template, "t-c-0", None).unwrap();

        assert_eq!(template.ids(), vec!["t-c-1", "t-c-2", "t-c-3", "t-c-4", "t-c-5"]);
        assert_eq!(context.components["t-c-1"].children, vec!["t-c-2", "t-c-5"]);
        assert_eq!(context.components["t-c-2"].children, vec!["t-c-3", "t-c-4"]);
        assert_eq!(context.components["t-c-5"].parent_id.as_deref(), Some("t-c-1"));
        assert_eq!(snapshot_subtree(&context, "t-c-1").unwrap(), template);
    }

    #[test]
    fn test_nested_template_walks_are_iterative() {
        let mut context = context_with_root();
        let mut template = ComponentTemplate::new("Leaf", Tag::Span);
        for _ in 0..500 {
            template = ComponentTemplate::new("Box", Tag::Div).with_child(template);
        }
        let id = insert_template(&mut context, &mut template, "t-c-0", None).unwrap();
        assert_eq!(context.components.len(), 502);

        let mut snapshot = snapshot_subtree(&context, &id).unwrap();
        assert_eq!(snapshot, template);
        snapshot.clear_ids();
        assert!(snapshot.ids().is_empty());
    }

    #[test]
    fn test_flat_snapshot_restores_deep_chain() {
        let mut context = context_with_root();
        let mut parent = "t-c-0".to_string();
        for _ in 0..20_000 {
            let mut t = ComponentTemplate::new("Box", Tag::Div);
            parent = insert_template(&mut context, &mut t, &parent, None).unwrap();
        }
        let before = context.clone();

        let nodes = snapshot_components(&context, "t-c-1").unwrap();
        assert_eq!(nodes.len(), 20_000);
        assert_eq!(nodes[0].parent_id.as_deref(), Some("t-c-0"));

        let (_, index) = detach_child(&mut context, "t-c-1").unwrap();
        remove_subtree(&mut context, "t-c-1").unwrap();
        assert_eq!(context.components.len(), 1);

        restore_components(&mut context, &nodes, index).unwrap();
        assert_eq!(context, before);
        assert!(matches!(
            restore_components(&mut context, &nodes, index),
            Err(ModelError::DuplicateId(_))
        ));
    }
}
