//! Two-tier id resolution.
//!
//! An id in the site's own namespace resolves against the site registries, an
//! id in [`BUILTIN_NAMESPACE`] against the [`BuiltinRegistry`]. Ids from any
//! other namespace are references to other documents, which are not resolved:
//! they come back as "not found".

use crate::breakpoint::Breakpoint;
use crate::component::{ComponentTemplate, Tag};
use crate::context::SiteContext;
use crate::id::{self, IdKind, BUILTIN_NAMESPACE};
use crate::site::default_breakpoint_id;
use crate::style::{set_entry, PseudoClass, StyleEntry, StyleMixin};
use crate::tree::snapshot_subtree;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScope {
    Local,
    Builtin,
    External,
}

pub fn id_scope(namespace: &str, id: &str) -> IdScope {
    match id::id_namespace(id) {
        Some(ns) if ns == namespace => IdScope::Local,
        Some(ns) if ns == BUILTIN_NAMESPACE => IdScope::Builtin,
        _ => IdScope::External,
    }
}

/// Mixins and reusable components shipped with the builder
#[derive(Debug, Clone, Default)]
pub struct BuiltinRegistry {
    pub mixins: BTreeMap<String, StyleMixin>,
    pub components: BTreeMap<String, ComponentTemplate>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_mixin(&mut self, mixin: StyleMixin) {
        self.mixins.insert(mixin.id.clone(), mixin);
    }

    pub fn register_component(&mut self, id: impl Into<String>, mut template: ComponentTemplate) {
        let id = id.into();
        template.id = Some(id.clone());
        self.components.insert(id, template);
    }

    /// Registry with the stock mixins and components
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let bp = default_breakpoint_id();
        let builtin = |kind, n: usize| id::format_id(BUILTIN_NAMESPACE, kind, &n.to_string());

        let stock_mixins: [(&str, &[(&str, &str)]); 3] = [
            ("Flex Row", &[("display", "flex"), ("flex-direction", "row")]),
            ("Flex Column", &[("display", "flex"), ("flex-direction", "column")]),
            ("Full Width", &[("width", "100%")]),
        ];
        for (n, (name, declarations)) in stock_mixins.iter().enumerate() {
            let mut mixin = StyleMixin {
                id: builtin(IdKind::Style, n),
                name: name.to_string(),
                breakpoints: BTreeMap::new(),
            };
            for (property, value) in declarations.iter() {
                set_entry(
                    &mut mixin.breakpoints,
                    &StyleEntry::new(bp.clone(), PseudoClass::Default, *property, *value),
                );
            }
            registry.register_mixin(mixin);
        }

        registry.register_component(
            builtin(IdKind::Component, 0),
            ComponentTemplate::new("Text", Tag::P).with_content("Text"),
        );
        registry.register_component(
            builtin(IdKind::Component, 1),
            ComponentTemplate::new("Container", Tag::Div),
        );
        registry.register_component(
            builtin(IdKind::Component, 2),
            ComponentTemplate::new("Button", Tag::Button).with_content("Button"),
        );
        registry.register_component(
            builtin(IdKind::Component, 3),
            ComponentTemplate::new("Image", Tag::Img),
        );

        registry
    }
}

pub fn resolve_mixin<'a>(
    context: &'a SiteContext,
    builtins: &'a BuiltinRegistry,
    mixin_id: &str,
) -> Option<&'a StyleMixin> {
    let found = match id_scope(&context.namespace, mixin_id) {
        IdScope::Local => context.styles.get(mixin_id),
        IdScope::Builtin => builtins.mixins.get(mixin_id),
        IdScope::External => None,
    };
    if found.is_none() {
        warn!(mixin_id, "Style mixin not found");
    }
    found
}

pub fn resolve_breakpoint<'a>(context: &'a SiteContext, breakpoint_id: &str) -> Option<&'a Breakpoint> {
    let found = context.breakpoints.get(breakpoint_id);
    if found.is_none() {
        warn!(breakpoint_id, "Breakpoint not found");
    }
    found
}

/// Deep copy of a reusable component (local subtree or builtin template)
pub fn resolve_reusable_component(
    context: &SiteContext,
    builtins: &BuiltinRegistry,
    component_id: &str,
) -> Option<ComponentTemplate> {
    let found = match id_scope(&context.namespace, component_id) {
        IdScope::Local => snapshot_subtree(context, component_id).ok(),
        IdScope::Builtin => builtins.components.get(component_id).cloned(),
        IdScope::External => None,
    };
    if found.is_none() {
        warn!(component_id, "Reusable component not found");
    }
    found
}

/// Fresh template for a new instance of a reusable component.
///
/// Ids are cleared (assigned when the add command applies) and the root is
/// linked back to its source.
pub fn instantiate_reusable(
    context: &SiteContext,
    builtins: &BuiltinRegistry,
    source_id: &str,
) -> Option<ComponentTemplate> {
    let mut template = resolve_reusable_component(context, builtins, source_id)?;
    template.clear_ids();
    template.source_id = Some(source_id.to_string());
    Some(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Site;
    use crate::tree::insert_template;

    #[test]
    fn test_id_scope() {
        assert_eq!(id_scope("shop", "shop-m-3"), IdScope::Local);
        assert_eq!(id_scope("shop", "builtin-m-0"), IdScope::Builtin);
        assert_eq!(id_scope("shop", "other-m-3"), IdScope::External);
        assert_eq!(id_scope("shop", "garbage"), IdScope::External);
    }

    #[test]
    fn test_resolve_mixin_two_tier() {
        let builtins = BuiltinRegistry::with_defaults();
        let mut context = SiteContext::new("shop");
        context.styles.insert(
            "shop-m-1".to_string(),
            StyleMixin {
                id: "shop-m-1".to_string(),
                name: "Local".to_string(),
                breakpoints: BTreeMap::new(),
            },
        );

        assert_eq!(
            resolve_mixin(&context, &builtins, "shop-m-1").unwrap().name,
            "Local"
        );
        assert_eq!(
            resolve_mixin(&context, &builtins, "builtin-m-0").unwrap().name,
            "Flex Row"
        );
        assert!(resolve_mixin(&context, &builtins, "shop-m-9").is_none());
        // Same local number under a foreign namespace stays unresolved
        assert!(resolve_mixin(&context, &builtins, "elsewhere-m-1").is_none());
    }

    #[test]
    fn test_instantiate_local_reusable() {
        let builtins = BuiltinRegistry::with_defaults();
        let mut site = Site::new("Demo", "demo", "1");
        let root = site.page("/").unwrap().root_id.clone();
        let mut card = ComponentTemplate::new("Card", Tag::Div)
            .with_child(ComponentTemplate::new("Title", Tag::H3).with_content("Card"));
        let card_id = insert_template(&mut site.context, &mut card, &root, None).unwrap();

        let instance = instantiate_reusable(&site.context, &builtins, &card_id).unwrap();
        assert_eq!(instance.id, None);
        assert_eq!(instance.children[0].id, None);
        assert_eq!(instance.source_id.as_deref(), Some(card_id.as_str()));
        assert_eq!(instance.children[0].content.as_deref(), Some("Card"));

        let builtin_text = instantiate_reusable(&site.context, &builtins, "builtin-c-0").unwrap();
        assert_eq!(builtin_text.tag, Tag::P);
        assert!(instantiate_reusable(&site.context, &builtins, "other-c-0").is_none());
    }
}
