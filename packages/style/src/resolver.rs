//! # Style Resolution
//!
//! Computes the flat property map a component renders with at a given
//! breakpoint and pseudo-class.
//!
//! ## Precedence (later wins, per property)
//!
//! 1. Mixins, in the component's mixin-list order
//! 2. The component's own custom style
//! 3. Override styles set on enclosing custom-component instances, nearest
//!    instance first so that the outermost instance has the last word
//!
//! Every layer is flattened with the same cascade: breakpoints from the widest
//! down to the active one, so declarations made for a wider breakpoint stay in
//! effect on narrower ones unless redeclared. The active pseudo-class is
//! accumulated separately and laid over the default declarations.
//!
//! Resolution never fails. Missing mixins, breakpoints or theme variables are
//! logged and skipped.

use sitebuilder_model::traverse::ancestors;
use sitebuilder_model::{
    default_breakpoint, resolve_mixin, sorted_breakpoints, Breakpoint, BuiltinRegistry, Component,
    PseudoClass, RawStyle, Site, SiteContext, StyleProperties,
};
use tracing::{debug, instrument, warn};

use crate::theme::substitute_theme_variables;

pub struct StyleResolver<'a> {
    site: &'a Site,
    builtins: &'a BuiltinRegistry,
}

impl<'a> StyleResolver<'a> {
    pub fn new(site: &'a Site, builtins: &'a BuiltinRegistry) -> Self {
        Self { site, builtins }
    }

    /// Breakpoints in effect at `active_id`, widest first, ending with the active one.
    ///
    /// An unknown id falls back to the catch-all breakpoint.
    pub fn cascade(&self, active_id: &str) -> Vec<&'a Breakpoint> {
        let breakpoints = &self.site.context.breakpoints;
        let sorted = sorted_breakpoints(breakpoints);

        let active = match breakpoints.get(active_id) {
            Some(bp) => bp,
            None => {
                warn!(breakpoint_id = active_id, "Active breakpoint not found, using default");
                match default_breakpoint(breakpoints) {
                    Some(bp) => bp,
                    None => return Vec::new(),
                }
            }
        };

        let start = sorted
            .iter()
            .position(|bp| bp.id == active.id)
            .unwrap_or(0);
        sorted[start..].iter().rev().copied().collect()
    }

    /// Flatten one raw style through the cascade
    pub fn flatten(
        &self,
        raw: &RawStyle,
        cascade: &[&Breakpoint],
        pseudo_class: PseudoClass,
    ) -> StyleProperties {
        let mut default_acc = StyleProperties::new();
        let mut pseudo_acc = StyleProperties::new();

        for bp in cascade {
            let Some(pseudo_style) = raw.get(&bp.id) else {
                continue;
            };
            if let Some(props) = pseudo_style.get(&PseudoClass::Default) {
                default_acc.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            if !pseudo_class.is_default() {
                if let Some(props) = pseudo_style.get(&pseudo_class) {
                    pseudo_acc.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        default_acc.extend(pseudo_acc);
        default_acc
    }

    pub fn resolve_mixin(
        &self,
        mixin_id: &str,
        breakpoint_id: &str,
        pseudo_class: PseudoClass,
    ) -> StyleProperties {
        let cascade = self.cascade(breakpoint_id);
        match resolve_mixin(&self.site.context, self.builtins, mixin_id) {
            Some(mixin) => self.substitute(self.flatten(&mixin.breakpoints, &cascade, pseudo_class)),
            None => StyleProperties::new(),
        }
    }

    /// Final style for a component
    pub fn resolve_component(
        &self,
        component_id: &str,
        breakpoint_id: &str,
        pseudo_class: PseudoClass,
    ) -> StyleProperties {
        let context = &self.site.context;
        let Some(component) = context.component(component_id) else {
            warn!(component_id, "Component not found while resolving style");
            return StyleProperties::new();
        };

        let cascade = self.cascade(breakpoint_id);
        let mut resolved = StyleProperties::new();

        for mixin_id in &component.style.mixins {
            if let Some(mixin) = resolve_mixin(context, self.builtins, mixin_id) {
                resolved.extend(self.flatten(&mixin.breakpoints, &cascade, pseudo_class));
            }
        }

        resolved.extend(self.flatten(&component.style.custom, &cascade, pseudo_class));

        for instance in ancestors(context, component_id).filter(|a| is_instance_boundary(context, a)) {
            if let Some(raw) = instance.style.overrides.get(component_id) {
                debug!(component_id, instance = %instance.id, "Applying override style");
                resolved.extend(self.flatten(raw, &cascade, pseudo_class));
            }
        }

        self.substitute(resolved)
    }

    fn substitute(&self, properties: StyleProperties) -> StyleProperties {
        let theme = &self.site.context.theme;
        properties
            .into_iter()
            .filter_map(|(property, value)| {
                substitute_theme_variables(&value, theme).map(|value| (property, value))
            })
            .collect()
    }
}

/// Root of a custom component, or an instance of a reusable one
pub fn is_instance_boundary(context: &SiteContext, component: &Component) -> bool {
    component.source_id.is_some() || context.custom_components.contains(&component.id)
}

#[instrument(skip(site, builtins), fields(site = %site.name))]
pub fn resolve_component_style(
    site: &Site,
    builtins: &BuiltinRegistry,
    component_id: &str,
    breakpoint_id: &str,
    pseudo_class: PseudoClass,
) -> StyleProperties {
    StyleResolver::new(site, builtins).resolve_component(component_id, breakpoint_id, pseudo_class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitebuilder_model::style::set_entry;
    use sitebuilder_model::tree::insert_template;
    use sitebuilder_model::{default_breakpoint_id, ComponentTemplate, StyleEntry, StyleMixin, Tag};

    const MOBILE: &str = "demo-bp-100";
    const TABLET: &str = "demo-bp-101";

    fn site_with_breakpoints() -> Site {
        let mut site = Site::new("Demo", "demo", "1");
        for (id, name, max) in [(MOBILE, "Mobile", 480), (TABLET, "Tablet", 900)] {
            site.context.breakpoints.insert(
                id.to_string(),
                Breakpoint {
                    id: id.to_string(),
                    name: name.to_string(),
                    min_width: None,
                    max_width: Some(max),
                },
            );
        }
        site
    }

    fn add(site: &mut Site, template: ComponentTemplate) -> String {
        let root = site.page("/").unwrap().root_id.clone();
        let mut template = template;
        insert_template(&mut site.context, &mut template, &root, None).unwrap()
    }

    fn entry(bp: &str, pseudo: PseudoClass, prop: &str, value: &str) -> StyleEntry {
        StyleEntry::new(bp, pseudo, prop, value)
    }

    #[test]
    fn test_cascade_order() {
        let site = site_with_breakpoints();
        let builtins = BuiltinRegistry::new();
        let resolver = StyleResolver::new(&site, &builtins);

        let ids = |bps: Vec<&Breakpoint>| bps.iter().map(|b| b.id.clone()).collect::<Vec<_>>();
        assert_eq!(
            ids(resolver.cascade(MOBILE)),
            vec![default_breakpoint_id(), TABLET.to_string(), MOBILE.to_string()]
        );
        assert_eq!(ids(resolver.cascade(&default_breakpoint_id())), vec![default_breakpoint_id()]);
        assert_eq!(ids(resolver.cascade("nope")), vec![default_breakpoint_id()]);
    }

    #[test]
    fn test_mixin_default_and_custom_mobile() {
        let mut site = site_with_breakpoints();
        let builtins = BuiltinRegistry::new();
        let desktop = default_breakpoint_id();

        let mut mixin = StyleMixin {
            id: "demo-m-50".to_string(),
            name: "Wide".to_string(),
            breakpoints: RawStyle::new(),
        };
        set_entry(&mut mixin.breakpoints, &entry(&desktop, PseudoClass::Default, "width", "100%"));
        site.context.styles.insert(mixin.id.clone(), mixin);

        let mut template = ComponentTemplate::new("Box", Tag::Div);
        template.style.mixins.push("demo-m-50".to_string());
        set_entry(&mut template.style.custom, &entry(MOBILE, PseudoClass::Default, "width", "50%"));
        let id = add(&mut site, template);

        let at_mobile = resolve_component_style(&site, &builtins, &id, MOBILE, PseudoClass::Default);
        assert_eq!(at_mobile["width"], "50%");

        let at_desktop = resolve_component_style(&site, &builtins, &id, &desktop, PseudoClass::Default);
        assert_eq!(at_desktop["width"], "100%");

        let at_tablet = resolve_component_style(&site, &builtins, &id, TABLET, PseudoClass::Default);
        assert_eq!(at_tablet["width"], "100%");
    }

    #[test]
    fn test_pseudo_class_layers_over_default() {
        let mut site = site_with_breakpoints();
        let builtins = BuiltinRegistry::new();
        let desktop = default_breakpoint_id();

        let mut template = ComponentTemplate::new("Link", Tag::A);
        for e in [
            entry(&desktop, PseudoClass::Default, "color", "black"),
            entry(&desktop, PseudoClass::Hover, "color", "blue"),
            entry(MOBILE, PseudoClass::Default, "color", "gray"),
            entry(MOBILE, PseudoClass::Default, "padding", "4px"),
        ] {
            set_entry(&mut template.style.custom, &e);
        }
        let id = add(&mut site, template);

        // Hover declared on desktop still wins over the mobile default color
        let hover_mobile = resolve_component_style(&site, &builtins, &id, MOBILE, PseudoClass::Hover);
        assert_eq!(hover_mobile["color"], "blue");
        assert_eq!(hover_mobile["padding"], "4px");

        let plain_mobile = resolve_component_style(&site, &builtins, &id, MOBILE, PseudoClass::Default);
        assert_eq!(plain_mobile["color"], "gray");

        let focus_desktop = resolve_component_style(&site, &builtins, &id, &desktop, PseudoClass::Focus);
        assert_eq!(focus_desktop["color"], "black");
    }

    #[test]
    fn test_mixin_order_and_missing_mixin() {
        let mut site = site_with_breakpoints();
        let builtins = BuiltinRegistry::with_defaults();
        let desktop = default_breakpoint_id();

        let mut template = ComponentTemplate::new("Row", Tag::Div);
        // builtin-m-0 is a flex row, builtin-m-1 a flex column; the later one wins
        template.style.mixins = vec![
            "builtin-m-0".to_string(),
            "demo-m-404".to_string(),
            "builtin-m-1".to_string(),
        ];
        let id = add(&mut site, template);

        let style = resolve_component_style(&site, &builtins, &id, &desktop, PseudoClass::Default);
        assert_eq!(style["display"], "flex");
        assert_eq!(style["flex-direction"], "column");
    }

    #[test]
    fn test_override_applies_only_inside_instance() {
        let mut site = site_with_breakpoints();
        let builtins = BuiltinRegistry::new();
        let desktop = default_breakpoint_id();

        let mut card = ComponentTemplate::new("Card", Tag::Div)
            .with_child(ComponentTemplate::new("Title", Tag::H2));
        set_entry(
            &mut card.children[0].style.custom,
            &entry(&desktop, PseudoClass::Default, "color", "black"),
        );
        card.source_id = Some("builtin-c-1".to_string());
        let card_id = add(&mut site, card);
        let title_id = site.context.components[&card_id].children[0].clone();

        let mut override_style = RawStyle::new();
        set_entry(&mut override_style, &entry(&desktop, PseudoClass::Default, "color", "red"));
        site.context
            .component_mut(&card_id)
            .unwrap()
            .style
            .overrides
            .insert(title_id.clone(), override_style);

        let style = resolve_component_style(&site, &builtins, &title_id, &desktop, PseudoClass::Default);
        assert_eq!(style["color"], "red");

        // Without the instance link the card is an ordinary container
        site.context.component_mut(&card_id).unwrap().source_id = None;
        let style = resolve_component_style(&site, &builtins, &title_id, &desktop, PseudoClass::Default);
        assert_eq!(style["color"], "black");

        // Marking it custom makes it a boundary again
        site.context.custom_components.insert(card_id.clone());
        let style = resolve_component_style(&site, &builtins, &title_id, &desktop, PseudoClass::Default);
        assert_eq!(style["color"], "red");
    }

    #[test]
    fn test_theme_placeholders() {
        let mut site = site_with_breakpoints();
        let builtins = BuiltinRegistry::new();
        let desktop = default_breakpoint_id();
        site.context
            .theme
            .variables
            .insert("brand".to_string(), "#123456".to_string());

        let mut template = ComponentTemplate::new("Logo", Tag::Span);
        set_entry(&mut template.style.custom, &entry(&desktop, PseudoClass::Default, "color", "${brand}"));
        set_entry(
            &mut template.style.custom,
            &entry(&desktop, PseudoClass::Default, "background", "${unknown}"),
        );
        let id = add(&mut site, template);

        let style = resolve_component_style(&site, &builtins, &id, &desktop, PseudoClass::Default);
        assert_eq!(style["color"], "#123456");
        assert!(!style.contains_key("background"));
    }

    #[test]
    fn test_unknown_component_is_empty() {
        let site = site_with_breakpoints();
        let builtins = BuiltinRegistry::new();
        let style = resolve_component_style(&site, &builtins, "demo-c-999", MOBILE, PseudoClass::Default);
        assert!(style.is_empty());
    }
}
