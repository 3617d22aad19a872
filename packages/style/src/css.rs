//! Stylesheet emission.
//!
//! Every mixin, component and instance override becomes one rule per
//! (breakpoint, pseudo-class) pair it declares. Rules are grouped by
//! breakpoint from the widest to the narrowest so that narrower media queries
//! come later in the sheet and win.

use sitebuilder_model::traverse::{ancestors, iter_site};
use sitebuilder_model::{
    resolve_mixin, sorted_breakpoints, Breakpoint, BuiltinRegistry, PseudoClass, RawStyle, Site,
    StyleProperties,
};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use crate::resolver::is_instance_boundary;
use crate::theme::substitute_theme_variables;

/// CSS rule with selector and properties
#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: String,
    pub properties: StyleProperties,
    pub media_query: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<CssRule>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: CssRule) {
        self.rules.push(rule);
    }

    pub fn rules_for<'s>(&'s self, selector: &'s str) -> impl Iterator<Item = &'s CssRule> + 's {
        self.rules.iter().filter(move |r| r.selector == selector)
    }

    /// Convert to CSS text
    pub fn to_css(&self) -> String {
        let mut css = String::new();

        for rule in &self.rules {
            let indent = if rule.media_query.is_some() { "  " } else { "" };
            if let Some(media) = &rule.media_query {
                css.push_str(media);
                css.push_str(" {\n");
            }

            css.push_str(indent);
            css.push_str(&rule.selector);
            css.push_str(" {\n");
            for (key, value) in &rule.properties {
                css.push_str(indent);
                css.push_str("  ");
                css.push_str(key);
                css.push_str(": ");
                css.push_str(value);
                css.push_str(";\n");
            }
            css.push_str(indent);
            css.push_str("}\n");

            if rule.media_query.is_some() {
                css.push_str("}\n");
            }
            css.push('\n');
        }

        css
    }
}

struct StyleSource<'a> {
    selector: String,
    raw: &'a RawStyle,
}

#[instrument(skip(site, builtins), fields(site = %site.name))]
pub fn build_stylesheet(site: &Site, builtins: &BuiltinRegistry) -> Stylesheet {
    let context = &site.context;
    let mut sources = Vec::new();

    // Local mixins in emission order, then builtin mixins actually referenced
    for mixin_id in &context.style_order {
        if let Some(mixin) = context.styles.get(mixin_id) {
            sources.push(StyleSource {
                selector: format!(".{}", mixin.id),
                raw: &mixin.breakpoints,
            });
        }
    }
    let referenced: BTreeSet<&str> = context
        .components
        .values()
        .flat_map(|c| c.style.mixins.iter().map(String::as_str))
        .filter(|id| builtins.mixins.contains_key(*id))
        .collect();
    for mixin_id in referenced {
        if let Some(mixin) = resolve_mixin(context, builtins, mixin_id) {
            sources.push(StyleSource {
                selector: format!(".{}", mixin.id),
                raw: &mixin.breakpoints,
            });
        }
    }

    for component in iter_site(site) {
        sources.push(StyleSource {
            selector: format!("#{}", component.id),
            raw: &component.style.custom,
        });
    }

    for component in iter_site(site) {
        for instance in ancestors(context, &component.id).filter(|a| is_instance_boundary(context, a)) {
            if let Some(raw) = instance.style.overrides.get(&component.id) {
                sources.push(StyleSource {
                    selector: format!("#{} #{}", instance.id, component.id),
                    raw,
                });
            }
        }
    }

    let mut breakpoints: Vec<&Breakpoint> = sorted_breakpoints(&context.breakpoints);
    breakpoints.reverse();

    let mut sheet = Stylesheet::new();
    for bp in breakpoints {
        let media_query = bp.media_query();
        for source in &sources {
            let Some(pseudo_style) = source.raw.get(&bp.id) else {
                continue;
            };
            for (pseudo_class, properties) in pseudo_style {
                let properties: StyleProperties = properties
                    .iter()
                    .filter_map(|(k, v)| {
                        substitute_theme_variables(v, &context.theme).map(|v| (k.clone(), v))
                    })
                    .collect();
                if properties.is_empty() {
                    continue;
                }
                sheet.add_rule(CssRule {
                    selector: selector_with_pseudo(&source.selector, *pseudo_class),
                    properties,
                    media_query: media_query.clone(),
                });
            }
        }
    }

    debug!(rules = sheet.rules.len(), "Built stylesheet");
    sheet
}

fn selector_with_pseudo(selector: &str, pseudo_class: PseudoClass) -> String {
    format!("{}{}", selector, pseudo_class.selector_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitebuilder_model::style::set_entry;
    use sitebuilder_model::tree::insert_template;
    use sitebuilder_model::{default_breakpoint_id, ComponentTemplate, StyleEntry, Tag};

    #[test]
    fn test_rules_ordered_widest_first() {
        let mut site = Site::new("Demo", "demo", "1");
        site.context.breakpoints.insert(
            "demo-bp-9".to_string(),
            Breakpoint {
                id: "demo-bp-9".to_string(),
                name: "Mobile".to_string(),
                min_width: None,
                max_width: Some(480),
            },
        );
        let desktop = default_breakpoint_id();
        let root = site.page("/").unwrap().root_id.clone();

        let mut template = ComponentTemplate::new("Button", Tag::Button);
        template.style.mixins.push("builtin-m-2".to_string());
        for entry in [
            StyleEntry::new("demo-bp-9", PseudoClass::Default, "padding", "4px"),
            StyleEntry::new(desktop.clone(), PseudoClass::Default, "padding", "8px"),
            StyleEntry::new(desktop.clone(), PseudoClass::Hover, "color", "red"),
        ] {
            set_entry(&mut template.style.custom, &entry);
        }
        let id = insert_template(&mut site.context, &mut template, &root, None).unwrap();

        let sheet = build_stylesheet(&site, &BuiltinRegistry::with_defaults());
        let selectors: Vec<&str> = sheet.rules.iter().map(|r| r.selector.as_str()).collect();
        let own = format!("#{}", id);
        let hover = format!("#{}:hover", id);
        assert_eq!(
            selectors,
            vec![".builtin-m-2", own.as_str(), hover.as_str(), own.as_str()]
        );
        assert_eq!(sheet.rules[3].media_query.as_deref(), Some("@media (max-width: 480px)"));

        let css = sheet.to_css();
        assert!(css.contains("@media (max-width: 480px) {\n  #demo-c-1 {\n    padding: 4px;\n  }\n}"));
        assert!(css.contains(".builtin-m-2 {\n  width: 100%;\n}"));
    }
}
