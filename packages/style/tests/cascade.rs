use sitebuilder_model::style::set_entry;
use sitebuilder_model::tree::insert_template;
use sitebuilder_model::{
    default_breakpoint_id, Breakpoint, BuiltinRegistry, ComponentTemplate, PseudoClass, Site,
    StyleEntry, StyleMixin, Tag,
};
use sitebuilder_style::{build_stylesheet, parse_flex, resolve_component_style, StyleResolver};

const MOBILE: &str = "demo-bp-1";

fn two_breakpoint_site() -> Site {
    let mut site = Site::new("Demo", "demo", "1");
    site.context.breakpoints.insert(
        MOBILE.to_string(),
        Breakpoint {
            id: MOBILE.to_string(),
            name: "Mobile".to_string(),
            min_width: None,
            max_width: Some(480),
        },
    );
    site.context.next_id = 2;
    site
}

fn add_mixin(site: &mut Site, id: &str, entries: &[StyleEntry]) {
    let mut mixin = StyleMixin {
        id: id.to_string(),
        name: id.to_string(),
        breakpoints: Default::default(),
    };
    for entry in entries {
        set_entry(&mut mixin.breakpoints, entry);
    }
    site.context.styles.insert(id.to_string(), mixin);
    site.context.style_order.push(id.to_string());
}

fn add_component(site: &mut Site, mut template: ComponentTemplate) -> String {
    let root = site.page("/").unwrap().root_id.clone();
    insert_template(&mut site.context, &mut template, &root, None).unwrap()
}

#[test]
fn test_mobile_exception_over_desktop_default() {
    let mut site = two_breakpoint_site();
    let desktop = default_breakpoint_id();
    add_mixin(
        &mut site,
        "demo-m-10",
        &[StyleEntry::new(desktop.clone(), PseudoClass::Default, "width", "100%")],
    );

    let mut template = ComponentTemplate::new("Panel", Tag::Div);
    template.style.mixins.push("demo-m-10".to_string());
    set_entry(
        &mut template.style.custom,
        &StyleEntry::new(MOBILE, PseudoClass::Default, "width", "50%"),
    );
    let id = add_component(&mut site, template);
    let builtins = BuiltinRegistry::new();

    let mobile = resolve_component_style(&site, &builtins, &id, MOBILE, PseudoClass::Default);
    assert_eq!(mobile.get("width").map(String::as_str), Some("50%"));

    let default = resolve_component_style(&site, &builtins, &id, &desktop, PseudoClass::Default);
    assert_eq!(default.get("width").map(String::as_str), Some("100%"));
}

#[test]
fn test_component_without_styles_resolves_empty() {
    let mut site = two_breakpoint_site();
    let id = add_component(&mut site, ComponentTemplate::new("Bare", Tag::Span));
    let builtins = BuiltinRegistry::with_defaults();

    let resolver = StyleResolver::new(&site, &builtins);
    assert!(resolver
        .resolve_component(&id, MOBILE, PseudoClass::Hover)
        .is_empty());
}

#[test]
fn test_custom_beats_mixin_at_same_breakpoint() {
    let mut site = two_breakpoint_site();
    let desktop = default_breakpoint_id();
    add_mixin(
        &mut site,
        "demo-m-11",
        &[
            StyleEntry::new(desktop.clone(), PseudoClass::Default, "color", "red"),
            StyleEntry::new(desktop.clone(), PseudoClass::Default, "margin", "0"),
        ],
    );

    let mut template = ComponentTemplate::new("Text", Tag::P);
    template.style.mixins.push("demo-m-11".to_string());
    set_entry(
        &mut template.style.custom,
        &StyleEntry::new(desktop.clone(), PseudoClass::Default, "color", "green"),
    );
    let id = add_component(&mut site, template);

    let style = resolve_component_style(
        &site,
        &BuiltinRegistry::new(),
        &id,
        MOBILE,
        PseudoClass::Default,
    );
    assert_eq!(style["color"], "green");
    assert_eq!(style["margin"], "0");
}

#[test]
fn test_resolver_mixin_lookup_matches_component_contribution() {
    let mut site = two_breakpoint_site();
    let builtins = BuiltinRegistry::with_defaults();
    let resolver = StyleResolver::new(&site, &builtins);

    let row = resolver.resolve_mixin("builtin-m-0", MOBILE, PseudoClass::Default);
    assert_eq!(row["flex-direction"], "row");
    assert!(resolver
        .resolve_mixin("elsewhere-m-0", MOBILE, PseudoClass::Default)
        .is_empty());

    let mut template = ComponentTemplate::new("Row", Tag::Div);
    template.style.mixins.push("builtin-m-0".to_string());
    let id = add_component(&mut site, template);
    assert_eq!(
        resolve_component_style(&site, &builtins, &id, MOBILE, PseudoClass::Default),
        row
    );
}

#[test]
fn test_stylesheet_places_media_rules_after_defaults() {
    let mut site = two_breakpoint_site();
    let desktop = default_breakpoint_id();
    add_mixin(
        &mut site,
        "demo-m-12",
        &[
            StyleEntry::new(MOBILE, PseudoClass::Default, "gap", "4px"),
            StyleEntry::new(desktop.clone(), PseudoClass::Default, "gap", "16px"),
        ],
    );

    let css = build_stylesheet(&site, &BuiltinRegistry::new()).to_css();
    let desktop_rule = css.find(".demo-m-12 {\n  gap: 16px;").unwrap();
    let mobile_rule = css.find("@media (max-width: 480px)").unwrap();
    assert!(desktop_rule < mobile_rule);
}

#[test]
fn test_flex_shorthand_examples() {
    let flex = parse_flex(Some("1 30px"));
    assert_eq!((flex.grow.as_str(), flex.shrink.as_str(), flex.basis.as_str()), ("1", "1", "30px"));

    let flex = parse_flex(Some("2 2"));
    assert_eq!((flex.grow.as_str(), flex.shrink.as_str(), flex.basis.as_str()), ("2", "2", "0"));

    let flex = parse_flex(None);
    assert_eq!((flex.grow.as_str(), flex.shrink.as_str(), flex.basis.as_str()), ("1", "1", "0"));
}
