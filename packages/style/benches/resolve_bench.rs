//! Style resolution benchmarks
//!
//! Target: resolve every component of a 1000-node page in <5ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sitebuilder_model::style::set_entry;
use sitebuilder_model::tree::insert_template;
use sitebuilder_model::{
    default_breakpoint_id, Breakpoint, BuiltinRegistry, ComponentTemplate, PseudoClass, Site,
    StyleEntry, Tag,
};
use sitebuilder_style::{build_stylesheet, StyleResolver};

const MOBILE: &str = "bench-bp-1000000";

fn generate_site(num_sections: usize) -> (Site, Vec<String>) {
    let mut site = Site::new("Bench", "bench", "1");
    site.context.breakpoints.insert(
        MOBILE.to_string(),
        Breakpoint {
            id: MOBILE.to_string(),
            name: "Mobile".to_string(),
            min_width: None,
            max_width: Some(480),
        },
    );
    site.context
        .theme
        .variables
        .insert("accent".to_string(), "#3366ff".to_string());

    let desktop = default_breakpoint_id();
    let root = site.page("/").unwrap().root_id.clone();
    let mut ids = Vec::new();

    for i in 0..num_sections {
        let mut card = ComponentTemplate::new(format!("Card{}", i), Tag::Section);
        card.style.mixins.push("builtin-m-1".to_string());
        card.source_id = Some("builtin-c-1".to_string());
        for n in 0..8 {
            let mut child = ComponentTemplate::new(format!("Item{}", n), Tag::P).with_content("text");
            set_entry(
                &mut child.style.custom,
                &StyleEntry::new(desktop.clone(), PseudoClass::Default, "color", "${accent}"),
            );
            set_entry(
                &mut child.style.custom,
                &StyleEntry::new(MOBILE, PseudoClass::Default, "font-size", "12px"),
            );
            set_entry(
                &mut child.style.custom,
                &StyleEntry::new(desktop.clone(), PseudoClass::Hover, "color", "black"),
            );
            card = card.with_child(child);
        }
        insert_template(&mut site.context, &mut card, &root, None).unwrap();
        ids.extend(card.ids());
    }

    (site, ids)
}

fn resolve_all_components(c: &mut Criterion) {
    let (site, ids) = generate_site(110);
    let builtins = BuiltinRegistry::with_defaults();

    c.bench_function("resolve_1000_components_mobile_hover", |b| {
        b.iter(|| {
            let resolver = StyleResolver::new(&site, &builtins);
            for id in &ids {
                black_box(resolver.resolve_component(id, MOBILE, PseudoClass::Hover));
            }
        })
    });
}

fn emit_stylesheet(c: &mut Criterion) {
    let (site, _) = generate_site(110);
    let builtins = BuiltinRegistry::with_defaults();

    c.bench_function("build_stylesheet_1000_components", |b| {
        b.iter(|| build_stylesheet(black_box(&site), &builtins).to_css())
    });
}

criterion_group!(benches, resolve_all_components, emit_stylesheet);
criterion_main!(benches);
