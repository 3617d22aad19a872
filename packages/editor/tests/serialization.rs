//! Stored record format and restore fallbacks

use chrono::{TimeZone, Utc};
use sitebuilder_editor::{
    deserialize_document, restore_or_scratch, serialize_document, AddComponent, AddPage,
    RemoveComponent, SerializeError, SetCustomComponent, SiteDocument, StoredSite,
    FORMAT_VERSION,
};
use sitebuilder_model::tree::insert_template;
use sitebuilder_model::{ComponentTemplate, Tag};

fn edited_document() -> SiteDocument {
    let mut document = SiteDocument::scratch("Shop", "shop", FORMAT_VERSION);
    let root = document.site.page("/").unwrap().root_id.clone();
    let card = ComponentTemplate::new("Card", Tag::Div).with_child(ComponentTemplate::new("Price", Tag::Span));
    document.push(AddComponent::new(root, card).into()).unwrap();
    document
        .push(SetCustomComponent::new("shop-c-1", true).into())
        .unwrap();
    document.push(AddPage::new("Cart", "/cart").into()).unwrap();

    document.site.updated_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap());
    document.site.content_updated_at = document.site.updated_at;
    document.site.preview_id = Some("preview-7".to_string());
    document
}

#[test]
fn test_document_round_trips_through_stored_record() {
    let document = edited_document();
    let stored = serialize_document(&document).unwrap();

    let json = serde_json::to_string(&stored).unwrap();
    let reread: StoredSite = serde_json::from_str(&json).unwrap();
    let restored = deserialize_document(&reread, FORMAT_VERSION).unwrap();

    assert_eq!(restored, document);
    assert!(restored.site.context.custom_children.contains("shop-c-2"));
    assert_eq!(restored.history.undo_levels(), 3);
}

#[test]
fn test_stored_record_shape() {
    let stored = serialize_document(&edited_document()).unwrap();
    let value = serde_json::to_value(&stored).unwrap();

    for field in ["name", "version", "defaults", "context", "pages", "pageOrder", "editor", "history"] {
        assert!(value[field].is_string(), "{} should be a string", field);
    }
    assert_eq!(value["updated_at"], "2024-06-01T09:30:00Z");
    assert_eq!(value["preview_id"], "preview-7");

    let order: Vec<String> = serde_json::from_str(&stored.page_order).unwrap();
    assert_eq!(order, vec!["/", "/cart"]);
}

#[test]
fn test_sets_are_stored_as_arrays() {
    let stored = serialize_document(&edited_document()).unwrap();
    let context: serde_json::Value = serde_json::from_str(&stored.context).unwrap();
    assert_eq!(context["customComponents"], serde_json::json!(["shop-c-1"]));
}

#[test]
fn test_restored_history_can_undo() {
    let stored = serialize_document(&edited_document()).unwrap();
    let mut restored = deserialize_document(&stored, FORMAT_VERSION).unwrap();

    assert!(restored.undo().unwrap());
    assert!(restored.site.page("/cart").is_none());
    assert!(restored.undo().unwrap());
    assert!(restored.site.context.custom_components.is_empty());
}

#[test]
fn test_version_mismatch_falls_back_to_scratch() {
    let mut stored = serialize_document(&edited_document()).unwrap();
    stored.version = "0".to_string();

    let (document, error) = restore_or_scratch(Some(&stored), FORMAT_VERSION, "site");
    assert!(matches!(error, Some(SerializeError::VersionMismatch { .. })));
    assert_eq!(document.site.name, "Shop");
    assert_eq!(document.site.version, FORMAT_VERSION);
    assert_eq!(document.site.context.components.len(), 1);
    assert!(!document.history.can_undo());
}

#[test]
fn test_nothing_stored_gives_scratch() {
    let (document, error) = restore_or_scratch(None, FORMAT_VERSION, "site");
    assert!(error.is_none());
    assert_eq!(document.site.context.namespace, "site");
    assert_eq!(document.site.page_order, vec!["/"]);
}

#[test]
fn test_deep_removed_subtree_round_trips() {
    let mut document = SiteDocument::scratch("Deep", "deep", FORMAT_VERSION);
    let root = document.site.page("/").unwrap().root_id.clone();
    let mut parent = root.clone();
    for _ in 0..2_000 {
        let mut t = ComponentTemplate::new("Box", Tag::Div);
        parent = insert_template(&mut document.site.context, &mut t, &parent, None).unwrap();
    }
    let top = document.site.context.component(&root).unwrap().children[0].clone();
    document.push(RemoveComponent::new(top.clone()).into()).unwrap();

    let stored = serialize_document(&document).unwrap();
    let json = serde_json::to_string(&stored).unwrap();
    let reread: StoredSite = serde_json::from_str(&json).unwrap();
    let mut restored = deserialize_document(&reread, FORMAT_VERSION).unwrap();
    assert_eq!(restored, document);

    assert!(restored.undo().unwrap());
    assert_eq!(restored.site.context.components.len(), 2_001);
    assert!(restored.site.context.component(&parent).is_some());
}
