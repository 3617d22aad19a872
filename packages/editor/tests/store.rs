//! File-backed store

use anyhow::Result;
use chrono::{TimeZone, Utc};
use sitebuilder_editor::{
    AddPage, EditSession, EditorConfig, FileSiteStore, SiteDocument, SiteStore, StoreError,
    FORMAT_VERSION,
};
use sitebuilder_model::{EditorState, PseudoClass};

#[test]
fn test_save_and_restore_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut store = FileSiteStore::new(dir.path().join("sites").join("shop.json"), FORMAT_VERSION);
    store.initialize()?;
    assert!(store.restore(None).document.is_none());

    let mut document = SiteDocument::scratch("Shop", "shop", FORMAT_VERSION);
    document.push(AddPage::new("Cart", "/cart").into())?;
    document.site.updated_at = Some(Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap());
    store.save(&document, true)?;

    let restored = store.restore(None);
    assert!(restored.error.is_none());
    assert_eq!(restored.document, Some(document.clone()));
    assert_eq!(store.last_write()?, document.site.updated_at);

    let unchanged = store.restore(Some("2024-02-02T10:00:00Z"));
    assert!(unchanged.document.is_none());
    Ok(())
}

#[test]
fn test_save_editor_rewrites_only_editor_state() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut store = FileSiteStore::new(dir.path().join("site.json"), FORMAT_VERSION);
    store.initialize()?;

    let mut editor = EditorState::new("/", "builtin-bp-0");
    assert!(matches!(store.save_editor(&editor), Err(StoreError::NotInitialized)));

    let document = SiteDocument::scratch("Shop", "shop", FORMAT_VERSION);
    store.save(&document, false)?;
    editor.active_pseudo_class = PseudoClass::Hover;
    store.save_editor(&editor)?;

    let restored = store.restore(None).document.unwrap();
    assert_eq!(restored.site.editor, Some(editor));
    assert_eq!(restored.site.pages, document.site.pages);
    Ok(())
}

#[test]
fn test_corrupt_file_reports_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("site.json");
    std::fs::write(&path, "not json")?;

    let store = FileSiteStore::new(&path, FORMAT_VERSION);
    let restored = store.restore(None);
    assert!(restored.document.is_none());
    assert!(matches!(restored.error, Some(StoreError::Json(_))));
    Ok(())
}

#[test]
fn test_session_over_file_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("site.json");

    let mut session = EditSession::open(FileSiteStore::new(&path, FORMAT_VERSION), EditorConfig::default())?;
    session.push(AddPage::new("About", "/about").into())?;
    session.save_now()?;
    drop(session);

    let reopened = EditSession::open(FileSiteStore::new(&path, FORMAT_VERSION), EditorConfig::default())?;
    assert!(reopened.site().page("/about").is_some());
    assert_eq!(reopened.document().history.undo_levels(), 1);
    Ok(())
}
