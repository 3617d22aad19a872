//! # Edit Session
//!
//! One editor's hold on one site: the document and its history, the store it
//! persists to, the save debounce and the builtin registries used to resolve
//! styles and behaviors.
//!
//! Every change goes through the session so timestamps, history trimming and
//! save scheduling happen in one place. The history is updated before any
//! save is attempted, so undo is available as soon as `push` returns.

use crate::commands::Command;
use crate::config::EditorConfig;
use crate::document::SiteDocument;
use crate::errors::{EditorError, EditorResult};
use crate::history::AppendOutcome;
use crate::scheduler::SaveScheduler;
use crate::store::{is_stale, SiteStore, StoreError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sitebuilder_behavior::{dispatch_event, BuiltinBehaviors, DispatchReport, EventPhase, RuntimeState};
use sitebuilder_model::{default_breakpoint_id, BuiltinRegistry, PseudoClass, Site, StyleProperties};
use sitebuilder_style::{build_stylesheet, resolve_component_style, Stylesheet};
use tracing::{debug, info, warn};

pub struct EditSession<S: SiteStore> {
    document: SiteDocument,
    store: S,
    scheduler: SaveScheduler,
    registry: BuiltinRegistry,
    behaviors: BuiltinBehaviors,
    config: EditorConfig,
    /// `updated_at` of the copy last loaded from or written to the store
    last_synced_at: Option<DateTime<Utc>>,
    runtime: RuntimeState,
    restore_error: Option<StoreError>,
}

impl<S: SiteStore> EditSession<S> {
    /// Restore the stored site, or start a scratch one when there is none or
    /// it cannot be read.
    pub fn open(mut store: S, config: EditorConfig) -> EditorResult<Self> {
        store.initialize()?;
        let restored = store.restore(None);

        let document = match restored.document {
            Some(document) => {
                info!(site = %document.site.name, "Restored site");
                document
            }
            None => {
                if let Some(error) = &restored.error {
                    warn!(%error, "Restore failed, starting from scratch");
                }
                SiteDocument::scratch("Untitled", &config.namespace, &config.format_version)
            }
        };

        Ok(Self {
            last_synced_at: document.site.updated_at,
            runtime: RuntimeState::from_site(&document.site),
            scheduler: SaveScheduler::new(config.save_debounce()),
            registry: BuiltinRegistry::with_defaults(),
            behaviors: BuiltinBehaviors::with_defaults(),
            restore_error: restored.error,
            document,
            store,
            config,
        })
    }

    pub fn with_builtins(mut self, registry: BuiltinRegistry, behaviors: BuiltinBehaviors) -> Self {
        self.registry = registry;
        self.behaviors = behaviors;
        self
    }

    pub fn site(&self) -> &Site {
        &self.document.site
    }

    pub fn document(&self) -> &SiteDocument {
        &self.document
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn runtime(&self) -> &RuntimeState {
        &self.runtime
    }

    /// Why the stored site could not be used, when `open` fell back to scratch
    pub fn restore_error(&self) -> Option<&StoreError> {
        self.restore_error.as_ref()
    }

    pub fn is_save_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    fn changed(&mut self, schedule_save: bool) {
        let now = Utc::now();
        self.document.site.updated_at = Some(now);
        self.document.site.content_updated_at = Some(now);
        self.document.history.trim_to(self.config.max_history);
        if schedule_save {
            self.scheduler.mark_changed(now);
        }
    }

    pub fn push(&mut self, command: Command) -> EditorResult<()> {
        self.document.push(command)?;
        self.changed(true);
        Ok(())
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        let undone = self.document.undo()?;
        if undone {
            self.changed(true);
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        let redone = self.document.redo()?;
        if redone {
            self.changed(true);
        }
        Ok(redone)
    }

    pub fn group(&mut self, commands: Vec<Command>) -> EditorResult<()> {
        self.document.group(commands)?;
        self.changed(true);
        Ok(())
    }

    /// Coalescing push for continuous interactions. With `save` off the change
    /// is recorded but no save is scheduled, leaving it to the final call of
    /// the interaction.
    pub fn append_last_command(&mut self, command: Command, save: bool) -> EditorResult<AppendOutcome> {
        let outcome = self.document.append_last_command(command)?;
        self.changed(save);
        Ok(outcome)
    }

    /// Write the document if the debounce deadline has passed.
    ///
    /// Fails with [`EditorError::Stale`] instead of writing when another
    /// session saved in the meantime.
    pub fn poll_save(&mut self, now: DateTime<Utc>) -> EditorResult<bool> {
        if !self.scheduler.poll(now) {
            return Ok(false);
        }
        self.ensure_fresh()?;
        self.store.save(&self.document, false)?;
        self.last_synced_at = self.document.site.updated_at;
        debug!("Debounced save written");
        Ok(true)
    }

    /// Write the document now, dropping any pending debounced save
    pub fn save_now(&mut self) -> EditorResult<()> {
        self.scheduler.flush();
        self.ensure_fresh()?;
        self.store.save(&self.document, true)?;
        self.last_synced_at = self.document.site.updated_at;
        Ok(())
    }

    /// True when another session wrote to the store after this one last
    /// loaded or saved. Stale sessions must `reload` rather than save.
    pub fn check_stale(&self) -> EditorResult<bool> {
        Ok(is_stale(self.last_synced_at, self.store.last_write()?))
    }

    fn ensure_fresh(&self) -> EditorResult<()> {
        if self.check_stale()? {
            warn!("Stored site is newer than this session, refusing to save");
            return Err(EditorError::Stale);
        }
        Ok(())
    }

    /// Replace the local document with the stored one. History does not
    /// survive a reload unless it was stored.
    pub fn reload(&mut self) -> EditorResult<bool> {
        let key = self.last_synced_at.as_ref().map(crate::serializer::format_timestamp);
        let restored = self.store.restore(key.as_deref());
        if let Some(error) = restored.error {
            return Err(error.into());
        }
        let Some(document) = restored.document else {
            return Ok(false);
        };
        info!(site = %document.site.name, "Reloaded site from store");
        self.last_synced_at = document.site.updated_at;
        self.runtime = RuntimeState::from_site(&document.site);
        self.document = document;
        self.scheduler.flush();
        Ok(true)
    }

    fn active_breakpoint(&self) -> String {
        self.site()
            .editor
            .as_ref()
            .map(|e| e.active_breakpoint.clone())
            .unwrap_or_else(default_breakpoint_id)
    }

    fn active_pseudo_class(&self) -> PseudoClass {
        self.site()
            .editor
            .as_ref()
            .map(|e| e.active_pseudo_class)
            .unwrap_or_default()
    }

    /// Computed style of a component at the editor's active breakpoint and
    /// pseudo-class
    pub fn resolved_style(&self, component_id: &str) -> StyleProperties {
        resolve_component_style(
            self.site(),
            &self.registry,
            component_id,
            &self.active_breakpoint(),
            self.active_pseudo_class(),
        )
    }

    pub fn stylesheet(&self) -> Stylesheet {
        build_stylesheet(self.site(), &self.registry)
    }

    pub fn dispatch_event(
        &mut self,
        phase: EventPhase,
        component_id: &str,
        event_name: &str,
        event: &Value,
    ) -> EditorResult<DispatchReport> {
        let report = dispatch_event(
            &self.document.site,
            &self.behaviors,
            &mut self.runtime,
            phase,
            component_id,
            event_name,
            event,
        )?;
        Ok(report)
    }

    fn save_editor(&mut self) -> EditorResult<()> {
        let Some(editor) = &self.document.site.editor else {
            return Err(EditorError::NoEditorState);
        };
        match self.store.save_editor(editor) {
            Err(StoreError::NotInitialized) => {
                self.store.save(&self.document, true)?;
                self.last_synced_at = self.document.site.updated_at;
                Ok(())
            }
            other => Ok(other?),
        }
    }

    fn editor_mut(&mut self) -> EditorResult<&mut sitebuilder_model::EditorState> {
        self.document
            .site
            .editor
            .as_mut()
            .ok_or(EditorError::NoEditorState)
    }

    pub fn set_active_breakpoint(&mut self, breakpoint_id: &str) -> EditorResult<()> {
        if !self.site().context.breakpoints.contains_key(breakpoint_id) {
            return Err(EditorError::NotFound {
                kind: "breakpoint",
                id: breakpoint_id.to_string(),
            });
        }
        self.editor_mut()?.active_breakpoint = breakpoint_id.to_string();
        self.save_editor()
    }

    pub fn set_active_page(&mut self, route: &str) -> EditorResult<()> {
        if self.site().page(route).is_none() {
            return Err(EditorError::NotFound {
                kind: "page",
                id: route.to_string(),
            });
        }
        self.editor_mut()?.active_page = route.to_string();
        self.save_editor()
    }

    pub fn set_active_pseudo_class(&mut self, pseudo_class: PseudoClass) -> EditorResult<()> {
        self.editor_mut()?.active_pseudo_class = pseudo_class;
        self.save_editor()
    }
}
