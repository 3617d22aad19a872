//! # Site Document
//!
//! A site together with the history of commands applied to it.
//!
//! ## Lifecycle
//!
//! ```text
//! Restore / Scratch → Push / Undo / Redo → Serialize → Save
//!        ↓                    ↓                ↓
//!   StoredSite           CommandHistory    StoredSite
//! ```

use crate::commands::{Command, CommandResult};
use crate::history::{AppendOutcome, CommandHistory};
use serde::{Deserialize, Serialize};
use sitebuilder_model::Site;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDocument {
    pub site: Site,
    #[serde(default)]
    pub history: CommandHistory,
}

impl SiteDocument {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            history: CommandHistory::new(),
        }
    }

    /// Blank document used when nothing can be restored
    pub fn scratch(name: &str, namespace: &str, version: &str) -> Self {
        Self::new(Site::new(name, namespace, version))
    }

    pub fn push(&mut self, command: Command) -> CommandResult<()> {
        self.history.push(command, &mut self.site)
    }

    pub fn undo(&mut self) -> CommandResult<bool> {
        self.history.undo(&mut self.site)
    }

    pub fn redo(&mut self) -> CommandResult<bool> {
        self.history.redo(&mut self.site)
    }

    pub fn group(&mut self, commands: Vec<Command>) -> CommandResult<()> {
        self.history.group(commands, &mut self.site)
    }

    pub fn append_last_command(&mut self, command: Command) -> CommandResult<AppendOutcome> {
        self.history.append_last_command(command, &mut self.site)
    }
}
