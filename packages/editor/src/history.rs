//! # Command History
//!
//! Ordered log of applied commands with a cursor.
//!
//! ## Design
//!
//! - `commands[..cursor]` are applied, `commands[cursor..]` are the redo tail
//! - Push applies the command, drops the redo tail and advances the cursor
//! - Undo reverses `commands[cursor - 1]` from its recorded data
//! - Redo re-applies `commands[cursor]`, reusing any ids it recorded
//! - A command that fails leaves both the site and the history untouched
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = CommandHistory::new();
//! history.push(AddComponent::new(root, template).into(), &mut site)?;
//! history.undo(&mut site)?;
//! history.redo(&mut site)?;
//! ```

use crate::commands::{Command, CommandResult};
use serde::{Deserialize, Serialize};
use sitebuilder_model::Site;
use tracing::debug;

/// What `append_last_command` did with the incoming command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Folded into the previous command
    Merged,
    /// Recorded as a new undo step
    Pushed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandHistory {
    #[serde(default)]
    commands: Vec<Command>,
    #[serde(default)]
    cursor: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a command and record it, discarding the redo tail
    pub fn push(&mut self, mut command: Command, site: &mut Site) -> CommandResult<()> {
        command.apply(site)?;
        debug!(command = command.name(), cursor = self.cursor, "Applied command");

        self.commands.truncate(self.cursor);
        self.commands.push(command);
        self.cursor = self.commands.len();
        Ok(())
    }

    /// Apply several commands as one undo step
    pub fn group(&mut self, commands: Vec<Command>, site: &mut Site) -> CommandResult<()> {
        self.push(Command::group(commands), site)
    }

    /// Apply a command, folding it into the most recent one when mergeable.
    ///
    /// Merging only happens when the previous command sits right below the
    /// cursor; after an undo the command is pushed normally.
    pub fn append_last_command(
        &mut self,
        mut command: Command,
        site: &mut Site,
    ) -> CommandResult<AppendOutcome> {
        let mergeable = self.cursor > 0
            && self.cursor == self.commands.len()
            && self.commands[self.cursor - 1].can_merge(&command);
        if !mergeable {
            self.push(command, site)?;
            return Ok(AppendOutcome::Pushed);
        }

        command.apply(site)?;
        let last = &mut self.commands[self.cursor - 1];
        debug!(command = last.name(), "Merged command into previous");
        last.merge(command);
        Ok(AppendOutcome::Merged)
    }

    /// Undo the most recent command. Returns false when there is nothing to undo.
    pub fn undo(&mut self, site: &mut Site) -> CommandResult<bool> {
        if self.cursor == 0 {
            return Ok(false);
        }
        let command = &self.commands[self.cursor - 1];
        command.undo(site)?;
        debug!(command = command.name(), "Undid command");
        self.cursor -= 1;
        Ok(true)
    }

    /// Re-apply the next undone command. Returns false when there is nothing to redo.
    pub fn redo(&mut self, site: &mut Site) -> CommandResult<bool> {
        let Some(command) = self.commands.get_mut(self.cursor) else {
            return Ok(false);
        };
        command.apply(site)?;
        debug!(command = command.name(), "Redid command");
        self.cursor += 1;
        Ok(true)
    }

    /// Drop the oldest commands beyond `max_levels` (0 = unlimited)
    pub fn trim_to(&mut self, max_levels: usize) {
        if max_levels == 0 || self.commands.len() <= max_levels {
            return;
        }
        let excess = self.commands.len() - max_levels;
        self.commands.drain(..excess);
        self.cursor = self.cursor.saturating_sub(excess);
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    pub fn undo_levels(&self) -> usize {
        self.cursor
    }

    pub fn redo_levels(&self) -> usize {
        self.commands.len() - self.cursor
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Most recently applied command
    pub fn last(&self) -> Option<&Command> {
        self.cursor.checked_sub(1).and_then(|i| self.commands.get(i))
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
    }
}
