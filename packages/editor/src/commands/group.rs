//! Several commands applied and undone as one step

use super::{Command, CommandOp, CommandResult};
use serde::{Deserialize, Serialize};
use sitebuilder_model::Site;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group {
    pub commands: Vec<Command>,
}

impl Group {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl CommandOp for Group {
    /// Members apply in order. If one fails, the members already applied are
    /// undone in reverse and the error is returned.
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        for index in 0..self.commands.len() {
            if let Err(error) = self.commands[index].apply(site) {
                for applied in self.commands[..index].iter().rev() {
                    if let Err(rollback) = applied.undo(site) {
                        warn!(command = applied.name(), %rollback, "Group rollback failed");
                    }
                }
                return Err(error);
            }
        }
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        for command in self.commands.iter().rev() {
            command.undo(site)?;
        }
        Ok(())
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.commands.len() == next.commands.len()
            && self
                .commands
                .iter()
                .zip(&next.commands)
                .all(|(a, b)| a.can_merge(b))
    }

    fn merge(&mut self, next: Self) {
        for (command, incoming) in self.commands.iter_mut().zip(next.commands) {
            command.merge(incoming);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandError, SetCustomStyle, StyleKey};
    use sitebuilder_model::{default_breakpoint_id, PseudoClass};

    fn position(component: &str, property: &str, value: &str) -> Command {
        SetCustomStyle::new(
            component,
            StyleKey::new(default_breakpoint_id(), PseudoClass::Default, property),
            Some(value.to_string()),
        )
        .into()
    }

    #[test]
    fn test_group_undo_matches_members_in_reverse() {
        let mut site = Site::new("Demo", "demo", "1");
        let root = site.page("/").unwrap().root_id.clone();
        let before = site.clone();

        let mut group = Command::group(vec![
            position(&root, "left", "10px"),
            position(&root, "top", "20px"),
        ]);
        group.apply(&mut site).unwrap();
        let custom = &site.context.component(&root).unwrap().style.custom;
        assert_eq!(custom[&default_breakpoint_id()][&PseudoClass::Default].len(), 2);

        group.undo(&mut site).unwrap();
        assert_eq!(site, before);
    }

    #[test]
    fn test_failed_member_rolls_back() {
        let mut site = Site::new("Demo", "demo", "1");
        let root = site.page("/").unwrap().root_id.clone();
        let before = site.clone();

        let mut group = Command::group(vec![
            position(&root, "left", "10px"),
            position("demo-c-404", "top", "20px"),
        ]);
        assert!(matches!(group.apply(&mut site), Err(CommandError::Model(_))));
        assert_eq!(site, before);
    }

    #[test]
    fn test_groups_merge_pairwise() {
        let drag = |x: &str, y: &str| {
            Group::new(vec![
                position("demo-c-0", "left", x),
                position("demo-c-0", "top", y),
            ])
        };
        let mut first = drag("1px", "1px");
        let second = drag("5px", "9px");
        assert!(first.can_merge(&second));
        first.merge(second.clone());
        assert_eq!(first, second);

        assert!(!first.can_merge(&Group::new(vec![position("demo-c-0", "left", "0")])));
    }
}
