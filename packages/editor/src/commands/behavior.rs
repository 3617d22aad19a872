//! User-authored behavior commands

use super::{recorded, CommandError, CommandOp, CommandResult};
use serde::{Deserialize, Serialize};
use sitebuilder_model::{id, Behavior, BehaviorArg, ModelError, Site};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorProps {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<BehaviorArg>,
}

impl BehaviorProps {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: BehaviorArg) -> Self {
        self.args.push(arg);
        self
    }

    fn of(behavior: &Behavior) -> Self {
        Self {
            name: behavior.name.clone(),
            code: behavior.code.clone(),
            args: behavior.args.clone(),
        }
    }

    fn into_behavior(self, id: String) -> Behavior {
        Behavior {
            id,
            name: self.name,
            code: self.code,
            args: self.args,
        }
    }
}

fn behavior_mut<'a>(site: &'a mut Site, behavior_id: &str) -> CommandResult<&'a mut Behavior> {
    site.context
        .behaviors
        .get_mut(behavior_id)
        .ok_or_else(|| CommandError::BehaviorNotFound(behavior_id.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBehavior {
    #[serde(flatten)]
    pub props: BehaviorProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_id: Option<String>,
}

impl AddBehavior {
    pub fn new(props: BehaviorProps) -> Self {
        Self {
            props,
            behavior_id: None,
        }
    }
}

impl CommandOp for AddBehavior {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let behavior_id = match &self.behavior_id {
            Some(existing) if site.context.behaviors.contains_key(existing) => {
                return Err(ModelError::DuplicateId(existing.clone()).into());
            }
            Some(existing) => existing.clone(),
            None => id::behavior_id(&mut site.context),
        };
        site.context.behaviors.insert(
            behavior_id.clone(),
            self.props.clone().into_behavior(behavior_id.clone()),
        );
        self.behavior_id = Some(behavior_id);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let behavior_id = recorded(&self.behavior_id, "AddBehavior", "behaviorId")?;
        site.context
            .behaviors
            .remove(behavior_id)
            .ok_or_else(|| CommandError::BehaviorNotFound(behavior_id.clone()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBehavior {
    pub behavior_id: String,
    pub new: BehaviorProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<BehaviorProps>,
}

impl EditBehavior {
    pub fn new(behavior_id: impl Into<String>, new: BehaviorProps) -> Self {
        Self {
            behavior_id: behavior_id.into(),
            new,
            old: None,
        }
    }
}

impl CommandOp for EditBehavior {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let behavior = behavior_mut(site, &self.behavior_id)?;
        self.old = Some(BehaviorProps::of(behavior));
        *behavior = self.new.clone().into_behavior(self.behavior_id.clone());
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let old = recorded(&self.old, "EditBehavior", "old")?;
        *behavior_mut(site, &self.behavior_id)? = old.clone().into_behavior(self.behavior_id.clone());
        Ok(())
    }

    fn can_merge(&self, next: &Self) -> bool {
        self.behavior_id == next.behavior_id
    }

    fn merge(&mut self, next: Self) {
        self.new = next.new;
    }
}

/// Delete a behavior. Event bindings that name it stay in place and resolve
/// to "not found" until it is restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBehavior {
    pub behavior_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<Behavior>,
}

impl RemoveBehavior {
    pub fn new(behavior_id: impl Into<String>) -> Self {
        Self {
            behavior_id: behavior_id.into(),
            removed: None,
        }
    }
}

impl CommandOp for RemoveBehavior {
    fn apply(&mut self, site: &mut Site) -> CommandResult<()> {
        let behavior = site
            .context
            .behaviors
            .remove(&self.behavior_id)
            .ok_or_else(|| CommandError::BehaviorNotFound(self.behavior_id.clone()))?;
        self.removed = Some(behavior);
        Ok(())
    }

    fn undo(&self, site: &mut Site) -> CommandResult<()> {
        let behavior = recorded(&self.removed, "RemoveBehavior", "removed")?;
        site.context
            .behaviors
            .insert(self.behavior_id.clone(), behavior.clone());
        Ok(())
    }
}
