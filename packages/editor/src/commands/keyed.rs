//! Create / update / rename / delete of one entry in a string-keyed map.
//!
//! Which halves are present decides the operation:
//!
//! | old_val | new_val | effect                                   |
//! |---------|---------|------------------------------------------|
//! | none    | some    | create `new_key`                         |
//! | some    | none    | delete `old_key`                         |
//! | some    | some    | update, renaming when `new_key` differs  |
//!
//! `old_val` is overwritten with the value actually removed at apply time.
//! A present-but-null value (`"newVal": null`) is a JSON null value, not an
//! absent half.

use super::{CommandError, CommandResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "V: Deserialize<'de>"))]
pub struct KeyedValue<V> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_key: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub old_val: Option<V>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub new_val: Option<V>,
}

fn present<'de, D, V>(deserializer: D) -> Result<Option<V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    V::deserialize(deserializer).map(Some)
}

impl<V: Clone> KeyedValue<V> {
    pub fn create(key: impl Into<String>, value: V) -> Self {
        Self {
            old_key: None,
            new_key: Some(key.into()),
            old_val: None,
            new_val: Some(value),
        }
    }

    /// Replace the value under `key`. `old` is refreshed at apply time.
    pub fn update(key: impl Into<String>, old: V, new: V) -> Self {
        Self {
            old_key: Some(key.into()),
            new_key: None,
            old_val: Some(old),
            new_val: Some(new),
        }
    }

    pub fn rename(old_key: impl Into<String>, new_key: impl Into<String>, old: V, new: V) -> Self {
        Self {
            old_key: Some(old_key.into()),
            new_key: Some(new_key.into()),
            old_val: Some(old),
            new_val: Some(new),
        }
    }

    pub fn delete(key: impl Into<String>, old: V) -> Self {
        Self {
            old_key: Some(key.into()),
            new_key: None,
            old_val: Some(old),
            new_val: None,
        }
    }

    /// Key the existing entry lives under
    pub fn lookup_key(&self) -> Option<&str> {
        self.old_key.as_deref().or(self.new_key.as_deref())
    }

    /// Key the new value is written to
    pub fn target_key(&self) -> Option<&str> {
        self.new_key.as_deref().or(self.old_key.as_deref())
    }

    fn key_for(&self, key: Option<&str>) -> CommandResult<String> {
        key.map(str::to_string)
            .ok_or(CommandError::missing("KeyedValue", "key"))
    }

    pub fn apply_to(&mut self, map: &mut BTreeMap<String, V>) -> CommandResult<()> {
        let lookup = self.key_for(self.lookup_key())?;
        let target = self.key_for(self.target_key())?;

        let renaming = self.old_val.is_some() && lookup != target;
        if self.old_val.is_some() && !map.contains_key(&lookup) {
            return Err(CommandError::KeyNotFound(lookup));
        }
        if self.new_val.is_some() && (self.old_val.is_none() || renaming) && map.contains_key(&target) {
            return Err(CommandError::KeyExists(target));
        }

        if self.old_val.is_some() {
            self.old_val = map.remove(&lookup);
        }
        if let Some(value) = &self.new_val {
            map.insert(target, value.clone());
        }
        Ok(())
    }

    pub fn undo_on(&self, map: &mut BTreeMap<String, V>) -> CommandResult<()> {
        let lookup = self.key_for(self.lookup_key())?;
        let target = self.key_for(self.target_key())?;

        if self.new_val.is_some() && map.remove(&target).is_none() {
            return Err(CommandError::KeyNotFound(target));
        }
        if let Some(value) = &self.old_val {
            map.insert(lookup, value.clone());
        }
        Ok(())
    }

    pub fn can_merge(&self, next: &Self) -> bool {
        self.new_val.is_some() && next.old_val.is_some() && next.lookup_key() == self.target_key()
    }

    /// Keep our old half, take `next`'s new half
    pub fn merge(&mut self, next: Self) {
        self.new_key = next.target_key().map(str::to_string);
        self.new_val = next.new_val;
    }
}
