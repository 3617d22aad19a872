//! Editor configuration (`sitebuilder.config.json`)

use crate::errors::EditorResult;
use crate::serializer::FORMAT_VERSION;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "sitebuilder.config.json";

fn default_namespace() -> String {
    "site".to_string()
}

fn default_save_debounce_ms() -> u64 {
    1000
}

fn default_format_version() -> String {
    FORMAT_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Namespace for ids minted in new sites
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Undo levels kept (0 = unlimited)
    #[serde(default)]
    pub max_history: usize,

    /// Quiet period before a pending save is written
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,

    #[serde(default = "default_format_version")]
    pub format_version: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            max_history: 0,
            save_debounce_ms: default_save_debounce_ms(),
            format_version: default_format_version(),
        }
    }
}

impl EditorConfig {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_CONFIG_NAME)
    }

    /// Load from `dir`, falling back to defaults when no config file exists
    pub fn load(dir: &Path) -> EditorResult<Self> {
        let path = Self::path_in(dir);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, dir: &Path) -> EditorResult<()> {
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(Self::path_in(dir), json)?;
        Ok(())
    }

    pub fn save_debounce(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.save_debounce_ms as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.namespace, "site");
        assert_eq!(config.save_debounce_ms, 1000);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "namespace": "acme", "maxHistory": 50 }"#,
        )
        .unwrap();

        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config.namespace, "acme");
        assert_eq!(config.max_history, 50);
        assert_eq!(config.save_debounce_ms, 1000);
        assert_eq!(config.format_version, FORMAT_VERSION);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig {
            save_debounce_ms: 250,
            ..EditorConfig::default()
        };
        config.save(dir.path()).unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap(), config);
    }
}
