//! Per-device view preferences.
//!
//! Boolean toggles persisted across sessions on the same device as a small
//! JSON file in the platform config directory. Read at mount, written on
//! toggle; a missing or corrupt file falls back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// View preference flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Show the edit/add button on the grid.
    pub show_edit_button: bool,
    /// Show the shared public list below the owned one.
    pub show_public_emojis: bool,
    /// Show the search box.
    pub show_search: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            show_edit_button: true,
            show_public_emojis: true,
            show_search: true,
        }
    }
}

impl Preferences {
    /// Default on-disk location, under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "panbanda", "emoji-deck")
            .map(|dirs| dirs.config_dir().join("preferences.json"))
    }

    /// Loads preferences from `path`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&data) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(path = %path.display(), %err, "corrupt preferences file, using defaults");
                Self::default()
            }
        }
    }

    /// Writes preferences to `path`, creating parent directories as needed.
    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).with_context(|| format!("writing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load(&dir.path().join("nope.json"));
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Preferences::load(&path), Preferences::default());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let prefs = Preferences {
            show_edit_button: false,
            show_public_emojis: true,
            show_search: false,
        };
        prefs.store(&path).unwrap();
        assert_eq!(Preferences::load(&path), prefs);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"show_search": false, "future_flag": 1}"#).unwrap();

        let prefs = Preferences::load(&path);
        assert!(!prefs.show_search);
        assert!(prefs.show_edit_button);
    }
}
