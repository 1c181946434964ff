//! Application configuration.
//!
//! Loaded from a JSON file in the platform config directory, then overlaid
//! with `EMOJI_DECK_*` environment variables. Everything has a default
//! except the Firebase project settings, which the binary validates.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Firebase project holding the user documents.
    pub project_id: String,
    /// Identity Toolkit web API key.
    pub api_key: String,
    /// Identity owning the shared public list.
    pub public_list_user: String,
    /// Host serving the emoji images.
    pub cdn_host: String,
    /// Image size requested in copy URLs and CDN probes.
    pub copy_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            public_list_user: String::new(),
            cdn_host: "cdn.discordapp.com".to_string(),
            copy_size: 48,
        }
    }
}

impl Config {
    /// Default on-disk location, under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "panbanda", "emoji-deck")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "corrupt config file, using defaults");
                Self::default()
            }
        }
    }

    /// Applies environment overrides via the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary lookup, keyed by the
    /// `EMOJI_DECK_*` variable names.
    pub fn apply_overrides<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = get("EMOJI_DECK_PROJECT_ID") {
            self.project_id = value;
        }
        if let Some(value) = get("EMOJI_DECK_API_KEY") {
            self.api_key = value;
        }
        if let Some(value) = get("EMOJI_DECK_PUBLIC_LIST_USER") {
            self.public_list_user = value;
        }
        if let Some(value) = get("EMOJI_DECK_CDN_HOST") {
            self.cdn_host = value;
        }
        if let Some(value) = get("EMOJI_DECK_COPY_SIZE") {
            match value.parse() {
                Ok(size) => self.copy_size = size,
                Err(_) => warn!(value, "ignoring non-numeric EMOJI_DECK_COPY_SIZE"),
            }
        }
    }
}
