use crate::paths;
use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// How the action buttons react to request outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Generate failures leave the form in Generating and cancel resets the
    /// buttons before its request settles.
    #[default]
    Legacy,
    /// Buttons only move once the request settles; failures enter Error.
    Settled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub transition_policy: TransitionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            transition_policy: TransitionPolicy::default(),
        }
    }
}

pub fn settings_path() -> Result<PathBuf> {
    paths::scoped_path(SETTINGS_FILE)
}

pub fn load_or_create_settings() -> Result<Settings> {
    load_or_create_at(&settings_path()?)
}

pub fn load_or_create_at(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        paths::write_json(path, &settings, "settings")?;
        return Ok(settings);
    }
    paths::read_json(path, "settings")
}
