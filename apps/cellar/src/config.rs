use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use client_core::{FileTokenStore, DEFAULT_API_URL};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "cellar.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub token_file: Option<PathBuf>,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            token_file: None,
            request_timeout_seconds: 30,
        }
    }
}

/// Keys accepted in `cellar.toml`. Everything is optional.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    token_file: Option<PathBuf>,
    request_timeout_seconds: Option<u64>,
}

impl Settings {
    /// Where the access token lives: the configured file, else the platform data dir.
    pub fn token_path(&self) -> anyhow::Result<PathBuf> {
        self.token_file
            .clone()
            .or_else(FileTokenStore::default_path)
            .ok_or_else(|| anyhow!("no local data directory available; pass --token-file"))
    }
}

/// Defaults, then the TOML file at `path` (if present), then the environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with_env(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with_env(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            if let Some(v) = file_cfg.api_url {
                settings.api_url = v;
            }
            if let Some(v) = file_cfg.token_file {
                settings.token_file = Some(v);
            }
            match file_cfg.request_timeout_seconds {
                Some(v) if v > 0 => settings.request_timeout_seconds = v,
                Some(v) => warn!(
                    value = v,
                    path = %path.display(),
                    "config: ignoring invalid request_timeout_seconds"
                ),
                None => {}
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    if let Some(v) = env("CELLAR_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("CELLAR_TOKEN_FILE") {
        settings.token_file = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__TOKEN_FILE") {
        settings.token_file = Some(PathBuf::from(v));
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECONDS") {
        match v.parse::<u64>() {
            Ok(parsed) if parsed > 0 => settings.request_timeout_seconds = parsed,
            _ => warn!(value = %v, "config: ignoring invalid APP__REQUEST_TIMEOUT_SECONDS"),
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
