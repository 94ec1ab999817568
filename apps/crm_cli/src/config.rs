use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::Theme;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "crm.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub store_path: PathBuf,
    pub page_size: u32,
    pub search_debounce_ms: u64,
    pub theme: Theme,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".into(),
            store_path: default_store_path(),
            page_size: 10,
            search_debounce_ms: 300,
            theme: Theme::Dark,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn search_quiet_period(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mini_crm")
        .join("store.json")
}

/// Keys accepted in `crm.toml`. Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    store_path: Option<PathBuf>,
    page_size: Option<u32>,
    search_debounce_ms: Option<u64>,
    theme: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then the config file (if it exists), then `APP__*` environment
/// overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config '{}'", path.display()))?;
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileConfig = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.store_path {
        settings.store_path = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v.max(1);
    }
    if let Some(v) = file_cfg.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = file_cfg.theme {
        settings.theme = v.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

/// Environment values that fail to parse are ignored with a warning.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CRM_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("APP__STORE_PATH") {
        settings.store_path = PathBuf::from(v);
    }

    if let Some(v) = lookup("APP__PAGE_SIZE") {
        match v.trim().parse::<u32>() {
            Ok(parsed) => settings.page_size = parsed.max(1),
            Err(error) => warn!(value = %v, %error, "config: ignoring APP__PAGE_SIZE"),
        }
    }

    if let Some(v) = lookup("APP__SEARCH_DEBOUNCE_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.search_debounce_ms = parsed,
            Err(error) => warn!(value = %v, %error, "config: ignoring APP__SEARCH_DEBOUNCE_MS"),
        }
    }

    if let Some(v) = lookup("APP__THEME") {
        match v.parse::<Theme>() {
            Ok(theme) => settings.theme = theme,
            Err(error) => warn!(%error, "config: ignoring APP__THEME"),
        }
    }

    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
