use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

use crate::i18n::Locale;

pub const DEFAULT_CONFIG_FILE: &str = "collections.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub request_timeout: Duration,
    pub locale: Locale,
    /// Directory the save dialog starts in; the store's suggested file
    /// name is used as-is when unset.
    pub default_export_dir: Option<PathBuf>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            locale: Locale::EnUs,
            default_export_dir: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    request_timeout_ms: Option<u64>,
    locale: Option<String>,
    export_dir: Option<PathBuf>,
}

/// Loads configuration from `path` (or `collections.toml` in the working
/// directory) and applies `APP__*` environment overrides.
///
/// An explicit path that cannot be read is an error; a missing default
/// file is not.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ControllerConfig> {
    let mut config = ControllerConfig::default();

    let file_cfg = match path {
        Some(path) => Some(read_file_config(path)?),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Some(read_file_config(default_path)?)
            } else {
                None
            }
        }
    };

    if let Some(file_cfg) = file_cfg {
        if let Some(ms) = file_cfg.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(locale) = file_cfg.locale {
            config.locale = locale
                .parse()
                .with_context(|| format!("invalid locale in configuration: '{locale}'"))?;
        }
        if let Some(dir) = file_cfg.export_dir {
            config.default_export_dir = Some(dir);
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn read_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse configuration file '{}'", path.display()))
}

fn apply_env_overrides(config: &mut ControllerConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__REQUEST_TIMEOUT_MS") {
        match v.parse::<u64>() {
            Ok(ms) => config.request_timeout = Duration::from_millis(ms),
            Err(_) => tracing::warn!(value = %v, "ignoring unparseable APP__REQUEST_TIMEOUT_MS"),
        }
    }
    if let Some(v) = var("APP__LOCALE") {
        match v.parse::<Locale>() {
            Ok(locale) => config.locale = locale,
            Err(err) => tracing::warn!("ignoring APP__LOCALE: {err}"),
        }
    }
    if let Some(v) = var("APP__EXPORT_DIR") {
        if !v.trim().is_empty() {
            config.default_export_dir = Some(PathBuf::from(v));
        }
    }
}
