use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use tma_core::config::resolve_api_key;
use tma_core::config::API_KEY_VAR;
use tma_core::Config;

pub const APP_DIR: &str = "tma";
const CONFIG_FILE: &str = "config.toml";
const SECRETS_FILE: &str = "secrets.toml";
const LOG_FILE: &str = "tma.log";

/// Everything resolved at startup, before any session exists.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub api_key: Option<String>,
    pub config_path: Option<PathBuf>,
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

pub fn log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join(LOG_FILE))
}

/// Loads config from `explicit` or the default location, then resolves the
/// API key from the environment or the `secrets.toml` beside the config.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let base_dir = match explicit {
        Some(path) => path.parent().map(Path::to_path_buf),
        None => config_dir(),
    };
    let config_path = explicit
        .map(Path::to_path_buf)
        .or_else(|| base_dir.as_ref().map(|dir| dir.join(CONFIG_FILE)));

    let config = match &config_path {
        Some(path) if explicit.is_some() || path.exists() => read_config(path)?,
        _ => Config::default(),
    };

    let secrets = base_dir
        .map(|dir| dir.join(SECRETS_FILE))
        .filter(|path| path.exists())
        .and_then(|path| match fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "secrets file unreadable");
                None
            }
        });
    let api_key = resolve_api_key(env::var(API_KEY_VAR).ok(), secrets.as_deref());

    tracing::debug!(
        config = ?config_path,
        api_key_present = api_key.is_some(),
        "settings loaded"
    );
    Ok(Settings {
        config,
        api_key,
        config_path: config_path.filter(|path| path.exists()),
    })
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    Config::from_toml_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}
