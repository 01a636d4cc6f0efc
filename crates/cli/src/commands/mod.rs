pub mod chat;
pub mod profile;

use anyhow::Context;
use ponder_config::AppConfig;
use std::path::PathBuf;

/// Load the config from the given path or the default location.
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let path = path.unwrap_or_else(AppConfig::default_path);
    AppConfig::load(&path).with_context(|| format!("loading config from {}", path.display()))
}
