// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a file (YAML or JSON), then apply environment
/// overrides.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let mut config = parse_config(path, &contents)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Defaults plus environment, for running without a config file.
pub fn from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn parse_config(path: &Path, contents: &str) -> Result<Config> {
    let ext = path.extension().and_then(|s| s.to_str());
    let config = if ext == Some("yaml") || ext == Some("yml") {
        serde_yaml::from_str(contents).context("Failed to parse YAML config")?
    } else {
        serde_json::from_str(contents).context("Failed to parse JSON config")?
    };
    Ok(config)
}

/// Credentials and the debug flag come from the same variables the CLC SDK
/// reads.
pub fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    if env("CLC_REG_DEBUG").as_deref() == Some("true") {
        config.debug = true;
    }
    if let Some(dc) = env("CLC_REG_DATACENTER").filter(|v| !v.is_empty()) {
        config.datacenter = dc;
    }
    if let Some(user) = env("CLC_USERNAME").or_else(|| env("CLC_USER")) {
        config.control_plane.username = Some(user);
    }
    if let Some(password) = env("CLC_PASSWORD") {
        config.control_plane.password = Some(password);
    }
    if let Some(alias) = env("CLC_ALIAS").filter(|v| !v.is_empty()) {
        config.control_plane.account_alias = Some(alias);
    }
}
