use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    pub server_host: String,
    pub server_port: u16,
    pub tenants_dir: PathBuf,
    pub enable_hot_reload: bool,
    pub log_level: String,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8190,
            tenants_dir: Self::default_tenants_dir(),
            enable_hot_reload: true,
            log_level: "info".to_string(),
        }
    }
}

impl GatekeeperConfig {
    /// `<config_dir>/tenant-access-hub/config/tenants.d`, or the same path
    /// under the working directory when no config dir is known.
    fn default_tenants_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .map(|dir| dir.join("tenant-access-hub"))
            .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        config_dir.join("config").join("tenants.d")
    }

    pub fn from_env() -> Result<Self> {
        let mut config = GatekeeperConfig::default();

        if let Some(host) = non_empty_var("GATEKEEPER_HOST") {
            config.server_host = host;
        }
        if let Some(port) = non_empty_var("GATEKEEPER_PORT") {
            config.server_port = port
                .parse::<u16>()
                .context("failed to parse GATEKEEPER_PORT as u16")?;
        }
        if let Some(dir) = non_empty_var("TENANTS_DIR") {
            config.tenants_dir = absolutize(PathBuf::from(dir));
        }
        if let Some(flag) = non_empty_var("ENABLE_HOT_RELOAD") {
            config.enable_hot_reload =
                parse_bool(&flag).context("failed to parse ENABLE_HOT_RELOAD as bool")?;
        }
        if let Some(level) = non_empty_var("LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;

        info!(
            host = %config.server_host,
            port = config.server_port,
            tenants_dir = %config.tenants_dir.display(),
            hot_reload = config.enable_hot_reload,
            "gatekeeper configuration resolved"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_tenants_dir(&self.tenants_dir)
    }
}

/// Unset and blank variables both keep the default.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value.parse::<bool>().or_else(|_| match value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(anyhow!("invalid boolean value: {}", other)),
    })
}

fn validate_tenants_dir(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).with_context(|| {
        format!(
            "tenants directory '{}' does not exist or is not accessible",
            path.display()
        )
    })?;

    if !metadata.is_dir() {
        return Err(anyhow!(
            "tenants directory '{}' is not a directory",
            path.display()
        ));
    }

    Ok(())
}
