use crate::utils::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    #[serde(default = "default_mode")]
    pub mode: Mode,
    #[serde(default = "default_asset_dir")]
    pub asset_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String, // "json" or "pretty"
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    8080
}

fn default_mode() -> Mode {
    Mode::Prod
}

fn default_asset_dir() -> String {
    "assets".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            mode: default_mode(),
            asset_dir: default_asset_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RelayError::Config(format!("failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| RelayError::Config(format!("failed to parse config: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.bind_port == 0 {
            return Err(RelayError::Config("bind_port cannot be 0".to_string()));
        }
        if self.server.mode == Mode::Dev && self.server.asset_dir.trim().is_empty() {
            return Err(RelayError::Config(
                "asset_dir cannot be empty in dev mode".to_string(),
            ));
        }
        Ok(())
    }

    /// Write an annotated example configuration file.
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let example = r#"[server]
bind_address = "0.0.0.0"
bind_port = 8080
mode = "prod"  # Options: "dev", "prod". "dev" also serves static assets.
asset_dir = "assets"

[logging]
level = "info"  # Options: "trace", "debug", "info", "warn", "error"
format = "pretty"  # Options: "pretty", "json"
"#;

        std::fs::write(path.as_ref(), example)
            .map_err(|e| RelayError::Config(format!("failed to write example config: {e}")))?;

        Ok(())
    }
}
