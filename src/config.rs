use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Deployment context for endpoint resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentEnv {
    Development,
    Production,
}

impl DeploymentEnv {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// "development" or "production"; `BRAINBRIDGE_ENV` overrides at call time
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_production_base_url")]
    pub production_base_url: String,

    /// Relative transcription path, joined to the base URL in production
    #[serde(default = "default_transcribe_path")]
    pub transcribe_path: String,

    /// Fixed local development transcription endpoint
    #[serde(default = "default_dev_transcribe_url")]
    pub dev_transcribe_url: String,

    /// Single-attempt upload deadline in seconds
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Save every finalized recording to disk alongside the upload
    #[serde(default)]
    pub archive_recordings: bool,

    /// Override for the recordings directory (defaults to the user data dir)
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_production_base_url() -> String {
    "https://brainbridge.app".to_string()
}

fn default_transcribe_path() -> String {
    "/api/transcribe".to_string()
}

fn default_dev_transcribe_url() -> String {
    "http://localhost:5001/api/transcribe".to_string()
}

fn default_upload_timeout() -> u64 {
    30
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_channels() -> u16 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            production_base_url: default_production_base_url(),
            transcribe_path: default_transcribe_path(),
            dev_transcribe_url: default_dev_transcribe_url(),
            upload_timeout_secs: default_upload_timeout(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            archive_recordings: false,
            archive_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/brainbridge/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("brainbridge").join("config.json"))
    }

    /// Deployment environment, read fresh on every call so an environment
    /// change between uploads is picked up (`BRAINBRIDGE_ENV` wins over the
    /// config file).
    pub fn deployment_env(&self) -> DeploymentEnv {
        match std::env::var("BRAINBRIDGE_ENV") {
            Ok(v) => DeploymentEnv::parse(&v),
            Err(_) => DeploymentEnv::parse(&self.environment),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.production_base_url.is_empty() {
            return Err(anyhow::anyhow!("production_base_url cannot be empty"));
        }

        if !self.transcribe_path.starts_with('/') {
            return Err(anyhow::anyhow!("transcribe_path must be a relative path starting with '/'"));
        }

        if self.dev_transcribe_url.is_empty() {
            return Err(anyhow::anyhow!("dev_transcribe_url cannot be empty"));
        }

        if self.upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!("upload_timeout_secs must be positive"));
        }

        if self.sample_rate == 0 || self.channels == 0 {
            return Err(anyhow::anyhow!("sample_rate and channels must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upload_timeout_secs, 30);
        assert_eq!(config.transcribe_path, "/api/transcribe");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "environment": "production" }"#).unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(config.dev_transcribe_url, "http://localhost:5001/api/transcribe");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_relative_transcribe_path() {
        let config = Config {
            transcribe_path: "api/transcribe".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_deployment_env() {
        assert_eq!(DeploymentEnv::parse("production"), DeploymentEnv::Production);
        assert_eq!(DeploymentEnv::parse("PRODUCTION"), DeploymentEnv::Production);
        assert_eq!(DeploymentEnv::parse("development"), DeploymentEnv::Development);
        assert_eq!(DeploymentEnv::parse("staging"), DeploymentEnv::Development);
    }
}
