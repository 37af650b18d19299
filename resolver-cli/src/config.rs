use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stream_resolver::extractor::{ProxyConfig, TransportConfig};

use crate::cli::OutputFormat;

const APP_NAME: &str = "sresolve";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default output format
    pub default_output_format: OutputFormat,

    /// Default request timeout in seconds
    pub default_timeout: u64,

    /// Maximum concurrent resolutions for batch processing
    pub max_concurrent: usize,

    /// Default output directory for batch processing
    pub default_output_dir: Option<PathBuf>,

    /// Enable colored output
    pub colored_output: bool,

    /// Default proxy URL (supports http, https, socks5)
    pub default_proxy: Option<String>,

    /// Default proxy username (if proxy requires authentication)
    pub default_proxy_username: Option<String>,

    /// Default proxy password (if proxy requires authentication)
    pub default_proxy_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_output_format: OutputFormat::Pretty,
            default_timeout: 30,
            max_concurrent: 5,
            default_output_dir: None,
            colored_output: true,
            default_proxy: None,
            default_proxy_username: None,
            default_proxy_password: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file, or from the platform config directory
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => {
                if path.exists() {
                    let content = std::fs::read_to_string(path)
                        .context("Failed to read configuration file")?;
                    toml::from_str(&content).context("Failed to parse configuration file")
                } else {
                    Ok(Self::default())
                }
            }
            None => confy::load(APP_NAME, None).context("Failed to load configuration"),
        }
    }

    /// Get default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, None).ok()
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, toml_string).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Reset configuration to defaults and save
    pub fn reset(config_path: Option<&Path>) -> Result<()> {
        let path = config_path
            .map(|p| p.to_path_buf())
            .or_else(Self::default_config_path)
            .context("No configuration path available")?;

        Self::default().save(&path)
    }

    /// Show current configuration as a formatted string
    pub fn show(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration for display")
    }

    /// Transport settings, command-line values taking precedence over the file.
    pub fn transport_config(
        &self,
        timeout_secs: Option<u64>,
        proxy_url: Option<String>,
        proxy_username: Option<String>,
        proxy_password: Option<String>,
    ) -> TransportConfig {
        let proxy = proxy_url
            .or_else(|| self.default_proxy.clone())
            .map(|url| ProxyConfig {
                url,
                username: proxy_username.or_else(|| self.default_proxy_username.clone()),
                password: proxy_password.or_else(|| self.default_proxy_password.clone()),
            });

        TransportConfig {
            timeout: Duration::from_secs(timeout_secs.unwrap_or(self.default_timeout)),
            proxy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.default_timeout, 30);
        assert_eq!(config.default_output_format, OutputFormat::Pretty);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sresolve.toml");
        std::fs::write(
            &path,
            "default_output_format = \"json-compact\"\nmax_concurrent = 2\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_output_format, OutputFormat::JsonCompact);
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.default_timeout, 30);
    }

    #[test]
    fn reset_writes_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sresolve.toml");
        AppConfig::reset(Some(&path)).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_concurrent, 5);
        assert!(config.colored_output);
    }

    #[test]
    fn command_line_overrides_file_settings() {
        let config = AppConfig {
            default_timeout: 12,
            default_proxy: Some("http://file-proxy:3128".into()),
            default_proxy_username: Some("file-user".into()),
            ..AppConfig::default()
        };

        let transport = config.transport_config(None, None, None, None);
        assert_eq!(transport.timeout, Duration::from_secs(12));
        let proxy = transport.proxy.unwrap();
        assert_eq!(proxy.url, "http://file-proxy:3128");
        assert_eq!(proxy.username.as_deref(), Some("file-user"));

        let transport =
            config.transport_config(Some(3), Some("socks5://cli:1080".into()), None, None);
        assert_eq!(transport.timeout, Duration::from_secs(3));
        assert_eq!(transport.proxy.unwrap().url, "socks5://cli:1080");
    }
}
