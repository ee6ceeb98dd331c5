use std::net::SocketAddr;
use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::provider::yahoo;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_charts_dir() -> String {
    "./static/charts".into()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".into()
}

fn default_base_url() -> String {
    yahoo::DEFAULT_BASE_URL.into()
}

fn default_requests_per_second() -> u32 {
    yahoo::DEFAULT_REQUESTS_PER_SECOND
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Directory chart artifacts are written to, created once at startup.
    #[serde(default = "default_charts_dir")]
    pub charts_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            charts_dir: default_charts_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
///
/// A missing file is not an error; the service runs on pure defaults then,
/// matching a bare `stock-charter` invocation with no config present.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .change_context(ConfigError::ReadFile)
            .attach_with(|| format!("path: {}", path.display()))?;

        toml::from_str(&content).change_context(ConfigError::Parse {
            reason: "invalid TOML syntax or schema mismatch".into(),
        })?
    } else {
        AppConfig::default()
    };

    validate(&config)?;

    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !matches!(config.general.log_format.as_str(), "text" | "json") {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "general.log_format \"{}\" is not \"text\" or \"json\"",
                config.general.log_format
            ),
        }));
    }

    if config.general.charts_dir.trim().is_empty() {
        return Err(Report::new(ConfigError::Validation {
            field: "general.charts_dir must not be empty".into(),
        }));
    }

    if config.server.bind_addr.parse::<SocketAddr>().is_err() {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "server.bind_addr \"{}\" is not a valid socket address",
                config.server.bind_addr
            ),
        }));
    }

    if config.provider.requests_per_second == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "provider.requests_per_second must be > 0".into(),
        }));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("parse failed")
    }

    #[test]
    fn valid_full_config_parses() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"
charts_dir = "/tmp/charts"

[server]
bind_addr = "127.0.0.1:8080"

[provider]
base_url = "https://query2.finance.yahoo.com"
requests_per_second = 2
"#;
        let config = parse(toml);
        assert!(validate(&config).is_ok());
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.provider.requests_per_second, 2);
    }

    #[test]
    fn defaults_applied_when_fields_omitted() {
        let config = parse("");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "text");
        assert_eq!(config.general.charts_dir, "./static/charts");
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.provider.base_url, yahoo::DEFAULT_BASE_URL);
        assert_eq!(
            config.provider.requests_per_second,
            yahoo::DEFAULT_REQUESTS_PER_SECOND
        );
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load(Path::new("/nonexistent/stock-charter.toml")).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn invalid_log_format_rejected() {
        let config = parse("[general]\nlog_format = \"yaml\"\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn invalid_bind_addr_rejected() {
        let config = parse("[server]\nbind_addr = \"not-an-addr\"\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_requests_per_second_rejected() {
        let config = parse("[provider]\nrequests_per_second = 0\n");
        assert!(validate(&config).is_err());
    }
}
