//! Connection profile for a Panorama appliance.
//!
//! ```toml
//! host = "panorama.example.net"
//! api_version = "v10.2"
//! api_key_env = "PANORAMA_API_KEY"   # or: api_key = "..."
//! verify_tls = true
//! timeout_secs = 30
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_VERSION: &str = "v10.2";
pub const DEFAULT_API_KEY_ENV: &str = "PANORAMA_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Hostname, or a full `https://` base URL.
    pub host: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Inline API key. Prefer `api_key_env` for anything checked in.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

/// Errors returned when loading or resolving a connection profile.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("no API key: set api_key in the config or export {env}")]
    MissingApiKey { env: String },
    #[error("host cannot be empty")]
    EmptyHost,
}

impl ClientConfig {
    /// Minimal profile for `host` with every other field defaulted.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_version: default_api_version(),
            api_key: None,
            api_key_env: None,
            verify_tls: true,
            timeout_secs: default_timeout(),
        }
    }

    /// `https://<host>` unless the host already names a scheme.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if host.starts_with("http://") || host.starts_with("https://") {
            Ok(host.to_string())
        } else {
            Ok(format!("https://{host}"))
        }
    }

    /// Resolve the API key: the configured environment variable (or
    /// `PANORAMA_API_KEY`) wins over an inline `api_key`.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        let env = self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
        if let Ok(key) = std::env::var(env) {
            if !key.is_empty() {
                return Ok(key);
            }
        }
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                env: env.to_string(),
            })
    }
}

/// Load a connection profile from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&raw, path.display().to_string())
}

fn parse_config(raw: &str, path: String) -> Result<ClientConfig, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{load_config, parse_config, ClientConfig, ConfigError};

    #[test]
    fn defaults_fill_optional_fields() {
        let config = parse_config(r#"host = "pano.lab""#, "inline".to_string()).expect("parse");
        assert_eq!(config, ClientConfig::for_host("pano.lab"));
        assert_eq!(config.base_url().expect("url"), "https://pano.lab");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let config = ClientConfig::for_host("http://127.0.0.1:8443/");
        assert_eq!(config.base_url().expect("url"), "http://127.0.0.1:8443");
        assert!(matches!(
            ClientConfig::for_host("  ").base_url(),
            Err(ConfigError::EmptyHost)
        ));
    }

    #[test]
    fn inline_key_used_when_env_unset() {
        let mut config = ClientConfig::for_host("pano.lab");
        config.api_key_env = Some("PANORAMA_CONFIG_TEST_UNSET_KEY".to_string());
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey { .. })));

        config.api_key = Some("LUFRPT1".to_string());
        assert_eq!(config.api_key().expect("key"), "LUFRPT1");
    }

    #[test]
    fn loads_fixture_profile() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures/panorama.toml");
        let config = load_config(&path).expect("load");
        assert_eq!(config.host, "panorama.example.net");
        assert_eq!(config.api_key_env.as_deref(), Some("PANORAMA_API_KEY"));
        assert!(!config.verify_tls);
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn parse_error_names_the_file() {
        let err = parse_config("host = ", "panorama.toml".to_string()).expect_err("invalid");
        assert!(err.to_string().contains("panorama.toml"));
    }
}
