//! Registry connection configuration
//!
//! Maps logical environment names onto schema registry addresses and holds
//! the credentials used to authenticate against them. Loaded from TOML:
//!
//! ```toml
//! request_timeout_secs = 10
//!
//! [environments.Dev]
//! address = "localhost:8081"
//!
//! [credentials.18]
//! username = "svc-schema"
//! password = "secret"
//! ```

use schema_orchestrator_core::{ClusterKind, KafkaProtocol};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_request_timeout_secs() -> u64 {
    30
}

/// One logical environment hosting a schema registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// `host:port`, or a full base URL when the scheme must be pinned
    pub address: String,
}

impl EnvironmentConfig {
    /// Base URL for the given protocol.
    ///
    /// Addresses without a scheme get `https://` for TLS-bearing protocols
    /// and `http://` otherwise.
    pub fn base_url(&self, protocol: KafkaProtocol) -> String {
        let address = self.address.trim_end_matches('/');
        if address.contains("://") {
            address.to_string()
        } else if protocol.is_secure() {
            format!("https://{}", address)
        } else {
            format!("http://{}", address)
        }
    }
}

/// Basic-auth credentials for a cluster identification
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    /// Redacted in `Debug` output; exposed only when building auth headers
    pub password: Secret<String>,
    /// Cluster kind these credentials apply to
    #[serde(default = "default_credentials_kind")]
    pub kind: ClusterKind,
}

fn default_credentials_kind() -> ClusterKind {
    ClusterKind::SchemaRegistry
}

/// Combined registry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Upper bound for every registry call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Registry address per logical environment
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
    /// Credentials per cluster identification
    #[serde(default)]
    pub credentials: HashMap<String, Credentials>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            environments: HashMap::new(),
            credentials: HashMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    #[instrument]
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let config = Self::from_toml_str(&raw)?;

        debug!(
            environments = config.environments.len(),
            credentials = config.credentials.len(),
            "Registry configuration loaded"
        );

        Ok(config)
    }

    /// Register an environment, replacing any previous address
    pub fn with_environment(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.environments.insert(
            name.into(),
            EnvironmentConfig {
                address: address.into(),
            },
        );
        self
    }

    /// Register schema registry credentials for a cluster identification
    pub fn with_credentials(
        mut self,
        cluster_identification: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials.insert(
            cluster_identification.into(),
            Credentials {
                username: username.into(),
                password: Secret::new(password.into()),
                kind: ClusterKind::SchemaRegistry,
            },
        );
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check the configuration for values that can never resolve
    pub fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        for (name, environment) in &self.environments {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::ValidationFailed(format!(
                    "invalid environment name '{}'",
                    name
                )));
            }
            if environment.address.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "environment '{}' has an empty address",
                    name
                )));
            }
            url::Url::parse(&environment.base_url(KafkaProtocol::Plaintext)).map_err(|e| {
                ConfigError::ValidationFailed(format!(
                    "environment '{}' has an invalid address: {}",
                    name, e
                ))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = RegistryConfig::from_toml_str(
            r#"
            request_timeout_secs = 5

            [environments.Dev]
            address = "localhost:8081"

            [environments.Prod]
            address = "https://registry.internal"

            [credentials.18]
            username = "svc"
            password = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.environments.len(), 2);
        assert_eq!(config.credentials["18"].kind, ClusterKind::SchemaRegistry);
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::from_toml_str("").unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.environments.is_empty());
        assert!(config.credentials.is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = RegistryConfig::from_toml_str(
            r#"
            [credentials.18]
            username = "svc"
            password = "hunter2"
            "#,
        )
        .unwrap()
        .with_credentials("19", "svc", "correct-horse");

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("svc"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("correct-horse"));
    }

    #[test]
    fn test_base_url_follows_protocol() {
        let environment = EnvironmentConfig {
            address: "registry:8081/".to_string(),
        };
        assert_eq!(environment.base_url(KafkaProtocol::Plaintext), "http://registry:8081");
        assert_eq!(environment.base_url(KafkaProtocol::Ssl), "https://registry:8081");

        let pinned = EnvironmentConfig {
            address: "http://127.0.0.1:9000".to_string(),
        };
        assert_eq!(pinned.base_url(KafkaProtocol::SaslSsl), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = RegistryConfig::from_toml_str("request_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed(_)));
    }

    #[test]
    fn test_invalid_environment_name_rejected() {
        let config = RegistryConfig::default().with_environment("dev/eu", "localhost:8081");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = RegistryConfig::from_toml_str("environments = 3").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = RegistryConfig::load(Path::new("/nonexistent/registry.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
