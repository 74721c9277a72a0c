//! Connection resolution for schema registry calls
//!
//! The orchestrator never builds registry URLs itself. It hands a logical
//! path (`{environment}/{endpoint}`) and a protocol to a [`ConnectionResolver`]
//! and gets back a bound [`RequestTarget`]. Authenticated calls additionally
//! ask the resolver for a header set.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use schema_orchestrator_core::{ClusterKind, KafkaProtocol};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::RegistryConfig;

/// Media type spoken by Confluent-compatible registries
pub const SCHEMA_REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Errors from connection resolution
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Malformed logical path: {0}")]
    MalformedPath(String),
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),
    #[error("No registry endpoint matches {0}")]
    UnmatchedEndpoint(String),
    #[error("Invalid credentials for cluster {0}")]
    InvalidCredentials(String),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A resolved registry endpoint and the client used to reach it
#[derive(Debug, Clone)]
pub struct RequestTarget {
    pub url: String,
    pub client: reqwest::Client,
}

impl RequestTarget {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

/// Resolves logical registry paths to concrete request targets.
///
/// Implementations are shared by every in-flight orchestrator call and must
/// be safe for concurrent use.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionResolver: Send + Sync {
    /// Bind `{environment}/{endpoint}` to a URL for the given protocol
    fn request_details(
        &self,
        logical_path: &str,
        protocol: KafkaProtocol,
    ) -> Result<RequestTarget, ConnectionError>;

    /// Headers for an authenticated call on behalf of a cluster identification
    fn create_headers(
        &self,
        cluster_identification: &str,
        kind: ClusterKind,
    ) -> Result<HeaderMap, ConnectionError>;
}

/// Resolver backed by a static [`RegistryConfig`].
///
/// The first segment of the logical path names the environment; the rest is
/// appended to that environment's registry address.
#[derive(Debug, Clone)]
pub struct StaticConnectionResolver {
    config: RegistryConfig,
    client: reqwest::Client,
}

impl StaticConnectionResolver {
    pub fn new(config: RegistryConfig) -> Result<Self, ConnectionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ConnectionError::Client)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl ConnectionResolver for StaticConnectionResolver {
    #[instrument(skip(self))]
    fn request_details(
        &self,
        logical_path: &str,
        protocol: KafkaProtocol,
    ) -> Result<RequestTarget, ConnectionError> {
        let (environment, endpoint) = logical_path
            .split_once('/')
            .filter(|(env, endpoint)| !env.is_empty() && !endpoint.is_empty())
            .ok_or_else(|| ConnectionError::MalformedPath(logical_path.to_string()))?;

        let registry = self
            .config
            .environments
            .get(environment)
            .ok_or_else(|| ConnectionError::UnknownEnvironment(environment.to_string()))?;

        let url = format!("{}/{}", registry.base_url(protocol), endpoint);
        debug!(url = %url, "Resolved registry endpoint");

        Ok(RequestTarget::new(url, self.client.clone()))
    }

    #[instrument(skip(self))]
    fn create_headers(
        &self,
        cluster_identification: &str,
        kind: ClusterKind,
    ) -> Result<HeaderMap, ConnectionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(SCHEMA_REGISTRY_CONTENT_TYPE),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(SCHEMA_REGISTRY_CONTENT_TYPE));

        let credentials = self
            .config
            .credentials
            .get(cluster_identification)
            .filter(|credentials| credentials.kind == kind);

        if let Some(credentials) = credentials {
            let token = STANDARD.encode(format!(
                "{}:{}",
                credentials.username,
                credentials.password.expose_secret()
            ));
            let mut value = HeaderValue::from_str(&format!("Basic {}", token)).map_err(|_| {
                ConnectionError::InvalidCredentials(cluster_identification.to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            debug!("No credentials configured, sending unauthenticated request");
        }

        Ok(headers)
    }
}
