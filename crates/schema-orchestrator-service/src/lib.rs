//! Schema registry orchestration service
//!
//! - [`config`]: environment → registry address mapping and credentials
//! - [`connection`]: the [`ConnectionResolver`] seam and its config-backed implementation
//! - [`transport`]: one registry exchange, classified into a [`RegistryReply`]
//! - [`orchestrator`]: [`SchemaOrchestrator`], chaining registry calls into operations

pub mod config;
pub mod connection;
pub mod orchestrator;
pub mod transport;

pub use config::{ConfigError, Credentials, EnvironmentConfig, RegistryConfig};
pub use connection::{
    ConnectionError, ConnectionResolver, RequestTarget, StaticConnectionResolver,
    SCHEMA_REGISTRY_CONTENT_TYPE,
};
pub use orchestrator::{
    CompatibilityLookup, OrchestratorError, OrchestratorResult, SchemaOrchestrator,
};
pub use transport::{RegistryReply, TransportError};
