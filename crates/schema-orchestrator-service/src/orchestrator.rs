//! Schema registry orchestration
//!
//! Chains the registry calls behind topic/schema promotion into single
//! operations:
//!
//! - version lookup (404 means "no schema yet", not an error)
//! - effective compatibility (subject override, falling back to the global default)
//! - per-version metadata fetch decorated with the effective compatibility
//! - compatibility check of a candidate schema against the latest version
//! - subject deletion, schema registration and compatibility updates
//!
//! Calls inside one operation run strictly in sequence. Nothing is cached and
//! no state is shared between invocations beyond the injected resolver.

use reqwest::header::HeaderMap;
use reqwest::Method;
use schema_orchestrator_core::{
    ClusterKind, ClusterTopicRequest, CompatibilityMode, CompatibilityVerdict, InvalidSubject,
    KafkaProtocol, OperationResult, SchemaMap, SchemaRequest, SubjectKey, VersionSet,
    COMPATIBILITY_KEY,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::connection::{ConnectionError, ConnectionResolver};
use crate::transport::{self, RegistryReply, TransportError};

pub const NO_EXISTING_SCHEMA: &str = "No existing schema. Compatibility check skipped.";
pub const SCHEMA_COMPATIBLE: &str = "Schema is compatible.";
pub const SCHEMA_NOT_COMPATIBLE: &str = "Schema is not compatible.";
pub const INVALID_SCHEMA_COMPATIBILITY: &str =
    "Invalid Schema. Unable to validate Schema Compatibility.";
pub const UNABLE_TO_VALIDATE_COMPATIBILITY: &str = "Unable to validate Schema Compatibility.";
pub const UNABLE_TO_DELETE_SCHEMA: &str = "Unable to delete Schema.";
pub const SCHEMA_ENV_NOT_CONFIGURED: &str = "Schema environment is not configured for this topic.";
pub const SCHEMA_REGISTERED: &str = "Schema registered.";
pub const INVALID_SCHEMA: &str = "Invalid Schema.";
pub const SCHEMA_CONFLICT: &str = "Schema is incompatible with existing versions.";
pub const UNABLE_TO_REGISTER_SCHEMA: &str = "Unable to register Schema.";
pub const UNABLE_TO_SET_COMPATIBILITY: &str = "Unable to set Schema Compatibility.";
pub const INVALID_SUBJECT: &str = "Invalid topic or environment name.";

/// Hard failures of data-returning operations
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("{0}")]
    InvalidSubject(#[from] InvalidSubject),
    #[error("Unable to resolve registry connection: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Registry call failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Registry rejected {path} with status {status}: {body}")]
    Rejected {
        path: String,
        status: u16,
        body: String,
    },
    #[error("Malformed registry response from {path}: {reason}")]
    MalformedResponse { path: String, reason: String },
    #[error("Global compatibility unavailable in {environment}: {reason}")]
    GlobalConfig { environment: String, reason: String },
}

impl OrchestratorError {
    fn unexpected(path: &str, reply: RegistryReply) -> Self {
        match reply {
            RegistryReply::Ok(body) => Self::MalformedResponse {
                path: path.to_string(),
                reason: format!("unexpected body {}", body),
            },
            RegistryReply::NotFound => Self::Rejected {
                path: path.to_string(),
                status: 404,
                body: String::new(),
            },
            RegistryReply::Unprocessable(body) => Self::Rejected {
                path: path.to_string(),
                status: 422,
                body,
            },
            RegistryReply::Rejected { status, body } => Self::Rejected {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            },
        }
    }
}

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Outcome of the subject-level compatibility lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityLookup {
    /// The subject carries its own compatibility override
    Configured(CompatibilityMode),
    /// No usable override; the registry-global default applies
    Absent,
}

/// Orchestrates schema registry calls for topic and schema promotion.
pub struct SchemaOrchestrator {
    resolver: Arc<dyn ConnectionResolver>,
}

impl SchemaOrchestrator {
    /// Create an orchestrator bound to a connection resolver
    pub fn new(resolver: Arc<dyn ConnectionResolver>) -> Self {
        Self { resolver }
    }

    async fn call(
        &self,
        logical_path: &str,
        protocol: KafkaProtocol,
        method: Method,
        headers: HeaderMap,
        body: Option<&serde_json::Value>,
    ) -> OrchestratorResult<RegistryReply> {
        let target = self.resolver.request_details(logical_path, protocol)?;
        Ok(transport::exchange(&target, method, headers, body).await?)
    }

    fn auth_headers(&self, cluster_identification: &str) -> OrchestratorResult<HeaderMap> {
        Ok(self
            .resolver
            .create_headers(cluster_identification, ClusterKind::SchemaRegistry)?)
    }

    /// Registered versions of `{topic}-value`.
    ///
    /// A 404 from the registry yields an empty set.
    #[instrument(skip(self))]
    pub async fn get_versions(
        &self,
        environment: &str,
        protocol: KafkaProtocol,
        topic: &str,
    ) -> OrchestratorResult<VersionSet> {
        let key = SubjectKey::new(environment, topic)?;
        self.versions(&key, protocol).await
    }

    async fn versions(
        &self,
        key: &SubjectKey,
        protocol: KafkaProtocol,
    ) -> OrchestratorResult<VersionSet> {
        let path = key.versions_path();

        match self
            .call(&path, protocol, Method::GET, HeaderMap::new(), None)
            .await?
        {
            RegistryReply::Ok(body) => {
                let versions: VersionSet = serde_json::from_value(body).map_err(|e| {
                    OrchestratorError::MalformedResponse {
                        path: path.clone(),
                        reason: e.to_string(),
                    }
                })?;
                debug!(subject = %key, count = versions.len(), "Fetched schema versions");
                Ok(versions)
            }
            RegistryReply::NotFound => {
                debug!(subject = %key, "Subject not found, no schema registered");
                Ok(VersionSet::new())
            }
            reply => Err(OrchestratorError::unexpected(&path, reply)),
        }
    }

    /// Subject-level compatibility override, if the registry reports one.
    ///
    /// Any failure of the subject config call is treated as "no override".
    /// Some registries answer a missing override with a server error rather
    /// than a 404. Only a rejected environment or topic name is an error.
    #[instrument(skip(self))]
    pub async fn get_subject_compatibility(
        &self,
        environment: &str,
        protocol: KafkaProtocol,
        topic: &str,
    ) -> OrchestratorResult<CompatibilityLookup> {
        let key = SubjectKey::new(environment, topic)?;
        Ok(self.subject_compatibility(&key, protocol).await)
    }

    async fn subject_compatibility(
        &self,
        key: &SubjectKey,
        protocol: KafkaProtocol,
    ) -> CompatibilityLookup {
        self.subject_override(key, protocol)
            .await
            .unwrap_or_else(|e| {
                warn!(subject = %key, error = %e, "Subject compatibility lookup failed");
                CompatibilityLookup::Absent
            })
    }

    /// Subject config as answered by the registry.
    ///
    /// Every registry answer without a usable mode is `Absent`. Errors mean
    /// the registry was never reached, so the override is unknown.
    async fn subject_override(
        &self,
        key: &SubjectKey,
        protocol: KafkaProtocol,
    ) -> OrchestratorResult<CompatibilityLookup> {
        let path = key.subject_config_path();

        let lookup = match self
            .call(&path, protocol, Method::GET, HeaderMap::new(), None)
            .await?
        {
            RegistryReply::Ok(body) => match compatibility_level(&body) {
                Ok(mode) => CompatibilityLookup::Configured(mode),
                Err(reason) => {
                    warn!(subject = %key, %reason, "Unusable subject compatibility config");
                    CompatibilityLookup::Absent
                }
            },
            reply => {
                debug!(subject = %key, status = ?reply.status(), "No subject compatibility override");
                CompatibilityLookup::Absent
            }
        };
        Ok(lookup)
    }

    /// Compatibility mode in force for the subject.
    ///
    /// The subject override wins; otherwise the registry-global default is
    /// used. A failing global lookup is terminal.
    #[instrument(skip(self))]
    pub async fn get_effective_compatibility(
        &self,
        environment: &str,
        protocol: KafkaProtocol,
        topic: &str,
    ) -> OrchestratorResult<CompatibilityMode> {
        let key = SubjectKey::new(environment, topic)?;
        self.effective_compatibility(&key, protocol).await
    }

    async fn effective_compatibility(
        &self,
        key: &SubjectKey,
        protocol: KafkaProtocol,
    ) -> OrchestratorResult<CompatibilityMode> {
        if let CompatibilityLookup::Configured(mode) =
            self.subject_compatibility(key, protocol).await
        {
            return Ok(mode);
        }

        let path = key.global_config_path();
        let global_failure = |reason: String| OrchestratorError::GlobalConfig {
            environment: key.environment().to_string(),
            reason,
        };

        match self
            .call(&path, protocol, Method::GET, HeaderMap::new(), None)
            .await
        {
            Ok(RegistryReply::Ok(body)) => {
                let mode = compatibility_level(&body).map_err(global_failure)?;
                debug!(subject = %key, %mode, "Using global compatibility");
                Ok(mode)
            }
            Ok(reply) => Err(global_failure(format!(
                "registry responded with status {:?}",
                reply.status()
            ))),
            Err(e) => Err(global_failure(e.to_string())),
        }
    }

    /// Metadata document of every registered version, keyed by version.
    ///
    /// Each document carries the effective compatibility under
    /// [`COMPATIBILITY_KEY`]. A subject without versions yields an empty map;
    /// any failing version fetch fails the whole call.
    #[instrument(skip(self))]
    pub async fn get_schema(
        &self,
        environment: &str,
        protocol: KafkaProtocol,
        cluster_identification: &str,
        topic: &str,
    ) -> OrchestratorResult<SchemaMap> {
        let key = SubjectKey::new(environment, topic)?;
        let mut schemas = SchemaMap::new();

        let versions = self.versions(&key, protocol).await?;
        if versions.is_empty() {
            return Ok(schemas);
        }

        let compatibility = self.effective_compatibility(&key, protocol).await?;

        for version in versions {
            let path = key.version_path(version);
            let mut document = match self
                .call(&path, protocol, Method::GET, HeaderMap::new(), None)
                .await?
            {
                RegistryReply::Ok(serde_json::Value::Object(document)) => document,
                reply => return Err(OrchestratorError::unexpected(&path, reply)),
            };
            document.insert(
                COMPATIBILITY_KEY.to_string(),
                serde_json::Value::String(compatibility.to_string()),
            );
            schemas.insert(version, document);
        }

        info!(subject = %key, versions = schemas.len(), %compatibility, "Fetched schema versions");
        Ok(schemas)
    }

    /// Validate a candidate schema against the subject's latest version.
    ///
    /// A subject without any registered version passes without contacting
    /// the compatibility endpoint.
    #[instrument(skip(self, schema))]
    pub async fn check_compatibility(
        &self,
        schema: &str,
        topic: &str,
        protocol: KafkaProtocol,
        environment: &str,
        cluster_identification: &str,
    ) -> OperationResult {
        let key = match SubjectKey::new(environment, topic) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Refusing compatibility check");
                return OperationResult::failure(INVALID_SUBJECT);
            }
        };

        let versions = match self.versions(&key, protocol).await {
            Ok(versions) => versions,
            Err(e) => {
                warn!(error = %e, "Version lookup failed before compatibility check");
                return OperationResult::failure(UNABLE_TO_VALIDATE_COMPATIBILITY);
            }
        };

        if versions.is_empty() {
            info!("No registered schema, skipping compatibility check");
            return OperationResult::success_with(NO_EXISTING_SCHEMA);
        }

        let reply = match self
            .submit_compatibility(&key, schema, protocol, cluster_identification)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(subject = %key, error = %e, "Compatibility check failed");
                return OperationResult::failure(UNABLE_TO_VALIDATE_COMPATIBILITY);
            }
        };

        match reply {
            RegistryReply::Ok(body) => match serde_json::from_value::<CompatibilityVerdict>(body) {
                Ok(verdict) if verdict.is_compatible => {
                    info!(subject = %key, "Schema is compatible");
                    OperationResult::success_with(SCHEMA_COMPATIBLE)
                }
                Ok(verdict) => {
                    info!(subject = %key, messages = ?verdict.messages, "Schema is not compatible");
                    OperationResult::failure(&incompatible_message(&verdict))
                }
                Err(e) => {
                    warn!(subject = %key, error = %e, "Malformed compatibility verdict");
                    OperationResult::failure(UNABLE_TO_VALIDATE_COMPATIBILITY)
                }
            },
            RegistryReply::Unprocessable(body) => {
                warn!(subject = %key, %body, "Registry rejected schema as invalid");
                OperationResult::failure(INVALID_SCHEMA_COMPATIBILITY)
            }
            reply => {
                warn!(subject = %key, status = ?reply.status(), "Unexpected compatibility response");
                OperationResult::failure(UNABLE_TO_VALIDATE_COMPATIBILITY)
            }
        }
    }

    async fn submit_compatibility(
        &self,
        key: &SubjectKey,
        schema: &str,
        protocol: KafkaProtocol,
        cluster_identification: &str,
    ) -> OrchestratorResult<RegistryReply> {
        let path = key.compatibility_path();
        let headers = self.auth_headers(cluster_identification)?;
        let body = serde_json::json!({ "schema": schema });
        self.call(&path, protocol, Method::POST, headers, Some(&body))
            .await
    }

    /// Delete the topic's subject from the schema registry environment.
    ///
    /// Uses the request's schema environment and protocol, which may differ
    /// from the topic's own cluster.
    #[instrument(skip(self, request), fields(topic = %request.topic_name))]
    pub async fn delete_schema(&self, request: &ClusterTopicRequest) -> OperationResult {
        let key = match request.schema_subject() {
            Ok(key) => key,
            Err(InvalidSubject::MissingEnvironment) => {
                warn!("Delete requested without a schema environment");
                return OperationResult::failure(SCHEMA_ENV_NOT_CONFIGURED);
            }
            Err(e) => {
                warn!(error = %e, "Refusing subject deletion");
                return OperationResult::failure(INVALID_SUBJECT);
            }
        };

        let headers = match request.schema_cluster_identification.as_deref() {
            Some(cluster_identification) => match self.auth_headers(cluster_identification) {
                Ok(headers) => headers,
                Err(e) => {
                    warn!(subject = %key, error = %e, "Unable to build registry headers");
                    return OperationResult::failure(UNABLE_TO_DELETE_SCHEMA);
                }
            },
            None => HeaderMap::new(),
        };

        let path = key.subject_path();
        match self
            .call(&path, request.schema_env_protocol, Method::DELETE, headers, None)
            .await
        {
            Ok(RegistryReply::Ok(_)) => {
                info!(subject = %key, "Schema subject deleted");
                OperationResult::success()
            }
            Ok(reply) => {
                warn!(subject = %key, status = ?reply.status(), "Registry refused subject deletion");
                OperationResult::failure(UNABLE_TO_DELETE_SCHEMA)
            }
            Err(e) => {
                warn!(subject = %key, error = %e, "Subject deletion failed");
                OperationResult::failure(UNABLE_TO_DELETE_SCHEMA)
            }
        }
    }

    /// Pin a compatibility override on the subject.
    #[instrument(skip(self))]
    pub async fn set_subject_compatibility(
        &self,
        environment: &str,
        protocol: KafkaProtocol,
        cluster_identification: &str,
        topic: &str,
        mode: CompatibilityMode,
    ) -> OperationResult {
        let key = match SubjectKey::new(environment, topic) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Refusing compatibility update");
                return OperationResult::failure(INVALID_SUBJECT);
            }
        };

        match self
            .put_subject_compatibility(&key, protocol, cluster_identification, mode)
            .await
        {
            Ok(()) => {
                info!(subject = %key, %mode, "Subject compatibility updated");
                OperationResult::success_with(&format!("Compatibility set to {}.", mode))
                    .with_data(serde_json::json!({ COMPATIBILITY_KEY: mode }))
            }
            Err(e) => {
                warn!(subject = %key, error = %e, "Subject compatibility update failed");
                OperationResult::failure(UNABLE_TO_SET_COMPATIBILITY)
            }
        }
    }

    async fn put_subject_compatibility(
        &self,
        key: &SubjectKey,
        protocol: KafkaProtocol,
        cluster_identification: &str,
        mode: CompatibilityMode,
    ) -> OrchestratorResult<()> {
        let body = serde_json::json!({ COMPATIBILITY_KEY: mode });
        self.update_subject_config(key, protocol, cluster_identification, Method::PUT, Some(&body))
            .await
    }

    async fn update_subject_config(
        &self,
        key: &SubjectKey,
        protocol: KafkaProtocol,
        cluster_identification: &str,
        method: Method,
        body: Option<&serde_json::Value>,
    ) -> OrchestratorResult<()> {
        let path = key.subject_config_path();
        let headers = self.auth_headers(cluster_identification)?;
        match self.call(&path, protocol, method, headers, body).await? {
            RegistryReply::Ok(_) => Ok(()),
            reply => Err(OrchestratorError::unexpected(&path, reply)),
        }
    }

    /// Register a new version of the topic's value schema.
    ///
    /// With `force_register`, the subject is relaxed to `NONE` for the
    /// registration and its previous override (or absence of one) is
    /// restored afterwards, whatever the registration outcome. If the
    /// registry cannot be reached to read the current override, nothing is
    /// relaxed and the registration fails.
    #[instrument(skip(self, request), fields(topic = %request.topic_name, force = request.force_register))]
    pub async fn register_schema(&self, request: &SchemaRequest) -> OperationResult {
        let key = match request.subject_key() {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Refusing schema registration");
                return OperationResult::failure(INVALID_SUBJECT);
            }
        };

        if !request.force_register {
            return self.post_schema(&key, request).await;
        }

        let previous = match self.subject_override(&key, request.protocol).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(subject = %key, error = %e, "Current compatibility unknown, not relaxing subject");
                return OperationResult::failure(UNABLE_TO_REGISTER_SCHEMA);
            }
        };

        if let Err(e) = self
            .put_subject_compatibility(
                &key,
                request.protocol,
                &request.cluster_identification,
                CompatibilityMode::None,
            )
            .await
        {
            warn!(subject = %key, error = %e, "Unable to relax compatibility for forced registration");
            return OperationResult::failure(UNABLE_TO_REGISTER_SCHEMA);
        }

        let result = self.post_schema(&key, request).await;

        let restored = match previous {
            CompatibilityLookup::Configured(mode) => {
                self.put_subject_compatibility(
                    &key,
                    request.protocol,
                    &request.cluster_identification,
                    mode,
                )
                .await
            }
            CompatibilityLookup::Absent => {
                debug!(subject = %key, "No previous override, clearing subject config");
                self.update_subject_config(
                    &key,
                    request.protocol,
                    &request.cluster_identification,
                    Method::DELETE,
                    None,
                )
                .await
            }
        };
        if let Err(e) = restored {
            warn!(subject = %key, error = %e, "Failed to restore subject compatibility");
        }

        result
    }

    async fn post_schema(&self, key: &SubjectKey, request: &SchemaRequest) -> OperationResult {
        let path = key.versions_path();
        let body = serde_json::json!({ "schema": request.full_schema });

        let reply = match self.auth_headers(&request.cluster_identification) {
            Ok(headers) => {
                self.call(&path, request.protocol, Method::POST, headers, Some(&body))
                    .await
            }
            Err(e) => Err(e),
        };

        match reply {
            Ok(RegistryReply::Ok(body)) => {
                let id = body.get("id").cloned().unwrap_or(serde_json::Value::Null);
                info!(subject = %key, schema_id = %id, "Schema registered");
                OperationResult::success_with(SCHEMA_REGISTERED)
                    .with_data(serde_json::json!({ "id": id }))
            }
            Ok(RegistryReply::Unprocessable(body)) => {
                warn!(subject = %key, %body, "Registry rejected schema as invalid");
                OperationResult::failure(INVALID_SCHEMA)
            }
            Ok(RegistryReply::Rejected { status, .. }) if status == reqwest::StatusCode::CONFLICT => {
                warn!(subject = %key, "Schema conflicts with registered versions");
                OperationResult::failure(SCHEMA_CONFLICT)
            }
            Ok(reply) => {
                warn!(subject = %key, status = ?reply.status(), "Unexpected registration response");
                OperationResult::failure(UNABLE_TO_REGISTER_SCHEMA)
            }
            Err(e) => {
                warn!(subject = %key, error = %e, "Schema registration failed");
                OperationResult::failure(UNABLE_TO_REGISTER_SCHEMA)
            }
        }
    }
}

/// Extract the compatibility mode from a config document.
///
/// Registries report `compatibilityLevel` on reads and `compatibility` on
/// writes; both are accepted.
fn compatibility_level(body: &serde_json::Value) -> Result<CompatibilityMode, String> {
    let raw = body
        .get("compatibilityLevel")
        .or_else(|| body.get(COMPATIBILITY_KEY))
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| format!("missing compatibility level in {}", body))?;
    raw.parse().map_err(|e: schema_orchestrator_core::ParseCompatibilityError| e.to_string())
}

fn incompatible_message(verdict: &CompatibilityVerdict) -> String {
    if verdict.messages.is_empty() {
        SCHEMA_NOT_COMPATIBLE.to_string()
    } else {
        format!("{} {}", SCHEMA_NOT_COMPATIBLE, verdict.messages.join("; "))
    }
}
