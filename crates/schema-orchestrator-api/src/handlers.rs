//! API request handlers
//!
//! Each handler unpacks the request, delegates to the [`SchemaOrchestrator`]
//! and returns either the fetched data or the operation's [`OperationResult`].
//! Pass/fail outcomes travel in the result body with HTTP 200; only hard
//! failures of data-returning calls map to error statuses.

use axum::{
    extract::{Path, State},
    Json,
};
use schema_orchestrator_core::{
    ClusterTopicRequest, CompatibilityMode, KafkaProtocol, OperationResult, SchemaMap,
    SchemaRequest,
};
use schema_orchestrator_service::SchemaOrchestrator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{ApiError, ApiResult};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SchemaOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: SchemaOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

/// Candidate schema to validate against a topic's latest registered version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityCheckRequest {
    pub schema_full: String,
    pub topic_name: String,
    #[serde(default)]
    pub protocol: KafkaProtocol,
    pub env: String,
    pub cluster_identification: String,
}

/// New compatibility override for a topic's subject
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityUpdateRequest {
    pub env: String,
    #[serde(default)]
    pub protocol: KafkaProtocol,
    pub cluster_identification: String,
    pub topic_name: String,
    pub compatibility: CompatibilityMode,
}

// ============================================================================
// Schema handlers
// ============================================================================

/// Fetch every registered version of a topic's value schema
#[instrument(skip(state))]
pub async fn get_schema(
    State(state): State<AppState>,
    Path((env, protocol, cluster_identification, topic)): Path<(String, String, String, String)>,
) -> ApiResult<Json<SchemaMap>> {
    let protocol: KafkaProtocol = protocol
        .parse()
        .map_err(|e: schema_orchestrator_core::ParseProtocolError| ApiError::bad_request(e.to_string()))?;

    let schemas = state
        .orchestrator
        .get_schema(&env, protocol, &cluster_identification, &topic)
        .await?;

    debug!(versions = schemas.len(), "Returning schema versions");
    Ok(Json(schemas))
}

/// Validate a candidate schema before promotion
#[instrument(skip(state, request), fields(topic = %request.topic_name, env = %request.env))]
pub async fn check_compatibility(
    State(state): State<AppState>,
    Json(request): Json<CompatibilityCheckRequest>,
) -> Json<OperationResult> {
    let result = state
        .orchestrator
        .check_compatibility(
            &request.schema_full,
            &request.topic_name,
            request.protocol,
            &request.env,
            &request.cluster_identification,
        )
        .await;

    info!(success = result.success, "Compatibility check finished");
    Json(result)
}

/// Register a new schema version for a topic
#[instrument(skip(state, request), fields(topic = %request.topic_name, env = %request.env))]
pub async fn register_schema(
    State(state): State<AppState>,
    Json(request): Json<SchemaRequest>,
) -> Json<OperationResult> {
    let result = state.orchestrator.register_schema(&request).await;
    info!(success = result.success, "Schema registration finished");
    Json(result)
}

/// Set a compatibility override on a topic's subject
#[instrument(skip(state, request), fields(topic = %request.topic_name, env = %request.env))]
pub async fn update_compatibility(
    State(state): State<AppState>,
    Json(request): Json<CompatibilityUpdateRequest>,
) -> Json<OperationResult> {
    let result = state
        .orchestrator
        .set_subject_compatibility(
            &request.env,
            request.protocol,
            &request.cluster_identification,
            &request.topic_name,
            request.compatibility,
        )
        .await;

    Json(result)
}

/// Delete a topic's subject from its schema registry
#[instrument(skip(state, request), fields(topic = %request.topic_name))]
pub async fn delete_schema(
    State(state): State<AppState>,
    Json(request): Json<ClusterTopicRequest>,
) -> Json<OperationResult> {
    let result = state.orchestrator.delete_schema(&request).await;
    info!(success = result.success, "Schema deletion finished");
    Json(result)
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
