//! HTTP API for the schema orchestrator
//!
//! Routes:
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/health` | liveness |
//! | GET | `/topics/schema/:env/:protocol/:cluster_identification/:topic` | fetch all versions |
//! | POST | `/topics/schema` | register schema |
//! | DELETE | `/topics/schema` | delete subject |
//! | POST | `/topics/schema/compatibility` | check compatibility |
//! | PUT | `/topics/schema/compatibility` | set subject compatibility |

pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{AppState, CompatibilityCheckRequest, CompatibilityUpdateRequest};

/// Build the API router over the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/topics/schema/:env/:protocol/:cluster_identification/:topic",
            get(handlers::get_schema),
        )
        .route(
            "/topics/schema",
            post(handlers::register_schema).delete(handlers::delete_schema),
        )
        .route(
            "/topics/schema/compatibility",
            post(handlers::check_compatibility).put(handlers::update_compatibility),
        )
        .with_state(state)
}
