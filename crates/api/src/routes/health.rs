//! Liveness and readiness probe, mounted at the root rather than `/api/v1`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok` when storage answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Size of the searchable-field snapshot; absent when it cannot load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchable_fields: Option<usize>,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let db_healthy = match dynafield_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health probe could not reach the database");
            false
        }
    };
    let searchable_fields = if db_healthy {
        state.fields.searchable_fields().await.ok().map(|s| s.len())
    } else {
        None
    };

    Json(HealthReport {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        searchable_fields,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
