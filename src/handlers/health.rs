use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "mindgarden-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready once the database answers and the attribute catalog is seeded.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let categories = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
        .fetch_one(&state.db)
        .await;

    let (status, database, catalog) = match categories {
        Ok(n) if n > 0 => (StatusCode::OK, "ok", "ok"),
        Ok(_) => (StatusCode::SERVICE_UNAVAILABLE, "ok", "empty"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "failed", "unknown")
        }
    };

    let body = json!({
        "status": if status == StatusCode::OK { "ready" } else { "not_ready" },
        "checks": { "database": database, "catalog": catalog },
    });
    (status, Json(body))
}
