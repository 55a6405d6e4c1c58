use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

use crate::server::app_state::AppState;

/// HTTP liveness endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// HTTP readiness endpoint: healthy only when storage answers
pub async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    let storage_ok = match state.storage.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            false
        }
    };

    let body = json!({
        "status": if storage_ok { "ready" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "storage": state.storage.storage_type(),
            "storage_ok": storage_ok
        }
    });

    if storage_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
