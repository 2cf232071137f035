use std::sync::Arc;

use axum::{extract::State, routing, Json, Router};
use chrono::SecondsFormat;
use folio_core_health_contracts::{HealthFeatureService, HealthStatus};

use crate::models::ApiHealth;

pub fn router(service: Arc<impl HealthFeatureService>) -> Router<()> {
    Router::new()
        .route("/health", routing::get(health))
        .with_state(service)
}

/// Liveness of the api. Stays `ok` while email delivery is unavailable, which
/// is reported separately.
async fn health(service: State<Arc<impl HealthFeatureService>>) -> Json<ApiHealth> {
    let HealthStatus { timestamp, email } = service.get_status().await;

    Json(ApiHealth {
        status: "ok",
        message: "Contact API is running",
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        email,
    })
}
