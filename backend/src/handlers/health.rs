//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::services::MaintenanceService;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = MaintenanceService::new(state.db).database_status().await;
    let database = if status.connected {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}

/// Root endpoint
pub async fn root() -> &'static str {
    "Pharmacy Ledger API"
}
