use crate::AppState;

use axum::{Json, extract::State};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    pub uptime: f64,
    pub environment: String,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Server Started",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.uptime(),
        environment: state.environment.clone(),
    })
}
