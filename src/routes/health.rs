// Health check endpoint
use actix_web::{get, HttpResponse, Result};
use crate::types::HealthResponse;
use chrono::Utc;

fn health_body() -> HealthResponse {
    HealthResponse {
        status: "ok".to_string(),
        time: Utc::now().to_rfc3339(),
        version: option_env!("CARGO_PKG_VERSION").map(|s| s.to_string()),
    }
}

#[get("/healthz")]
pub async fn healthz() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(health_body()))
}

/// Alias for compatibility with external probes
#[get("/health")]
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(health_body()))
}
