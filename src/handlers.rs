use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::ai_client::AiClient;
use crate::config::Config;
use crate::errors::AppError;
use crate::leads::LeadService;
use crate::models::{CreateLeadRequest, LeadListResponse, LeadResponse};

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Client for the Groq API (works without a credential in degraded mode).
    pub ai_client: AiClient,
}

/// Health check endpoint.
///
/// Liveness only; bypasses rate limiting so orchestrator checks never fail.
/// Reports whether AI enrichment is active or the service runs degraded
/// without a provider credential.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-intake-api",
            "version": env!("CARGO_PKG_VERSION"),
            "ai_enabled": state.config.groq_api_key.is_some(),
        })),
    )
}

/// POST /leads
///
/// Accepts a sales lead (name, email, message), sanitizes and validates it,
/// persists it and attempts AI enrichment. Returns 201 even when the AI step
/// fails; the response then carries a warning instead of analysis fields.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<LeadResponse>), AppError> {
    payload.sanitize();
    payload.validate()?;

    let service = LeadService::new(state.db.clone(), state.ai_client.clone());
    let response = service.create_lead(&payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /leads
///
/// Returns all stored leads, newest first, including score, analysis and
/// generated email when enrichment has run.
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LeadListResponse>, AppError> {
    let service = LeadService::new(state.db.clone(), state.ai_client.clone());
    let response = service.list_leads().await?;

    Ok(Json(response))
}
