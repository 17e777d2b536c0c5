use crate::config::Config;
use crate::enrichment::LeadEngine;
use crate::errors::AppError;
use crate::fallback;
use crate::models::{EnrichedLead, PermitFilters, Pipeline, RelevantCode};
use crate::services::{ContractorService, PermitService};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Lead scorer & filter engine, built once at startup.
    pub engine: LeadEngine,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "steel-leads-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /api/v1/permits
///
/// Main endpoint feeding the permit table, map, and filter ribbon. Queries
/// the permit store with the caller's filter spec, then runs the lead
/// engine (distance, relevance, score, radius cut, best-first sort) over
/// the raw rows.
///
/// Store failures never surface to the client: the bundled sample dataset
/// is substituted and processed identically, so the presentation layer
/// always receives a renderable list.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `filters` - Query parameters carrying the filter spec.
///
/// # Returns
///
/// * `Result<Json<Vec<EnrichedLead>>, AppError>` - Ranked leads, or 400 for
///   an explicitly empty code allow-list.
pub async fn get_permits(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<PermitFilters>,
) -> Result<Json<Vec<EnrichedLead>>, AppError> {
    tracing::info!("GET /api/v1/permits - filters: {:?}", filters);

    let codes = match filters.code_list() {
        Some(codes) if codes.is_empty() => {
            return Err(AppError::BadRequest(
                "codes filter must name at least one permit code".to_string(),
            ));
        }
        Some(codes) => codes,
        None => state.engine.relevance().codes(),
    };

    let service = PermitService::new(state.db.clone());
    let permits = match service
        .fetch_permits(&filters, &codes, state.config.permit_query_limit)
        .await
    {
        Ok(permits) => permits,
        Err(e) => {
            tracing::warn!("Failed to fetch from permit store, using stub data: {}", e);
            fallback::stub_permits()
        }
    };

    let leads = state.engine.rank(&permits, filters.radius);
    tracing::info!("Returning {} ranked leads", leads.len());

    Ok(Json(leads))
}

/// GET /api/v1/permits/codes
///
/// Serves the static relevance table (code, category, priority,
/// description, display color) for filter ribbons and map legends.
pub async fn get_permit_codes(State(state): State<Arc<AppState>>) -> Json<Vec<RelevantCode>> {
    let codes = state
        .engine
        .relevance()
        .iter_sorted()
        .map(|(code, entry)| RelevantCode {
            code: code.clone(),
            category: entry.category,
            priority: entry.priority,
            description: entry.description.clone(),
            color: entry.color.clone(),
        })
        .collect();

    Json(codes)
}

/// GET /api/v1/location
///
/// Serves the fixed business location and the default search radius, used
/// by the map view to center itself and draw the radius ring.
pub async fn get_business_location(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let reference = state.engine.reference_point();
    Json(json!({
        "lat": reference.lat,
        "lng": reference.lng,
        "address": state.config.business_address,
        "defaultRadius": state.engine.default_radius(),
    }))
}

/// GET /api/v1/pipelines
///
/// Serves the contractor status boards. Store failures degrade to an empty
/// pipeline list rather than an error, matching the permit fallback policy.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// * `Json<Vec<Pipeline>>` - The four fixed contractor pipelines, or empty.
pub async fn get_pipelines(State(state): State<Arc<AppState>>) -> Json<Vec<Pipeline>> {
    tracing::info!("GET /api/v1/pipelines");

    let service = ContractorService::new(state.db.clone());
    match service.fetch_pipelines().await {
        Ok(pipelines) => Json(pipelines),
        Err(e) => {
            tracing::warn!("Failed to fetch contractor data: {}", e);
            Json(Vec::new())
        }
    }
}
