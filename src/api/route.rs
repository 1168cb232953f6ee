use crate::{
    api::{error::ApiError, response::ApiResponse},
    history::HistoryRequest,
    models::SyncResponse,
    state::AppState,
    validation::{
        parse_address_list, validate_address, validate_chain, validate_limit, validate_min_value, validate_skip,
    },
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

// POST /history/sync request body
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub addresses: Vec<String>,
    #[serde(default)]
    pub resume_gaps: bool,
}

// GET /history/readable query parameters
#[derive(Debug, Deserialize)]
pub struct ReadableHistoryQuery {
    pub addresses: String,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub chain: Option<String>,
    #[serde(default)]
    pub include_scam: bool,
    #[serde(default = "default_min_value_usd")]
    pub min_value_usd: f64,
}

fn default_limit() -> usize {
    50
}

fn default_min_value_usd() -> f64 {
    0.01
}

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/history/sync", post(sync_history))
        .route("/history/readable", get(readable_history))
        .route("/catalog/invalidate", post(invalidate_catalog))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

// POST /history/sync handler
async fn sync_history(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    if request.addresses.is_empty() {
        return Err(ApiError::BadRequest("No addresses to sync".to_string()));
    }
    for address in &request.addresses {
        validate_address(address)?;
    }

    info!(
        "Processing sync request for {} addresses (resume_gaps: {})",
        request.addresses.len(),
        request.resume_gaps
    );

    let results = state.sync.sync_all(&request.addresses, request.resume_gaps).await;

    Ok(Json(SyncResponse { results }))
}

// GET /history/readable handler
async fn readable_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReadableHistoryQuery>,
) -> Result<Response, ApiError> {
    let owners = parse_address_list(&params.addresses)?;
    let skip = validate_skip(params.skip)?;
    let limit = validate_limit(params.limit)?;
    let min_value_usd = validate_min_value(params.min_value_usd)?;
    let chain = params.chain.filter(|c| !c.is_empty());
    if let Some(chain) = &chain {
        validate_chain(chain)?;
    }

    info!(
        "Fetching readable history for {} addresses, skip: {}, limit: {}, chain: {:?}",
        owners.len(),
        skip,
        limit,
        chain
    );

    let request = HistoryRequest {
        owners,
        skip,
        limit,
        chain,
        include_scam: params.include_scam,
        min_value_usd,
    };
    let transactions = state.history.readable_history(&request).await?;

    Ok(ApiResponse { data: transactions }.into_response())
}

// POST /catalog/invalidate handler
async fn invalidate_catalog(State(state): State<Arc<AppState>>) -> StatusCode {
    state.catalog.invalidate_all();
    StatusCode::NO_CONTENT
}
