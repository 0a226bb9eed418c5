//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::EventRecord;
use crate::views::{self, CampaignSummary, Contribution};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

/// All routes, without middleware layers.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/campaigns/:id/events", get(get_campaign_events))
        .route("/campaigns/:id/summary", get(get_campaign_summary))
        .route("/contributors/:address/campaigns", get(get_contributor_campaigns))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub campaign_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct ContributorResponse {
    pub address: String,
    pub count: usize,
    pub campaigns: Vec<Contribution>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for IndexerError {
    fn into_response(self) -> Response {
        let status = match &self {
            IndexerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => {
                error!("API request failed: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

fn campaign_id(raw: String) -> Result<String, IndexerError> {
    raw.parse::<u64>()
        .map(|id| id.to_string())
        .map_err(|_| IndexerError::BadRequest(format!("campaign id must be a number, got {raw:?}")))
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /campaigns/:id/events`
///
/// Returns all indexed events for the given campaign.
pub async fn get_campaign_events(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<EventsResponse>, IndexerError> {
    let campaign_id = campaign_id(id)?;
    let events = db::get_events_for_campaign(&state.pool, &campaign_id).await?;
    Ok(Json(EventsResponse {
        campaign_id,
        count: events.len(),
        events,
    }))
}

/// `GET /campaigns/:id/summary`
///
/// Pledged / refunded / withdrawn totals rebuilt from the campaign's events.
pub async fn get_campaign_summary(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<CampaignSummary>, IndexerError> {
    let campaign_id = campaign_id(id)?;
    let events = db::get_events_for_campaign(&state.pool, &campaign_id).await?;
    Ok(Json(views::campaign_summary(&campaign_id, &events)))
}

/// `GET /contributors/:address/campaigns`
///
/// Every campaign the address pledged to, with its net contribution.
pub async fn get_contributor_campaigns(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Result<Json<ContributorResponse>, IndexerError> {
    let events = db::get_contributions_by_actor(&state.pool, &address).await?;
    let campaigns = views::contributions(&events);
    Ok(Json(ContributorResponse {
        address,
        count: campaigns.len(),
        campaigns,
    }))
}

/// `GET /events`
///
/// Returns all indexed events across all campaigns.
pub async fn get_all_events(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<AllEventsResponse>, IndexerError> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(AllEventsResponse {
        count: events.len(),
        events,
    }))
}
