use actix_web::{web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::models::{NewEvent, Page, SystemStats};
use super::mutation::{mutation_for, MalformedMinutes};
use super::store::AnalyticsStore;
use crate::error::ApiError;
use crate::health::{health_response, ComponentHealth, HealthStatus};
use crate::metrics::AnalyticsMetrics;

/// Shared handler state: the store handle plus the policies that shape
/// how events turn into stats.
pub struct AnalyticsState {
    pub store: Arc<dyn AnalyticsStore>,
    pub malformed_minutes: MalformedMinutes,
    pub active_window_hours: u32,
}

impl AnalyticsState {
    pub fn new(store: Arc<dyn AnalyticsStore>) -> Self {
        Self {
            store,
            malformed_minutes: MalformedMinutes::default(),
            active_window_hours: 24,
        }
    }

    pub fn with_malformed_minutes(mut self, policy: MalformedMinutes) -> Self {
        self.malformed_minutes = policy;
        self
    }

    pub fn with_active_window_hours(mut self, hours: u32) -> Self {
        self.active_window_hours = hours;
        self
    }
}

#[derive(Deserialize, Debug)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn parse_user_id(raw: &str) -> Result<u32, ApiError> {
    raw.parse::<u32>().map_err(|_| ApiError::InvalidUserId)
}

pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Analytics Service is running"
    }))
}

/// POST /analytics/events
pub async fn log_event(
    state: web::Data<AnalyticsState>,
    metrics: web::Data<AnalyticsMetrics>,
    body: web::Json<NewEvent>,
) -> Result<HttpResponse, ApiError> {
    let new_event = body.into_inner();

    let mutation = match mutation_for(&new_event.event_type, &new_event.metadata) {
        Ok(mutation) => mutation,
        Err(e) => {
            metrics.malformed_minutes.inc();
            match state.malformed_minutes {
                MalformedMinutes::Reject => return Err(ApiError::BadRequest(e.to_string())),
                MalformedMinutes::Ignore => {
                    tracing::warn!(
                        user_id = new_event.user_id,
                        metadata = %new_event.metadata,
                        "time_spent metadata is not a minute count, counters left unchanged"
                    );
                    None
                }
            }
        }
    };

    let event = state.store.record_event(new_event, mutation).await?;

    metrics.record_event(&event.event_type);
    if let Some(mutation) = mutation {
        metrics.record_mutation(mutation.kind());
    }

    tracing::info!(
        event_id = event.id,
        user_id = event.user_id,
        event_type = %event.event_type,
        "Event recorded"
    );

    Ok(HttpResponse::Created().json(event))
}

/// GET /analytics/events/user/{user_id}?limit=&offset=
pub async fn user_events(
    state: web::Data<AnalyticsState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_user_id(&path)?;
    let page = Page::new(query.limit, query.offset);

    let events = state.store.events_for_user(user_id, page).await?;
    Ok(HttpResponse::Ok().json(events))
}

/// GET /analytics/stats/user/{user_id}
pub async fn user_stats(
    state: web::Data<AnalyticsState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_user_id(&path)?;
    let stats = state.store.get_or_create_stats(user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /analytics/stats/system
pub async fn system_stats(state: web::Data<AnalyticsState>) -> Result<HttpResponse, ApiError> {
    let active_since = Utc::now() - Duration::hours(i64::from(state.active_window_hours));
    let totals = state.store.system_totals(active_since).await?;
    Ok(HttpResponse::Ok().json(SystemStats::from_totals(totals, state.active_window_hours)))
}

/// GET /health
pub async fn health(state: web::Data<AnalyticsState>) -> HttpResponse {
    let status = match state.store.ping().await {
        Ok(()) => HealthStatus::Healthy,
        Err(e) => {
            tracing::error!(error = %e, "Analytics store health check failed");
            HealthStatus::Unhealthy("store unreachable".to_string())
        }
    };

    health_response(
        &status,
        serde_json::json!({
            "service": "analytics-service",
            "components": [ComponentHealth::new(state.store.backend_name(), &status)],
        }),
    )
}
