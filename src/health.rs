use actix_web::HttpResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Health Reporting
// ============================================================================

/// Health status of a component
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded(msg) | HealthStatus::Unhealthy(msg) => Some(msg),
        }
    }
}

/// Health information for a component (a backing store, usually)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub name: String,
    pub status: &'static str,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: &HealthStatus) -> Self {
        Self {
            name: name.into(),
            status: status.label(),
            last_check: Utc::now(),
            details: status.reason().map(str::to_string),
        }
    }
}

/// Render a health body. Unhealthy maps to 503 so load balancers notice;
/// degraded still answers 200.
pub fn health_response(status: &HealthStatus, mut body: serde_json::Value) -> HttpResponse {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("status".to_string(), serde_json::json!(status.label()));
        if let Some(reason) = status.reason() {
            obj.insert("details".to_string(), serde_json::json!(reason));
        }
    }

    match status {
        HealthStatus::Unhealthy(_) => HttpResponse::ServiceUnavailable().json(body),
        _ => HttpResponse::Ok().json(body),
    }
}
