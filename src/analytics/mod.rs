// ============================================================================
// Analytics Service
// ============================================================================
//
// Records user events and keeps per-user counters in step with them.
//
// - models    - Event, UserStats, SystemStats, Page
// - mutation  - event type -> counter mutation
// - store     - persistence seam (PostgreSQL, in-memory)
// - handlers  - HTTP endpoints
//
// ============================================================================

pub mod handlers;
pub mod models;
pub mod mutation;
pub mod store;

pub use handlers::AnalyticsState;
pub use models::{Event, NewEvent, Page, SystemStats, SystemTotals, UserStats};
pub use mutation::{mutation_for, MalformedMinutes, MutationError, StatsMutation};
pub use store::{AnalyticsStore, InMemoryAnalyticsStore, PgAnalyticsStore};

use actix_web::web;

use crate::error::{json_error_handler, query_error_handler};
use crate::metrics::metrics_handler;

/// Mount every analytics route. Expects `web::Data<AnalyticsState>` and
/// `web::Data<ServiceMetrics>` and `web::Data<AnalyticsMetrics>` to be
/// registered on the App.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/", web::get().to(handlers::index))
        .service(
            web::scope("/analytics")
                .route("/events", web::post().to(handlers::log_event))
                .route("/events/user/{user_id}", web::get().to(handlers::user_events))
                .route("/stats/user/{user_id}", web::get().to(handlers::user_stats))
                .route("/stats/system", web::get().to(handlers::system_stats)),
        )
        .route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(metrics_handler));
}
