// ============================================================================
// Review Service
// ============================================================================
//
// Stores and retrieves product reviews. No aggregation, no catalogue checks.
//
// ============================================================================

pub mod handlers;
pub mod models;
pub mod seed;
pub mod store;

pub use handlers::ReviewState;
pub use models::{NewReview, Review, ReviewError};
pub use seed::seed_if_empty;
pub use store::{InMemoryReviewStore, ReviewStore, ScyllaReviewStore};

use actix_web::web;

use crate::error::json_error_handler;
use crate::metrics::metrics_handler;

/// Mount every review route. Expects `web::Data<ReviewState>` and
/// `web::Data<ServiceMetrics>` and `web::Data<ReviewMetrics>` to be
/// registered on the App.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(
            web::scope("/api/reviews")
                .route("", web::post().to(handlers::create_review))
                .route("/user/{user_name}", web::get().to(handlers::reviews_by_user))
                .route("/{product_id}", web::get().to(handlers::reviews_by_product)),
        )
        .route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(metrics_handler));
}
