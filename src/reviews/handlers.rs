use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::sync::Arc;

use super::models::NewReview;
use super::store::ReviewStore;
use crate::error::ApiError;
use crate::health::{health_response, HealthStatus};
use crate::metrics::ReviewMetrics;

pub struct ReviewState {
    pub store: Arc<dyn ReviewStore>,
    /// Set when startup seeding failed; health reports degraded
    pub seed_failure: Option<String>,
}

impl ReviewState {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self {
            store,
            seed_failure: None,
        }
    }

    pub fn with_seed_failure(mut self, reason: impl Into<String>) -> Self {
        self.seed_failure = Some(reason.into());
        self
    }
}

/// GET /api/reviews/{product_id}
pub async fn reviews_by_product(
    state: web::Data<ReviewState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let reviews = state.store.by_product(&path).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// GET /api/reviews/user/{user_name}
pub async fn reviews_by_user(
    state: web::Data<ReviewState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let reviews = state.store.by_user(&path).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// POST /api/reviews
pub async fn create_review(
    state: web::Data<ReviewState>,
    metrics: web::Data<ReviewMetrics>,
    body: web::Json<NewReview>,
) -> Result<HttpResponse, ApiError> {
    let new_review = body.into_inner();
    new_review
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let review = new_review.into_review(Utc::now());
    state.store.insert(&review).await?;
    metrics.reviews_created.inc();

    tracing::info!(
        review_id = %review.id,
        product_id = %review.product_id,
        rating = review.rating,
        "Review created"
    );

    Ok(HttpResponse::Created().json(review))
}

/// GET /health, with per-product review counts
pub async fn health(state: web::Data<ReviewState>) -> HttpResponse {
    match state.store.counts_by_product().await {
        Ok(counts) => {
            let total: u64 = counts.values().sum();
            let status = match &state.seed_failure {
                Some(reason) => HealthStatus::Degraded(format!("sample seeding failed: {}", reason)),
                None => HealthStatus::Healthy,
            };
            health_response(
                &status,
                serde_json::json!({
                    "service": "review-service",
                    "backend": state.store.backend_name(),
                    "totalReviews": total,
                    "reviewCounts": counts,
                }),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Review store health check failed");
            health_response(
                &HealthStatus::Unhealthy("store unreachable".to_string()),
                serde_json::json!({
                    "service": "review-service",
                    "backend": state.store.backend_name(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::metrics::ServiceMetrics;
    use crate::reviews::configure;
    use crate::reviews::models::Review;
    use crate::reviews::store::InMemoryReviewStore;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;

    macro_rules! app {
        ($store:expr) => {{
            let metrics = ServiceMetrics::new().unwrap();
            let review_metrics = ReviewMetrics::register(metrics.registry()).unwrap();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(ReviewState::new($store)))
                    .app_data(web::Data::new(metrics))
                    .app_data(web::Data::new(review_metrics))
                    .configure(configure),
            )
            .await
        }};
    }

    /// A store whose backend is always down
    struct FailingStore;

    #[async_trait]
    impl ReviewStore for FailingStore {
        async fn insert(&self, _review: &Review) -> Result<(), StoreError> {
            Err(StoreError::backend("connection reset by peer"))
        }
        async fn by_product(&self, _product_id: &str) -> Result<Vec<Review>, StoreError> {
            Err(StoreError::backend("connection reset by peer"))
        }
        async fn by_user(&self, _user_name: &str) -> Result<Vec<Review>, StoreError> {
            Err(StoreError::backend("connection reset by peer"))
        }
        async fn counts_by_product(&self) -> Result<BTreeMap<String, u64>, StoreError> {
            Err(StoreError::backend("connection reset by peer"))
        }
        async fn is_empty(&self) -> Result<bool, StoreError> {
            Err(StoreError::backend("connection reset by peer"))
        }
        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    #[actix_web::test]
    async fn test_post_then_query_by_product() {
        let app = app!(Arc::new(InMemoryReviewStore::new()));

        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .set_json(json!({
                "productId": "1",
                "userName": "user1",
                "rating": 5,
                "comment": "Great smartphone, amazing camera!"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 201);
        let created: Review = test::read_body_json(resp).await;
        assert!(!created.id.is_empty());

        let req = test::TestRequest::get().uri("/api/reviews/1").to_request();
        let reviews: Vec<Review> = test::call_and_read_body_json(&app, req).await;
        let found = reviews.iter().find(|r| r.id == created.id).unwrap();
        assert_eq!(found.product_id, "1");
        assert_eq!(found.user_name, "user1");
        assert_eq!(found.rating, 5);
        assert_eq!(found.comment, "Great smartphone, amazing camera!");
        assert_eq!(found.created_at, created.created_at);
    }

    #[actix_web::test]
    async fn test_query_by_user() {
        let store = Arc::new(InMemoryReviewStore::new());
        let app = app!(store.clone());

        for (product, user) in [("1", "alice"), ("2", "alice"), ("2", "bob")] {
            let req = test::TestRequest::post()
                .uri("/api/reviews")
                .set_json(json!({"productId": product, "userName": user, "rating": 4, "comment": "ok"}))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get().uri("/api/reviews/user/alice").to_request();
        let reviews: Vec<Review> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|r| r.user_name == "alice"));
    }

    #[actix_web::test]
    async fn test_absent_reviews_are_empty_array() {
        let app = app!(Arc::new(InMemoryReviewStore::new()));

        let req = test::TestRequest::get().uri("/api/reviews/does-not-exist").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        let reviews: Vec<Review> = test::read_body_json(resp).await;
        assert!(reviews.is_empty());
    }

    #[actix_web::test]
    async fn test_invalid_reviews_are_400() {
        let store = Arc::new(InMemoryReviewStore::new());
        let app = app!(store.clone());

        let bodies = [
            json!({"productId": "1", "userName": "u", "rating": 7, "comment": "x"}),
            json!({"productId": "", "userName": "u", "rating": 3, "comment": "x"}),
            json!({"productId": "1", "rating": 3, "comment": "x"}),
            json!({"productId": "1", "userName": "u", "rating": "five", "comment": "x"}),
        ];
        for body in bodies {
            let req = test::TestRequest::post().uri("/api/reviews").set_json(&body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status().as_u16(), 400, "{}", body);
        }
        assert_eq!(store.len().await, 0);
    }

    #[actix_web::test]
    async fn test_store_failure_is_generic_500() {
        let app = app!(Arc::new(FailingStore));

        let req = test::TestRequest::get().uri("/api/reviews/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 500);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "internal server error");
    }

    #[actix_web::test]
    async fn test_health_reports_counts() {
        let store = Arc::new(InMemoryReviewStore::new());
        let app = app!(store.clone());

        for product in ["1", "1", "3"] {
            let req = test::TestRequest::post()
                .uri("/api/reviews")
                .set_json(json!({"productId": product, "userName": "u", "rating": 5, "comment": "x"}))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["totalReviews"], 3);
        assert_eq!(body["reviewCounts"]["1"], 2);
        assert_eq!(body["reviewCounts"]["3"], 1);
    }

    #[actix_web::test]
    async fn test_health_unhealthy_when_store_down() {
        let app = app!(Arc::new(FailingStore));

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 503);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "unhealthy");
    }

    #[actix_web::test]
    async fn test_health_degraded_after_failed_seed() {
        let state = ReviewState::new(Arc::new(InMemoryReviewStore::new()))
            .with_seed_failure("timeout");
        let metrics = ServiceMetrics::new().unwrap();
        let review_metrics = ReviewMetrics::register(metrics.registry()).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(metrics))
                .app_data(web::Data::new(review_metrics))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["details"], "sample seeding failed: timeout");
        assert_eq!(body["totalReviews"], 0);
    }

    #[actix_web::test]
    async fn test_metrics_expose_review_counters_only() {
        let app = app!(Arc::new(InMemoryReviewStore::new()));

        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .set_json(json!({"productId": "1", "userName": "u", "rating": 5, "comment": "x"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("reviews_created_total 1"));
        assert!(!text.contains("analytics_"));
    }
}
