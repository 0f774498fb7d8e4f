use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

use multitech_services::config::{ReviewConfig, StoreBackend};
use multitech_services::logging::init_tracing;
use multitech_services::metrics::{track_requests, ReviewMetrics, ServiceMetrics};
use multitech_services::reviews::{
    self, seed_if_empty, InMemoryReviewStore, ReviewState, ReviewStore, ScyllaReviewStore,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,multitech_services=debug");

    let config = ReviewConfig::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.backend,
        seed_reviews = config.seed_reviews,
        "🚀 Starting review service"
    );

    // === 1. Open the store ===
    let store: Arc<dyn ReviewStore> = match config.backend {
        StoreBackend::Scylla => {
            Arc::new(ScyllaReviewStore::connect(&config.scylla_nodes, &config.keyspace).await?)
        }
        _ => {
            tracing::warn!("Using in-memory review store, data is lost on exit");
            Arc::new(InMemoryReviewStore::new())
        }
    };

    // === 2. Seed sample data into an empty store ===
    let mut state = ReviewState::new(store.clone());
    if config.seed_reviews {
        if let Err(e) = seed_if_empty(store.as_ref()).await {
            tracing::error!(error = %e, "Failed to seed reviews, continuing without samples");
            state = state.with_seed_failure(e.to_string());
        }
    }

    let state = web::Data::new(state);
    let metrics = ServiceMetrics::new()?;
    let review_metrics = web::Data::new(ReviewMetrics::register(metrics.registry())?);
    let metrics = web::Data::new(metrics);

    // === 3. Serve until SIGINT/SIGTERM ===
    tracing::info!("📡 Listening on http://{}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(metrics.clone())
            .app_data(review_metrics.clone())
            .wrap(middleware::from_fn(track_requests))
            .wrap(middleware::Logger::default())
            .configure(reviews::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    tracing::info!("🛑 Review service stopped");
    Ok(())
}
