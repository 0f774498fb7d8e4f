use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

use multitech_services::analytics::{
    self, AnalyticsState, AnalyticsStore, InMemoryAnalyticsStore, PgAnalyticsStore,
};
use multitech_services::config::{AnalyticsConfig, StoreBackend};
use multitech_services::logging::init_tracing;
use multitech_services::metrics::{track_requests, AnalyticsMetrics, ServiceMetrics};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,multitech_services=debug");

    let config = AnalyticsConfig::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.backend,
        active_window_hours = config.active_window_hours,
        malformed_minutes = ?config.malformed_minutes,
        "🚀 Starting analytics service"
    );

    // === 1. Open the store (closed again at shutdown) ===
    let (store, pg_store): (Arc<dyn AnalyticsStore>, Option<Arc<PgAnalyticsStore>>) =
        match config.backend {
            StoreBackend::Postgres => {
                let pg = Arc::new(
                    PgAnalyticsStore::connect(&config.database_url, config.max_connections).await?,
                );
                pg.ensure_schema().await?;
                (pg.clone() as Arc<dyn AnalyticsStore>, Some(pg))
            }
            _ => {
                tracing::warn!("Using in-memory analytics store, data is lost on exit");
                (Arc::new(InMemoryAnalyticsStore::new()) as Arc<dyn AnalyticsStore>, None)
            }
        };

    // === 2. Shared handler state and metrics ===
    let state = web::Data::new(
        AnalyticsState::new(store)
            .with_malformed_minutes(config.malformed_minutes)
            .with_active_window_hours(config.active_window_hours),
    );
    let metrics = ServiceMetrics::new()?;
    let analytics_metrics = web::Data::new(AnalyticsMetrics::register(metrics.registry())?);
    let metrics = web::Data::new(metrics);

    // === 3. Serve until SIGINT/SIGTERM ===
    tracing::info!("📡 Listening on http://{}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(metrics.clone())
            .app_data(analytics_metrics.clone())
            .wrap(middleware::from_fn(track_requests))
            .wrap(middleware::Logger::default())
            .configure(analytics::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    if let Some(pg) = pg_store {
        pg.close().await;
    }

    tracing::info!("🛑 Analytics service stopped");
    Ok(())
}
