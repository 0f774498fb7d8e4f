// ============================================================================
// multitech_services
// ============================================================================
//
// Two independent HTTP services sharing one crate:
//
// - analytics   - user events + per-user/system counters over PostgreSQL
// - reviews     - product reviews over ScyllaDB
//
// Shared plumbing: config (env), error (HTTP taxonomy), health, logging,
// metrics (Prometheus).
//
// ============================================================================

pub mod analytics;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod reviews;
