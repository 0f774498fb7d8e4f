// ============================================================================
// Analytics Store
// ============================================================================
//
// Persistence seam for events and per-user stats. Two implementations:
// - PgAnalyticsStore       - PostgreSQL via sqlx (production)
// - InMemoryAnalyticsStore - process-local, used for tests and demos
//
// Both guarantee:
// 1. record_event stores the event and its stats mutation atomically
// 2. at most one stats row per user, even under concurrent first writes
// 3. counters never decrease, last_active never moves backwards
//
// ============================================================================

mod memory;
mod postgres;

pub use memory::InMemoryAnalyticsStore;
pub use postgres::PgAnalyticsStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{Event, NewEvent, Page, SystemTotals, UserStats};
use super::mutation::StatsMutation;
use crate::error::StoreError;

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Persist an event (server assigns id and timestamp) and apply its
    /// derived mutation, creating the user's stats row if needed.
    async fn record_event(
        &self,
        event: NewEvent,
        mutation: Option<StatsMutation>,
    ) -> Result<Event, StoreError>;

    /// A user's events, newest first
    async fn events_for_user(&self, user_id: u32, page: Page) -> Result<Vec<Event>, StoreError>;

    /// Read the user's stats row, creating a zeroed one if absent
    async fn get_or_create_stats(&self, user_id: u32) -> Result<UserStats, StoreError>;

    /// Live system-wide totals; users active at or after `active_since` count as active
    async fn system_totals(&self, active_since: DateTime<Utc>) -> Result<SystemTotals, StoreError>;

    /// Cheap liveness check
    async fn ping(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}
