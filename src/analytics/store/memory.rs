use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::AnalyticsStore;
use crate::analytics::models::{Event, NewEvent, Page, SystemTotals, UserStats};
use crate::analytics::mutation::StatsMutation;
use crate::error::StoreError;

/// Process-local store. One mutex guards events and stats together, which
/// serialises every get-or-create and makes event + mutation atomic.
#[derive(Default)]
pub struct InMemoryAnalyticsStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    events: Vec<Event>,
    stats: HashMap<u32, UserStats>,
    last_id: i64,
}

impl InMemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stats rows currently held
    pub async fn stats_row_count(&self) -> usize {
        self.inner.lock().await.stats.len()
    }

    pub async fn event_count(&self) -> usize {
        self.inner.lock().await.events.len()
    }
}

#[async_trait]
impl AnalyticsStore for InMemoryAnalyticsStore {
    async fn record_event(
        &self,
        event: NewEvent,
        mutation: Option<StatsMutation>,
    ) -> Result<Event, StoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let user_id = event.user_id;

        // Every event creates the user's row. Compute it first so an overflow
        // leaves nothing behind.
        let mut stats = inner
            .stats
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserStats::new(user_id, now));
        match mutation {
            Some(mutation) => stats.apply(mutation, now)?,
            None => stats.touch(now),
        }

        inner.last_id += 1;
        let stored = event.into_event(inner.last_id, now);
        inner.events.push(stored.clone());
        inner.stats.insert(user_id, stats);

        Ok(stored)
    }

    async fn events_for_user(&self, user_id: u32, page: Page) -> Result<Vec<Event>, StoreError> {
        let inner = self.inner.lock().await;

        let mut events: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(events
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn get_or_create_stats(&self, user_id: u32) -> Result<UserStats, StoreError> {
        let mut inner = self.inner.lock().await;
        let stats = inner
            .stats
            .entry(user_id)
            .or_insert_with(|| {
                tracing::debug!(user_id, "Creating stats row");
                UserStats::new(user_id, Utc::now())
            });
        Ok(stats.clone())
    }

    async fn system_totals(&self, active_since: DateTime<Utc>) -> Result<SystemTotals, StoreError> {
        let inner = self.inner.lock().await;

        let mut totals = SystemTotals {
            total_users: inner.stats.len() as u64,
            total_events: inner.events.len() as u64,
            ..Default::default()
        };

        for stats in inner.stats.values() {
            if stats.last_active >= active_since {
                totals.active_users += 1;
            }
            totals.tasks_created = totals.tasks_created.saturating_add(stats.tasks_created);
            totals.tasks_completed = totals.tasks_completed.saturating_add(stats.tasks_completed);
            totals.total_time_spent = totals.total_time_spent.saturating_add(stats.total_time_spent);
        }

        Ok(totals)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
