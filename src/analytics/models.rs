use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mutation::StatsMutation;
use crate::error::StoreError;

// ============================================================================
// Analytics Models
// ============================================================================

/// An immutable record of a user action
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub user_id: u32,
    pub event_type: String,
    pub resource: String,
    pub resource_id: u32,
    pub metadata: String,
    pub created_at: DateTime<Utc>,
}

/// Inbound event body. Any client-supplied `id` or `createdAt` is ignored.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub user_id: u32,
    pub event_type: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub resource_id: u32,
    #[serde(default)]
    pub metadata: String,
}

impl NewEvent {
    pub fn into_event(self, id: i64, created_at: DateTime<Utc>) -> Event {
        Event {
            id,
            user_id: self.user_id,
            event_type: self.event_type,
            resource: self.resource,
            resource_id: self.resource_id,
            metadata: self.metadata,
            created_at,
        }
    }
}

/// Per-user running aggregate
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: u32,
    pub tasks_created: u64,
    pub tasks_completed: u64,
    /// Minutes
    pub total_time_spent: u64,
    pub last_active: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    pub fn new(user_id: u32, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            tasks_created: 0,
            tasks_completed: 0,
            total_time_spent: 0,
            last_active: now,
            updated_at: now,
        }
    }

    /// Apply a mutation. Counters only grow; `last_active` never moves back.
    pub fn apply(&mut self, mutation: StatsMutation, now: DateTime<Utc>) -> Result<(), StoreError> {
        let (created, completed, minutes) = mutation.deltas();
        let user_id = self.user_id;
        let overflow = || StoreError::CounterOverflow(user_id);

        let tasks_created = self.tasks_created.checked_add(created).ok_or_else(overflow)?;
        let tasks_completed = self.tasks_completed.checked_add(completed).ok_or_else(overflow)?;
        let total_time_spent = self.total_time_spent.checked_add(minutes).ok_or_else(overflow)?;

        self.tasks_created = tasks_created;
        self.tasks_completed = tasks_completed;
        self.total_time_spent = total_time_spent;
        self.touch(now);
        Ok(())
    }

    /// Record activity without changing any counter
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = self.last_active.max(now);
        self.updated_at = now;
    }
}

/// Raw system-wide counts as read from a store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemTotals {
    pub total_users: u64,
    pub active_users: u64,
    pub tasks_created: u64,
    pub tasks_completed: u64,
    pub total_time_spent: u64,
    pub total_events: u64,
}

/// GET /analytics/stats/system body
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub total_users: u64,
    pub active_users: u64,
    pub tasks_created: u64,
    pub tasks_completed: u64,
    pub total_time_spent: u64,
    pub total_events: u64,
    /// Percentage, completed / created
    pub avg_completion_rate: f64,
    pub active_window_hours: u32,
}

impl SystemStats {
    pub fn from_totals(totals: SystemTotals, active_window_hours: u32) -> Self {
        let avg_completion_rate = if totals.tasks_created == 0 {
            0.0
        } else {
            let rate = totals.tasks_completed as f64 / totals.tasks_created as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        };

        Self {
            total_users: totals.total_users,
            active_users: totals.active_users,
            tasks_created: totals.tasks_created,
            tasks_completed: totals.tasks_completed,
            total_time_spent: totals.total_time_spent,
            total_events: totals.total_events,
            avg_completion_rate,
            active_window_hours,
        }
    }
}

/// Pagination window for event listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}
