use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::AnalyticsStore;
use crate::analytics::models::{Event, NewEvent, Page, SystemTotals, UserStats};
use crate::analytics::mutation::StatsMutation;
use crate::error::StoreError;

// ============================================================================
// PostgreSQL Analytics Store
// ============================================================================
//
// Tables:
// - events      append-only, BIGSERIAL id, indexed on (user_id, created_at)
// - user_stats  UNIQUE(user_id), non-negative counters
//
// Concurrency:
// Get-or-create is INSERT .. ON CONFLICT DO NOTHING followed by a SELECT, and
// a mutation is a single INSERT .. ON CONFLICT DO UPDATE. Two writers racing to
// create the same user's row collide on the unique constraint and the loser's
// insert becomes an increment, so no application-level lock is needed.
//
// Atomicity:
// The event insert and its stats upsert share one transaction.
//
// ============================================================================

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS events (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL CHECK (user_id >= 0),
        event_type TEXT NOT NULL,
        resource TEXT NOT NULL DEFAULT '',
        resource_id BIGINT NOT NULL DEFAULT 0,
        metadata TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS events_user_created_idx
        ON events (user_id, created_at DESC, id DESC)",
    "CREATE TABLE IF NOT EXISTS user_stats (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL UNIQUE CHECK (user_id >= 0),
        tasks_created BIGINT NOT NULL DEFAULT 0 CHECK (tasks_created >= 0),
        tasks_completed BIGINT NOT NULL DEFAULT 0 CHECK (tasks_completed >= 0),
        total_time_spent BIGINT NOT NULL DEFAULT 0 CHECK (total_time_spent >= 0),
        last_active TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS user_stats_last_active_idx ON user_stats (last_active)",
];

const EVENT_COLUMNS: &str = "id, user_id, event_type, resource, resource_id, metadata, created_at";
const STATS_COLUMNS: &str =
    "user_id, tasks_created, tasks_completed, total_time_spent, last_active, updated_at";

const UPSERT_STATS: &str = "INSERT INTO user_stats
        (user_id, tasks_created, tasks_completed, total_time_spent, last_active, updated_at)
    VALUES ($1, $2, $3, $4, $5, $5)
    ON CONFLICT (user_id) DO UPDATE SET
        tasks_created = user_stats.tasks_created + EXCLUDED.tasks_created,
        tasks_completed = user_stats.tasks_completed + EXCLUDED.tasks_completed,
        total_time_spent = user_stats.total_time_spent + EXCLUDED.total_time_spent,
        last_active = GREATEST(user_stats.last_active, EXCLUDED.last_active),
        updated_at = EXCLUDED.updated_at";

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    user_id: i64,
    event_type: String,
    resource: String,
    resource_id: i64,
    metadata: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            user_id: to_u32("user_id", row.user_id)?,
            event_type: row.event_type,
            resource: row.resource,
            resource_id: to_u32("resource_id", row.resource_id)?,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    user_id: i64,
    tasks_created: i64,
    tasks_completed: i64,
    total_time_spent: i64,
    last_active: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StatsRow> for UserStats {
    type Error = StoreError;

    fn try_from(row: StatsRow) -> Result<Self, Self::Error> {
        Ok(UserStats {
            user_id: to_u32("user_id", row.user_id)?,
            tasks_created: to_u64("tasks_created", row.tasks_created)?,
            tasks_completed: to_u64("tasks_completed", row.tasks_completed)?,
            total_time_spent: to_u64("total_time_spent", row.total_time_spent)?,
            last_active: row.last_active,
            updated_at: row.updated_at,
        })
    }
}

fn to_u32(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Backend(format!("column {} out of range: {}", column, value)))
}

fn to_u64(column: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Backend(format!("column {} out of range: {}", column, value)))
}

/// Bind values for UPSERT_STATS. An event without a mutation still upserts
/// with zero deltas so its user gets a row and a fresh `last_active`.
fn upsert_deltas(mutation: Option<StatsMutation>) -> (i64, i64, i64) {
    let (created, completed, minutes) = mutation.map_or((0, 0, 0), |m| m.deltas());
    // Deltas are at most u32::MAX, always representable
    (created as i64, completed as i64, minutes as i64)
}

pub struct PgAnalyticsStore {
    pool: PgPool,
}

impl PgAnalyticsStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent schema creation, run once at startup
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Analytics schema ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}

#[async_trait]
impl AnalyticsStore for PgAnalyticsStore {
    async fn record_event(
        &self,
        event: NewEvent,
        mutation: Option<StatsMutation>,
    ) -> Result<Event, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let row: EventRow = sqlx::query_as(&format!(
            "INSERT INTO events (user_id, event_type, resource, resource_id, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(i64::from(event.user_id))
        .bind(&event.event_type)
        .bind(&event.resource)
        .bind(i64::from(event.resource_id))
        .bind(&event.metadata)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let (created, completed, minutes) = upsert_deltas(mutation);
        sqlx::query(UPSERT_STATS)
            .bind(i64::from(event.user_id))
            .bind(created)
            .bind(completed)
            .bind(minutes)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            event_id = row.id,
            user_id = event.user_id,
            event_type = %event.event_type,
            mutation = ?mutation,
            "Stored event"
        );

        Event::try_from(row)
    }

    async fn events_for_user(&self, user_id: u32, page: Page) -> Result<Vec<Event>, StoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM events
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3",
            EVENT_COLUMNS
        ))
        .bind(i64::from(user_id))
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn get_or_create_stats(&self, user_id: u32) -> Result<UserStats, StoreError> {
        let now = Utc::now();

        let inserted = sqlx::query(
            "INSERT INTO user_stats (user_id, last_active, updated_at)
             VALUES ($1, $2, $2)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(i64::from(user_id))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            tracing::debug!(user_id, "Created stats row");
        }

        let row: StatsRow = sqlx::query_as(&format!(
            "SELECT {} FROM user_stats WHERE user_id = $1",
            STATS_COLUMNS
        ))
        .bind(i64::from(user_id))
        .fetch_one(&self.pool)
        .await?;

        UserStats::try_from(row)
    }

    async fn system_totals(&self, active_since: DateTime<Utc>) -> Result<SystemTotals, StoreError> {
        let (total_users, active_users, tasks_created, tasks_completed, total_time_spent): (
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            "SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE last_active >= $1),
                COALESCE(SUM(tasks_created), 0)::BIGINT,
                COALESCE(SUM(tasks_completed), 0)::BIGINT,
                COALESCE(SUM(total_time_spent), 0)::BIGINT
             FROM user_stats",
        )
        .bind(active_since)
        .fetch_one(&self.pool)
        .await?;

        let (total_events,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(SystemTotals {
            total_users: to_u64("total_users", total_users)?,
            active_users: to_u64("active_users", active_users)?,
            tasks_created: to_u64("tasks_created", tasks_created)?,
            tasks_completed: to_u64("tasks_completed", tasks_completed)?,
            total_time_spent: to_u64("total_time_spent", total_time_spent)?,
            total_events: to_u64("total_events", total_events)?,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
