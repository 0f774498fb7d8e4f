use std::str::FromStr;

// ============================================================================
// Stats Mutation Dispatch
// ============================================================================
//
// Pure mapping from an event's type tag (plus metadata, for time_spent) to the
// counter change it implies. Unknown types produce no mutation; the event is
// still stored by the caller.
//
// ============================================================================

pub const TASK_CREATED: &str = "task_created";
pub const TASK_COMPLETED: &str = "task_completed";
pub const TIME_SPENT: &str = "time_spent";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsMutation {
    TaskCreated,
    TaskCompleted,
    TimeSpent(u32),
}

impl StatsMutation {
    /// Metric label for this mutation
    pub fn kind(&self) -> &'static str {
        match self {
            StatsMutation::TaskCreated => TASK_CREATED,
            StatsMutation::TaskCompleted => TASK_COMPLETED,
            StatsMutation::TimeSpent(_) => TIME_SPENT,
        }
    }

    /// (tasks_created, tasks_completed, minutes) increments
    pub fn deltas(&self) -> (u64, u64, u64) {
        match *self {
            StatsMutation::TaskCreated => (1, 0, 0),
            StatsMutation::TaskCompleted => (0, 1, 0),
            StatsMutation::TimeSpent(minutes) => (0, 0, u64::from(minutes)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("time_spent metadata must be a whole number of minutes, got {0:?}")]
    InvalidMinutes(String),
}

/// What to do with a `time_spent` event whose metadata is not a minute count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedMinutes {
    /// Store the event, leave counters untouched, log a warning
    #[default]
    Ignore,
    /// Refuse the whole request with 400; nothing is stored
    Reject,
}

impl FromStr for MalformedMinutes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(MalformedMinutes::Ignore),
            "reject" => Ok(MalformedMinutes::Reject),
            other => Err(format!("expected 'ignore' or 'reject', got '{}'", other)),
        }
    }
}

/// Derive the stats mutation for an event
pub fn mutation_for(event_type: &str, metadata: &str) -> Result<Option<StatsMutation>, MutationError> {
    match event_type {
        TASK_CREATED => Ok(Some(StatsMutation::TaskCreated)),
        TASK_COMPLETED => Ok(Some(StatsMutation::TaskCompleted)),
        TIME_SPENT => metadata
            .trim()
            .parse::<u32>()
            .map(|minutes| Some(StatsMutation::TimeSpent(minutes)))
            .map_err(|_| MutationError::InvalidMinutes(metadata.to_string())),
        _ => Ok(None),
    }
}
