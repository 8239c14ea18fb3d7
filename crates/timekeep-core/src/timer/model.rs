//! Timer and time-entry data model.
//!
//! A `Timer` is the durable identity of a tracked activity; work against it
//! is recorded as `TimeEntry` intervals. Status is never stored: it is
//! derived from `finalized_at` and the presence of an open entry, so the
//! store stays the single source of truth.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived display status of a timer.
///
/// Precedence when deriving: `Ended` (finalized_at set) beats `Active`
/// (an open entry exists) beats `Paused` (everything else).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimerStatus {
    /// An entry is currently open
    Active,
    /// No open entry, not finalized
    Paused,
    /// Finalized (terminal)
    Ended,
}

impl TimerStatus {
    /// Derive the status from the finalize marker and open-entry presence.
    pub fn derive(finalized_at: Option<DateTime<Utc>>, has_open_entry: bool) -> Self {
        if finalized_at.is_some() {
            TimerStatus::Ended
        } else if has_open_entry {
            TimerStatus::Active
        } else {
            TimerStatus::Paused
        }
    }
}

/// Per-timer session state machine, derived from stored rows.
///
/// ```text
/// PAUSED ──start──> ACTIVE ──pause──> PAUSED ──start──> ACTIVE ──end──> ENDED
/// ```
///
/// `Ended` is terminal: session commands against it are absorbed as no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "UPPERCASE")]
pub enum SessionState {
    Paused,
    Active { open_entry_id: String },
    Ended { finalized_at: DateTime<Utc> },
}

impl SessionState {
    /// Derive the state for `timer` from its entries.
    ///
    /// When several entries are open mid-race, the newest one names the
    /// state; the next session command settles the rest.
    pub fn derive(timer: &Timer, entries: &[TimeEntry]) -> Self {
        if let Some(finalized_at) = timer.finalized_at {
            return SessionState::Ended { finalized_at };
        }
        let open = entries
            .iter()
            .filter(|e| e.timer_id == timer.id && e.is_open())
            .max_by_key(|e| e.started_at);
        match open {
            Some(entry) => SessionState::Active {
                open_entry_id: entry.id.clone(),
            },
            None => SessionState::Paused,
        }
    }

    pub fn status(&self) -> TimerStatus {
        match self {
            SessionState::Paused => TimerStatus::Paused,
            SessionState::Active { .. } => TimerStatus::Active,
            SessionState::Ended { .. } => TimerStatus::Ended,
        }
    }
}

/// A tracked activity owned by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning account
    pub owner_id: String,
    /// Display name
    pub name: String,
    /// Free-form labels; unordered, non-exclusive
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Terminal finalize timestamp (None while the timer is live)
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Timer {
    /// Create a new timer. The name is stored as given; validation happens
    /// in the registry before construction.
    pub fn new(
        owner_id: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Timer {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            name: name.into(),
            tags: BTreeSet::new(),
            created_at,
            finalized_at: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.finalized_at.is_some()
    }
}

/// One recorded work interval against a timer.
///
/// Closed entries are immutable except for `notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning account
    pub owner_id: String,
    /// Timer this interval belongs to
    pub timer_id: String,
    /// Snapshot of the timer's name at open time; survives timer deletion
    pub name: String,
    /// Interval start
    pub started_at: DateTime<Utc>,
    /// Interval end (None while open)
    pub ended_at: Option<DateTime<Utc>>,
    /// Whole minutes, half-up rounded at close time; 0 while open
    pub duration_minutes: i64,
    /// Free-form annotation, mutable after close
    #[serde(default)]
    pub notes: Option<String>,
}

impl TimeEntry {
    /// Open a new entry against `timer` at `started_at`.
    pub fn open(timer: &Timer, started_at: DateTime<Utc>) -> Self {
        TimeEntry {
            id: Uuid::new_v4().to_string(),
            owner_id: timer.owner_id.clone(),
            timer_id: timer.id.clone(),
            name: timer.name.clone(),
            started_at,
            ended_at: None,
            duration_minutes: 0,
            notes: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Close the interval, computing the rounded duration.
    ///
    /// Idempotent: closing an already-closed entry keeps its original end
    /// and duration.
    pub fn close(&mut self, ended_at: DateTime<Utc>) {
        if self.ended_at.is_some() {
            return;
        }
        let elapsed_ms = (ended_at - self.started_at).num_milliseconds();
        self.ended_at = Some(ended_at);
        self.duration_minutes = round_minutes(elapsed_ms);
    }
}

/// Half-up rounding of elapsed milliseconds to whole minutes, in integer
/// arithmetic, clamped to >= 0 so client clock skew never produces a
/// negative duration.
pub fn round_minutes(elapsed_ms: i64) -> i64 {
    if elapsed_ms <= 0 {
        return 0;
    }
    (elapsed_ms + 30_000) / 60_000
}
