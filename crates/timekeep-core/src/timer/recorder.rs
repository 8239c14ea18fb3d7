//! Session recorder: start / pause / end.
//!
//! `start` folds resume and create into one command and closes every open
//! entry before opening the next one, so the single-open-interval invariant
//! is self-healing after multi-device races. Absorbed no-ops (duplicate
//! pause, commands against an ended timer) return `None` instead of errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{NotFoundError, Result};
use crate::storage::TimerStore;
use crate::timer::model::{SessionState, TimeEntry, Timer};
use crate::timer::registry::validate_name;

/// Result of a successful `start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOutcome {
    pub timer_id: String,
    pub entry_id: String,
    pub started_at: DateTime<Utc>,
}

/// Result of a `pause` (or the closing half of an `end`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseOutcome {
    pub entry_id: String,
    pub duration_minutes: i64,
}

/// Result of an `end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndOutcome {
    pub finalized_at: DateTime<Utc>,
    /// The entry closed alongside the finalize, when one was open.
    pub closed: Option<PauseOutcome>,
    /// True when the timer was already ended and nothing changed.
    pub already_ended: bool,
}

/// Recorder over a store and a clock.
pub struct SessionRecorder<'a, S: TimerStore> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: TimerStore> SessionRecorder<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Start (or resume) recording against a timer.
    ///
    /// Without a `timer_id` the timer is created first, named by `name`.
    /// Close-before-open: every open entry is closed with a computed
    /// duration before the new one opens, all in one store commit.
    /// Returns `None` against an ended timer.
    pub fn start(
        &self,
        owner: &str,
        timer_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<StartOutcome>> {
        let now = self.clock.now();
        let (timer, created) = match timer_id {
            Some(id) => (self.fetch(owner, id)?, false),
            None => {
                let name = validate_name(name.unwrap_or_default())?;
                (Timer::new(owner, name, now), true)
            }
        };
        if timer.is_ended() {
            return Ok(None);
        }

        let mut closing = if created {
            Vec::new()
        } else {
            self.store.open_entries(owner, &timer.id)?
        };
        for entry in &mut closing {
            entry.close(now);
        }

        let opening = TimeEntry::open(&timer, now);
        self.store
            .commit_start(created.then_some(&timer), &closing, &opening)?;

        Ok(Some(StartOutcome {
            timer_id: timer.id,
            entry_id: opening.id,
            started_at: now,
        }))
    }

    /// Close the open entry, computing its duration.
    ///
    /// Closes every open entry when a race left more than one; the newest
    /// names the outcome. `None` when there was nothing to close: duplicate
    /// pause is the expected outcome of benign races, not an error.
    pub fn pause(&self, owner: &str, timer_id: &str) -> Result<Option<PauseOutcome>> {
        let now = self.clock.now();
        let timer = self.fetch(owner, timer_id)?;
        if timer.is_ended() {
            return Ok(None);
        }

        let mut open = self.store.open_entries(owner, timer_id)?;
        if open.is_empty() {
            return Ok(None);
        }
        for entry in &mut open {
            entry.close(now);
        }
        self.store.close_entries(&open)?;

        Ok(open
            .iter()
            .max_by_key(|e| e.started_at)
            .map(|e| PauseOutcome {
                entry_id: e.id.clone(),
                duration_minutes: e.duration_minutes,
            }))
    }

    /// Close any open entry and finalize the timer in one store commit, so
    /// no counted time is lost between entry close and timer end.
    ///
    /// Tolerant of already-ended timers: returns the existing timestamp.
    pub fn end(&self, owner: &str, timer_id: &str) -> Result<EndOutcome> {
        let now = self.clock.now();
        let mut timer = self.fetch(owner, timer_id)?;
        if let Some(existing) = timer.finalized_at {
            return Ok(EndOutcome {
                finalized_at: existing,
                closed: None,
                already_ended: true,
            });
        }

        let mut closing = self.store.open_entries(owner, timer_id)?;
        for entry in &mut closing {
            entry.close(now);
        }
        timer.finalized_at = Some(now);
        self.store.commit_end(&timer, &closing)?;

        let closed = closing
            .iter()
            .max_by_key(|e| e.started_at)
            .map(|e| PauseOutcome {
                entry_id: e.id.clone(),
                duration_minutes: e.duration_minutes,
            });

        Ok(EndOutcome {
            finalized_at: now,
            closed,
            already_ended: false,
        })
    }

    /// Derive the session state of one timer from the store.
    pub fn session_state(&self, owner: &str, timer_id: &str) -> Result<SessionState> {
        let timer = self.fetch(owner, timer_id)?;
        let entries = self.store.open_entries(owner, timer_id)?;
        Ok(SessionState::derive(&timer, &entries))
    }

    fn fetch(&self, owner: &str, timer_id: &str) -> Result<Timer> {
        self.store
            .get_timer(owner, timer_id)?
            .ok_or_else(|| NotFoundError::Timer(timer_id.to_string()).into())
    }
}
