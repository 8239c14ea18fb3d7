//! Optimistic row projection with commit/rollback reconciliation.
//!
//! A `RowProjection` is the session-local copy of one owner's list view.
//! Mutations are staged against it immediately so the caller never waits on
//! the store round trip, then reconciled with the authoritative rows pulled
//! after the store acknowledges. The protocol is last-full-snapshot-wins:
//! `commit` replaces the rows wholesale and never merges fields, so
//! out-of-order responses cannot corrupt the projection.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::{round_minutes, TimerStatus};
use crate::view::TimerRow;

/// Prefix marking rows created optimistically, before the store assigned a
/// real id.
pub const PENDING_PREFIX: &str = "pending-";

/// True for ids minted by [`RowProjection::stage`] rather than the store.
pub fn is_pending(id: &str) -> bool {
    id.starts_with(PENDING_PREFIX)
}

/// A mutation the session wants reflected immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SessionCommand {
    Start {
        timer_id: Option<String>,
        name: Option<String>,
    },
    Pause {
        timer_id: String,
    },
    End {
        timer_id: String,
    },
    Remove {
        timer_id: String,
    },
    Rename {
        timer_id: String,
        name: String,
    },
    SetTags {
        timer_id: String,
        tags: BTreeSet<String>,
    },
}

/// Session-local list view with a one-deep undo point.
///
/// The saved snapshot is taken on the first stage after a commit, so a burst
/// of staged commands rolls back to the last authoritative state, not to an
/// intermediate optimistic one.
#[derive(Debug, Clone, Default)]
pub struct RowProjection {
    rows: Vec<TimerRow>,
    saved: Option<Vec<TimerRow>>,
}

impl RowProjection {
    pub fn new(rows: Vec<TimerRow>) -> Self {
        Self { rows, saved: None }
    }

    pub fn rows(&self) -> &[TimerRow] {
        &self.rows
    }

    /// True while staged edits have not been confirmed or rolled back.
    pub fn is_dirty(&self) -> bool {
        self.saved.is_some()
    }

    /// Apply `cmd` optimistically. Returns the id of the touched row, a
    /// fresh `pending-` id when the command created one, or `None` when the
    /// command had nothing to do.
    ///
    /// Validation happens before staging; this only mirrors edits the store
    /// is expected to accept.
    pub fn stage(&mut self, cmd: &SessionCommand, now: DateTime<Utc>) -> Option<String> {
        let fresh = self.saved.is_none();
        if fresh {
            self.saved = Some(self.rows.clone());
        }
        let touched = match cmd {
            SessionCommand::Start { timer_id, name } => match timer_id {
                Some(id) => self.stage_resume(id, now),
                None => Some(self.stage_create(name.as_deref().unwrap_or_default(), now)),
            },
            SessionCommand::Pause { timer_id } => self.stage_close(timer_id, now, false),
            SessionCommand::End { timer_id } => self.stage_close(timer_id, now, true),
            SessionCommand::Remove { timer_id } => {
                let before = self.rows.len();
                self.rows.retain(|row| row.timer_id != *timer_id);
                (self.rows.len() < before).then(|| timer_id.clone())
            }
            SessionCommand::Rename { timer_id, name } => self.row_mut(timer_id).map(|row| {
                row.name = name.clone();
                timer_id.clone()
            }),
            SessionCommand::SetTags { timer_id, tags } => self.row_mut(timer_id).map(|row| {
                row.tags = tags.clone();
                timer_id.clone()
            }),
        };
        // An absorbed command leaves nothing to confirm or roll back.
        if touched.is_none() && fresh {
            self.saved = None;
        }
        touched
    }

    /// Replace the projection with the authoritative rows. Last full
    /// snapshot wins; any staged state is confirmed and forgotten.
    pub fn commit(&mut self, rows: Vec<TimerRow>) {
        self.rows = rows;
        self.saved = None;
    }

    /// Restore the pre-stage snapshot after a failed mutation.
    pub fn rollback(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.rows = saved;
        }
    }

    fn stage_create(&mut self, name: &str, now: DateTime<Utc>) -> String {
        let temp_id = format!("{PENDING_PREFIX}{}", Uuid::new_v4());
        self.rows.push(TimerRow {
            timer_id: temp_id.clone(),
            name: name.to_string(),
            status: TimerStatus::Active,
            started_at: Some(now),
            ended_at: None,
            duration_minutes: 0,
            tags: BTreeSet::new(),
        });
        temp_id
    }

    fn stage_resume(&mut self, timer_id: &str, now: DateTime<Utc>) -> Option<String> {
        let row = self.row_mut(timer_id)?;
        if row.status == TimerStatus::Ended {
            return None;
        }
        row.status = TimerStatus::Active;
        row.started_at = Some(now);
        Some(timer_id.to_string())
    }

    fn stage_close(&mut self, timer_id: &str, now: DateTime<Utc>, end: bool) -> Option<String> {
        let row = self.row_mut(timer_id)?;
        if row.status == TimerStatus::Ended {
            return None;
        }
        if !end && row.status != TimerStatus::Active {
            return None;
        }
        if row.status == TimerStatus::Active {
            if let Some(start) = row.started_at {
                row.duration_minutes += round_minutes((now - start).num_milliseconds());
            }
        }
        row.status = if end {
            TimerStatus::Ended
        } else {
            TimerStatus::Paused
        };
        row.ended_at = Some(now);
        Some(timer_id.to_string())
    }

    fn row_mut(&mut self, timer_id: &str) -> Option<&mut TimerRow> {
        self.rows.iter_mut().find(|row| row.timer_id == timer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_row(id: &str, name: &str, status: TimerStatus) -> TimerRow {
        TimerRow {
            timer_id: id.to_string(),
            name: name.to_string(),
            status,
            started_at: Some(Utc::now() - Duration::minutes(10)),
            ended_at: None,
            duration_minutes: 30,
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn staged_start_creates_pending_row() {
        let mut projection = RowProjection::default();
        let id = projection
            .stage(
                &SessionCommand::Start {
                    timer_id: None,
                    name: Some("Report".to_string()),
                },
                Utc::now(),
            )
            .unwrap();

        assert!(is_pending(&id));
        assert_eq!(projection.rows().len(), 1);
        assert_eq!(projection.rows()[0].name, "Report");
        assert_eq!(projection.rows()[0].status, TimerStatus::Active);
        assert!(projection.is_dirty());
    }

    #[test]
    fn staged_pause_folds_live_duration() {
        let now = Utc::now();
        let mut row = make_row("t1", "Report", TimerStatus::Active);
        row.started_at = Some(now - Duration::minutes(10));
        let mut projection = RowProjection::new(vec![row]);

        let touched = projection.stage(
            &SessionCommand::Pause {
                timer_id: "t1".to_string(),
            },
            now,
        );

        assert_eq!(touched.as_deref(), Some("t1"));
        let row = &projection.rows()[0];
        assert_eq!(row.status, TimerStatus::Paused);
        assert_eq!(row.duration_minutes, 40);
        assert_eq!(row.ended_at, Some(now));
    }

    #[test]
    fn pause_on_paused_row_is_absorbed() {
        let mut projection =
            RowProjection::new(vec![make_row("t1", "Report", TimerStatus::Paused)]);
        let touched = projection.stage(
            &SessionCommand::Pause {
                timer_id: "t1".to_string(),
            },
            Utc::now(),
        );
        assert_eq!(touched, None);
        assert_eq!(projection.rows()[0].duration_minutes, 30);
        assert!(!projection.is_dirty());
    }

    #[test]
    fn staged_end_flips_status_even_when_paused() {
        let now = Utc::now();
        let mut projection =
            RowProjection::new(vec![make_row("t1", "Report", TimerStatus::Paused)]);
        projection.stage(
            &SessionCommand::End {
                timer_id: "t1".to_string(),
            },
            now,
        );

        let row = &projection.rows()[0];
        assert_eq!(row.status, TimerStatus::Ended);
        // No live term on a paused row.
        assert_eq!(row.duration_minutes, 30);
        assert_eq!(row.ended_at, Some(now));
    }

    #[test]
    fn commands_on_ended_rows_are_absorbed() {
        let mut projection =
            RowProjection::new(vec![make_row("t1", "Report", TimerStatus::Ended)]);
        let resumed = projection.stage(
            &SessionCommand::Start {
                timer_id: Some("t1".to_string()),
                name: None,
            },
            Utc::now(),
        );
        assert_eq!(resumed, None);
        assert_eq!(projection.rows()[0].status, TimerStatus::Ended);
    }

    #[test]
    fn rollback_restores_the_pre_stage_snapshot() {
        let mut projection =
            RowProjection::new(vec![make_row("t1", "Report", TimerStatus::Paused)]);
        let now = Utc::now();
        projection.stage(
            &SessionCommand::Rename {
                timer_id: "t1".to_string(),
                name: "Renamed".to_string(),
            },
            now,
        );
        projection.stage(
            &SessionCommand::Remove {
                timer_id: "t1".to_string(),
            },
            now,
        );
        assert!(projection.rows().is_empty());

        projection.rollback();
        assert_eq!(projection.rows().len(), 1);
        assert_eq!(projection.rows()[0].name, "Report");
        assert!(!projection.is_dirty());
    }

    #[test]
    fn commit_replaces_rows_wholesale() {
        let mut projection =
            RowProjection::new(vec![make_row("t1", "Report", TimerStatus::Active)]);
        projection.stage(
            &SessionCommand::Rename {
                timer_id: "t1".to_string(),
                name: "Optimistic".to_string(),
            },
            Utc::now(),
        );

        projection.commit(vec![make_row("t1", "Authoritative", TimerStatus::Active)]);
        assert_eq!(projection.rows()[0].name, "Authoritative");
        assert!(!projection.is_dirty());
    }

    #[test]
    fn later_commit_wins_over_earlier_one() {
        let mut projection = RowProjection::default();
        projection.commit(vec![make_row("t1", "First pull", TimerStatus::Paused)]);
        projection.commit(vec![
            make_row("t1", "Second pull", TimerStatus::Paused),
            make_row("t2", "New row", TimerStatus::Active),
        ]);

        assert_eq!(projection.rows().len(), 2);
        assert_eq!(projection.rows()[0].name, "Second pull");
    }

    #[test]
    fn stage_on_unknown_id_does_nothing() {
        let mut projection = RowProjection::default();
        let touched = projection.stage(
            &SessionCommand::Pause {
                timer_id: "missing".to_string(),
            },
            Utc::now(),
        );
        assert_eq!(touched, None);
        assert!(projection.rows().is_empty());
        assert!(!projection.is_dirty());
    }

    #[test]
    fn burst_of_stages_keeps_the_first_snapshot() {
        let mut projection =
            RowProjection::new(vec![make_row("t1", "Original", TimerStatus::Paused)]);
        let now = Utc::now();
        for name in ["One", "Two", "Three"] {
            projection.stage(
                &SessionCommand::Rename {
                    timer_id: "t1".to_string(),
                    name: name.to_string(),
                },
                now,
            );
        }
        assert_eq!(projection.rows()[0].name, "Three");

        projection.rollback();
        assert_eq!(projection.rows()[0].name, "Original");
    }

    #[test]
    fn set_tags_replaces_the_whole_set() {
        let mut row = make_row("t1", "Report", TimerStatus::Paused);
        row.tags.insert("old".to_string());
        let mut projection = RowProjection::new(vec![row]);

        let tags: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        projection.stage(
            &SessionCommand::SetTags {
                timer_id: "t1".to_string(),
                tags: tags.clone(),
            },
            Utc::now(),
        );
        assert_eq!(projection.rows()[0].tags, tags);
    }
}
