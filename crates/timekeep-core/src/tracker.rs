//! `Tracker` facade: one entry point over registry, recorder, views,
//! analytics, and change notification.
//!
//! Every mutation that commits publishes a `TimerChanged` for its owner;
//! absorbed no-ops publish nothing. Reads never publish.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::{NotFoundError, Result};
use crate::notify::{ChangeEvent, ChangeNotifier, ChangeSubscription};
use crate::stats::{analytics_report, AnalyticsReport, BreakdownMode, RangeFilter};
use crate::storage::TimerStore;
use crate::timer::{
    EndOutcome, PauseOutcome, SessionRecorder, SessionState, StartOutcome, TimerRegistry,
};
use crate::view::{build_rows, list_view, ListFilter, ListSort, TimerRow};

/// Facade over one store. Owns the notifier; hand out clones of the
/// tracker itself via `Arc` when several tasks share it.
pub struct Tracker<S: TimerStore> {
    store: S,
    clock: Arc<dyn Clock>,
    notifier: ChangeNotifier,
}

impl<S: TimerStore> Tracker<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Build with an injected clock. Tests pass a `FixedClock`.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start recording. Creates the timer first when `timer_id` is absent;
    /// `name` is ignored when an id is given. `None` against an ended timer.
    pub fn create_or_resume(
        &self,
        owner: &str,
        name: Option<&str>,
        timer_id: Option<&str>,
    ) -> Result<Option<StartOutcome>> {
        let outcome = self.recorder().start(owner, timer_id, name)?;
        if let Some(outcome) = &outcome {
            tracing::debug!("timer started: {} entry {}", outcome.timer_id, outcome.entry_id);
            self.publish(owner);
        }
        Ok(outcome)
    }

    /// Pause recording. `None` when nothing was open.
    pub fn pause(&self, owner: &str, timer_id: &str) -> Result<Option<PauseOutcome>> {
        let outcome = self.recorder().pause(owner, timer_id)?;
        if let Some(outcome) = &outcome {
            tracing::debug!(
                "timer paused: {} closed {} at {} min",
                timer_id,
                outcome.entry_id,
                outcome.duration_minutes
            );
            self.publish(owner);
        }
        Ok(outcome)
    }

    /// End the timer for good. Tolerant of duplicates.
    pub fn end(&self, owner: &str, timer_id: &str) -> Result<EndOutcome> {
        let outcome = self.recorder().end(owner, timer_id)?;
        if !outcome.already_ended {
            tracing::debug!("timer ended: {} at {}", timer_id, outcome.finalized_at);
            self.publish(owner);
        }
        Ok(outcome)
    }

    /// Delete a timer and its entries.
    pub fn remove(&self, owner: &str, timer_id: &str) -> Result<()> {
        self.registry().remove(owner, timer_id)?;
        tracing::debug!("timer removed: {timer_id}");
        self.publish(owner);
        Ok(())
    }

    pub fn rename(&self, owner: &str, timer_id: &str, name: &str) -> Result<()> {
        self.registry().rename(owner, timer_id, name)?;
        self.publish(owner);
        Ok(())
    }

    /// Replace the tag set wholesale.
    pub fn set_tags<I, T>(&self, owner: &str, timer_id: &str, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.registry().set_tags(owner, timer_id, tags)?;
        self.publish(owner);
        Ok(())
    }

    pub fn add_tag(&self, owner: &str, timer_id: &str, tag: &str) -> Result<()> {
        self.registry().add_tag(owner, timer_id, tag)?;
        self.publish(owner);
        Ok(())
    }

    pub fn remove_tag(&self, owner: &str, timer_id: &str, tag: &str) -> Result<()> {
        self.registry().remove_tag(owner, timer_id, tag)?;
        self.publish(owner);
        Ok(())
    }

    /// Set or clear the notes on one entry. Whitespace-only clears.
    pub fn set_entry_notes(
        &self,
        owner: &str,
        entry_id: &str,
        notes: Option<&str>,
    ) -> Result<()> {
        let mut entry = self
            .store
            .get_entry(owner, entry_id)?
            .ok_or_else(|| NotFoundError::Entry(entry_id.to_string()))?;
        entry.notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self.store.update_entry(&entry)?;
        self.publish(owner);
        Ok(())
    }

    /// Authoritative rows for one owner, live term as of the tracker clock.
    /// This is the pull half of invalidate-then-pull.
    pub fn pull(&self, owner: &str) -> Result<Vec<TimerRow>> {
        let timers = self.store.list_timers(owner)?;
        let entries = self.store.list_entries(owner)?;
        Ok(build_rows(&timers, &entries, self.clock.now()))
    }

    /// Pull, then filter and order for display.
    pub fn list_view(
        &self,
        owner: &str,
        filter: ListFilter,
        sort: ListSort,
        tag: Option<&str>,
    ) -> Result<Vec<TimerRow>> {
        Ok(list_view(self.pull(owner)?, filter, sort, tag))
    }

    /// Duration analytics plus the weekly chart.
    pub fn analytics(
        &self,
        owner: &str,
        range: RangeFilter,
        tag: Option<&str>,
        mode: BreakdownMode,
    ) -> Result<AnalyticsReport> {
        let timers = self.store.list_timers(owner)?;
        let entries = self.store.list_entries(owner)?;
        Ok(analytics_report(
            &timers,
            &entries,
            range,
            tag,
            mode,
            self.clock.now(),
        ))
    }

    /// Session state of one timer.
    pub fn session_state(&self, owner: &str, timer_id: &str) -> Result<SessionState> {
        self.recorder().session_state(owner, timer_id)
    }

    /// Subscribe to this owner's change events.
    pub fn subscribe(&self, owner: &str) -> ChangeSubscription {
        self.notifier.subscribe(owner)
    }

    fn registry(&self) -> TimerRegistry<'_, S> {
        TimerRegistry::new(&self.store, self.clock.as_ref())
    }

    fn recorder(&self) -> SessionRecorder<'_, S> {
        SessionRecorder::new(&self.store, self.clock.as_ref())
    }

    fn publish(&self, owner: &str) {
        self.notifier.publish(owner, ChangeEvent::TimerChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::CoreError;
    use crate::storage::MemoryStore;
    use crate::timer::TimerStatus;
    use chrono::{TimeZone, Utc};

    fn make_tracker() -> (Tracker<MemoryStore>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
        ));
        let tracker = Tracker::with_clock(MemoryStore::new(), clock.clone());
        (tracker, clock)
    }

    #[test]
    fn full_session_produces_one_row() {
        let (tracker, clock) = make_tracker();
        let started = tracker
            .create_or_resume("alice", Some("Report"), None)
            .unwrap()
            .unwrap();
        clock.advance(chrono::Duration::minutes(25));
        let paused = tracker.pause("alice", &started.timer_id).unwrap().unwrap();
        assert_eq!(paused.duration_minutes, 25);

        let rows = tracker
            .list_view("alice", ListFilter::All, ListSort::Recent, None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, TimerStatus::Paused);
        assert_eq!(rows[0].duration_minutes, 25);
    }

    #[test]
    fn mutations_notify_subscribers() {
        let (tracker, _clock) = make_tracker();
        let mut sub = tracker.subscribe("alice");
        let started = tracker
            .create_or_resume("alice", Some("Report"), None)
            .unwrap()
            .unwrap();
        assert_eq!(sub.try_recv(), Some(ChangeEvent::TimerChanged));

        tracker.pause("alice", &started.timer_id).unwrap().unwrap();
        sub.try_recv();

        // Absorbed no-op: pausing again with nothing open publishes nothing.
        assert!(tracker.pause("alice", &started.timer_id).unwrap().is_none());
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn events_stay_within_their_owner() {
        let (tracker, _clock) = make_tracker();
        let mut bob = tracker.subscribe("bob");
        tracker
            .create_or_resume("alice", Some("Report"), None)
            .unwrap();
        assert_eq!(bob.try_recv(), None);
    }

    #[test]
    fn duplicate_end_publishes_once() {
        let (tracker, _clock) = make_tracker();
        let started = tracker
            .create_or_resume("alice", Some("Report"), None)
            .unwrap()
            .unwrap();
        let mut sub = tracker.subscribe("alice");

        let first = tracker.end("alice", &started.timer_id).unwrap();
        assert!(!first.already_ended);
        assert_eq!(sub.try_recv(), Some(ChangeEvent::TimerChanged));

        let second = tracker.end("alice", &started.timer_id).unwrap();
        assert!(second.already_ended);
        assert_eq!(second.finalized_at, first.finalized_at);
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn notes_trim_and_clear() {
        let (tracker, clock) = make_tracker();
        let started = tracker
            .create_or_resume("alice", Some("Report"), None)
            .unwrap()
            .unwrap();
        clock.advance(chrono::Duration::minutes(5));
        tracker.pause("alice", &started.timer_id).unwrap();

        tracker
            .set_entry_notes("alice", &started.entry_id, Some("  standup overran  "))
            .unwrap();
        let entry = tracker
            .store()
            .get_entry("alice", &started.entry_id)
            .unwrap()
            .unwrap();
        assert_eq!(entry.notes.as_deref(), Some("standup overran"));

        tracker
            .set_entry_notes("alice", &started.entry_id, Some("   "))
            .unwrap();
        let entry = tracker
            .store()
            .get_entry("alice", &started.entry_id)
            .unwrap()
            .unwrap();
        assert_eq!(entry.notes, None);
    }

    #[test]
    fn notes_on_unknown_entry_not_found() {
        let (tracker, _clock) = make_tracker();
        let err = tracker
            .set_entry_notes("alice", "nope", Some("text"))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn analytics_cover_the_session() {
        let (tracker, clock) = make_tracker();
        let started = tracker
            .create_or_resume("alice", Some("Report"), None)
            .unwrap()
            .unwrap();
        tracker
            .add_tag("alice", &started.timer_id, "billable")
            .unwrap();
        clock.advance(chrono::Duration::minutes(30));
        tracker.pause("alice", &started.timer_id).unwrap();

        let report = tracker
            .analytics("alice", RangeFilter::All, None, BreakdownMode::Tag)
            .unwrap();
        assert_eq!(report.breakdown.len(), 1);
        assert_eq!(report.breakdown[0].label, "billable");
        assert_eq!(report.breakdown[0].minutes, 30);
    }
}
