//! Per-timer row aggregation for list views.
//!
//! A `TimerRow` is the display shape of one timer: derived status, latest
//! activity timestamps, and total minutes including the live term of an
//! open entry. The live term is computed from the caller's `now` and never
//! persisted.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{round_minutes, TimeEntry, Timer, TimerStatus};

/// One timer as shown in a list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRow {
    pub timer_id: String,
    pub name: String,
    pub status: TimerStatus,
    /// Latest entry start, if any entry exists
    pub started_at: Option<DateTime<Utc>>,
    /// Latest entry end, or the finalize instant when that is later
    pub ended_at: Option<DateTime<Utc>>,
    /// Closed minutes plus the live term while active
    pub duration_minutes: i64,
    pub tags: BTreeSet<String>,
}

impl TimerRow {
    /// Latest activity instant, used by `ListSort::Recent`.
    pub fn recency(&self) -> Option<DateTime<Utc>> {
        self.started_at.max(self.ended_at)
    }
}

/// Status filter for list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFilter {
    All,
    Active,
    Paused,
    Ended,
}

impl ListFilter {
    pub fn matches(&self, status: TimerStatus) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Active => status == TimerStatus::Active,
            ListFilter::Paused => status == TimerStatus::Paused,
            ListFilter::Ended => status == TimerStatus::Ended,
        }
    }
}

/// Sort order for list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSort {
    /// Latest activity first
    Recent,
    /// Case-insensitive name, ascending
    Name,
    /// Displayed minutes, descending
    Duration,
}

/// Aggregate one timer into its display row.
///
/// Returns `None` for invisible timers: no entries and never finalized.
pub fn build_row(timer: &Timer, entries: &[TimeEntry], now: DateTime<Utc>) -> Option<TimerRow> {
    let mut total_ended: i64 = 0;
    let mut last_start: Option<DateTime<Utc>> = None;
    let mut last_end: Option<DateTime<Utc>> = None;
    let mut active_start: Option<DateTime<Utc>> = None;
    let mut has_entries = false;

    for entry in entries.iter().filter(|e| e.timer_id == timer.id) {
        has_entries = true;
        last_start = last_start.max(Some(entry.started_at));
        match entry.ended_at {
            Some(ended) => {
                total_ended += entry.duration_minutes;
                last_end = last_end.max(Some(ended));
            }
            // The newest open interval carries the live term.
            None => active_start = active_start.max(Some(entry.started_at)),
        }
    }

    if !has_entries && timer.finalized_at.is_none() {
        return None;
    }

    let status = TimerStatus::derive(timer.finalized_at, active_start.is_some());
    let mut duration_minutes = total_ended;
    if status == TimerStatus::Active {
        if let Some(start) = active_start {
            duration_minutes += round_minutes((now - start).num_milliseconds());
        }
    }

    Some(TimerRow {
        timer_id: timer.id.clone(),
        name: timer.name.clone(),
        status,
        started_at: last_start,
        ended_at: last_end.max(timer.finalized_at),
        duration_minutes,
        tags: timer.tags.clone(),
    })
}

/// Aggregate every visible timer of one owner.
pub fn build_rows(timers: &[Timer], entries: &[TimeEntry], now: DateTime<Utc>) -> Vec<TimerRow> {
    timers
        .iter()
        .filter_map(|timer| build_row(timer, entries, now))
        .collect()
}

/// Filter and order rows for display.
pub fn list_view(
    mut rows: Vec<TimerRow>,
    filter: ListFilter,
    sort: ListSort,
    tag: Option<&str>,
) -> Vec<TimerRow> {
    rows.retain(|row| filter.matches(row.status));
    if let Some(tag) = tag {
        rows.retain(|row| row.tags.contains(tag));
    }
    match sort {
        ListSort::Recent => rows.sort_by(|a, b| b.recency().cmp(&a.recency())),
        ListSort::Name => {
            rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }
        ListSort::Duration => rows.sort_by(|a, b| b.duration_minutes.cmp(&a.duration_minutes)),
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_timer(name: &str) -> Timer {
        Timer::new("alice", name, Utc::now())
    }

    fn closed_entry(timer: &Timer, start: DateTime<Utc>, minutes: i64) -> TimeEntry {
        let mut entry = TimeEntry::open(timer, start);
        entry.close(start + Duration::minutes(minutes));
        entry
    }

    #[test]
    fn timer_without_entries_is_invisible() {
        let timer = make_timer("Fresh");
        assert!(build_row(&timer, &[], Utc::now()).is_none());
    }

    #[test]
    fn finalized_timer_without_entries_is_visible() {
        let now = Utc::now();
        let mut timer = make_timer("Ended empty");
        timer.finalized_at = Some(now);

        let row = build_row(&timer, &[], now).unwrap();
        assert_eq!(row.status, TimerStatus::Ended);
        assert_eq!(row.duration_minutes, 0);
        assert_eq!(row.started_at, None);
        assert_eq!(row.ended_at, Some(now));
    }

    #[test]
    fn closed_durations_sum() {
        let now = Utc::now();
        let timer = make_timer("Report");
        let entries = vec![
            closed_entry(&timer, now - Duration::hours(3), 25),
            closed_entry(&timer, now - Duration::hours(2), 15),
        ];

        let row = build_row(&timer, &entries, now).unwrap();
        assert_eq!(row.status, TimerStatus::Paused);
        assert_eq!(row.duration_minutes, 40);
        assert_eq!(row.started_at, Some(now - Duration::hours(2)));
    }

    #[test]
    fn live_term_added_while_active() {
        let now = Utc::now();
        let timer = make_timer("Report");
        let entries = vec![
            closed_entry(&timer, now - Duration::hours(2), 30),
            TimeEntry::open(&timer, now - Duration::minutes(10)),
        ];

        let row = build_row(&timer, &entries, now).unwrap();
        assert_eq!(row.status, TimerStatus::Active);
        assert_eq!(row.duration_minutes, 40);
    }

    #[test]
    fn live_term_is_clock_dependent_not_persisted() {
        let now = Utc::now();
        let timer = make_timer("Report");
        let entries = vec![TimeEntry::open(&timer, now)];

        let at_start = build_row(&timer, &entries, now).unwrap();
        assert_eq!(at_start.duration_minutes, 0);

        let later = build_row(&timer, &entries, now + Duration::minutes(90)).unwrap();
        assert_eq!(later.duration_minutes, 90);
    }

    #[test]
    fn live_term_clamps_skewed_clock() {
        let now = Utc::now();
        let timer = make_timer("Report");
        // Open entry started "in the future" relative to the viewing clock.
        let entries = vec![TimeEntry::open(&timer, now + Duration::minutes(5))];

        let row = build_row(&timer, &entries, now).unwrap();
        assert_eq!(row.duration_minutes, 0);
    }

    #[test]
    fn ended_wins_over_lingering_open_entry() {
        let now = Utc::now();
        let mut timer = make_timer("Raced");
        timer.finalized_at = Some(now - Duration::minutes(1));
        let entries = vec![TimeEntry::open(&timer, now - Duration::minutes(30))];

        let row = build_row(&timer, &entries, now).unwrap();
        assert_eq!(row.status, TimerStatus::Ended);
        // No live term on an ended timer.
        assert_eq!(row.duration_minutes, 0);
    }

    #[test]
    fn ended_at_prefers_later_finalize() {
        let now = Utc::now();
        let mut timer = make_timer("Report");
        let entries = vec![closed_entry(&timer, now - Duration::hours(1), 10)];
        timer.finalized_at = Some(now);

        let row = build_row(&timer, &entries, now).unwrap();
        assert_eq!(row.ended_at, Some(now));
    }

    #[test]
    fn list_view_filters_status_and_tag() {
        let now = Utc::now();
        let mut tagged = make_timer("Tagged");
        tagged.tags.insert("billable".to_string());
        let plain = make_timer("Plain");
        let entries = vec![
            closed_entry(&tagged, now - Duration::hours(1), 10),
            TimeEntry::open(&plain, now),
        ];
        let rows = build_rows(&[tagged, plain], &entries, now);
        assert_eq!(rows.len(), 2);

        let active = list_view(rows.clone(), ListFilter::Active, ListSort::Recent, None);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Plain");

        let billable = list_view(rows, ListFilter::All, ListSort::Recent, Some("billable"));
        assert_eq!(billable.len(), 1);
        assert_eq!(billable[0].name, "Tagged");
    }

    #[test]
    fn recent_sort_orders_by_latest_activity() {
        let now = Utc::now();
        let old = make_timer("Old");
        let fresh = make_timer("Fresh");
        let entries = vec![
            closed_entry(&old, now - Duration::days(3), 25),
            closed_entry(&fresh, now - Duration::hours(1), 5),
        ];

        let rows = list_view(
            build_rows(&[old, fresh], &entries, now),
            ListFilter::All,
            ListSort::Recent,
            None,
        );
        assert_eq!(rows[0].name, "Fresh");
        assert_eq!(rows[1].name, "Old");
    }

    #[test]
    fn name_sort_is_case_insensitive() {
        let now = Utc::now();
        let a = make_timer("apple");
        let b = make_timer("Banana");
        let c = make_timer("cherry");
        let entries = vec![
            closed_entry(&b, now, 1),
            closed_entry(&c, now, 1),
            closed_entry(&a, now, 1),
        ];

        let rows = list_view(
            build_rows(&[b, c, a], &entries, now),
            ListFilter::All,
            ListSort::Name,
            None,
        );
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "Banana", "cherry"]);
    }

    #[test]
    fn duration_sort_is_descending() {
        let now = Utc::now();
        let short = make_timer("Short");
        let long = make_timer("Long");
        let entries = vec![
            closed_entry(&short, now - Duration::hours(2), 5),
            closed_entry(&long, now - Duration::hours(3), 90),
        ];

        let rows = list_view(
            build_rows(&[short, long], &entries, now),
            ListFilter::All,
            ListSort::Duration,
            None,
        );
        assert_eq!(rows[0].name, "Long");
    }
}
