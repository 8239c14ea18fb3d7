//! Analytics over closed time entries.
//!
//! This module provides reporting for tracked time, including per-tag and
//! per-project duration breakdowns and the stacked weekly chart. All
//! aggregation runs over closed entries in integer minutes; hours appear
//! only at the reporting surface, rounded to one decimal.

mod breakdown;
mod weekly;

pub use breakdown::{breakdown_by_project, breakdown_by_tag, BreakdownSlice};
pub use weekly::{weekly_stacked, DayRow, WeeklyReport, OTHER_LABEL, TOP_LABELS};

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimeEntry, Timer};

/// Time window restricting which entries a report covers.
///
/// Membership is decided by `started_at` alone; an entry that straddles a
/// window edge counts wholly toward the window its start falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeFilter {
    All,
    /// Local midnight up to now
    Today,
    /// Local Monday 00:00 up to now
    Week,
}

impl RangeFilter {
    /// Lower window edge, `None` for `All`.
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            RangeFilter::All => None,
            RangeFilter::Today => Some(local_midnight(now)),
            RangeFilter::Week => Some(local_week_start(now)),
        }
    }

    pub fn contains(&self, started_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.window_start(now) {
            Some(start) => started_at >= start && started_at <= now,
            None => true,
        }
    }
}

/// Grouping dimension for duration breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownMode {
    Tag,
    Project,
}

/// Combined analytics payload: one breakdown plus the weekly chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub range: RangeFilter,
    pub mode: BreakdownMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub breakdown: Vec<BreakdownSlice>,
    pub weekly: WeeklyReport,
}

/// Assemble the full report. The breakdown honors `range`; the weekly chart
/// always covers the current local week.
pub fn analytics_report(
    timers: &[Timer],
    entries: &[TimeEntry],
    range: RangeFilter,
    tag: Option<&str>,
    mode: BreakdownMode,
    now: DateTime<Utc>,
) -> AnalyticsReport {
    let breakdown = match mode {
        BreakdownMode::Tag => breakdown_by_tag(timers, entries, range, tag, now),
        BreakdownMode::Project => breakdown_by_project(timers, entries, range, tag, now),
    };
    AnalyticsReport {
        range,
        mode,
        tag: tag.map(str::to_string),
        breakdown,
        weekly: weekly_stacked(timers, entries, tag, now),
    }
}

/// UTC instant of the most recent local midnight.
pub fn local_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let local = now.with_timezone(&Local);
    now - (local.time() - NaiveTime::MIN)
}

/// UTC instant of the current local week's Monday 00:00.
pub fn local_week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let local = now.with_timezone(&Local);
    let days_back = local.weekday().num_days_from_monday() as i64;
    local_midnight(now) - Duration::days(days_back)
}

pub(crate) fn index_timers(timers: &[Timer]) -> HashMap<&str, &Timer> {
    timers.iter().map(|t| (t.id.as_str(), t)).collect()
}

/// Tag filter check against the owning timer. Entries whose timer is gone
/// never match a tag filter.
pub(crate) fn tag_matches(timer: Option<&Timer>, tag: Option<&str>) -> bool {
    match tag {
        None => true,
        Some(tag) => timer.is_some_and(|t| t.tags.contains(tag)),
    }
}

/// Display label for an entry: the owning timer's current name, or the
/// entry's stored snapshot when the timer is gone.
pub(crate) fn label_for<'a>(timer: Option<&'a Timer>, entry: &'a TimeEntry) -> &'a str {
    match timer {
        Some(t) => t.name.as_str(),
        None => entry.name.as_str(),
    }
}
