//! Stacked weekly chart: hours per day per timer label, Monday to Sunday.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimeEntry, Timer};

use super::{index_timers, label_for, local_week_start, tag_matches};

/// Labels ranked above the fold; everything else merges into one slice.
pub const TOP_LABELS: usize = 4;
/// Bucket name for labels below the fold.
pub const OTHER_LABEL: &str = "Other";

/// One chart day. `hours` carries only labels with time on that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRow {
    /// Weekday abbreviation (Mon..Sun)
    pub day: String,
    pub date: NaiveDate,
    pub hours: BTreeMap<String, f64>,
}

/// The assembled weekly chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    /// Local Monday the chart starts on
    pub week_start: NaiveDate,
    /// Legend: ranked kept labels, then `Other` when anything folded
    pub labels: Vec<String>,
    /// Exactly seven rows, Monday first
    pub days: Vec<DayRow>,
    pub total_hours: f64,
    /// Same weekday span one week earlier, for the week-over-week delta
    pub previous_total_hours: f64,
    /// Weekday with the most hours; first occurrence wins ties, `None` for
    /// an empty week
    pub max_day: Option<String>,
    /// Weekday with the fewest non-zero hours
    pub min_day: Option<String>,
}

/// Build the current-week stacked chart from closed entries.
///
/// Entries are bucketed by the local day their `started_at` falls on.
/// Labels are ranked by whole-week minutes; the top [`TOP_LABELS`] keep
/// their own stack, the rest fold into [`OTHER_LABEL`].
pub fn weekly_stacked(
    timers: &[Timer],
    entries: &[TimeEntry],
    tag: Option<&str>,
    now: DateTime<Utc>,
) -> WeeklyReport {
    let week_start = local_week_start(now);
    let week_start_date = week_start.with_timezone(&Local).date_naive();
    let index = index_timers(timers);

    // minutes per day per label, plus whole-week totals per label
    let mut day_minutes: Vec<BTreeMap<&str, i64>> = vec![BTreeMap::new(); 7];
    let mut label_totals: BTreeMap<&str, i64> = BTreeMap::new();
    let mut week_minutes: i64 = 0;
    let mut previous_minutes: i64 = 0;

    let prev_start = week_start - Duration::days(7);
    let prev_end = now - Duration::days(7);

    for entry in entries.iter().filter(|e| e.ended_at.is_some()) {
        let timer = index.get(entry.timer_id.as_str()).copied();
        if !tag_matches(timer, tag) {
            continue;
        }
        if entry.started_at >= prev_start && entry.started_at < prev_end {
            previous_minutes += entry.duration_minutes;
        }
        if entry.started_at < week_start || entry.started_at > now {
            continue;
        }
        let date = entry.started_at.with_timezone(&Local).date_naive();
        let idx = (date - week_start_date).num_days().clamp(0, 6) as usize;
        let label = label_for(timer, entry);
        *day_minutes[idx].entry(label).or_insert(0) += entry.duration_minutes;
        *label_totals.entry(label).or_insert(0) += entry.duration_minutes;
        week_minutes += entry.duration_minutes;
    }

    let mut ranked: Vec<(&str, i64)> = label_totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let kept: Vec<&str> = ranked.iter().take(TOP_LABELS).map(|(l, _)| *l).collect();
    let folded = ranked.len() > kept.len();

    let mut days = Vec::with_capacity(7);
    let mut day_totals = [0i64; 7];
    for (idx, buckets) in day_minutes.into_iter().enumerate() {
        let date = week_start_date + Duration::days(idx as i64);
        let mut hours = BTreeMap::new();
        let mut other: i64 = 0;
        for (label, minutes) in buckets {
            day_totals[idx] += minutes;
            if kept.contains(&label) {
                if minutes > 0 {
                    hours.insert(label.to_string(), round_hours(minutes));
                }
            } else {
                other += minutes;
            }
        }
        if other > 0 {
            *hours.entry(OTHER_LABEL.to_string()).or_insert(0.0) += round_hours(other);
        }
        days.push(DayRow {
            day: date.format("%a").to_string(),
            date,
            hours,
        });
    }

    let mut labels: Vec<String> = kept.iter().map(|l| l.to_string()).collect();
    if folded {
        labels.push(OTHER_LABEL.to_string());
    }

    WeeklyReport {
        week_start: week_start_date,
        labels,
        max_day: extreme_day(&days, &day_totals, |candidate, best| candidate > best),
        min_day: extreme_day(&days, &day_totals, |candidate, best| candidate < best),
        days,
        total_hours: round_hours(week_minutes),
        previous_total_hours: round_hours(previous_minutes),
    }
}

/// Scan day totals for an extreme. Strict comparison keeps the first
/// occurrence on ties; days without time are skipped entirely.
fn extreme_day(
    days: &[DayRow],
    totals: &[i64; 7],
    better: impl Fn(i64, i64) -> bool,
) -> Option<String> {
    let mut best: Option<(usize, i64)> = None;
    for (idx, &total) in totals.iter().enumerate() {
        if total == 0 {
            continue;
        }
        match best {
            Some((_, value)) if !better(total, value) => {}
            _ => best = Some((idx, total)),
        }
    }
    best.map(|(idx, _)| days[idx].day.clone())
}

/// Minutes to hours with one decimal.
pub(crate) fn round_hours(minutes: i64) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}
