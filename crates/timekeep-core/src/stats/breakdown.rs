//! Duration breakdowns by tag and by project.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimeEntry, Timer};

use super::{index_timers, label_for, tag_matches, RangeFilter};

/// One breakdown bucket with its share of the filtered total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownSlice {
    pub label: String,
    pub minutes: i64,
    /// Percentage of the filtered total, one decimal. 0.0 when the total
    /// is zero.
    pub share_pct: f64,
}

/// Sum minutes per tag of the owning timer.
///
/// An entry counts toward every tag its timer carries, so the slice sum can
/// exceed the filtered total. Entries whose timer is untagged or gone land
/// in no slice but still count toward the total the shares are taken from.
pub fn breakdown_by_tag(
    timers: &[Timer],
    entries: &[TimeEntry],
    range: RangeFilter,
    tag_filter: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<BreakdownSlice> {
    let index = index_timers(timers);
    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
    let mut total: i64 = 0;

    for entry in closed_in_range(entries, range, now) {
        let timer = index.get(entry.timer_id.as_str()).copied();
        if !tag_matches(timer, tag_filter) {
            continue;
        }
        total += entry.duration_minutes;
        if let Some(timer) = timer {
            for tag in &timer.tags {
                *buckets.entry(tag.clone()).or_insert(0) += entry.duration_minutes;
            }
        }
    }

    to_slices(buckets, total)
}

/// Sum minutes per owning timer name, falling back to the entry's stored
/// name snapshot when the timer is gone. The slice sum equals the filtered
/// total.
pub fn breakdown_by_project(
    timers: &[Timer],
    entries: &[TimeEntry],
    range: RangeFilter,
    tag_filter: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<BreakdownSlice> {
    let index = index_timers(timers);
    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
    let mut total: i64 = 0;

    for entry in closed_in_range(entries, range, now) {
        let timer = index.get(entry.timer_id.as_str()).copied();
        if !tag_matches(timer, tag_filter) {
            continue;
        }
        total += entry.duration_minutes;
        let label = label_for(timer, entry);
        *buckets.entry(label.to_string()).or_insert(0) += entry.duration_minutes;
    }

    to_slices(buckets, total)
}

fn closed_in_range(
    entries: &[TimeEntry],
    range: RangeFilter,
    now: DateTime<Utc>,
) -> impl Iterator<Item = &TimeEntry> {
    entries
        .iter()
        .filter(move |e| e.ended_at.is_some() && range.contains(e.started_at, now))
}

fn to_slices(buckets: BTreeMap<String, i64>, total: i64) -> Vec<BreakdownSlice> {
    let mut slices: Vec<BreakdownSlice> = buckets
        .into_iter()
        .map(|(label, minutes)| BreakdownSlice {
            label,
            minutes,
            share_pct: share_pct(minutes, total),
        })
        .collect();
    // Largest first, label as the tiebreak.
    slices.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.label.cmp(&b.label)));
    slices
}

fn share_pct(minutes: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (minutes as f64 * 1000.0 / total as f64).round() / 10.0
}
