//! List-view aggregation over timers and their entries.

mod rows;

pub use rows::{build_row, build_rows, list_view, ListFilter, ListSort, TimerRow};
