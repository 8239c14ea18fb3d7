//! # Timekeep Core Library
//!
//! This library provides the core business logic for the timekeep time
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any GUI or sync frontend
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Timer Domain**: Timers, time entries, and the session recorder with
//!   close-before-open semantics and server-side duration rounding
//! - **Storage**: A `TimerStore` trait with in-memory and SQLite-backed
//!   implementations, plus TOML-based configuration
//! - **Views & Analytics**: Per-timer list rows with live durations, tag and
//!   project breakdowns, and the stacked weekly chart
//! - **Sync**: Owner-scoped change notification (invalidate-then-pull) and
//!   an optimistic row projection with commit/rollback reconciliation
//!
//! ## Key Components
//!
//! - [`Tracker`]: Facade tying the pieces together over one store
//! - [`SessionRecorder`]: start / pause / end over open entries
//! - [`TimerRegistry`]: creation, metadata edits, finalize, remove
//! - [`ChangeNotifier`]: per-owner broadcast of change events

pub mod clock;
pub mod error;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod timer;
pub mod tracker;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, NotFoundError, Result, StoreError, ValidationError};
pub use notify::{ChangeEvent, ChangeNotifier, ChangeSubscription, ReconnectPolicy};
pub use stats::{AnalyticsReport, BreakdownMode, BreakdownSlice, RangeFilter, WeeklyReport};
pub use storage::{Config, MemoryStore, SqliteStore, TimerStore};
pub use sync::{RowProjection, SessionCommand};
pub use timer::{
    EndOutcome, PauseOutcome, SessionRecorder, SessionState, StartOutcome, TimeEntry, Timer,
    TimerRegistry, TimerStatus,
};
pub use tracker::Tracker;
pub use view::{ListFilter, ListSort, TimerRow};
