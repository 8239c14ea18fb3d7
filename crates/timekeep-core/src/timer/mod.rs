//! Timer domain: records, lifecycle rules, and session recording.

mod model;
mod recorder;
mod registry;

pub use model::{round_minutes, SessionState, TimeEntry, Timer, TimerStatus};
pub use recorder::{EndOutcome, PauseOutcome, SessionRecorder, StartOutcome};
pub use registry::{TimerRegistry, MAX_NAME_LEN, MAX_TAG_LEN};
