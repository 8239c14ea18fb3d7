//! Session-local state reconciliation.

mod projection;

pub use projection::{is_pending, RowProjection, SessionCommand, PENDING_PREFIX};
