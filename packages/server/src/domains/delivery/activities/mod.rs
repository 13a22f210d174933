pub mod send_pending;

pub use send_pending::{send_pending_notifications, DispatchSummary};
