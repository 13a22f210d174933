// Notification delivery: channel renderers and the dispatch cycle.

pub mod activities;
pub mod discord;
pub mod dispatcher;
pub mod email;
pub mod slack;
pub mod templates;

pub use activities::{send_pending_notifications, DispatchSummary};
pub use dispatcher::NotificationDispatcher;
pub use templates::TemplateStore;
