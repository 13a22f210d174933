// Alert detection: matching rules, signal scoring, and the check engine.

pub mod engine;
pub mod matcher;
pub mod models;
pub mod signals;
pub mod store;

pub use engine::{AlertEngine, AlertRunStats};
pub use models::{NewNotification, Notification, NotificationChannel, NotificationKind};
pub use store::{AlertStore, PgAlertStore};
