pub mod alert_config;
pub mod user;

pub use alert_config::{AlertConfig, AlertFrequency};
pub use user::{User, UserRole};
