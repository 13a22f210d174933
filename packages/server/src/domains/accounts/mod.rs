// User accounts and their alert criteria.

pub mod models;

pub use models::{AlertConfig, AlertFrequency, User, UserRole};
