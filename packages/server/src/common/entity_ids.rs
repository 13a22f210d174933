//! Typed ID definitions for all domain entities.
//!
//! # Example
//!
//! ```rust
//! use radar_core::common::{JobId, UserId};
//!
//! // These are incompatible types - compiler prevents mixing them up
//! let job_id: JobId = JobId::new();
//! let user_id: UserId = UserId::new();
//!
//! // This would be a compile error:
//! // let wrong: UserId = job_id;
//! ```

// Re-export the core Id type and version marker
pub use super::id::{Id, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Company entities.
pub struct Company;

/// Marker type for Job entities (scraped postings).
pub struct Job;

/// Marker type for User entities (candidates and recruiters).
pub struct User;

/// Marker type for AlertConfig entities (per-user alert criteria).
pub struct AlertConfig;

/// Marker type for Notification entities (queued alert deliveries).
pub struct Notification;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Company entities.
pub type CompanyId = Id<Company>;

/// Typed ID for Job entities.
pub type JobId = Id<Job>;

/// Typed ID for User entities.
pub type UserId = Id<User>;

/// Typed ID for AlertConfig entities.
pub type AlertConfigId = Id<AlertConfig>;

/// Typed ID for Notification entities.
pub type NotificationId = Id<Notification>;
