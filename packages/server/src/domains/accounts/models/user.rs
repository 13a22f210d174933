use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

/// Platform tier for a user account.
///
/// Candidates receive job-match alerts; recruiters receive HR-match
/// alerts and market signals. Admin tiers exist for the management
/// surface and take no part in alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Candidate,
    Recruiter,
    Admin,
    Superuser,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_active_by_ids(ids: &[UserId], pool: &PgPool) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ANY($1) AND is_active = TRUE",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Active recruiters who opted into market signals on at least one
    /// active alert config.
    pub async fn find_market_signal_recipients(pool: &PgPool) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT DISTINCT u.* FROM users u
             JOIN alert_configs ac ON ac.user_id = u.id
             WHERE u.role = 'recruiter'
               AND u.is_active = TRUE
               AND ac.is_active = TRUE
               AND ac.market_signals_enabled = TRUE
             ORDER BY u.id",
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active = TRUE")
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Name used when addressing the user in outbound messages.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}
