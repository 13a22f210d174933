use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{AlertConfigId, UserId};
use crate::domains::accounts::models::user::UserRole;
use crate::domains::alerts::models::NotificationChannel;

/// How often a user wants alert digests.
///
/// Stored per config but not yet consulted by the engine: every check run
/// treats configs as immediate. Kept in the schema so the preference
/// survives until digest batching lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertFrequency {
    Immediate,
    Hourly,
    Daily,
    Weekly,
}

/// Per-user alert criteria.
///
/// Every filter is optional; an unset filter matches everything. One user
/// may hold several configs (e.g. one per stack they follow).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlertConfig {
    pub id: AlertConfigId,
    pub user_id: UserId,
    pub name: String,
    pub tech_stack: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    /// Free-text work-mode filter, e.g. "remote" or "hybrid".
    pub modality: Option<String>,
    pub channels: Vec<NotificationChannel>,
    pub frequency: AlertFrequency,
    pub market_signals_enabled: bool,
    /// Suppress ordinary match alerts and deliver only golden leads.
    pub golden_leads_only: bool,
    pub slack_webhook_url: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlertConfig {
    /// Active configs belonging to active users of the given role,
    /// ordered so each user's oldest config comes first.
    pub async fn find_active_for_role(role: UserRole, pool: &PgPool) -> Result<Vec<Self>> {
        let configs = sqlx::query_as::<_, AlertConfig>(
            "SELECT ac.* FROM alert_configs ac
             JOIN users u ON u.id = ac.user_id
             WHERE ac.is_active = TRUE AND u.is_active = TRUE AND u.role = $1
             ORDER BY ac.user_id, ac.created_at",
        )
        .bind(role)
        .fetch_all(pool)
        .await?;

        Ok(configs)
    }

    /// Active configs of all active users regardless of role.
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>> {
        let configs = sqlx::query_as::<_, AlertConfig>(
            "SELECT ac.* FROM alert_configs ac
             JOIN users u ON u.id = ac.user_id
             WHERE ac.is_active = TRUE AND u.is_active = TRUE
             ORDER BY ac.user_id, ac.created_at",
        )
        .fetch_all(pool)
        .await?;

        Ok(configs)
    }

    /// The user's oldest active config, used for delivery context
    /// (webhook URLs) at dispatch time.
    pub async fn find_first_active_for_user(
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let config = sqlx::query_as::<_, AlertConfig>(
            "SELECT * FROM alert_configs
             WHERE user_id = $1 AND is_active = TRUE
             ORDER BY created_at ASC
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(config)
    }
}
