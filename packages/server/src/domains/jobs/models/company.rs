use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::CompanyId;

/// Company record, maintained by the enrichment pipeline.
///
/// `growth_score` is a 0-1 signal produced by enrichment; it stays NULL
/// until the company has been scored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub growth_score: Option<f64>,
    pub industry: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub async fn find_by_id(id: CompanyId, pool: &PgPool) -> Result<Option<Self>> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(company)
    }
}
