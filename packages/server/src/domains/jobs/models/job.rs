use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{format_usd, CompanyId, JobId};

/// A scraped job posting.
///
/// Rows are written by the ingestion pipeline; this service only reads
/// them. `company_name` is denormalized so matching works even when the
/// posting was never linked to a `companies` row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub company_id: Option<CompanyId>,
    pub company_name: String,
    pub raw_description: Option<String>,
    /// Comma-separated technology list extracted by enrichment.
    pub stack: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub location: Option<String>,
    pub is_remote: bool,
    pub source_url: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// A company that posted at least `min_postings` jobs inside the surge
/// window, as returned by [`Job::hiring_surges_since`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HiringSurge {
    pub company_name: String,
    pub job_count: i64,
}

impl Job {
    pub async fn find_by_id(id: JobId, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(job)
    }

    /// Active postings scraped at or after `cutoff`, oldest first.
    pub async fn find_scraped_since(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs
             WHERE scraped_at >= $1 AND is_active = TRUE
             ORDER BY scraped_at ASC",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    pub async fn count_scraped_since(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE scraped_at >= $1")
            .bind(cutoff)
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Companies with at least `min_postings` active postings scraped
    /// since `cutoff`, busiest first.
    pub async fn hiring_surges_since(
        cutoff: DateTime<Utc>,
        min_postings: i64,
        pool: &PgPool,
    ) -> Result<Vec<HiringSurge>> {
        let surges = sqlx::query_as::<_, HiringSurge>(
            "SELECT company_name, COUNT(*) AS job_count FROM jobs
             WHERE scraped_at >= $1 AND is_active = TRUE
             GROUP BY company_name
             HAVING COUNT(*) >= $2
             ORDER BY job_count DESC, company_name ASC",
        )
        .bind(cutoff)
        .bind(min_postings)
        .fetch_all(pool)
        .await?;

        Ok(surges)
    }

    /// Technology list for display, with a fallback when enrichment has
    /// not run yet.
    pub fn stack_text(&self) -> &str {
        self.stack.as_deref().unwrap_or("Not specified")
    }

    /// Human-readable salary range, or `None` when the posting carries
    /// no salary data at all.
    pub fn salary_summary(&self) -> Option<String> {
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) => Some(format!("{} - {}", format_usd(min), format_usd(max))),
            (None, Some(max)) => Some(format!("Up to {}", format_usd(max))),
            (Some(min), None) => Some(format!("From {}", format_usd(min))),
            (None, None) => None,
        }
    }
}
