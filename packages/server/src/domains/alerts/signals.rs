//! Posting-level signal scoring: hiring urgency, the golden-lead gate,
//! and the hiring-surge thresholds used for market signals.
//!
//! Pure functions over job data; the engine feeds them and decides what
//! to do with the answers.

use chrono::{DateTime, Utc};

use crate::domains::jobs::Job;

/// Description keywords that mark a rushed hire. Listings arrive in both
/// Spanish and English, so both spellings are scanned.
const URGENCY_KEYWORDS: [&str; 5] = ["urgente", "inmediato", "asap", "immediate", "urgent"];

/// Salary ceiling above which a posting earns the urgency salary bonus.
const HIGH_SALARY_FLOOR: f64 = 150_000.0;

/// Golden leads additionally require the posting to pay above this.
const GOLDEN_SALARY_FLOOR: f64 = 100_000.0;

/// Company growth score a golden lead must exceed.
const GOLDEN_GROWTH_FLOOR: f64 = 0.7;

/// Urgency score a golden lead must exceed.
const GOLDEN_URGENCY_FLOOR: f64 = 0.9;

/// How far back the market-signal pass looks for surge postings.
pub const SURGE_WINDOW_HOURS: i64 = 24;

/// Postings a single company needs inside the window to count as a surge.
pub const MIN_SURGE_POSTINGS: i64 = 3;

/// Scores how urgently a posting seems to hire, in `[0.5, 1.0]`.
///
/// Starts at 0.5 and adds bonuses: +0.2 posted within a day (+0.1 within
/// three), +0.2 urgency keyword in the description, +0.1 salary ceiling
/// above $150k. The sum is clamped to 1.0. A missing `posted_at` earns
/// no recency bonus.
pub fn urgency_score(job: &Job, now: DateTime<Utc>) -> f64 {
    let mut score: f64 = 0.5;

    if let Some(posted_at) = job.posted_at {
        let days_old = (now - posted_at).num_days();
        if days_old < 1 {
            score += 0.2;
        } else if days_old < 3 {
            score += 0.1;
        }
    }

    if let Some(description) = &job.raw_description {
        let description = description.to_lowercase();
        if URGENCY_KEYWORDS.iter().any(|kw| description.contains(kw)) {
            score += 0.2;
        }
    }

    if job.salary_max.is_some_and(|max| max > HIGH_SALARY_FLOOR) {
        score += 0.1;
    }

    score.min(1.0)
}

/// The golden-lead gate: urgency strictly above 0.9, company growth
/// strictly above 0.7, and a salary ceiling strictly above $100k.
///
/// A missing growth score counts as 0.0 and a missing salary ceiling
/// fails outright, so unknown data never produces a golden lead.
pub fn is_golden_lead(urgency: f64, growth_score: Option<f64>, salary_max: Option<f64>) -> bool {
    let growth = growth_score.unwrap_or(0.0);

    urgency > GOLDEN_URGENCY_FLOOR
        && growth > GOLDEN_GROWTH_FLOOR
        && salary_max.is_some_and(|max| max > GOLDEN_SALARY_FLOOR)
}
