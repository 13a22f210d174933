//! Pure matching predicates between postings and alert configs.
//!
//! No side effects here: these functions take a job and a config and
//! answer yes or no, which keeps the rules easy to test in isolation.
//!
//! Every filter is optional. An unset (or empty) filter passes, so a
//! config with no filters matches every posting. All text comparisons
//! are case-insensitive substring checks.

use crate::domains::accounts::AlertConfig;
use crate::domains::jobs::Job;

/// Candidate rules: technology overlap, salary-range compatibility,
/// keyword presence, and work-mode mention, in that order. The first
/// failing filter rejects the posting.
pub fn job_matches_candidate(job: &Job, config: &AlertConfig) -> bool {
    if let Some(wanted) = non_empty(&config.tech_stack) {
        let stack = job.stack.as_deref().unwrap_or("").to_lowercase();
        if !wanted.iter().any(|tech| stack.contains(&tech.to_lowercase())) {
            return false;
        }
    }

    // Two one-sided salary checks; a posting with no salary data passes
    // both. Reject only when the ranges provably cannot overlap.
    if let (Some(wanted_min), Some(job_max)) = (config.salary_min, job.salary_max) {
        if job_max < wanted_min {
            return false;
        }
    }
    if let (Some(wanted_max), Some(job_min)) = (config.salary_max, job.salary_min) {
        if job_min > wanted_max {
            return false;
        }
    }

    if !keywords_match(job, config) {
        return false;
    }

    if let Some(modality) = config.modality.as_deref().filter(|m| !m.is_empty()) {
        let description = job.raw_description.as_deref().unwrap_or("").to_lowercase();
        if !description.contains(&modality.to_lowercase()) {
            return false;
        }
    }

    true
}

/// Recruiter rules: technology and keywords only. Recruiters watch
/// hiring activity, so salary and work-mode filters do not apply.
pub fn job_matches_recruiter(job: &Job, config: &AlertConfig) -> bool {
    if let Some(wanted) = non_empty(&config.tech_stack) {
        let stack = job.stack.as_deref().unwrap_or("").to_lowercase();
        if !wanted.iter().any(|tech| stack.contains(&tech.to_lowercase())) {
            return false;
        }
    }

    keywords_match(job, config)
}

/// Keyword filter over the title plus the raw description.
fn keywords_match(job: &Job, config: &AlertConfig) -> bool {
    let Some(keywords) = non_empty(&config.keywords) else {
        return true;
    };

    let text = format!(
        "{} {}",
        job.title,
        job.raw_description.as_deref().unwrap_or("")
    )
    .to_lowercase();

    keywords.iter().any(|kw| text.contains(&kw.to_lowercase()))
}

/// Treats NULL and `{}` the same way: no filter.
fn non_empty(filter: &Option<Vec<String>>) -> Option<&[String]> {
    match filter.as_deref() {
        Some(values) if !values.is_empty() => Some(values),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AlertConfigId, JobId, UserId};
    use crate::domains::accounts::AlertFrequency;
    use crate::domains::alerts::models::NotificationChannel;
    use chrono::Utc;

    fn job() -> Job {
        Job {
            id: JobId::new(),
            title: "Senior Backend Engineer".to_string(),
            company_id: None,
            company_name: "Acme".to_string(),
            raw_description: Some(
                "We need a senior engineer for a fully remote team. Urgent hire.".to_string(),
            ),
            stack: Some("Rust, PostgreSQL, Kafka".to_string()),
            salary_min: Some(90000.0),
            salary_max: Some(130000.0),
            location: Some("Berlin".to_string()),
            is_remote: true,
            source_url: "https://jobs.example.com/42".to_string(),
            posted_at: Some(Utc::now()),
            scraped_at: Utc::now(),
            last_verified_at: None,
            is_active: true,
        }
    }

    fn config() -> AlertConfig {
        AlertConfig {
            id: AlertConfigId::new(),
            user_id: UserId::new(),
            name: "backend watch".to_string(),
            tech_stack: None,
            keywords: None,
            salary_min: None,
            salary_max: None,
            modality: None,
            channels: vec![NotificationChannel::Email],
            frequency: AlertFrequency::Daily,
            market_signals_enabled: false,
            golden_leads_only: false,
            slack_webhook_url: None,
            discord_webhook_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_config_matches_everything() {
        assert!(job_matches_candidate(&job(), &config()));
        assert!(job_matches_recruiter(&job(), &config()));
    }

    #[test]
    fn tech_stack_needs_only_one_overlap() {
        let mut cfg = config();
        cfg.tech_stack = Some(vec!["python".to_string(), "rust".to_string()]);
        assert!(job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn tech_stack_is_case_insensitive() {
        let mut cfg = config();
        cfg.tech_stack = Some(vec!["RUST".to_string()]);
        assert!(job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn tech_stack_with_no_overlap_rejects() {
        let mut cfg = config();
        cfg.tech_stack = Some(vec!["cobol".to_string()]);
        assert!(!job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn tech_stack_filter_rejects_unenriched_job() {
        let mut posting = job();
        posting.stack = None;
        let mut cfg = config();
        cfg.tech_stack = Some(vec!["rust".to_string()]);
        assert!(!job_matches_candidate(&posting, &cfg));
    }

    #[test]
    fn empty_tech_stack_list_is_no_filter() {
        let mut cfg = config();
        cfg.tech_stack = Some(vec![]);
        assert!(job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn salary_rejects_when_job_pays_below_wanted_minimum() {
        let mut cfg = config();
        cfg.salary_min = Some(150000.0);
        // job max is 130k < wanted 150k
        assert!(!job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn salary_rejects_when_job_starts_above_wanted_maximum() {
        let mut cfg = config();
        cfg.salary_max = Some(80000.0);
        // job min is 90k > wanted 80k
        assert!(!job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn salary_passes_on_any_overlap() {
        let mut cfg = config();
        cfg.salary_min = Some(100000.0);
        cfg.salary_max = Some(110000.0);
        assert!(job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn salary_filter_passes_job_without_salary_data() {
        let mut posting = job();
        posting.salary_min = None;
        posting.salary_max = None;
        let mut cfg = config();
        cfg.salary_min = Some(200000.0);
        cfg.salary_max = Some(250000.0);
        assert!(job_matches_candidate(&posting, &cfg));
    }

    #[test]
    fn salary_boundary_is_inclusive() {
        let mut cfg = config();
        cfg.salary_min = Some(130000.0); // equals the job max
        assert!(job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn keywords_search_title_and_description() {
        let mut cfg = config();
        cfg.keywords = Some(vec!["backend".to_string()]); // in title
        assert!(job_matches_candidate(&job(), &cfg));

        cfg.keywords = Some(vec!["urgent".to_string()]); // in description
        assert!(job_matches_candidate(&job(), &cfg));

        cfg.keywords = Some(vec!["blockchain".to_string()]);
        assert!(!job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn modality_scans_description_only() {
        let mut cfg = config();
        cfg.modality = Some("remote".to_string());
        assert!(job_matches_candidate(&job(), &cfg));

        cfg.modality = Some("on-site".to_string());
        assert!(!job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn filters_are_a_conjunction() {
        // Tech matches but salary cannot overlap: the whole match fails.
        let mut cfg = config();
        cfg.tech_stack = Some(vec!["rust".to_string()]);
        cfg.salary_min = Some(200000.0);
        assert!(!job_matches_candidate(&job(), &cfg));
    }

    #[test]
    fn recruiter_rules_ignore_salary_and_modality() {
        let mut cfg = config();
        cfg.salary_min = Some(500000.0);
        cfg.modality = Some("on-site".to_string());
        // Both would reject a candidate match, but recruiters only
        // filter on tech and keywords.
        assert!(!job_matches_candidate(&job(), &cfg));
        assert!(job_matches_recruiter(&job(), &cfg));
    }

    #[test]
    fn recruiter_rules_still_apply_tech_filter() {
        let mut cfg = config();
        cfg.tech_stack = Some(vec!["erlang".to_string()]);
        assert!(!job_matches_recruiter(&job(), &cfg));
    }
}
