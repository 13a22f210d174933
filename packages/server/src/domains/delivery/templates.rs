//! Email HTML: an optional on-disk template directory with built-in
//! fallbacks.
//!
//! Operators can drop `job_alert.html` / `market_signal.html` into the
//! configured directory with `{{placeholder}}` slots; anything missing
//! or unreadable falls back to the built-in markup below, so email
//! delivery never depends on the filesystem.

use std::path::PathBuf;

use crate::domains::alerts::models::Notification;
use crate::domains::jobs::Job;

/// Loads and fills HTML templates from an optional directory.
#[derive(Clone)]
pub struct TemplateStore {
    dir: Option<PathBuf>,
}

impl TemplateStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Renders `<dir>/<name>.html` with `{{key}}` substitution, or
    /// `None` when the directory is unset or the file unreadable.
    pub async fn render(&self, name: &str, vars: &[(&str, String)]) -> Option<String> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(format!("{name}.html"));

        match tokio::fs::read_to_string(&path).await {
            Ok(mut html) => {
                for (key, value) in vars {
                    html = html.replace(&format!("{{{{{key}}}}}"), value);
                }
                Some(html)
            }
            Err(e) => {
                tracing::debug!(template = name, "email template not readable, using built-in: {e}");
                None
            }
        }
    }
}

const STYLE_BODY: &str =
    "margin:0;padding:0;background-color:#0f172a;font-family:Arial,Helvetica,sans-serif;color:#e2e8f0;";
const STYLE_CARD: &str =
    "background-color:#1e293b;border-radius:8px;padding:24px;margin:16px 0;";

/// Banner slotted into golden-lead emails.
pub fn golden_banner_html() -> &'static str {
    "<div style=\"background:linear-gradient(90deg,#f59e0b,#d97706);border-radius:8px;\
     padding:12px;text-align:center;font-weight:bold;color:#0f172a;margin:16px 0;\">\
     🌟 GOLDEN LEAD 🌟<br/>\
     <span style=\"font-weight:normal;\">Exceptional opportunity - high priority</span></div>"
}

fn header_html() -> String {
    "<div style=\"text-align:center;padding:24px 0;\">\
     <h1 style=\"color:#0ea5e9;margin:0;\">JobRadar</h1>\
     <p style=\"color:#94a3b8;margin:4px 0 0 0;\">Your tech job radar</p></div>"
        .to_string()
}

fn footer_html() -> String {
    "<div style=\"text-align:center;padding:16px 0;color:#64748b;font-size:12px;\">\
     You are receiving this because of your alert settings on JobRadar.<br/>\
     © JobRadar. All rights reserved.</div>"
        .to_string()
}

/// Built-in job alert email, also used for golden leads (with the
/// banner slotted in above the job card).
pub fn job_alert_html(user_name: &str, job: &Job, notification: &Notification) -> String {
    let banner = if notification.is_golden_lead {
        golden_banner_html()
    } else {
        ""
    };
    let salary = job
        .salary_summary()
        .unwrap_or_else(|| "Not specified".to_string());

    format!(
        "<html><body style=\"{STYLE_BODY}\">\
         <div style=\"max-width:600px;margin:0 auto;padding:16px;\">\
         {header}\
         {banner}\
         <p>Hi {user_name},</p>\
         <p>A new posting matches your alert:</p>\
         <div style=\"{STYLE_CARD}border-left:4px solid #0ea5e9;\">\
         <h2 style=\"margin:0 0 12px 0;color:#f8fafc;\">{title}</h2>\
         <p style=\"margin:4px 0;\">🏢 {company}</p>\
         <p style=\"margin:4px 0;\">💰 {salary}</p>\
         <p style=\"margin:4px 0;\">💻 {stack}</p>\
         </div>\
         <div style=\"text-align:center;margin:24px 0;\">\
         <a href=\"{url}\" style=\"background-color:#0ea5e9;color:#0f172a;padding:12px 32px;\
         border-radius:6px;text-decoration:none;font-weight:bold;\">View full posting</a></div>\
         {footer}\
         </div></body></html>",
        header = header_html(),
        banner = banner,
        user_name = user_name,
        title = job.title,
        company = job.company_name,
        salary = salary,
        stack = job.stack_text(),
        url = job.source_url,
        footer = footer_html(),
    )
}

/// Built-in market-signal email for recruiters.
pub fn market_signal_html(user_name: &str, notification: &Notification) -> String {
    let company = notification.metadata_str("company_name").unwrap_or("N/A");
    let job_count = notification.metadata_i64("job_count").unwrap_or(0);

    format!(
        "<html><body style=\"{STYLE_BODY}\">\
         <div style=\"max-width:600px;margin:0 auto;padding:16px;\">\
         {header}\
         <div style=\"background:linear-gradient(90deg,#8b5cf6,#6d28d9);border-radius:8px;\
         padding:12px;text-align:center;font-weight:bold;color:#f8fafc;margin:16px 0;\">\
         🚀 Market Signal<br/>\
         <span style=\"font-weight:normal;\">High hiring velocity detected</span></div>\
         <p>Hi {user_name},</p>\
         <div style=\"{STYLE_CARD}\">\
         <p style=\"margin:0 0 12px 0;\"><strong>{company}</strong> posted \
         <strong>{job_count} openings</strong> in the last 24 hours.</p>\
         <p style=\"margin:0;\">This can indicate:</p>\
         <ul style=\"margin:8px 0 0 0;\">\
         <li>High hiring activity</li>\
         <li>Team expansion under way</li>\
         <li>A networking window</li>\
         </ul></div>\
         {footer}\
         </div></body></html>",
        header = header_html(),
        user_name = user_name,
        company = company,
        job_count = job_count,
        footer = footer_html(),
    )
}
