use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use serde_json::json;
use tracing::{error, info};

use crate::store::DrawStore;
use crate::types::{DrawRecord, ReportSummary};

/// Count all draws and the ones ingested within the 24 hours before `now`.
pub fn summarize(records: &[DrawRecord], now: NaiveDateTime) -> ReportSummary {
    let since = now - Duration::hours(24);
    ReportSummary {
        total_draws: records.len(),
        recent_draws: records.iter().filter(|r| r.scraped_at > since).count(),
    }
}

pub fn subject(summary: &ReportSummary) -> String {
    format!("Keno Update: {} New Draws Today", summary.recent_draws)
}

pub fn body(summary: &ReportSummary) -> String {
    format!(
        "Hello!\n\n\
         Here is your daily Keno scraping update:\n\
         - New Draws collected in the last 24h: {}\n\
         - Total Draws in your dataset: {}\n",
        summary.recent_draws, summary.total_draws
    )
}

/// Delivery channel for the daily summary.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}

/// Posts `{"subject", "body"}` as JSON to a webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            token,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&json!({ "subject": subject, "body": body }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("webhook request failed")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("webhook returned HTTP {}", status);
        }
        Ok(())
    }
}

/// Writes the summary to the log instead of sending it anywhere.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        info!("📬 {}\n{}", subject, body);
        Ok(())
    }
}

/// Summarize the store and hand the summary to `notifier`.
///
/// Returns `None` when the store holds no draws. Delivery failures are
/// logged, not returned.
pub async fn send_report<S>(store: &S, notifier: &dyn Notifier, now: NaiveDateTime) -> Result<Option<ReportSummary>>
where
    S: DrawStore + ?Sized,
{
    let records = store.load_all().context("failed to read draw store")?;
    if records.is_empty() {
        info!("No draws stored yet.");
        return Ok(None);
    }

    let summary = summarize(&records, now);
    match notifier.notify(&subject(&summary), &body(&summary)).await {
        Ok(()) => info!("Report sent successfully!"),
        Err(e) => error!("Failed to send report: {:#}", e),
    }
    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_scraped_at;

    fn record(id: &str, scraped_at: &str) -> DrawRecord {
        DrawRecord {
            game_id: id.to_string(),
            draw_timestamp: "t".to_string(),
            numbers: "1-2".to_string(),
            scraped_at: parse_scraped_at(scraped_at).unwrap(),
        }
    }

    #[test]
    fn counts_only_the_last_day_as_recent() {
        let now = parse_scraped_at("2025-06-02 12:00:00").unwrap();
        let records = vec![
            record("1", "2025-05-30 09:00:00"),
            record("2", "2025-06-01 12:00:00"),
            record("3", "2025-06-01 12:00:01"),
            record("4", "2025-06-02 11:59:59"),
        ];
        let summary = summarize(&records, now);
        assert_eq!(summary, ReportSummary { total_draws: 4, recent_draws: 2 });
        assert_eq!(subject(&summary), "Keno Update: 2 New Draws Today");
        assert!(body(&summary).contains("Total Draws in your dataset: 4"));
    }
}
