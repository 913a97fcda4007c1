use chrono::NaiveDateTime;
use tracing::{error, info};

use crate::api::Fetcher;
use crate::error::IngestError;
use crate::extractor::extract_all;
use crate::store::DrawStore;
use crate::types::{IngestReport, RawRow};
use crate::utils::ingestion_time;

/// Extract `rows` and merge the good records into `store`.
///
/// A page with no usable rows is a normal outcome and leaves the store
/// untouched, though a store that cannot be read still fails the run.
pub fn ingest_rows<S>(rows: &[RawRow], store: &mut S, scraped_at: NaiveDateTime) -> Result<IngestReport, IngestError>
where
    S: DrawStore + ?Sized,
{
    let extraction = extract_all(rows, scraped_at);
    let mut report = IngestReport {
        rows_seen: rows.len(),
        rows_extracted: extraction.records.len(),
        rows_failed: extraction.failures.len(),
        ..IngestReport::default()
    };

    if extraction.records.is_empty() {
        info!("No data scraped.");
        report.total_count = store.load_all()?.len();
        return Ok(report);
    }

    let appended = store.merge_and_append(&extraction.records)?;
    report.rows_added = appended.added_count;
    report.total_count = appended.total_count;
    Ok(report)
}

/// One ingestion run: fetch, extract, merge.
pub async fn run_ingestion<F, S>(fetcher: &F, store: &mut S) -> Result<IngestReport, IngestError>
where
    F: Fetcher + ?Sized,
    S: DrawStore + ?Sized,
{
    let rows = fetcher.fetch().await.inspect_err(|e| {
        error!("Error loading page: {}", e);
    })?;

    let report = ingest_rows(&rows, store, ingestion_time())?;
    info!(
        rows_seen = report.rows_seen,
        rows_extracted = report.rows_extracted,
        rows_failed = report.rows_failed,
        rows_added = report.rows_added,
        total_count = report.total_count,
        "✅ Ingestion run complete"
    );
    Ok(report)
}
