pub mod api;
pub mod config;
pub mod connection;
pub mod csv_store;
pub mod database;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod reports;
pub mod store;
pub mod types;
pub mod utils;

pub use api::{Fetcher, HttpFetcher, parse_listing};
pub use csv_store::CsvDrawStore;
pub use database::SqliteDrawStore;
pub use error::*;
pub use extractor::{extract_all, extract_record};
pub use pipeline::{ingest_rows, run_ingestion};
pub use reports::{LogNotifier, Notifier, WebhookNotifier, send_report, summarize};
pub use store::{DrawStore, StoreBackend, open_store};
pub use types::*;
