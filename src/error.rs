use std::path::PathBuf;
use thiserror::Error;

/// Failure reaching or reading the listing page. Fatal to a run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid selector {selector}: {detail}")]
    Selector { selector: String, detail: String },
}

/// Why a single row was dropped. Never fatal to a run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("row has no game id")]
    MissingIdentity,

    #[error("row has no draw timestamp")]
    MissingTimestamp,

    #[error("row has no drawn numbers")]
    MissingNumbers,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store {} is corrupt{}: {detail}", .path.display(), .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Corrupt {
        path: PathBuf,
        line: Option<usize>,
        detail: String,
    },

    #[error("I/O error on store {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn corrupt(path: impl Into<PathBuf>, line: Option<usize>, detail: impl Into<String>) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            line,
            detail: detail.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// A terminating error for one ingestion run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    pub fn category(&self) -> &'static str {
        match self {
            IngestError::Fetch(_) => "fetch",
            IngestError::Store(e) if e.is_corrupt() => "store-corrupt",
            IngestError::Store(_) => "store",
        }
    }
}
