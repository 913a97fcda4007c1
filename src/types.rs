use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Text fields read from one listing entry, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawRow {
    pub game_id: String,
    pub timestamp: String,
    pub numbers: String,
}

impl RawRow {
    pub fn new(game_id: &str, timestamp: &str, numbers: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            timestamp: timestamp.to_string(),
            numbers: numbers.to_string(),
        }
    }
}

/// One observed draw. `game_id` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DrawRecord {
    pub game_id: String,
    pub draw_timestamp: String,
    /// Drawn values joined with `-`, in source order.
    pub numbers: String,
    pub scraped_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppendResult {
    pub added_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rows_seen: usize,
    pub rows_extracted: usize,
    pub rows_failed: usize,
    pub rows_added: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_draws: usize,
    pub recent_draws: usize,
}
