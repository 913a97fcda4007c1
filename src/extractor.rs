use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::types::{DrawRecord, RawRow};
use crate::utils::{NUMBER_SEPARATOR, clean_field, tokenize_numbers};

/// Turn one listing row into a draw record.
///
/// Numbers keep their source order; nothing is sorted or deduplicated
/// within a draw.
pub fn extract_record(row: &RawRow, scraped_at: NaiveDateTime) -> Result<DrawRecord, ExtractionError> {
    let game_id = clean_field(&row.game_id);
    if game_id.is_empty() {
        return Err(ExtractionError::MissingIdentity);
    }

    let draw_timestamp = clean_field(&row.timestamp);
    if draw_timestamp.is_empty() {
        return Err(ExtractionError::MissingTimestamp);
    }

    let numbers = tokenize_numbers(&row.numbers);
    if numbers.is_empty() {
        return Err(ExtractionError::MissingNumbers);
    }

    Ok(DrawRecord {
        game_id,
        draw_timestamp,
        numbers: numbers.join(NUMBER_SEPARATOR),
        scraped_at,
    })
}

/// Outcome of extracting a whole page of rows.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<DrawRecord>,
    pub failures: Vec<(usize, ExtractionError)>,
}

/// Extract every row, keeping good records in row order and counting the rest.
pub fn extract_all(rows: &[RawRow], scraped_at: NaiveDateTime) -> Extraction {
    let mut extraction = Extraction::default();

    for (index, row) in rows.iter().enumerate() {
        match extract_record(row, scraped_at) {
            Ok(record) => {
                debug!("🎟️ Scraped game {}: {}", record.game_id, record.numbers);
                extraction.records.push(record);
            }
            Err(e) => {
                warn!("Skipping row {}: {}", index + 1, e);
                extraction.failures.push((index, e));
            }
        }
    }

    extraction
}
