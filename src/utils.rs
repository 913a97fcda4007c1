use chrono::{Local, NaiveDateTime, Timelike};

pub const SCRAPED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const NUMBER_SEPARATOR: &str = "-";

fn is_odd_space(c: char) -> bool {
    matches!(c, '\u{00a0}' | '\u{2007}' | '\u{202f}' | '\u{feff}')
}

/// Replace non-breaking and other non-standard spaces with an ASCII space.
pub fn normalize_spaces(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() || is_odd_space(c) { ' ' } else { c })
        .collect()
}

pub fn tokenize_numbers(text: &str) -> Vec<String> {
    normalize_spaces(text)
        .split(' ')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn clean_field(text: &str) -> String {
    normalize_spaces(text).trim().to_string()
}

pub fn format_scraped_at(at: &NaiveDateTime) -> String {
    at.format(SCRAPED_AT_FORMAT).to_string()
}

pub fn parse_scraped_at(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text.trim(), SCRAPED_AT_FORMAT)
}

/// Current local time at second precision, the resolution the store keeps.
pub fn ingestion_time() -> NaiveDateTime {
    truncate_to_seconds(Local::now().naive_local())
}

pub fn truncate_to_seconds(at: NaiveDateTime) -> NaiveDateTime {
    at.with_nanosecond(0).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nbsp_separates_tokens() {
        assert_eq!(tokenize_numbers("22\u{00a0} 18"), vec!["22", "18"]);
        assert_eq!(tokenize_numbers(" 22\u{00a0}\u{00a0}18\t70 \n"), vec!["22", "18", "70"]);
    }

    #[test]
    fn blank_numbers_yield_nothing() {
        assert!(tokenize_numbers("").is_empty());
        assert!(tokenize_numbers(" \u{00a0}\u{202f} ").is_empty());
    }

    #[test]
    fn scraped_at_formats_both_ways() {
        let at = parse_scraped_at("2025-03-01 07:05:09").unwrap();
        assert_eq!(format_scraped_at(&at), "2025-03-01 07:05:09");
        assert!(parse_scraped_at("yesterday").is_err());
    }

    #[test]
    fn ingestion_time_drops_subseconds() {
        assert_eq!(ingestion_time().nanosecond(), 0);
    }
}
