//! Tolerant parsing of the date cells found in collection feeds.

use chrono::NaiveDate;
use tracing::debug;

/// Accepted date layouts, tried in order.
pub const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a date cell, returning `None` for empty or unrecognized input.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let value = text.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok());

    if parsed.is_none() {
        debug!(value, "unable to parse pickup date");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_layouts_agree_on_the_same_day() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert_eq!(parse_date("2025-03-01"), expected);
        assert_eq!(parse_date("01/03/2025"), expected);
        assert_eq!(parse_date("01-03-2025"), expected);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            parse_date("  10/01/2025 \t"),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
    }

    #[test]
    fn empty_and_unknown_input_is_absent() {
        for value in ["", "   ", "morgen", "2025/03/01", "31/02/2025", "03.01.2025", "2025-13-01"] {
            assert_eq!(parse_date(value), None, "{value:?} should not parse");
        }
    }
}
