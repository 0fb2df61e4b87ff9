//! Turning raw feed text into sorted pickup records.

use std::cmp::Ordering;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::dates::parse_date;
use crate::model::{PickupRecord, WasteType};

/// Header of the date column.
pub const DATE_COLUMN: &str = "Datum";
/// Header of the waste type column.
pub const WASTE_TYPE_COLUMN: &str = "Ophaling";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    waste_type: usize,
}

/// Pick the field delimiter by looking at the first line.
///
/// Semicolon is the native format and wins ties, including lines with neither character.
#[must_use]
pub fn detect_delimiter(raw: &str) -> u8 {
    let first_line = raw.lines().next().unwrap_or_default();
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();

    match commas.cmp(&semicolons) {
        Ordering::Greater => b',',
        Ordering::Less | Ordering::Equal => b';',
    }
}

/// Parse feed text into records of recognized categories, ascending by date.
///
/// Records without a parsable date sort first. Unknown categories and malformed rows are
/// skipped; a feed without the required headers yields no records.
#[must_use]
pub fn parse_feed(raw: &str) -> Vec<PickupRecord> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let delimiter = detect_delimiter(raw);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let columns = match reader.headers() {
        Ok(headers) => locate_columns(headers),
        Err(err) => {
            warn!(%err, "unreadable header row in pickup feed");
            None
        }
    };
    let Some(columns) = columns else {
        return Vec::new();
    };

    let mut records = Vec::new();
    let mut skipped = 0_usize;

    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                debug!(row, %err, "skipping malformed row");
                skipped += 1;
                continue;
            }
        };

        let label = record.get(columns.waste_type).unwrap_or_default().trim();
        let Some(waste_type) = WasteType::from_label(label) else {
            debug!(row, waste_type = label, "skipping unknown waste type");
            skipped += 1;
            continue;
        };

        let raw_date = record.get(columns.date).unwrap_or_default();
        records.push(PickupRecord::new(parse_date(raw_date), waste_type, raw_date));
    }

    records.sort_by_key(|record| record.date().unwrap_or(NaiveDate::MIN));

    debug!(
        delimiter = %char::from(delimiter),
        kept = records.len(),
        skipped,
        "parsed pickup feed"
    );
    records
}

fn locate_columns(headers: &StringRecord) -> Option<Columns> {
    let position = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim_start_matches(BYTE_ORDER_MARK).trim() == name)
    };

    match (position(DATE_COLUMN), position(WASTE_TYPE_COLUMN)) {
        (Some(date), Some(waste_type)) => Some(Columns { date, waste_type }),
        _ => {
            warn!(
                headers = ?headers.iter().collect::<Vec<_>>(),
                "pickup feed is missing the {DATE_COLUMN}/{WASTE_TYPE_COLUMN} columns"
            );
            None
        }
    }
}
