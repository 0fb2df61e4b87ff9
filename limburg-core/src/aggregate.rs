//! Deriving the upcoming pickups from parsed feed records.

use chrono::NaiveDate;
use tracing::debug;

use crate::model::{Pickup, PickupRecord, PickupSnapshot};

/// Build the snapshot of every pickup on or after `today`.
///
/// Records without a date are left out. The result is ordered by date, keeping input order
/// for pickups on the same day, whatever order the records arrive in.
#[must_use]
pub fn aggregate<S: Into<String>>(source: S, records: &[PickupRecord], today: NaiveDate) -> PickupSnapshot {
    let undated = records
        .iter()
        .filter(|record| record.date().is_none())
        .count();
    if undated > 0 {
        debug!(undated, "ignoring pickups without a parsable date");
    }

    let mut upcoming: Vec<Pickup> = records
        .iter()
        .filter_map(PickupRecord::to_pickup)
        .filter(|pickup| pickup.date >= today)
        .collect();
    upcoming.sort_by_key(|pickup| pickup.date);

    PickupSnapshot::new(source.into(), upcoming)
}
