//! Domain data structures for waste categories, parsed feed rows and pickup snapshots.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Waste categories published in the Limburg.net collection calendar.
///
/// The serialized form is the exact label used in the `Ophaling` column of the feed.
pub enum WasteType {
    /// Residual household waste.
    #[serde(rename = "Huisvuil")]
    Residual,
    /// Plastic bottles, metal packaging and drink cartons.
    #[serde(rename = "PMD", alias = "Pmd")]
    Packaging,
    /// Textiles and clothing.
    #[serde(rename = "Textiel")]
    Textile,
    /// Paper and cardboard.
    #[serde(rename = "Papier & Karton", alias = "Papier & karton")]
    Paper,
    /// Garden waste.
    #[serde(rename = "Tuinafval")]
    Garden,
    /// Kitchen and food waste.
    #[serde(rename = "Keukenafval")]
    Kitchen,
}

impl WasteType {
    /// Every recognized category, in display order.
    pub const ALL: [WasteType; 6] = [
        WasteType::Residual,
        WasteType::Packaging,
        WasteType::Textile,
        WasteType::Paper,
        WasteType::Garden,
        WasteType::Kitchen,
    ];

    /// Label as it appears in the feed.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            WasteType::Residual => "Huisvuil",
            WasteType::Packaging => "PMD",
            WasteType::Textile => "Textiel",
            WasteType::Paper => "Papier & Karton",
            WasteType::Garden => "Tuinafval",
            WasteType::Kitchen => "Keukenafval",
        }
    }

    /// Identifier-safe variant of the label, e.g. `papier_and_karton`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            WasteType::Residual => "huisvuil",
            WasteType::Packaging => "pmd",
            WasteType::Textile => "textiel",
            WasteType::Paper => "papier_and_karton",
            WasteType::Garden => "tuinafval",
            WasteType::Kitchen => "keukenafval",
        }
    }

    /// Resolve a feed label. Matching is exact and case-sensitive.
    ///
    /// Limburg.net exports also spell two categories `Pmd` and `Papier & karton`; both
    /// spellings are accepted.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Huisvuil" => Some(WasteType::Residual),
            "PMD" | "Pmd" => Some(WasteType::Packaging),
            "Textiel" => Some(WasteType::Textile),
            "Papier & Karton" | "Papier & karton" => Some(WasteType::Paper),
            "Tuinafval" => Some(WasteType::Garden),
            "Keukenafval" => Some(WasteType::Kitchen),
            _ => None,
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One accepted row of the feed, before filtering on date.
pub struct PickupRecord {
    date: Option<NaiveDate>,
    waste_type: WasteType,
    raw_date: String,
}

impl PickupRecord {
    /// Build a record from its parsed date, category and the original date cell.
    #[must_use]
    pub fn new<S: Into<String>>(date: Option<NaiveDate>, waste_type: WasteType, raw_date: S) -> Self {
        Self {
            date,
            waste_type,
            raw_date: raw_date.into(),
        }
    }

    /// Parsed pickup date, absent when the date cell could not be parsed.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Category of the pickup.
    #[must_use]
    pub fn waste_type(&self) -> WasteType {
        self.waste_type
    }

    /// Date cell exactly as it appeared in the feed.
    #[must_use]
    pub fn raw_date(&self) -> &str {
        &self.raw_date
    }

    /// Public view of the record, if it carries a date.
    #[must_use]
    pub fn to_pickup(&self) -> Option<Pickup> {
        self.date.map(|date| Pickup {
            date,
            waste_type: self.waste_type,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Scheduled pickup as exposed to consumers.
pub struct Pickup {
    /// Date of the pickup, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Type of waste collected.
    pub waste_type: WasteType,
}

impl fmt::Display for Pickup {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} on {}", self.waste_type, self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Result of one successful refresh: every pickup on or after the reference day.
pub struct PickupSnapshot {
    source: String,
    next_overall: Option<Pickup>,
    upcoming: Vec<Pickup>,
}

impl PickupSnapshot {
    /// `upcoming` must already be sorted ascending by date.
    pub(crate) fn new(source: String, upcoming: Vec<Pickup>) -> Self {
        Self {
            source,
            next_overall: upcoming.first().copied(),
            upcoming,
        }
    }

    /// Identifier of the feed the snapshot was built from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Soonest pickup of any category.
    #[must_use]
    pub fn next_overall(&self) -> Option<&Pickup> {
        self.next_overall.as_ref()
    }

    /// All upcoming pickups, ascending by date.
    #[must_use]
    pub fn upcoming(&self) -> &[Pickup] {
        &self.upcoming
    }

    /// Soonest pickup for a single category.
    #[must_use]
    pub fn next_for(&self, waste_type: WasteType) -> Option<&Pickup> {
        self.upcoming
            .iter()
            .find(|pickup| pickup.waste_type == waste_type)
    }

    /// Next pickup for every recognized category, `None` where nothing is scheduled.
    #[must_use]
    pub fn per_category(&self) -> BTreeMap<WasteType, Option<Pickup>> {
        WasteType::ALL
            .into_iter()
            .map(|waste_type| (waste_type, self.next_for(waste_type).copied()))
            .collect()
    }

    /// Every upcoming date for a single category.
    #[must_use]
    pub fn upcoming_dates(&self, waste_type: WasteType) -> Vec<NaiveDate> {
        self.upcoming
            .iter()
            .filter(|pickup| pickup.waste_type == waste_type)
            .map(|pickup| pickup.date)
            .collect()
    }

    /// Attribute view for one category.
    #[must_use]
    pub fn category_view(&self, waste_type: WasteType) -> CategoryView {
        CategoryView {
            waste_type,
            next_pickup_date: self.next_for(waste_type).map(|pickup| pickup.date),
            source: self.source.clone(),
            upcoming_dates: self.upcoming_dates(waste_type),
        }
    }

    /// Consumer-facing result.
    #[must_use]
    pub fn published(&self) -> PublishedResult {
        PublishedResult {
            next_overall: self.next_overall,
            per_category: self.per_category(),
            upcoming: self.upcoming.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Key/value attributes describing one category.
pub struct CategoryView {
    /// Category described by this view.
    pub waste_type: WasteType,
    /// Date of the next pickup, if any.
    pub next_pickup_date: Option<NaiveDate>,
    /// Identifier of the feed.
    pub source: String,
    /// Every upcoming date for the category.
    pub upcoming_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Result published to consumers after a refresh.
pub struct PublishedResult {
    /// Soonest pickup of any category.
    pub next_overall: Option<Pickup>,
    /// Next pickup keyed by category label.
    pub per_category: BTreeMap<WasteType, Option<Pickup>>,
    /// All upcoming pickups, ascending by date.
    pub upcoming: Vec<Pickup>,
}
