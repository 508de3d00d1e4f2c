use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

#[derive(Debug, Clone, PartialEq)]
pub struct StockingRecord {
    pub species: String,
    pub qty: u32,
    pub size_inches: Option<f64>,
    pub date: String,
    pub water: String,
    pub town: String,
    pub county: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl StockingRecord {
    pub fn location_key(&self) -> LocationKey {
        LocationKey {
            water: self.water.clone(),
            town: self.town.clone(),
            county: self.county.clone(),
        }
    }

    pub fn stocked_on(&self) -> Option<NaiveDate> {
        let raw = self.date.trim();
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                    .map(|value| value.date())
            })
    }

    pub fn month(&self) -> Option<u32> {
        self.stocked_on().map(|date| date.month())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LocationKey {
    pub water: String,
    pub town: String,
    pub county: String,
}

impl LocationKey {
    /// Case-insensitive substring match against water body, town or county.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        [&self.water, &self.town, &self.county]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.water, self.town, self.county)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub species: BTreeSet<String>,
    pub show_spring: bool,
    pub show_fall: bool,
    pub search: String,
    pub min_qty: u32,
}

impl FilterSpec {
    /// Every species in the dataset selected, no season chosen, empty search.
    pub fn with_all_species(records: &[StockingRecord]) -> Self {
        FilterSpec {
            species: records.iter().map(|record| record.species.clone()).collect(),
            ..FilterSpec::default()
        }
    }

    pub fn season_allows(&self, month: u32) -> bool {
        (self.show_spring && month <= 6) || (self.show_fall && month >= 7)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDetail {
    pub species: String,
    pub qty: u32,
    pub size_inches: Option<f64>,
    pub date: String,
}

impl MarkerDetail {
    /// Sizes keep a decimal point, so 8 inches reads "8.0".
    pub fn size_label(&self) -> String {
        match self.size_inches {
            Some(size) => format!("{size:?}"),
            None => "unknown".to_string(),
        }
    }
}

impl From<&StockingRecord> for MarkerDetail {
    fn from(record: &StockingRecord) -> Self {
        MarkerDetail {
            species: record.species.clone(),
            qty: record.qty,
            size_inches: record.size_inches,
            date: record.date.clone(),
        }
    }
}

impl fmt::Display for MarkerDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} — {} fish, size {} inches, date {}",
            self.species,
            self.qty,
            self.size_label(),
            self.date
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerDescriptor {
    pub key: LocationKey,
    pub longitude: f64,
    pub latitude: f64,
    pub base_longitude: f64,
    pub base_latitude: f64,
    pub details: Vec<MarkerDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        MapView {
            center_latitude: 44.6939,
            center_longitude: -69.3815,
            zoom: 7,
        }
    }
}
