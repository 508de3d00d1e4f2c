use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::models::StockingRecord;

#[derive(Deserialize)]
struct CsvRow {
    #[serde(rename = "SPECIES")]
    species: String,
    #[serde(rename = "QTY")]
    qty: u32,
    #[serde(rename = "SIZE (inch)")]
    size_inches: Option<f64>,
    #[serde(rename = "DATE")]
    date: String,
    #[serde(rename = "WATER")]
    water: String,
    #[serde(rename = "TOWN")]
    town: String,
    #[serde(rename = "COUNTY")]
    county: String,
    #[serde(rename = "X_coord")]
    longitude: f64,
    #[serde(rename = "Y_coord")]
    latitude: f64,
}

impl From<CsvRow> for StockingRecord {
    fn from(row: CsvRow) -> Self {
        StockingRecord {
            species: row.species,
            qty: row.qty,
            size_inches: row.size_inches,
            date: row.date,
            water: row.water,
            town: row.town,
            county: row.county,
            longitude: row.longitude,
            latitude: row.latitude,
        }
    }
}

pub fn load_records(csv_path: &Path) -> anyhow::Result<Vec<StockingRecord>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let records = read_records(file)
        .with_context(|| format!("failed to load stocking data from {}", csv_path.display()))?;
    log::info!("loaded {} stocking records from {}", records.len(), csv_path.display());
    Ok(records)
}

pub fn read_records<R: Read>(reader: R) -> anyhow::Result<Vec<StockingRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                // quoted fields can span lines; the reader tracks the real line
                let line = err.position().map(|position| position.line());
                let context = match line {
                    Some(line) => format!("malformed stocking row on line {line}"),
                    None => "malformed stocking row".to_string(),
                };
                return Err(anyhow::Error::new(err).context(context));
            }
        };
        records.push(StockingRecord::from(row));
    }

    Ok(records)
}

/// Unique species in the order they first appear.
pub fn species_list(records: &[StockingRecord]) -> Vec<String> {
    let mut species: Vec<String> = Vec::new();
    for record in records {
        if !species.contains(&record.species) {
            species.push(record.species.clone());
        }
    }
    species
}
