use std::collections::BTreeSet;

use clap::Args;
use log::debug;
use serde::Deserialize;

use crate::filter::parse_min_qty;
use crate::models::{FilterSpec, StockingRecord};

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Species to show (repeatable); defaults to every species in the data
    #[arg(long = "species")]
    species: Vec<String>,
    /// Include spring stockings (Jan-Jun)
    #[arg(long)]
    spring: bool,
    /// Include fall stockings (Jul-Dec)
    #[arg(long)]
    fall: bool,
    /// Search by water body, town or county
    #[arg(long, default_value = "")]
    search: String,
    /// Minimum quantity of fish; non-numeric input counts as 0
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    min_qty: String,
}

impl FilterArgs {
    pub fn to_spec(&self, records: &[StockingRecord]) -> FilterSpec {
        FilterSpec {
            species: selected_species(&self.species, records),
            show_spring: self.spring,
            show_fall: self.fall,
            search: self.search.clone(),
            min_qty: parse_min_qty(&self.min_qty),
        }
    }
}

/// Minimum quantity as typed into a text box or sent as a number.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum QtyInput {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl QtyInput {
    fn value(&self) -> u32 {
        match self {
            QtyInput::Number(value) => (*value).clamp(0, u32::MAX as i64) as u32,
            QtyInput::Text(text) => parse_min_qty(text),
            QtyInput::Other(value) => {
                debug!("minimum quantity {value} is not a whole number, using 0");
                0
            }
        }
    }
}

/// One line of `watch` input.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FilterInput {
    pub species: Option<Vec<String>>,
    pub spring: bool,
    pub fall: bool,
    pub search: String,
    pub min_qty: Option<QtyInput>,
}

impl FilterInput {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn to_spec(&self, records: &[StockingRecord]) -> FilterSpec {
        let species = match &self.species {
            Some(species) => species.iter().cloned().collect(),
            None => selected_species(&[], records),
        };
        FilterSpec {
            species,
            show_spring: self.spring,
            show_fall: self.fall,
            search: self.search.clone(),
            min_qty: self.min_qty.as_ref().map(QtyInput::value).unwrap_or(0),
        }
    }
}

fn selected_species(chosen: &[String], records: &[StockingRecord]) -> BTreeSet<String> {
    if chosen.is_empty() {
        FilterSpec::with_all_species(records).species
    } else {
        chosen.iter().cloned().collect()
    }
}
