use std::fmt::Write;

use crate::models::{FilterSpec, MarkerDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesSummary {
    pub species: String,
    pub stockings: usize,
    pub total_fish: u64,
}

pub fn summarize_by_species(markers: &[MarkerDescriptor]) -> Vec<SpeciesSummary> {
    let mut map: std::collections::HashMap<String, (usize, u64)> =
        std::collections::HashMap::new();

    for detail in markers.iter().flat_map(|marker| marker.details.iter()) {
        let entry = map.entry(detail.species.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += u64::from(detail.qty);
    }

    let mut summaries: Vec<SpeciesSummary> = map
        .into_iter()
        .map(|(species, (stockings, total_fish))| SpeciesSummary {
            species,
            stockings,
            total_fish,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_fish
            .cmp(&a.total_fish)
            .then_with(|| a.species.cmp(&b.species))
    });
    summaries
}

fn season_label(spec: &FilterSpec) -> &'static str {
    match (spec.show_spring, spec.show_fall) {
        (true, true) => "spring and fall",
        (true, false) => "spring (Jan-Jun)",
        (false, true) => "fall (Jul-Dec)",
        (false, false) => "no season selected",
    }
}

pub fn build_report(spec: &FilterSpec, record_count: usize, markers: &[MarkerDescriptor]) -> String {
    let summaries = summarize_by_species(markers);

    let mut output = String::new();
    let species_label = if spec.species.is_empty() {
        "none".to_string()
    } else {
        spec.species.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    let search_label = if spec.search.is_empty() {
        "any location"
    } else {
        spec.search.as_str()
    };

    let _ = writeln!(output, "# Fish Stocking Map Report");
    let _ = writeln!(
        output,
        "Species: {}; season: {}; search: {}; minimum quantity: {}",
        species_label,
        season_label(spec),
        search_label,
        spec.min_qty
    );
    let _ = writeln!(
        output,
        "{} locations shown from {} stocking records",
        markers.len(),
        record_count
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Species Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No stockings match these filters.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} fish across {} stockings",
                summary.species, summary.total_fish, summary.stockings
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Locations");

    if markers.is_empty() {
        let _ = writeln!(output, "No locations match these filters.");
    } else {
        for marker in markers {
            let _ = writeln!(output);
            let _ = writeln!(
                output,
                "### {} ({}, {} County)",
                marker.key.water, marker.key.town, marker.key.county
            );
            let _ = writeln!(
                output,
                "Marker at {:.5}, {:.5}",
                marker.latitude, marker.longitude
            );
            for detail in &marker.details {
                let _ = writeln!(output, "- {}", detail);
            }
        }
    }

    output
}
