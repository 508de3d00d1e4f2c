use std::collections::BTreeMap;

use log::{debug, warn};
use rand::Rng;

use crate::models::{FilterSpec, LocationKey, MarkerDescriptor, MarkerDetail, StockingRecord};

/// Maximum jitter applied to each axis of a marker, in degrees.
pub const MAX_OFFSET: f64 = 0.001;

pub fn render<R: Rng>(
    records: &[StockingRecord],
    spec: &FilterSpec,
    rng: &mut R,
) -> Vec<MarkerDescriptor> {
    let groups = group_by_location(records);
    let group_count = groups.len();
    let mut markers = Vec::new();

    for (key, group) in groups {
        if !key.matches_search(&spec.search) {
            continue;
        }

        let details: Vec<MarkerDetail> = group
            .iter()
            .copied()
            .filter(|record| record_passes(record, spec))
            .map(MarkerDetail::from)
            .collect();

        if details.is_empty() {
            continue;
        }

        let (base_longitude, base_latitude) = mean_coordinates(&group);
        markers.push(MarkerDescriptor {
            key,
            longitude: base_longitude + rng.gen_range(-MAX_OFFSET..=MAX_OFFSET),
            latitude: base_latitude + rng.gen_range(-MAX_OFFSET..=MAX_OFFSET),
            base_longitude,
            base_latitude,
            details,
        });
    }

    debug!(
        "rendered {} markers from {} locations ({} records)",
        markers.len(),
        group_count,
        records.len()
    );
    markers
}

pub fn group_by_location(records: &[StockingRecord]) -> BTreeMap<LocationKey, Vec<&StockingRecord>> {
    let mut groups: BTreeMap<LocationKey, Vec<&StockingRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.location_key()).or_default().push(record);
    }
    groups
}

/// Season, species and quantity clauses. Records with an unreadable date never pass.
pub fn record_passes(record: &StockingRecord, spec: &FilterSpec) -> bool {
    let Some(month) = record.month() else {
        warn!(
            "skipping {} record at {}/{}/{}: unreadable date {:?}",
            record.species, record.water, record.town, record.county, record.date
        );
        return false;
    };

    spec.season_allows(month) && spec.species.contains(&record.species) && record.qty >= spec.min_qty
}

pub fn parse_min_qty(text: &str) -> u32 {
    match text.trim().parse::<i64>() {
        Ok(value) => value.clamp(0, u32::MAX as i64) as u32,
        Err(_) => {
            debug!("minimum quantity {text:?} is not a number, using 0");
            0
        }
    }
}

fn mean_coordinates(group: &[&StockingRecord]) -> (f64, f64) {
    let count = group.len().max(1) as f64;
    let longitude = group.iter().map(|record| record.longitude).sum::<f64>() / count;
    let latitude = group.iter().map(|record| record.latitude).sum::<f64>() / count;
    (longitude, latitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn long_pond(qty: u32, size: f64, date: &str) -> StockingRecord {
        StockingRecord {
            species: "Brook Trout".to_string(),
            qty,
            size_inches: Some(size),
            date: date.to_string(),
            water: "Long Pond".to_string(),
            town: "Bridgton".to_string(),
            county: "Cumberland".to_string(),
            longitude: -70.71,
            latitude: 44.05,
        }
    }

    fn sample_dataset() -> Vec<StockingRecord> {
        vec![
            long_pond(50, 8.0, "2023-04-15"),
            long_pond(5, 6.0, "2023-09-10"),
        ]
    }

    fn brook_trout_spec() -> FilterSpec {
        FilterSpec {
            species: ["Brook Trout".to_string()].into_iter().collect(),
            show_spring: true,
            show_fall: false,
            search: String::new(),
            min_qty: 10,
        }
    }

    #[test]
    fn spring_filter_keeps_only_april_record() {
        let mut rng = StdRng::seed_from_u64(7);
        let markers = render(&sample_dataset(), &brook_trout_spec(), &mut rng);

        assert_eq!(markers.len(), 1);
        let marker = &markers[0];
        assert_eq!(marker.key.to_string(), "Long Pond/Bridgton/Cumberland");
        assert_eq!(marker.details.len(), 1);
        assert_eq!(marker.details[0].qty, 50);
        assert_eq!(marker.details[0].date, "2023-04-15");
    }

    #[test]
    fn quantity_threshold_can_empty_a_location() {
        let spec = FilterSpec {
            show_fall: true,
            search: "pond".to_string(),
            min_qty: 100,
            ..brook_trout_spec()
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert!(render(&sample_dataset(), &spec, &mut rng).is_empty());
    }

    #[test]
    fn no_season_selected_yields_no_markers() {
        let spec = FilterSpec {
            show_spring: false,
            show_fall: false,
            min_qty: 0,
            ..brook_trout_spec()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(render(&sample_dataset(), &spec, &mut rng).is_empty());
    }

    #[test]
    fn min_qty_boundary_is_inclusive() {
        let record = long_pond(10, 8.0, "2023-04-15");
        assert!(record_passes(&record, &brook_trout_spec()));

        let record = long_pond(9, 8.0, "2023-04-15");
        assert!(!record_passes(&record, &brook_trout_spec()));
    }

    #[test]
    fn unselected_species_is_filtered() {
        let mut record = long_pond(50, 8.0, "2023-04-15");
        record.species = "Rainbow Trout".to_string();
        assert!(!record_passes(&record, &brook_trout_spec()));
    }

    #[test]
    fn search_prefix_matches_town_and_missing_term_drops_group() {
        let mut rng = StdRng::seed_from_u64(3);
        let spec = FilterSpec {
            search: "bridg".to_string(),
            ..brook_trout_spec()
        };
        assert_eq!(render(&sample_dataset(), &spec, &mut rng).len(), 1);

        let spec = FilterSpec {
            search: "sebago".to_string(),
            ..brook_trout_spec()
        };
        assert!(render(&sample_dataset(), &spec, &mut rng).is_empty());
    }

    #[test]
    fn unreadable_date_excludes_only_that_record() {
        let mut records = sample_dataset();
        records.push(long_pond(80, 9.0, "sometime in May"));
        let spec = FilterSpec {
            show_fall: true,
            min_qty: 0,
            ..brook_trout_spec()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let markers = render(&records, &spec, &mut rng);

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].details.len(), 2);
        assert!(markers[0].details.iter().all(|detail| detail.qty != 80));
    }

    #[test]
    fn base_coordinates_average_every_record_in_group() {
        let mut far = long_pond(1, 4.0, "2023-10-01");
        far.longitude = -70.69;
        far.latitude = 44.07;
        let records = vec![long_pond(50, 8.0, "2023-04-15"), far];

        let mut rng = StdRng::seed_from_u64(5);
        let markers = render(&records, &brook_trout_spec(), &mut rng);

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].details.len(), 1);
        assert!((markers[0].base_longitude - -70.70).abs() < 1e-9);
        assert!((markers[0].base_latitude - 44.06).abs() < 1e-9);
    }

    #[test]
    fn repeated_renders_differ_only_by_offset() {
        let records = sample_dataset();
        let spec = brook_trout_spec();
        let first = render(&records, &spec, &mut StdRng::seed_from_u64(1));
        let second = render(&records, &spec, &mut StdRng::seed_from_u64(2));

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.details, b.details);
            assert_eq!(a.base_longitude, b.base_longitude);
            assert_eq!(a.base_latitude, b.base_latitude);
            for marker in [a, b] {
                assert!((marker.longitude - marker.base_longitude).abs() <= MAX_OFFSET + 1e-9);
                assert!((marker.latitude - marker.base_latitude).abs() <= MAX_OFFSET + 1e-9);
            }
        }
    }

    #[test]
    fn seeded_rng_reproduces_offsets() {
        let records = sample_dataset();
        let spec = brook_trout_spec();
        let first = render(&records, &spec, &mut StdRng::seed_from_u64(42));
        let second = render(&records, &spec, &mut StdRng::seed_from_u64(42));
        assert_eq!(first[0].longitude, second[0].longitude);
        assert_eq!(first[0].latitude, second[0].latitude);
    }

    #[test]
    fn empty_dataset_renders_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(render(&[], &brook_trout_spec(), &mut rng).is_empty());
    }

    #[test]
    fn min_qty_text_falls_back_to_zero() {
        assert_eq!(parse_min_qty("25"), 25);
        assert_eq!(parse_min_qty(" 7 "), 7);
        assert_eq!(parse_min_qty("lots"), 0);
        assert_eq!(parse_min_qty(""), 0);
        assert_eq!(parse_min_qty("-5"), 0);
    }
}
