use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::dataset;
use crate::models::StockingRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Stable identity for a stocking event so re-importing the same file is a no-op.
/// Location names keep their case: "Long Pond" and "LONG POND" are separate locations.
pub fn source_key(record: &StockingRecord) -> String {
    let size = record
        .size_inches
        .map(|size| size.to_string())
        .unwrap_or_default();
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}|{}",
        record.water,
        record.town,
        record.county,
        record.species,
        record.date.trim(),
        record.qty,
        size,
        record.longitude,
        record.latitude
    )
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let records = dataset::load_records(csv_path)?;
    let mut inserted = 0usize;

    for record in &records {
        let result = sqlx::query(
            r#"
            INSERT INTO fish_map.stockings
            (id, species, qty, size_inches, stocked_on, water, town, county, longitude, latitude, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.species)
        .bind(i32::try_from(record.qty)?)
        .bind(record.size_inches)
        .bind(&record.date)
        .bind(&record.water)
        .bind(&record.town)
        .bind(&record.county)
        .bind(record.longitude)
        .bind(record.latitude)
        .bind(source_key(record))
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn fetch_records(pool: &PgPool) -> anyhow::Result<Vec<StockingRecord>> {
    let rows = sqlx::query(
        "SELECT species, qty, size_inches, stocked_on, water, town, county, longitude, latitude \
         FROM fish_map.stockings \
         ORDER BY seq",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let qty: i32 = row.get("qty");
        records.push(StockingRecord {
            species: row.get("species"),
            qty: u32::try_from(qty)?,
            size_inches: row.get("size_inches"),
            date: row.get("stocked_on"),
            water: row.get("water"),
            town: row.get("town"),
            county: row.get("county"),
            longitude: row.get("longitude"),
            latitude: row.get("latitude"),
        });
    }

    log::info!("fetched {} stocking records from Postgres", records.len());
    Ok(records)
}
