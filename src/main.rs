use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod controls;
mod dataset;
mod db;
mod filter;
mod models;
mod output;
mod report;
mod session;

use controls::{FilterArgs, FilterInput};
use models::{MapView, StockingRecord};
use session::FilterSession;

#[derive(Parser)]
#[command(name = "fish-stocking-map")]
#[command(about = "Fish stocking records as filterable map markers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Stocking data CSV; reads from Postgres (DATABASE_URL) when omitted
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Args)]
struct ViewArgs {
    #[arg(long, default_value_t = MapView::default().center_latitude, allow_hyphen_values = true)]
    center_lat: f64,
    #[arg(long, default_value_t = MapView::default().center_longitude, allow_hyphen_values = true)]
    center_lon: f64,
    #[arg(long, default_value_t = MapView::default().zoom)]
    zoom: u8,
    /// Seed for marker offsets, for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

impl ViewArgs {
    fn view(&self) -> MapView {
        MapView {
            center_latitude: self.center_lat,
            center_longitude: self.center_lon,
            zoom: self.zoom,
        }
    }

    fn rng(&self) -> StdRng {
        offset_rng(self.seed)
    }
}

fn offset_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Geojson,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Import stocking records from a CSV file into Postgres
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Render map markers for one set of filters
    Markers {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_enum, default_value_t = Format::Geojson)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown summary of the markers for one set of filters
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Read JSON filters from stdin, one per line, and redraw when they change
    Watch {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load(source: &SourceArgs) -> anyhow::Result<Vec<StockingRecord>> {
    let records = match &source.csv {
        Some(path) => dataset::load_records(path)?,
        None => db::fetch_records(&connect().await?).await?,
    };
    info!(
        "species in data: {}",
        dataset::species_list(&records).join(", ")
    );
    Ok(records)
}

fn write_output(out: Option<&PathBuf>, body: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Markers written to {}.", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&connect().await?).await?;
            println!("Schema ready.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&connect().await?, &csv).await?;
            println!("Inserted {inserted} stocking records from {}.", csv.display());
        }
        Commands::Markers {
            source,
            filters,
            view,
            format,
            out,
        } => {
            let records = load(&source).await?;
            let spec = filters.to_spec(&records);
            let markers = filter::render(&records, &spec, &mut view.rng());

            if markers.is_empty() {
                warn!("no locations match these filters");
            }

            let body = match format {
                Format::Json => output::to_json(&markers)?,
                Format::Geojson => {
                    serde_json::to_string_pretty(&output::to_geojson(&markers, &view.view()))?
                }
            };
            write_output(out.as_ref(), &body)?;
        }
        Commands::Report {
            source,
            filters,
            seed,
            out,
        } => {
            let records = load(&source).await?;
            let spec = filters.to_spec(&records);
            let markers = filter::render(&records, &spec, &mut offset_rng(seed));
            let report = report::build_report(&spec, records.len(), &markers);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Watch { source, view } => {
            let records = load(&source).await?;
            let map_view = view.view();
            let mut rng = view.rng();
            let mut session = FilterSession::new();

            for line in std::io::stdin().lock().lines() {
                let line = line.context("failed to read filter input")?;
                if line.trim().is_empty() {
                    continue;
                }

                let input = match FilterInput::parse(&line) {
                    Ok(input) => input,
                    Err(err) => {
                        warn!("ignoring filter line {line:?}: {err}");
                        continue;
                    }
                };

                let spec = input.to_spec(&records);
                let redraw = session.apply(spec, |spec| {
                    let markers = filter::render(&records, spec, &mut rng);
                    output::to_geojson(&markers, &map_view)
                });

                match redraw {
                    Some(collection) => println!("{}", serde_json::to_string(&collection)?),
                    None => info!("filters unchanged, map left as is"),
                }
            }
        }
    }

    Ok(())
}
