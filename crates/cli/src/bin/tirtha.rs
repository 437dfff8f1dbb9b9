//! `tirtha`: crowd forecasts for pilgrimage trips.
//!
//! ```bash
//! tirtha forecast --artifacts ./artifacts --dataset history.csv \
//!     --place "Golden Temple" --country India --start 2024-01-01 --end 2024-01-03
//! tirtha sites --dataset history.csv
//! tirtha defaults --dataset history.csv --place "Golden Temple" --country India
//! ```
//!
//! `RUST_LOG` controls log verbosity (default `info`); logs go to stderr.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use tf_core::TripRequest;
use tf_history::{default_trip_window, HistoricalDataset};
use tf_runtime::{init_global, init_tracing, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "tirtha", about = "Forecast visitor crowds at religious sites")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forecast every day of a trip.
    Forecast(ForecastArgs),
    /// List the (place, country) pairs in the historical dataset.
    Sites(DatasetArgs),
    /// Show the request defaults the dataset suggests for a pair.
    Defaults(DefaultsArgs),
}

#[derive(Args, Debug)]
struct DatasetArgs {
    #[arg(long, env = "TIRTHA_DATASET")]
    dataset: PathBuf,
}

#[derive(Args, Debug)]
struct DefaultsArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    #[arg(long)]
    place: String,
    #[arg(long)]
    country: String,
}

#[derive(Args, Debug)]
struct ForecastArgs {
    /// Engine config file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Artifact directory; overrides the config file.
    #[arg(long, env = "TIRTHA_ARTIFACTS")]
    artifacts: Option<PathBuf>,
    /// Historical dataset used to fill in omitted inputs.
    #[arg(long, env = "TIRTHA_DATASET")]
    dataset: Option<PathBuf>,
    #[arg(long)]
    place: String,
    #[arg(long)]
    country: String,
    /// Public holiday: yes/no.
    #[arg(long, value_parser = parse_yes_no)]
    holiday: Option<bool>,
    #[arg(long, allow_negative_numbers = true)]
    past_crowd: Option<i64>,
    /// First day, YYYY-MM-DD (default: today).
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day, YYYY-MM-DD (default: start + 3 days).
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Write `Date,Visitor_Count,Crowd_Level,Indicator` rows here.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print the forecast as JSON instead of a table.
    #[arg(long)]
    json: bool,
    /// Print a trip tip for each day.
    #[arg(long)]
    tips: bool,
}

fn parse_yes_no(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" => Ok(true),
        "no" | "n" | "false" => Ok(false),
        other => Err(format!("expected yes or no, got {other:?}")),
    }
}

/// Fill omitted request fields from the dataset, then from fixed defaults.
fn resolve_request(
    args: &ForecastArgs,
    dataset: Option<&HistoricalDataset>,
    today: NaiveDate,
) -> Result<TripRequest> {
    let (default_start, _) = default_trip_window(today);
    let start_date = args.start.unwrap_or(default_start);
    let end_date = args.end.unwrap_or_else(|| default_trip_window(start_date).1);

    let public_holiday = match (args.holiday, dataset) {
        (Some(flag), _) => flag,
        (None, Some(ds)) => ds.default_public_holiday(&args.place, &args.country),
        (None, None) => false,
    };
    let past_crowd_level = match (args.past_crowd, dataset) {
        (Some(level), _) => level,
        (None, Some(ds)) => ds
            .default_past_crowd_level(&args.place, &args.country)
            .context("dataset is empty; pass --past-crowd")?,
        (None, None) => bail!("--past-crowd is required without --dataset"),
    };

    Ok(TripRequest {
        place: args.place.clone(),
        country: args.country.clone(),
        public_holiday,
        past_crowd_level,
        start_date,
        end_date,
    })
}

fn run_forecast(args: ForecastArgs) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.artifacts {
        cfg = cfg.with_artifact_dir(dir);
    }

    let dataset = args
        .dataset
        .as_ref()
        .map(HistoricalDataset::from_path)
        .transpose()
        .context("loading historical dataset")?;

    let request = resolve_request(&args, dataset.as_ref(), Local::now().date_naive())?;
    if let Some(ds) = &dataset {
        if !ds.contains_pair(&request.place, &request.country) {
            warn!(place = %request.place, country = %request.country, "pair not in historical dataset");
        }
        if let Some((lo, hi)) = ds.past_crowd_bounds() {
            if request.past_crowd_level < lo || request.past_crowd_level > hi {
                warn!(
                    past_crowd = request.past_crowd_level,
                    lo, hi, "past crowd level outside the historical range; forecasting anyway"
                );
            }
        }
    }

    let engine = init_global(&cfg).context("loading forecast artifacts")?;
    let sequence = engine.forecast(&request)?;

    if args.json {
        println!("{}", tf_views::to_json(&sequence)?);
    } else {
        println!(
            "Predictions from {} to {}",
            request.start_date.format(tf_views::DATE_FORMAT),
            request.end_date.format(tf_views::DATE_FORMAT)
        );
        print!("{}", tf_views::render_table(&sequence));
    }
    if args.tips {
        println!();
        for tip in tf_views::trip_tips(&sequence) {
            println!("{tip}");
        }
    }
    if let Some(path) = &args.csv {
        tf_views::export_csv(&sequence, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "exported forecast");
    }

    let summary = tf_views::summarize(&sequence);
    info!(?summary, "forecast summary");
    info!(
        "{}",
        engine.metrics().snapshot().to_json_line("tirtha", None)
    );
    Ok(())
}

fn run_sites(args: DatasetArgs) -> Result<()> {
    let dataset = HistoricalDataset::from_path(&args.dataset)
        .with_context(|| format!("loading {}", args.dataset.display()))?;
    for place in dataset.places() {
        println!("{place}: {}", dataset.countries_for(&place).join(", "));
    }
    Ok(())
}

fn run_defaults(args: DefaultsArgs) -> Result<()> {
    let dataset = HistoricalDataset::from_path(&args.dataset.dataset)
        .with_context(|| format!("loading {}", args.dataset.dataset.display()))?;
    let (start, end) = default_trip_window(Local::now().date_naive());
    let request = dataset.prefill(&args.place, &args.country, start, end)?;
    let bounds = dataset.past_crowd_bounds();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "request": request,
            "past_crowd_bounds": bounds,
        }))?
    );
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Forecast(args) => run_forecast(args),
        Command::Sites(args) => run_sites(args),
        Command::Defaults(args) => run_defaults(args),
    }
}
