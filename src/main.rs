use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use solar_potential::nsrdb::NsrdbClient;
use solar_potential::{ingest, output, telemetry, Config};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, env = "SOLAR_POTENTIAL_CONFIG")]
    config: Option<PathBuf>,
    /// Latitude in decimal degrees, overrides the configuration
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<f64>,
    /// Longitude in decimal degrees, overrides the configuration
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<f64>,
    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request and download NSRDB archives, one per configured year
    Fetch,
    /// Compute generation potential from extracted CSV files
    Compute {
        /// Directory holding one sub-directory per extracted archive
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Output file, defaults to `<lat>_<lon>_solar_generation.csv`
        #[arg(long)]
        output: Option<PathBuf>,
        /// Empty the data directory afterwards
        #[arg(long)]
        cleanup: bool,
    },
}

async fn fetch(config: &Config) -> Result<()> {
    let dirs = config.work_dirs();
    dirs.ensure()?;
    let client = NsrdbClient::new(
        &config.nsrdb.base_url,
        &config.nsrdb.api_key,
        &config.nsrdb.email,
    )?;
    let requests = config.download_requests()?;
    let tickets = client
        .request_all(&requests)
        .await
        .context("requesting NSRDB downloads")?;
    for (request, ticket) in requests.iter().zip(&tickets) {
        let dest = dirs.archive_path(request.year);
        client
            .download_archive(&ticket.url, &dest)
            .await
            .with_context(|| format!("downloading data for {}", request.year))?;
        let extracted = dirs.extract_archive(request.year)?;
        info!(year = request.year, dir = %extracted.display(), "data ready");
    }
    Ok(())
}

fn compute(
    config: &Config,
    data_dir: Option<PathBuf>,
    output_path: Option<PathBuf>,
    cleanup: bool,
) -> Result<()> {
    let dirs = config.work_dirs();
    let data_dir = data_dir.unwrap_or_else(|| dirs.data_dir.clone());
    let table = ingest::load_directory(&data_dir)
        .with_context(|| format!("loading measurements from {}", data_dir.display()))?;

    let merged = config.pipeline()?.run(&table)?;

    let path = output_path.unwrap_or_else(|| {
        dirs.output_dir.join(output::output_file_name(
            config.location.latitude,
            config.location.longitude,
        ))
    });
    output::write_file(&merged, &path)?;

    if cleanup {
        let removed = dirs.clean_data_dir()?;
        info!(removed, "cleaned data directory");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_tracing(args.json_logs);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(lat) = args.latitude {
        config.location.latitude = lat;
    }
    if let Some(lon) = args.longitude {
        config.location.longitude = lon;
    }
    if !(-90.0..=90.0).contains(&config.location.latitude)
        || !(-180.0..=180.0).contains(&config.location.longitude)
    {
        warn!(
            latitude = config.location.latitude,
            longitude = config.location.longitude,
            "coordinates out of range"
        );
        anyhow::bail!("latitude must be in [-90, 90] and longitude in [-180, 180]");
    }

    match args.command {
        Command::Fetch => fetch(&config).await,
        Command::Compute {
            data_dir,
            output,
            cleanup,
        } => compute(&config, data_dir, output, cleanup),
    }
}
