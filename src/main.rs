use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use carwash_registration::app::location_use_case::{LocationPipeline, SearchOutcome};
use carwash_registration::app::registration_use_case::{DraftFile, RegistrationUseCase};
use carwash_registration::config::Config;
use carwash_registration::infra::device_location::FixedDeviceLocation;
use carwash_registration::infra::nominatim_client::NominatimClient;
use carwash_registration::infra::submission_client::HttpSubmissionSink;
use carwash_registration::observability::init_logging;

#[derive(Parser)]
#[command(name = "carwash-registration")]
#[command(about = "Resolve car-wash locations and build registration records")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print address suggestions for a free-text query
    Search {
        query: String,
    },
    /// Resolve the address at a coordinate
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Build a registration record from a draft file
    Register {
        /// TOML draft with name, phone, location, wash types and availability
        #[arg(long)]
        draft: PathBuf,
        /// Send the record to the registration API instead of printing it
        #[arg(long)]
        submit: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_pipeline(config: &Config) -> Result<LocationPipeline> {
    let geocoder = NominatimClient::new(&config.geocoder).context("Failed to build geocoder client")?;
    Ok(LocationPipeline::new(
        Arc::new(geocoder),
        Arc::new(FixedDeviceLocation::new(&config.device)),
        config.geocoder.clone(),
    ))
}

async fn run_register(config: &Config, draft_path: &Path, submit: bool) -> Result<()> {
    let content = std::fs::read_to_string(draft_path)
        .with_context(|| format!("Failed to read draft file '{}'", draft_path.display()))?;
    let file = DraftFile::from_toml_str(&content).context("Draft file is not valid")?;

    let pipeline = build_pipeline(config)?;
    let resolved = if file.use_device {
        pipeline.use_device_location().await
    } else if let (Some(lat), Some(lon)) = (file.latitude, file.longitude) {
        pipeline.select_coordinates(lat, lon).await
    } else if let Some(query) = file.search.as_deref() {
        match pipeline.search(query).await {
            SearchOutcome::Failed(e) => bail!("Search for '{}' failed: {}", query, e),
            outcome => info!(?outcome, "Search finished"),
        }
        match pipeline.submit_search().await {
            Some(result) => result,
            None => bail!("No suggestions found for '{}'", query),
        }
    } else {
        bail!("Draft file needs `search`, `latitude`/`longitude` or `use_device = true`");
    };
    if let Err(e) = &resolved {
        // The point stays selected without an address; submission reports it.
        warn!("Address lookup failed: {}", e);
    }

    let mut draft = file.into_draft()?;
    draft.apply_location(&pipeline.snapshot());

    if submit {
        let sink = HttpSubmissionSink::new(&config.submission, &config.geocoder)?;
        let receipt = RegistrationUseCase::new(Box::new(sink)).submit(&draft).await?;
        print_json(&receipt)
    } else {
        print_json(&draft.build_submission()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logging();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Search { query } => {
            let pipeline = build_pipeline(&config)?;
            match pipeline.search(&query).await {
                SearchOutcome::Failed(e) => bail!("Search failed: {}", e),
                _ => print_json(&pipeline.snapshot().suggestions())?,
            }
        }
        Commands::Reverse { lat, lon } => {
            let pipeline = build_pipeline(&config)?;
            let address = pipeline.select_coordinates(lat, lon).await?;
            print_json(&address)?;
        }
        Commands::Register { draft, submit } => {
            run_register(&config, &draft, submit).await?;
        }
    }
    Ok(())
}
