//! Command-line interface for iNaturalist difference detection

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use inat_diff::error::Result;
use inat_diff::fetch::RetryPolicy;
use inat_diff::query::{SpeciesQuery, DEFAULT_LOOKBACK_YEARS};
use inat_diff::{html, report, InatClient, QualityAnnotator};

#[derive(Parser)]
#[command(
    name = "inat-diff",
    version,
    about = "Query iNaturalist for species observation patterns",
    after_help = "\
Examples:
  # Query a specific species in a region and time period
  inat-diff query \"Panthera leo\" \"last 30 days\" \"Kenya\"

  # Find ALL new species in a region during a time period
  inat-diff new-species \"this month\" \"Oregon\"

  # Check if a SPECIFIC species is new to a region
  inat-diff new-species \"this year\" \"Florida\" \"Python bivittatus\"

  # Customize lookback and rate limiting
  inat-diff new-species \"this month\" \"Oregon\" --lookback-years 10 --rate-limit 0.6

  # List all species in a region during a time period
  inat-diff list-species \"last month\" \"Oregon\"

Supported time periods:
  \"last N days/weeks/months/years\", \"this month/year\",
  \"last month/year\", \"YYYY-MM-DD to YYYY-MM-DD\""
)]
struct Cli {
    /// Save results to a JSON file (console output stays text)
    #[arg(long = "output-file", short = 'o', global = true)]
    output_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Query observations of a specific taxon in a region and period
    Query {
        /// Taxon name (Latin name)
        taxon: String,
        /// Time period
        period: String,
        /// Geographic region
        region: String,
    },
    /// Find species new to a region (all species, or one specific taxon)
    NewSpecies {
        /// Time period
        period: String,
        /// Geographic region
        region: String,
        /// Optional specific taxon (Latin name) to check
        taxon: Option<String>,
        /// Years to look back for historical data
        #[arg(long = "lookback-years", default_value_t = DEFAULT_LOOKBACK_YEARS)]
        lookback_years: u32,
        /// Seconds to wait between API calls (default 1.2 = 50/min,
        /// the iNaturalist limit is 60-100/min)
        #[arg(long = "rate-limit", default_value_t = 1.2)]
        rate_limit: f64,
        /// Annotate new species with their best observation quality grade
        #[arg(long)]
        quality: bool,
        /// Render an HTML report instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// List all species observed in a region during a period
    ListSpecies {
        /// Time period
        period: String,
        /// Geographic region
        region: String,
        /// Render an HTML report instead of plain text
        #[arg(long)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("inat_diff=info".parse().expect("valid log directive"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let engine = SpeciesQuery::new();

    match cli.command {
        Command::Query {
            taxon,
            period,
            region,
        } => {
            let result = engine
                .query_species_in_period(&taxon, &period, &region)
                .await?;
            save_if_requested(&cli.output_file, &result)?;
            print!("{}", report::render_observations_text(&result));
        }

        Command::NewSpecies {
            period,
            region,
            taxon: Some(taxon),
            lookback_years,
            ..
        } => {
            let result = engine
                .check_new_species(&taxon, &period, &region, lookback_years)
                .await?;
            save_if_requested(&cli.output_file, &result)?;
            print!("{}", report::render_single_species_text(&result));
        }

        Command::NewSpecies {
            period,
            region,
            taxon: None,
            lookback_years,
            rate_limit,
            quality,
            html,
        } => {
            let policy = RetryPolicy::with_rate_limit(Duration::from_secs_f64(rate_limit.max(0.0)));
            let mut result = engine
                .find_all_new_species(&period, &region, None, lookback_years, &policy)
                .await?;

            if quality {
                let annotator = QualityAnnotator::new(InatClient::new());
                annotator
                    .annotate(
                        &mut result.new_species,
                        Some(result.query.place_id),
                        policy.rate_limit,
                    )
                    .await;
            }

            save_if_requested(&cli.output_file, &result)?;
            if html {
                print!("{}", html::render_new_species_html(&result));
            } else {
                print!("{}", report::render_new_species_text(&result));
            }
        }

        Command::ListSpecies {
            period,
            region,
            html,
        } => {
            let result = engine
                .list_species_in_period(&period, &region, &RetryPolicy::default())
                .await?;
            save_if_requested(&cli.output_file, &result)?;
            if html {
                print!("{}", html::render_species_list_html(&result));
            } else {
                print!("{}", report::render_species_list_text(&result));
            }
        }
    }

    Ok(())
}

fn save_if_requested<T: serde::Serialize>(path: &Option<PathBuf>, result: &T) -> Result<()> {
    if let Some(path) = path {
        report::save_json(path, result)?;
        eprintln!("Results saved to {}", path.display());
    }
    Ok(())
}
