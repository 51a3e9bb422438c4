use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use waterseeker::{
    Coordinate, LocationQuery, LocationResolver, ResultBundle, WaterSeekerAgent,
    WaterSeekerConfig, WatsonxClient, WeatherClient, logging, web,
};

#[derive(Parser, Debug)]
#[command(
    name = "waterseeker",
    about = "Recommend a water-reservoir site among a few map points",
    version
)]
struct Cli {
    /// Configuration file (defaults to <config dir>/waterseeker/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze up to five points and recommend one
    Analyze {
        /// Point as "lat,lon" or "lat lon"; repeat for each location
        #[arg(
            short,
            long = "location",
            required = true,
            allow_hyphen_values = true,
            value_parser = parse_coordinate
        )]
        locations: Vec<Coordinate>,

        /// Also print current weather conditions per point
        #[arg(long)]
        weather: bool,
    },
    /// Serve the JSON API
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn parse_coordinate(input: &str) -> std::result::Result<Coordinate, String> {
    input.parse::<Coordinate>().map_err(|e| e.user_message())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<waterseeker::WaterSeekerError>() {
                Some(error) => eprintln!("❌ {}", error.user_message()),
                None => eprintln!("❌ {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = WaterSeekerConfig::load_from_path(cli.config)?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Command::Analyze { locations, weather } => analyze(&config, locations, weather).await,
        Command::Serve { port } => web::run(&config, port.unwrap_or(config.server.port)).await,
    }
}

async fn analyze(config: &WaterSeekerConfig, locations: Vec<Coordinate>, weather: bool) -> Result<()> {
    config.require_generation_key()?;

    let mut query = LocationQuery::new();
    for coordinate in locations {
        if !query.push(coordinate)? {
            warn!("Ignoring duplicate location {}", coordinate);
        }
    }

    let client = WatsonxClient::new(&config.generation)?;
    let session = client
        .start_session()
        .await
        .context("Failed to acquire IAM token")?;
    let resolver = LocationResolver::new(config)?;

    let bundle = WaterSeekerAgent::new(session, &resolver).run(&query).await?;
    print_bundle(&bundle);

    if weather {
        let client = WeatherClient::new(&config.weather, &config.geocoding.user_agent)?;
        if !client.is_configured() {
            warn!("No weather API key configured; showing placeholder conditions");
        }
        println!("\nCurrent Weather Conditions:");
        for (index, coordinate) in query.indexed() {
            println!("  Location {index} {coordinate}:");
            for line in client.current_conditions(coordinate).await.summary_lines() {
                println!("    - {line}");
            }
        }
    }

    Ok(())
}

fn print_bundle(bundle: &ResultBundle) {
    println!("Analysis:\n{}\n", bundle.analysis_text);
    println!("Recommendation:\n{}\n", bundle.recommendation_text);

    if !bundle.water_resources.is_empty() {
        println!("Water Resources:");
        for (index, (coordinate, note)) in bundle
            .coordinates
            .iter()
            .zip(&bundle.water_resources)
            .enumerate()
        {
            let marker = if bundle.recommended_index() == Some(index) {
                " ⭐"
            } else {
                ""
            };
            println!("  Location {} {}{}: {}", index + 1, coordinate, marker, note);
        }
        println!();
    }

    println!("Agent Log:\n{}", bundle.agent_log);
}
