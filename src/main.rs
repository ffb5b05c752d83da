use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use tourdeck::alto::{parse_feed, FeedClient, TokenCache};
use tourdeck::config::Config;
use tourdeck::store::{Property, PropertyStore};
use tourdeck::tour::TourPublisher;
use tourdeck::{epc, import};

/// Get the config file path (~/.config/tourdeck/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("tourdeck")
        .join("config.toml"))
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };
    Config::load(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))
}

#[derive(Parser, Debug)]
#[command(name = "tourdeck", about = "Virtual-tour property dashboard tools")]
struct Args {
    /// Config file (defaults to ~/.config/tourdeck/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import properties from the Alto feed into the demo property list
    Import {
        /// Print the merged property list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse a saved Alto feed file without contacting the API
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the parsed properties as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the demo property list
    List {
        #[arg(long)]
        json: bool,
    },
    /// Generate a virtual tour for a demo property (mock publisher)
    Tour {
        #[arg(value_name = "PROPERTY_ID")]
        property_id: String,
    },
    /// Energy Performance Certificate lookup (mock data)
    #[command(subcommand)]
    Epc(EpcCommand),
}

#[derive(Subcommand, Debug)]
enum EpcCommand {
    /// Find certificates for a postcode
    Search { postcode: String },
    /// Show a certificate by LMK key
    Certificate { lmk_key: String },
}

fn print_properties(properties: &[Property], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(properties)?);
        return Ok(());
    }
    for p in properties {
        println!("{:<28} {}", p.id, p.name);
        println!("{:<28} {} | {} | {}", "", p.contact.name, p.contact.email, p.contact.phone);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Import { json } => {
            let config = load_config(args.config)?;

            let feed = FeedClient::from_config(&config, Arc::new(TokenCache::new()))
                .context("Alto feed is not configured")?;

            let mut store = PropertyStore::with_sample_data();
            match import::import_from_alto(&feed, &mut store).await {
                Ok(_) if json => print_properties(store.list(), true)?,
                Ok(summary) => {
                    println!(
                        "Imported {} new properties from Alto ({} already present)",
                        summary.added, summary.skipped
                    );
                    print_properties(store.list(), false)?;
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    eprintln!("Cause: {}", e.alto_error());
                    std::process::exit(1);
                }
            }
        }
        Command::Parse { file, json } => {
            let xml = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read feed file: {}", file.display()))?;
            let properties = parse_feed(&xml).context("Failed to parse Alto feed")?;
            if !json {
                println!("Parsed {} properties from {}", properties.len(), file.display());
            }
            print_properties(&properties, json)?;
        }
        Command::List { json } => {
            let store = PropertyStore::with_sample_data();
            print_properties(store.list(), json)?;
        }
        Command::Tour { property_id } => {
            let config = load_config(args.config)?;
            let publisher = TourPublisher::from_config(&config.tour)
                .context("Tour publishing is not configured")?;
            let mut store = PropertyStore::with_sample_data();
            let url = publisher
                .generate_tour(&mut store, &property_id)
                .context("Failed to generate tour")?;
            println!("Tour for {}: {}", property_id, url);
        }
        Command::Epc(EpcCommand::Search { postcode }) => {
            let rows = epc::search_epcs(&postcode);
            if rows.is_empty() {
                println!("No certificates found for {}", postcode);
            }
            for row in rows {
                println!(
                    "{}  {} -> {}  {}",
                    row.lmk_key,
                    row.current_energy_rating.to_uppercase(),
                    row.potential_energy_rating.to_uppercase(),
                    row.address
                );
            }
        }
        Command::Epc(EpcCommand::Certificate { lmk_key }) => {
            let cert = epc::get_certificate(&lmk_key);
            println!("{}", serde_json::to_string_pretty(&cert)?);
        }
    }

    Ok(())
}
