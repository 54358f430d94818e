//! Catalog CLI
//!
//! Command-line client for a running `catalog-grpc` server, plus offline
//! commands for generating and converting laptop records.
//!
//! ```bash
//! # Store three random laptops
//! catalog create --count 3
//!
//! # Find laptops under $2500 with at least 4 cores and 8 GB of RAM
//! catalog search --max-price 2500 --min-cores 4 --min-ram-gb 8
//!
//! # Upload an image for a new random laptop
//! catalog upload --image laptop.jpg
//!
//! # Rate three new laptops, twice each
//! catalog rate --count 3 --rounds 2
//!
//! # Write a sample laptop, then convert it back from binary
//! catalog sample --binary laptop.bin --json laptop.json
//! catalog convert --input laptop.bin --output copy.json
//! ```
//!
//! The server address defaults to `http://[::1]:50051` and can be set with
//! `CATALOG_SERVER`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use catalog::{Filter, Memory, memory::Unit};
use catalog_grpc::LaptopServiceClient;
use tonic::transport::Channel;

mod commands;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Laptop catalog command-line tool", long_about = None)]
struct Cli {
    /// Server address (gRPC)
    #[arg(
        short,
        long,
        env = "CATALOG_SERVER",
        default_value = "http://[::1]:50051"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create random laptops on the server
    Create {
        /// Number of laptops to create
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
    /// Search laptops matching a filter
    Search {
        /// Highest acceptable price in USD
        #[arg(long, default_value_t = 3000.0)]
        max_price: f64,
        /// Fewest acceptable CPU cores
        #[arg(long, default_value_t = 4)]
        min_cores: u32,
        /// Lowest acceptable base CPU frequency
        #[arg(long, default_value_t = 2.5)]
        min_ghz: f64,
        /// Least acceptable RAM in gigabytes
        #[arg(long, default_value_t = 8)]
        min_ram_gb: u64,
    },
    /// Upload an image for a laptop
    Upload {
        /// Image file to upload
        #[arg(short, long)]
        image: PathBuf,
        /// Owning laptop; a random laptop is created when omitted
        #[arg(short, long)]
        laptop_id: Option<String>,
    },
    /// Create random laptops and rate them
    Rate {
        /// Number of laptops to rate
        #[arg(short, long, default_value_t = 3)]
        count: usize,
        /// How many times each laptop is rated
        #[arg(short, long, default_value_t = 1)]
        rounds: usize,
    },
    /// Write a random laptop to disk
    Sample {
        /// Protobuf output file
        #[arg(long)]
        binary: Option<PathBuf>,
        /// JSON output file
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Convert a laptop between protobuf (.bin) and JSON (.json)
    Convert {
        /// File to read
        #[arg(short, long)]
        input: PathBuf,
        /// File to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create { count } => {
            commands::create(&mut connect(&cli.server).await?, count).await
        }
        Commands::Search {
            max_price,
            min_cores,
            min_ghz,
            min_ram_gb,
        } => {
            let filter = Filter {
                max_price_usd: max_price,
                min_cpu_cores: min_cores,
                min_cpu_ghz: min_ghz,
                min_ram: Some(Memory::new(min_ram_gb, Unit::Gigabyte)),
            };
            commands::search(&mut connect(&cli.server).await?, filter).await
        }
        Commands::Upload { image, laptop_id } => {
            commands::upload(&mut connect(&cli.server).await?, &image, laptop_id).await
        }
        Commands::Rate { count, rounds } => {
            commands::rate(&mut connect(&cli.server).await?, count, rounds).await
        }
        Commands::Sample { binary, json } => commands::write_sample(binary, json),
        Commands::Convert { input, output } => commands::convert(&input, &output),
    }
}

async fn connect(server: &str) -> Result<LaptopServiceClient<Channel>> {
    LaptopServiceClient::connect(server.to_string())
        .await
        .with_context(|| format!("Failed to connect to {server}"))
}
