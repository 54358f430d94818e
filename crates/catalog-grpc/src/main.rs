//! Catalog gRPC Server
//!
//! Runs the laptop catalog as a gRPC server.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use catalog_grpc::config::{DEFAULT_ADDR, DEFAULT_IMAGE_DIR};
use catalog_grpc::{CatalogServer, ServerConfig};

/// Catalog gRPC Server - laptop store, search, image upload and rating
#[derive(Parser, Debug)]
#[command(name = "catalog-grpc")]
#[command(about = "gRPC server for the laptop catalog")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "CATALOG_ADDR", default_value = DEFAULT_ADDR)]
    addr: SocketAddr,

    /// Folder uploaded images are written to
    #[arg(long, env = "CATALOG_IMAGE_DIR", default_value = DEFAULT_IMAGE_DIR)]
    image_dir: PathBuf,

    /// Largest accepted image, in bytes
    #[arg(long, env = "CATALOG_MAX_IMAGE_SIZE", default_value_t = catalog::MAX_IMAGE_SIZE)]
    max_image_size: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            addr: args.addr,
            image_dir: args.image_dir,
            max_image_size: args.max_image_size,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = ServerConfig::from(Args::parse());
    CatalogServer::new(config).run().await
}
