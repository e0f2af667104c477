//! cask server entry point

use clap::{Arg, Command};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

use cask_engine::Store;

mod handlers;
mod server;

use server::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = Command::new("cask-server")
        .version("0.1.0")
        .about("Minimal bucket/object storage service")
        .arg(
            Arg::new("storage-root")
                .long("storage-root")
                .value_name("PATH")
                .help("Storage root directory")
                .default_value("./data"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_name("ADDR")
                .help("Bind address")
                .default_value("127.0.0.1:8080"),
        )
        .arg(
            Arg::new("api-token")
                .long("api-token")
                .value_name("TOKEN")
                .help("Require 'Authorization: token <TOKEN>' on every request"),
        )
        .get_matches();

    let storage_root: PathBuf = matches
        .get_one::<String>("storage-root")
        .unwrap()
        .parse()
        .expect("Invalid storage root path");

    let bind_addr: SocketAddr = matches
        .get_one::<String>("bind")
        .unwrap()
        .parse()
        .expect("Invalid bind address");

    let api_token = matches
        .get_one::<String>("api-token")
        .cloned()
        .or_else(|| std::env::var("CASK_API_TOKEN").ok());

    info!("Starting cask server");
    info!("Storage root: {}", storage_root.display());
    info!("Bind address: {}", bind_addr);
    if api_token.is_some() {
        info!("API token authentication enabled");
    }

    let store = Store::open(&storage_root)
        .map_err(|e| format!("Failed to open store: {}", e))?;

    info!("Store opened");

    let server = Server::new(store, api_token);

    match server.serve(bind_addr).await {
        Ok(_) => info!("Server shutdown gracefully"),
        Err(e) => {
            warn!("Server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
