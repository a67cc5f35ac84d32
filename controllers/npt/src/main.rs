//! nptd
//!
//! Keeps the kernel's IPv6 NETMAP rules in sync with declarative
//! NetworkMap configuration: a YAML config folder seeds an in-memory
//! store, and a controller reconciles every map against ip6tables,
//! writing observed state back onto the record.

mod controller;
mod error;
mod netif;
mod reconciler;


use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use ip6tables::Ip6TablesClient;
use machinery::runtime::Registry;
use machinery::state::MetaRepository;

use crate::controller::NptController;

/// How often every NetworkMap is re-reconciled without an event.
const RESYNC_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "nptd", about = "IPv6 network prefix translation daemon")]
struct Args {
    /// Directory holding the YAML configuration documents.
    #[arg(long = "config-folder")]
    config_folder: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    info!("starting nptd");

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
        }
        let _ = stop_tx.send(true);
    });

    let mut registry = Registry::new();
    api::add_to_registry(&mut registry);

    let repository = Arc::new(MetaRepository::new(Arc::new(registry))?);
    repository.load_from_directory(&args.config_folder, &stop_rx)?;

    let controller = NptController::new(
        repository.clone(),
        Arc::new(Ip6TablesClient::new()),
        RESYNC_INTERVAL,
    );

    controller.run(stop_rx).await?;
    repository.shutdown();
    Ok(())
}
