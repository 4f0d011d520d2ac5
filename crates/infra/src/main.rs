//! `magesync` command line.
//!
//! ```text
//! magesync [--config <file.json>] check
//! magesync [--config <file.json>] push-stock <stock.json>
//! ```
//!
//! Without `--config` the configuration is read from `MAGESYNC_*` variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use magesync_catalog::{
    InMemoryListingRepository, InventoryExporter, Listing, ListingRepository, NoDefaultChannel,
};
use magesync_channels::{Channel, ChannelRepository, InMemoryChannelRepository};
use magesync_core::{ProductId, UomId};
use magesync_infra::{ConnectorConfig, HttpConnector};
use magesync_magento::{ApiConnector, MagentoApi, ProductType};

#[derive(Debug, Parser)]
#[command(name = "magesync")]
#[command(version, about = "Magento catalog and inventory connector")]
struct Cli {
    /// JSON configuration file; `MAGESYNC_*` variables are used without it
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Test the connection and list websites with their stores
    Check,
    /// Push stock levels from a JSON file of listings
    PushStock {
        /// Array of `{"product_identifier", "quantity", "type"}` objects
        file: PathBuf,
    },
}

/// One line of a `push-stock` input file.
#[derive(Debug, Deserialize)]
struct StockLine {
    product_identifier: String,
    quantity: f64,
    #[serde(default, rename = "type")]
    product_type: Option<ProductType>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => ConnectorConfig::from_file(&path)?,
        None => ConnectorConfig::from_env()?,
    };
    magesync_observability::init_with(&config.log);

    let connector = HttpConnector::new(config.timeout)?;
    let channel = Channel::magento("magesync", config.credentials(), UomId::new());

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => check(&connector, &channel),
        Command::PushStock { file } => push_stock(&connector, &channel, &config, &file),
    }
}

fn check<C: ApiConnector>(connector: &C, channel: &Channel) -> Result<()> {
    channel.test_magento_connection(connector)?;
    let session = channel.connect(connector)?;
    for website in session.websites()? {
        let stores = session.stores(website.website_id)?;
        tracing::info!(
            website = website.website_id,
            code = %website.code,
            name = %website.name,
            stores = stores.len(),
            "website"
        );
    }
    Ok(())
}

fn push_stock<C: ApiConnector>(
    connector: &C,
    channel: &Channel,
    config: &ConnectorConfig,
    path: &Path,
) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let lines: Vec<StockLine> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    let channels = InMemoryChannelRepository::new();
    channels.save(channel.clone());
    let listings = InMemoryListingRepository::new();
    let mut batch = Vec::with_capacity(lines.len());
    for line in lines {
        let listing = Listing::new(
            channel.id,
            ProductId::new(),
            line.product_identifier,
            line.product_type,
        )
        .with_quantity(line.quantity);
        listings.insert(listing.clone())?;
        batch.push(listing);
    }

    let summary = InventoryExporter::new(connector, &channels, &listings, &NoDefaultChannel)
        .with_batch_size(config.batch_size)
        .export_bulk_inventory(&batch)?;

    for id in &summary.disabled {
        if let Some(listing) = listings.get(channel.id, *id) {
            tracing::warn!(identifier = %listing.product_identifier, "product unknown to magento");
        }
    }
    tracing::info!(
        batches = summary.batches,
        pushed = summary.pushed,
        disabled = summary.disabled.len(),
        "stock pushed"
    );
    Ok(())
}
