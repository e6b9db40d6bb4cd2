mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use innkeep_core::{
    config::{self, AppConfig},
    desk::{default_inventory, FrontDesk},
    ledger::LedgerStore,
    payment::PaymentClerk,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let store = LedgerStore::new(config.ledger_path());
    let (desk, restore) = FrontDesk::open(default_inventory(), store);
    let clerk = PaymentClerk::new(config.payment_delay());

    let mut app = app::InnkeepApp::new(desk, clerk, restore);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("innkeep.log");

    let env_filter = EnvFilter::from_default_env();

    // The TUI owns the terminal, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
