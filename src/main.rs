//! Elidune Circulation - command shell
//!
//! Reads circulation commands from stdin, one per line, and prints one JSON
//! result per line on stdout. Logs go to stderr.

use std::io;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use elidune_circulation::{
    commands::run_shell, config::AppConfig, LendingService, NotificationSink,
};

/// Sink that hands notifications to the tracing log
struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn send(&self, message: &str, recipient: &str) {
        tracing::info!(target: "notification", recipient, "{}", message);
    }
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("elidune_circulation={},notification=info", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }

    tracing::info!("Starting Elidune Circulation v{}", env!("CARGO_PKG_VERSION"));

    let mut service =
        LendingService::new(Box::new(LogNotifier)).with_currency(config.currency.symbol.clone());

    run_shell(
        &mut service,
        io::stdin().lock(),
        io::stdout().lock(),
        config.shell.echo_commands,
        Utc::now,
    )?;

    tracing::info!("Input closed, {} loan(s) still open", service.count_active());

    Ok(())
}
