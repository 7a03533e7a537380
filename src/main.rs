use clap::Parser;
use rust_decimal::Decimal;
use std::sync::Arc;

use maestro::agents::{PaperStrategyAgent, PaperStrategyConfig};
use maestro::cli::Cli;
use maestro::config::AppConfig;
use maestro::coordination::{install_signal_handlers, ShutdownController};
use maestro::error::Result;
use maestro::persistence::StateStore;
use maestro::supervisor::MasterAgent;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The configured logging level is needed before the subscriber exists,
    // so peek at the config once, then do the logged load below.
    let level = cli.log_level.clone().unwrap_or_else(|| {
        AppConfig::load(cli.config.as_deref())
            .map(|c| c.logging_level)
            .unwrap_or_else(|_| "info".to_string())
    });
    maestro::logging::init_logging(&level);

    let config = AppConfig::load_or_default(cli.config.as_deref());
    let store = StateStore::connect(&cli.credentials).await;

    let shutdown = Arc::new(ShutdownController::new());
    install_signal_handlers(shutdown.clone());

    let mut master = MasterAgent::new(config.clone(), store, shutdown);

    // One paper strategy per enabled market until real strategies are
    // deployed through the registry.
    for market in &config.markets {
        let agent = PaperStrategyAgent::new(PaperStrategyConfig {
            market: *market,
            risk_tolerance: config.risk_tolerance,
            bankroll: Decimal::from(10_000),
        });
        master
            .register_sub_agent(&format!("paper-{market}"), Arc::new(agent))
            .await;
    }

    master.run().await
}
