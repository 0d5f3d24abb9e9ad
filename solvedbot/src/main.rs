use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use discord_gateway::{Gateway, RestClient};
use solvedac::SolvedAcClient;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use solvedbot::commands::CommandRouter;
use solvedbot::config::AppConfig;
use solvedbot::logging;
use solvedbot::session::SessionHost;
use solvedbot::store::FileSnapshotStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::parse();
    config.validate()?;

    let _log_guard = logging::init_logging(config.log_dir.as_deref())?;
    info!(?config, "Starting solvedbot v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancellationToken::new();

    if let Some(log_dir) = &config.log_dir {
        logging::start_retention_cleanup(
            log_dir.clone(),
            config.log_retention_days,
            cancel.child_token(),
        );
    }

    let stats = SolvedAcClient::new(config.solved_ac_config())
        .context("Failed to create solved.ac client")?;
    let store = FileSnapshotStore::open(&config.data_dir)
        .await
        .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;
    let router = CommandRouter::new(Arc::new(stats), Arc::new(store));

    let rest = RestClient::with_api_base(config.token.clone(), config.discord_api_base.clone())
        .context("Failed to create Discord REST client")?;

    let connection = Gateway::connect(config.gateway_config());
    let host = SessionHost::new(Arc::new(router), Arc::new(rest));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                shutdown.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    host.run(connection, cancel.clone()).await?;
    cancel.cancel();

    info!("solvedbot stopped");
    Ok(())
}
