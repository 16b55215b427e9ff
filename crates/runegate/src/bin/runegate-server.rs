//! `runegate-server`: loads `login` config and serves the login RPC.

use runegate::prelude::*;
use runegate::{CONFIG_DIR_ENV_VAR, DEFAULT_CONFIG_DIR};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), RunegateError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let dir = std::env::var(CONFIG_DIR_ENV_VAR)
        .unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let strictness = Strictness::from_env();
    let config = Config::multi_load(&dir, "login")?.with_strictness(strictness);
    tracing::info!(%dir, ?strictness, "configuration loaded");

    let server = LoginServer::<MemoryStorage>::builder(config)
        .build(MemoryStorage::new())
        .await?;

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        tracing::info!("shutdown requested");
        shutdown.cancel();
    });

    server.run().await
}
