//! `LoginServer` builder and server loop.
//!
//! This is the entry point for running a Runegate login gateway. It ties
//! together all the layers: config → login engine → RPC listener.

use std::net::SocketAddr;
use std::sync::Arc;

use runegate_config::Config;
use runegate_login::{LoginEngine, LoginSettings};
use runegate_storage::Storage;
use runegate_transport::{RpcListener, register_login_service};
use tokio_util::sync::CancellationToken;

use crate::RunegateError;

/// Builder for configuring and starting a login server.
///
/// # Example
///
/// ```rust,no_run
/// use runegate::prelude::*;
///
/// # async fn start() -> Result<(), RunegateError> {
/// let config = Config::multi_load("config", "login")?;
/// let server = LoginServer::<MemoryStorage>::builder(config)
///     .bind("127.0.0.1:0")
///     .build(MemoryStorage::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct LoginServerBuilder {
    bind_addr: Option<String>,
    config: Config,
}

impl LoginServerBuilder {
    /// Creates a builder over an already loaded config.
    pub fn new(config: Config) -> Self {
        Self {
            bind_addr: None,
            config,
        }
    }

    /// Sets the address to bind to. Defaults to `0.0.0.0:{client_port}`.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = Some(addr.to_string());
        self
    }

    /// Validates the config, builds the engine over `storage`, binds the
    /// RPC listener and registers the engine on it.
    ///
    /// # Errors
    /// - [`RunegateError::Config`] if a `[login]` key is missing or invalid
    /// - [`RunegateError::Transport`] if the address cannot be bound
    pub async fn build<S: Storage>(
        self,
        storage: S,
    ) -> Result<LoginServer<S>, RunegateError> {
        let settings = LoginSettings::from_config(&self.config)?;
        let engine = Arc::new(LoginEngine::new(storage, settings.policy()));

        let addr = self
            .bind_addr
            .unwrap_or_else(|| format!("0.0.0.0:{}", settings.client_port));
        let listener = RpcListener::bind(&addr).await?;
        register_login_service(&listener, Arc::clone(&engine))?;

        tracing::info!(
            addr = %listener.local_addr(),
            shard_id = settings.shard_id,
            "login server ready"
        );
        Ok(LoginServer {
            listener,
            engine,
            settings,
        })
    }
}

/// A bound login server.
///
/// Call [`run()`](Self::run) to start answering calls.
pub struct LoginServer<S: Storage> {
    listener: RpcListener<LoginEngine<S>>,
    engine: Arc<LoginEngine<S>>,
    settings: LoginSettings,
}

impl<S: Storage> LoginServer<S> {
    /// Creates a new builder.
    pub fn builder(config: Config) -> LoginServerBuilder {
        LoginServerBuilder::new(config)
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Cancelling this token stops [`run()`](Self::run) and cancels calls
    /// in flight.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.listener.shutdown_token()
    }

    /// The validated `[login]` settings.
    pub fn settings(&self) -> &LoginSettings {
        &self.settings
    }

    /// The engine answering calls.
    pub fn engine(&self) -> &Arc<LoginEngine<S>> {
        &self.engine
    }

    /// Runs the accept loop until the shutdown token is cancelled.
    pub async fn run(self) -> Result<(), RunegateError> {
        tracing::info!(addr = %self.local_addr(), "Runegate login server running");
        self.listener.serve().await?;
        tracing::info!("Runegate login server stopped");
        Ok(())
    }
}
