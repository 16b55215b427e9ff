//! # Runegate
//!
//! Login gateway for multiplayer game backends.
//!
//! Clients send a username, a password and the name of their client
//! application. Runegate decides whether to admit them, creates the
//! account on first login when policy allows, makes sure an account is
//! online at most once, and answers with the game shards available to
//! that application.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runegate::prelude::*;
//!
//! # async fn start() -> Result<(), RunegateError> {
//! let config = Config::multi_load("config", "login")?
//!     .with_strictness(Strictness::from_env());
//! let server = LoginServer::<MemoryStorage>::builder(config)
//!     .build(MemoryStorage::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod server;

pub use error::RunegateError;
pub use server::{LoginServer, LoginServerBuilder};

pub use runegate_config as config;
pub use runegate_login as login;
pub use runegate_protocol as protocol;
pub use runegate_storage as storage;
pub use runegate_transport as transport;

/// Environment variable naming the config directory for the
/// `runegate-server` binary.
pub const CONFIG_DIR_ENV_VAR: &str = "RUNEGATE_CONFIG_DIR";

/// Config directory used when [`CONFIG_DIR_ENV_VAR`] is unset.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Everything needed to run a login server or call one.
pub mod prelude {
    pub use crate::{LoginServer, LoginServerBuilder, RunegateError};
    pub use runegate_config::{Config, Strictness};
    pub use runegate_login::{LoginEngine, LoginPolicy, LoginSettings, Verdict};
    pub use runegate_protocol::{
        CallContext, LoginService, LoginVerifyRequest, LoginVerifyResponse,
        ShardSummary,
    };
    pub use runegate_storage::{MemoryStorage, Shard, ShardId, Storage};
    pub use runegate_transport::{
        DialService, Dialer, ListenService, Listener, LoginServiceClient,
        RpcDialer, RpcListener,
    };
}
