//! Unified error type for Runegate.

use runegate_config::ConfigError;
use runegate_login::LoginError;
use runegate_protocol::ProtocolError;
use runegate_storage::StorageError;
use runegate_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `runegate` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
#[derive(Debug, thiserror::Error)]
pub enum RunegateError {
    /// Binding, accepting, or a backend registration failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Loading or validating configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A verify call failed for infrastructure reasons.
    #[error(transparent)]
    Login(#[from] LoginError),

    /// The store failed outside a verify call.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
