use runegate_protocol::{ContextError, ProtocolError, ServiceError};

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Opening an outbound connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,

    /// `login_register` was called on a listener or dialer that is
    /// already bound.
    #[error("login service already registered")]
    AlreadyRegistered,

    /// `login_verify` was called before anything was registered.
    #[error("login service not registered")]
    NotRegistered,

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The registered service failed the call.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The call was cancelled or ran past its deadline.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The remote side answered with a failure frame.
    #[error("remote failure {code}: {message}")]
    Remote { code: u16, message: String },
}

impl TransportError {
    /// True when the underlying connection is gone and a new one is needed.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed(_) | Self::SendFailed(_) | Self::ReceiveFailed(_)
        )
    }

    /// HTTP-style status code used when this error is sent back as a
    /// failure frame.
    pub fn code(&self) -> u16 {
        match self {
            Self::Service(e) => e.code(),
            Self::Context(ContextError::Cancelled) => 499,
            Self::Context(ContextError::DeadlineExceeded) => 504,
            Self::NotRegistered => 501,
            Self::Protocol(_) => 400,
            Self::Remote { code, .. } => *code,
            Self::AlreadyRegistered => 500,
            Self::ConnectionClosed(_)
            | Self::SendFailed(_)
            | Self::ReceiveFailed(_)
            | Self::AcceptFailed(_)
            | Self::ConnectFailed(_)
            | Self::Shutdown => 503,
        }
    }
}
