//! Transport abstraction layer for Runegate.
//!
//! Two capability sets let the same login service be driven over
//! different backends without knowing which one is in use:
//!
//! - [`Listener`]: binds one [`LoginService`] and dispatches inbound
//!   `login_verify` calls to it.
//! - [`Dialer`]: binds a handle to a remote service and forwards
//!   `login_verify` calls to it.
//!
//! Backends:
//!
//! | Backend  | Listener            | Dialer            |
//! |----------|---------------------|-------------------|
//! | RPC      | [`RpcListener`]     | [`RpcDialer`]     |
//! | Loopback | [`LoopbackListener`]| [`LoopbackDialer`]|
//! | Datagram | [`DatagramListener`]| [`DatagramDialer`]|
//!
//! The byte-level [`Transport`] and [`Connection`] traits underneath the
//! RPC backend are implemented by [`WebSocketTransport`].
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport and the RPC backend via
//!   `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod datagram;
mod error;
pub mod facade;
pub mod loopback;
#[cfg(feature = "websocket")]
mod rpc;
#[cfg(feature = "websocket")]
mod websocket;

pub use datagram::{DatagramDialer, DatagramListener};
pub use error::TransportError;
pub use facade::{DialService, ListenService, register_login_service};
pub use loopback::{LoopbackDialer, LoopbackListener};
#[cfg(feature = "websocket")]
pub use rpc::{LoginServiceClient, RpcDialer, RpcListener};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketClient, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use runegate_protocol::{
    CallContext, LoginService, LoginVerifyRequest, LoginVerifyResponse,
};

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection that can send and receive bytes.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// Server side of a login backend.
///
/// A listener holds at most one service implementation at a time and
/// forwards every inbound verify call to it.
pub trait Listener: Send + Sync + 'static {
    /// The service implementation this listener dispatches to.
    type Service: LoginService;

    /// Binds `service` as the handler for inbound calls.
    ///
    /// What happens on a second registration is backend-specific: the
    /// loopback backend refuses it, the RPC backend replaces the
    /// previous service.
    fn login_register(
        &self,
        service: Arc<Self::Service>,
    ) -> Result<(), TransportError>;

    /// Dispatches one verify call to the registered service.
    fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> impl Future<Output = Result<LoginVerifyResponse, TransportError>> + Send;
}

impl<L: Listener> Listener for Arc<L> {
    type Service = L::Service;

    fn login_register(
        &self,
        service: Arc<Self::Service>,
    ) -> Result<(), TransportError> {
        L::login_register(self, service)
    }

    fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> impl Future<Output = Result<LoginVerifyResponse, TransportError>> + Send
    {
        L::login_verify(self, ctx, request)
    }
}

/// Client side of a login backend.
pub trait Dialer: Send + Sync + 'static {
    /// Handle to the remote service this dialer forwards to.
    type Remote;

    /// Binds the remote handle. Whether a second registration replaces
    /// the first or fails with [`TransportError::AlreadyRegistered`] is up
    /// to the backend.
    fn login_register(&self, remote: Self::Remote)
    -> Result<(), TransportError>;

    /// Forwards one verify call to the remote service.
    fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> impl Future<Output = Result<LoginVerifyResponse, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }
}
