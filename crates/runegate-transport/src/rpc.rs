//! Remote RPC backend: [`Envelope`] frames, JSON-encoded, over WebSocket.
//!
//! A call is one `LoginVerify` frame; the answer is one `LoginVerifyReply`
//! or `Failure` frame carrying the same `call_id`. The caller's remaining
//! deadline travels as `timeout_ms`, and a call is cancelled server-side
//! when its connection drops or the listener shuts down.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use runegate_protocol::{
    CallContext, Codec, Envelope, JsonCodec, LoginService, LoginVerifyRequest,
    LoginVerifyResponse, Payload, ProtocolError,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    Connection, Dialer, Listener, Transport, TransportError, WebSocketClient,
    WebSocketConnection, WebSocketTransport,
};

/// Replaceable slot holding the service an [`RpcListener`] dispatches to.
struct Registry<S> {
    slot: Arc<RwLock<Option<Arc<S>>>>,
}

impl<S> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<S: LoginService> Registry<S> {
    fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }

    fn register(&self, service: Arc<S>) {
        let previous = self.slot.write().replace(service);
        if previous.is_some() {
            tracing::warn!("login service re-registered; previous service replaced");
        }
    }

    fn current(&self) -> Option<Arc<S>> {
        self.slot.read().clone()
    }

    async fn dispatch(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        let service = self.current().ok_or(TransportError::NotRegistered)?;
        Ok(service.login_verify(ctx, request).await?)
    }
}

// ---------------------------------------------------------------------------
// Server side
// ---------------------------------------------------------------------------

/// Listener half of the RPC backend: a bound WebSocket server plus its
/// service registry.
///
/// Registration is last-wins. Call [`serve`](Self::serve) to start
/// answering calls and cancel [`shutdown_token`](Self::shutdown_token)
/// to stop.
pub struct RpcListener<S> {
    transport: Mutex<WebSocketTransport>,
    local_addr: SocketAddr,
    registry: Registry<S>,
    shutdown: CancellationToken,
}

impl<S: LoginService> RpcListener<S> {
    /// Binds the listener. Nothing is accepted until [`serve`](Self::serve).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let transport = WebSocketTransport::bind(addr).await?;
        let local_addr = transport.local_addr().map_err(TransportError::AcceptFailed)?;
        Ok(Self {
            transport: Mutex::new(transport),
            local_addr,
            registry: Registry::new(),
            shutdown: CancellationToken::new(),
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Token that stops [`serve`](Self::serve) and cancels in-flight calls.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Accepts connections until shut down. Each connection gets its own
    /// task and each call on it runs as its own task.
    pub async fn serve(&self) -> Result<(), TransportError> {
        let mut transport = self.transport.lock().await;
        tracing::info!(addr = %self.local_addr, "login RPC listener serving");

        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = transport.accept() => accepted,
            };

            match accepted {
                Ok(conn) => {
                    let registry = self.registry.clone();
                    let token = self.shutdown.child_token();
                    tokio::spawn(serve_connection(conn, registry, token));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }

        transport.shutdown().await?;
        tracing::info!(addr = %self.local_addr, "login RPC listener stopped");
        Ok(())
    }
}

impl<S: LoginService> Listener for RpcListener<S> {
    type Service = S;

    fn login_register(&self, service: Arc<S>) -> Result<(), TransportError> {
        self.registry.register(service);
        Ok(())
    }

    async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        self.registry.dispatch(ctx, request).await
    }
}

async fn serve_connection<S: LoginService>(
    conn: WebSocketConnection,
    registry: Registry<S>,
    token: CancellationToken,
) {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    // In-flight calls on this connection are cancelled when it ends.
    let _cancel_on_exit = token.clone().drop_guard();

    loop {
        let frame = tokio::select! {
            _ = token.cancelled() => break,
            frame = conn.recv() => frame,
        };

        let data = match frame {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let conn = Arc::clone(&conn);
        let registry = registry.clone();
        let call_token = token.child_token();
        tokio::spawn(async move {
            if let Err(e) = answer(&conn, &registry, call_token, &data).await {
                tracing::debug!(%conn_id, error = %e, "failed to answer call");
            }
        });
    }
}

async fn answer<S: LoginService>(
    conn: &WebSocketConnection,
    registry: &Registry<S>,
    token: CancellationToken,
    data: &[u8],
) -> Result<(), TransportError> {
    let codec = JsonCodec;
    let envelope: Envelope = match codec.decode(data) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(error = %e, "failed to decode envelope");
            let failure = Payload::Failure {
                code: 400,
                message: e.to_string(),
            };
            return reply(conn, 0, failure).await;
        }
    };

    let payload = match envelope.payload {
        Payload::LoginVerify { request } => {
            let mut ctx = CallContext::new().with_token(token);
            if let Some(ms) = envelope.timeout_ms {
                ctx = ctx.deadline_at(
                    tokio::time::Instant::now() + Duration::from_millis(ms),
                );
            }
            match registry.dispatch(&ctx, request).await {
                Ok(response) => Payload::LoginVerifyReply { response },
                Err(e) => Payload::Failure {
                    code: e.code(),
                    message: e.to_string(),
                },
            }
        }
        _ => Payload::Failure {
            code: 400,
            message: "expected a LoginVerify call".to_string(),
        },
    };

    reply(conn, envelope.call_id, payload).await
}

async fn reply(
    conn: &WebSocketConnection,
    call_id: u64,
    payload: Payload,
) -> Result<(), TransportError> {
    let envelope = Envelope {
        call_id,
        timeout_ms: None,
        payload,
    };
    let bytes = JsonCodec.encode(&envelope)?;
    conn.send(&bytes).await
}

// ---------------------------------------------------------------------------
// Client side
// ---------------------------------------------------------------------------

/// Typed client stub for a remote login service.
///
/// Calls on one client are serialized. A reply that arrives after its
/// caller gave up is skipped by the next call.
pub struct LoginServiceClient {
    conn: WebSocketClient,
    next_call_id: AtomicU64,
    call_lock: Mutex<()>,
}

impl LoginServiceClient {
    /// Connects to `endpoint`, given either as a `ws://` URL or as a bare
    /// `host:port`.
    pub async fn connect(endpoint: &str) -> Result<Self, TransportError> {
        let url = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("ws://{endpoint}")
        };
        let conn = WebSocketClient::connect(&url).await?;
        Ok(Self {
            conn,
            next_call_id: AtomicU64::new(1),
            call_lock: Mutex::new(()),
        })
    }

    /// Calls `LoginVerify` on the remote service.
    ///
    /// Waiting (for the call lock or the reply) is abandoned as soon as
    /// `ctx` is cancelled or its deadline passes.
    pub async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        ctx.run(self.call(ctx, request)).await?
    }

    async fn call(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        let _call = self.call_lock.lock().await;
        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);

        let envelope = Envelope {
            call_id,
            timeout_ms: ctx.remaining().map(timeout_millis),
            payload: Payload::LoginVerify { request },
        };
        let bytes = JsonCodec.encode(&envelope)?;
        self.conn.send(&bytes).await?;

        loop {
            let data = self.conn.recv().await?.ok_or_else(|| {
                TransportError::ConnectionClosed("server closed the connection".into())
            })?;
            let reply: Envelope = JsonCodec.decode(&data)?;
            if reply.call_id != call_id {
                tracing::debug!(
                    expected = call_id,
                    got = reply.call_id,
                    "skipping stale reply"
                );
                continue;
            }
            return match reply.payload {
                Payload::LoginVerifyReply { response } => Ok(response),
                Payload::Failure { code, message } => {
                    Err(TransportError::Remote { code, message })
                }
                Payload::LoginVerify { .. } => Err(TransportError::Protocol(
                    ProtocolError::InvalidMessage(
                        "server sent a call instead of a reply".into(),
                    ),
                )),
            };
        }
    }
}

/// Rounds up so the server never gives up before the caller does.
fn timeout_millis(remaining: Duration) -> u64 {
    u64::try_from(remaining.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

/// Dialer half of the RPC backend.
///
/// Holds an endpoint and connects on first call. Registration is
/// last-wins: a client registered with
/// [`login_register`](Dialer::login_register) replaces the current one.
/// A client whose connection is lost is dropped, and the next call dials
/// the endpoint again.
pub struct RpcDialer {
    endpoint: String,
    client: parking_lot::Mutex<Option<Arc<LoginServiceClient>>>,
}

impl RpcDialer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: parking_lot::Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn client(&self) -> Result<Arc<LoginServiceClient>, TransportError> {
        let cached = self.client.lock().clone();
        if let Some(client) = cached {
            return Ok(client);
        }

        let fresh = Arc::new(LoginServiceClient::connect(&self.endpoint).await?);
        tracing::debug!(endpoint = %self.endpoint, "login client connected");
        // A concurrent caller may have connected first; keep theirs.
        let mut slot = self.client.lock();
        Ok(Arc::clone(slot.get_or_insert(fresh)))
    }

    /// Drops `stale` unless it has already been replaced.
    fn forget(&self, stale: &Arc<LoginServiceClient>) {
        let mut slot = self.client.lock();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, stale)) {
            *slot = None;
            tracing::debug!(endpoint = %self.endpoint, "login client dropped after connection loss");
        }
    }
}

impl Dialer for RpcDialer {
    type Remote = LoginServiceClient;

    fn login_register(
        &self,
        remote: LoginServiceClient,
    ) -> Result<(), TransportError> {
        let previous = self.client.lock().replace(Arc::new(remote));
        if previous.is_some() {
            tracing::warn!(endpoint = %self.endpoint, "login client re-registered; previous client replaced");
        }
        Ok(())
    }

    async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        let client = ctx.run(self.client()).await??;
        let result = client.login_verify(ctx, request).await;
        if let Err(e) = &result {
            if e.is_connection_lost() {
                self.forget(&client);
            }
        }
        result
    }
}
