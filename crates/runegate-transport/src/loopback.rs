//! In-process backend: a direct call into the registered service, no
//! serialization, no sockets.
//!
//! Registration is strict. A listener accepts exactly one service and a
//! dialer exactly one listener; a second `login_register` fails with
//! [`TransportError::AlreadyRegistered`], and a verify before
//! registration fails with [`TransportError::NotRegistered`].

use std::sync::{Arc, OnceLock};

use runegate_protocol::{
    CallContext, LoginService, LoginVerifyRequest, LoginVerifyResponse,
};

use crate::{Dialer, Listener, TransportError};

/// Listener half of the loopback backend.
///
/// Clones share the registration slot, so a clone handed to a
/// [`LoopbackDialer`] sees a service registered later on the original.
pub struct LoopbackListener<S> {
    service: Arc<OnceLock<Arc<S>>>,
}

impl<S> LoopbackListener<S> {
    /// Creates an empty listener.
    pub fn new() -> Self {
        Self {
            service: Arc::new(OnceLock::new()),
        }
    }

    /// Returns `true` once a service has been registered.
    pub fn is_registered(&self) -> bool {
        self.service.get().is_some()
    }
}

impl<S> Default for LoopbackListener<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for LoopbackListener<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: LoginService> Listener for LoopbackListener<S> {
    type Service = S;

    fn login_register(&self, service: Arc<S>) -> Result<(), TransportError> {
        self.service
            .set(service)
            .map_err(|_| TransportError::AlreadyRegistered)?;
        tracing::debug!("loopback listener registered");
        Ok(())
    }

    async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        let service = self.service.get().ok_or(TransportError::NotRegistered)?;
        Ok(service.login_verify(ctx, request).await?)
    }
}

/// Dialer half of the loopback backend; its remote is a
/// [`LoopbackListener`].
pub struct LoopbackDialer<S> {
    remote: OnceLock<LoopbackListener<S>>,
}

impl<S> LoopbackDialer<S> {
    /// Creates a dialer with no listener bound.
    pub fn new() -> Self {
        Self {
            remote: OnceLock::new(),
        }
    }
}

impl<S> Default for LoopbackDialer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LoginService> Dialer for LoopbackDialer<S> {
    type Remote = LoopbackListener<S>;

    fn login_register(
        &self,
        remote: LoopbackListener<S>,
    ) -> Result<(), TransportError> {
        self.remote
            .set(remote)
            .map_err(|_| TransportError::AlreadyRegistered)
    }

    async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        let remote = self.remote.get().ok_or(TransportError::NotRegistered)?;
        remote.login_verify(ctx, request).await
    }
}

/// A listener and a dialer already wired to it. Register a service on
/// the listener, then call through the dialer.
pub fn pair<S: LoginService>() -> (LoopbackListener<S>, LoopbackDialer<S>) {
    let listener = LoopbackListener::new();
    let dialer = LoopbackDialer {
        remote: OnceLock::from(listener.clone()),
    };
    (listener, dialer)
}
