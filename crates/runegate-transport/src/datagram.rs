//! Datagram backend placeholder.
//!
//! Has the same shape as the other backends so call sites can be wired
//! against it, but nothing is sent or dispatched: every verify returns an
//! empty, accepted response.

use std::marker::PhantomData;
use std::sync::Arc;

use runegate_protocol::{
    CallContext, LoginService, LoginVerifyRequest, LoginVerifyResponse,
};

use crate::{Dialer, Listener, TransportError};

/// Listener half of the datagram placeholder.
pub struct DatagramListener<S> {
    _service: PhantomData<fn() -> S>,
}

impl<S> DatagramListener<S> {
    pub fn new() -> Self {
        Self {
            _service: PhantomData,
        }
    }
}

impl<S> Default for DatagramListener<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LoginService> Listener for DatagramListener<S> {
    type Service = S;

    fn login_register(&self, _service: Arc<S>) -> Result<(), TransportError> {
        tracing::warn!("datagram listener is a placeholder; service not bound");
        Ok(())
    }

    async fn login_verify(
        &self,
        _ctx: &CallContext,
        _request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        tracing::warn!("datagram listener is a placeholder; returning empty response");
        Ok(LoginVerifyResponse::default())
    }
}

/// Dialer half of the datagram placeholder. Its remote is a peer address.
#[derive(Debug, Default)]
pub struct DatagramDialer {
    _private: (),
}

impl DatagramDialer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dialer for DatagramDialer {
    type Remote = String;

    fn login_register(&self, remote: String) -> Result<(), TransportError> {
        tracing::warn!(%remote, "datagram dialer is a placeholder; remote ignored");
        Ok(())
    }

    async fn login_verify(
        &self,
        _ctx: &CallContext,
        _request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        tracing::warn!("datagram dialer is a placeholder; returning empty response");
        Ok(LoginVerifyResponse::default())
    }
}
