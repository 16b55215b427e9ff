//! Registration facade.
//!
//! [`ListenService`] and [`DialService`] are the only types call sites
//! need to bind or invoke the login service. They are generic over the
//! backend, so swapping RPC for loopback is a type change, not a code
//! change.
//!
//! ```rust
//! use std::sync::Arc;
//! use runegate_protocol::{CallContext, LoginService, LoginVerifyRequest,
//!     LoginVerifyResponse, ServiceError};
//! use runegate_transport::{DialService, ListenService, loopback};
//!
//! struct AcceptAll;
//!
//! impl LoginService for AcceptAll {
//!     async fn login_verify(
//!         &self,
//!         _ctx: &CallContext,
//!         _request: LoginVerifyRequest,
//!     ) -> Result<LoginVerifyResponse, ServiceError> {
//!         Ok(LoginVerifyResponse::accepted(Vec::new()))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), runegate_transport::TransportError> {
//! let (listener, dialer) = loopback::pair();
//! ListenService::new(listener).login_register(Arc::new(AcceptAll))?;
//!
//! let dial = DialService::new(dialer);
//! let request = LoginVerifyRequest::new("testuser", "testpassword", "");
//! let response = dial.login_verify(&CallContext::new(), request).await?;
//! assert!(response.is_accepted());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use runegate_protocol::{CallContext, LoginVerifyRequest, LoginVerifyResponse};

use crate::{Dialer, Listener, TransportError};

/// Listen side: binds a service implementation to a [`Listener`].
pub struct ListenService<L: Listener> {
    listener: L,
}

impl<L: Listener> ListenService<L> {
    pub fn new(listener: L) -> Self {
        Self { listener }
    }

    /// Registers `service` with the wrapped listener.
    pub fn login_register(
        &self,
        service: Arc<L::Service>,
    ) -> Result<(), TransportError> {
        self.listener.login_register(service)
    }

    /// Dispatches a call through the listener, as the transport runtime
    /// would for an inbound request.
    pub async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        self.listener.login_verify(ctx, request).await
    }

    /// The wrapped listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_inner(self) -> L {
        self.listener
    }
}

/// Dial side: invokes the login service through a [`Dialer`].
pub struct DialService<D: Dialer> {
    dialer: D,
}

impl<D: Dialer> DialService<D> {
    pub fn new(dialer: D) -> Self {
        Self { dialer }
    }

    /// Binds the remote handle on the wrapped dialer.
    pub fn login_register(&self, remote: D::Remote) -> Result<(), TransportError> {
        self.dialer.login_register(remote)
    }

    /// Forwards a verify call to the remote service.
    pub async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, TransportError> {
        self.dialer.login_verify(ctx, request).await
    }

    /// The wrapped dialer.
    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    pub fn into_inner(self) -> D {
        self.dialer
    }
}

/// Registers `service` on `listener`.
pub fn register_login_service<L: Listener>(
    listener: &L,
    service: Arc<L::Service>,
) -> Result<(), TransportError> {
    listener.login_register(service)
}
