//! The login service contract.
//!
//! Runegate does not hard-wire who decides whether a client gets in.
//! Transports dispatch inbound calls to anything implementing
//! [`LoginService`]: the decision engine in production, a canned
//! responder in tests.

use std::future::Future;
use std::sync::Arc;

use crate::{CallContext, ContextError, LoginVerifyRequest, LoginVerifyResponse};

/// Infrastructure failure of a login call.
///
/// Bad credentials and policy denials are NOT errors: they come back as a
/// [`LoginVerifyResponse`] with a non-empty `error`. This type only covers
/// the cases where no decision could be made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The caller cancelled the call.
    #[error("call cancelled")]
    Cancelled,

    /// The call's deadline passed before a decision was made.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A dependency (usually storage) could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Anything else that prevented a decision.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP-style status code used on the wire.
    pub fn code(&self) -> u16 {
        match self {
            Self::Cancelled => 499,
            Self::DeadlineExceeded => 504,
            Self::Unavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }
}

impl From<ContextError> for ServiceError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => Self::Cancelled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Decides whether a client may log in.
///
/// `Send + Sync + 'static` because one service instance is shared by
/// every connection task of a listener.
pub trait LoginService: Send + Sync + 'static {
    /// Verifies the request's credentials.
    ///
    /// # Returns
    /// - `Ok(response)` with empty `error`: admitted, shards attached
    /// - `Ok(response)` with non-empty `error`: rejected
    /// - `Err(ServiceError)`: no decision could be made
    fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> impl Future<Output = Result<LoginVerifyResponse, ServiceError>> + Send;
}

impl<S: LoginService> LoginService for Arc<S> {
    fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> impl Future<Output = Result<LoginVerifyResponse, ServiceError>> + Send
    {
        S::login_verify(&**self, ctx, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_codes() {
        assert_eq!(ServiceError::Cancelled.code(), 499);
        assert_eq!(ServiceError::DeadlineExceeded.code(), 504);
        assert_eq!(ServiceError::Unavailable("db".into()).code(), 503);
        assert_eq!(ServiceError::Internal("bug".into()).code(), 500);
    }

    #[test]
    fn test_from_context_error() {
        let err: ServiceError = ContextError::DeadlineExceeded.into();
        assert_eq!(err, ServiceError::DeadlineExceeded);
    }
}
