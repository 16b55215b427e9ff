//! Error types for the login layer.

use runegate_protocol::{ContextError, ServiceError};
use runegate_storage::StorageError;

/// Infrastructure failures that abort a verify call.
///
/// A client being turned away is not an error: that is
/// [`Verdict::Rejected`](crate::Verdict::Rejected).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoginError {
    /// The store could not answer a lookup.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// The call was cancelled or ran past its deadline.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl From<LoginError> for ServiceError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::Storage(e) => Self::Unavailable(e.to_string()),
            LoginError::Context(e) => e.into(),
        }
    }
}

/// Why a username or password does not meet the account format rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("must not be empty")]
    Empty,

    #[error("must be at most {max} characters")]
    TooLong { max: usize },

    #[error("must start with a letter")]
    MustStartWithLetter,

    #[error("character {0:?} is not allowed")]
    InvalidCharacter(char),
}
