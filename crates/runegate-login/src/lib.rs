//! Login verification for Runegate.
//!
//! This crate decides whether a client may log in:
//!
//! 1. **Settings**: the `[login]` config category, validated once at
//!    start-up ([`LoginSettings`]), and the admission gates derived from
//!    it ([`LoginPolicy`])
//! 2. **Decision**: [`LoginEngine::verify`] checks credentials, provisions
//!    unknown users when allowed, and moves the user Offline → Online
//! 3. **Service**: [`LoginEngine`] implements
//!    [`LoginService`](runegate_protocol::LoginService), so any transport
//!    backend can drive it
//!
//! # How it fits in the stack
//!
//! ```text
//! Transport (above)  ← Listener dispatches LoginVerify calls here
//!     ↕
//! Login (this crate)  ← policy, provisioning, single-session rule
//!     ↕
//! Storage (below)  ← users and shards
//! ```
//!
//! A user can be Online at most once: the final Offline → Online step is
//! a compare-and-set in the store, so of many concurrent logins for one
//! account exactly one wins.

mod engine;
mod error;
mod settings;
pub mod validate;

pub use engine::{LoginEngine, Rejection, Verdict};
pub use error::{FormatError, LoginError};
pub use settings::{DatabaseSettings, LOGIN_CATEGORY, LoginPolicy, LoginSettings};
