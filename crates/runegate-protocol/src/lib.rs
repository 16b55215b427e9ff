//! Wire protocol for Runegate.
//!
//! This crate defines what travels between a login client and the login
//! gateway, and the contract every authentication service implements:
//!
//! - **Types** ([`LoginVerifyRequest`], [`LoginVerifyResponse`],
//!   [`ShardSummary`], [`Envelope`]): the messages on the wire.
//! - **Service** ([`LoginService`]): the trait a login implementation
//!   provides and a transport dispatches to.
//! - **Context** ([`CallContext`]): cancellation and deadline carried by
//!   every call.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, messages out.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → LoginService (decision)
//! ```
//!
//! The protocol layer knows nothing about sockets or storage.

#![allow(async_fn_in_trait)]

mod codec;
mod context;
mod error;
mod service;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use context::{CallContext, ContextError};
pub use error::ProtocolError;
pub use service::{LoginService, ServiceError};
pub use types::{
    Envelope, LoginVerifyRequest, LoginVerifyResponse, Payload, ShardSummary,
};
