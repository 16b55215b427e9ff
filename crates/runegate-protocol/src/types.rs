//! Login wire types.
//!
//! These are the structures serialized onto the wire by the RPC backend
//! and passed by value through the loopback backend. Field names match
//! the login service contract: `username`, `password`, `application` in,
//! `error` and `shards` out.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A client's request to be admitted.
///
/// Missing fields decode as empty strings, the same as an explicit `""`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginVerifyRequest {
    /// Account name, at most 16 characters.
    pub username: String,
    /// Credential, at most 16 characters.
    pub password: String,
    /// The client product asking; selects which shards are returned.
    pub application: String,
}

impl LoginVerifyRequest {
    /// Builds a request from its three fields.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            application: application.into(),
        }
    }
}

// Requests end up in logs; the password never should.
impl fmt::Debug for LoginVerifyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginVerifyRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("application", &self.application)
            .finish()
    }
}

/// One shard offered to an admitted client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardSummary {
    /// Display name of the shard.
    pub name: String,
    /// Players currently on the shard.
    pub player_count: u32,
    /// Identifier the client uses to pick the shard.
    pub shard_id: u32,
}

/// The gateway's answer to a [`LoginVerifyRequest`].
///
/// An empty `error` means the client was admitted. A non-empty `error`
/// is a rejection the client must treat as "not authenticated"; it is
/// never a protocol failure. Infrastructure failures travel separately
/// (see [`Payload::Failure`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginVerifyResponse {
    /// Human-readable rejection, empty when accepted.
    pub error: String,
    /// Shards for the requested application, in storage order.
    pub shards: Vec<ShardSummary>,
}

impl LoginVerifyResponse {
    /// An accepted response carrying the given shards.
    pub fn accepted(shards: Vec<ShardSummary>) -> Self {
        Self {
            error: String::new(),
            shards,
        }
    }

    /// A rejected response with the given message and no shards.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            shards: Vec::new(),
        }
    }

    /// Returns `true` if the client was admitted.
    pub fn is_accepted(&self) -> bool {
        self.error.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RPC envelope
// ---------------------------------------------------------------------------

/// Frame used by the remote RPC backend.
///
/// `call_id` pairs a reply with its call. `timeout_ms` is the caller's
/// remaining deadline when the call was sent, so the server can stop
/// working on a call nobody is waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlates a reply to its call.
    pub call_id: u64,
    /// Remaining caller deadline in milliseconds, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// The message itself.
    pub payload: Payload,
}

/// The body of an [`Envelope`].
///
/// Internally tagged, so on the wire a call looks like
/// `{ "type": "LoginVerify", "request": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    /// Client → Server: verify these credentials.
    LoginVerify { request: LoginVerifyRequest },

    /// Server → Client: the decision (accepted or soft-rejected).
    LoginVerifyReply { response: LoginVerifyResponse },

    /// Server → Client: the call failed for infrastructure reasons.
    /// `code` follows HTTP conventions (500, 501, 503, 504, ...).
    Failure { code: u16, message: String },
}
