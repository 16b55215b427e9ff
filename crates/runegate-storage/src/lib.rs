//! User and shard storage for Runegate.
//!
//! The login engine never touches a database directly. It talks to the
//! [`Storage`] trait, and any backend implementing it can sit underneath:
//!
//! - [`MemoryStorage`]: hash maps behind one lock; the reference
//!   implementation, used in tests and single-process deployments.
//!
//! # Contract
//!
//! - "Not found" is `Ok(None)`, never an error.
//! - `*_create` never overwrites: a clashing id or username is
//!   [`StorageError::Conflict`].
//! - [`Storage::user_transition_state`] is an atomic compare-and-set on a
//!   user's session state; it is what keeps two concurrent logins from both
//!   winning.
//! - Every method is safe to call from many tasks at once.

#![allow(async_fn_in_trait)]

mod backend;
mod error;
mod memory;
mod types;

pub use backend::Storage;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use types::{NewUser, Shard, ShardId, User, UserId, UserState};
