//! The storage trait.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`shards`](Storage::shards) | Every shard |
//! | [`shard_by_id`](Storage::shard_by_id) | One shard by id |
//! | [`shard_by_ws_addr`](Storage::shard_by_ws_addr) | One shard by control-plane address |
//! | [`shard_create`](Storage::shard_create) | Insert a shard; never overwrites |
//! | [`shard_update`](Storage::shard_update) | Replace an existing shard |
//! | [`shards_by_client_application`](Storage::shards_by_client_application) | Shards serving one client product |
//! | [`users`](Storage::users) | Every user |
//! | [`user_by_login`](Storage::user_by_login) | One user by username |
//! | [`user_by_id`](Storage::user_by_id) | One user by id |
//! | [`users_by_state`](Storage::users_by_state) | Users in a session state |
//! | [`users_by_shard_id`](Storage::users_by_shard_id) | Users assigned to a shard |
//! | [`user_create`](Storage::user_create) | Insert a user and assign its id |
//! | [`user_update`](Storage::user_update) | Replace an existing user |
//! | [`user_transition_state`](Storage::user_transition_state) | Compare-and-set a user's state |

use std::future::Future;

use crate::{NewUser, Shard, ShardId, StorageResult, User, UserId, UserState};

/// Persistent home of users and shards.
///
/// Backends must be `Send + Sync`: one instance serves every concurrent
/// login call.
pub trait Storage: Send + Sync + 'static {
    // -- Shards --

    /// Returns every shard, ordered by id.
    fn shards(&self) -> impl Future<Output = StorageResult<Vec<Shard>>> + Send;

    /// Returns the shard with this id, if any.
    fn shard_by_id(
        &self,
        shard_id: ShardId,
    ) -> impl Future<Output = StorageResult<Option<Shard>>> + Send;

    /// Returns the shard listening on this control-plane address, if any.
    fn shard_by_ws_addr(
        &self,
        ws_addr: &str,
    ) -> impl Future<Output = StorageResult<Option<Shard>>> + Send;

    /// Inserts a shard.
    ///
    /// # Errors
    /// [`StorageError::Conflict`](crate::StorageError::Conflict) if the id
    /// is taken.
    fn shard_create(
        &self,
        shard: Shard,
    ) -> impl Future<Output = StorageResult<Shard>> + Send;

    /// Replaces an existing shard.
    ///
    /// # Errors
    /// [`StorageError::NotFound`](crate::StorageError::NotFound) if no
    /// shard has this id.
    fn shard_update(
        &self,
        shard: Shard,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Returns exactly the shards whose `client_app` equals `client_app`,
    /// ordered by id. An empty filter matches nothing.
    fn shards_by_client_application(
        &self,
        client_app: &str,
    ) -> impl Future<Output = StorageResult<Vec<Shard>>> + Send;

    // -- Users --

    /// Returns every user, ordered by id.
    fn users(&self) -> impl Future<Output = StorageResult<Vec<User>>> + Send;

    /// Returns the user with this username, if any.
    fn user_by_login(
        &self,
        username: &str,
    ) -> impl Future<Output = StorageResult<Option<User>>> + Send;

    /// Returns the user with this id, if any.
    fn user_by_id(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = StorageResult<Option<User>>> + Send;

    /// Returns users currently in `state`, ordered by id.
    fn users_by_state(
        &self,
        state: UserState,
    ) -> impl Future<Output = StorageResult<Vec<User>>> + Send;

    /// Returns users assigned to `shard_id`, ordered by id.
    fn users_by_shard_id(
        &self,
        shard_id: ShardId,
    ) -> impl Future<Output = StorageResult<Vec<User>>> + Send;

    /// Inserts a user, assigning a fresh unique id.
    ///
    /// # Errors
    /// [`StorageError::Conflict`](crate::StorageError::Conflict) if the
    /// username is taken.
    fn user_create(
        &self,
        user: NewUser,
    ) -> impl Future<Output = StorageResult<User>> + Send;

    /// Replaces an existing user.
    ///
    /// # Errors
    /// - [`StorageError::NotFound`](crate::StorageError::NotFound): no
    ///   user has this id
    /// - [`StorageError::Conflict`](crate::StorageError::Conflict): the
    ///   new username belongs to another user
    fn user_update(
        &self,
        user: User,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Atomically moves a user from `expected` to `next`.
    ///
    /// Returns `Ok(true)` if the user was in `expected` and is now in
    /// `next`, `Ok(false)` if the user was in some other state (nothing
    /// changed). Of any number of concurrent calls with the same
    /// `expected`, at most one returns `true`.
    ///
    /// # Errors
    /// [`StorageError::NotFound`](crate::StorageError::NotFound) if no
    /// user has this id.
    fn user_transition_state(
        &self,
        user_id: UserId,
        expected: UserState,
        next: UserState,
    ) -> impl Future<Output = StorageResult<bool>> + Send;
}
