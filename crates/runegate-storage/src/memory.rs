//! In-memory storage backend.
//!
//! [`MemoryStorage`] keeps users and shards in hash maps behind a single
//! [`parking_lot::RwLock`]. Nothing is persisted. Cloning is cheap and
//! every clone sees the same data, which is how tests keep a handle on a
//! store they have handed to the login engine.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    NewUser, Shard, ShardId, Storage, StorageError, StorageResult, User,
    UserId, UserState,
};

/// In-memory [`Storage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    shards: HashMap<ShardId, Shard>,
    users: HashMap<UserId, User>,
    /// Username → id, kept in sync with `users`.
    user_ids: HashMap<String, UserId>,
    /// Last id handed out; ids start at 1.
    last_user_id: u32,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with `shards`. A later shard with the
    /// same id replaces an earlier one.
    pub fn with_shards(shards: impl IntoIterator<Item = Shard>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            for shard in shards {
                tables.shards.insert(shard.shard_id, shard);
            }
        }
        store
    }
}

fn sorted_shards<'a>(iter: impl Iterator<Item = &'a Shard>) -> Vec<Shard> {
    let mut shards: Vec<Shard> = iter.cloned().collect();
    shards.sort_by_key(|s| s.shard_id);
    shards
}

fn sorted_users<'a>(iter: impl Iterator<Item = &'a User>) -> Vec<User> {
    let mut users: Vec<User> = iter.cloned().collect();
    users.sort_by_key(|u| u.user_id);
    users
}

impl Storage for MemoryStorage {
    async fn shards(&self) -> StorageResult<Vec<Shard>> {
        let tables = self.tables.read();
        Ok(sorted_shards(tables.shards.values()))
    }

    async fn shard_by_id(
        &self,
        shard_id: ShardId,
    ) -> StorageResult<Option<Shard>> {
        Ok(self.tables.read().shards.get(&shard_id).cloned())
    }

    async fn shard_by_ws_addr(
        &self,
        ws_addr: &str,
    ) -> StorageResult<Option<Shard>> {
        let tables = self.tables.read();
        Ok(tables
            .shards
            .values()
            .find(|s| s.ws_addr == ws_addr)
            .cloned())
    }

    async fn shard_create(&self, shard: Shard) -> StorageResult<Shard> {
        let mut tables = self.tables.write();
        if tables.shards.contains_key(&shard.shard_id) {
            return Err(StorageError::Conflict(format!(
                "shard {} already exists",
                shard.shard_id
            )));
        }
        tables.shards.insert(shard.shard_id, shard.clone());
        tracing::debug!(shard_id = %shard.shard_id, "shard created");
        Ok(shard)
    }

    async fn shard_update(&self, shard: Shard) -> StorageResult<()> {
        let mut tables = self.tables.write();
        match tables.shards.get_mut(&shard.shard_id) {
            Some(slot) => {
                *slot = shard;
                Ok(())
            }
            None => Err(StorageError::NotFound {
                entity: "shard",
                id: shard.shard_id.to_string(),
            }),
        }
    }

    async fn shards_by_client_application(
        &self,
        client_app: &str,
    ) -> StorageResult<Vec<Shard>> {
        if client_app.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.tables.read();
        Ok(sorted_shards(
            tables.shards.values().filter(|s| s.client_app == client_app),
        ))
    }

    async fn users(&self) -> StorageResult<Vec<User>> {
        let tables = self.tables.read();
        Ok(sorted_users(tables.users.values()))
    }

    async fn user_by_login(
        &self,
        username: &str,
    ) -> StorageResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .user_ids
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn user_by_id(&self, user_id: UserId) -> StorageResult<Option<User>> {
        Ok(self.tables.read().users.get(&user_id).cloned())
    }

    async fn users_by_state(
        &self,
        state: UserState,
    ) -> StorageResult<Vec<User>> {
        let tables = self.tables.read();
        Ok(sorted_users(tables.users.values().filter(|u| u.state == state)))
    }

    async fn users_by_shard_id(
        &self,
        shard_id: ShardId,
    ) -> StorageResult<Vec<User>> {
        let tables = self.tables.read();
        Ok(sorted_users(
            tables
                .users
                .values()
                .filter(|u| u.shard_id == Some(shard_id)),
        ))
    }

    async fn user_create(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.tables.write();
        if tables.user_ids.contains_key(&user.username) {
            return Err(StorageError::Conflict(format!(
                "username '{}' is taken",
                user.username
            )));
        }

        tables.last_user_id += 1;
        let user_id = UserId(tables.last_user_id);
        let record = User {
            user_id,
            username: user.username,
            password: user.password,
            state: user.state,
            shard_id: None,
        };

        tables.user_ids.insert(record.username.clone(), user_id);
        tables.users.insert(user_id, record.clone());
        tracing::debug!(%user_id, username = %record.username, "user created");
        Ok(record)
    }

    async fn user_update(&self, user: User) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let Some(previous) = tables.users.get(&user.user_id) else {
            return Err(StorageError::NotFound {
                entity: "user",
                id: user.user_id.to_string(),
            });
        };

        if previous.username != user.username {
            if tables.user_ids.contains_key(&user.username) {
                return Err(StorageError::Conflict(format!(
                    "username '{}' is taken",
                    user.username
                )));
            }
            let old_name = previous.username.clone();
            tables.user_ids.remove(&old_name);
            tables.user_ids.insert(user.username.clone(), user.user_id);
        }

        tables.users.insert(user.user_id, user);
        Ok(())
    }

    async fn user_transition_state(
        &self,
        user_id: UserId,
        expected: UserState,
        next: UserState,
    ) -> StorageResult<bool> {
        // Read, compare and write under one write guard.
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(&user_id).ok_or_else(|| {
            StorageError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            }
        })?;

        if user.state != expected {
            return Ok(false);
        }
        user.state = next;
        Ok(true)
    }
}

// =========================================================================
// Tests
// =========================================================================
