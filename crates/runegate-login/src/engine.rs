//! The login decision engine.
//!
//! One operation, [`LoginEngine::verify`], evaluated in a fixed order:
//!
//! ```text
//! lengths ─→ lookup ─┬─ found ───────────────────────────┐
//!                    └─ unknown ─→ policy ─→ format ─→ create
//!                                                        │
//!          shards ←─ Offline→Online (CAS) ←─ state ←─ password
//! ```
//!
//! Storage failures during lookup, and cancellation, are errors. Everything
//! else that turns the client away is a [`Rejection`].

use runegate_config::{Config, ConfigError};
use runegate_protocol::{
    CallContext, LoginService, LoginVerifyRequest, LoginVerifyResponse,
    ServiceError, ShardSummary,
};
use runegate_storage::{NewUser, Shard, Storage, StorageError, User, UserState};

use crate::validate::{MAX_CREDENTIAL_LEN, validate_password, validate_username};
use crate::{FormatError, LoginError, LoginPolicy, LoginSettings};

/// Outcome of a verify call that reached a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The user is now Online; `shards` are those for the requested
    /// application.
    Admitted { user: User, shards: Vec<Shard> },
    /// The client was turned away.
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Why a client was turned away.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    UsernameEmpty,
    UsernameTooLong,
    PasswordEmpty,
    PasswordTooLong,
    /// No account, and unknown users are not allowed.
    UnknownUser,
    /// No account, and creating one is not allowed.
    CreationNotAllowed,
    InvalidUsername(FormatError),
    InvalidPassword(FormatError),
    CreationFailed(StorageError),
    BadPassword,
    AlreadyConnected { username: String },
    UpdateFailed(StorageError),
    ShardsUnavailable(StorageError),
}

impl Rejection {
    /// Text sent to the client. `verbose` adds internal detail where the
    /// terse text would hide it.
    pub fn message(&self, verbose: bool) -> String {
        const GENERIC: &str = "Invalid username or password";
        match self {
            Self::UsernameEmpty => "Username is empty".into(),
            Self::UsernameTooLong => "Username is too long".into(),
            Self::PasswordEmpty => "Password is empty".into(),
            Self::PasswordTooLong => "Password is too long".into(),
            Self::UnknownUser if verbose => {
                "User not found and unknown users are not allowed".into()
            }
            Self::CreationNotAllowed if verbose => {
                "User not found and user creation is not allowed".into()
            }
            Self::UnknownUser | Self::CreationNotAllowed => GENERIC.into(),
            Self::InvalidUsername(e) => format!("Username is invalid: {e}"),
            Self::InvalidPassword(e) => format!("Password is invalid: {e}"),
            Self::CreationFailed(e) if verbose => format!("Failed to create user: {e}"),
            Self::CreationFailed(_) => "User creation failed for an unknown reason".into(),
            Self::BadPassword if verbose => "Password is incorrect".into(),
            Self::BadPassword => GENERIC.into(),
            Self::AlreadyConnected { username } => {
                format!("User '{username}' is already connected")
            }
            Self::UpdateFailed(e) if verbose => format!("Failed to update user: {e}"),
            Self::UpdateFailed(_) => "Failed to update user".into(),
            Self::ShardsUnavailable(e) if verbose => format!("Failed to get shards: {e}"),
            Self::ShardsUnavailable(_) => "Failed to get shards".into(),
        }
    }
}

/// Decides whether a client may log in.
///
/// Holds no per-call state; share one engine (behind an `Arc`) across
/// every connection.
pub struct LoginEngine<S> {
    storage: S,
    policy: LoginPolicy,
}

impl<S: Storage> LoginEngine<S> {
    pub fn new(storage: S, policy: LoginPolicy) -> Self {
        Self { storage, policy }
    }

    /// Validates the `[login]` category and builds an engine from it.
    pub fn from_config(storage: S, config: &Config) -> Result<Self, ConfigError> {
        let settings = LoginSettings::from_config(config)?;
        Ok(Self::new(storage, settings.policy()))
    }

    pub fn policy(&self) -> LoginPolicy {
        self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs the login decision for one client.
    ///
    /// # Errors
    /// [`LoginError::Storage`] if the user lookup fails, and
    /// [`LoginError::Context`] if `ctx` is cancelled or expires while
    /// waiting on storage. Once the Offline→Online transition has
    /// started it is not abandoned.
    pub async fn verify(
        &self,
        ctx: &CallContext,
        username: &str,
        password: &str,
        application: &str,
    ) -> Result<Verdict, LoginError> {
        if let Some(rejection) = check_lengths(username, password) {
            return Ok(self.rejected(username, rejection));
        }

        let user = match ctx.run(self.storage.user_by_login(username)).await?? {
            Some(user) => user,
            None => match self.provision(ctx, username, password, application).await? {
                Ok(user) => user,
                Err(rejection) => return Ok(self.rejected(username, rejection)),
            },
        };

        // Plain comparison; stored passwords are not hashed.
        if user.password != password {
            return Ok(self.rejected(username, Rejection::BadPassword));
        }
        if user.state != UserState::Offline {
            return Ok(self.rejected(username, already_connected(username)));
        }

        ctx.check()?;
        match self
            .storage
            .user_transition_state(user.user_id, UserState::Offline, UserState::Online)
            .await
        {
            Ok(true) => {}
            Ok(false) => return Ok(self.rejected(username, already_connected(username))),
            Err(e) => {
                tracing::warn!(%username, user_id = %user.user_id, error = %e, "failed to mark user online");
                return Ok(self.rejected(username, Rejection::UpdateFailed(e)));
            }
        }
        tracing::info!(%username, user_id = %user.user_id, %application, "user admitted");

        let shards = match ctx
            .run(self.storage.shards_by_client_application(application))
            .await?
        {
            Ok(shards) => shards,
            Err(e) => {
                tracing::warn!(%application, error = %e, "failed to list shards");
                return Ok(self.rejected(username, Rejection::ShardsUnavailable(e)));
            }
        };

        let user = User {
            state: UserState::Online,
            ..user
        };
        Ok(Verdict::Admitted { user, shards })
    }

    /// Policy, format and creation steps for a username with no account.
    /// The outer `Result` carries hard errors, the inner one rejections.
    async fn provision(
        &self,
        ctx: &CallContext,
        username: &str,
        password: &str,
        application: &str,
    ) -> Result<Result<User, Rejection>, LoginError> {
        if !self.policy.is_unknown_user_allowed {
            return Ok(Err(Rejection::UnknownUser));
        }
        if !self.policy.is_user_creation_allowed {
            return Ok(Err(Rejection::CreationNotAllowed));
        }
        if let Err(e) = validate_username(username) {
            return Ok(Err(Rejection::InvalidUsername(e)));
        }
        if let Err(e) = validate_password(password) {
            return Ok(Err(Rejection::InvalidPassword(e)));
        }

        let created = ctx
            .run(self.storage.user_create(NewUser::offline(username, password)))
            .await?;
        match created {
            Ok(user) => {
                tracing::info!(%username, user_id = %user.user_id, %application, "user created");
                Ok(Ok(user))
            }
            // Someone else created it first; carry on with their record.
            Err(conflict @ StorageError::Conflict(_)) => {
                match ctx.run(self.storage.user_by_login(username)).await?? {
                    Some(user) => Ok(Ok(user)),
                    None => Ok(Err(Rejection::CreationFailed(conflict))),
                }
            }
            Err(e) => {
                tracing::warn!(%username, error = %e, "user creation failed");
                Ok(Err(Rejection::CreationFailed(e)))
            }
        }
    }

    fn rejected(&self, username: &str, rejection: Rejection) -> Verdict {
        tracing::debug!(
            %username,
            reason = %rejection.message(true),
            "login rejected"
        );
        Verdict::Rejected(rejection)
    }
}

fn check_lengths(username: &str, password: &str) -> Option<Rejection> {
    if username.is_empty() {
        return Some(Rejection::UsernameEmpty);
    }
    if username.chars().count() > MAX_CREDENTIAL_LEN {
        return Some(Rejection::UsernameTooLong);
    }
    if password.is_empty() {
        return Some(Rejection::PasswordEmpty);
    }
    if password.chars().count() > MAX_CREDENTIAL_LEN {
        return Some(Rejection::PasswordTooLong);
    }
    None
}

fn already_connected(username: &str) -> Rejection {
    Rejection::AlreadyConnected {
        username: username.to_string(),
    }
}

impl<S: Storage> LoginService for LoginEngine<S> {
    async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, ServiceError> {
        let verdict = self
            .verify(ctx, &request.username, &request.password, &request.application)
            .await?;

        Ok(match verdict {
            Verdict::Admitted { shards, .. } => LoginVerifyResponse::accepted(
                shards
                    .into_iter()
                    .map(|shard| ShardSummary {
                        name: shard.name,
                        player_count: shard.player_count,
                        shard_id: shard.shard_id.0,
                    })
                    .collect(),
            ),
            Verdict::Rejected(rejection) => LoginVerifyResponse::rejected(
                rejection.message(self.policy.is_login_verbose_to_client),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use runegate_storage::{MemoryStorage, ShardId, StorageResult, UserId};

    fn engine(policy: LoginPolicy) -> LoginEngine<MemoryStorage> {
        let shards = [
            shard(1, "Aniro", "rh"),
            shard(2, "Leanon", "rh"),
            shard(3, "Test", "other"),
        ];
        LoginEngine::new(MemoryStorage::with_shards(shards), policy)
    }

    fn shard(id: u32, name: &str, app: &str) -> Shard {
        Shard {
            shard_id: ShardId(id),
            name: name.into(),
            player_count: id * 10,
            ws_addr: format!("10.0.0.{id}:49999"),
            client_app: app.into(),
        }
    }

    async fn verify(
        engine: &LoginEngine<MemoryStorage>,
        username: &str,
        password: &str,
        application: &str,
    ) -> Verdict {
        engine
            .verify(&CallContext::new(), username, password, application)
            .await
            .unwrap()
    }

    // =====================================================================
    // Length checks
    // =====================================================================

    #[tokio::test]
    async fn test_verify_length_violations_reject_without_creating() {
        let engine = engine(LoginPolicy::default());
        let cases = [
            ("", "pw", Rejection::UsernameEmpty),
            ("abcdefghijklmnopq", "pw", Rejection::UsernameTooLong),
            ("alice", "", Rejection::PasswordEmpty),
            ("alice", "abcdefghijklmnopq", Rejection::PasswordTooLong),
        ];

        for (username, password, expected) in cases {
            let verdict = verify(&engine, username, password, "rh").await;
            assert_eq!(verdict, Verdict::Rejected(expected));
        }
        assert!(engine.storage().users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_sixteen_characters_is_allowed() {
        let engine = engine(LoginPolicy::default());
        let verdict = verify(&engine, "abcdefghijklmnop", "abcdefghijklmnop", "").await;
        assert!(verdict.is_admitted());
    }

    // =====================================================================
    // Unknown users
    // =====================================================================

    #[tokio::test]
    async fn test_verify_unknown_user_not_allowed_rejects() {
        let engine = engine(LoginPolicy {
            is_unknown_user_allowed: false,
            ..LoginPolicy::default()
        });

        let verdict = verify(&engine, "newbie", "pw", "rh").await;

        assert_eq!(verdict, Verdict::Rejected(Rejection::UnknownUser));
        assert!(engine.storage().users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_creation_not_allowed_rejects() {
        let engine = engine(LoginPolicy {
            is_user_creation_allowed: false,
            ..LoginPolicy::default()
        });

        let verdict = verify(&engine, "newbie", "pw", "rh").await;

        assert_eq!(verdict, Verdict::Rejected(Rejection::CreationNotAllowed));
    }

    #[tokio::test]
    async fn test_verify_invalid_username_format_rejects() {
        let engine = engine(LoginPolicy::default());

        let verdict = verify(&engine, "9lives", "pw", "rh").await;

        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::InvalidUsername(FormatError::MustStartWithLetter))
        );
    }

    #[tokio::test]
    async fn test_verify_unknown_user_is_created_and_admitted() {
        let engine = engine(LoginPolicy::default());

        let verdict = verify(&engine, "newbie", "pw", "rh").await;

        let Verdict::Admitted { user, shards } = verdict else {
            panic!("expected admission, got {verdict:?}");
        };
        assert_eq!(user.username, "newbie");
        assert_eq!(user.state, UserState::Online);
        let names: Vec<_> = shards.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Aniro", "Leanon"]);

        let stored = engine.storage().user_by_login("newbie").await.unwrap().unwrap();
        assert_eq!(stored.state, UserState::Online);
    }

    // =====================================================================
    // Known users
    // =====================================================================

    #[tokio::test]
    async fn test_verify_wrong_password_rejects_and_keeps_state() {
        let engine = engine(LoginPolicy::default());
        engine
            .storage()
            .user_create(NewUser::offline("alice", "right"))
            .await
            .unwrap();

        let verdict = verify(&engine, "alice", "wrong", "rh").await;

        assert_eq!(verdict, Verdict::Rejected(Rejection::BadPassword));
        let stored = engine.storage().user_by_login("alice").await.unwrap().unwrap();
        assert_eq!(stored.state, UserState::Offline);
    }

    #[tokio::test]
    async fn test_verify_second_login_is_already_connected() {
        let engine = engine(LoginPolicy::default());
        assert!(verify(&engine, "alice", "pw", "rh").await.is_admitted());

        let verdict = verify(&engine, "alice", "pw", "rh").await;

        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::AlreadyConnected {
                username: "alice".into()
            })
        );
    }

    #[tokio::test]
    async fn test_verify_empty_application_returns_no_shards() {
        let engine = engine(LoginPolicy::default());

        let verdict = verify(&engine, "alice", "pw", "").await;

        assert!(matches!(verdict, Verdict::Admitted { shards, .. } if shards.is_empty()));
    }

    // =====================================================================
    // Cancellation
    // =====================================================================

    #[tokio::test]
    async fn test_verify_cancelled_context_is_hard_error() {
        let engine = engine(LoginPolicy::default());
        let ctx = CallContext::new();
        ctx.cancel();

        let result = engine.verify(&ctx, "alice", "pw", "rh").await;

        assert_eq!(
            result,
            Err(LoginError::Context(runegate_protocol::ContextError::Cancelled))
        );
        assert!(engine.storage().users().await.unwrap().is_empty());
    }

    // =====================================================================
    // Storage failures
    // =====================================================================

    /// [`MemoryStorage`] that fails the operations whose switch is on.
    struct Faulty {
        inner: MemoryStorage,
        fail_lookup: AtomicBool,
        fail_create: AtomicBool,
        fail_transition: AtomicBool,
        fail_shards: AtomicBool,
    }

    impl Faulty {
        fn new() -> Self {
            Self {
                inner: MemoryStorage::with_shards([shard(1, "Aniro", "rh")]),
                fail_lookup: AtomicBool::new(false),
                fail_create: AtomicBool::new(false),
                fail_transition: AtomicBool::new(false),
                fail_shards: AtomicBool::new(false),
            }
        }

        fn trip(flag: &AtomicBool) -> StorageResult<()> {
            if flag.load(Ordering::SeqCst) {
                return Err(down());
            }
            Ok(())
        }
    }

    fn down() -> StorageError {
        StorageError::Unavailable("db down".into())
    }

    impl Storage for Faulty {
        async fn shards(&self) -> StorageResult<Vec<Shard>> {
            self.inner.shards().await
        }

        async fn shard_by_id(&self, shard_id: ShardId) -> StorageResult<Option<Shard>> {
            self.inner.shard_by_id(shard_id).await
        }

        async fn shard_by_ws_addr(&self, ws_addr: &str) -> StorageResult<Option<Shard>> {
            self.inner.shard_by_ws_addr(ws_addr).await
        }

        async fn shard_create(&self, shard: Shard) -> StorageResult<Shard> {
            self.inner.shard_create(shard).await
        }

        async fn shard_update(&self, shard: Shard) -> StorageResult<()> {
            self.inner.shard_update(shard).await
        }

        async fn shards_by_client_application(
            &self,
            client_app: &str,
        ) -> StorageResult<Vec<Shard>> {
            Self::trip(&self.fail_shards)?;
            self.inner.shards_by_client_application(client_app).await
        }

        async fn users(&self) -> StorageResult<Vec<User>> {
            self.inner.users().await
        }

        async fn user_by_login(&self, username: &str) -> StorageResult<Option<User>> {
            Self::trip(&self.fail_lookup)?;
            self.inner.user_by_login(username).await
        }

        async fn user_by_id(&self, user_id: UserId) -> StorageResult<Option<User>> {
            self.inner.user_by_id(user_id).await
        }

        async fn users_by_state(&self, state: UserState) -> StorageResult<Vec<User>> {
            self.inner.users_by_state(state).await
        }

        async fn users_by_shard_id(&self, shard_id: ShardId) -> StorageResult<Vec<User>> {
            self.inner.users_by_shard_id(shard_id).await
        }

        async fn user_create(&self, user: NewUser) -> StorageResult<User> {
            Self::trip(&self.fail_create)?;
            self.inner.user_create(user).await
        }

        async fn user_update(&self, user: User) -> StorageResult<()> {
            self.inner.user_update(user).await
        }

        async fn user_transition_state(
            &self,
            user_id: UserId,
            expected: UserState,
            next: UserState,
        ) -> StorageResult<bool> {
            Self::trip(&self.fail_transition)?;
            self.inner.user_transition_state(user_id, expected, next).await
        }
    }

    fn faulty_engine(verbose: bool) -> LoginEngine<Faulty> {
        LoginEngine::new(
            Faulty::new(),
            LoginPolicy {
                is_login_verbose_to_client: verbose,
                ..LoginPolicy::default()
            },
        )
    }

    async fn state_of(engine: &LoginEngine<Faulty>, username: &str) -> UserState {
        engine
            .storage()
            .inner
            .user_by_login(username)
            .await
            .unwrap()
            .unwrap()
            .state
    }

    #[tokio::test]
    async fn test_verify_lookup_failure_is_hard_error() {
        let engine = faulty_engine(false);
        engine.storage().fail_lookup.store(true, Ordering::SeqCst);

        let result = engine.verify(&CallContext::new(), "alice", "pw", "rh").await;

        assert_eq!(result, Err(LoginError::Storage(down())));
        assert!(engine.storage().inner.users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_create_failure_rejects() {
        let engine = faulty_engine(false);
        engine.storage().fail_create.store(true, Ordering::SeqCst);

        let verdict = engine
            .verify(&CallContext::new(), "newbie", "pw", "rh")
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::Rejected(Rejection::CreationFailed(down())));
        assert!(engine.storage().inner.users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_transition_failure_rejects_and_stays_offline() {
        let engine = faulty_engine(false);
        engine
            .storage()
            .inner
            .user_create(NewUser::offline("alice", "pw"))
            .await
            .unwrap();
        engine.storage().fail_transition.store(true, Ordering::SeqCst);

        let verdict = engine
            .verify(&CallContext::new(), "alice", "pw", "rh")
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::Rejected(Rejection::UpdateFailed(down())));
        assert_eq!(state_of(&engine, "alice").await, UserState::Offline);
    }

    #[tokio::test]
    async fn test_verify_shard_failure_rejects_after_going_online() {
        let engine = faulty_engine(false);
        engine.storage().fail_shards.store(true, Ordering::SeqCst);

        let verdict = engine
            .verify(&CallContext::new(), "alice", "pw", "rh")
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::Rejected(Rejection::ShardsUnavailable(down())));
        assert_eq!(state_of(&engine, "alice").await, UserState::Online);
    }

    #[tokio::test]
    async fn test_login_verify_storage_rejections_respect_verbosity() {
        let terse = faulty_engine(false);
        let verbose = faulty_engine(true);
        for engine in [&terse, &verbose] {
            engine.storage().fail_transition.store(true, Ordering::SeqCst);
        }
        let request = || LoginVerifyRequest::new("alice", "pw", "rh");

        let terse = terse.login_verify(&CallContext::new(), request()).await.unwrap();
        let verbose = verbose
            .login_verify(&CallContext::new(), request())
            .await
            .unwrap();

        assert_eq!(terse.error, "Failed to update user");
        assert_eq!(
            verbose.error,
            "Failed to update user: storage unavailable: db down"
        );
    }

    #[tokio::test]
    async fn test_login_verify_lookup_failure_is_unavailable() {
        let engine = faulty_engine(true);
        engine.storage().fail_lookup.store(true, Ordering::SeqCst);

        let result = engine
            .login_verify(&CallContext::new(), LoginVerifyRequest::new("alice", "pw", "rh"))
            .await;

        assert!(matches!(result, Err(ServiceError::Unavailable(msg)) if msg.contains("db down")));
    }

    // =====================================================================
    // Messages
    // =====================================================================

    #[test]
    fn test_rejection_message_terse_hides_detail() {
        assert_eq!(Rejection::BadPassword.message(false), "Invalid username or password");
        assert_eq!(Rejection::UnknownUser.message(false), "Invalid username or password");
        assert_eq!(
            Rejection::CreationFailed(StorageError::Unavailable("db".into())).message(false),
            "User creation failed for an unknown reason"
        );
    }

    #[test]
    fn test_rejection_message_verbose_shows_detail() {
        assert_eq!(Rejection::BadPassword.message(true), "Password is incorrect");
        assert_eq!(
            Rejection::CreationNotAllowed.message(true),
            "User not found and user creation is not allowed"
        );
        assert!(
            Rejection::CreationFailed(StorageError::Unavailable("db".into()))
                .message(true)
                .starts_with("Failed to create user: ")
        );
    }

    #[test]
    fn test_rejection_message_already_connected_names_user() {
        let rejection = already_connected("bob");
        assert_eq!(rejection.message(false), "User 'bob' is already connected");
    }

    #[tokio::test]
    async fn test_login_verify_maps_verdict_to_response() {
        let engine = engine(LoginPolicy {
            is_login_verbose_to_client: true,
            ..LoginPolicy::default()
        });
        let ctx = CallContext::new();

        let ok = engine
            .login_verify(&ctx, LoginVerifyRequest::new("alice", "pw", "rh"))
            .await
            .unwrap();
        let again = engine
            .login_verify(&ctx, LoginVerifyRequest::new("alice", "nope", "rh"))
            .await
            .unwrap();

        assert!(ok.is_accepted());
        assert_eq!(ok.shards[0].shard_id, 1);
        assert_eq!(ok.shards[0].player_count, 10);
        assert_eq!(again.error, "Password is incorrect");
    }
}
