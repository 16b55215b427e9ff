//! Start-up validation of the `[login]` config category.

use std::fmt;
use std::time::Duration;

use runegate_config::{Config, ConfigError};

/// Config category holding every login key.
pub const LOGIN_CATEGORY: &str = "login";

/// The admission gates the engine consults on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPolicy {
    /// Let a username with no account through to creation.
    pub is_unknown_user_allowed: bool,
    /// Create an account for an unknown username.
    pub is_user_creation_allowed: bool,
    /// Put internal detail into rejection text.
    pub is_login_verbose_to_client: bool,
}

impl Default for LoginPolicy {
    /// Unknown users are let in and provisioned; rejections stay terse.
    fn default() -> Self {
        Self {
            is_unknown_user_allowed: true,
            is_user_creation_allowed: true,
            is_login_verbose_to_client: false,
        }
    }
}

/// Database connection keys. Read and validated, not used by the
/// in-memory store.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub name: String,
    pub username: String,
    pub password: String,
    /// How often to force a reconnect.
    pub force_reconnection: Duration,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("force_reconnection", &self.force_reconnection)
            .finish()
    }
}

/// Every key the login service requires, read once and type-checked.
///
/// Building one is the start-up gate: a missing or mistyped key fails
/// here, before any client is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSettings {
    pub displayed_variables: Vec<String>,
    pub ws_port: u16,
    pub web_port: u16,
    pub client_port: u16,
    pub shard_id: u32,
    pub is_external_shard_allowed: bool,
    pub is_unknown_user_allowed: bool,
    pub is_user_creation_allowed: bool,
    pub beep: bool,
    pub is_naming_service_used: bool,
    pub is_aes_used: bool,
    pub is_login_verbose_to_client: bool,
    pub database: DatabaseSettings,
}

impl LoginSettings {
    /// Reads and validates the `[login]` category.
    ///
    /// # Errors
    /// The first missing, mistyped or out-of-range key.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let c = LOGIN_CATEGORY;
        let settings = Self {
            displayed_variables: config.str_list(c, "displayed_variables")?,
            ws_port: port(config, "ws_port")?,
            web_port: port(config, "web_port")?,
            client_port: port(config, "client_port")?,
            shard_id: shard_id(config)?,
            is_external_shard_allowed: config.bool(c, "is_external_shard_allowed")?,
            is_unknown_user_allowed: config.bool(c, "is_unknown_user_allowed")?,
            is_user_creation_allowed: config.bool(c, "is_user_creation_allowed")?,
            beep: config.bool(c, "beep")?,
            is_naming_service_used: config.bool(c, "is_naming_service_used")?,
            is_aes_used: config.bool(c, "is_aes_used")?,
            is_login_verbose_to_client: config.bool(c, "is_login_verbose_to_client")?,
            database: DatabaseSettings {
                host: config.str(c, "database_host")?,
                name: config.str(c, "database_name")?,
                username: config.str(c, "database_username")?,
                password: config.str(c, "database_password")?,
                force_reconnection: duration(config, "force_database_reconnection")?,
            },
        };
        tracing::debug!(
            client_port = settings.client_port,
            shard_id = settings.shard_id,
            "login settings validated"
        );
        Ok(settings)
    }

    /// The gates the engine needs.
    pub fn policy(&self) -> LoginPolicy {
        LoginPolicy {
            is_unknown_user_allowed: self.is_unknown_user_allowed,
            is_user_creation_allowed: self.is_user_creation_allowed,
            is_login_verbose_to_client: self.is_login_verbose_to_client,
        }
    }
}

fn port(config: &Config, key: &str) -> Result<u16, ConfigError> {
    let value = config.int(LOGIN_CATEGORY, key)?;
    u16::try_from(value).map_err(|_| {
        ConfigError::invalid(LOGIN_CATEGORY, key, format!("{value} is not a port"))
    })
}

fn shard_id(config: &Config) -> Result<u32, ConfigError> {
    let value = config.int(LOGIN_CATEGORY, "shard_id")?;
    u32::try_from(value).map_err(|_| {
        ConfigError::invalid(LOGIN_CATEGORY, "shard_id", format!("{value} is out of range"))
    })
}

fn duration(config: &Config, key: &str) -> Result<Duration, ConfigError> {
    let text = config.str(LOGIN_CATEGORY, key)?;
    humantime::parse_duration(&text)
        .map_err(|e| ConfigError::invalid(LOGIN_CATEGORY, key, e.to_string()))
}
