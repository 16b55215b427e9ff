//! Configuration for Runegate.
//!
//! A [`Config`] is a two-level map, `category → key → value`, built once at
//! start-up from layered TOML files and then handed to whoever needs it.
//! There is no global instance.
//!
//! ```text
//! common.toml  →  login.toml  →  login.override.toml (optional)
//!    (base)        (service)       (local tweaks, wins)
//! ```
//!
//! Two ways to read a value:
//!
//! - **Fallible** ([`Config::bool`], [`Config::int`], ...): returns a
//!   [`ConfigError`] naming the missing category, missing key, or type
//!   mismatch. Start-up validation uses these.
//! - **Convenience** ([`Config::bool_or_default`], ...): returns the zero
//!   value instead, unless the config is [`Strictness::Strict`], in which
//!   case a bad read is fatal.

mod config;
mod error;
mod value;

pub use config::{Config, PRODUCTION_ENV_VAR, Strictness};
pub use error::ConfigError;
pub use value::Value;
