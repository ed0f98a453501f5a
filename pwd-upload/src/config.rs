//! Process configuration. Everything the job reads from the environment is
//! collected here once, at startup, and handed down explicitly.

use std::env;
use std::fmt;

use thiserror::Error;

use crate::store::cloudflare::DEFAULT_API_BASE_URL;

pub const DEFAULT_PASSWORD_VAR: &str = "DEFAULT_PASSWORD";
pub const ACCOUNT_ID_VAR: &str = "CF_ACCOUNT_ID";
pub const NAMESPACE_ID_VAR: &str = "CF_KV_ID";
pub const API_TOKEN_VAR: &str = "CLOUDFLARE_API_TOKEN";
pub const API_BASE_URL_VAR: &str = "CF_API_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required for KV upload but missing")]
    MissingVar(&'static str),
    #[error("page size must be between 1 and {max}, got {value}")]
    InvalidPageSize { value: usize, max: usize },
    #[error("unable to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Clone)]
pub struct Config {
    pub default_password: Option<String>,
    pub account_id: Option<String>,
    pub namespace_id: Option<String>,
    pub api_token: Option<String>,
    pub api_base_url: String,
}

/// Account and namespace the job writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTarget<'a> {
    pub account_id: &'a str,
    pub namespace_id: &'a str,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup. Empty values
    /// count as unset; identifiers and tokens also count as unset when they
    /// hold only whitespace. A whitespace default password is still a password.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            default_password: lookup(DEFAULT_PASSWORD_VAR).filter(|value| !value.is_empty()),
            account_id: read(ACCOUNT_ID_VAR),
            namespace_id: read(NAMESPACE_ID_VAR),
            api_token: read(API_TOKEN_VAR),
            api_base_url: read(API_BASE_URL_VAR).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        }
    }

    /// The KV account and namespace, or the first missing variable.
    pub fn remote(&self) -> Result<RemoteTarget<'_>, ConfigError> {
        let account_id = self
            .account_id
            .as_deref()
            .ok_or(ConfigError::MissingVar(ACCOUNT_ID_VAR))?;
        let namespace_id = self
            .namespace_id
            .as_deref()
            .ok_or(ConfigError::MissingVar(NAMESPACE_ID_VAR))?;
        Ok(RemoteTarget {
            account_id,
            namespace_id,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("default_password", &redacted(&self.default_password))
            .field("account_id", &self.account_id)
            .field("namespace_id", &self.namespace_id)
            .field("api_token", &redacted(&self.api_token))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}
