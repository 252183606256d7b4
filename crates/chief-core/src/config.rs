//! Configuration types for chief
//!
//! This module defines the provider and run settings consumed by the
//! registry and the [`Runner`](crate::runner::Runner).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Upper bound for the per-call timeout, in seconds
const MAX_CALL_TIMEOUT_SECS: u64 = 600;

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// API credentials
        credentials: CloudflareCredentials,
        /// API base URL override (defaults to the public v4 endpoint)
        #[serde(default)]
        base_url: Option<String>,
        /// Time budget for one HTTP request (in seconds); follows the run's
        /// call timeout
        #[serde(default = "default_call_timeout_secs")]
        request_timeout_secs: u64,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Free-form settings passed to the factory
        #[serde(default)]
        settings: HashMap<String, String>,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                credentials,
                request_timeout_secs,
                ..
            } => {
                validate_timeout_secs("Request timeout", *request_timeout_secs)?;
                credentials.validate()
            }
            ProviderConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom provider factory cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Cloudflare authentication
///
/// The Debug implementation never prints secrets.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum CloudflareCredentials {
    /// Scoped API token, sent as a bearer token
    ApiToken { token: String },
    /// Legacy global API key, sent as X-Auth-Email / X-Auth-Key
    GlobalKey { email: String, key: String },
}

impl CloudflareCredentials {
    /// Reject empty credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            CloudflareCredentials::ApiToken { token } => {
                if token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
            }
            CloudflareCredentials::GlobalKey { email, key } => {
                if email.is_empty() {
                    return Err(crate::Error::config("Cloudflare account email cannot be empty"));
                }
                if key.is_empty() {
                    return Err(crate::Error::config("Cloudflare API key cannot be empty"));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CloudflareCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudflareCredentials::ApiToken { .. } => f
                .debug_struct("ApiToken")
                .field("token", &"<REDACTED>")
                .finish(),
            CloudflareCredentials::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Settings for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Time budget for every individual provider call (in seconds)
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Compute and report outcomes without issuing mutations
    #[serde(default)]
    pub dry_run: bool,
}

impl RunSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn with_call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the run settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_timeout_secs("Call timeout", self.call_timeout_secs)
    }
}

fn validate_timeout_secs(what: &str, secs: u64) -> Result<(), crate::Error> {
    if !(1..=MAX_CALL_TIMEOUT_SECS).contains(&secs) {
        return Err(crate::Error::config(format!(
            "{} must be between 1 and {} seconds. Got: {}",
            what, MAX_CALL_TIMEOUT_SECS, secs
        )));
    }
    Ok(())
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
            dry_run: false,
        }
    }
}

fn default_call_timeout_secs() -> u64 {
    30
}
