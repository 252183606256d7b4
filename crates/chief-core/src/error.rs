//! Error types for chief
//!
//! Every error is terminal for a run: nothing in this crate retries.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for chief operations
pub type Result<T> = std::result::Result<T, Error>;

/// A provider call, named for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListZones,
    ListRecords,
    CreateRecord,
    PatchRecord,
    DeleteRecord,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListZones => "list zones",
            Operation::ListRecords => "list records",
            Operation::CreateRecord => "create record",
            Operation::PatchRecord => "patch record",
            Operation::DeleteRecord => "delete record",
        };
        f.write_str(name)
    }
}

/// A declared record whose `state` is neither `present` nor `absent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidState {
    /// Name of the offending record
    pub name: String,
    /// The unrecognized state value
    pub value: String,
}

impl fmt::Display for InvalidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid record state {:?} for {}", self.value, self.name)
    }
}

/// Coarse classification used to pick the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad declared input or settings; raised before any mutation
    Config,
    /// The requested zone does not exist at the provider
    ZoneNotFound,
    /// Any failure talking to the provider
    Provider,
    /// The run was cancelled by a shutdown signal
    Cancelled,
}

/// Core error type for chief
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (unreadable or unparsable record source, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more declared records carry an unrecognized state
    #[error("Invalid config: {}", join_violations(.0))]
    InvalidState(Vec<InvalidState>),

    /// The requested zone is not held by the provider
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Resource not found at the provider
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// A mutation failed; earlier mutations of the same run stay applied
    #[error("Error during {operation} for {record}: {source}")]
    Mutation {
        /// The failed provider call
        operation: Operation,
        /// Name of the declared record being reconciled
        record: String,
        /// Underlying provider error
        #[source]
        source: Box<Error>,
    },

    /// A provider call exceeded its time budget
    #[error("Timed out after {timeout:?} during {operation}")]
    Timeout {
        /// The provider call that timed out
        operation: Operation,
        /// The budget that was exceeded
        timeout: Duration,
    },

    /// A shutdown signal stopped the run
    #[error("Run cancelled: {0}")]
    Cancelled(String),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn join_violations(violations: &[InvalidState]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(msg: impl Into<String>) -> Self {
        Self::ZoneNotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Wrap a provider failure with the record and operation it hit
    pub fn mutation(operation: Operation, record: impl Into<String>, source: Error) -> Self {
        Self::Mutation {
            operation,
            record: record.into(),
            source: Box::new(source),
        }
    }

    /// Classify this error for exit-code selection
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidState(_) | Error::Yaml(_) => ErrorCategory::Config,
            Error::ZoneNotFound(_) => ErrorCategory::ZoneNotFound,
            Error::Cancelled(_) => ErrorCategory::Cancelled,
            Error::Mutation { source, .. } => match source.category() {
                ErrorCategory::Cancelled => ErrorCategory::Cancelled,
                _ => ErrorCategory::Provider,
            },
            _ => ErrorCategory::Provider,
        }
    }
}
