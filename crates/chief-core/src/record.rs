//! Record data model
//!
//! [`RemoteRecord`]s come from a provider snapshot and are never mutated.
//! [`DeclaredRecord`]s come from the declarative source and are read-only to
//! the reconciler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State value for records that should exist
pub const STATE_PRESENT: &str = "present";

/// State value for records that should not exist
pub const STATE_ABSENT: &str = "absent";

/// A DNS zone held by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider-specific zone ID
    pub id: String,
    /// Zone name, also the suffix used for fully-qualified matching
    pub name: String,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A record as currently held by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    pub name: String,
    pub value: String,
    pub record_type: String,
    pub ttl: u32,
    /// Provider-specific record ID, used for patch and delete
    pub provider_id: String,
}

/// A record from the declarative source
///
/// `state` is kept as the raw string so that unrecognized values survive
/// parsing and can be reported by [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredRecord {
    pub name: String,

    #[serde(default)]
    pub value: String,

    #[serde(rename = "type", default)]
    pub record_type: String,

    #[serde(default)]
    pub ttl: u32,

    /// Older exports have no state; they mean `present`
    #[serde(default = "default_state")]
    pub state: String,
}

fn default_state() -> String {
    STATE_PRESENT.to_string()
}

impl DeclaredRecord {
    /// Create a record that should exist
    pub fn present(
        name: impl Into<String>,
        value: impl Into<String>,
        record_type: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            record_type: record_type.into(),
            ttl,
            state: STATE_PRESENT.to_string(),
        }
    }

    /// Create a record that should be removed; only the name is matched
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            record_type: String::new(),
            ttl: 0,
            state: STATE_ABSENT.to_string(),
        }
    }

    /// Override the raw state value
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Parse the raw state, `None` if unrecognized
    pub fn desired_state(&self) -> Option<DesiredState> {
        match self.state.as_str() {
            STATE_PRESENT => Some(DesiredState::Present),
            STATE_ABSENT => Some(DesiredState::Absent),
            _ => None,
        }
    }
}

impl From<&RemoteRecord> for DeclaredRecord {
    fn from(remote: &RemoteRecord) -> Self {
        Self::present(
            remote.name.clone(),
            remote.value.clone(),
            remote.record_type.clone(),
            remote.ttl,
        )
    }
}

/// Parsed desired state of a declared record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredState {
    Present,
    Absent,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Present => f.write_str(STATE_PRESENT),
            DesiredState::Absent => f.write_str(STATE_ABSENT),
        }
    }
}

/// A record field that reconciliation may change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Value,
    Ttl,
    Type,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordField::Value => f.write_str("value"),
            RecordField::Ttl => f.write_str("ttl"),
            RecordField::Type => f.write_str("type"),
        }
    }
}

/// One differing field between a remote record and its declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: RecordField,
    pub old: String,
    pub new: String,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.old, self.new)
    }
}
