//! Field-level comparison between a remote record and its declaration

use crate::record::{DeclaredRecord, FieldChange, RecordField, RemoteRecord};

/// List every tracked field that differs, in value / ttl / type order
///
/// Only value, TTL and type are compared; the name already matched.
pub fn diff(remote: &RemoteRecord, declared: &DeclaredRecord) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if remote.value != declared.value {
        changes.push(FieldChange {
            field: RecordField::Value,
            old: remote.value.clone(),
            new: declared.value.clone(),
        });
    }

    if remote.ttl != declared.ttl {
        changes.push(FieldChange {
            field: RecordField::Ttl,
            old: remote.ttl.to_string(),
            new: declared.ttl.to_string(),
        });
    }

    if remote.record_type != declared.record_type {
        changes.push(FieldChange {
            field: RecordField::Type,
            old: remote.record_type.clone(),
            new: declared.record_type.clone(),
        });
    }

    changes
}
