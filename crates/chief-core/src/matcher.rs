//! Record matching
//!
//! Pairs a declared record with its remote counterpart by name only. Value,
//! type and TTL are left out of the key because they are exactly what
//! reconciliation may change.
//!
//! Matches are returned as [`RecordHandle`]s, stable indices into an
//! immutable [`RemoteSnapshot`].

use crate::record::{DeclaredRecord, RemoteRecord, Zone};
use tracing::{debug, warn};

/// Stable index of a record inside a [`RemoteSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHandle(usize);

impl RecordHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Point-in-time view of a zone's records, fetched once per run
#[derive(Debug, Clone)]
pub struct RemoteSnapshot {
    zone: Zone,
    records: Vec<RemoteRecord>,
}

impl RemoteSnapshot {
    pub fn new(zone: Zone, records: Vec<RemoteRecord>) -> Self {
        Self { zone, records }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn records(&self) -> &[RemoteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a handle produced by [`find_match`] on this snapshot
    pub fn get(&self, handle: RecordHandle) -> &RemoteRecord {
        &self.records[handle.0]
    }
}

/// Returns true if `remote_name` names the same entity as `declared_name`
///
/// A remote name matches either the bare declared name or its
/// fully-qualified form `name.zone`.
pub fn names_match(remote_name: &str, declared_name: &str, zone_suffix: &str) -> bool {
    if remote_name == declared_name {
        return true;
    }

    remote_name
        .strip_prefix(declared_name)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|suffix| suffix == zone_suffix)
}

/// Find the remote counterpart of a declared record
///
/// When several remote records share the name, the first one identical to
/// the declaration (type, value and TTL) wins, then the first with the same
/// type and value, then the first of the same type, then the first in
/// snapshot order. Multi-valued sets such as
/// several MX records under one name therefore pair up one to one when
/// nothing changed.
pub fn find_match(
    snapshot: &RemoteSnapshot,
    declared: &DeclaredRecord,
    zone_suffix: &str,
) -> Option<RecordHandle> {
    let candidates: Vec<usize> = snapshot
        .records
        .iter()
        .enumerate()
        .filter(|(_, remote)| names_match(&remote.name, &declared.name, zone_suffix))
        .map(|(idx, _)| idx)
        .collect();

    let first = *candidates.first()?;

    if candidates.len() == 1 {
        debug!(
            "Matched {} to remote record {}",
            declared.name, snapshot.records[first].provider_id
        );
        return Some(RecordHandle(first));
    }

    let same_type = |idx: &usize| {
        !declared.record_type.is_empty() && snapshot.records[*idx].record_type == declared.record_type
    };
    let same_value = |idx: &usize| same_type(idx) && snapshot.records[*idx].value == declared.value;
    let identical = |idx: &usize| same_value(idx) && snapshot.records[*idx].ttl == declared.ttl;

    // Members of a multi-valued set that did not change pair up quietly
    if let Some(exact) = candidates.iter().copied().find(|idx| identical(idx)) {
        debug!(
            "Matched {} to identical remote record {} among {} candidates",
            declared.name,
            snapshot.records[exact].provider_id,
            candidates.len()
        );
        return Some(RecordHandle(exact));
    }

    let chosen = candidates
        .iter()
        .copied()
        .find(|idx| same_value(idx))
        .or_else(|| candidates.iter().copied().find(|idx| same_type(idx)))
        .unwrap_or(first);

    warn!(
        "{} remote records share the name {}: [{}]; using {} ({})",
        candidates.len(),
        declared.name,
        candidates
            .iter()
            .map(|&idx| format!(
                "{} {}",
                snapshot.records[idx].record_type, snapshot.records[idx].provider_id
            ))
            .collect::<Vec<_>>()
            .join(", "),
        snapshot.records[chosen].provider_id,
        snapshot.records[chosen].record_type,
    );

    Some(RecordHandle(chosen))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(name: &str, value: &str, record_type: &str, id: &str) -> RemoteRecord {
        RemoteRecord {
            name: name.to_string(),
            value: value.to_string(),
            record_type: record_type.to_string(),
            ttl: 300,
            provider_id: id.to_string(),
        }
    }

    fn snapshot(records: Vec<RemoteRecord>) -> RemoteSnapshot {
        RemoteSnapshot::new(Zone::new("zone-1", "example.com"), records)
    }

    #[test]
    fn test_names_match() {
        assert!(names_match("www", "www", "example.com"));
        assert!(names_match("www.example.com", "www", "example.com"));
        assert!(names_match("example.com", "example.com", "example.com"));
        assert!(!names_match("www.example.org", "www", "example.com"));
        assert!(!names_match("wwwexample.com", "www", "example.com"));
        assert!(!names_match("api.example.com", "www", "example.com"));
        assert!(!names_match("www", "www.example.com", "example.com"));
    }

    #[test]
    fn test_match_by_fqdn() {
        let snap = snapshot(vec![
            remote("api.example.com", "9.9.9.9", "A", "r1"),
            remote("www.example.com", "1.2.3.4", "A", "r2"),
        ]);

        let handle = find_match(&snap, &DeclaredRecord::absent("www"), "example.com").unwrap();
        assert_eq!(snap.get(handle).provider_id, "r2");
    }

    #[test]
    fn test_match_ignores_value_ttl_and_type() {
        let snap = snapshot(vec![remote("www.example.com", "1.2.3.4", "A", "r1")]);
        let declared = DeclaredRecord::present("www", "5.6.7.8", "CNAME", 60);

        let handle = find_match(&snap, &declared, "example.com").unwrap();
        assert_eq!(handle.index(), 0);
    }

    #[test]
    fn test_no_match() {
        let snap = snapshot(vec![remote("www.example.com", "1.2.3.4", "A", "r1")]);

        assert!(find_match(&snap, &DeclaredRecord::absent("api"), "example.com").is_none());
        assert!(find_match(&snapshot(vec![]), &DeclaredRecord::absent("www"), "example.com").is_none());
    }

    #[test]
    fn test_each_declared_record_gets_its_own_match() {
        let snap = snapshot(vec![
            remote("a.example.com", "1.1.1.1", "A", "r1"),
            remote("b.example.com", "2.2.2.2", "A", "r2"),
            remote("c.example.com", "3.3.3.3", "A", "r3"),
        ]);

        let ids: Vec<&str> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let handle = find_match(&snap, &DeclaredRecord::absent(*name), "example.com").unwrap();
                snap.get(handle).provider_id.as_str()
            })
            .collect();

        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_duplicates_prefer_type_match() {
        let snap = snapshot(vec![
            remote("mail.example.com", "v=spf1 -all", "TXT", "r1"),
            remote("mail.example.com", "10.0.0.1", "A", "r2"),
        ]);
        let declared = DeclaredRecord::present("mail", "10.0.0.2", "A", 300);

        let handle = find_match(&snap, &declared, "example.com").unwrap();
        assert_eq!(snap.get(handle).provider_id, "r2");
    }

    #[test]
    fn test_duplicates_prefer_identical_record() {
        let snap = snapshot(vec![
            remote("example.com", "mx1.example.net", "MX", "rec-mx1"),
            remote("example.com", "mx2.example.net", "MX", "rec-mx2"),
        ]);

        let first = DeclaredRecord::present("example.com", "mx1.example.net", "MX", 300);
        let second = DeclaredRecord::present("example.com", "mx2.example.net", "MX", 300);

        let handle = find_match(&snap, &first, "example.com").unwrap();
        assert_eq!(snap.get(handle).provider_id, "rec-mx1");
        let handle = find_match(&snap, &second, "example.com").unwrap();
        assert_eq!(snap.get(handle).provider_id, "rec-mx2");
    }

    #[test]
    fn test_duplicates_prefer_same_value_then_type() {
        let snap = snapshot(vec![
            remote("mail.example.com", "v=spf1 -all", "TXT", "r1"),
            remote("mail.example.com", "10.0.0.1", "A", "r2"),
            remote("mail.example.com", "10.0.0.3", "A", "r3"),
        ]);

        // Same value, different TTL: the A record holding that value wins
        let declared = DeclaredRecord::present("mail", "10.0.0.3", "A", 60);
        let handle = find_match(&snap, &declared, "example.com").unwrap();
        assert_eq!(snap.get(handle).provider_id, "r3");

        // New value: first A record wins
        let declared = DeclaredRecord::present("mail", "10.0.0.9", "A", 300);
        let handle = find_match(&snap, &declared, "example.com").unwrap();
        assert_eq!(snap.get(handle).provider_id, "r2");
    }

    #[test]
    fn test_duplicates_fall_back_to_snapshot_order() {
        let snap = snapshot(vec![
            remote("mail.example.com", "v=spf1 -all", "TXT", "r1"),
            remote("mail.example.com", "10.0.0.1", "A", "r2"),
        ]);

        let handle = find_match(&snap, &DeclaredRecord::absent("mail"), "example.com").unwrap();
        assert_eq!(snap.get(handle).provider_id, "r1");

        let declared = DeclaredRecord::present("mail", "mx.example.net", "MX", 300);
        let handle = find_match(&snap, &declared, "example.com").unwrap();
        assert_eq!(snap.get(handle).provider_id, "r1");
    }
}
