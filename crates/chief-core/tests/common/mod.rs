//! Test doubles and common utilities for contract tests
//!
//! The recording provider keeps every call in a shared log so tests can
//! assert exactly which mutations were issued, in which order.

#![allow(dead_code)]

use async_trait::async_trait;
use chief_core::error::{Error, Result};
use chief_core::record::{DeclaredRecord, RemoteRecord, Zone};
use chief_core::traits::DnsProvider;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ZONE_ID: &str = "zone-1";
pub const ZONE_NAME: &str = "example.com";

/// One observed provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ListZones,
    ListRecords {
        zone_id: String,
    },
    Create {
        zone_id: String,
        record: DeclaredRecord,
    },
    Patch {
        zone_id: String,
        provider_id: String,
        record: DeclaredRecord,
    },
    Delete {
        zone_id: String,
        provider_id: String,
    },
}

impl ProviderCall {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ProviderCall::Create { .. } | ProviderCall::Patch { .. } | ProviderCall::Delete { .. }
        )
    }
}

#[derive(Debug, Default)]
struct Behavior {
    /// Zero-based index of the mutation that fails
    fail_mutation_at: Option<usize>,
    fail_listing: bool,
    delay: Option<Duration>,
    mutation_delay: Option<Duration>,
}

/// A fake DnsProvider that records every call
///
/// Clones share the same zones, records and call log.
#[derive(Clone)]
pub struct RecordingProvider {
    zones: Arc<Vec<Zone>>,
    records: Arc<Vec<RemoteRecord>>,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    behavior: Arc<Mutex<Behavior>>,
}

impl RecordingProvider {
    /// A provider holding `example.com` with the given records
    pub fn new(records: Vec<RemoteRecord>) -> Self {
        Self::with_zones(vec![Zone::new(ZONE_ID, ZONE_NAME)], records)
    }

    pub fn with_zones(zones: Vec<Zone>, records: Vec<RemoteRecord>) -> Self {
        Self {
            zones: Arc::new(zones),
            records: Arc::new(records),
            calls: Arc::new(Mutex::new(Vec::new())),
            behavior: Arc::new(Mutex::new(Behavior::default())),
        }
    }

    /// Make the nth mutation (zero-based) fail
    pub fn failing_mutation_at(self, index: usize) -> Self {
        self.behavior.lock().unwrap().fail_mutation_at = Some(index);
        self
    }

    /// Make `list_records` fail
    pub fn failing_listing(self) -> Self {
        self.behavior.lock().unwrap().fail_listing = true;
        self
    }

    /// Delay every call by `delay`
    pub fn with_delay(self, delay: Duration) -> Self {
        self.behavior.lock().unwrap().delay = Some(delay);
        self
    }

    /// Delay only create, patch and delete calls by `delay`
    pub fn with_mutation_delay(self, delay: Duration) -> Self {
        self.behavior.lock().unwrap().mutation_delay = Some(delay);
        self
    }

    pub fn boxed(&self) -> Box<dyn DnsProvider> {
        Box::new(self.clone())
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<ProviderCall> {
        self.calls().into_iter().filter(ProviderCall::is_mutation).collect()
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations().len()
    }

    async fn observe(&self, call: ProviderCall) -> Result<()> {
        let is_mutation = call.is_mutation();
        let (delay, mutation_delay) = {
            let behavior = self.behavior.lock().unwrap();
            (behavior.delay, behavior.mutation_delay)
        };
        let delay = if is_mutation { mutation_delay.or(delay) } else { delay };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut calls = self.calls.lock().unwrap();
        let mutation_index = calls.iter().filter(|c| c.is_mutation()).count();
        calls.push(call);

        let fail_at = self.behavior.lock().unwrap().fail_mutation_at;
        if is_mutation && fail_at == Some(mutation_index) {
            return Err(Error::provider("recording", "injected mutation failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for RecordingProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.observe(ProviderCall::ListZones).await?;
        Ok(self.zones.as_ref().clone())
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<RemoteRecord>> {
        self.observe(ProviderCall::ListRecords {
            zone_id: zone.id.clone(),
        })
        .await?;

        if self.behavior.lock().unwrap().fail_listing {
            return Err(Error::provider("recording", "injected listing failure"));
        }
        Ok(self.records.as_ref().clone())
    }

    async fn create_record(&self, zone: &Zone, record: &DeclaredRecord) -> Result<()> {
        self.observe(ProviderCall::Create {
            zone_id: zone.id.clone(),
            record: record.clone(),
        })
        .await
    }

    async fn patch_record(&self, zone: &Zone, provider_id: &str, record: &DeclaredRecord) -> Result<()> {
        self.observe(ProviderCall::Patch {
            zone_id: zone.id.clone(),
            provider_id: provider_id.to_string(),
            record: record.clone(),
        })
        .await
    }

    async fn delete_record(&self, zone: &Zone, provider_id: &str) -> Result<()> {
        self.observe(ProviderCall::Delete {
            zone_id: zone.id.clone(),
            provider_id: provider_id.to_string(),
        })
        .await
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Build a remote record in `example.com`
pub fn remote(name: &str, value: &str, record_type: &str, ttl: u32, provider_id: &str) -> RemoteRecord {
    RemoteRecord {
        name: name.to_string(),
        value: value.to_string(),
        record_type: record_type.to_string(),
        ttl,
        provider_id: provider_id.to_string(),
    }
}
