//! Top-level runner
//!
//! Sequences one run: validate the declared set, resolve the zone, take the
//! remote snapshot, then reconcile (sync) or dump the snapshot (import).
//! Every error is returned to the caller; the runner never exits the process.
//!
//! ## Sync Flow
//!
//! 1. Validate the declared set (zero provider calls on failure)
//! 2. `list_zones` and resolve the requested zone
//! 3. `list_records` into an immutable [`RemoteSnapshot`]
//! 4. Reconcile record by record

use std::path::Path;
use tracing::{error, info};

use crate::config::RunSettings;
use crate::error::{Error, Operation, Result};
use crate::matcher::RemoteSnapshot;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::record::{DeclaredRecord, Zone};
use crate::shutdown::{ShutdownSignal, guarded};
use crate::source;
use crate::traits::DnsProvider;
use crate::validate::validate;

/// Pick the requested zone out of the provider's zone list
pub fn resolve_zone(zones: Vec<Zone>, zone_name: &str) -> Result<Zone> {
    if zones.is_empty() {
        return Err(Error::zone_not_found(format!(
            "no zones were found while looking for {}",
            zone_name
        )));
    }

    zones
        .into_iter()
        .find(|zone| zone.name == zone_name)
        .ok_or_else(|| Error::zone_not_found(zone_name))
}

/// Drives sync and import runs against one provider
pub struct Runner {
    provider: Box<dyn DnsProvider>,
    settings: RunSettings,
}

impl Runner {
    /// Create a runner around an injected provider
    pub fn new(provider: Box<dyn DnsProvider>, settings: RunSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { provider, settings })
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Resolve the zone and fetch its records once
    pub async fn fetch_snapshot(
        &self,
        zone_name: &str,
        shutdown: &mut ShutdownSignal,
    ) -> Result<RemoteSnapshot> {
        let timeout = self.settings.call_timeout();

        let zones = guarded(Operation::ListZones, timeout, shutdown, self.provider.list_zones()).await?;
        let zone = resolve_zone(zones, zone_name)?;
        info!("Zone found: {} ({})", zone.name, zone.id);

        let records = guarded(
            Operation::ListRecords,
            timeout,
            shutdown,
            self.provider.list_records(&zone),
        )
        .await?;
        info!(
            "{} remote records found via {}",
            records.len(),
            self.provider.provider_name()
        );

        Ok(RemoteSnapshot::new(zone, records))
    }

    /// Reconcile the declared set against the zone
    pub async fn sync(
        &self,
        zone_name: &str,
        declared: &[DeclaredRecord],
        mut shutdown: ShutdownSignal,
    ) -> Result<ReconcileReport> {
        let validated = validate(declared)?;
        info!("{} local records validated", validated.len());

        let snapshot = self.fetch_snapshot(zone_name, &mut shutdown).await?;

        let mut reconciler = Reconciler::new(self.provider.as_ref(), &self.settings, shutdown);
        match reconciler.reconcile(&snapshot, &validated).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Run aborted, changes so far are kept: {}", reconciler.stats());
                Err(e)
            }
        }
    }

    /// Dump the zone's records to `path` as a declarative baseline
    ///
    /// Returns the number of records written.
    pub async fn import(
        &self,
        zone_name: &str,
        path: &Path,
        mut shutdown: ShutdownSignal,
    ) -> Result<usize> {
        let snapshot = self.fetch_snapshot(zone_name, &mut shutdown).await?;
        let declared = source::snapshot_to_declared(snapshot.records());

        source::write_records(path, &declared).await?;
        info!("{} records imported to {}", declared.len(), path.display());

        Ok(declared.len())
    }
}
