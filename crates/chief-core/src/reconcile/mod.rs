//! Reconciler
//!
//! Walks the validated declared set once, in order, and issues at most one
//! mutation per record.
//!
//! ## Decision table
//!
//! ```text
//! state    remote match   fields differ   action
//! -------  -------------  --------------  ---------------
//! present  none           -               create
//! present  found          yes             patch (whole record)
//! present  found          no              no-op
//! absent   none           -               skip
//! absent   found          -               delete
//! ```
//!
//! ## Failure semantics
//!
//! The first failed mutation aborts the pass. Mutations already issued stay
//! applied; nothing is rolled back and nothing is retried.

mod diff;

pub use diff::diff;

use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RunSettings;
use crate::error::{Error, Operation, Result};
use crate::matcher::{RemoteSnapshot, find_match};
use crate::record::{DeclaredRecord, DesiredState, FieldChange, RemoteRecord, Zone};
use crate::shutdown::{ShutdownSignal, guarded};
use crate::stats::{RunStats, StatsCollector};
use crate::traits::DnsProvider;
use crate::validate::ValidatedRecord;

/// What the reconciler decided to do for one declared record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    /// No remote counterpart; create it
    Create,
    /// Counterpart differs; replace it with the declaration
    Patch {
        provider_id: String,
        changes: Vec<FieldChange>,
    },
    /// Counterpart exists but should not
    Delete { provider_id: String },
    /// Counterpart already matches
    NoOp,
    /// Nothing to delete
    SkipMissing,
}

/// Decide the action for one record
///
/// Pure: no I/O, no logging.
pub fn plan(state: DesiredState, declared: &DeclaredRecord, matched: Option<&RemoteRecord>) -> PlannedAction {
    match (state, matched) {
        (DesiredState::Present, None) => PlannedAction::Create,
        (DesiredState::Present, Some(remote)) => {
            let changes = diff(remote, declared);
            if changes.is_empty() {
                PlannedAction::NoOp
            } else {
                PlannedAction::Patch {
                    provider_id: remote.provider_id.clone(),
                    changes,
                }
            }
        }
        (DesiredState::Absent, None) => PlannedAction::SkipMissing,
        (DesiredState::Absent, Some(remote)) => PlannedAction::Delete {
            provider_id: remote.provider_id.clone(),
        },
    }
}

/// Result of processing one declared record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Created { name: String },
    Patched { name: String, changes: Vec<FieldChange> },
    Deleted { name: String },
    NoOp { name: String },
    SkippedMissing { name: String },
}

impl ActionOutcome {
    /// Name of the declared record
    pub fn name(&self) -> &str {
        match self {
            ActionOutcome::Created { name }
            | ActionOutcome::Patched { name, .. }
            | ActionOutcome::Deleted { name }
            | ActionOutcome::NoOp { name }
            | ActionOutcome::SkippedMissing { name } => name,
        }
    }

    /// Whether this outcome involved a provider mutation
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ActionOutcome::Created { .. } | ActionOutcome::Patched { .. } | ActionOutcome::Deleted { .. }
        )
    }
}

/// Advisory raised when declared and remote cardinalities differ
///
/// Remote records that are not declared at all cannot be expressed by a
/// sync pass; re-importing captures them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftAdvisory {
    pub declared: usize,
    pub remote: usize,
}

impl fmt::Display for DriftAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} local records vs {} remote records; consider running import to sync up differences",
            self.declared, self.remote
        )
    }
}

/// Everything a finished pass produced
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// One outcome per declared record, in input order
    pub outcomes: Vec<ActionOutcome>,
    pub stats: RunStats,
    pub drift: Option<DriftAdvisory>,
    /// True if no mutation was actually sent
    pub dry_run: bool,
}

/// Applies a validated declared set against a remote snapshot
///
/// The provider is injected; the reconciler holds no other state than its
/// running statistics.
pub struct Reconciler<'p> {
    provider: &'p dyn DnsProvider,
    call_timeout: Duration,
    dry_run: bool,
    shutdown: ShutdownSignal,
    stats: StatsCollector,
}

impl<'p> Reconciler<'p> {
    pub fn new(provider: &'p dyn DnsProvider, settings: &RunSettings, shutdown: ShutdownSignal) -> Self {
        Self {
            provider,
            call_timeout: settings.call_timeout(),
            dry_run: settings.dry_run,
            shutdown,
            stats: StatsCollector::start(),
        }
    }

    /// Statistics so far; also meaningful after an aborted pass
    pub fn stats(&self) -> RunStats {
        self.stats.snapshot()
    }

    /// Run one pass over the declared set
    pub async fn reconcile(
        &mut self,
        snapshot: &RemoteSnapshot,
        declared: &[ValidatedRecord<'_>],
    ) -> Result<ReconcileReport> {
        let zone = snapshot.zone();
        let mut outcomes = Vec::with_capacity(declared.len());

        info!(
            "Reconciling {} local records against {} remote records in {}{}",
            declared.len(),
            snapshot.len(),
            zone.name,
            if self.dry_run { " [dry-run]" } else { "" }
        );

        for item in declared {
            if self.shutdown.is_triggered() {
                return Err(Error::Cancelled(format!(
                    "stopped before reconciling {}",
                    item.record.name
                )));
            }

            let matched = find_match(snapshot, item.record, &zone.name).map(|handle| snapshot.get(handle));
            let action = plan(item.state, item.record, matched);
            let outcome = self.apply(zone, item.record, action).await?;

            self.stats.record(&outcome);
            outcomes.push(outcome);
        }

        let drift = (declared.len() != snapshot.len()).then(|| DriftAdvisory {
            declared: declared.len(),
            remote: snapshot.len(),
        });
        if let Some(advisory) = drift {
            warn!("{}", advisory);
        }

        let stats = self.stats.snapshot();
        info!("Reconciliation finished: {}", stats);

        Ok(ReconcileReport {
            outcomes,
            stats,
            drift,
            dry_run: self.dry_run,
        })
    }

    /// Carry out one planned action
    async fn apply(&mut self, zone: &Zone, record: &DeclaredRecord, action: PlannedAction) -> Result<ActionOutcome> {
        let marker = if self.dry_run { "[dry-run] " } else { "" };
        let name = record.name.clone();

        match action {
            PlannedAction::Create => {
                info!(
                    "{}Creating {} {} ({}) ttl={}: not present in remote",
                    marker, record.record_type, name, record.value, record.ttl
                );
                let provider = self.provider;
                self.mutate(Operation::CreateRecord, &name, provider.create_record(zone, record))
                    .await?;
                info!("{}Created {}", marker, name);
                Ok(ActionOutcome::Created { name })
            }
            PlannedAction::Patch { provider_id, changes } => {
                for change in &changes {
                    info!("{}Patching {} :: {}", marker, name, change);
                }
                let provider = self.provider;
                self.mutate(
                    Operation::PatchRecord,
                    &name,
                    provider.patch_record(zone, &provider_id, record),
                )
                .await?;
                info!("{}Patched {}", marker, name);
                Ok(ActionOutcome::Patched { name, changes })
            }
            PlannedAction::Delete { provider_id } => {
                info!("{}Deleting {} ({})", marker, name, provider_id);
                let provider = self.provider;
                self.mutate(Operation::DeleteRecord, &name, provider.delete_record(zone, &provider_id))
                    .await?;
                info!("{}Deleted {}", marker, name);
                Ok(ActionOutcome::Deleted { name })
            }
            PlannedAction::NoOp => {
                debug!("{} is up to date", name);
                Ok(ActionOutcome::NoOp { name })
            }
            PlannedAction::SkipMissing => {
                info!("Cannot find remote record for {}, skipping delete", name);
                Ok(ActionOutcome::SkippedMissing { name })
            }
        }
    }

    /// Issue one mutation, unless in dry-run mode
    async fn mutate<F>(&mut self, operation: Operation, record: &str, call: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<()>>,
    {
        if self.dry_run {
            return Ok(());
        }

        guarded(operation, self.call_timeout, &mut self.shutdown, call)
            .await
            .map_err(|e| match e {
                Error::Cancelled(_) => e,
                other => Error::mutation(operation, record, other),
            })
    }
}
