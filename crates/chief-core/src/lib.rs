// # chief-core
//
// Reconciliation engine for declaratively managed DNS zones.
//
// ## Architecture Overview
//
// - **Matcher**: pairs a declared record with its remote counterpart by name
// - **Validator**: rejects the whole declared set if any state is unrecognized
// - **Reconciler**: decides create / patch / delete / no-op / skip per record
//   and issues at most one provider mutation for it
// - **Stats**: counts mutations and measures the pass
// - **DnsProvider**: the narrow provider capability surface the core calls
// - **Runner**: sequences validation, snapshot and reconciliation for a run
//
// ## Design Principles
//
// 1. **Validate, then act**: no mutation happens unless every record is valid
// 2. **Sequential**: records are processed one at a time, in input order
// 3. **Fail fast**: the first error ends the run; nothing is rolled back
// 4. **Injected provider**: no ambient client state, fakes in tests

pub mod config;
pub mod error;
pub mod matcher;
pub mod reconcile;
pub mod record;
pub mod registry;
pub mod runner;
pub mod shutdown;
pub mod source;
pub mod stats;
pub mod traits;
pub mod validate;

// Re-export core types for convenience
pub use config::{CloudflareCredentials, ProviderConfig, RunSettings};
pub use error::{Error, ErrorCategory, Operation, Result};
pub use matcher::{RecordHandle, RemoteSnapshot, find_match};
pub use reconcile::{ActionOutcome, DriftAdvisory, PlannedAction, ReconcileReport, Reconciler};
pub use record::{DeclaredRecord, DesiredState, FieldChange, RecordField, RemoteRecord, Zone};
pub use registry::ProviderRegistry;
pub use runner::{Runner, resolve_zone};
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use stats::RunStats;
pub use traits::{DnsProvider, DnsProviderFactory};
pub use validate::{ValidatedRecord, validate};
