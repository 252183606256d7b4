// # DNS Provider Trait
//
// Defines the narrow capability surface the reconciler needs from a remote
// DNS provider: list zones, list records, and create / patch / delete single
// records.
//
// ## Implementations
//
// - Cloudflare: `chief-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use chief_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zones = provider.list_zones().await?;
//     let records = provider.list_records(&zones[0]).await?;
//     println!("{} records", records.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::record::{DeclaredRecord, RemoteRecord, Zone};

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (every error is terminal for the run)
/// - ❌ Decide whether a mutation is needed (owned by the reconciler)
/// - ❌ Cache state beyond a single call
/// - ❌ Spawn tasks or threads
///
/// Each mutation method performs exactly one provider-side change. Time
/// budgets and cancellation are applied by the caller.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every zone visible to the configured credentials
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// List every record in a zone
    ///
    /// The result is used once per run as an immutable snapshot, so
    /// implementations must return all pages.
    async fn list_records(&self, zone: &Zone) -> Result<Vec<RemoteRecord>, crate::Error>;

    /// Create a record from a declaration
    async fn create_record(
        &self,
        zone: &Zone,
        record: &DeclaredRecord,
    ) -> Result<(), crate::Error>;

    /// Replace a record wholesale
    ///
    /// `provider_id` identifies the remote record; name, value, type and TTL
    /// are all taken from `record`.
    async fn patch_record(
        &self,
        zone: &Zone,
        provider_id: &str,
        record: &DeclaredRecord,
    ) -> Result<(), crate::Error>;

    /// Delete a record by its provider ID
    async fn delete_record(&self, zone: &Zone, provider_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
