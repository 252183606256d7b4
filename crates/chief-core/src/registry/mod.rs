//! Plugin-based provider registry
//!
//! The registry allows DNS providers to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in the binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chief_core::registry::ProviderRegistry;
//! use chief_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! chief_provider_cloudflare::register(&registry);
//!
//! let config = ProviderConfig::Cloudflare { ... };
//! let provider = registry.create_provider(&config)?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Provider registry for plugin-based DNS provider creation
///
/// Maps provider type names to factories. Uses interior mutability with
/// RwLock, allowing concurrent reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory under a type name
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.insert(name.into(), factory);
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If the configuration is invalid, the provider type is
    ///   not registered, or the factory fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        config.validate()?;

        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DeclaredRecord, RemoteRecord, Zone};
    use async_trait::async_trait;

    struct NullProvider;

    #[async_trait]
    impl DnsProvider for NullProvider {
        async fn list_zones(&self) -> Result<Vec<Zone>> {
            Ok(Vec::new())
        }

        async fn list_records(&self, _zone: &Zone) -> Result<Vec<RemoteRecord>> {
            Ok(Vec::new())
        }

        async fn create_record(&self, _zone: &Zone, _record: &DeclaredRecord) -> Result<()> {
            Ok(())
        }

        async fn patch_record(&self, _zone: &Zone, _id: &str, _record: &DeclaredRecord) -> Result<()> {
            Ok(())
        }

        async fn delete_record(&self, _zone: &Zone, _id: &str) -> Result<()> {
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "null"
        }
    }

    struct NullProviderFactory;

    impl DnsProviderFactory for NullProviderFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
            Ok(Box::new(NullProvider))
        }
    }

    fn custom(factory: &str) -> ProviderConfig {
        ProviderConfig::Custom {
            factory: factory.to_string(),
            settings: HashMap::new(),
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ProviderRegistry::new();

        // Initially empty
        assert!(!registry.has_provider("null"));

        registry.register_provider("null", Box::new(NullProviderFactory));

        assert!(registry.has_provider("null"));
        assert_eq!(registry.list_providers(), vec!["null".to_string()]);
    }

    #[test]
    fn test_create_registered_provider() {
        let registry = ProviderRegistry::new();
        registry.register_provider("null", Box::new(NullProviderFactory));

        let provider = registry.create_provider(&custom("null")).unwrap();
        assert_eq!(provider.provider_name(), "null");
    }

    #[test]
    fn test_unknown_provider_type() {
        let registry = ProviderRegistry::new();

        match registry.create_provider(&custom("route53")) {
            Err(Error::Config(msg)) => assert!(msg.contains("route53")),
            Err(other) => panic!("expected config error, got {:?}", other),
            Ok(_) => panic!("expected config error"),
        }
    }
}
