//! Core traits for chief
//!
//! - [`DnsProvider`]: Read and mutate records at a remote DNS provider
//! - [`DnsProviderFactory`]: Build a provider from configuration

pub mod dns_provider;

pub use dns_provider::{DnsProvider, DnsProviderFactory};
