// # Cloudflare DNS Provider
//
// Cloudflare API v4 implementation of the `DnsProvider` capability trait.
//
// ## Behavior
//
// - One HTTP request per mutation (create, patch, delete)
// - Listings follow `result_info.total_pages` until every page is read
// - Every error is returned to the caller; no retries, no backoff
// - Each HTTP request is bounded by the run's call timeout
//
// ## Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the Cloudflare API only
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Implement retry logic
// - ❌ Decide whether a mutation is needed (owned by the reconciler)
// - ❌ Cache state beyond a single request
//
// ## Security Requirements
//
// - Credentials NEVER appear in logs or `Debug` output
// - Provider MUST fail fast if credentials are empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?per_page=50&page=N`
// - List DNS Records: GET `/zones/:zone_id/dns_records?per_page=100&page=N`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use chief_core::config::{CloudflareCredentials, ProviderConfig};
use chief_core::record::{DeclaredRecord, RemoteRecord, Zone};
use chief_core::traits::{DnsProvider, DnsProviderFactory};
use chief_core::{Error, Operation, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ZONES_PER_PAGE: u32 = 50;
const RECORDS_PER_PAGE: u32 = 100;

const PROVIDER_NAME: &str = "cloudflare";

/// Standard v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default = "first_page")]
    total_pages: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct ApiZone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    ttl: u32,
}

impl From<ApiRecord> for RemoteRecord {
    fn from(record: ApiRecord) -> Self {
        RemoteRecord {
            name: record.name,
            value: record.content,
            record_type: record.record_type,
            ttl: record.ttl,
            provider_id: record.id,
        }
    }
}

/// Request body for create and patch; always the whole record
#[derive(Debug, Serialize)]
struct RecordBody<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
}

impl<'a> From<&'a DeclaredRecord> for RecordBody<'a> {
    fn from(record: &'a DeclaredRecord) -> Self {
        RecordBody {
            record_type: &record.record_type,
            name: &record.name,
            content: &record.value,
            ttl: record.ttl,
        }
    }
}

/// Cloudflare DNS provider
///
/// Stateless apart from the HTTP client. The Debug implementation never
/// exposes credentials.
pub struct CloudflareProvider {
    /// ⚠️ NEVER log this value
    credentials: CloudflareCredentials,

    /// API base URL, without a trailing slash
    base_url: String,

    /// Budget for one HTTP request
    request_timeout: Duration,

    client: reqwest::Client,
}

impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// `base_url` overrides the public API endpoint; `None` uses
    /// `https://api.cloudflare.com/client/v4`. `request_timeout` bounds every
    /// HTTP request and should match the run's call timeout.
    pub fn new(
        credentials: CloudflareCredentials,
        base_url: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .as_deref()
            .unwrap_or(CLOUDFLARE_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            credentials,
            base_url,
            request_timeout,
            client,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            CloudflareCredentials::ApiToken { token } => request.bearer_auth(token),
            CloudflareCredentials::GlobalKey { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        }
    }

    /// Send one request and unwrap the v4 envelope
    async fn send<T: DeserializeOwned>(&self, operation: Operation, request: RequestBuilder) -> Result<Envelope<T>> {
        let response = self
            .authorize(request)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        operation,
                        timeout: self.request_timeout,
                    }
                } else {
                    Error::http(format!("{} request failed: {}", operation, e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        if !status.is_success() {
            let detail = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .map(|envelope| join_messages(&envelope.errors))
                .ok()
                .filter(|messages| !messages.is_empty())
                .unwrap_or(body);
            return Err(status_error(status, operation, &detail));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Failed to parse {} response: {}", operation, e))
        })?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("{} failed: {}", operation, join_messages(&envelope.errors)),
            ));
        }

        Ok(envelope)
    }

    /// Read every page of a listing endpoint
    async fn list_all<T: DeserializeOwned>(&self, operation: Operation, path: &str, per_page: u32) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let url = format!("{}{}?per_page={}&page={}", self.base_url, path, per_page, page);
            let envelope: Envelope<Vec<T>> = self.send(operation, self.client.get(&url)).await?;

            let total_pages = envelope.result_info.map_or(1, |info| info.total_pages);
            items.extend(envelope.result.unwrap_or_default());

            tracing::debug!("{}: page {} of {}", operation, page, total_pages);
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    fn records_url(&self, zone: &Zone) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone.id)
    }

    fn record_url(&self, zone: &Zone, provider_id: &str) -> String {
        format!("{}/{}", self.records_url(zone), provider_id)
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: StatusCode, operation: Operation, detail: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid credentials or insufficient permissions. Status: {}",
            operation, status
        )),
        404 => Error::not_found(format!("{}: {}", operation, detail)),
        429 => Error::rate_limited(format!("{}: Status: {}", operation, status)),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("{}: Cloudflare server error: {} - {}", operation, status, detail),
        ),
        _ => Error::provider(PROVIDER_NAME, format!("{} failed: {} - {}", operation, status, detail)),
    }
}

fn join_messages(messages: &[ApiMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{} (code {})", m.message, m.code))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let zones: Vec<ApiZone> = self.list_all(Operation::ListZones, "/zones", ZONES_PER_PAGE).await?;
        tracing::debug!("Cloudflare returned {} zones", zones.len());

        Ok(zones.into_iter().map(|z| Zone::new(z.id, z.name)).collect())
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<RemoteRecord>> {
        let path = format!("/zones/{}/dns_records", zone.id);
        let records: Vec<ApiRecord> = self.list_all(Operation::ListRecords, &path, RECORDS_PER_PAGE).await?;

        Ok(records.into_iter().map(RemoteRecord::from).collect())
    }

    async fn create_record(&self, zone: &Zone, record: &DeclaredRecord) -> Result<()> {
        let request = self.client.post(self.records_url(zone)).json(&RecordBody::from(record));
        let _: Envelope<serde_json::Value> = self.send(Operation::CreateRecord, request).await?;

        tracing::debug!("Cloudflare created {} in {}", record.name, zone.name);
        Ok(())
    }

    async fn patch_record(&self, zone: &Zone, provider_id: &str, record: &DeclaredRecord) -> Result<()> {
        let request = self
            .client
            .patch(self.record_url(zone, provider_id))
            .json(&RecordBody::from(record));
        let _: Envelope<serde_json::Value> = self.send(Operation::PatchRecord, request).await?;

        tracing::debug!("Cloudflare patched {} ({})", record.name, provider_id);
        Ok(())
    }

    async fn delete_record(&self, zone: &Zone, provider_id: &str) -> Result<()> {
        let request = self.client.delete(self.record_url(zone, provider_id));
        let _: Envelope<serde_json::Value> = self.send(Operation::DeleteRecord, request).await?;

        tracing::debug!("Cloudflare deleted {} in {}", provider_id, zone.name);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                credentials,
                base_url,
                request_timeout_secs,
            } => {
                let provider = CloudflareProvider::new(
                    credentials.clone(),
                    base_url.clone(),
                    Duration::from_secs(*request_timeout_secs),
                )?;
                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use chief_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// chief_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &chief_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(CloudflareFactory));
}
