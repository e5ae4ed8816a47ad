// # Cloudflare Directory Client
//
// This crate provides the Cloudflare API v4 implementation of
// `zonecheck_core::DirectoryClient`.
//
// ## Behavior
//
// - One HTTP request per trait call (listing follows pagination)
// - No retries, no backoff, no caching: the caller decides what is fatal
// - 30 second request timeout
// - Create and update hand back the parsed envelope even on an error
//   status, so the caller sees the success flag and the error list
// - Reads and deletes turn an unsuccessful envelope into an error, with
//   "record does not exist" mapped to `Error::NotFound`
//
// ## Security Requirements
//
// - Credentials NEVER appear in logs or `Debug` output
// - Credentials are provided via environment variables only
// - The client fails fast if a credential is empty
//
// ## Request Tracing
//
// When a `RequestObserver` is attached, the client reports name resolution
// (through a custom resolver), every outgoing header (secrets redacted),
// the peer address of the connection and the response status.
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - User details: GET `/user`
// - List zones: GET `/zones?name=...`
// - Zone details: GET `/zones/:zone_id`
// - List DNS records: GET `/zones/:zone_id/dns_records?page=...&per_page=...`
// - Create DNS record: POST `/zones/:zone_id/dns_records`
// - Update DNS record: PUT `/zones/:zone_id/dns_records/:record_id`
// - DNS record details: GET `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS record: DELETE `/zones/:zone_id/dns_records/:record_id`

mod envelope;
mod resolver;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use zonecheck_core::traits::{
    DirectoryClient, DnsRecord, NewRecord, NoopObserver, RecordResponse, RequestEvent,
    RequestObserver, User, Zone, redact_header,
};
use zonecheck_core::{Credentials, Error, Result};

use crate::envelope::Envelope;
use crate::resolver::ObservedResolver;

/// Provider name used in errors and logs
pub const PROVIDER_NAME: &str = "cloudflare";

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size used when listing records
const RECORDS_PER_PAGE: u32 = 100;

/// Cloudflare API v4 client
///
/// Stateless apart from the HTTP connection pool. Every method maps to one
/// documented endpoint.
///
/// # Security
///
/// The Debug implementation does NOT expose the API token or key.
pub struct CloudflareClient {
    /// ⚠️ NEVER log this value
    credentials: Credentials,

    /// API base URL without a trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Receives request lifecycle events
    observer: Arc<dyn RequestObserver>,
}

impl std::fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("credentials", &self.credentials.kind())
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Builder for [`CloudflareClient`]
pub struct CloudflareClientBuilder {
    credentials: Credentials,
    api_base: String,
    timeout: Duration,
    observer: Option<Arc<dyn RequestObserver>>,
    no_proxy: bool,
}

impl CloudflareClientBuilder {
    /// Override the API base URL
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report request lifecycle events to `observer`
    ///
    /// Also installs a resolver that reports name lookups.
    pub fn observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Ignore proxy settings from the environment
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    /// Validate the settings and build the client
    ///
    /// # Errors
    ///
    /// - `Error::Config` if a credential is empty or the base URL is not HTTP(S)
    /// - `Error::Http` if the HTTP client cannot be initialized
    pub fn build(self) -> Result<CloudflareClient> {
        self.credentials.validate()?;

        let api_base = self.api_base.trim_end_matches('/').to_string();
        if !api_base.starts_with("https://") && !api_base.starts_with("http://") {
            return Err(Error::config(format!(
                "API base URL must start with http:// or https://: {}",
                api_base
            )));
        }

        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if self.no_proxy {
            builder = builder.no_proxy();
        }
        let observer: Arc<dyn RequestObserver> = match self.observer {
            Some(observer) => {
                builder = builder.dns_resolver(Arc::new(ObservedResolver::new(Arc::clone(
                    &observer,
                ))));
                observer
            }
            None => Arc::new(NoopObserver),
        };

        let client = builder
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(CloudflareClient {
            credentials: self.credentials,
            api_base,
            client,
            observer,
        })
    }
}

impl CloudflareClient {
    /// Create a client for the public API with default settings
    ///
    /// # Parameters
    ///
    /// - `credentials`: API token (Zone:DNS:Edit) or global API key and email
    ///
    /// # Security
    ///
    /// The credentials will NEVER be logged or displayed in error messages.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder(credentials).build()
    }

    /// Start building a client
    pub fn builder(credentials: Credentials) -> CloudflareClientBuilder {
        CloudflareClientBuilder {
            credentials,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
            observer: None,
            no_proxy: false,
        }
    }

    /// API base URL in use
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::ApiToken(token) => builder.bearer_auth(token),
            Credentials::ApiKey { key, email } => builder
                .header("X-Auth-Key", key)
                .header("X-Auth-Email", email),
        }
    }

    fn report_headers(&self, request: &reqwest::Request) {
        for (name, value) in request.headers() {
            let value = value.to_str().unwrap_or("<binary>");
            self.observer.observe(&RequestEvent::HeaderWritten {
                name: name.as_str().to_string(),
                value: redact_header(name.as_str(), value),
            });
        }
    }

    /// Send one request and return the status and raw body
    async fn send(
        &self,
        method: Method,
        path: &str,
        record: Option<&NewRecord>,
    ) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.api_base, path);

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        builder = self.authorize(builder);
        if let Some(record) = record {
            builder = builder.json(record);
        }
        let request = builder
            .build()
            .map_err(|e| Error::http(format!("Failed to build request: {}", e)))?;

        self.report_headers(&request);

        let started = Instant::now();
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| Error::http(format!("{} {} failed: {}", method, path, e)))?;

        let status = response.status();
        self.observer.observe(&RequestEvent::ConnectionAcquired {
            remote_addr: response.remote_addr(),
        });
        self.observer.observe(&RequestEvent::ResponseReceived {
            method: method.to_string(),
            url,
            status: status.as_u16(),
            elapsed: started.elapsed(),
        });
        tracing::debug!("{} {} -> {}", method, path, status);

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response body: {}", e)))?;

        Ok((status, body))
    }

    /// Send a read or delete and require a successful envelope
    async fn checked<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        what: &str,
    ) -> Result<Envelope<T>> {
        let (status, body) = self.send(method, path, None).await?;
        let envelope: Envelope<T> = parse(status, &body, what)?;

        if !status.is_success() || !envelope.success {
            return Err(envelope::failure(status, &envelope.errors, &body, what));
        }
        Ok(envelope)
    }

    /// GET a single resource
    async fn fetch<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let envelope: Envelope<T> = self.checked(Method::GET, path, what).await?;
        envelope.result.ok_or_else(|| {
            Error::provider(
                PROVIDER_NAME,
                format!("Invalid response format: {} result is missing", what),
            )
        })
    }

    /// POST or PUT a record, keeping unsuccessful envelopes
    async fn write_record(
        &self,
        method: Method,
        path: &str,
        record: &NewRecord,
        what: &str,
    ) -> Result<RecordResponse> {
        let (status, body) = self.send(method, path, Some(record)).await?;
        let envelope: Envelope<DnsRecord> = parse(status, &body, what)?;

        let success = envelope.success && status.is_success();
        if !success {
            tracing::debug!("{} answered {} with {} error(s)", what, status, envelope.errors.len());
        }

        Ok(RecordResponse {
            success,
            errors: envelope.errors,
            messages: envelope.messages,
            result: envelope.result,
        })
    }
}

/// Parse an envelope, falling back to status mapping when the body is not one
fn parse<T: DeserializeOwned>(status: StatusCode, body: &str, what: &str) -> Result<Envelope<T>> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(envelope::failure(status, &[], body, what)),
        Err(e) => Err(Error::provider(
            PROVIDER_NAME,
            format!("Failed to parse {} response: {}", what, e),
        )),
    }
}

#[async_trait]
impl DirectoryClient for CloudflareClient {
    async fn user_details(&self) -> Result<User> {
        self.fetch("/user", "user details").await
    }

    /// Resolve a zone name to its identifier
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn zone_id_by_name(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for: {}", zone_name);

        let zones: Vec<Zone> = self
            .fetch(&format!("/zones?name={}", zone_name), "zone lookup")
            .await?;

        let zone = zones
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(zone_name))
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    async fn zone_details(&self, zone_id: &str) -> Result<Zone> {
        self.fetch(&format!("/zones/{}", zone_id), "zone details")
            .await
    }

    /// List every record in the zone, following pagination
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?page=1&per_page=100
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let path = format!(
                "/zones/{}/dns_records?page={}&per_page={}",
                zone_id, page, RECORDS_PER_PAGE
            );
            let envelope: Envelope<Vec<DnsRecord>> =
                self.checked(Method::GET, &path, "list records").await?;

            let total_pages = envelope.total_pages();
            records.extend(envelope.result.unwrap_or_default());

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!("Listed {} record(s) in zone {}", records.len(), zone_id);
        Ok(records)
    }

    async fn create_record(&self, zone_id: &str, record: &NewRecord) -> Result<RecordResponse> {
        self.write_record(
            Method::POST,
            &format!("/zones/{}/dns_records", zone_id),
            record,
            "create record",
        )
        .await
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &NewRecord,
    ) -> Result<RecordResponse> {
        self.write_record(
            Method::PUT,
            &format!("/zones/{}/dns_records/{}", zone_id, record_id),
            record,
            "update record",
        )
        .await
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord> {
        self.fetch(
            &format!("/zones/{}/dns_records/{}", zone_id, record_id),
            "record details",
        )
        .await
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let _: Envelope<serde_json::Value> = self
            .checked(
                Method::DELETE,
                &format!("/zones/{}/dns_records/{}", zone_id, record_id),
                "delete record",
            )
            .await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
