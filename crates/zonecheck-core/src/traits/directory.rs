// # Directory Client Trait
//
// Defines the operations the verification tools consume from a DNS
// provider's management API.
//
// ## Implementations
//
// - Cloudflare: `zonecheck-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use zonecheck_core::DirectoryClient;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* DirectoryClient implementation */;
//
//     let zone_id = client.zone_id_by_name("example.com").await?;
//     let zone = client.zone_details(&zone_id).await?;
//     for record in client.list_records(&zone.id).await? {
//         println!("{} {} {}", record.name, record.record_type, record.content);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A code/message pair returned by the remote API in `errors` or `messages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Provider error code (0 when the API did not send one)
    #[serde(default)]
    pub code: i64,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl ApiMessage {
    /// Create a new message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Account user metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub two_factor_authentication_enabled: bool,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

/// Account that owns a zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Billing plan of a zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePlan {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A DNS zone managed by the provider
///
/// Resolved once per run and treated as immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-assigned identifier
    pub id: String,
    /// Zone name (e.g., "example.com")
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub paused: bool,
    #[serde(rename = "type", default)]
    pub zone_type: Option<String>,
    #[serde(default)]
    pub development_mode: i64,
    #[serde(default)]
    pub name_servers: Vec<String>,
    #[serde(default)]
    pub original_name_servers: Option<Vec<String>>,
    #[serde(default)]
    pub account: Option<ZoneAccount>,
    #[serde(default)]
    pub plan: Option<ZonePlan>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activated_on: Option<DateTime<Utc>>,
}

/// A DNS record as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier, stable across updates
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type (e.g., "CNAME", "A")
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content (target host, address, ...)
    pub content: String,
    /// Time-to-live in seconds (1 = automatic)
    pub ttl: u32,
    #[serde(default)]
    pub proxied: Option<bool>,
    #[serde(default)]
    pub proxiable: Option<bool>,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub zone_name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

/// Request body for creating or updating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub proxied: Option<bool>,
}

impl NewRecord {
    /// Create a new (unproxied) record request
    pub fn new(
        record_type: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            record_type: record_type.into(),
            name: name.into(),
            content: content.into(),
            ttl,
            proxied: None,
        }
    }

    /// Same record under a different name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Response to a create or update call
///
/// Carries the success indicator and, on failure, the error descriptors the
/// API returned. Implementations return this even when the API answered with
/// an error status, as long as the body could be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
    #[serde(default)]
    pub result: Option<DnsRecord>,
}

impl RecordResponse {
    /// A successful response carrying `record`
    pub fn ok(record: DnsRecord) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            messages: Vec::new(),
            result: Some(record),
        }
    }

    /// An unsuccessful response carrying `errors`
    pub fn failed(errors: Vec<ApiMessage>) -> Self {
        Self {
            success: false,
            errors,
            messages: Vec::new(),
            result: None,
        }
    }
}

/// Trait for DNS provider management API clients
///
/// Every method performs exactly one logical remote operation (listing may
/// span several pages). Implementations do not retry; the caller decides
/// which failures are fatal.
///
/// # Errors
///
/// Reads and deletes of a missing zone or record must return
/// [`crate::Error::NotFound`] so callers can tell "gone" from "unreachable".
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch metadata for the authenticated user
    async fn user_details(&self) -> Result<User, crate::Error>;

    /// Resolve a zone name to its provider identifier
    async fn zone_id_by_name(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// Fetch full zone metadata
    async fn zone_details(&self, zone_id: &str) -> Result<Zone, crate::Error>;

    /// List every record in the zone
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record
    async fn create_record(
        &self,
        zone_id: &str,
        record: &NewRecord,
    ) -> Result<RecordResponse, crate::Error>;

    /// Overwrite the record with `record_id`
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &NewRecord,
    ) -> Result<RecordResponse, crate::Error>;

    /// Fetch a single record by identifier
    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord, crate::Error>;

    /// Delete a record by identifier
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
