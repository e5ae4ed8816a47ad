//! Configuration types for the zonecheck tools
//!
//! This module defines the verification sequence settings and the
//! credentials used to reach the provider API.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Environment variable holding a scoped API token
pub const API_TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

/// Environment variable holding a global API key
pub const API_KEY_ENV: &str = "CLOUDFLARE_API_KEY";

/// Environment variable holding the account email paired with the API key
pub const API_EMAIL_ENV: &str = "CLOUDFLARE_API_EMAIL";

/// Settings for the scripted verification sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Reserved test-name prefixes. The first is used for creation, the
    /// second as the rename target. All of them guard against reruns.
    #[serde(default = "default_reserved_names")]
    pub reserved_names: Vec<String>,

    /// Type of the record that is created, renamed and deleted
    #[serde(default = "default_record_type")]
    pub record_type: String,

    /// Content of that record
    #[serde(default = "default_content")]
    pub content: String,

    /// TTL of that record (1 = automatic)
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Attempt a second creation under the same name after the first one
    #[serde(default)]
    pub duplicate_probe: bool,

    /// Create and delete extra records of `extra_record_type` at the end
    #[serde(default)]
    pub extra_records: bool,

    /// Type of the extra records
    #[serde(default = "default_extra_record_type")]
    pub extra_record_type: String,

    /// Contents of the extra records, one record per entry
    #[serde(default = "default_extra_contents")]
    pub extra_contents: Vec<String>,
}

impl SequenceConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            reserved_names: default_reserved_names(),
            record_type: default_record_type(),
            content: default_content(),
            ttl: default_ttl(),
            duplicate_probe: false,
            extra_records: false,
            extra_record_type: default_extra_record_type(),
            extra_contents: default_extra_contents(),
        }
    }

    /// Enable or disable the duplicate-creation probe
    pub fn with_duplicate_probe(mut self, enabled: bool) -> Self {
        self.duplicate_probe = enabled;
        self
    }

    /// Enable or disable the extra-record create/delete step
    pub fn with_extra_records(mut self, enabled: bool) -> Self {
        self.extra_records = enabled;
        self
    }

    /// Replace the reserved names
    pub fn with_reserved_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Name the record is created under; only valid after [`Self::validate`]
    pub(crate) fn create_name(&self) -> &str {
        &self.reserved_names[0]
    }

    /// Name the record is renamed to; only valid after [`Self::validate`]
    pub(crate) fn rename_name(&self) -> &str {
        &self.reserved_names[1]
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.reserved_names.len() < 2 {
            return Err(crate::Error::config(
                "At least two reserved names are required (create and rename targets)",
            ));
        }
        if self.reserved_names.iter().any(|n| n.trim().is_empty()) {
            return Err(crate::Error::config("Reserved names cannot be empty"));
        }
        let distinct: HashSet<&str> = self.reserved_names.iter().map(String::as_str).collect();
        if distinct.len() != self.reserved_names.len() {
            return Err(crate::Error::config("Reserved names must be distinct"));
        }

        if self.record_type.is_empty() || self.content.is_empty() {
            return Err(crate::Error::config(
                "Record type and content cannot be empty",
            ));
        }

        if self.ttl != 1 && !(60..=86400).contains(&self.ttl) {
            return Err(crate::Error::config(format!(
                "TTL must be 1 (automatic) or between 60 and 86400 seconds. Got: {}",
                self.ttl
            )));
        }

        if self.extra_records {
            if self.extra_record_type.is_empty() {
                return Err(crate::Error::config("Extra record type cannot be empty"));
            }
            if self.extra_contents.len() < 2 {
                return Err(crate::Error::config(
                    "Extra record step needs at least two contents",
                ));
            }
        }

        Ok(())
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_reserved_names() -> Vec<String> {
    vec!["cf-dns-test-1".to_string(), "cf-dns-test-2".to_string()]
}

fn default_record_type() -> String {
    "CNAME".to_string()
}

fn default_content() -> String {
    "example.com".to_string()
}

fn default_ttl() -> u32 {
    120
}

fn default_extra_record_type() -> String {
    "A".to_string()
}

fn default_extra_contents() -> Vec<String> {
    // TEST-NET-1 (RFC 5737)
    vec!["192.0.2.1".to_string(), "192.0.2.2".to_string()]
}

/// Provider API credentials
///
/// The Debug implementation never exposes secret values.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Scoped API token, sent as a bearer token
    ApiToken(String),

    /// Global API key plus the account email
    ApiKey {
        /// API key
        key: String,
        /// Account email
        email: String,
    },
}

impl Credentials {
    /// Read an API token from `CLOUDFLARE_API_TOKEN`
    ///
    /// `lookup` maps a variable name to its value (normally `std::env::var`).
    pub fn api_token_from<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::ApiToken(required_var(&lookup, API_TOKEN_ENV)?))
    }

    /// Read an API key and email from `CLOUDFLARE_API_KEY` and `CLOUDFLARE_API_EMAIL`
    pub fn api_key_from<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::ApiKey {
            key: required_var(&lookup, API_KEY_ENV)?,
            email: required_var(&lookup, API_EMAIL_ENV)?,
        })
    }

    /// Validate the credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            Credentials::ApiToken(token) => {
                if token.is_empty() {
                    return Err(crate::Error::config("API token cannot be empty"));
                }
            }
            Credentials::ApiKey { key, email } => {
                if key.is_empty() {
                    return Err(crate::Error::config("API key cannot be empty"));
                }
                if !email.contains('@') {
                    return Err(crate::Error::config(format!(
                        "API email does not look like an email address: {}",
                        email
                    )));
                }
            }
        }
        Ok(())
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::ApiToken(_) => "api-token",
            Credentials::ApiKey { .. } => "api-key",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiToken(_) => f.debug_tuple("ApiToken").field(&"<REDACTED>").finish(),
            Credentials::ApiKey { email, .. } => f
                .debug_struct("ApiKey")
                .field("key", &"<REDACTED>")
                .field("email", email)
                .finish(),
        }
    }
}

fn required_var<F>(lookup: &F, name: &str) -> Result<String, crate::Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(crate::Error::config(format!(
            "{} environment variable is required",
            name
        ))),
    }
}
