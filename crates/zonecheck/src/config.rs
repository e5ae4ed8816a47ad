// # Runtime Configuration
//
// Built from the parsed flags plus environment variables:
//
// - `CLOUDFLARE_API_TOKEN`: API token (zone-info, dns-verify)
// - `CLOUDFLARE_API_KEY` / `CLOUDFLARE_API_EMAIL`: global key and email (dns-verify-legacy)
// - `ZONECHECK_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `ZONECHECK_API_BASE`: API base URL override (default: the public v4 endpoint)

use anyhow::{Context, Result};
use tracing::Level;
use zonecheck_core::Credentials;
use zonecheck_core::traits::TRACE_TARGET;

use crate::cli::{Args, Program};

/// Environment variable selecting the log level
pub const LOG_LEVEL_ENV: &str = "ZONECHECK_LOG_LEVEL";

/// Environment variable overriding the API base URL
pub const API_BASE_ENV: &str = "ZONECHECK_API_BASE";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub program: Program,
    pub zone: Option<String>,
    pub trace: bool,
    pub credentials: Credentials,
    pub api_base: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from the flags and the process environment
    pub fn from_env(program: Program, args: Args) -> Result<Self> {
        Self::from_lookup(program, args, |name| std::env::var(name).ok())
    }

    /// Load configuration from the flags and a variable lookup
    pub fn from_lookup<F>(program: Program, args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = program
            .credentials(&lookup)
            .with_context(|| format!("{} needs API credentials", program.name()))?;

        Ok(Self {
            program,
            zone: args.zone.map(|z| z.trim().trim_end_matches('.').to_lowercase()),
            trace: args.trace,
            credentials,
            api_base: lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()),
            log_level: lookup(LOG_LEVEL_ENV).unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// - `--zone` present where required, and a valid domain name
    /// - credentials non-empty (and the email plausible)
    /// - API base URL uses HTTP or HTTPS
    /// - log level known
    pub fn validate(&self) -> Result<()> {
        match &self.zone {
            Some(zone) => validate_domain_name(zone)?,
            None if self.program.requires_zone() => {
                anyhow::bail!("--zone is required for {}", self.program.name())
            }
            None => {}
        }

        self.credentials.validate()?;

        if let Some(ref url) = self.api_base {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!(
                    "{} must use HTTP or HTTPS scheme. Got: {}",
                    API_BASE_ENV,
                    url
                );
            }
        }

        if parse_level(&self.log_level).is_none() {
            anyhow::bail!(
                "{} '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                LOG_LEVEL_ENV,
                self.log_level
            );
        }

        Ok(())
    }

    /// Problems worth reporting that do not stop the run
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(ref url) = self.api_base {
            if url.starts_with("http://") {
                warnings.push(format!(
                    "{} uses HTTP (not HTTPS). Credentials will be sent in clear text.",
                    API_BASE_ENV
                ));
            }
        }
        warnings
    }

    /// Maximum level for the log subscriber
    pub fn level(&self) -> Level {
        parse_level(&self.log_level).unwrap_or(Level::INFO)
    }

    /// Filter directives for the log subscriber
    ///
    /// With `--trace`, request events stay visible below the configured level.
    pub fn log_directives(&self) -> String {
        let level = self.level();
        let base = level.to_string().to_lowercase();
        if self.trace && (level == Level::WARN || level == Level::ERROR) {
            format!("{},{}=info", base, TRACE_TARGET)
        } else {
            base
        }
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, characters, hyphens.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    if !domain.contains('.') {
        anyhow::bail!("Zone name must have at least two labels. Got: '{}'", domain);
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}
