// # Cloudflare Response Envelope
//
// Every Cloudflare API v4 response wraps its payload in the same object:
//
// ```json
// {
//   "success": false,
//   "errors": [{ "code": 81044, "message": "Record does not exist." }],
//   "messages": [],
//   "result": null,
//   "result_info": { "page": 1, "per_page": 100, "total_pages": 1, "count": 0, "total_count": 0 }
// }
// ```
//
// This module parses that envelope and maps failures onto `zonecheck_core::Error`.

use reqwest::StatusCode;
use serde::Deserialize;
use zonecheck_core::Error;
use zonecheck_core::traits::ApiMessage;

use crate::PROVIDER_NAME;

/// Error codes Cloudflare uses for bad or insufficient credentials
const AUTH_ERROR_CODES: &[i64] = &[6003, 6103, 6111, 9109, 10000];

/// Error codes Cloudflare uses for a missing zone or record
const NOT_FOUND_CODES: &[i64] = &[7000, 7003, 81044];

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
    pub result: Option<T>,
    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

/// Pagination block of list responses
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct ResultInfo {
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> Envelope<T> {
    /// Number of pages the listing spans (at least one)
    pub fn total_pages(&self) -> u32 {
        self.result_info.map_or(1, |info| info.total_pages.max(1))
    }
}

/// Map an unsuccessful response onto an error
///
/// Error codes in the body take precedence over the HTTP status, because
/// Cloudflare reports some failures (a missing record, a revoked token)
/// with a generic 400.
///
/// # Parameters
///
/// - `status`: HTTP status of the response
/// - `errors`: error descriptors from the envelope (may be empty)
/// - `body`: raw response body, used when there are no descriptors
/// - `what`: short description of the call, for the message
pub(crate) fn failure(status: StatusCode, errors: &[ApiMessage], body: &str, what: &str) -> Error {
    let detail = describe(errors, body);

    if errors.iter().any(|e| AUTH_ERROR_CODES.contains(&e.code)) {
        return Error::auth(format!(
            "{}: invalid API credentials or insufficient permissions. Status: {} ({})",
            what, status, detail
        ));
    }
    if errors.iter().any(|e| NOT_FOUND_CODES.contains(&e.code)) {
        return Error::not_found(format!("{}: {}", what, detail));
    }

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API credentials or insufficient permissions. Status: {}",
            what, status
        )),
        404 => Error::not_found(format!("{}: {}", what, detail)),
        429 => Error::rate_limited(format!(
            "{}: rate limit exceeded. Status: {}",
            what, status
        )),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("Cloudflare server error (transient): {} - {}", status, detail),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", what, status, detail),
        ),
    }
}

fn describe(errors: &[ApiMessage], body: &str) -> String {
    if errors.is_empty() {
        let body = body.trim();
        if body.is_empty() {
            "empty response body".to_string()
        } else {
            body.to_string()
        }
    } else {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
