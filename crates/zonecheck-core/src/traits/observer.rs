// # Request Observer Trait
//
// Diagnostic hook for low-level HTTP request lifecycle events: name
// resolution, connection acquisition, header writes and response status.
//
// Observers only watch. They receive events synchronously on the request
// path and must not block or influence control flow.

use std::net::SocketAddr;
use std::time::Duration;

/// Header names whose values are never handed to observers
const SECRET_HEADERS: &[&str] = &["authorization", "x-auth-key"];

/// A single request lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    /// Host name resolved
    DnsResolved {
        host: String,
        addrs: Vec<SocketAddr>,
    },

    /// A connection was used for the request
    ConnectionAcquired {
        /// Peer address, if the transport reported one
        remote_addr: Option<SocketAddr>,
    },

    /// A request header is about to be written
    HeaderWritten {
        name: String,
        /// Value, with secrets already redacted
        value: String,
    },

    /// Response status line received
    ResponseReceived {
        method: String,
        url: String,
        status: u16,
        elapsed: Duration,
    },
}

/// Observer for request lifecycle events
pub trait RequestObserver: Send + Sync {
    /// Called for every event, in the order the events happen
    fn observe(&self, event: &RequestEvent);
}

/// Observer that ignores every event (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn observe(&self, _event: &RequestEvent) {}
}

/// `tracing` target of the events emitted by [`LoggingObserver`]
pub const TRACE_TARGET: &str = "zonecheck::trace";

/// Observer that reports every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl RequestObserver for LoggingObserver {
    fn observe(&self, event: &RequestEvent) {
        match event {
            RequestEvent::DnsResolved { host, addrs } => {
                tracing::info!(target: TRACE_TARGET, "DNS done: {} -> {:?}", host, addrs);
            }
            RequestEvent::ConnectionAcquired { remote_addr } => match remote_addr {
                Some(addr) => tracing::info!(target: TRACE_TARGET, "Got conn: {}", addr),
                None => tracing::info!(target: TRACE_TARGET, "Got conn: <unknown peer>"),
            },
            RequestEvent::HeaderWritten { name, value } => {
                tracing::info!(target: TRACE_TARGET, "Wrote header: {}: {}", name, value);
            }
            RequestEvent::ResponseReceived {
                method,
                url,
                status,
                elapsed,
            } => {
                tracing::info!(
                    target: TRACE_TARGET,
                    "{} {} -> {} in {:?}",
                    method,
                    url,
                    status,
                    elapsed
                );
            }
        }
    }
}

/// Value to report for a header, hiding credentials
pub fn redact_header(name: &str, value: &str) -> String {
    if SECRET_HEADERS
        .iter()
        .any(|secret| name.eq_ignore_ascii_case(secret))
    {
        "<REDACTED>".to_string()
    } else {
        value.to_string()
    }
}
