//! Core traits for the zonecheck tools
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DirectoryClient`]: Remote DNS management API operations
//! - [`RequestObserver`]: Diagnostic hook for request lifecycle events

pub mod directory;
pub mod observer;

pub use directory::{
    ApiMessage, DirectoryClient, DnsRecord, NewRecord, RecordResponse, User, Zone, ZoneAccount,
    ZonePlan,
};
pub use observer::{
    LoggingObserver, NoopObserver, RequestEvent, RequestObserver, TRACE_TARGET, redact_header,
};
