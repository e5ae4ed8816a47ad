//! Test doubles and common utilities for sequencer contract tests
//!
//! This module provides an in-memory directory that behaves like the
//! remote API closely enough to verify the sequencer's contract.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use zonecheck_core::error::{Error, Result};
use zonecheck_core::traits::{
    ApiMessage, DirectoryClient, DnsRecord, NewRecord, RecordResponse, User, Zone,
};

/// How a fetch of a deleted record should behave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedFetch {
    /// Report not found (the real API's behavior)
    NotFound,
    /// Fail with a transport error
    TransportError,
    /// Keep serving the record as if it had never been deleted
    StillServed,
}

/// Injected behaviors
#[derive(Debug, Clone)]
pub struct Behavior {
    /// Reject a second record with an existing name (code 81053)
    pub reject_duplicates: bool,
    /// Fail the duplicate-create call at the transport level
    pub duplicate_transport_error: bool,
    /// Answer every create with `success: false`
    pub reject_creates: bool,
    /// Answer every update with `success: false`
    pub reject_updates: bool,
    /// Accept updates but keep the record's old name
    pub ignore_update_names: bool,
    /// Fail deletes of these ids
    pub failing_deletes: HashSet<String>,
    /// Behavior of a fetch after delete
    pub deleted_fetch: DeletedFetch,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            reject_duplicates: true,
            duplicate_transport_error: false,
            reject_creates: false,
            reject_updates: false,
            ignore_update_names: false,
            failing_deletes: HashSet::new(),
            deleted_fetch: DeletedFetch::NotFound,
        }
    }
}

/// In-memory directory for one zone
pub struct MockDirectory {
    zone: Zone,
    records: Mutex<BTreeMap<String, DnsRecord>>,
    deleted: Mutex<BTreeMap<String, DnsRecord>>,
    behavior: Mutex<Behavior>,
    next_id: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl MockDirectory {
    /// Empty zone "example.com"
    pub fn new() -> Self {
        Self::with_zone(test_zone())
    }

    /// Empty directory holding `zone`
    pub fn with_zone(zone: Zone) -> Self {
        Self {
            zone,
            records: Mutex::new(BTreeMap::new()),
            deleted: Mutex::new(BTreeMap::new()),
            behavior: Mutex::new(Behavior::default()),
            next_id: AtomicUsize::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the injected behavior
    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Seed an existing record (bypasses the call log)
    pub fn seed(&self, name: &str, record_type: &str, content: &str) -> String {
        let id = self.allocate_id();
        let record = DnsRecord {
            id: id.clone(),
            name: self.qualify(name),
            record_type: record_type.to_string(),
            content: content.to_string(),
            ttl: 1,
            zone_id: Some(self.zone.id.clone()),
            zone_name: Some(self.zone.name.clone()),
            ..Default::default()
        };
        self.records.lock().unwrap().insert(id.clone(), record);
        id
    }

    /// Every call, in order, as "op" or "op:argument"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose name starts with `op`
    pub fn count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    /// Number of create/update/delete calls
    pub fn mutation_count(&self) -> usize {
        self.count("create") + self.count("update") + self.count("delete")
    }

    /// Records currently in the zone
    pub fn live_records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn allocate_id(&self) -> String {
        format!("rec-{:04}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn qualify(&self, name: &str) -> String {
        if name.ends_with(&self.zone.name) {
            name.to_string()
        } else {
            format!("{}.{}", name, self.zone.name)
        }
    }

    fn check_zone(&self, zone_id: &str) -> Result<()> {
        if zone_id == self.zone.id {
            Ok(())
        } else {
            Err(Error::not_found(format!("Zone not found: {}", zone_id)))
        }
    }
}

#[async_trait::async_trait]
impl DirectoryClient for MockDirectory {
    async fn user_details(&self) -> Result<User> {
        self.log("user".to_string());
        Ok(User {
            id: "7c5dae5552338874e5053f2534d2767a".to_string(),
            email: Some("user@example.com".to_string()),
            ..Default::default()
        })
    }

    async fn zone_id_by_name(&self, zone_name: &str) -> Result<String> {
        self.log(format!("zone_id:{}", zone_name));
        if zone_name == self.zone.name {
            Ok(self.zone.id.clone())
        } else {
            Err(Error::not_found(format!("Zone not found: {}", zone_name)))
        }
    }

    async fn zone_details(&self, zone_id: &str) -> Result<Zone> {
        self.log(format!("zone:{}", zone_id));
        self.check_zone(zone_id)?;
        Ok(self.zone.clone())
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        self.log("list".to_string());
        self.check_zone(zone_id)?;
        Ok(self.live_records())
    }

    async fn create_record(&self, zone_id: &str, record: &NewRecord) -> Result<RecordResponse> {
        self.log(format!("create:{}", record.name));
        self.check_zone(zone_id)?;

        let name = self.qualify(&record.name);
        let behavior = self.behavior.lock().unwrap().clone();

        if behavior.reject_creates {
            return Ok(RecordResponse::failed(vec![ApiMessage::new(
                1004,
                "DNS Validation Error",
            )]));
        }

        // CNAMEs cannot share a name with anything; other types only clash when identical
        let exists = self.records.lock().unwrap().values().any(|r| {
            r.name == name
                && (r.record_type == "CNAME"
                    || record.record_type == "CNAME"
                    || (r.record_type == record.record_type && r.content == record.content))
        });
        if exists && behavior.duplicate_transport_error {
            return Err(Error::http("connection reset by peer"));
        }
        if exists && behavior.reject_duplicates {
            return Ok(RecordResponse::failed(vec![ApiMessage::new(
                81053,
                "An A, AAAA, or CNAME record with that host already exists.",
            )]));
        }

        let stored = DnsRecord {
            id: self.allocate_id(),
            name,
            record_type: record.record_type.clone(),
            content: record.content.clone(),
            ttl: record.ttl,
            proxied: Some(false),
            zone_id: Some(self.zone.id.clone()),
            zone_name: Some(self.zone.name.clone()),
            ..Default::default()
        };
        self.records
            .lock()
            .unwrap()
            .insert(stored.id.clone(), stored.clone());
        Ok(RecordResponse::ok(stored))
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &NewRecord,
    ) -> Result<RecordResponse> {
        self.log(format!("update:{}", record_id));
        self.check_zone(zone_id)?;

        let behavior = self.behavior.lock().unwrap().clone();
        if behavior.reject_updates {
            return Ok(RecordResponse::failed(vec![ApiMessage::new(
                1004,
                "DNS Validation Error",
            )]));
        }

        let name = self.qualify(&record.name);
        let mut records = self.records.lock().unwrap();
        match records.get_mut(record_id) {
            Some(existing) => {
                if !behavior.ignore_update_names {
                    existing.name = name;
                }
                existing.record_type = record.record_type.clone();
                existing.content = record.content.clone();
                existing.ttl = record.ttl;
                Ok(RecordResponse::ok(existing.clone()))
            }
            None => Ok(RecordResponse::failed(vec![ApiMessage::new(
                81044,
                "Record does not exist.",
            )])),
        }
    }

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord> {
        self.log(format!("get:{}", record_id));
        self.check_zone(zone_id)?;

        if let Some(record) = self.records.lock().unwrap().get(record_id) {
            return Ok(record.clone());
        }

        let deleted_fetch = self.behavior.lock().unwrap().deleted_fetch;
        let deleted = self.deleted.lock().unwrap().get(record_id).cloned();
        match (deleted, deleted_fetch) {
            (Some(record), DeletedFetch::StillServed) => Ok(record),
            (Some(_), DeletedFetch::TransportError) => {
                Err(Error::http("operation timed out"))
            }
            _ => Err(Error::not_found(format!("Record does not exist: {}", record_id))),
        }
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.log(format!("delete:{}", record_id));
        self.check_zone(zone_id)?;

        if self
            .behavior
            .lock()
            .unwrap()
            .failing_deletes
            .contains(record_id)
        {
            return Err(Error::provider("mock", "internal server error"));
        }

        match self.records.lock().unwrap().remove(record_id) {
            Some(record) => {
                self.deleted
                    .lock()
                    .unwrap()
                    .insert(record_id.to_string(), record);
                Ok(())
            }
            None => Err(Error::not_found(format!("Record does not exist: {}", record_id))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Zone used by the contract tests
pub fn test_zone() -> Zone {
    Zone {
        id: "023e105f4ecef8ad9ca31a8372d0c353".to_string(),
        name: "example.com".to_string(),
        status: Some("active".to_string()),
        ..Default::default()
    }
}
