//! Verification sequencer
//!
//! Runs a fixed script of record operations against one zone and records
//! what the remote system answered at each step.
//!
//! ## Flow
//!
//! ```text
//! list records ── reserved name in use? ── yes ──> report conflict, stop
//!      │
//!      no
//!      ▼
//! create ─> [duplicate create (deleted if accepted)] ─> rename ─> fetch ─> delete ─> fetch (expect not found)
//!                                                                  │
//!                                                                  ▼
//!                                                  [create extras ─> delete extras]
//! ```
//!
//! Steps in brackets are enabled by [`SequenceConfig`]. Only the duplicate
//! create and its cleanup, the post-deletion fetch and the extra-record
//! deletions tolerate failure; any other failure ends the run with an error
//! and leaves already created records in place.

use crate::config::SequenceConfig;
use crate::error::{Error, Result};
use crate::report::{DeletionCheck, ProbeOutcome, RunRecorder, Snapshot, Step};
use crate::traits::{DirectoryClient, DnsRecord, NewRecord, RecordResponse, Zone};
use tracing::{debug, error, info, warn};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Every step ran
    Completed,
    /// Records with reserved names already exist; nothing was mutated
    Conflict {
        /// Names of the conflicting records
        names: Vec<String>,
    },
}

/// Names of records that start with any reserved prefix
pub fn find_conflicts(records: &[DnsRecord], reserved: &[String]) -> Vec<String> {
    records
        .iter()
        .filter(|record| {
            reserved
                .iter()
                .any(|prefix| record.name.starts_with(prefix.as_str()))
        })
        .map(|record| record.name.clone())
        .collect()
}

/// Scripted create/rename/delete verification against one zone
pub struct VerificationSequencer<'a> {
    client: &'a dyn DirectoryClient,
    config: SequenceConfig,
}

impl<'a> VerificationSequencer<'a> {
    /// Create a new sequencer
    ///
    /// Fails if the configuration is invalid.
    pub fn new(client: &'a dyn DirectoryClient, config: SequenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Run the sequence against `zone`, recording results into `recorder`
    ///
    /// # Returns
    ///
    /// - `Ok(SequenceOutcome::Completed)`: every step ran
    /// - `Ok(SequenceOutcome::Conflict { .. })`: reserved names in use, nothing mutated
    /// - `Err(Error)`: a non-tolerated step failed
    pub async fn run(&self, zone: &Zone, recorder: &mut RunRecorder) -> Result<SequenceOutcome> {
        info!(
            "Verifying {} API against zone {} ({})",
            self.client.provider_name(),
            zone.name,
            zone.id
        );

        let existing = self
            .client
            .list_records(&zone.id)
            .await
            .map_err(|e| e.context("list records"))?;
        debug!("Zone {} has {} record(s)", zone.name, existing.len());

        let conflicts = find_conflicts(&existing, &self.config.reserved_names);
        if !conflicts.is_empty() {
            warn!(
                "Zone {} already contains reserved test records, refusing to modify it: {:?}",
                zone.name, conflicts
            );
            recorder.conflicts(conflicts.clone());
            return Ok(SequenceOutcome::Conflict { names: conflicts });
        }

        let request = NewRecord::new(
            &self.config.record_type,
            self.config.create_name(),
            &self.config.content,
            self.config.ttl,
        );

        let created = self.create(zone, &request, Step::Create, recorder).await?;
        info!("Created {} record {} ({})", created.record_type, created.name, created.id);

        if self.config.duplicate_probe {
            self.probe_duplicate(zone, &request, recorder).await;
        }

        let renamed = self
            .rename(zone, &created, &request.renamed(self.config.rename_name()), recorder)
            .await?;

        self.fetch_renamed(zone, &renamed.id, recorder).await?;

        self.client
            .delete_record(&zone.id, &renamed.id)
            .await
            .map_err(|e| e.context("delete record"))?;
        info!("Deleted record {}", renamed.id);

        self.check_deleted(zone, &renamed.id, recorder).await;

        if self.config.extra_records {
            self.extra_records(zone, recorder).await?;
        }

        info!("Verification sequence completed for zone {}", zone.name);
        Ok(SequenceOutcome::Completed)
    }

    /// Create a record and require the API to report success
    async fn create(
        &self,
        zone: &Zone,
        request: &NewRecord,
        step: Step,
        recorder: &mut RunRecorder,
    ) -> Result<DnsRecord> {
        let response = self
            .client
            .create_record(&zone.id, request)
            .await
            .map_err(|e| e.context(step.describe()))?;

        let record = require_record(step, &response)?;
        recorder.touch(record.id.clone());
        recorder.snapshot(Snapshot::from_response(step, &response));
        Ok(record)
    }

    /// Create the same record again; every outcome is tolerated
    async fn probe_duplicate(&self, zone: &Zone, request: &NewRecord, recorder: &mut RunRecorder) {
        let step = Step::DuplicateCreate;
        match self.client.create_record(&zone.id, request).await {
            Ok(response) if response.success => {
                let id = response
                    .result
                    .as_ref()
                    .map(|r| r.id.clone())
                    .unwrap_or_default();
                warn!(
                    "Duplicate create under {} was accepted (id: {})",
                    request.name, id
                );
                recorder.snapshot(Snapshot::from_response(step, &response).flagged());
                if !id.is_empty() {
                    recorder.touch(id.clone());
                    // the duplicate carries a reserved name and would block later runs
                    match self.client.delete_record(&zone.id, &id).await {
                        Ok(()) => info!("Deleted accepted duplicate {}", id),
                        Err(e) => {
                            error!("Failed to delete accepted duplicate {}: {}", id, e);
                            recorder.cleanup_failure(id.clone(), e);
                        }
                    }
                }
                recorder.duplicate_probe(ProbeOutcome::Accepted { id });
            }
            Ok(response) => {
                info!(
                    "Duplicate create under {} rejected as expected: {}",
                    request.name,
                    Error::rejected(step.describe(), response.errors.clone())
                );
                recorder.duplicate_probe(ProbeOutcome::Rejected {
                    errors: response.errors,
                });
            }
            Err(e) => {
                warn!("Duplicate create under {} failed: {}", request.name, e);
                recorder.duplicate_probe(ProbeOutcome::Failed {
                    error: e.to_string(),
                });
            }
        }
    }

    /// Rename `created` in place via an update with the same identifier
    async fn rename(
        &self,
        zone: &Zone,
        created: &DnsRecord,
        request: &NewRecord,
        recorder: &mut RunRecorder,
    ) -> Result<DnsRecord> {
        let step = Step::Rename;
        let response = self
            .client
            .update_record(&zone.id, &created.id, request)
            .await
            .map_err(|e| e.context(step.describe()))?;

        let renamed = require_record(step, &response)?;
        if renamed.id != created.id {
            warn!(
                "Record identifier changed on rename: {} -> {}",
                created.id, renamed.id
            );
        }
        info!("Renamed record {} to {}", renamed.id, renamed.name);

        recorder.touch(renamed.id.clone());
        recorder.snapshot(Snapshot::from_response(step, &response));
        Ok(renamed)
    }

    /// Re-fetch the renamed record and confirm the new name
    async fn fetch_renamed(
        &self,
        zone: &Zone,
        record_id: &str,
        recorder: &mut RunRecorder,
    ) -> Result<()> {
        let step = Step::FetchAfterRename;
        let fetched = self
            .client
            .get_record(&zone.id, record_id)
            .await
            .map_err(|e| e.context(step.describe()))?;

        let snapshot = Snapshot::from_record(step, &fetched);
        if fetched.name.starts_with(self.config.rename_name()) {
            debug!("Rename confirmed: {}", fetched.name);
            recorder.snapshot(snapshot);
        } else {
            warn!(
                "Fetched record {} is named {}, expected prefix {}",
                fetched.id,
                fetched.name,
                self.config.rename_name()
            );
            recorder.snapshot(snapshot.flagged());
        }
        Ok(())
    }

    /// Fetch a deleted record; failure is the expected outcome
    async fn check_deleted(&self, zone: &Zone, record_id: &str, recorder: &mut RunRecorder) {
        let step = Step::FetchAfterDelete;
        match self.client.get_record(&zone.id, record_id).await {
            Ok(record) => {
                warn!("Deleted record {} can still be fetched", record_id);
                recorder.snapshot(Snapshot::from_record(step, &record).flagged());
                recorder.deletion_check(DeletionCheck::StillPresent);
            }
            Err(e) if e.is_not_found() => {
                info!("Fetch of deleted record {} failed as expected: {}", record_id, e);
                recorder.deletion_check(DeletionCheck::Confirmed);
            }
            Err(e) => {
                warn!(
                    "Fetch of deleted record {} failed, but not with not-found; deletion unconfirmed: {}",
                    record_id, e
                );
                recorder.deletion_check(DeletionCheck::Unconfirmed {
                    error: e.to_string(),
                });
            }
        }
    }

    /// Create the extra records, then delete each one, tolerating deletion failures
    async fn extra_records(&self, zone: &Zone, recorder: &mut RunRecorder) -> Result<()> {
        let mut ids = Vec::with_capacity(self.config.extra_contents.len());
        for content in &self.config.extra_contents {
            let request = NewRecord::new(
                &self.config.extra_record_type,
                self.config.create_name(),
                content,
                self.config.ttl,
            );
            let record = self
                .create(zone, &request, Step::CreateExtra, recorder)
                .await?;
            info!(
                "Created extra {} record {} -> {} ({})",
                record.record_type, record.name, record.content, record.id
            );
            ids.push(record.id);
        }

        for id in ids {
            match self.client.delete_record(&zone.id, &id).await {
                Ok(()) => info!("Deleted extra record {}", id),
                Err(e) => {
                    error!("Failed to delete extra record {}: {}", id, e);
                    recorder.cleanup_failure(id, e);
                }
            }
        }

        Ok(())
    }
}

/// The record carried by a successful create/update response
fn require_record(step: Step, response: &RecordResponse) -> Result<DnsRecord> {
    if !response.success {
        return Err(Error::rejected(step.describe(), response.errors.clone()));
    }
    response.result.clone().ok_or_else(|| {
        Error::provider(
            "directory",
            format!("{} succeeded but returned no record", step.describe()),
        )
    })
}
