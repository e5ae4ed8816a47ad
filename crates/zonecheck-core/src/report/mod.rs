//! Result reporting
//!
//! [`RunRecorder`] is the mutable result builder passed through every step
//! of a run. [`RunRecorder::finish`] turns it into the [`Report`] that the
//! binaries print as a single JSON object.

use crate::traits::{ApiMessage, DnsRecord, RecordResponse, User, Zone};
use serde::Serialize;

/// Step of the verification sequence that produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Create,
    DuplicateCreate,
    Rename,
    FetchAfterRename,
    FetchAfterDelete,
    CreateExtra,
}

impl Step {
    /// Human-readable step name used in logs and error context
    pub fn describe(self) -> &'static str {
        match self {
            Step::Create => "create record",
            Step::DuplicateCreate => "duplicate create",
            Step::Rename => "rename record",
            Step::FetchAfterRename => "fetch renamed record",
            Step::FetchAfterDelete => "fetch deleted record",
            Step::CreateExtra => "create extra record",
        }
    }
}

/// A response observed at one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub step: Step,
    pub success: bool,
    pub errors: Vec<ApiMessage>,
    pub messages: Vec<ApiMessage>,
    pub record: Option<DnsRecord>,
    /// Set when the remote system behaved differently than the script expects
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unexpected: bool,
}

impl Snapshot {
    /// Snapshot of a create/update response
    pub fn from_response(step: Step, response: &RecordResponse) -> Self {
        Self {
            step,
            success: response.success,
            errors: response.errors.clone(),
            messages: response.messages.clone(),
            record: response.result.clone(),
            unexpected: false,
        }
    }

    /// Snapshot of a fetched record
    pub fn from_record(step: Step, record: &DnsRecord) -> Self {
        Self {
            step,
            success: true,
            errors: Vec::new(),
            messages: Vec::new(),
            record: Some(record.clone()),
            unexpected: false,
        }
    }

    /// Mark this snapshot as unexpected
    pub fn flagged(mut self) -> Self {
        self.unexpected = true;
        self
    }
}

/// Outcome of the duplicate-creation probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The API refused the duplicate
    Rejected { errors: Vec<ApiMessage> },
    /// The API created a second record under the same name
    Accepted { id: String },
    /// The call itself failed
    Failed { error: String },
}

/// What the fetch after deletion showed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeletionCheck {
    /// The record is reported as not found
    Confirmed,
    /// The fetch failed for another reason, so deletion could not be confirmed
    Unconfirmed { error: String },
    /// The record could still be fetched
    StillPresent,
}

/// A cleanup deletion that failed and was tolerated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub id: String,
    pub error: String,
}

/// Accumulates results across the steps of a run
#[derive(Debug, Default)]
pub struct RunRecorder {
    ids: Vec<String>,
    responses: Vec<Snapshot>,
    conflicts: Vec<String>,
    duplicate_probe: Option<ProbeOutcome>,
    deletion_check: Option<DeletionCheck>,
    cleanup_failures: Vec<CleanupFailure>,
}

impl RunRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identifier touched by a mutation
    pub fn touch(&mut self, id: impl Into<String>) {
        self.ids.push(id.into());
    }

    /// Append a response snapshot
    pub fn snapshot(&mut self, snapshot: Snapshot) {
        self.responses.push(snapshot);
    }

    /// Record names that blocked the run
    pub fn conflicts(&mut self, names: Vec<String>) {
        self.conflicts = names;
    }

    /// Record the duplicate-probe outcome
    pub fn duplicate_probe(&mut self, outcome: ProbeOutcome) {
        self.duplicate_probe = Some(outcome);
    }

    /// Record the post-deletion check
    pub fn deletion_check(&mut self, check: DeletionCheck) {
        self.deletion_check = Some(check);
    }

    /// Record a tolerated cleanup failure
    pub fn cleanup_failure(&mut self, id: impl Into<String>, error: impl ToString) {
        self.cleanup_failures.push(CleanupFailure {
            id: id.into(),
            error: error.to_string(),
        });
    }

    /// Identifiers touched so far
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Snapshots recorded so far
    pub fn responses(&self) -> &[Snapshot] {
        &self.responses
    }

    /// Assemble the final report
    pub fn finish(self, user: Option<User>, zone: Option<Zone>) -> Report {
        Report {
            user,
            zone,
            ids: self.ids,
            responses: self.responses,
            conflicts: self.conflicts,
            duplicate_probe: self.duplicate_probe,
            deletion_check: self.deletion_check,
            cleanup_failures: self.cleanup_failures,
        }
    }
}

/// Everything one run observed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub user: Option<User>,
    pub zone: Option<Zone>,
    pub ids: Vec<String>,
    pub responses: Vec<Snapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_probe: Option<ProbeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_check: Option<DeletionCheck>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleanup_failures: Vec<CleanupFailure>,
}

impl Report {
    /// Serialize as a single line of JSON
    pub fn to_json(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write as a single newline-terminated line of JSON
    pub fn write_to<W: std::io::Write>(&self, mut writer: W) -> Result<(), crate::Error> {
        serde_json::to_writer(&mut writer, self)?;
        writer
            .write_all(b"\n")
            .map_err(|e| crate::Error::Other(format!("Failed to write report: {}", e)))?;
        Ok(())
    }
}
