use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{Format, JobRequest, Quality};

/// Opaque job identifier issued by the backend.
pub type SessionId = String;

/// Read-only view of every tracked session at one point in time.
pub type SessionSnapshot = Arc<BTreeMap<SessionId, Arc<SessionRecord>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Forward-only transition table. Staying put is always allowed.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Queued, _) => true,
            (Processing, Completed | Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields reported by one status poll. `None` means "not reported".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusPatch {
    pub status: Option<JobStatus>,
    pub result_locator: Option<String>,
    pub error_message: Option<String>,
    pub filename: Option<String>,
}

/// The tracked record of one submitted job.
///
/// Identity and request fields are fixed at construction; only
/// [`SessionStore::reconcile`] changes the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    id: SessionId,
    source_url: String,
    requested_quality: Quality,
    requested_format: Format,
    status: JobStatus,
    result_locator: Option<String>,
    error_message: Option<String>,
    filename: Option<String>,
    created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(id: SessionId, request: &JobRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            source_url: request.url.clone(),
            requested_quality: request.quality,
            requested_format: request.format,
            status: JobStatus::Queued,
            result_locator: None,
            error_message: None,
            filename: None,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn requested_quality(&self) -> Quality {
        self.requested_quality
    }

    pub fn requested_format(&self) -> Format {
        self.requested_format
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result_locator(&self) -> Option<&str> {
        self.result_locator.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_retrievable(&self) -> bool {
        self.status == JobStatus::Completed && self.result_locator.is_some()
    }

    fn merge(&mut self, patch: &StatusPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(locator) = &patch.result_locator {
            self.result_locator = Some(locator.clone());
        }
        if let Some(message) = &patch.error_message {
            self.error_message = Some(message.clone());
        }
        if let Some(filename) = &patch.filename {
            self.filename = Some(filename.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub record: Arc<SessionRecord>,
    /// False when the patch repeated what was already known.
    pub changed: bool,
    pub previous_status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    NotFound,
    Regression { from: JobStatus, to: JobStatus },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::NotFound => write!(f, "session not tracked"),
            ReconcileError::Regression { from, to } => {
                write!(f, "status regression {from} -> {to} rejected")
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

/// Owned, copy-on-write store of tracked sessions.
///
/// Mutations replace whole records, so a [`SessionSnapshot`] taken earlier
/// keeps seeing the records as they were.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionStore {
    sessions: SessionSnapshot,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<SessionRecord>> {
        self.sessions.get(id).cloned()
    }

    pub fn upsert(&mut self, record: SessionRecord) {
        Arc::make_mut(&mut self.sessions).insert(record.id.clone(), Arc::new(record));
    }

    pub fn remove_all(&mut self) {
        if !self.sessions.is_empty() {
            self.sessions = SessionSnapshot::default();
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.sessions.clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SessionRecord>> {
        self.sessions.values()
    }

    /// Ids of sessions that still need polling.
    pub fn active_ids(&self) -> BTreeSet<SessionId> {
        self.sessions
            .values()
            .filter(|record| !record.status.is_terminal())
            .map(|record| record.id.clone())
            .collect()
    }

    /// Merge the present fields of `patch` into the session `id`.
    ///
    /// A patch that would move the status backwards is rejected whole: it is
    /// a stale snapshot, so its other fields are stale too.
    pub fn reconcile(&mut self, id: &str, patch: &StatusPatch) -> Result<Reconciled, ReconcileError> {
        let current = self.sessions.get(id).ok_or(ReconcileError::NotFound)?;
        let previous_status = current.status;
        if let Some(next) = patch.status {
            if !previous_status.can_advance_to(next) {
                return Err(ReconcileError::Regression {
                    from: previous_status,
                    to: next,
                });
            }
        }

        let mut merged = SessionRecord::clone(current);
        merged.merge(patch);
        if merged == **current {
            return Ok(Reconciled {
                record: current.clone(),
                changed: false,
                previous_status,
            });
        }

        let record = Arc::new(merged);
        Arc::make_mut(&mut self.sessions).insert(id.to_string(), record.clone());
        Ok(Reconciled {
            record,
            changed: true,
            previous_status,
        })
    }
}
