use chrono::{DateTime, Utc};

use crate::{Format, JobStatus, Notice, Quality, RetrievalState, SessionId, SessionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub url_input: String,
    pub quality: Quality,
    pub format: Format,
    pub submitting: bool,
    pub polling: bool,
    pub sessions: Vec<SessionRowView>,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRowView {
    pub session_id: SessionId,
    pub source_url: String,
    pub quality: Quality,
    pub format: Format,
    pub status: JobStatus,
    pub status_text: &'static str,
    pub error_message: Option<String>,
    pub filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub can_retrieve: bool,
    pub retrieval: Option<RetrievalState>,
}

impl SessionRowView {
    pub(crate) fn from_record(record: &SessionRecord, retrieval: Option<&RetrievalState>) -> Self {
        Self {
            session_id: record.id().to_string(),
            source_url: record.source_url().to_string(),
            quality: record.requested_quality(),
            format: record.requested_format(),
            status: record.status(),
            status_text: status_text(record.status()),
            error_message: record.error_message().map(ToOwned::to_owned),
            filename: record.filename().map(ToOwned::to_owned),
            created_at: record.created_at(),
            can_retrieve: record.is_retrievable(),
            retrieval: retrieval.cloned(),
        }
    }
}

pub fn status_text(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Queued => "In queue",
        JobStatus::Processing => "Processing...",
        JobStatus::Completed => "Ready to download",
        JobStatus::Failed => "Download failed",
    }
}
