use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::view_model::{AppViewModel, SessionRowView};
use crate::{Format, JobRequest, Quality, SessionId, SessionRecord, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message shown to the user until replaced or dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalState {
    InFlight,
    Saved { path: PathBuf, bytes: u64 },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    url_input: String,
    quality: Quality,
    format: Format,
    submitting: bool,
    sessions: SessionStore,
    polling: bool,
    retrievals: BTreeMap<SessionId, RetrievalState>,
    notice: Option<Notice>,
    shut_down: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn url_input(&self) -> &str {
        &self.url_input
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the poll timer is currently armed.
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn retrieval(&self, id: &str) -> Option<&RetrievalState> {
        self.retrievals.get(id)
    }

    /// Returns and clears the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            url_input: self.url_input.clone(),
            quality: self.quality,
            format: self.format,
            submitting: self.submitting,
            polling: self.polling,
            sessions: self
                .sessions
                .iter()
                .map(|record| SessionRowView::from_record(record, self.retrievals.get(record.id())))
                .collect(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_url_input(&mut self, text: String) {
        if self.url_input != text {
            self.url_input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_quality(&mut self, quality: Quality) {
        if self.quality != quality {
            self.quality = quality;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_format(&mut self, format: Format) {
        if self.format != format {
            self.format = format;
            self.mark_dirty();
        }
    }

    /// Trimmed request from the current inputs, or `None` for a blank URL.
    pub(crate) fn pending_request(&self) -> Option<JobRequest> {
        let url = self.url_input.trim();
        if url.is_empty() {
            return None;
        }
        Some(JobRequest {
            url: url.to_string(),
            quality: self.quality,
            format: self.format,
        })
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        if self.submitting != submitting {
            self.submitting = submitting;
            self.mark_dirty();
        }
    }

    /// Single-session policy: a new session replaces whatever was tracked.
    pub(crate) fn replace_session(&mut self, record: SessionRecord) {
        self.sessions.remove_all();
        self.retrievals.clear();
        self.sessions.upsert(record);
        self.url_input.clear();
        self.mark_dirty();
    }

    pub(crate) fn sessions_mut(&mut self) -> &mut SessionStore {
        &mut self.sessions
    }

    pub(crate) fn set_polling(&mut self, polling: bool) {
        self.polling = polling;
    }

    pub(crate) fn set_notice(&mut self, notice: Option<Notice>) {
        if self.notice != notice {
            self.notice = notice;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_retrieval(&mut self, id: SessionId, retrieval: RetrievalState) {
        self.retrievals.insert(id, retrieval);
        self.mark_dirty();
    }

    pub(crate) fn shut_down(&mut self) {
        self.shut_down = true;
        self.submitting = false;
        self.mark_dirty();
    }
}
