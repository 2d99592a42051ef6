use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type SessionId = String;

/// Body of `POST {base}/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartRequest {
    pub url: String,
    pub quality: String,
    /// `None` is serialized as `null` and lets the backend pick.
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// Body of `GET {base}/status/{id}`. JSON `null` and missing fields both
/// decode to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub id: Option<String>,
    pub status: WireStatus,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, rename = "downloadUrl", alias = "resultLocator")]
    pub result_locator: Option<String>,
    #[serde(default, rename = "error", alias = "errorMessage")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    StartCompleted {
        request: StartRequest,
        result: Result<SessionId, BackendError>,
    },
    PollTick,
    StatusReported {
        session_id: SessionId,
        result: Result<StatusReport, BackendError>,
    },
    RetrievalCompleted {
        session_id: SessionId,
        result: Result<RetrievedFile, BackendError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when no usable response came back from the backend.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::InvalidUrl | FailureKind::Timeout | FailureKind::Network
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    Network,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "undecodable response"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
