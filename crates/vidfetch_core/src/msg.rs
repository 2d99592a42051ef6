use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::{Format, JobRequest, Quality, SessionId, StatusPatch, SubmissionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input.
    InputChanged(String),
    QualitySelected(Quality),
    FormatSelected(Format),
    /// User asked to submit the current URL.
    SubmitClicked,
    /// Backend acknowledged the submission.
    SubmitAccepted {
        session_id: SessionId,
        request: JobRequest,
        accepted_at: DateTime<Utc>,
    },
    SubmitFailed(SubmissionError),
    /// Poll timer fired.
    PollTick,
    /// A status response arrived.
    StatusReceived {
        session_id: SessionId,
        patch: StatusPatch,
    },
    /// A status request failed; retried by the next tick.
    PollFailed { session_id: SessionId, reason: String },
    /// User asked to retrieve the result of a session.
    RetrieveClicked { session_id: SessionId },
    RetrievalFinished {
        session_id: SessionId,
        outcome: RetrievalOutcome,
    },
    NoticeDismissed,
    /// Coordinator is being torn down; later messages are discarded.
    Shutdown,
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Failed { message: String },
}
