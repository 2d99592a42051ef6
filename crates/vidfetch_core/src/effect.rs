use crate::{JobRequest, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the start request to the backend.
    StartJob(JobRequest),
    /// Arm the poll timer; emitted only when the first session becomes active.
    StartPolling,
    /// Disarm the poll timer; emitted when no session is active any more.
    StopPolling,
    /// Issue one status request.
    PollStatus { session_id: SessionId },
    /// Fetch the finished file.
    RetrieveFile {
        session_id: SessionId,
        filename_hint: Option<String>,
    },
}
