use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use tokio::sync::mpsc;
use vidfetch_core::{
    update, AppState, JobRequest, JobStatus, Msg, RetrievalState, SessionId,
};
use vidfetch_engine::{EngineEvent, EngineHandle};
use vidfetch_logging::{vid_debug, vid_info, vid_warn};

use crate::effects::{map_event, EffectRunner};
use crate::render::TerminalRenderer;

const GENERIC_START_FAILURE: &str = "Failed to start download";
const GENERIC_JOB_FAILURE: &str = "unknown error";

/// How a single submit/poll/retrieve run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NothingToSubmit,
    SubmissionFailed(String),
    JobFailed { session_id: SessionId, message: String },
    Completed { session_id: SessionId },
    Saved { path: PathBuf, bytes: u64 },
    RetrievalFailed { session_id: SessionId, message: String },
    NotRetrievable { session_id: SessionId, message: String },
    Interrupted,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Saved { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToSubmit => f.write_str("Nothing to submit: the URL is empty"),
            Self::SubmissionFailed(message) => f.write_str(message),
            Self::JobFailed { message, .. } => write!(f, "Download failed: {message}"),
            Self::Completed { session_id } => {
                write!(f, "Download {session_id} is ready on the server")
            }
            Self::Saved { path, bytes } => write!(f, "Saved {} ({bytes} bytes)", path.display()),
            Self::RetrievalFailed { message, .. } => write!(f, "Download failed: {message}"),
            Self::NotRetrievable { message, .. } => f.write_str(message),
            Self::Interrupted => f.write_str("Interrupted"),
        }
    }
}

/// Owns the state and feeds engine events through [`update`] until the
/// tracked session settles.
pub struct Coordinator {
    state: AppState,
    runner: EffectRunner,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    renderer: TerminalRenderer,
    auto_retrieve: bool,
    retrieval_requested: bool,
}

impl Coordinator {
    pub fn new(
        engine: EngineHandle,
        events: mpsc::UnboundedReceiver<EngineEvent>,
        auto_retrieve: bool,
    ) -> Self {
        Self::with_renderer(engine, events, auto_retrieve, TerminalRenderer::new())
    }

    pub fn with_renderer(
        engine: EngineHandle,
        events: mpsc::UnboundedReceiver<EngineEvent>,
        auto_retrieve: bool,
        renderer: TerminalRenderer,
    ) -> Self {
        Self {
            state: AppState::new(),
            runner: EffectRunner::new(engine),
            events,
            renderer,
            auto_retrieve,
            retrieval_requested: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        self.state = state;
        self.runner.run(effects);
    }

    /// Submits `request` and drives it to an outcome, or until `interrupt`
    /// resolves. The engine is shut down before returning.
    pub async fn run<F>(&mut self, request: JobRequest, interrupt: F) -> RunOutcome
    where
        F: Future<Output = ()>,
    {
        self.dispatch(Msg::QualitySelected(request.quality));
        self.dispatch(Msg::FormatSelected(request.format));
        self.dispatch(Msg::InputChanged(request.url));
        self.dispatch(Msg::SubmitClicked);
        if !self.state.is_submitting() {
            self.teardown();
            return RunOutcome::NothingToSubmit;
        }

        tokio::pin!(interrupt);
        let outcome = loop {
            if let Some(outcome) = self.outcome() {
                break outcome;
            }
            tokio::select! {
                _ = &mut interrupt => {
                    vid_info!("Interrupted by user");
                    break RunOutcome::Interrupted;
                }
                event = self.events.recv() => match event {
                    Some(event) => self.dispatch(map_event(event)),
                    None => {
                        vid_warn!("Engine event channel closed");
                        break RunOutcome::Interrupted;
                    }
                },
            }
        };
        self.teardown();
        outcome
    }

    fn outcome(&mut self) -> Option<RunOutcome> {
        if self.state.is_submitting() {
            return None;
        }
        let Some(record) = self.state.sessions().iter().next().cloned() else {
            let message = self
                .state
                .notice()
                .map(|notice| notice.text.clone())
                .unwrap_or_else(|| GENERIC_START_FAILURE.to_string());
            return Some(RunOutcome::SubmissionFailed(message));
        };
        let session_id = record.id().to_string();
        match record.status() {
            JobStatus::Queued | JobStatus::Processing => None,
            JobStatus::Failed => Some(RunOutcome::JobFailed {
                session_id,
                message: record
                    .error_message()
                    .unwrap_or(GENERIC_JOB_FAILURE)
                    .to_string(),
            }),
            JobStatus::Completed if !self.auto_retrieve => {
                Some(RunOutcome::Completed { session_id })
            }
            JobStatus::Completed => match self.state.retrieval(&session_id) {
                Some(RetrievalState::InFlight) => None,
                Some(RetrievalState::Saved { path, bytes }) => Some(RunOutcome::Saved {
                    path: path.clone(),
                    bytes: *bytes,
                }),
                Some(RetrievalState::Failed(message)) => Some(RunOutcome::RetrievalFailed {
                    session_id,
                    message: message.clone(),
                }),
                None if self.retrieval_requested => {
                    let message = self
                        .state
                        .notice()
                        .map(|notice| notice.text.clone())
                        .unwrap_or_default();
                    Some(RunOutcome::NotRetrievable {
                        session_id,
                        message,
                    })
                }
                None => {
                    vid_debug!("Session {} completed; retrieving", session_id);
                    self.retrieval_requested = true;
                    self.dispatch(Msg::RetrieveClicked { session_id });
                    self.outcome()
                }
            },
        }
    }

    fn teardown(&mut self) {
        self.dispatch(Msg::Shutdown);
        self.runner.shutdown();
    }
}
