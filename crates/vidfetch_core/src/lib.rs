//! Vidfetch core: pure session state machine and view-model helpers.
//!
//! Nothing in here performs IO. The app feeds [`Msg`]s into [`update`] and
//! executes the returned [`Effect`]s through the engine.
mod effect;
mod error;
mod msg;
mod request;
mod session;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{RetrievalError, SubmissionError};
pub use msg::{Msg, RetrievalOutcome};
pub use request::{Format, JobRequest, ParseParamError, Quality};
pub use session::{
    JobStatus, ReconcileError, Reconciled, SessionId, SessionRecord, SessionSnapshot,
    SessionStore, StatusPatch,
};
pub use state::{AppState, Notice, NoticeLevel, RetrievalState};
pub use update::{retrieve, update};
pub use view_model::{status_text, AppViewModel, SessionRowView};
