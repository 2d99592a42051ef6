//! Vidfetch engine: backend client, poll timer and effect execution.
mod backend;
mod engine;
mod filename;
mod persist;
mod scheduler;
mod types;

pub use backend::{Backend, BackendSettings, ReqwestBackend, DEFAULT_BASE_URL};
pub use engine::{EngineHandle, EngineSettings};
pub use filename::result_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StagedFile};
pub use scheduler::{PollScheduler, DEFAULT_POLL_INTERVAL};
pub use types::{
    BackendError, EngineEvent, FailureKind, RetrievedFile, SessionId, StartRequest,
    StatusReport, WireStatus,
};
