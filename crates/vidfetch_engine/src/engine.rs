use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vidfetch_logging::{vid_debug, vid_info};

use crate::backend::{Backend, BackendSettings, ReqwestBackend};
use crate::scheduler::{PollScheduler, DEFAULT_POLL_INTERVAL};
use crate::{BackendError, EngineEvent, SessionId, StartRequest};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub backend: BackendSettings,
    pub poll_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Runs backend requests and the poll timer, reporting through one channel.
///
/// Every request runs as its own task, so requests never wait on each other.
/// After [`EngineHandle::shutdown`] no new work starts and results of work
/// still in flight are dropped instead of delivered.
///
/// All methods that start work must be called from within a tokio runtime.
pub struct EngineHandle {
    backend: Arc<dyn Backend>,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    scheduler: PollScheduler,
    cancel: CancellationToken,
}

impl EngineHandle {
    pub fn new(
        settings: EngineSettings,
    ) -> Result<(Self, mpsc::UnboundedReceiver<EngineEvent>), BackendError> {
        let backend = ReqwestBackend::new(settings.backend)?;
        Ok(Self::with_backend(Arc::new(backend), settings.poll_interval))
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let scheduler = PollScheduler::new(poll_interval, cancel.clone());
        let handle = Self {
            backend,
            event_tx,
            scheduler,
            cancel,
        };
        (handle, event_rx)
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn start(&self, request: StartRequest) {
        self.spawn_request(move |backend| async move {
            let result = backend.start(&request).await;
            EngineEvent::StartCompleted { request, result }
        });
    }

    pub fn poll(&self, session_id: SessionId) {
        self.spawn_request(move |backend| async move {
            let result = backend.status(&session_id).await;
            EngineEvent::StatusReported { session_id, result }
        });
    }

    pub fn retrieve(&self, session_id: SessionId, filename_hint: Option<String>) {
        self.spawn_request(move |backend| async move {
            let result = backend
                .retrieve(&session_id, filename_hint.as_deref())
                .await;
            EngineEvent::RetrievalCompleted { session_id, result }
        });
    }

    /// Arms the poll timer; a no-op while it is already running.
    pub fn start_polling(&mut self) {
        let tx = self.event_tx.clone();
        let shutdown = self.cancel.clone();
        self.scheduler.arm(move || {
            !shutdown.is_cancelled() && tx.send(EngineEvent::PollTick).is_ok()
        });
    }

    pub fn stop_polling(&mut self) {
        self.scheduler.disarm();
    }

    /// Cancels the poll timer and discards results of in-flight requests.
    pub fn shutdown(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        vid_info!("Engine shutting down");
        self.scheduler.disarm();
        self.cancel.cancel();
    }

    fn spawn_request<F, Fut>(&self, make: F)
    where
        F: FnOnce(Arc<dyn Backend>) -> Fut,
        Fut: std::future::Future<Output = EngineEvent> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            vid_debug!("Engine shut down; request not started");
            return;
        }
        let future = make(self.backend.clone());
        let tx = self.event_tx.clone();
        let shutdown = self.cancel.clone();
        tokio::spawn(async move {
            let event = future.await;
            if shutdown.is_cancelled() {
                vid_debug!("Discarding result after shutdown: {:?}", event);
                return;
            }
            let _ = tx.send(event);
        });
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
