use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use vidfetch_engine::{
    Backend, BackendError, EngineEvent, EngineHandle, RetrievedFile, StartRequest, StatusReport,
    WireStatus,
};

/// Answers status requests after a per-id delay.
#[derive(Default)]
struct FakeBackend {
    status_calls: AtomicUsize,
}

impl FakeBackend {
    fn delay_for(session_id: &str) -> Duration {
        if session_id.starts_with("slow") {
            Duration::from_millis(1500)
        } else {
            Duration::from_millis(100)
        }
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn start(&self, _request: &StartRequest) -> Result<String, BackendError> {
        sleep(Duration::from_millis(50)).await;
        Ok("abc123".to_string())
    }

    async fn status(&self, session_id: &str) -> Result<StatusReport, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        sleep(Self::delay_for(session_id)).await;
        Ok(StatusReport {
            id: Some(session_id.to_string()),
            status: WireStatus::Processing,
            filename: None,
            result_locator: None,
            error_message: None,
        })
    }

    async fn retrieve(
        &self,
        _session_id: &str,
        _filename_hint: Option<&str>,
    ) -> Result<RetrievedFile, BackendError> {
        unreachable!("not used in these tests")
    }
}

fn engine() -> (
    Arc<FakeBackend>,
    EngineHandle,
    tokio::sync::mpsc::UnboundedReceiver<EngineEvent>,
) {
    let backend = Arc::new(FakeBackend::default());
    let (handle, rx) = EngineHandle::with_backend(backend.clone(), Duration::from_millis(2000));
    (backend, handle, rx)
}

#[tokio::test(start_paused = true)]
async fn start_reports_accepted_id() {
    let (_backend, handle, mut rx) = engine();
    let request = StartRequest {
        url: "https://example.com/v".to_string(),
        quality: "best".to_string(),
        format: None,
    };
    handle.start(request.clone());

    match rx.recv().await.unwrap() {
        EngineEvent::StartCompleted { request: echoed, result } => {
            assert_eq!(echoed, request);
            assert_eq!(result, Ok("abc123".to_string()));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn status_requests_do_not_block_each_other() {
    let (_backend, handle, mut rx) = engine();
    handle.poll("slow-1".to_string());
    handle.poll("fast-1".to_string());

    let mut order = Vec::new();
    for _ in 0..2 {
        if let Some(EngineEvent::StatusReported { session_id, result }) = rx.recv().await {
            assert!(result.is_ok());
            order.push(session_id);
        }
    }
    // Applied in arrival order, not issue order.
    assert_eq!(order, vec!["fast-1".to_string(), "slow-1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn polling_emits_ticks_until_stopped() {
    let (_backend, mut handle, mut rx) = engine();
    handle.start_polling();
    handle.start_polling();
    assert!(handle.is_polling());

    sleep(Duration::from_millis(4100)).await;
    let mut ticks = 0;
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event, EngineEvent::PollTick);
        ticks += 1;
    }
    assert_eq!(ticks, 2);

    handle.stop_polling();
    sleep(Duration::from_millis(6000)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_in_flight_results_and_stops_ticks() {
    let (backend, mut handle, mut rx) = engine();
    handle.start_polling();
    handle.poll("slow-1".to_string());
    sleep(Duration::from_millis(500)).await;

    handle.shutdown();
    assert!(handle.is_shut_down());
    assert!(!handle.is_polling());

    // New work is refused outright.
    handle.poll("fast-1".to_string());

    sleep(Duration::from_millis(5000)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 1);
}
