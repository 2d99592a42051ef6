use std::future::pending;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use vidfetch_app::{Coordinator, RunOutcome, TerminalRenderer};
use vidfetch_core::{Format, JobRequest, Quality};
use vidfetch_engine::{BackendSettings, EngineHandle, EngineSettings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RUN_LIMIT: Duration = Duration::from_secs(10);

fn coordinator(server: &MockServer, output: &TempDir, auto_retrieve: bool) -> Coordinator {
    let settings = EngineSettings {
        backend: BackendSettings {
            base_url: format!("{}/api/download", server.uri()),
            output_dir: output.path().to_path_buf(),
            ..BackendSettings::default()
        },
        poll_interval: Duration::from_millis(100),
    };
    let (engine, events) = EngineHandle::new(settings).expect("engine");
    Coordinator::with_renderer(engine, events, auto_retrieve, TerminalRenderer::quiet())
}

fn request(url: &str) -> JobRequest {
    JobRequest {
        url: url.to_string(),
        quality: Quality::P720,
        format: Format::Mp4,
    }
}

async fn mount_start(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/download/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "downloadId": id })))
        .expect(1)
        .mount(server)
        .await;
}

async fn run(coordinator: &mut Coordinator, job: JobRequest) -> RunOutcome {
    tokio::time::timeout(RUN_LIMIT, coordinator.run(job, pending()))
        .await
        .expect("run finished in time")
}

#[tokio::test]
async fn completed_job_is_saved_to_output_dir() {
    let server = MockServer::start().await;
    mount_start(&server, "abc123").await;
    Mock::given(method("GET"))
        .and(path("/api/download/status/abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "abc123", "status": "processing" })),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/download/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc123",
            "status": "completed",
            "downloadUrl": "/api/download/file/abc123",
            "filename": "clip.mp4"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/download/file/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &output, true);
    let outcome = run(&mut coordinator, request("  https://example.com/v  ")).await;

    let saved = output.path().join("clip.mp4");
    assert_eq!(
        outcome,
        RunOutcome::Saved {
            path: saved.clone(),
            bytes: 11
        }
    );
    assert_eq!(std::fs::read(&saved).unwrap(), b"video-bytes");
    assert!(coordinator.state().is_shut_down());
    assert!(!coordinator.state().is_polling());
}

#[tokio::test]
async fn failed_job_stops_polling() {
    let server = MockServer::start().await;
    mount_start(&server, "bad1").await;
    Mock::given(method("GET"))
        .and(path("/api/download/status/bad1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bad1",
            "status": "failed",
            "error": "unsupported URL"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &output, true);
    let outcome = run(&mut coordinator, request("https://example.com/nope")).await;

    assert_eq!(
        outcome,
        RunOutcome::JobFailed {
            session_id: "bad1".to_string(),
            message: "unsupported URL".to_string()
        }
    );
    // A few more intervals pass without another status request.
    tokio::time::sleep(Duration::from_millis(250)).await;
    server.verify().await;
}

#[tokio::test]
async fn completed_job_without_retrieval_stops_at_completed() {
    let server = MockServer::start().await;
    mount_start(&server, "done1").await;
    Mock::given(method("GET"))
        .and(path("/api/download/status/done1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "downloadUrl": "/api/download/file/done1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/download/file/done1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &output, false);
    let outcome = run(&mut coordinator, request("https://example.com/v")).await;

    assert_eq!(
        outcome,
        RunOutcome::Completed {
            session_id: "done1".to_string()
        }
    );
}

#[tokio::test]
async fn backend_rejection_is_reported_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/start"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "unsupported site" })))
        .expect(1)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &output, true);
    let outcome = run(&mut coordinator, request("https://example.com/v")).await;

    assert_eq!(
        outcome,
        RunOutcome::SubmissionFailed("Error: unsupported site".to_string())
    );
    assert!(coordinator.state().sessions().is_empty());
}

#[tokio::test]
async fn blank_url_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &output, true);
    let outcome = run(&mut coordinator, request("   \t ")).await;

    assert_eq!(outcome, RunOutcome::NothingToSubmit);
}

#[tokio::test]
async fn interrupt_ends_a_stuck_job() {
    let server = MockServer::start().await;
    mount_start(&server, "slow1").await;
    Mock::given(method("GET"))
        .and(path("/api/download/status/slow1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "queued" })))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &output, true);
    let outcome = tokio::time::timeout(
        RUN_LIMIT,
        coordinator.run(
            request("https://example.com/v"),
            tokio::time::sleep(Duration::from_millis(250)),
        ),
    )
    .await
    .expect("interrupted in time");

    assert_eq!(outcome, RunOutcome::Interrupted);
    assert!(coordinator.state().is_shut_down());
}
