use chrono::Utc;
use vidfetch_core::{
    Effect, JobRequest, JobStatus, Msg, RetrievalOutcome, StatusPatch, SubmissionError,
};
use vidfetch_engine::{EngineEvent, EngineHandle, StartRequest, StatusReport, WireStatus};
use vidfetch_logging::{vid_debug, vid_info};

/// Executes core effects on the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartJob(request) => {
                    vid_info!(
                        "StartJob url_len={} quality={} format={}",
                        request.url.len(),
                        request.quality,
                        request.format
                    );
                    self.engine.start(start_request(&request));
                }
                Effect::StartPolling => self.engine.start_polling(),
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::PollStatus { session_id } => {
                    vid_debug!("PollStatus id={}", session_id);
                    self.engine.poll(session_id);
                }
                Effect::RetrieveFile {
                    session_id,
                    filename_hint,
                } => {
                    vid_info!("RetrieveFile id={}", session_id);
                    self.engine.retrieve(session_id, filename_hint);
                }
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }
}

pub fn start_request(request: &JobRequest) -> StartRequest {
    StartRequest {
        url: request.url.clone(),
        quality: request.quality.as_wire().to_string(),
        format: request.format.as_wire().map(ToOwned::to_owned),
    }
}

/// Inverse of [`start_request`]; values it produced always parse.
fn job_request(request: StartRequest) -> JobRequest {
    JobRequest {
        quality: request.quality.parse().unwrap_or_default(),
        format: request
            .format
            .as_deref()
            .and_then(|format| format.parse().ok())
            .unwrap_or_default(),
        url: request.url,
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::StartCompleted { request, result } => match result {
            Ok(session_id) => Msg::SubmitAccepted {
                session_id,
                request: job_request(request),
                accepted_at: Utc::now(),
            },
            Err(err) if err.is_transport() => {
                Msg::SubmitFailed(SubmissionError::Network(err.message))
            }
            Err(err) => Msg::SubmitFailed(SubmissionError::Backend(err.message)),
        },
        EngineEvent::PollTick => Msg::PollTick,
        EngineEvent::StatusReported { session_id, result } => match result {
            Ok(report) => Msg::StatusReceived {
                session_id,
                patch: status_patch(report),
            },
            Err(err) => Msg::PollFailed {
                session_id,
                reason: err.to_string(),
            },
        },
        EngineEvent::RetrievalCompleted { session_id, result } => Msg::RetrievalFinished {
            session_id,
            outcome: match result {
                Ok(file) => RetrievalOutcome::Saved {
                    path: file.path,
                    bytes: file.bytes,
                },
                Err(err) => RetrievalOutcome::Failed {
                    message: err.to_string(),
                },
            },
        },
    }
}

fn status_patch(report: StatusReport) -> StatusPatch {
    StatusPatch {
        status: Some(map_status(report.status)),
        result_locator: report.result_locator,
        error_message: report.error_message,
        filename: report.filename,
    }
}

fn map_status(status: WireStatus) -> JobStatus {
    match status {
        WireStatus::Queued => JobStatus::Queued,
        WireStatus::Processing => JobStatus::Processing,
        WireStatus::Completed => JobStatus::Completed,
        WireStatus::Failed => JobStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidfetch_core::{Format, Quality};
    use vidfetch_engine::{BackendError, FailureKind};

    #[test]
    fn start_request_round_trips_parameters() {
        let request = JobRequest {
            url: "https://example.com/v".to_string(),
            quality: Quality::P360,
            format: Format::Auto,
        };
        let wire = start_request(&request);
        assert_eq!(wire.quality, "360p");
        assert_eq!(wire.format, None);
        assert_eq!(job_request(wire), request);
    }

    #[test]
    fn start_failures_split_into_backend_and_network() {
        let request = StartRequest {
            url: "u".to_string(),
            quality: "best".to_string(),
            format: None,
        };
        let rejected = map_event(EngineEvent::StartCompleted {
            request: request.clone(),
            result: Err(BackendError {
                kind: FailureKind::HttpStatus(400),
                message: "unsupported site".to_string(),
            }),
        });
        assert_eq!(
            rejected,
            Msg::SubmitFailed(SubmissionError::Backend("unsupported site".to_string()))
        );

        let offline = map_event(EngineEvent::StartCompleted {
            request,
            result: Err(BackendError {
                kind: FailureKind::Network,
                message: "connection refused".to_string(),
            }),
        });
        assert_eq!(
            offline,
            Msg::SubmitFailed(SubmissionError::Network("connection refused".to_string()))
        );
    }

    #[test]
    fn status_report_becomes_patch_with_absent_fields() {
        let msg = map_event(EngineEvent::StatusReported {
            session_id: "abc123".to_string(),
            result: Ok(StatusReport {
                id: Some("abc123".to_string()),
                status: WireStatus::Processing,
                filename: None,
                result_locator: None,
                error_message: None,
            }),
        });
        assert_eq!(
            msg,
            Msg::StatusReceived {
                session_id: "abc123".to_string(),
                patch: StatusPatch {
                    status: Some(JobStatus::Processing),
                    ..StatusPatch::default()
                },
            }
        );
    }
}
