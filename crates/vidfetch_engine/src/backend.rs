use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use vidfetch_logging::{vid_debug, vid_info};

use crate::filename::result_filename;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::{BackendError, FailureKind, RetrievedFile, StartRequest, StatusReport};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/download";

/// Shown when the backend refuses a job without saying why.
const START_FAILED: &str = "Failed to start download";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to start and status requests.
    pub request_timeout: Duration,
    /// Applies to the whole file transfer.
    pub retrieve_timeout: Duration,
    pub output_dir: PathBuf,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            retrieve_timeout: Duration::from_secs(300),
            output_dir: PathBuf::from("downloads"),
        }
    }
}

/// The download backend's REST surface.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `POST {base}/start`; returns the backend's job id.
    async fn start(&self, request: &StartRequest) -> Result<String, BackendError>;

    /// `GET {base}/status/{id}`.
    async fn status(&self, session_id: &str) -> Result<StatusReport, BackendError>;

    /// `GET {base}/file/{id}`, saved into the output directory.
    async fn retrieve(
        &self,
        session_id: &str,
        filename_hint: Option<&str>,
    ) -> Result<RetrievedFile, BackendError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    #[serde(default)]
    download_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let base = Url::parse(settings.base_url.trim())
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn start(&self, request: &StartRequest) -> Result<String, BackendError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint(&["start"]))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| START_FAILED.to_string());
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        let parsed: StartResponse = serde_json::from_slice(&bytes)
            .map_err(|_| BackendError::new(FailureKind::Decode, START_FAILED))?;
        match parsed.download_id {
            Some(id) if !id.trim().is_empty() => {
                vid_info!("Backend accepted job id={}", id);
                Ok(id)
            }
            _ => Err(BackendError::new(FailureKind::Decode, START_FAILED)),
        }
    }

    async fn status(&self, session_id: &str) -> Result<StatusReport, BackendError> {
        let response = self
            .client
            .get(self.endpoint(&["status", session_id]))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_status_error(status));
        }
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
    }

    async fn retrieve(
        &self,
        session_id: &str,
        filename_hint: Option<&str>,
    ) -> Result<RetrievedFile, BackendError> {
        let response = self
            .client
            .get(self.endpoint(&["file", session_id]))
            .timeout(self.settings.retrieve_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_status_error(status));
        }

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let filename = result_filename(disposition.as_deref(), filename_hint, session_id);
        vid_debug!("Retrieving {} into {}", session_id, filename);

        let writer = AtomicFileWriter::new(self.settings.output_dir.clone());
        let mut staged = writer.begin(&filename).map_err(map_persist_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            staged.write_chunk(&chunk).map_err(map_persist_error)?;
        }

        let bytes = staged.written();
        let path = staged.commit().map_err(map_persist_error)?;
        Ok(RetrievedFile { path, bytes })
    }
}

fn http_status_error(status: StatusCode) -> BackendError {
    BackendError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return BackendError::new(FailureKind::Decode, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

fn map_persist_error(err: PersistError) -> BackendError {
    BackendError::new(FailureKind::Io, err.to_string())
}
