//! HTTP client for the detection backend
//!
//! One multipart POST per analysis, routed by media kind to
//! `/api/detect/{image,audio,video}`. Failures are never retried here; the
//! caller reports a generic message and returns the session to the upload
//! state.

use crate::media::{FileInfo, MediaKind};
use crate::normalize::RawResult;
use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Upload + classification can take a while for video, so the timeout is
/// generous. The backend itself caps per-file processing below this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {0}")]
    Status(StatusCode),

    #[error("backend returned a malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Client for one backend instance. Cheap to clone; safe to share across
/// rayon workers.
#[derive(Debug, Clone)]
pub struct DetectorClient {
    base_url: String,
    http: Client,
}

impl DetectorClient {
    /// Build a client for the given base URL (e.g. `http://localhost:8080`).
    /// Trailing slashes are trimmed so endpoint joins stay predictable.
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a file and return the raw (unnormalized) classification
    /// payload. The multipart field name is `file`, matching the backend's
    /// FastAPI signature.
    pub fn detect(&self, file: &FileInfo) -> Result<RawResult, DetectError> {
        let bytes = std::fs::read(&file.path).map_err(|e| DetectError::FileRead {
            path: file.path.display().to_string(),
            source: e,
        })?;

        let part = multipart::Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(file.kind.mime())
            .map_err(DetectError::Transport)?;
        let form = multipart::Form::new().part("file", part);

        let url = format!("{}{}", self.base_url, self.endpoint_for(file.kind));
        let response = self.http.post(&url).multipart(form).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectError::Status(status));
        }

        let body = response.text()?;
        let raw: RawResult = serde_json::from_str(&body)?;
        Ok(raw)
    }

    /// Probe the backend's health endpoint.
    pub fn health(&self) -> Result<(), DetectError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).send()?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DetectError::Status(status))
        }
    }

    fn endpoint_for(&self, kind: MediaKind) -> &'static str {
        kind.endpoint()
    }
}
