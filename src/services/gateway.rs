//! Authenticated client for the Certifact backend API.
//!
//! Every protected call attaches the opaque bearer token from configuration.
//! Response payloads are deserialized into typed DTOs and validated at this
//! boundary; a malformed payload fails with [`GatewayError::Parse`] instead
//! of leaking a partially populated object into the tracker or history.

use std::time::Duration;

use garde::Validate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::models::result::AnalysisResult;

/// Upload acknowledgement: the backend assigns the job id.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "jobId")]
    job_id: String,
}

/// Backend-reported job state, as served by `GET /api/status/{jobId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Queued,
    Processing,
    Done,
    Error,
}

/// One status poll response.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: RemoteStatus,
    #[serde(rename = "resultId", default)]
    pub result_id: Option<String>,
}

/// Error body shape used by the backend for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("not authenticated: no bearer token is configured")]
    Auth,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("malformed response payload: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Transport-level faults (connect failures, timeouts, broken streams)
    /// are candidates for the tracker's bounded retry; everything else
    /// aborts the job immediately. `Http` only ever wraps send-side
    /// failures here — body decode errors are mapped to `Parse`.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Http(_))
    }
}

/// Client for the Certifact analysis backend.
#[derive(Debug)]
pub struct ApiGateway {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiGateway {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http,
            base_url,
            auth_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, failing fast when none is configured.
    fn authed(&self, req: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
        match &self.auth_token {
            Some(token) => Ok(req.bearer_auth(token)),
            None => Err(GatewayError::Auth),
        }
    }

    /// Map a non-2xx response to [`GatewayError::Api`], extracting the
    /// backend's `{error}` body when present and falling back to a generic
    /// message carrying the HTTP status code.
    async fn check(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("request failed with HTTP status {}", status.as_u16()),
        };
        Err(GatewayError::Api { status, message })
    }

    /// `POST /api/upload` — submit a media file for analysis.
    ///
    /// Returns the backend-assigned job id.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, GatewayError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("mediaFile", part);

        let response = self
            .authed(self.http.post(self.url("/api/upload")))?
            .multipart(form)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        if body.job_id.is_empty() {
            return Err(GatewayError::Parse("upload response has empty jobId".into()));
        }
        Ok(body.job_id)
    }

    /// `GET /api/status/{jobId}` — one poll of a job's state.
    pub async fn status(&self, job_id: &str) -> Result<StatusResponse, GatewayError> {
        let response = self
            .authed(self.http.get(self.url(&format!("/api/status/{job_id}"))))?
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    /// `GET /api/results/{resultId}` — fetch a finished analysis result.
    pub async fn result(&self, result_id: &str) -> Result<AnalysisResult, GatewayError> {
        let response = self
            .authed(
                self.http
                    .get(self.url(&format!("/api/results/{result_id}"))),
            )?
            .send()
            .await?;
        let response = Self::check(response).await?;
        let result: AnalysisResult = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        result
            .validate()
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        Ok(result)
    }

    /// `GET /api/history` — the backend's copy of the result history,
    /// most-recent-first.
    pub async fn history(&self) -> Result<Vec<AnalysisResult>, GatewayError> {
        let response = self
            .authed(self.http.get(self.url("/api/history")))?
            .send()
            .await?;
        let response = Self::check(response).await?;
        let results: Vec<AnalysisResult> = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        for result in &results {
            result
                .validate()
                .map_err(|e| GatewayError::Parse(e.to_string()))?;
        }
        Ok(results)
    }

    /// `GET /api/health` — backend liveness probe (unauthenticated).
    pub async fn health(&self) -> Result<(), GatewayError> {
        let response = self.http.get(self.url("/api/health")).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
