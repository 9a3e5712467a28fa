//! Client for a running explainer server.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::api::{StatusReport, UploadResponse};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Job {uid} not done after {waited:?}")]
    Timeout { uid: String, waited: Duration },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Uploads decks and polls their status.
#[derive(Debug, Clone)]
pub struct ExplainerClient {
    base_url: String,
    http: reqwest::Client,
}

impl ExplainerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Upload a deck, returning its uid.
    pub async fn upload(&self, path: &Path) -> Result<String, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        self.upload_bytes(&file_name, bytes).await
    }

    pub async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = Self::check(response).await?.json().await?;
        Ok(body.uid)
    }

    pub async fn status(&self, uid: &str) -> Result<StatusReport, ClientError> {
        let response = self
            .http
            .get(format!("{}/status", self.base_url))
            .query(&[("uid", uid)])
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    /// Poll until the job is done or `timeout` elapses.
    pub async fn wait_until_done(
        &self,
        uid: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<StatusReport, ClientError> {
        let started = tokio::time::Instant::now();
        loop {
            let report = self.status(uid).await?;
            if report.is_done() {
                return Ok(report);
            }
            if started.elapsed() >= timeout {
                return Err(ClientError::Timeout {
                    uid: uid.to_string(),
                    waited: started.elapsed(),
                });
            }
            tracing::debug!(uid, "Job pending");
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.code, body.message),
            Err(_) => ("unknown".to_string(), text),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
