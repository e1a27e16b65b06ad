//! HTTP client for the grader API (the request layer a frontend uses).

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::gateway::payload::{CompareRequest, CompareResponse, GenerateRequest, GenerateResponse};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct GraderClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for GraderClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl GraderClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    ?timeout,
                    "HTTP client build failed, falling back to a client without a timeout"
                );
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Asks the server for a model answer. The answer comes back trimmed.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<String, ClientError> {
        let response: GenerateResponse = self.post_json("/generate", request).await?;
        Ok(response.rag_answer.trim().to_string())
    }

    pub async fn compare(
        &self,
        rag_answer: &str,
        user_answer: &str,
    ) -> Result<f64, ClientError> {
        let request = CompareRequest {
            rag_answer: rag_answer.to_string(),
            user_answer: user_answer.to_string(),
        };
        let response: CompareResponse = self.post_json("/compare", &request).await?;
        Ok(response.cosine_similarity)
    }

    /// POSTs `body` as JSON; any non-2xx status is an error carrying the response text.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}
