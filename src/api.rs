//! HTTP client for the generation backend.
//!
//! The backend replies with a JSON object carrying a `message` field. The
//! status code is not inspected: any body that parses as JSON counts as a
//! reply, whatever the backend says inside it.

use crate::form::GenerationRequest;
use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const GENERATE_PATH: &str = "/api/generate";
pub const CANCEL_PATH: &str = "/api/cancel";

/// A parsed backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub data: Value,
}

impl ApiReply {
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }

    /// Text shown to the user for this reply.
    ///
    /// Falls back to the raw `message` value, then to the whole payload, when
    /// the reply does not carry a string message.
    #[must_use]
    pub fn notice_text(&self) -> String {
        if let Some(message) = self.message() {
            return message.to_owned();
        }
        match self.data.get("message") {
            Some(other) => other.to_string(),
            None => self.data.to_string(),
        }
    }
}

/// Transport or parse failure of a backend request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} was not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    generate_url: Url,
    cancel_url: Url,
}

impl BackendClient {
    /// * `base_url` - backend origin, e.g. `http://localhost:8080`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid backend url '{base_url}'"))?;
        let generate_url = base
            .join(GENERATE_PATH)
            .context("failed building generate endpoint url")?;
        let cancel_url = base
            .join(CANCEL_PATH)
            .context("failed building cancel endpoint url")?;
        Ok(Self {
            client,
            generate_url,
            cancel_url,
        })
    }

    #[must_use]
    pub fn generate_url(&self) -> &Url {
        &self.generate_url
    }

    /// `POST /api/generate` with the request as JSON.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<ApiReply, ApiError> {
        self.post(&self.generate_url, Some(request)).await
    }

    /// `POST /api/cancel` with no body.
    pub async fn cancel(&self) -> Result<ApiReply, ApiError> {
        self.post(&self.cancel_url, None).await
    }

    async fn post(
        &self,
        url: &Url,
        body: Option<&GenerationRequest>,
    ) -> Result<ApiReply, ApiError> {
        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let request_error = |source| ApiError::Request {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let raw = response.text().await.map_err(request_error)?;
        debug!(%url, %status, bytes = raw.len(), "backend replied");

        let data = serde_json::from_str::<Value>(&raw).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok(ApiReply { data })
    }
}
