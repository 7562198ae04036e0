//! HTTP client for the queue service.
//!
//! Endpoints:
//! - GET /queue/list
//! - PUT /queue/updateCall

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::QueueApi;
use crate::domain::{QueueListResponse, TurnId};

/// Errors talking to the queue service
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Queue service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Body of `PUT /queue/updateCall`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCallPayload {
    id: TurnId,
    is_called: bool,
}

/// reqwest-backed queue client
pub struct HttpQueueApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpQueueApi {
    /// Create a client for `base_url` (e.g. `http://host:3000/api`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build an endpoint URL
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl QueueApi for HttpQueueApi {
    async fn fetch_queue(&self) -> Result<QueueListResponse, ApiError> {
        let response = self.client.get(self.url("queue/list")).send().await?;
        let response = Self::check(response).await?;

        let bytes = response.bytes().await?;
        let list: QueueListResponse = serde_json::from_slice(&bytes)?;
        debug!(
            pending = list.pending_turns.len(),
            in_progress = list.in_progress_turns.len(),
            calling = list.in_calling_turns.len(),
            "Fetched queue list"
        );
        Ok(list)
    }

    async fn acknowledge_call(&self, id: TurnId) -> Result<(), ApiError> {
        let payload = UpdateCallPayload { id, is_called: true };
        let response = self
            .client
            .put(self.url("queue/updateCall"))
            .json(&payload)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
