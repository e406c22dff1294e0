use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{Answer, Dispatcher, Failure};

#[derive(Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

/// Reply from `GET {base}/health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// HTTP client for the question-answering backend
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<Health> {
        let url = self.endpoint("health");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Health check failed with status: {}", response.status()));
        }

        let health: Health = response.json().await?;
        Ok(health)
    }
}

#[async_trait]
impl Dispatcher for ChatClient {
    async fn ask(&self, question: &str) -> Result<Answer, Failure> {
        let url = self.endpoint("chat");
        debug!(%url, "sending question");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { question })
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            let failure = status_failure(status.as_u16(), &body);
            warn!(status = status.as_u16(), "backend rejected question");
            return Err(failure);
        }

        serde_json::from_str::<Answer>(&body).map_err(|e| {
            warn!(error = %e, "backend sent a malformed answer");
            Failure::from_message(format!("Malformed response: {}", e))
        })
    }
}

fn transport_failure(error: reqwest::Error) -> Failure {
    warn!(error = %error, "request to backend failed");
    Failure {
        detail: None,
        status: error.status().map(|s| s.as_u16()),
        message: Some(error.to_string()),
    }
}

/// Build a failure from a non-success response, pulling `detail` out of the
/// body when it is JSON. FastAPI sends validation errors as a list, which
/// is kept as compact JSON.
fn status_failure(status: u16, body: &str) -> Failure {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned())
        .and_then(|detail| match detail {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

    Failure {
        detail,
        status: Some(status),
        message: Some(format!("Request failed with status code {}", status)),
    }
}
