//! HTTP document store
//!
//! Talks to the thoughts API: `GET`/`PUT {api}/api/v1/thoughts/{id}`.

use aimem_common::ApiConfig;
use aimem_core::traits::{DocumentStore, RepoResult};
use aimem_core::{DomainError, Thought, ThoughtId, ThoughtPatch};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;

/// `DocumentStore` backed by the thoughts HTTP API
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base: Url,
}

impl HttpDocumentStore {
    /// Create a store for the configured API
    pub fn new(config: &ApiConfig) -> RepoResult<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| DomainError::Internal(format!("Invalid API URL {}: {e}", config.url)))?;
        if base.cannot_be_a_base() {
            return Err(DomainError::Internal(format!("Invalid API URL {}", config.url)));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DomainError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    fn thought_url(&self, id: &ThoughtId) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v1", "thoughts", id.as_str()]);
        }
        url
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn fetch(&self, id: &ThoughtId) -> RepoResult<Thought> {
        let url = self.thought_url(id);
        tracing::debug!(url = %url, "GET thought");

        let response = self.client.get(url).send().await.map_err(backend)?;
        into_thought(response, id).await
    }

    async fn update(&self, id: &ThoughtId, patch: &ThoughtPatch) -> RepoResult<Thought> {
        let url = self.thought_url(id);
        tracing::debug!(url = %url, "PUT thought");

        let response = self
            .client
            .put(url)
            .json(patch)
            .send()
            .await
            .map_err(backend)?;
        into_thought(response, id).await
    }
}

async fn into_thought(response: Response, id: &ThoughtId) -> RepoResult<Thought> {
    let status = response.status();
    if status.is_success() {
        return response.json::<Thought>().await.map_err(backend);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(DomainError::ThoughtNotFound(id.clone())),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            Err(DomainError::Validation(detail(&body)))
        }
        other => {
            tracing::warn!(status = %other, thought_id = %id, "Document store request failed");
            Err(DomainError::Backend(format!("{other}: {}", detail(&body))))
        }
    }
}

/// Error detail from a `{"detail": ...}` body, or the raw body
fn detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn backend(err: reqwest::Error) -> DomainError {
    DomainError::Backend(err.to_string())
}
