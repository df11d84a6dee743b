//! HTTP client for the CORE memory API.
//!
//! Credentials and base URL are read from extension storage on every call,
//! so a key saved from the settings screen takes effect on the next request.
//! Each call makes exactly one attempt.

use super::types::{
    AddEpisodeRequest, DeepSearchQuery, DeepSearchRequest, DeepSearchResponse, DeepSearchRun,
    EPISODE_SOURCE, LogsResponse, Space, SpacesResponse,
};
use super::RemoteLog;
use crate::error::RemoteError;
use crate::storage::ExtensionSettings;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

pub struct CoreClient {
    http: Client,
    settings: ExtensionSettings,
}

struct Credentials {
    api_key: String,
    base_url: String,
}

impl CoreClient {
    pub fn new(settings: ExtensionSettings, http: Client) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &ExtensionSettings {
        &self.settings
    }

    async fn credentials(&self) -> Result<Credentials, RemoteError> {
        let api_key = match self.settings.api_key().await {
            Ok(Some(key)) => key,
            Ok(None) => return Err(RemoteError::Unauthenticated),
            Err(error) => {
                tracing::warn!(%error, "could not read API key from storage");
                return Err(RemoteError::Unauthenticated);
            }
        };
        let base_url = self
            .settings
            .api_base_url()
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "could not read API base URL, using default");
                crate::storage::DEFAULT_API_BASE_URL.to_string()
            });
        Ok(Credentials { api_key, base_url })
    }

    async fn send(endpoint: &str, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::transport(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = body.chars().take(200).collect::<String>();
            return Err(RemoteError::transport(
                endpoint,
                format!("HTTP {status}: {detail}"),
            ));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        Self::send(endpoint, request)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::transport(endpoint, format!("JSON decode failed: {e}")))
    }

    /// `POST /add`. `session_id` ties the episode to a conversation log.
    pub async fn add_episode(
        &self,
        episode_body: &str,
        session_id: Option<&str>,
    ) -> Result<(), RemoteError> {
        let creds = self.credentials().await?;
        let body = AddEpisodeRequest {
            episode_body,
            reference_time: Utc::now(),
            session_id,
            source: EPISODE_SOURCE,
        };
        let request = self
            .http
            .post(format!("{}/add", creds.base_url))
            .bearer_auth(&creds.api_key)
            .json(&body);
        Self::send("add", request).await?;
        Ok(())
    }

    /// `GET /logs?sessionId=..&limit=..`
    pub async fn fetch_logs(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<LogsResponse, RemoteError> {
        let creds = self.credentials().await?;
        let limit = limit.to_string();
        let request = self
            .http
            .get(format!("{}/logs", creds.base_url))
            .bearer_auth(&creds.api_key)
            .query(&[("sessionId", session_id), ("limit", limit.as_str())]);
        Self::send_json("logs", request).await
    }

    /// `GET /spaces`
    pub async fn fetch_spaces(&self) -> Result<Vec<Space>, RemoteError> {
        let creds = self.credentials().await?;
        let request = self
            .http
            .get(format!("{}/spaces", creds.base_url))
            .bearer_auth(&creds.api_key);
        let response: SpacesResponse = Self::send_json("spaces", request).await?;
        Ok(response.spaces)
    }

    /// `POST /deep-search`, starting a run whose answer is read from the
    /// realtime stream.
    pub async fn create_deep_search(
        &self,
        query: &str,
        url: &str,
        title: Option<&str>,
    ) -> Result<DeepSearchRun, RemoteError> {
        let creds = self.credentials().await?;
        let content = serde_json::to_string(&DeepSearchQuery { query, url, title })
            .map_err(|e| RemoteError::transport("deep-search", e))?;
        let request = self
            .http
            .post(format!("{}/deep-search", creds.base_url))
            .bearer_auth(&creds.api_key)
            .json(&DeepSearchRequest {
                content,
                stream: false,
            });
        let response: DeepSearchResponse = Self::send_json("deep-search", request).await?;
        Ok(DeepSearchRun {
            id: response.id,
            token: response.public_access_token,
        })
    }
}

#[async_trait]
impl RemoteLog for CoreClient {
    async fn append_episode(&self, body: &str, conversation_id: &str) -> Result<(), RemoteError> {
        self.add_episode(body, Some(conversation_id)).await
    }

    async fn fetch_turn_count(&self, conversation_id: &str) -> Result<u64, RemoteError> {
        Ok(self.fetch_logs(conversation_id, 1).await?.total_count())
    }
}
