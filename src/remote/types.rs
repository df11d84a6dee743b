use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `source` field stamped on every episode this crate submits.
pub const EPISODE_SOURCE: &str = "Core extension";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddEpisodeRequest<'a> {
    pub episode_body: &'a str,
    pub reference_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    pub source: &'a str,
}

/// Response of `GET /logs`. Only the count matters to the sync core.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub logs: Vec<serde_json::Value>,
}

impl LogsResponse {
    pub fn total_count(&self) -> u64 {
        self.total_count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpacesResponse {
    #[serde(default)]
    pub spaces: Vec<Space>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeepSearchQuery<'a> {
    pub query: &'a str,
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeepSearchRequest {
    /// JSON-encoded [`DeepSearchQuery`]
    pub content: String,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeepSearchResponse {
    pub id: String,
    pub public_access_token: String,
}

/// Handle on a started deep-search run and the token that reads its stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepSearchRun {
    pub id: String,
    pub token: String,
}
