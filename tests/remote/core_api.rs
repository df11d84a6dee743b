use std::sync::Arc;

use coresync::remote::CoreClient;
use coresync::storage::{ExtensionSettings, FileStore};
use reqwest::Client;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer, tmp: &TempDir) -> (ExtensionSettings, CoreClient) {
    let settings = ExtensionSettings::new(Arc::new(FileStore::new(tmp.path().join("s.json"))));
    settings.set_api_base_url(&format!("{}/api/v1/", server.uri())).await.unwrap();
    let client = CoreClient::new(settings.clone(), Client::new());
    (settings, client)
}

#[tokio::test]
async fn key_saved_after_construction_is_used_on_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/spaces"))
        .and(header("authorization", "Bearer rc_pat_late"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "spaces": [
                {"id": "sp_1", "name": "Work", "description": "Job notes", "summary": "Projects"},
                {"id": "sp_2", "name": "Home"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let (settings, client) = client(&server, &tmp).await;
    assert!(client.fetch_spaces().await.unwrap_err().is_unauthenticated());

    settings.set_api_key("rc_pat_late").await.unwrap();
    let spaces = client.fetch_spaces().await.unwrap();
    assert_eq!(spaces.len(), 2);
    assert_eq!(spaces[0].summary.as_deref(), Some("Projects"));
    assert!(spaces[1].description.is_none());
}

#[tokio::test]
async fn deep_search_wraps_query_as_json_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/deep-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "run_abc",
            "publicAccessToken": "tok_abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let (settings, client) = client(&server, &tmp).await;
    settings.set_api_key("rc_pat_ds").await.unwrap();

    let run = client
        .create_deep_search("summarize", "https://gemini.google.com/app/x", None)
        .await
        .unwrap();
    assert_eq!(run.id, "run_abc");
    assert_eq!(run.token, "tok_abc");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["stream"], false);
    let content: serde_json::Value =
        serde_json::from_str(body["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["query"], "summarize");
    assert!(content.get("title").is_none());
}

#[tokio::test]
async fn cleared_key_is_unauthenticated() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let (settings, client) = client(&server, &tmp).await;
    settings.set_api_key("rc_pat_x").await.unwrap();
    settings.clear_api_key().await.unwrap();

    let err = client.add_episode("note", None).await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert!(server.received_requests().await.unwrap().is_empty());
}
