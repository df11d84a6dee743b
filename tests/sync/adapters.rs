use std::sync::Arc;
use std::time::Duration;

use coresync::platforms::{HostPage, Platform, SnapshotPage, adapter_for};
use coresync::remote::CoreClient;
use coresync::storage::{ExtensionSettings, MemoryStore};
use coresync::sync::{SyncEngine, SyncOutcome, SyncState};
use reqwest::Client;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHATGPT_URL: &str = "https://chatgpt.com/c/68ef5240-9070-8324-80a8-f6793b34b6da";
const GEMINI_URL: &str = "https://gemini.google.com/app/e42441d556a9debc";

fn chatgpt_article(role: &str, body: &str, finished: bool) -> String {
    let marker = if finished {
        r#"<button data-testid="good-response-turn-action-button"></button>"#
    } else {
        ""
    };
    format!(
        r#"<article data-turn="{role}"><div data-message-author-role="{role}">{body}</div>{marker}</article>"#
    )
}

async fn engine_for(server: &MockServer) -> SyncEngine {
    let settings = ExtensionSettings::new(Arc::new(MemoryStore::new()));
    settings.set_api_base_url(&server.uri()).await.unwrap();
    settings.set_api_key("rc_pat_e2e").await.unwrap();
    let client = CoreClient::new(settings.clone(), Client::new());
    let state = Arc::new(SyncState::new(settings.clone(), Duration::from_secs(120)));
    SyncEngine::new(Arc::new(client), state, settings)
}

async fn mount_count(server: &MockServer, session: &str, count: u64) {
    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param("sessionId", session))
        .and(query_param("limit", "1"))
        .and(header("authorization", "Bearer rc_pat_e2e"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"totalCount": count, "logs": []})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn chatgpt_snapshot_syncs_only_new_finished_pairs() {
    let server = MockServer::start().await;
    let session = "68ef5240-9070-8324-80a8-f6793b34b6da";
    mount_count(&server, session, 1).await;
    Mock::given(method("POST"))
        .and(path("/add"))
        .and(body_partial_json(serde_json::json!({
            "episodeBody": "User: What is **Rust**?\n\nAssistant: A systems language.",
            "sessionId": session,
            "source": "Core extension"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let html = [
        chatgpt_article("user", "<p>hello</p>", false),
        chatgpt_article("assistant", "<p>hi there</p>", true),
        chatgpt_article("user", "<p>What is <strong>Rust</strong>?</p>", false),
        chatgpt_article("assistant", "<p>A systems language.</p>", true),
        chatgpt_article("user", "<p>and Go?</p>", false),
        chatgpt_article("assistant", "<p>Still typing</p>", false),
    ]
    .concat();

    let tmp = TempDir::new().unwrap();
    let snapshot = tmp.path().join("page.html");
    std::fs::write(&snapshot, format!("<html><body><main>{html}</main></body></html>")).unwrap();
    let page = Arc::new(SnapshotPage::from_file(CHATGPT_URL, &snapshot).unwrap());
    let adapter = adapter_for(Platform::ChatGpt, page as Arc<dyn HostPage>);

    let engine = engine_for(&server).await;
    let outcome = engine.run(adapter.as_ref()).await;
    assert!(
        matches!(outcome, SyncOutcome::Synced { appended: 1, remote_count: 1, .. }),
        "unexpected outcome: {outcome}"
    );
}

#[tokio::test]
async fn gemini_snapshot_without_conversation_id_sends_nothing() {
    let server = MockServer::start().await;
    let page = Arc::new(SnapshotPage::new(
        "https://gemini.google.com/app",
        r#"<infinite-scroller class="chat-history"><div>
            <user-query-content><p>hi</p></user-query-content>
            <message-content><p>hello</p></message-content><message-actions></message-actions>
        </div></infinite-scroller>"#,
    ));
    let adapter = adapter_for(Platform::Gemini, page as Arc<dyn HostPage>);

    let engine = engine_for(&server).await;
    assert!(matches!(
        engine.run(adapter.as_ref()).await,
        SyncOutcome::MissingConversationId
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn gemini_snapshot_up_to_date_makes_no_append() {
    let server = MockServer::start().await;
    mount_count(&server, "e42441d556a9debc", 5).await;
    let page = Arc::new(SnapshotPage::new(
        GEMINI_URL,
        r#"<infinite-scroller class="chat-history"><div>
            <user-query-content><p>hi</p></user-query-content>
            <message-content><p>hello</p></message-content><message-actions></message-actions>
        </div></infinite-scroller>"#,
    ));
    let adapter = adapter_for(Platform::Gemini, page as Arc<dyn HostPage>);

    let engine = engine_for(&server).await;
    assert!(matches!(
        engine.run(adapter.as_ref()).await,
        SyncOutcome::UpToDate { remote_count: 5, pairs: 1 }
    ));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/add"));
}
