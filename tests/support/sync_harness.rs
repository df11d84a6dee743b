#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use coresync::error::RemoteError;
use coresync::platforms::{Platform, PlatformAdapter};
use coresync::remote::RemoteLog;
use coresync::storage::{ExtensionSettings, KeyValueStore, MemoryStore};
use coresync::sync::{ConversationPair, ConversationTurn, SyncEngine, SyncState};

/// In-memory episode log keyed by conversation id.
#[derive(Default)]
pub struct FakeLog {
    episodes: Mutex<HashMap<String, Vec<String>>>,
    /// Total successful appends after which appends start failing
    fail_appends_after: Mutex<Option<usize>>,
    fail_count: AtomicBool,
    count_delay: Mutex<Option<Duration>>,
    append_delay: Mutex<Option<Duration>>,
    appends: AtomicUsize,
    count_calls: AtomicUsize,
}

impl FakeLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn episodes(&self, conversation_id: &str) -> Vec<String> {
        self.episodes
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, conversation_id: &str, bodies: &[String]) {
        self.episodes
            .lock()
            .unwrap()
            .entry(conversation_id.to_string())
            .or_default()
            .extend(bodies.iter().cloned());
    }

    pub fn fail_appends_after(&self, limit: Option<usize>) {
        *self.fail_appends_after.lock().unwrap() = limit;
    }

    pub fn fail_count(&self, fail: bool) {
        self.fail_count.store(fail, Ordering::SeqCst);
    }

    pub fn delay_count(&self, delay: Duration) {
        *self.count_delay.lock().unwrap() = Some(delay);
    }

    pub fn delay_append(&self, delay: Duration) {
        *self.append_delay.lock().unwrap() = Some(delay);
    }

    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteLog for FakeLog {
    async fn append_episode(&self, body: &str, conversation_id: &str) -> Result<(), RemoteError> {
        let delay = *self.append_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let done = self.appends.load(Ordering::SeqCst);
        if self
            .fail_appends_after
            .lock()
            .unwrap()
            .is_some_and(|limit| done >= limit)
        {
            return Err(RemoteError::transport("add", "HTTP 503 Service Unavailable"));
        }
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.episodes
            .lock()
            .unwrap()
            .entry(conversation_id.to_string())
            .or_default()
            .push(body.to_string());
        Ok(())
    }

    async fn fetch_turn_count(&self, conversation_id: &str) -> Result<u64, RemoteError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.count_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("logs", "connection reset"));
        }
        Ok(self.episodes(conversation_id).len() as u64)
    }
}

/// Adapter over a mutable list of turns.
pub struct FakeAdapter {
    turns: Mutex<Vec<ConversationTurn>>,
    conversation_id: Mutex<Option<String>>,
}

impl FakeAdapter {
    pub fn new(conversation_id: &str, turns: Vec<ConversationTurn>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns),
            conversation_id: Mutex::new(Some(conversation_id.to_string())),
        })
    }

    pub fn set_turns(&self, turns: Vec<ConversationTurn>) {
        *self.turns.lock().unwrap() = turns;
    }

    pub fn push(&self, turn: ConversationTurn) {
        self.turns.lock().unwrap().push(turn);
    }
}

impl PlatformAdapter for FakeAdapter {
    fn platform(&self) -> Platform {
        Platform::ChatGpt
    }

    fn extract_conversation(&self) -> Vec<ConversationTurn> {
        self.turns.lock().unwrap().clone()
    }

    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.lock().unwrap().clone()
    }

    fn input_value(&self) -> String {
        String::new()
    }

    fn add_to_input(&self, _text: &str) {}
}

/// `n` well-formed user/assistant turns, two per pair.
pub fn conversation(pairs: usize) -> Vec<ConversationTurn> {
    (1..=pairs)
        .flat_map(|i| {
            [
                ConversationTurn::user(format!("question {i}")),
                ConversationTurn::assistant(format!("answer {i}")),
            ]
        })
        .collect()
}

pub fn bodies(pairs: usize) -> Vec<String> {
    (1..=pairs)
        .map(|i| {
            ConversationPair {
                user: format!("question {i}"),
                assistant: format!("answer {i}"),
            }
            .episode_body()
        })
        .collect()
}

pub fn memory_settings() -> ExtensionSettings {
    ExtensionSettings::new(Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>)
}

pub fn engine_with(log: Arc<FakeLog>, settings: &ExtensionSettings) -> Arc<SyncEngine> {
    engine_with_stale(log, settings, Duration::from_secs(120))
}

/// Engine with its own in-process guard over `settings`, so two engines on
/// the same store behave like two host contexts.
pub fn engine_with_stale(
    log: Arc<FakeLog>,
    settings: &ExtensionSettings,
    stale_after: Duration,
) -> Arc<SyncEngine> {
    let state = Arc::new(SyncState::new(settings.clone(), stale_after));
    Arc::new(SyncEngine::new(log, state, settings.clone()))
}
