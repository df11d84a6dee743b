use anyhow::{Context, Result, bail};
use coresync::Config;
use coresync::platforms::{HostPage, Platform, PlatformAdapter, SnapshotPage, adapter_for};
use coresync::remote::{CoreClient, TriggerStream, build_http_client, build_streaming_client};
use coresync::storage::{ExtensionSettings, FileStore};
use coresync::sync::{AutoSyncController, SyncEngine, SyncState};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs, wired from one loaded [`Config`].
pub struct AppContext {
    pub config: Arc<Config>,
    pub settings: ExtensionSettings,
    http: Client,
}

/// A page snapshot together with the adapter for its platform.
pub struct OpenedPage {
    pub page: Arc<SnapshotPage>,
    pub adapter: Arc<dyn PlatformAdapter>,
}

impl AppContext {
    /// Open extension storage and copy configured credentials into it.
    pub async fn from_config(config: Config) -> Result<Self> {
        let store_path = config.storage.resolved_path();
        let settings = ExtensionSettings::new(Arc::new(FileStore::new(store_path.clone())));

        if let Some(api_key) = config.api_key.as_deref() {
            settings
                .set_api_key(api_key)
                .await
                .context("Failed to store API key")?;
        }
        if let Some(base_url) = config.api_base_url.as_deref() {
            settings
                .set_api_base_url(base_url)
                .await
                .context("Failed to store API base URL")?;
        }
        settings
            .set_sync_interval_ms(config.sync.interval_ms)
            .await
            .context("Failed to store sync interval")?;

        let http = build_http_client(&config.http);
        tracing::debug!(storage = %store_path.display(), "extension storage opened");
        Ok(Self {
            config: Arc::new(config),
            settings,
            http,
        })
    }

    pub fn client(&self) -> CoreClient {
        CoreClient::new(self.settings.clone(), self.http.clone())
    }

    pub fn trigger_stream(&self) -> TriggerStream {
        TriggerStream::new(
            build_streaming_client(&self.config.http),
            &self.config.stream.trigger_base_url,
        )
    }

    pub fn engine(&self) -> Arc<SyncEngine> {
        let state = Arc::new(SyncState::new(
            self.settings.clone(),
            Duration::from_secs(self.config.sync.stale_lock_secs),
        ));
        Arc::new(SyncEngine::new(
            Arc::new(self.client()),
            state,
            self.settings.clone(),
        ))
    }

    pub fn controller(&self, adapter: Arc<dyn PlatformAdapter>) -> AutoSyncController {
        AutoSyncController::new(
            self.engine(),
            adapter,
            self.settings.clone(),
            Duration::from_millis(self.config.sync.status_poll_ms),
        )
    }

    pub fn open_page(url: &str, html: &Path) -> Result<OpenedPage> {
        let Some(platform) = Platform::detect(url) else {
            bail!("Unsupported page: {url} (expected ChatGPT or Gemini)");
        };
        let page = Arc::new(
            SnapshotPage::from_file(url, html)
                .with_context(|| format!("Failed to open page snapshot {}", html.display()))?,
        );
        let adapter = adapter_for(platform, Arc::clone(&page) as Arc<dyn HostPage>);
        Ok(OpenedPage { page, adapter })
    }
}
