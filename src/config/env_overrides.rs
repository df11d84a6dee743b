use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    pub(crate) fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(key) = non_empty("CORESYNC_API_KEY").or_else(|| non_empty("CORE_API_KEY")) {
            self.api_key = Some(key);
        }

        if let Some(base) = non_empty("CORESYNC_API_BASE_URL") {
            self.api_base_url = Some(base);
        }

        if let Some(path) = non_empty("CORESYNC_STORAGE_PATH") {
            self.storage.path = path;
        }

        if let Some(interval) = non_empty("CORESYNC_SYNC_INTERVAL_MS")
            && let Ok(interval) = interval.parse::<u64>()
            && interval > 0
        {
            self.sync.interval_ms = interval;
        }

        if let Some(level) = non_empty("CORESYNC_LOG_LEVEL") {
            self.log_level = level;
        }
    }
}
