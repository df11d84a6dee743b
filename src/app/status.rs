use chrono::{DateTime, Local};
use coresync::Config;
use coresync::storage::{ExtensionState, SyncingFlag};

/// Everything `coresync status` prints, gathered before rendering.
pub struct StatusReport<'a> {
    pub config: &'a Config,
    pub api_key_set: bool,
    pub api_base_url: String,
    pub state: ExtensionState,
    pub flag: SyncingFlag,
}

fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(
        || format!("{millis} (invalid)"),
        |at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

pub fn render_status(report: &StatusReport<'_>) -> String {
    let config = report.config;
    let mut lines = vec![
        "◆ coresync status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        format!("Storage     {}", config.storage.resolved_path().display()),
        String::new(),
        format!(
            "  API key       {}",
            if report.api_key_set { "set" } else { "not set" }
        ),
        format!("  API base URL  {}", report.api_base_url),
        format!(
            "  Auto-sync     {}",
            if report.state.auto_sync_enabled {
                "on"
            } else {
                "off"
            }
        ),
        format!("  Interval      {} ms", report.state.sync_interval_ms),
        format!(
            "  Last sync     {}",
            report
                .state
                .last_sync_timestamp
                .map_or_else(|| "never".to_string(), format_millis)
        ),
    ];

    let syncing = match (report.flag.in_progress, report.flag.since) {
        (false, _) => "idle".to_string(),
        (true, Some(since)) => format!("in progress since {}", format_millis(since)),
        (true, None) => "in progress".to_string(),
    };
    lines.push(format!("  Sync          {syncing}"));
    lines.join("\n")
}
