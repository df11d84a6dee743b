use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// `coresync` - sync ChatGPT and Gemini conversations into CORE memory.
#[derive(Parser, Debug)]
#[command(name = "coresync")]
#[command(version)]
#[command(about = "Sync AI chat conversations into a CORE memory graph.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Page snapshot to operate on.
#[derive(clap::Args, Debug, Clone)]
pub struct PageArgs {
    /// URL the snapshot was taken from (selects platform and conversation id)
    #[arg(long)]
    pub url: String,

    /// Serialized page HTML; re-read on every access
    #[arg(long)]
    pub html: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store the CORE API key (and optionally the API base URL)
    Login {
        /// API key from the CORE dashboard
        #[arg(long)]
        api_key: String,

        /// API base URL (default: https://core.heysol.ai/api/v1)
        #[arg(long)]
        base_url: Option<String>,

        /// Skip the connectivity check against /spaces
        #[arg(long)]
        no_verify: bool,
    },

    /// Show credentials, auto-sync state and last sync time
    Status {
        /// Lower a sync flag left raised by a run that never finished
        #[arg(long)]
        clear_sync_flag: bool,
    },

    /// Run one sync of a page snapshot
    Sync {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Auto-sync a page snapshot until interrupted
    Watch {
        #[command(flatten)]
        page: PageArgs,

        /// Override the sync period for this session
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Turn the persisted auto-sync switch on or off
    AutoSync {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// List memory spaces
    Spaces,

    /// Save a piece of text as a standalone episode
    Save {
        /// Text to save (surrounding whitespace is trimmed)
        text: String,
    },

    /// Rewrite the composer's prompt using deep search
    Improve {
        #[command(flatten)]
        page: PageArgs,

        /// Type this prompt into the composer first
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Print which platform a URL belongs to
    Detect {
        url: String,
    },
}
