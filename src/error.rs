use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `coresync`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; the CLI continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum CoreSyncError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Remote API ──────────────────────────────────────────────────────
    #[error("remote: {0}")]
    Remote(#[from] RemoteError),

    // ── Host page / DOM ─────────────────────────────────────────────────
    #[error("page: {0}")]
    Page(#[from] PageError),

    // ── Extension storage ───────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Remote API errors ───────────────────────────────────────────────────────

/// Failure of a single remote call. The client never retries; the sync
/// engine decides whether to stop or carry on.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("no API key configured")]
    Unauthenticated,

    #[error("{endpoint} request failed: {message}")]
    Transport { endpoint: String, message: String },
}

impl RemoteError {
    pub fn transport(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

// ─── Host page errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid selector {selector}: {message}")]
    Selector { selector: String, message: String },

    #[error("composer not found: {0}")]
    ComposerNotFound(String),

    #[error("markdown conversion failed: {0}")]
    Convert(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Storage errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt storage file: {0}")]
    Corrupt(String),

    #[error("encode failed: {0}")]
    Encode(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, CoreSyncError>;
