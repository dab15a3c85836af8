use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the agent backend.
/// Every module returns `Result<T, NexusError>`.
#[derive(Debug, Error)]
pub enum NexusError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── PARAM.SFO ───────────────────────────────────────
    #[error("PSF signature not found")]
    InvalidSignature,

    #[error("PARAM.SFO truncated: need {needed} bytes after signature, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("SFO entry {index} out of range: {detail}")]
    EntryOutOfRange { index: u32, detail: String },

    // ── Library ─────────────────────────────────────────
    #[error("Cannot scan save directory {path:?}: {reason}")]
    DirectoryScanFailure { path: PathBuf, reason: String },

    // ── Queries ─────────────────────────────────────────
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    // ── Launch ──────────────────────────────────────────
    #[error("Launch failed: {0}")]
    LaunchFailure(String),

    // ── Configuration ───────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Server ──────────────────────────────────────────
    #[error("HTTP server error: {0}")]
    Server(String),
}

/// Convenience alias used throughout the crate.
pub type NexusResult<T> = Result<T, NexusError>;

impl NexusError {
    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            NexusError::Io { .. } => "io",
            NexusError::Json(_) => "json",
            NexusError::InvalidSignature => "invalid_signature",
            NexusError::Truncated { .. } => "truncated",
            NexusError::EntryOutOfRange { .. } => "entry_out_of_range",
            NexusError::DirectoryScanFailure { .. } => "directory_scan_failure",
            NexusError::NotFound(_) => "not_found",
            NexusError::BadRequest(_) => "bad_request",
            NexusError::LaunchFailure(_) => "launch_failure",
            NexusError::Config(_) => "config",
            NexusError::Server(_) => "server",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NexusError::Io {
            path: path.into(),
            source,
        }
    }
}
