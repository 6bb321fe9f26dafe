use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire launcher backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── Validation / accounts ───────────────────────────
    #[error("{0}")]
    Validation(String),

    #[error("That username is already taken")]
    AlreadyExists,

    // Unknown username and bad password collapse into one message
    // so the login form cannot be used to enumerate accounts.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Account backend error: {0}")]
    AccountBackend(String),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    Download { url: String, status: u16 },

    #[error("Mod repository unavailable: {0}")]
    RepoUnavailable(String),

    // ── Provisioning ────────────────────────────────────
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Mod loader install failed: {0}")]
    InstallFailed(String),

    #[error("Java runtime is not installed. Restart the launcher setup.")]
    RuntimeMissing,

    #[error("Mod loader not found. Run the initial setup again.")]
    ModLoaderMissing,

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

// ── Serialization for Tauri IPC ─────────────────────────
// Tauri commands require the error type to implement `Serialize`.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
