use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// The single on-disk record of the last logged-in identity.
///
/// Overwritten on every successful login or registration. Field names match
/// the JSON the frontend already reads (`{"username": ..., "lastLogin": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    pub username: String,
    #[serde(rename = "lastLogin")]
    pub last_login: i64,
}

impl LauncherConfig {
    pub fn now(username: &str) -> Self {
        Self {
            username: username.to_string(),
            last_login: Utc::now().timestamp_millis(),
        }
    }

    /// Load the config, treating a missing or malformed file as "no config".
    /// A corrupt file only means the user has to log in again.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(config) => Some(config),
            Err(err) => {
                debug!("Ignoring malformed config at {:?}: {}", path, err);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
