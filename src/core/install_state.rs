use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

/// Install progress of one provisioned artifact.
///
/// `Partial` means an install was started and never confirmed complete, so
/// leftover files on disk may be residue from an interrupted run rather than
/// a finished install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    #[default]
    Absent,
    Partial,
    Complete,
}

/// Persisted record of what provisioning has finished, kept next to the
/// launcher config. Filesystem existence checks stay the ground truth for
/// whether an artifact is usable; this record distinguishes "never
/// attempted" from "crashed halfway".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallState {
    #[serde(default)]
    pub runtime: ArtifactState,
    #[serde(default)]
    pub mod_loader: ArtifactState,
}

impl InstallState {
    /// Load the record, defaulting everything to `Absent` when the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    /// Persist transactionally: write a sibling temp file, then rename over
    /// the target, so a crash mid-write never leaves a truncated record.
    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let staging = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&staging, json).map_err(|source| LauncherError::Io {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, path).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Demote `Complete` claims whose artifact no longer exists on disk.
    /// The record is advisory; the filesystem wins.
    pub fn reconciled(mut self, runtime_present: bool, loader_present: bool) -> Self {
        if self.runtime == ArtifactState::Complete && !runtime_present {
            self.runtime = ArtifactState::Partial;
        }
        if self.mod_loader == ArtifactState::Complete && !loader_present {
            self.mod_loader = ArtifactState::Partial;
        }
        self
    }
}

/// Load-modify-save helper used by the provisioners after each step.
/// A failure to persist is logged, not fatal: the record is advisory and
/// must never abort an otherwise healthy install.
pub fn record(path: &Path, update: impl FnOnce(&mut InstallState)) {
    let mut state = InstallState::load(path);
    update(&mut state);
    if let Err(err) = state.save(path) {
        warn!("Cannot persist install state at {:?}: {}", path, err);
    }
}
