use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{LauncherEvent, SharedSink};
use crate::core::install_state::{self, ArtifactState};
use crate::core::paths::LauncherPaths;

/// Fixed Temurin 17 JRE archive the launcher manages for every player.
const RUNTIME_URL: &str = "https://github.com/adoptium/temurin17-binaries/releases/download/jdk-17.0.11%2B9/OpenJDK17U-jre_x64_windows_hotspot_17.0.11_9.zip";

/// Temurin archives unpack into a single `jdk-...` top-level folder.
const EXTRACTED_DIR_PREFIX: &str = "jdk";

/// Brings the managed Java runtime from `Absent` to `Complete`:
/// download the fixed archive, extract it, flatten the versioned top-level
/// folder so `runtime/bin/java` sits at a stable path.
pub struct RuntimeProvisioner<'a> {
    paths: &'a LauncherPaths,
    downloader: &'a Downloader,
}

impl<'a> RuntimeProvisioner<'a> {
    pub fn new(paths: &'a LauncherPaths, downloader: &'a Downloader) -> Self {
        Self { paths, downloader }
    }

    /// Installed iff the runtime binary exists at its expected path.
    pub fn installed(&self) -> bool {
        self.paths.java_binary().exists()
    }

    pub async fn ensure(&self, sink: &SharedSink) -> LauncherResult<PathBuf> {
        let java_bin = self.paths.java_binary();

        if java_bin.exists() {
            sink.emit(LauncherEvent::log("Java runtime ready"));
            install_state::record(&self.paths.install_state_file(), |state| {
                state.runtime = ArtifactState::Complete;
            });
            return Ok(java_bin);
        }

        install_state::record(&self.paths.install_state_file(), |state| {
            state.runtime = ArtifactState::Partial;
        });

        sink.emit(LauncherEvent::log(
            "Downloading Java 17 runtime (about 100 MB)...",
        ));
        let runtime_dir = self.paths.runtime_dir();
        tokio::fs::create_dir_all(&runtime_dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: runtime_dir.clone(),
                source,
            })?;

        let archive_path = self
            .paths
            .root()
            .join(format!("java-{}.zip", Uuid::new_v4()));
        self.downloader.download_file(RUNTIME_URL, &archive_path).await?;

        sink.emit(LauncherEvent::log("Extracting Java runtime..."));
        extract_zip(&archive_path, &runtime_dir)?;
        flatten_extracted_root(&runtime_dir)?;

        let _ = tokio::fs::remove_file(&archive_path).await;

        if !java_bin.exists() {
            return Err(LauncherError::Extract(format!(
                "runtime archive did not produce {:?}",
                java_bin
            )));
        }

        install_state::record(&self.paths.install_state_file(), |state| {
            state.runtime = ArtifactState::Complete;
        });
        sink.emit(LauncherEvent::log("Java installed"));
        info!("Runtime installed at {:?}", runtime_dir);

        Ok(java_bin)
    }
}

fn extract_zip(archive: &Path, target: &Path) -> LauncherResult<()> {
    let file = std::fs::File::open(archive).map_err(|source| LauncherError::Io {
        path: archive.to_path_buf(),
        source,
    })?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|err| LauncherError::Extract(err.to_string()))?;
    zip.extract(target)
        .map_err(|err| LauncherError::Extract(err.to_string()))
}

/// Move the contents of the single extracted `jdk*` directory up one level
/// and delete the then-empty directory, so the runtime lives directly under
/// the target.
fn flatten_extracted_root(dir: &Path) -> LauncherResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| LauncherError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if !path.is_dir() || !name.starts_with(EXTRACTED_DIR_PREFIX) {
            continue;
        }
        if !contains_java_binary(&path) {
            continue;
        }

        let children = std::fs::read_dir(&path).map_err(|source| LauncherError::Io {
            path: path.clone(),
            source,
        })?;
        for child in children.flatten() {
            let target = dir.join(child.file_name());
            if target.exists() {
                if target.is_dir() {
                    std::fs::remove_dir_all(&target).map_err(|source| LauncherError::Io {
                        path: target.clone(),
                        source,
                    })?;
                } else {
                    std::fs::remove_file(&target).map_err(|source| LauncherError::Io {
                        path: target.clone(),
                        source,
                    })?;
                }
            }
            std::fs::rename(child.path(), &target).map_err(|source| LauncherError::Io {
                path: target,
                source,
            })?;
        }

        std::fs::remove_dir_all(&path).map_err(|source| LauncherError::Io {
            path: path.clone(),
            source,
        })?;
        break;
    }

    Ok(())
}

fn contains_java_binary(root: &Path) -> bool {
    root.join("bin").join("java.exe").exists() || root.join("bin").join("java").exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"stub").unwrap();
    }

    #[test]
    fn flatten_moves_jdk_contents_up_one_level() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = dir.path().join("runtime");
        let nested = runtime.join("jdk-17.0.11+9-jre");
        touch(&nested.join("bin").join("java"));
        touch(&nested.join("bin").join("java.exe"));
        touch(&nested.join("release"));

        flatten_extracted_root(&runtime).unwrap();

        assert!(runtime.join("bin").join("java").exists());
        assert!(runtime.join("release").exists());
        assert!(!nested.exists());
    }

    #[test]
    fn flatten_ignores_unrelated_directories() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = dir.path().join("runtime");
        touch(&runtime.join("other-dir").join("file.txt"));
        // A jdk-prefixed dir without bin/java is not the runtime root.
        std::fs::create_dir_all(runtime.join("jdk-docs")).unwrap();

        flatten_extracted_root(&runtime).unwrap();

        assert!(runtime.join("other-dir").join("file.txt").exists());
        assert!(runtime.join("jdk-docs").exists());
    }

    #[test]
    fn installed_tracks_binary_presence() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LauncherPaths::at(dir.path());
        let downloader = Downloader::new(reqwest::Client::new());
        let provisioner = RuntimeProvisioner::new(&paths, &downloader);

        assert!(!provisioner.installed());
        touch(&paths.java_binary());
        assert!(provisioner.installed());
    }
}
