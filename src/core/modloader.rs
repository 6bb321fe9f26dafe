use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use tracing::{info, warn};

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{LauncherEvent, SharedSink};
use crate::core::install_state::{self, ArtifactState};
use crate::core::paths::LauncherPaths;

pub const GAME_VERSION: &str = "1.20.1";
pub const LOADER_VERSION: &str = "47.3.0";

/// Substring that marks a mod-loader version folder.
const LOADER_MARKER: &str = "forge";

const FORGE_MAVEN: &str = "https://maven.minecraftforge.net";

/// The version identifier the installer is expected to produce.
pub fn expected_version_id() -> String {
    format!("{GAME_VERSION}-{LOADER_MARKER}-{LOADER_VERSION}")
}

/// Scan the versions directory for any folder whose name carries both the
/// loader marker and the game version, adopting the first match. Used both
/// as the post-install fallback and by launch-time discovery.
pub fn find_loader_version(versions_dir: &Path) -> Option<String> {
    let entries = std::fs::read_dir(versions_dir).ok()?;
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains(LOADER_MARKER) && name.contains(GAME_VERSION) {
            return Some(name);
        }
    }
    None
}

/// Installs the mod loader by downloading the official installer jar and
/// running it as a child process against the game directory.
pub struct ModLoaderProvisioner<'a> {
    paths: &'a LauncherPaths,
    downloader: &'a Downloader,
}

impl<'a> ModLoaderProvisioner<'a> {
    pub fn new(paths: &'a LauncherPaths, downloader: &'a Downloader) -> Self {
        Self { paths, downloader }
    }

    /// Installed iff the version descriptor and jar both exist. Partial
    /// presence counts as not installed and triggers a fresh attempt; the
    /// prior residue is left in place for the installer to overwrite.
    pub fn installed_version(&self) -> Option<String> {
        let id = expected_version_id();
        let version_dir = self.paths.versions_dir().join(&id);
        let descriptor = version_dir.join(format!("{id}.json"));
        let jar = version_dir.join(format!("{id}.jar"));
        (descriptor.exists() && jar.exists()).then_some(id)
    }

    pub async fn ensure(&self, java_bin: &Path, sink: &SharedSink) -> LauncherResult<String> {
        if let Some(id) = self.installed_version() {
            sink.emit(LauncherEvent::log("Forge already installed"));
            install_state::record(&self.paths.install_state_file(), |state| {
                state.mod_loader = ArtifactState::Complete;
            });
            return Ok(id);
        }

        install_state::record(&self.paths.install_state_file(), |state| {
            state.mod_loader = ArtifactState::Partial;
        });

        sink.emit(LauncherEvent::log(format!(
            "Installing Forge {GAME_VERSION}... this can take a few minutes"
        )));

        let work_dir = self.paths.loader_work_dir();
        let minecraft_dir = self.paths.minecraft_dir();
        for dir in [&work_dir, &minecraft_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| LauncherError::Io {
                    path: dir.clone(),
                    source,
                })?;
        }

        let installer_url = format!(
            "{FORGE_MAVEN}/net/minecraftforge/forge/{GAME_VERSION}-{LOADER_VERSION}/forge-{GAME_VERSION}-{LOADER_VERSION}-installer.jar"
        );
        let installer_path = work_dir.join("installer.jar");

        sink.emit(LauncherEvent::log("Downloading the Forge installer..."));
        self.downloader
            .download_file(&installer_url, &installer_path)
            .await?;

        sink.emit(LauncherEvent::log("Running the Forge installer..."));
        run_installer(java_bin, &installer_path, &minecraft_dir, &work_dir, sink).await?;

        if let Some(id) = self.installed_version() {
            sink.emit(LauncherEvent::log("Forge installed"));
            self.finish(&installer_path);
            return Ok(id);
        }

        // The installer sometimes writes a version folder under a name we
        // did not predict; adopt whatever matches before giving up.
        sink.emit(LauncherEvent::log("Searching for the installed version..."));
        if let Some(found) = find_loader_version(&self.paths.versions_dir()) {
            sink.emit(LauncherEvent::log(format!("Found: {found}")));
            self.finish(&installer_path);
            return Ok(found);
        }

        warn!("Forge installer exited without producing a version folder");
        Err(LauncherError::InstallFailed(
            "the installer did not produce a usable version. Try again.".into(),
        ))
    }

    fn finish(&self, installer_path: &Path) {
        install_state::record(&self.paths.install_state_file(), |state| {
            state.mod_loader = ArtifactState::Complete;
        });
        let _ = std::fs::remove_file(installer_path);
        info!("Mod loader {} ready", expected_version_id());
    }
}

/// Run `java -jar installer.jar --installClient <dir>`, streaming its
/// stdout/stderr lines to the event sink and awaiting exit.
async fn run_installer(
    java_bin: &Path,
    installer_path: &Path,
    target_dir: &Path,
    work_dir: &Path,
    sink: &SharedSink,
) -> LauncherResult<()> {
    let mut cmd = std::process::Command::new(java_bin);
    cmd.arg("-jar")
        .arg(installer_path)
        .arg("--installClient")
        .arg(target_dir)
        .current_dir(work_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    configure_platform_spawn(&mut cmd);

    let mut child = cmd
        .spawn()
        .map_err(|err| LauncherError::InstallFailed(format!("cannot start installer: {err}")))?;

    // One dedup slot shared by both streams, matching the interleaved
    // console output the installer produces.
    let last_line = Arc::new(Mutex::new(String::new()));
    let mut readers = Vec::new();

    if let Some(stdout) = child.stdout.take() {
        let sink = sink.clone();
        let last_line = last_line.clone();
        readers.push(tauri::async_runtime::spawn_blocking(move || {
            forward_deduped_lines(stdout, &last_line, &sink);
        }));
    }
    if let Some(stderr) = child.stderr.take() {
        let sink = sink.clone();
        let last_line = last_line.clone();
        readers.push(tauri::async_runtime::spawn_blocking(move || {
            forward_deduped_lines(stderr, &last_line, &sink);
        }));
    }

    let status = tauri::async_runtime::spawn_blocking(move || child.wait())
        .await
        .map_err(|err| LauncherError::InstallFailed(err.to_string()))?
        .map_err(|err| LauncherError::InstallFailed(err.to_string()))?;

    for reader in readers {
        let _ = reader.await;
    }

    info!("Forge installer exited with {:?}", status);
    Ok(())
}

/// Forward non-empty lines as `Log` events, dropping a line that exactly
/// repeats the previous one (installers tend to print progress in bursts).
fn forward_deduped_lines(
    reader: impl std::io::Read,
    last_line: &Mutex<String>,
    sink: &SharedSink,
) {
    for line in BufReader::new(reader).lines().map_while(Result::ok) {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        {
            let mut last = last_line.lock().unwrap();
            if *last == line {
                continue;
            }
            *last = line.clone();
        }
        sink.emit(LauncherEvent::log(line));
    }
}

#[cfg(target_os = "windows")]
fn configure_platform_spawn(cmd: &mut std::process::Command) {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(target_os = "windows"))]
fn configure_platform_spawn(_cmd: &mut std::process::Command) {}

/// Descriptor and jar paths for a version id, exposed for launch checks.
pub fn version_artifacts(versions_dir: &Path, id: &str) -> (PathBuf, PathBuf) {
    let dir = versions_dir.join(id);
    (dir.join(format!("{id}.json")), dir.join(format!("{id}.jar")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::test_support::CollectingSink;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"stub").unwrap();
    }

    #[test]
    fn installed_requires_descriptor_and_jar() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LauncherPaths::at(dir.path());
        let downloader = Downloader::new(reqwest::Client::new());
        let provisioner = ModLoaderProvisioner::new(&paths, &downloader);

        let id = expected_version_id();
        let (descriptor, jar) = version_artifacts(&paths.versions_dir(), &id);

        assert_eq!(provisioner.installed_version(), None);

        // Partial presence is "not installed".
        touch(&descriptor);
        assert_eq!(provisioner.installed_version(), None);

        touch(&jar);
        assert_eq!(provisioner.installed_version(), Some(id));
    }

    #[test]
    fn scan_adopts_first_folder_matching_both_substrings() {
        let dir = tempfile::tempdir().unwrap();
        let versions = dir.path().join("versions");
        std::fs::create_dir_all(versions.join("1.20.1")).unwrap();
        std::fs::create_dir_all(versions.join("1.19.2-forge-43.2.0")).unwrap();
        std::fs::create_dir_all(versions.join("1.20.1-forge-47.3.0")).unwrap();

        let found = find_loader_version(&versions).unwrap();
        assert!(found.contains("forge") && found.contains("1.20.1"));
    }

    #[test]
    fn scan_of_missing_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_loader_version(&dir.path().join("versions")), None);
    }

    #[test]
    fn repeated_lines_are_forwarded_once() {
        let sink_impl = Arc::new(CollectingSink::default());
        let sink: SharedSink = sink_impl.clone();
        let last_line = Mutex::new(String::new());

        let output = "Extracting\nExtracting\nPatching\nExtracting\n\n";
        forward_deduped_lines(output.as_bytes(), &last_line, &sink);

        assert_eq!(
            sink_impl.log_messages(),
            vec!["Extracting", "Patching", "Extracting"]
        );
    }

    #[test]
    fn dedup_slot_is_shared_across_streams() {
        let sink_impl = Arc::new(CollectingSink::default());
        let sink: SharedSink = sink_impl.clone();
        let last_line = Mutex::new(String::new());

        forward_deduped_lines("MOVE file.jar\n".as_bytes(), &last_line, &sink);
        forward_deduped_lines("MOVE file.jar\n".as_bytes(), &last_line, &sink);

        assert_eq!(sink_impl.log_messages(), vec!["MOVE file.jar"]);
    }
}
