use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use serde::Deserialize;
use tracing::{error, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{LauncherEvent, SharedSink};
use crate::core::modloader;
use crate::core::paths::LauncherPaths;
use crate::core::session::Session;

const SERVER_ADDRESS: &str = "play.nationcraft.net";
const SERVER_PORT: &str = "25565";

/// Log line the client prints once its audio subsystem is up, which happens
/// right after the main menu is reachable. Used as the readiness signal for
/// showing the server connection instructions.
pub const READY_LOG_MARKER: &str = "Sound engine started";

const MEMORY_MAX: &str = "4G";
const MEMORY_MIN: &str = "2G";

/// Everything one game launch needs, assembled per invocation and owned by
/// the orchestrator for the lifetime of that subprocess.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub session: Session,
    pub root: PathBuf,
    pub version_id: String,
    pub java_bin: PathBuf,
    pub max_memory: String,
    pub min_memory: String,
}

/// Subset of the version descriptor the orchestrator needs.
#[derive(Debug, Deserialize)]
struct VersionDescriptor {
    #[serde(rename = "mainClass")]
    main_class: String,
}

pub struct GameLauncher<'a> {
    paths: &'a LauncherPaths,
}

impl<'a> GameLauncher<'a> {
    pub fn new(paths: &'a LauncherPaths) -> Self {
        Self { paths }
    }

    /// Verify preconditions and assemble the launch configuration.
    pub fn prepare(&self, session: Session) -> LauncherResult<LaunchSpec> {
        let java_bin = self.paths.java_binary();
        if !java_bin.exists() {
            return Err(LauncherError::RuntimeMissing);
        }

        let version_id = modloader::find_loader_version(&self.paths.versions_dir())
            .ok_or(LauncherError::ModLoaderMissing)?;

        Ok(LaunchSpec {
            session,
            root: self.paths.minecraft_dir(),
            version_id,
            java_bin,
            max_memory: MEMORY_MAX.to_string(),
            min_memory: MEMORY_MIN.to_string(),
        })
    }

    /// Spawn the game process and return once it is running. Stdout/stderr
    /// lines and the final exit code keep flowing to the sink from
    /// background tasks after this returns.
    pub async fn launch(&self, spec: LaunchSpec, sink: SharedSink) -> LauncherResult<()> {
        sink.emit(LauncherEvent::log(format!(
            "Launching {}...",
            spec.version_id
        )));

        let (descriptor_path, version_jar) =
            modloader::version_artifacts(&self.paths.versions_dir(), &spec.version_id);
        let descriptor = read_descriptor(&descriptor_path)?;

        let mut cmd = std::process::Command::new(&spec.java_bin);
        cmd.arg(format!("-Xmx{}", spec.max_memory))
            .arg(format!("-Xms{}", spec.min_memory))
            .arg("-cp")
            .arg(&version_jar)
            .arg(&descriptor.main_class)
            .arg("--gameDir")
            .arg(&spec.root)
            .arg("--version")
            .arg(&spec.version_id)
            .arg("--username")
            .arg(&spec.session.username)
            .arg("--uuid")
            .arg(&spec.session.uuid)
            .arg("--accessToken")
            .arg(&spec.session.access_token)
            .current_dir(&spec.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        configure_platform_spawn(&mut cmd);

        info!("Launching game: {:?}", cmd);
        let mut child = cmd
            .spawn()
            .map_err(|err| LauncherError::Other(format!("cannot start the game: {err}")))?;

        let ready_announced = Arc::new(AtomicBool::new(false));

        if let Some(stdout) = child.stdout.take() {
            let sink = sink.clone();
            let ready_announced = ready_announced.clone();
            tauri::async_runtime::spawn_blocking(move || {
                for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                    announce_ready_if_marked(&line, &ready_announced, &sink);
                    sink.emit(LauncherEvent::log(line));
                }
            });
        }

        if let Some(stderr) = child.stderr.take() {
            let sink = sink.clone();
            tauri::async_runtime::spawn_blocking(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    sink.emit(LauncherEvent::log(line));
                }
            });
        }

        let monitor_sink = sink.clone();
        tauri::async_runtime::spawn(async move {
            let wait_result = tauri::async_runtime::spawn_blocking(move || child.wait()).await;
            match wait_result {
                Ok(Ok(status)) => {
                    info!("Game process exited with {:?}", status);
                    monitor_sink.emit(LauncherEvent::closed(status.code()));
                }
                Ok(Err(err)) => {
                    error!("Cannot wait on game process: {}", err);
                    monitor_sink.emit(LauncherEvent::closed(None));
                }
                Err(err) => {
                    error!("Game monitor task failed: {}", err);
                    monitor_sink.emit(LauncherEvent::closed(None));
                }
            }
        });

        Ok(())
    }
}

fn read_descriptor(path: &std::path::Path) -> LauncherResult<VersionDescriptor> {
    let raw = std::fs::read_to_string(path).map_err(|_| LauncherError::ModLoaderMissing)?;
    serde_json::from_str(&raw).map_err(|_| LauncherError::ModLoaderMissing)
}

/// Emit the server connection instructions the first time the readiness
/// marker appears in the game log.
fn announce_ready_if_marked(line: &str, announced: &AtomicBool, sink: &SharedSink) {
    if !line.contains(READY_LOG_MARKER) {
        return;
    }
    if announced.swap(true, Ordering::SeqCst) {
        return;
    }
    for message in server_instructions() {
        sink.emit(LauncherEvent::log(message));
    }
}

fn server_instructions() -> Vec<String> {
    vec![
        "══════════════════════════════".into(),
        "JOIN THE SERVER:".into(),
        "1. Multiplayer".into(),
        format!("2. Add server: {SERVER_ADDRESS}:{SERVER_PORT}"),
        "══════════════════════════════".into(),
    ]
}

#[cfg(target_os = "windows")]
fn configure_platform_spawn(cmd: &mut std::process::Command) {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(target_os = "windows"))]
fn configure_platform_spawn(_cmd: &mut std::process::Command) {}
