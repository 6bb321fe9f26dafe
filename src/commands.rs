use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::core::config::LauncherConfig;
use crate::core::error::LauncherError;
use crate::core::events::{LauncherEvent, SharedSink, UiEventSink};
use crate::core::launch::GameLauncher;
use crate::core::modloader::ModLoaderProvisioner;
use crate::core::mods::ModSynchronizer;
use crate::core::runtime::RuntimeProvisioner;
use crate::core::session::Session;
use crate::core::state::AppState;

/// Uniform response envelope for every command: `{success, error?, ...}`.
/// Errors never cross the IPC boundary as rejections; they are folded into
/// this shape so the frontend always observes a handled result.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(err: &LauncherError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionData {
    pub username: String,
    pub uuid: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl From<Session> for SessionData {
    fn from(session: Session) -> Self {
        Self {
            username: session.username,
            uuid: session.uuid,
            access_token: session.access_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionPayload {
    pub username: String,
    pub uuid: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl From<SessionPayload> for Session {
    fn from(payload: SessionPayload) -> Self {
        Self {
            username: payload.username,
            uuid: payload.uuid,
            access_token: payload.access_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AutoInitData {
    pub config: Option<LauncherConfig>,
}

#[derive(Debug, Serialize)]
pub struct CheckSetupData {
    #[serde(rename = "setupComplete")]
    pub setup_complete: bool,
}

#[derive(Debug, Serialize)]
pub struct SetupData {
    #[serde(rename = "javaPath")]
    pub java_path: String,
    #[serde(rename = "forgeVersion")]
    pub forge_version: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadModsData {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct LaunchData {}

fn sink_for(app: &tauri::AppHandle) -> SharedSink {
    Arc::new(UiEventSink::new(app.clone()))
}

#[tauri::command]
pub async fn register(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
    username: String,
    password: String,
) -> Result<ApiResponse<SessionData>, ()> {
    let sink = sink_for(&app);
    sink.emit(LauncherEvent::log(format!(
        "Creating account {}...",
        username.trim()
    )));

    let state = state.lock().await;
    match state.accounts.register(username.trim(), &password).await {
        Ok(session) => {
            sink.emit(LauncherEvent::log("Account created"));
            Ok(ApiResponse::ok(SessionData::from(session)))
        }
        Err(err) => {
            warn!("Registration failed for {}: {}", username.trim(), err);
            Ok(ApiResponse::err(&err))
        }
    }
}

#[tauri::command]
pub async fn login(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
    username: String,
    password: String,
) -> Result<ApiResponse<SessionData>, ()> {
    let sink = sink_for(&app);
    sink.emit(LauncherEvent::log("Signing in..."));

    let state = state.lock().await;
    match state.accounts.login(username.trim(), &password).await {
        Ok(session) => {
            sink.emit(LauncherEvent::log("Signed in"));
            Ok(ApiResponse::ok(SessionData::from(session)))
        }
        Err(err) => {
            warn!("Login failed for {}: {}", username.trim(), err);
            Ok(ApiResponse::err(&err))
        }
    }
}

/// Restore the last-logged-in identity, if any, so the frontend can
/// pre-fill the login form without re-prompting.
#[tauri::command]
pub async fn auto_init(
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
) -> Result<ApiResponse<AutoInitData>, ()> {
    let state = state.lock().await;
    let config = LauncherConfig::load(&state.paths.config_file());
    Ok(ApiResponse::ok(AutoInitData { config }))
}

#[tauri::command]
pub async fn check_setup(
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
) -> Result<ApiResponse<CheckSetupData>, ()> {
    let state = state.lock().await;
    let provisioner = RuntimeProvisioner::new(&state.paths, &state.downloader);
    Ok(ApiResponse::ok(CheckSetupData {
        setup_complete: provisioner.installed(),
    }))
}

/// First-run provisioning: managed runtime, then mod loader. Fatal errors
/// surface in the envelope; the user re-triggers manually.
#[tauri::command]
pub async fn initial_setup(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
) -> Result<ApiResponse<SetupData>, ()> {
    let sink = sink_for(&app);
    sink.emit(LauncherEvent::log("Running initial setup..."));

    let state = state.lock().await;
    let runtime = RuntimeProvisioner::new(&state.paths, &state.downloader);
    let java_bin = match runtime.ensure(&sink).await {
        Ok(path) => path,
        Err(err) => {
            error!("Runtime provisioning failed: {}", err);
            sink.emit(LauncherEvent::log(format!("Java setup failed: {err}")));
            return Ok(ApiResponse::err(&err));
        }
    };

    let loader = ModLoaderProvisioner::new(&state.paths, &state.downloader);
    match loader.ensure(&java_bin, &sink).await {
        Ok(version) => {
            sink.emit(LauncherEvent::log("Setup complete"));
            info!("Initial setup finished with loader {}", version);
            Ok(ApiResponse::ok(SetupData {
                java_path: java_bin.to_string_lossy().to_string(),
                forge_version: version,
            }))
        }
        Err(err) => {
            error!("Mod loader provisioning failed: {}", err);
            sink.emit(LauncherEvent::log(format!("Forge setup failed: {err}")));
            Ok(ApiResponse::err(&err))
        }
    }
}

#[tauri::command]
pub async fn download_mods(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
) -> Result<ApiResponse<DownloadModsData>, ()> {
    let sink = sink_for(&app);

    let state = state.lock().await;
    let synchronizer = ModSynchronizer::new(&state.paths, &state.downloader, &state.http_client);
    match synchronizer.sync(&sink).await {
        Ok(count) => Ok(ApiResponse::ok(DownloadModsData { count })),
        Err(err) => {
            error!("Mod sync failed: {}", err);
            Ok(ApiResponse::err(&err))
        }
    }
}

#[tauri::command]
pub async fn launch_game(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
    session: SessionPayload,
) -> Result<ApiResponse<LaunchData>, ()> {
    let sink = sink_for(&app);
    sink.emit(LauncherEvent::log("Preparing to launch..."));

    let state = state.lock().await;
    let launcher = GameLauncher::new(&state.paths);

    let spec = match launcher.prepare(Session::from(session)) {
        Ok(spec) => spec,
        Err(err) => {
            warn!("Launch preconditions not met: {}", err);
            return Ok(ApiResponse::err(&err));
        }
    };

    match launcher.launch(spec, sink).await {
        Ok(()) => Ok(ApiResponse::ok(LaunchData {})),
        Err(err) => {
            error!("Launch failed: {}", err);
            Ok(ApiResponse::err(&err))
        }
    }
}
