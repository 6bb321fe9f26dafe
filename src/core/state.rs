use reqwest::Client;

use crate::core::account::{AccountService, RemoteAccountStore};
use crate::core::downloader::Downloader;
use crate::core::http::build_http_client;
use crate::core::install_state::InstallState;
use crate::core::modloader;
use crate::core::paths::LauncherPaths;

/// Long-lived backend state, managed by Tauri as `Arc<Mutex<AppState>>`.
///
/// Holds no session: the authenticated identity is returned to the frontend
/// and passed back explicitly into the operations that need it.
pub struct AppState {
    pub paths: LauncherPaths,
    pub http_client: Client,
    pub downloader: Downloader,
    pub accounts: AccountService<RemoteAccountStore>,
}

impl AppState {
    pub fn new() -> Self {
        let paths = LauncherPaths::from_system();
        if let Err(err) = std::fs::create_dir_all(paths.root()) {
            tracing::warn!("Cannot create launcher directory {:?}: {}", paths.root(), err);
        }

        let http_client = build_http_client().expect("Failed to build HTTP client");
        let downloader = Downloader::new(http_client.clone());
        let accounts = AccountService::new(
            RemoteAccountStore::from_env(http_client.clone()),
            paths.config_file(),
        );

        reconcile_install_state(&paths);

        Self {
            paths,
            http_client,
            downloader,
            accounts,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Demote stale `Complete` claims on startup so a crash mid-install is
/// visible as `Partial` instead of being misread as installed.
fn reconcile_install_state(paths: &LauncherPaths) {
    let state_file = paths.install_state_file();
    let runtime_present = paths.java_binary().exists();
    let loader_present = modloader::find_loader_version(&paths.versions_dir()).is_some();

    let state = InstallState::load(&state_file).reconciled(runtime_present, loader_present);
    if let Err(err) = state.save(&state_file) {
        tracing::warn!("Cannot reconcile install state: {}", err);
    }
}
